//! vitalsd — the vitals metric server daemon.
//!
//! Single binary that assembles the pieces: restores the store from the
//! snapshot file, picks the durability policy, starts the periodic
//! snapshot task when one is configured, and serves the HTTP API until
//! Ctrl-C.
//!
//! # Usage
//!
//! ```text
//! vitalsd -a localhost:8080 -i 300 -f /tmp/metrics-db.json
//! ```
//!
//! Every flag also binds to an environment variable (`ADDRESS`,
//! `STORE_INTERVAL`, `FILE_STORAGE_PATH`, `RESTORE`); flags win over the
//! environment. A store interval of 0 selects write-through durability.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tokio::sync::watch;
use tracing::{error, info};

use vitals_store::{DurabilityPolicy, MetricStore, Persistence, QueryService, UpdateDispatch};

#[derive(Parser)]
#[command(name = "vitalsd", about = "vitals metric server daemon")]
struct Cli {
    /// Address to listen on, host:port.
    #[arg(short = 'a', long, env = "ADDRESS", default_value = "localhost:8080")]
    address: String,

    /// Snapshot interval in seconds; 0 selects write-through durability.
    #[arg(short = 'i', long, env = "STORE_INTERVAL", default_value_t = 300)]
    store_interval: u64,

    /// Snapshot file path.
    #[arg(
        short = 'f',
        long,
        env = "FILE_STORAGE_PATH",
        default_value = "/tmp/metrics-db.json"
    )]
    file_storage_path: PathBuf,

    /// Restore the store from the snapshot file at startup.
    #[arg(
        short = 'r',
        long,
        env = "RESTORE",
        default_value_t = true,
        action = ArgAction::Set
    )]
    restore: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,vitalsd=debug,vitals_store=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    run(cli).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    info!("vitals metric server starting");

    let store = MetricStore::new();
    let persistence = Persistence::new(store.clone(), &cli.file_storage_path);

    if cli.restore {
        // A corrupt or unreadable snapshot is logged, not fatal; records
        // before the failing entry have already replayed, and durability
        // recovers on the next snapshot.
        if let Err(e) = persistence.restore() {
            error!(error = %e, "restore failed, serving whatever replayed cleanly");
        }
    }

    let policy = DurabilityPolicy::from_interval_secs(cli.store_interval);
    let dispatch = UpdateDispatch::new(store.clone(), persistence.clone(), policy);
    let query = QueryService::new(store);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let snapshot_task = match policy {
        DurabilityPolicy::Periodic(interval) => {
            info!(
                interval_secs = cli.store_interval,
                "periodic durability policy active"
            );
            let persistence = persistence.clone();
            Some(tokio::spawn(async move {
                persistence.run(interval, shutdown_rx).await;
            }))
        }
        DurabilityPolicy::WriteThrough => {
            info!("write-through durability policy active");
            None
        }
    };

    let router = vitals_api::build_router(dispatch, query);
    let listener = tokio::net::TcpListener::bind(&cli.address).await?;
    info!(address = %cli.address, "server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install CTRL+C handler");
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    match snapshot_task {
        // The periodic task flushes once more on its way out.
        Some(task) => {
            let _ = task.await;
        }
        // Write-through already persisted every update; one final
        // snapshot still bounds the gap if the last write's snapshot
        // failed.
        None => {
            if let Err(e) = persistence.snapshot() {
                error!(error = %e, "final snapshot failed");
            }
        }
    }

    info!("vitals metric server stopped");
    Ok(())
}
