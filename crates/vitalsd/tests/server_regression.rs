//! End-to-end regression tests for the metric server.
//!
//! Drives the full router the way a producer and a reader would: updates
//! in both encodings, single and batch reads, the HTML index, and the
//! snapshot file written by the write-through policy.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use vitals_store::{DurabilityPolicy, MetricStore, Persistence, QueryService, UpdateDispatch};

fn build_router(snapshot_path: &std::path::Path, interval_secs: u64) -> Router {
    let store = MetricStore::new();
    let persistence = Persistence::new(store.clone(), snapshot_path);
    persistence.restore().unwrap();
    let dispatch = UpdateDispatch::new(
        store.clone(),
        persistence,
        DurabilityPolicy::from_interval_secs(interval_secs),
    );
    vitals_api::build_router(dispatch, QueryService::new(store))
}

fn write_through_router(dir: &tempfile::TempDir) -> Router {
    build_router(&dir.path().join("metrics-db.json"), 0)
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_string(resp: axum::response::Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn counter_accumulates_across_updates() {
    let dir = tempfile::tempdir().unwrap();
    let router = write_through_router(&dir);

    for delta in ["1", "3"] {
        let resp = router
            .clone()
            .oneshot(post(&format!("/update/counter/hits/{delta}")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = router.oneshot(get("/value/counter/hits")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "4");
}

#[tokio::test]
async fn gauge_overwrites_previous_value() {
    let dir = tempfile::tempdir().unwrap();
    let router = write_through_router(&dir);

    for value in ["1.5", "2.0"] {
        let resp = router
            .clone()
            .oneshot(post(&format!("/update/gauge/temp/{value}")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = router.oneshot(get("/value/gauge/temp")).await.unwrap();
    assert_eq!(body_string(resp).await, "2");
}

#[tokio::test]
async fn unknown_kind_answers_400() {
    let dir = tempfile::tempdir().unwrap();
    let router = write_through_router(&dir);

    let resp = router
        .oneshot(post("/update/histogram/latency/5"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unparsable_value_answers_400() {
    let dir = tempfile::tempdir().unwrap();
    let router = write_through_router(&dir);

    let resp = router
        .clone()
        .oneshot(post("/update/counter/hits/1.5"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = router.oneshot(post("/update/gauge/temp/warm")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_id_segment_answers_404() {
    let dir = tempfile::tempdir().unwrap();
    let router = write_through_router(&dir);

    let resp = router.oneshot(post("/update/gauge")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unmatched_routes_answer_400() {
    let dir = tempfile::tempdir().unwrap();
    let router = write_through_router(&dir);

    let resp = router.clone().oneshot(get("/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = router.oneshot(post("/update/gauge/temp/1.5/extra")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn structured_update_and_read_echo() {
    let dir = tempfile::tempdir().unwrap();
    let router = write_through_router(&dir);

    let resp = router
        .clone()
        .oneshot(post_json(
            "/update",
            serde_json::json!({"id": "hits", "type": "counter", "delta": 4}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = router
        .oneshot(post_json(
            "/value",
            serde_json::json!({"id": "hits", "type": "counter"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let echoed: serde_json::Value =
        serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(
        echoed,
        serde_json::json!({"id": "hits", "type": "counter", "delta": 4})
    );
}

#[tokio::test]
async fn structured_update_validation_answers_400() {
    let dir = tempfile::tempdir().unwrap();
    let router = write_through_router(&dir);

    // Counter without a delta.
    let resp = router
        .clone()
        .oneshot(post_json(
            "/update",
            serde_json::json!({"id": "hits", "type": "counter", "value": 1.0}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Unknown kind wins over the empty id.
    let resp = router
        .oneshot(post_json(
            "/update",
            serde_json::json!({"id": "", "type": "bogus"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn structured_update_empty_id_answers_404() {
    let dir = tempfile::tempdir().unwrap();
    let router = write_through_router(&dir);

    let resp = router
        .oneshot(post_json(
            "/update",
            serde_json::json!({"id": "", "type": "gauge", "value": 1.0}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn kind_mismatch_reads_as_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let router = write_through_router(&dir);

    router
        .clone()
        .oneshot(post("/update/gauge/x/1.0"))
        .await
        .unwrap();

    let resp = router.oneshot(get("/value/counter/x")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn batch_read_omits_misses() {
    let dir = tempfile::tempdir().unwrap();
    let router = write_through_router(&dir);

    router
        .clone()
        .oneshot(post("/update/counter/hits/4"))
        .await
        .unwrap();

    let resp = router
        .oneshot(post_json(
            "/values",
            serde_json::json!([
                {"id": "hits", "type": "counter"},
                {"id": "missing", "type": "gauge"}
            ]),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let entries: serde_json::Value =
        serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(
        entries,
        serde_json::json!([{"id": "hits", "type": "counter", "value": "4"}])
    );
}

#[tokio::test]
async fn batch_read_detailed_reports_misses() {
    let dir = tempfile::tempdir().unwrap();
    let router = write_through_router(&dir);

    router
        .clone()
        .oneshot(post("/update/counter/hits/4"))
        .await
        .unwrap();

    let resp = router
        .oneshot(post_json(
            "/values?detailed=true",
            serde_json::json!([
                {"id": "hits", "type": "counter"},
                {"id": "missing", "type": "gauge"}
            ]),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let report: serde_json::Value =
        serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(
        report,
        serde_json::json!({
            "matched": [{"id": "hits", "type": "counter", "value": "4"}],
            "missed": [{"id": "missing", "type": "gauge"}]
        })
    );
}

#[tokio::test]
async fn index_lists_metrics_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let router = write_through_router(&dir);

    for uri in [
        "/update/gauge/zeta/1.5",
        "/update/counter/alpha/2",
        "/update/gauge/mid/3.25",
    ] {
        router.clone().oneshot(post(uri)).await.unwrap();
    }

    let resp = router.oneshot(get("/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let html = body_string(resp).await;
    let alpha = html.find("alpha = 2").unwrap();
    let mid = html.find("mid = 3.25").unwrap();
    let zeta = html.find("zeta = 1.5").unwrap();
    assert!(alpha < mid && mid < zeta);
}

#[tokio::test]
async fn store_survives_restart_via_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metrics-db.json");

    // First "process": write-through persists every update.
    let router = build_router(&path, 0);
    router
        .clone()
        .oneshot(post("/update/counter/hits/4"))
        .await
        .unwrap();
    router
        .oneshot(post("/update/gauge/temp/36.6"))
        .await
        .unwrap();
    assert!(path.exists());

    // Second "process": restore at startup, values intact.
    let router = build_router(&path, 0);
    let resp = router
        .clone()
        .oneshot(get("/value/counter/hits"))
        .await
        .unwrap();
    assert_eq!(body_string(resp).await, "4");

    let resp = router.oneshot(get("/value/gauge/temp")).await.unwrap();
    assert_eq!(body_string(resp).await, "36.6");
}
