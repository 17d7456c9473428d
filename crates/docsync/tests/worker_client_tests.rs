//! `HttpWorkerClient` against a local stand-in for the analysis worker.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use docsync::models::AnalysisKind;
use docsync::worker::{AnalysisWorker, HttpWorkerClient, ResultEntry, StartRequest, WorkerError};

#[derive(Clone, Default)]
struct WorkerState {
    started: Arc<Mutex<Vec<Value>>>,
}

async fn analyze(State(state): State<WorkerState>, Json(body): Json<Value>) -> Response {
    let rejected = body["document_id"] == "reject";
    state.started.lock().unwrap().push(body);
    if rejected {
        (StatusCode::INTERNAL_SERVER_ERROR, "model not loaded").into_response()
    } else {
        Json(json!({"status": "started"})).into_response()
    }
}

async fn results(Path((doc, kind)): Path<(String, String)>) -> Response {
    match doc.as_str() {
        "empty" => "".into_response(),
        "garbage" => "<html>oops</html>".into_response(),
        "missing" => (StatusCode::NOT_FOUND, "no such document").into_response(),
        "pending" => Json(json!({"results": null, "count": 0})).into_response(),
        _ => Json(json!({
            "results": [
                {"page_number": 1, "file_path": format!("/out/{}/{}/page_1.png", doc, kind)},
                {"page_number": 2},
            ],
            "count": 2
        }))
        .into_response(),
    }
}

async fn spawn_worker() -> (String, WorkerState) {
    let state = WorkerState::default();
    let app = Router::new()
        .route("/analyze", post(analyze))
        .route("/results/:doc/:kind", get(results))
        .route("/health", get(|| async { "ok" }))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), state)
}

fn client(base_url: &str) -> HttpWorkerClient {
    HttpWorkerClient::with_timeouts(base_url, Duration::from_secs(2), Duration::from_secs(5))
        .unwrap()
}

fn start_request(document_id: &str) -> StartRequest {
    StartRequest {
        document_id: document_id.to_string(),
        analysis_type: AnalysisKind::Deepdoctection,
        file_path: "/uploads/a.pdf".to_string(),
        file_name: "a.pdf".to_string(),
    }
}

#[tokio::test]
async fn test_start_posts_request_body() {
    let (base, state) = spawn_worker().await;

    client(&base).request_start(&start_request("doc1")).await.unwrap();

    let started = state.started.lock().unwrap();
    assert_eq!(started.len(), 1);
    assert_eq!(
        started[0],
        json!({
            "document_id": "doc1",
            "analysis_type": "deepdoctection",
            "file_path": "/uploads/a.pdf",
            "file_name": "a.pdf"
        })
    );
}

#[tokio::test]
async fn test_start_non_success_is_status_error() {
    let (base, _state) = spawn_worker().await;

    let err = client(&base)
        .request_start(&start_request("reject"))
        .await
        .unwrap_err();

    match err {
        WorkerError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "model not loaded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_results_are_decoded() {
    let (base, _state) = spawn_worker().await;

    let entries = client(&base)
        .request_results("doc1", AnalysisKind::Docling)
        .await
        .unwrap();

    assert_eq!(
        entries,
        vec![
            ResultEntry::new(1, "/out/doc1/docling/page_1.png"),
            ResultEntry {
                page_number: Some(2),
                file_path: None
            },
        ]
    );
}

#[tokio::test]
async fn test_empty_or_null_results_mean_nothing_yet() {
    let (base, _state) = spawn_worker().await;
    let client = client(&base);

    assert!(client
        .request_results("empty", AnalysisKind::Docling)
        .await
        .unwrap()
        .is_empty());
    assert!(client
        .request_results("pending", AnalysisKind::Docling)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_bad_results_responses() {
    let (base, _state) = spawn_worker().await;
    let client = client(&base);

    let err = client
        .request_results("garbage", AnalysisKind::Docling)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::Decode(_)));

    let err = client
        .request_results("missing", AnalysisKind::Docling)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::Status { status: 404, .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_health_reflects_worker_liveness() {
    let (base, _state) = spawn_worker().await;
    assert!(client(&base).health().await);
}
