use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use grader_core::{IngestError, SubmissionPayload};
use grader_ledger::Ledger;
use grader_pipeline::ingest_submission;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<dyn Ledger>,
}

impl AppState {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Collector endpoint participants POST their finished work to. Client
/// mistakes come back as 400 with the rejection reason; only storage
/// trouble is a 500.
pub async fn submit(
    State(state): State<AppState>,
    Json(payload): Json<SubmissionPayload>,
) -> (StatusCode, Json<SubmitResponse>) {
    match ingest_submission(state.ledger.as_ref(), payload) {
        Ok(record) => {
            info!("stored submission {} from {}", record.task, record.email);
            (
                StatusCode::OK,
                Json(SubmitResponse {
                    status: "ok",
                    error: None,
                }),
            )
        }
        Err(e) if e.is_client_error() => (
            StatusCode::BAD_REQUEST,
            Json(SubmitResponse {
                status: "error",
                error: Some(e.to_string()),
            }),
        ),
        Err(IngestError::Storage(e)) => {
            warn!("submission storage error: {e:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SubmitResponse {
                    status: "error",
                    error: Some("internal error".to_string()),
                }),
            )
        }
        Err(_) => unreachable!("non-storage errors are client errors"),
    }
}

pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::{get, post};
    use axum::Router;
    use grader_core::{new_nonce, TaskRecord};
    use grader_ledger::MemoryLedger;

    async fn spawn_app(ledger: Arc<dyn Ledger>) -> String {
        let app = Router::new()
            .route("/api/submissions", post(submit))
            .route("/health", get(health))
            .with_state(AppState::new(ledger));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn dispatched_task(ledger: &dyn Ledger) -> TaskRecord {
        let task = TaskRecord {
            timestamp: "2025-10-16T14:00:00Z".into(),
            email: "a@x.com".into(),
            task: "calculator-ab12c".into(),
            round: 1,
            nonce: new_nonce(),
            brief: "Build a calculator".into(),
            attachments: vec![],
            checks: vec![],
            evaluation_url: "http://collector/api/submissions".into(),
            endpoint: "http://participant/task".into(),
            dispatch_status: Some(200),
            dispatch_error: None,
        };
        ledger.insert_task(&task).unwrap();
        task
    }

    fn payload_for(task: &TaskRecord) -> serde_json::Value {
        serde_json::json!({
            "email": task.email,
            "task": task.task,
            "round": task.round,
            "nonce": task.nonce,
            "repo_url": "https://github.com/a/repo",
            "commit_sha": "abc123",
            "pages_url": "https://a.github.io/repo/",
        })
    }

    #[tokio::test]
    async fn health_answers_ok() {
        let base = spawn_app(Arc::new(MemoryLedger::new())).await;
        let resp = reqwest::get(format!("{base}/health")).await.unwrap();
        assert_eq!(resp.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn valid_submission_returns_200_and_is_stored() {
        let ledger: Arc<MemoryLedger> = Arc::new(MemoryLedger::new());
        let task = dispatched_task(ledger.as_ref());
        let base = spawn_app(ledger.clone()).await;

        let resp = reqwest::Client::new()
            .post(format!("{base}/api/submissions"))
            .json(&payload_for(&task))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        assert!(ledger
            .submission_exists("a@x.com", "calculator-ab12c", 1)
            .unwrap());
    }

    #[tokio::test]
    async fn bad_nonce_and_duplicates_return_400() {
        let ledger: Arc<MemoryLedger> = Arc::new(MemoryLedger::new());
        let task = dispatched_task(ledger.as_ref());
        let base = spawn_app(ledger.clone()).await;
        let client = reqwest::Client::new();

        let mut forged = payload_for(&task);
        forged["nonce"] = serde_json::json!("not-a-real-nonce");
        let resp = client
            .post(format!("{base}/api/submissions"))
            .json(&forged)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 400);

        let ok = client
            .post(format!("{base}/api/submissions"))
            .json(&payload_for(&task))
            .send()
            .await
            .unwrap();
        assert_eq!(ok.status().as_u16(), 200);

        let dup = client
            .post(format!("{base}/api/submissions"))
            .json(&payload_for(&task))
            .send()
            .await
            .unwrap();
        assert_eq!(dup.status().as_u16(), 400);
        let body: serde_json::Value = dup.json().await.unwrap();
        assert_eq!(body["status"], "error");
    }
}
