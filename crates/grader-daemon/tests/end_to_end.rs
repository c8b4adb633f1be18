//! Full cycle: dispatch a round-1 task, play the participant (build,
//! publish, notify the collector), then grade the submission.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use grader_checks::{evaluate_pending, EngineConfig};
use grader_core::{Catalog, TaskPayload};
use grader_daemon::api;
use grader_ledger::{Ledger, MemoryLedger};
use grader_pipeline::{
    build_and_notify, run_round1, CodeSynthesizer, DispatchConfig, NotifyConfig, Participant,
    ProjectFiles, Publication, Publisher, RoundConfig,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE: &str = r#"<!doctype html>
<html><head><meta name="viewport" content="width=device-width"></head>
<body>
  <h1>Submission</h1>
  <button>Go</button>
</body></html>"#;

struct StaticSiteSynthesizer;

impl CodeSynthesizer for StaticSiteSynthesizer {
    fn synthesize(&self, _task: &TaskPayload) -> anyhow::Result<ProjectFiles> {
        Ok(ProjectFiles::default()
            .with_file("index.html", PAGE)
            .with_file("LICENSE", "MIT License"))
    }
}

struct FixedPagesPublisher {
    pages_url: String,
}

impl Publisher for FixedPagesPublisher {
    fn publish(&self, task: &TaskPayload, _files: &ProjectFiles) -> anyhow::Result<Publication> {
        Ok(Publication {
            repo_url: format!("https://github.com/e2e/{}", task.task),
            commit_sha: "deadbeef".into(),
            pages_url: self.pages_url.clone(),
        })
    }
}

async fn spawn_collector(ledger: Arc<dyn Ledger>) -> String {
    let app = Router::new()
        .route("/api/submissions", post(api::submit))
        .route("/health", get(api::health))
        .with_state(api::AppState::new(ledger));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn dispatch_submit_grade_round_trip() {
    let ledger: Arc<MemoryLedger> = Arc::new(MemoryLedger::new());
    let client = reqwest::Client::new();
    let catalog = Catalog::builtin();

    // participant endpoint accepts whatever task we send
    let participant_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/task"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&participant_server)
        .await;

    // published project, served where the grader will look for it
    let pages_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repo/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .mount(&pages_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repo/LICENSE"))
        .respond_with(ResponseTemplate::new(200).set_body_string("MIT License"))
        .mount(&pages_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&pages_server)
        .await;

    let collector_url = spawn_collector(ledger.clone()).await;

    // 1. dispatch
    let roster = vec![Participant {
        timestamp: "2025-10-16T09:00:00Z".into(),
        email: "alice@example.com".into(),
        endpoint: format!("{}/task", participant_server.uri()),
        secret: "s3cret".into(),
    }];
    let round_config = RoundConfig {
        evaluation_url: format!("{collector_url}/api/submissions"),
        hour_bucket: Some("2025-10-16-14".into()),
        pacing_delay: Duration::ZERO,
        dispatch: DispatchConfig {
            retry_delays: vec![Duration::ZERO; 2],
            ..DispatchConfig::default()
        },
    };
    let summary = run_round1(ledger.as_ref(), &client, &catalog, &roster, &round_config).await;
    assert_eq!(summary.processed, 1);

    // 2. participant side: build, publish, notify the collector
    let task = ledger.tasks_by_round(1).unwrap().remove(0);
    let payload = TaskPayload::from_record(&task, "s3cret");
    let (_, outcome) = build_and_notify(
        &client,
        &payload,
        &StaticSiteSynthesizer,
        &FixedPagesPublisher {
            pages_url: format!("{}/repo/", pages_server.uri()),
        },
        &NotifyConfig {
            delay_unit: Duration::ZERO,
            ..NotifyConfig::default()
        },
    )
    .await
    .unwrap();
    assert!(outcome.accepted);
    assert!(ledger
        .submission_exists("alice@example.com", &task.task, 1)
        .unwrap());

    // 3. grade
    let graded = evaluate_pending(
        ledger.as_ref(),
        &client,
        Some(1),
        &EngineConfig {
            github_api_url: pages_server.uri(),
            ..EngineConfig::default()
        },
    )
    .await;
    assert_eq!(graded.graded, 1);

    let results = ledger
        .results_for("alice@example.com", &task.task, 1)
        .unwrap();
    assert!(!results.is_empty());
    let page_load = results.iter().find(|r| r.check == "page_load").unwrap();
    assert_eq!(page_load.score, 1.0);
    let license = results.iter().find(|r| r.check == "license_file").unwrap();
    assert_eq!(license.score, 1.0);
    // repo metadata is not served here, so provenance scores zero
    let created = results
        .iter()
        .find(|r| r.check == "repo_creation_time")
        .unwrap();
    assert_eq!(created.score, 0.0);
}
