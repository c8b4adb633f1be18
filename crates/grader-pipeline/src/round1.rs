use std::time::Duration;

use grader_core::{new_nonce, taskgen, time, Catalog, GeneratedTask, TaskPayload, TaskRecord};
use grader_ledger::Ledger;
use reqwest::Client;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::dispatch::{dispatch_task, DispatchConfig};
use crate::roster::Participant;

/// Settings shared by both generation rounds.
#[derive(Clone, Debug)]
pub struct RoundConfig {
    /// Collector URL participants must POST their submission to.
    pub evaluation_url: String,
    /// Hour bucket driving the seeded draw; `None` means the current hour.
    pub hour_bucket: Option<String>,
    /// Pause between participants, to avoid hammering shared infrastructure.
    pub pacing_delay: Duration,
    pub dispatch: DispatchConfig,
}

impl RoundConfig {
    pub fn new(evaluation_url: &str) -> Self {
        Self {
            evaluation_url: evaluation_url.to_string(),
            hour_bucket: None,
            pacing_delay: Duration::from_secs(1),
            dispatch: DispatchConfig::default(),
        }
    }

    fn bucket(&self) -> String {
        self.hour_bucket
            .clone()
            .unwrap_or_else(time::current_hour_bucket)
    }
}

/// Per-batch tally. `total` counts roster rows considered; the other three
/// partition them.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total: usize,
}

pub(crate) enum Disposition {
    Delivered,
    Skipped(&'static str),
    Undeliverable,
}

/// Generate and dispatch a round-1 task to every roster participant.
/// Failures are isolated per participant: one broken endpoint never stalls
/// the rest of the batch.
pub async fn run_round1(
    ledger: &dyn Ledger,
    client: &Client,
    catalog: &Catalog,
    roster: &[Participant],
    config: &RoundConfig,
) -> BatchSummary {
    let bucket = config.bucket();
    let mut summary = BatchSummary::default();

    for (i, participant) in roster.iter().enumerate() {
        summary.total += 1;
        if i > 0 {
            sleep(config.pacing_delay).await;
        }

        let generated = taskgen::generate_round1(catalog, &participant.email, &bucket);
        match dispatch_and_record(ledger, client, participant, &generated, 1, config).await {
            Ok(Disposition::Delivered) => summary.processed += 1,
            Ok(Disposition::Skipped(reason)) => {
                info!("skipping {}: {reason}", participant.email);
                summary.skipped += 1;
            }
            Ok(Disposition::Undeliverable) => summary.failed += 1,
            Err(e) => {
                warn!("round 1 failed for {}: {e:?}", participant.email);
                summary.failed += 1;
            }
        }
    }

    info!(
        "round 1 done: {} delivered, {} skipped, {} failed of {}",
        summary.processed, summary.skipped, summary.failed, summary.total
    );
    summary
}

/// Shared tail of both rounds: idempotency probe, dispatch, ledger write.
/// The task record is written whatever the dispatch outcome was, so failed
/// deliveries stay visible for operators.
pub(crate) async fn dispatch_and_record(
    ledger: &dyn Ledger,
    client: &Client,
    participant: &Participant,
    generated: &GeneratedTask,
    round: u32,
    config: &RoundConfig,
) -> anyhow::Result<Disposition> {
    if ledger.task_exists(&participant.email, &generated.task_id, round)? {
        return Ok(Disposition::Skipped("task already dispatched"));
    }

    let mut record = TaskRecord {
        timestamp: time::now_iso(),
        email: participant.email.clone(),
        task: generated.task_id.clone(),
        round,
        nonce: new_nonce(),
        brief: generated.brief.clone(),
        attachments: generated.attachments.clone(),
        checks: generated.checks.clone(),
        evaluation_url: config.evaluation_url.clone(),
        endpoint: participant.endpoint.clone(),
        dispatch_status: None,
        dispatch_error: None,
    };

    let payload = TaskPayload::from_record(&record, &participant.secret);
    let outcome = dispatch_task(client, &participant.endpoint, &payload, &config.dispatch).await;
    record.dispatch_status = Some(outcome.status);
    record.dispatch_error = outcome.error.clone();

    let delivered = outcome.delivered();
    ledger.insert_task(&record)?;
    Ok(if delivered {
        Disposition::Delivered
    } else {
        Disposition::Undeliverable
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use grader_ledger::MemoryLedger;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(evaluation_url: &str) -> RoundConfig {
        RoundConfig {
            evaluation_url: evaluation_url.to_string(),
            hour_bucket: Some("2025-10-16-14".into()),
            pacing_delay: Duration::ZERO,
            dispatch: DispatchConfig {
                retry_delays: vec![Duration::ZERO; 2],
                ..DispatchConfig::default()
            },
        }
    }

    fn participant(email: &str, endpoint: &str) -> Participant {
        Participant {
            timestamp: "2025-10-16T09:00:00Z".into(),
            email: email.into(),
            endpoint: endpoint.into(),
            secret: "s3cret".into(),
        }
    }

    #[tokio::test]
    async fn batch_records_tasks_and_counts_outcomes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let ledger = MemoryLedger::new();
        let catalog = Catalog::builtin();
        let roster = vec![
            participant("alice@example.com", &format!("{}/task", server.uri())),
            // unroutable endpoint: dispatch fails, record still written
            participant("bob@example.com", "http://127.0.0.1:1/task"),
        ];

        let summary = run_round1(
            &ledger,
            &Client::new(),
            &catalog,
            &roster,
            &test_config("http://collector/api/submissions"),
        )
        .await;

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total, 2);

        let tasks = ledger.tasks_by_round(1).unwrap();
        assert_eq!(tasks.len(), 2);
        let alice = tasks.iter().find(|t| t.email == "alice@example.com").unwrap();
        assert_eq!(alice.dispatch_status, Some(200));
        let bob = tasks.iter().find(|t| t.email == "bob@example.com").unwrap();
        assert_eq!(bob.dispatch_status, Some(0));
        assert!(bob.dispatch_error.is_some());
    }

    #[tokio::test]
    async fn rerun_within_the_same_hour_is_idempotent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let ledger = MemoryLedger::new();
        let catalog = Catalog::builtin();
        let roster = vec![participant(
            "alice@example.com",
            &format!("{}/task", server.uri()),
        )];
        let config = test_config("http://collector/api/submissions");

        let first = run_round1(&ledger, &Client::new(), &catalog, &roster, &config).await;
        assert_eq!(first.processed, 1);

        let second = run_round1(&ledger, &Client::new(), &catalog, &roster, &config).await;
        assert_eq!(second.skipped, 1);
        assert_eq!(second.processed, 0);
        assert_eq!(ledger.tasks_by_round(1).unwrap().len(), 1);
    }
}
