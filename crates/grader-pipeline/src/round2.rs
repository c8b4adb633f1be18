use std::collections::HashSet;

use grader_core::{taskgen, Catalog, TaskRecord};
use grader_ledger::Ledger;
use reqwest::Client;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::round1::{dispatch_and_record, BatchSummary, Disposition, RoundConfig};
use crate::roster::Participant;

/// Round-2 settings: the shared round config plus the checks a round-1
/// submission must have passed to qualify for an enhancement task.
#[derive(Clone, Debug)]
pub struct Round2Config {
    pub round: RoundConfig,
    pub critical_checks: Vec<String>,
}

impl Round2Config {
    pub fn new(round: RoundConfig) -> Self {
        Self {
            round,
            critical_checks: vec!["license_file".to_string(), "page_load".to_string()],
        }
    }
}

/// Dispatch enhancement tasks to every participant whose round-1 work
/// qualifies. A participant is disqualified by a zero score on any critical
/// check; an ungraded submission passes with a warning.
pub async fn run_round2(
    ledger: &dyn Ledger,
    client: &Client,
    catalog: &Catalog,
    roster: &[Participant],
    config: &Round2Config,
) -> BatchSummary {
    let mut summary = BatchSummary::default();

    let round1_tasks = match ledger.tasks_by_round(1) {
        Ok(tasks) => tasks,
        Err(e) => {
            warn!("cannot load round 1 tasks: {e:?}");
            return summary;
        }
    };
    // Task ids shift with the hour bucket, so the per-id idempotency probe
    // in dispatch_and_record is not enough to make re-runs safe. Anyone with
    // round-2 state already on the ledger is done.
    let already_in_round2 = match round2_emails(ledger) {
        Ok(emails) => emails,
        Err(e) => {
            warn!("cannot load round 2 records: {e:?}");
            return summary;
        }
    };

    for (i, participant) in roster.iter().enumerate() {
        summary.total += 1;
        if i > 0 {
            sleep(config.round.pacing_delay).await;
        }

        if already_in_round2.contains(&participant.email) {
            info!("skipping {}: round 2 already dispatched", participant.email);
            summary.skipped += 1;
            continue;
        }

        match qualify_and_dispatch(ledger, client, catalog, participant, &round1_tasks, config)
            .await
        {
            Ok(Disposition::Delivered) => summary.processed += 1,
            Ok(Disposition::Skipped(reason)) => {
                info!("skipping {}: {reason}", participant.email);
                summary.skipped += 1;
            }
            Ok(Disposition::Undeliverable) => summary.failed += 1,
            Err(e) => {
                warn!("round 2 failed for {}: {e:?}", participant.email);
                summary.failed += 1;
            }
        }
    }

    info!(
        "round 2 done: {} delivered, {} skipped, {} failed of {}",
        summary.processed, summary.skipped, summary.failed, summary.total
    );
    summary
}

fn round2_emails(ledger: &dyn Ledger) -> anyhow::Result<HashSet<String>> {
    let mut emails = HashSet::new();
    for task in ledger.tasks_by_round(2)? {
        emails.insert(task.email);
    }
    for submission in ledger.submissions_by_round(2)? {
        emails.insert(submission.email);
    }
    Ok(emails)
}

async fn qualify_and_dispatch(
    ledger: &dyn Ledger,
    client: &Client,
    catalog: &Catalog,
    participant: &Participant,
    round1_tasks: &[TaskRecord],
    config: &Round2Config,
) -> anyhow::Result<Disposition> {
    let Some(round1_task) = round1_tasks
        .iter()
        .rev()
        .find(|t| t.email == participant.email)
    else {
        return Ok(Disposition::Skipped("no round 1 task on record"));
    };

    if !ledger.submission_exists(&participant.email, &round1_task.task, 1)? {
        return Ok(Disposition::Skipped("no round 1 submission"));
    }

    let results = ledger.results_for(&participant.email, &round1_task.task, 1)?;
    if results.is_empty() {
        // not graded yet: give the benefit of the doubt rather than stall
        // the whole cohort on a slow grading run
        warn!(
            "{} has no round 1 results yet, dispatching anyway",
            participant.email
        );
    }
    for critical in &config.critical_checks {
        let flunked = results.iter().any(|r| &r.check == critical && r.score == 0.0);
        if flunked {
            return Ok(Disposition::Skipped("failed a critical round 1 check"));
        }
    }

    let bucket = config
        .round
        .hour_bucket
        .clone()
        .unwrap_or_else(grader_core::time::current_hour_bucket);
    let generated =
        taskgen::generate_round2(catalog, &participant.email, &bucket, &round1_task.task)?;

    dispatch_and_record(ledger, client, participant, &generated, 2, &config.round).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DispatchConfig;
    use grader_core::{new_nonce, taskgen, CheckResultRecord, SubmissionRecord};
    use grader_ledger::MemoryLedger;
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BUCKET: &str = "2025-10-16-14";

    fn test_config(evaluation_url: &str) -> Round2Config {
        Round2Config::new(RoundConfig {
            evaluation_url: evaluation_url.to_string(),
            hour_bucket: Some("2025-10-17-09".into()),
            pacing_delay: Duration::ZERO,
            dispatch: DispatchConfig {
                retry_delays: vec![Duration::ZERO; 2],
                ..DispatchConfig::default()
            },
        })
    }

    fn participant(email: &str, endpoint: &str) -> Participant {
        Participant {
            timestamp: "2025-10-16T09:00:00Z".into(),
            email: email.into(),
            endpoint: endpoint.into(),
            secret: "s3cret".into(),
        }
    }

    fn seed_round1(
        ledger: &MemoryLedger,
        catalog: &Catalog,
        email: &str,
        graded: bool,
        critical_scores: f64,
    ) -> String {
        let generated = taskgen::generate_round1(catalog, email, BUCKET);
        let task = TaskRecord {
            timestamp: "2025-10-16T14:00:00Z".into(),
            email: email.into(),
            task: generated.task_id.clone(),
            round: 1,
            nonce: new_nonce(),
            brief: generated.brief.clone(),
            attachments: generated.attachments.clone(),
            checks: generated.checks.clone(),
            evaluation_url: "http://collector/api/submissions".into(),
            endpoint: "http://participant/task".into(),
            dispatch_status: Some(200),
            dispatch_error: None,
        };
        ledger.insert_task(&task).unwrap();

        let submission = SubmissionRecord {
            timestamp: "2025-10-16T15:00:00Z".into(),
            email: email.into(),
            task: generated.task_id.clone(),
            round: 1,
            nonce: task.nonce.clone(),
            repo_url: "https://github.com/x/repo".into(),
            commit_sha: "abc123".into(),
            pages_url: "https://x.github.io/repo/".into(),
        };
        ledger.insert_submission(&submission).unwrap();

        if graded {
            let results = vec![
                CheckResultRecord::for_submission(
                    &submission,
                    "page_load",
                    critical_scores,
                    "",
                    "",
                ),
                CheckResultRecord::for_submission(
                    &submission,
                    "license_file",
                    critical_scores,
                    "",
                    "",
                ),
            ];
            ledger.insert_results(&results).unwrap();
        }
        generated.task_id
    }

    #[tokio::test]
    async fn eligible_participant_gets_the_same_template_again() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let ledger = MemoryLedger::new();
        let catalog = Catalog::builtin();
        let r1_task = seed_round1(&ledger, &catalog, "alice@example.com", true, 1.0);
        let roster = vec![participant(
            "alice@example.com",
            &format!("{}/task", server.uri()),
        )];

        let summary = run_round2(
            &ledger,
            &Client::new(),
            &catalog,
            &roster,
            &test_config("http://collector/api/submissions"),
        )
        .await;
        assert_eq!(summary.processed, 1);

        let round2_tasks = ledger.tasks_by_round(2).unwrap();
        assert_eq!(round2_tasks.len(), 1);
        assert_eq!(
            taskgen::template_id_from_task_id(&round2_tasks[0].task),
            taskgen::template_id_from_task_id(&r1_task)
        );
    }

    #[tokio::test]
    async fn rerun_in_a_later_hour_does_not_dispatch_a_second_task() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let ledger = MemoryLedger::new();
        let catalog = Catalog::builtin();
        seed_round1(&ledger, &catalog, "alice@example.com", true, 1.0);
        let roster = vec![participant(
            "alice@example.com",
            &format!("{}/task", server.uri()),
        )];

        let first = run_round2(
            &ledger,
            &Client::new(),
            &catalog,
            &roster,
            &test_config("http://collector/api/submissions"),
        )
        .await;
        assert_eq!(first.processed, 1);

        // a later hour bucket yields a different task id for the same
        // participant, which must not become a second enhancement task
        let mut later = test_config("http://collector/api/submissions");
        later.round.hour_bucket = Some("2025-10-17-10".into());
        let second = run_round2(&ledger, &Client::new(), &catalog, &roster, &later).await;
        assert_eq!(second.processed, 0);
        assert_eq!(second.skipped, 1);
        assert_eq!(ledger.tasks_by_round(2).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn absent_or_failing_participants_are_skipped_but_ungraded_proceed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        let endpoint = format!("{}/task", server.uri());

        let ledger = MemoryLedger::new();
        let catalog = Catalog::builtin();
        // no round-1 record at all
        let absent = participant("nobody@example.com", &endpoint);
        // submitted but never graded: eligible with a warning
        seed_round1(&ledger, &catalog, "ungraded@example.com", false, 0.0);
        let ungraded = participant("ungraded@example.com", &endpoint);
        // graded with a critical check at zero: disqualified
        seed_round1(&ledger, &catalog, "failing@example.com", true, 0.0);
        let failing = participant("failing@example.com", &endpoint);

        let summary = run_round2(
            &ledger,
            &Client::new(),
            &catalog,
            &[absent, ungraded, failing],
            &test_config("http://collector/api/submissions"),
        )
        .await;

        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.processed, 1);
        let round2_tasks = ledger.tasks_by_round(2).unwrap();
        assert_eq!(round2_tasks.len(), 1);
        assert_eq!(round2_tasks[0].email, "ungraded@example.com");
    }
}
