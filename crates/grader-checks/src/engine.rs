use std::time::Duration;

use chrono::DateTime;
use grader_core::{Check, CheckResultRecord, SubmissionRecord, TaskRecord};
use grader_ledger::Ledger;
use reqwest::Client;
use tracing::{info, warn};

use crate::artifact::{code_quality_score, license_score, readme_score};
use crate::backend::PageBackend;
use crate::interactive::ClickObservation;
use crate::static_dom::{fetch_sibling, StaticPage};

const LICENSE_NAMES: &[&str] = &["LICENSE", "LICENSE.md", "LICENSE.txt"];
const CODE_FILES: &[&str] = &["script.js", "style.css"];
const ARTIFACT_CHECKS: &[&str] = &[
    "repo_creation_time",
    "license_file",
    "readme_quality",
    "code_quality",
];

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// WebDriver endpoint for interactive checks; `None` forces the static
    /// backend.
    pub webdriver_url: Option<String>,
    /// Base URL of the repository-hosting API used to read repo metadata.
    pub github_api_url: String,
    pub page_timeout: Duration,
    /// Re-evaluate submissions that already have results, filling in any
    /// checks that are missing a row.
    pub force: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            webdriver_url: None,
            github_api_url: "https://api.github.com".to_string(),
            page_timeout: Duration::from_secs(10),
            force: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EvalSummary {
    pub graded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total: usize,
}

/// Grade every submission that has no results yet (or every submission,
/// under `force`). One submission failing never stops the batch.
pub async fn evaluate_pending(
    ledger: &dyn Ledger,
    client: &Client,
    round: Option<u32>,
    config: &EngineConfig,
) -> EvalSummary {
    let mut summary = EvalSummary::default();
    let candidates = if config.force {
        match round {
            Some(r) => ledger.submissions_by_round(r),
            None => ledger.all_submissions(),
        }
    } else {
        ledger.submissions_without_results(round)
    };
    let candidates = match candidates {
        Ok(c) => c,
        Err(e) => {
            warn!("cannot list submissions: {e:?}");
            return summary;
        }
    };

    for submission in candidates {
        summary.total += 1;
        match grade_one(ledger, client, &submission, config).await {
            Ok(true) => summary.graded += 1,
            Ok(false) => summary.skipped += 1,
            Err(e) => {
                warn!(
                    "grading failed for {} / {}: {e:?}",
                    submission.email, submission.task
                );
                summary.failed += 1;
            }
        }
    }

    info!(
        "grading done: {} graded, {} skipped, {} failed of {}",
        summary.graded, summary.skipped, summary.failed, summary.total
    );
    summary
}

async fn grade_one(
    ledger: &dyn Ledger,
    client: &Client,
    submission: &SubmissionRecord,
    config: &EngineConfig,
) -> anyhow::Result<bool> {
    if !config.force
        && ledger.result_exists(&submission.email, &submission.task, submission.round, "page_load")?
    {
        return Ok(false);
    }

    let Some(task) = ledger.task_by_nonce(&submission.nonce)? else {
        anyhow::bail!("no task record for nonce {}", submission.nonce);
    };

    let results = evaluate_submission(client, submission, &task, config).await;
    let fresh: Vec<CheckResultRecord> = {
        let mut fresh = Vec::with_capacity(results.len());
        for r in results {
            if !ledger.result_exists(&r.email, &r.task, r.round, &r.check)? {
                fresh.push(r);
            }
        }
        fresh
    };
    if fresh.is_empty() {
        return Ok(false);
    }
    ledger.insert_results(&fresh)?;
    Ok(true)
}

/// Run the full check list against one submission. Always yields exactly
/// one result per scorable check, in order: `page_load` first, the four
/// artifact checks, then the task's own checks. Unrecognized check types
/// are skipped with a warning instead of guessing a score.
pub async fn evaluate_submission(
    client: &Client,
    submission: &SubmissionRecord,
    task: &TaskRecord,
    config: &EngineConfig,
) -> Vec<CheckResultRecord> {
    let mut results = Vec::new();
    let checks = &task.checks;

    let page = match StaticPage::fetch(client, &submission.pages_url).await {
        Ok(page) => {
            results.push(CheckResultRecord::for_submission(
                submission,
                "page_load",
                1.0,
                "page loaded",
                "",
            ));
            page
        }
        Err(e) => {
            results.push(CheckResultRecord::for_submission(
                submission,
                "page_load",
                0.0,
                &format!("{e:#}"),
                "",
            ));
            // nothing downstream can pass without a page
            for name in ARTIFACT_CHECKS {
                results.push(CheckResultRecord::for_submission(
                    submission,
                    name,
                    0.0,
                    "page did not load",
                    "",
                ));
            }
            for check in checks {
                if matches!(check, Check::Unknown) {
                    continue;
                }
                results.push(CheckResultRecord::for_submission(
                    submission,
                    &check.result_name(),
                    0.0,
                    "page did not load",
                    "",
                ));
            }
            return results;
        }
    };

    let (score, reason) =
        repo_creation_score(client, config, &task.timestamp, &submission.repo_url).await;
    results.push(CheckResultRecord::for_submission(
        submission,
        "repo_creation_time",
        score,
        &reason,
        "",
    ));

    let license = fetch_first_sibling(client, &submission.pages_url, LICENSE_NAMES).await;
    let (score, reason) = license_score(license.as_deref());
    results.push(CheckResultRecord::for_submission(
        submission,
        "license_file",
        score,
        &reason,
        "",
    ));

    let readme = match fetch_sibling(client, &submission.pages_url, "README.md").await {
        Ok(content) => content,
        Err(e) => {
            warn!("readme fetch failed for {}: {e:#}", submission.pages_url);
            None
        }
    };
    let (score, reason) = readme_score(readme.as_deref());
    results.push(CheckResultRecord::for_submission(
        submission,
        "readme_quality",
        score,
        &reason,
        "",
    ));

    let mut sources = vec![page.html().to_string()];
    for name in CODE_FILES {
        match fetch_sibling(client, &submission.pages_url, name).await {
            Ok(Some(content)) => sources.push(content),
            Ok(None) => {}
            Err(e) => warn!("{name} fetch failed for {}: {e:#}", submission.pages_url),
        }
    }
    let (score, reason) = code_quality_score(&sources.join("\n\n"));
    results.push(CheckResultRecord::for_submission(
        submission,
        "code_quality",
        score,
        &reason,
        "",
    ));

    let backend = PageBackend::open(
        config.webdriver_url.as_deref(),
        &submission.pages_url,
        page,
        config.page_timeout,
    )
    .await;
    let mode = if backend.is_interactive() {
        "interactive"
    } else {
        "static"
    };

    for check in checks {
        if matches!(check, Check::Unknown) {
            warn!(
                "skipping unrecognized check on {} / {}",
                submission.email, submission.task
            );
            continue;
        }
        let (score, reason) = match run_check(&backend, check).await {
            Ok(outcome) => outcome,
            Err(e) => (0.0, format!("check errored: {e:#}")),
        };
        results.push(CheckResultRecord::for_submission(
            submission,
            &check.result_name(),
            score,
            &reason,
            mode,
        ));
    }

    backend.close().await;
    results
}

async fn run_check(backend: &PageBackend, check: &Check) -> anyhow::Result<(f64, String)> {
    match check {
        Check::ElementExists {
            selector,
            min_count,
        } => {
            let found = backend.count(selector).await?;
            if found >= *min_count {
                Ok((1.0, format!("found {found} matching {selector:?}")))
            } else {
                Ok((
                    0.0,
                    format!("found {found} of {min_count} required for {selector:?}"),
                ))
            }
        }
        Check::ButtonExists { text } => {
            if backend.has_button_with_text(text).await? {
                Ok((1.0, format!("found a button labeled one of {text:?}")))
            } else {
                Ok((0.0, format!("no button labeled any of {text:?}")))
            }
        }
        Check::ClickInteraction { selector, result } => {
            match backend.click_and_observe(selector).await? {
                Some(ClickObservation::EffectConfirmed) => {
                    Ok((1.0, format!("click on {selector:?} confirmed: {result}")))
                }
                Some(ClickObservation::ClickedOnly) => Ok((
                    0.5,
                    format!("clicked {selector:?} but saw no {result}"),
                )),
                Some(ClickObservation::TargetMissing) => {
                    Ok((0.0, format!("nothing to click for {selector:?}")))
                }
                // static backend cannot click, so the outcome is unknowable
                None => Ok((
                    0.5,
                    format!("interaction with {selector:?} not verifiable without a browser"),
                )),
            }
        }
        Check::ResponsiveCheck { breakpoints } => {
            match backend.responsive_score(breakpoints).await? {
                Some(score) => Ok((
                    score,
                    format!("layout held at {:.0}% of breakpoints {breakpoints:?}", score * 100.0),
                )),
                None => Ok((
                    0.5,
                    "rendering not verifiable without a browser".to_string(),
                )),
            }
        }
        Check::Unknown => anyhow::bail!("unrecognized check reached the runner"),
    }
}

/// Score whether the repository was created after the task went out. A repo
/// predating its task means prepared work, not a response to the brief.
async fn repo_creation_score(
    client: &Client,
    config: &EngineConfig,
    task_timestamp: &str,
    repo_url: &str,
) -> (f64, String) {
    let Some((owner, name)) = repo_slug(repo_url) else {
        return (0.0, format!("cannot parse repo url {repo_url:?}"));
    };
    let task_time = match DateTime::parse_from_rfc3339(task_timestamp) {
        Ok(t) => t,
        Err(e) => return (0.0, format!("unreadable task timestamp {task_timestamp:?}: {e}")),
    };

    let url = format!(
        "{}/repos/{owner}/{name}",
        config.github_api_url.trim_end_matches('/')
    );
    let resp = match client.get(&url).send().await {
        Ok(resp) => resp,
        Err(e) => return (0.0, format!("repo metadata fetch failed: {e}")),
    };
    if resp.status().as_u16() != 200 {
        return (0.0, format!("repo metadata returned {}", resp.status()));
    }
    let body: serde_json::Value = match resp.json().await {
        Ok(body) => body,
        Err(e) => return (0.0, format!("unreadable repo metadata: {e}")),
    };
    let Some(created_at) = body.get("created_at").and_then(|v| v.as_str()) else {
        return (0.0, "repo metadata has no created_at".to_string());
    };
    let created = match DateTime::parse_from_rfc3339(created_at) {
        Ok(t) => t,
        Err(e) => return (0.0, format!("unreadable created_at {created_at:?}: {e}")),
    };

    if created > task_time {
        (
            1.0,
            format!("repo created {created_at}, after the task went out {task_timestamp}"),
        )
    } else {
        (
            0.0,
            format!("repo created {created_at}, before the task went out {task_timestamp}"),
        )
    }
}

/// Pull `owner/name` off the tail of a repository URL.
fn repo_slug(repo_url: &str) -> Option<(&str, &str)> {
    let mut parts = repo_url.trim_end_matches('/').rsplit('/');
    let name = parts.next().filter(|s| !s.is_empty())?;
    let owner = parts.next().filter(|s| !s.is_empty())?;
    Some((owner, name))
}

async fn fetch_first_sibling(
    client: &Client,
    pages_url: &str,
    names: &[&str],
) -> Option<String> {
    for name in names {
        match fetch_sibling(client, pages_url, name).await {
            Ok(Some(content)) => return Some(content),
            Ok(None) => continue,
            Err(e) => {
                warn!("artifact fetch failed for {pages_url}: {e:#}");
                return None;
            }
        }
    }
    None
}
