use std::time::Duration;

use grader_core::{backoff, SubmissionPayload};
use reqwest::Client;
use tokio::time::sleep;
use tracing::{info, warn};

/// Notification retry policy: one initial attempt plus `max_retries`
/// retries under doubling backoff. With the defaults that is 8 attempts
/// and at most 127s of cumulative sleep.
#[derive(Clone, Debug)]
pub struct NotifyConfig {
    pub max_retries: u32,
    pub request_timeout: Duration,
    /// Multiplied by the backoff step count; tests shrink it to zero.
    pub delay_unit: Duration,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            max_retries: 7,
            request_timeout: Duration::from_secs(30),
            delay_unit: Duration::from_secs(1),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NotifyOutcome {
    pub accepted: bool,
    pub status: Option<u16>,
    pub attempts: u32,
    pub error: Option<String>,
}

/// POST a completed submission to the collector, retrying until it answers
/// 200 or the retry budget runs out.
pub async fn notify_submission(
    client: &Client,
    evaluation_url: &str,
    payload: &SubmissionPayload,
    config: &NotifyConfig,
) -> NotifyOutcome {
    let total_attempts = config.max_retries + 1;
    let mut status: Option<u16> = None;
    let mut error: Option<String> = None;

    for attempt in 1..=total_attempts {
        let result = client
            .post(evaluation_url)
            .timeout(config.request_timeout)
            .json(payload)
            .send()
            .await;

        match result {
            Ok(resp) => {
                let code = resp.status().as_u16();
                status = Some(code);
                if code == 200 {
                    info!(
                        "submission {} for {} accepted (attempt {attempt})",
                        payload.task, payload.email
                    );
                    return NotifyOutcome {
                        accepted: true,
                        status,
                        attempts: attempt,
                        error: None,
                    };
                }
                error = Some(format!("collector returned {code}"));
                warn!(
                    "submission notify for {} got {code} (attempt {attempt}/{total_attempts})",
                    payload.email
                );
            }
            Err(e) => {
                status = None;
                error = Some(e.to_string());
                warn!(
                    "submission notify for {} failed: {e} (attempt {attempt}/{total_attempts})",
                    payload.email
                );
            }
        }

        if attempt < total_attempts {
            sleep(config.delay_unit * backoff::notify_delay_seconds(attempt) as u32).await;
        }
    }

    NotifyOutcome {
        accepted: false,
        status,
        attempts: total_attempts,
        error,
    }
}
