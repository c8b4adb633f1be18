use std::time::Duration;

use grader_core::{backoff, TaskPayload};
use reqwest::Client;
use tokio::time::sleep;
use tracing::{info, warn};

/// Dispatch retry policy. A delivery only counts when the participant
/// endpoint answers exactly 200; any other status or a transport error
/// burns an attempt.
#[derive(Clone, Debug)]
pub struct DispatchConfig {
    pub max_attempts: u32,
    pub request_timeout: Duration,
    /// Sleep inserted between attempt n and n+1.
    pub retry_delays: Vec<Duration>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            request_timeout: Duration::from_secs(300),
            retry_delays: (1..3)
                .map(|n| Duration::from_secs(backoff::dispatch_delay_seconds(n)))
                .collect(),
        }
    }
}

/// What dispatch leaves behind for the ledger: the last status seen (0 for
/// transport failures), the last error text, and how many attempts it took.
#[derive(Clone, Debug, PartialEq)]
pub struct DispatchOutcome {
    pub status: u16,
    pub error: Option<String>,
    pub attempts: u32,
}

impl DispatchOutcome {
    pub fn delivered(&self) -> bool {
        self.status == 200
    }
}

/// POST a task to a participant endpoint, retrying per the config schedule.
pub async fn dispatch_task(
    client: &Client,
    endpoint: &str,
    payload: &TaskPayload,
    config: &DispatchConfig,
) -> DispatchOutcome {
    let mut status: u16 = 0;
    let mut error: Option<String> = None;

    for attempt in 1..=config.max_attempts {
        let result = client
            .post(endpoint)
            .timeout(config.request_timeout)
            .json(payload)
            .send()
            .await;

        match result {
            Ok(resp) => {
                status = resp.status().as_u16();
                if status == 200 {
                    info!(
                        "dispatched task {} to {} (attempt {attempt})",
                        payload.task, payload.email
                    );
                    return DispatchOutcome {
                        status,
                        error: None,
                        attempts: attempt,
                    };
                }
                error = Some(format!("endpoint returned {status}"));
                warn!(
                    "dispatch of {} to {} got {status} (attempt {attempt}/{})",
                    payload.task, payload.email, config.max_attempts
                );
            }
            Err(e) => {
                status = 0;
                error = Some(e.to_string());
                warn!(
                    "dispatch of {} to {} failed: {e} (attempt {attempt}/{})",
                    payload.task, payload.email, config.max_attempts
                );
            }
        }

        if attempt < config.max_attempts {
            if let Some(delay) = config.retry_delays.get((attempt - 1) as usize) {
                sleep(*delay).await;
            }
        }
    }

    DispatchOutcome {
        status,
        error,
        attempts: config.max_attempts,
    }
}
