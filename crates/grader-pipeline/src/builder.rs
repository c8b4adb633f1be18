use grader_core::{SubmissionPayload, TaskPayload};
use reqwest::Client;
use tracing::warn;

use crate::notify::{notify_submission, NotifyConfig, NotifyOutcome};

/// A generated project: file name to content. Kept flat because graded
/// projects are single-page sites.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectFiles {
    pub files: Vec<(String, String)>,
}

impl ProjectFiles {
    pub fn with_file(mut self, name: &str, content: &str) -> Self {
        self.files.push((name.to_string(), content.to_string()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.as_str())
    }
}

/// Where a published project can be found.
#[derive(Clone, Debug, PartialEq)]
pub struct Publication {
    pub repo_url: String,
    pub commit_sha: String,
    pub pages_url: String,
}

/// Turns a task brief into project files. Implementations range from
/// template stamping to driving a code model; the workflow does not care.
pub trait CodeSynthesizer: Send + Sync {
    fn synthesize(&self, task: &TaskPayload) -> anyhow::Result<ProjectFiles>;
}

/// Pushes project files somewhere publicly reachable and reports the
/// resulting coordinates.
pub trait Publisher: Send + Sync {
    fn publish(&self, task: &TaskPayload, files: &ProjectFiles) -> anyhow::Result<Publication>;
}

/// Participant-side workflow: synthesize, publish, then tell the collector.
/// A failed notification is degraded to a warning because the work itself
/// is already live; operators can re-notify by hand.
pub async fn build_and_notify(
    client: &Client,
    task: &TaskPayload,
    synthesizer: &dyn CodeSynthesizer,
    publisher: &dyn Publisher,
    notify: &NotifyConfig,
) -> anyhow::Result<(Publication, NotifyOutcome)> {
    let files = synthesizer.synthesize(task)?;
    let publication = publisher.publish(task, &files)?;

    let payload = SubmissionPayload {
        email: task.email.clone(),
        task: task.task.clone(),
        round: task.round,
        nonce: task.nonce.clone(),
        repo_url: publication.repo_url.clone(),
        commit_sha: publication.commit_sha.clone(),
        pages_url: publication.pages_url.clone(),
    };
    let outcome = notify_submission(client, &task.evaluation_url, &payload, notify).await;
    if !outcome.accepted {
        warn!(
            "submission for {} published at {} but the collector never accepted it",
            task.email, publication.pages_url
        );
    }
    Ok((publication, outcome))
}
