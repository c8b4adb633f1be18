use crate::check::Check;
use serde::{Deserialize, Serialize};

/// Named resource shipped with a task. Carries either a fetchable `url` or
/// inline `content`, never both.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    #[serde(rename = "type")]
    pub mime: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Attachment {
    pub fn by_url(name: &str, mime: &str, url: &str) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            url: Some(url.into()),
            content: None,
        }
    }

    pub fn inline(name: &str, mime: &str, content: &str) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            url: None,
            content: Some(content.into()),
        }
    }
}

/// One assignment handed to a participant, written once by the dispatch
/// engine together with its delivery outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub timestamp: String,
    pub email: String,
    pub task: String,
    pub round: u32,
    pub nonce: String,
    pub brief: String,
    pub attachments: Vec<Attachment>,
    pub checks: Vec<Check>,
    pub evaluation_url: String,
    pub endpoint: String,
    /// Last HTTP status from dispatch; 0 means transport failure.
    pub dispatch_status: Option<u16>,
    pub dispatch_error: Option<String>,
}

/// A participant's claim that a task was fulfilled, bound to the task by
/// nonce. Written exactly once via ingestion, read-only afterward.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub timestamp: String,
    pub email: String,
    pub task: String,
    pub round: u32,
    pub nonce: String,
    pub repo_url: String,
    pub commit_sha: String,
    pub pages_url: String,
}

/// Outcome of one check against one submission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckResultRecord {
    pub timestamp: String,
    pub email: String,
    pub task: String,
    pub round: u32,
    pub repo_url: String,
    pub commit_sha: String,
    pub pages_url: String,
    pub check: String,
    pub score: f64,
    pub reason: String,
    pub logs: String,
}

impl CheckResultRecord {
    pub fn for_submission(
        sub: &SubmissionRecord,
        check: &str,
        score: f64,
        reason: &str,
        logs: &str,
    ) -> Self {
        Self {
            timestamp: crate::time::now_iso(),
            email: sub.email.clone(),
            task: sub.task.clone(),
            round: sub.round,
            repo_url: sub.repo_url.clone(),
            commit_sha: sub.commit_sha.clone(),
            pages_url: sub.pages_url.clone(),
            check: check.to_string(),
            score,
            reason: reason.to_string(),
            logs: logs.to_string(),
        }
    }
}

/// Exact wire shape POSTed to a participant endpoint. No extraneous fields:
/// the dispatch outcome and endpoint stay server-side.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskPayload {
    pub email: String,
    pub task: String,
    pub round: u32,
    pub nonce: String,
    pub brief: String,
    pub attachments: Vec<Attachment>,
    pub checks: Vec<Check>,
    pub evaluation_url: String,
    pub secret: String,
}

impl TaskPayload {
    pub fn from_record(record: &TaskRecord, secret: &str) -> Self {
        Self {
            email: record.email.clone(),
            task: record.task.clone(),
            round: record.round,
            nonce: record.nonce.clone(),
            brief: record.brief.clone(),
            attachments: record.attachments.clone(),
            checks: record.checks.clone(),
            evaluation_url: record.evaluation_url.clone(),
            secret: secret.to_string(),
        }
    }
}

/// Shape shared by the grading-collector notification and the submission
/// ingestion endpoint: task identity plus deployment coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub email: String,
    pub task: String,
    pub round: u32,
    pub nonce: String,
    pub repo_url: String,
    pub commit_sha: String,
    pub pages_url: String,
}

impl SubmissionPayload {
    pub fn into_record(self, timestamp: String) -> SubmissionRecord {
        SubmissionRecord {
            timestamp,
            email: self.email,
            task: self.task,
            round: self.round,
            nonce: self.nonce,
            repo_url: self.repo_url,
            commit_sha: self.commit_sha,
            pages_url: self.pages_url,
        }
    }
}

pub fn new_nonce() -> String {
    uuid::Uuid::new_v4().to_string()
}
