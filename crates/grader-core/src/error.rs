use thiserror::Error;

/// Task generation failures. These abort generation for one participant
/// only; the batch loop continues with the rest.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The template id parsed out of a prior-round task id is not in the
    /// catalog (malformed or foreign task id).
    #[error("template not found for task id {task_id:?}")]
    TemplateNotFound { task_id: String },
}

/// Submission ingestion failures. All of these are client errors: the
/// submission is rejected synchronously and never stored.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid nonce: no matching task")]
    NonceNotFound,
    /// The nonce resolved to a task whose identity fields disagree with the
    /// submission (anti-spoofing).
    #[error("{field} does not match the task record")]
    IdentityMismatch { field: &'static str },
    #[error("a submission already exists for this task and round")]
    Duplicate,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl IngestError {
    pub fn is_client_error(&self) -> bool {
        !matches!(self, IngestError::Storage(_))
    }
}
