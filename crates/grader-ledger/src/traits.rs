use grader_core::{CheckResultRecord, SubmissionRecord, TaskRecord};

/// Append-only store for tasks, submissions and check results.
///
/// Uniqueness is keyed the same way everywhere: a task is identified by
/// (email, task, round), a submission by the same triple, and a result by
/// (email, task, round, check). Implementations must enforce write-once on
/// those keys; the pipeline relies on `*_exists` probes for idempotent
/// re-runs.
pub trait Ledger: Send + Sync {
    fn insert_task(&self, task: &TaskRecord) -> anyhow::Result<()>;
    fn task_exists(&self, email: &str, task: &str, round: u32) -> anyhow::Result<bool>;
    /// Nonce lookup for submission ingestion. Nonces are globally unique.
    fn task_by_nonce(&self, nonce: &str) -> anyhow::Result<Option<TaskRecord>>;
    fn tasks_by_round(&self, round: u32) -> anyhow::Result<Vec<TaskRecord>>;

    fn insert_submission(&self, submission: &SubmissionRecord) -> anyhow::Result<()>;
    fn submission_exists(&self, email: &str, task: &str, round: u32) -> anyhow::Result<bool>;
    fn submissions_by_round(&self, round: u32) -> anyhow::Result<Vec<SubmissionRecord>>;
    fn all_submissions(&self) -> anyhow::Result<Vec<SubmissionRecord>>;

    fn insert_results(&self, results: &[CheckResultRecord]) -> anyhow::Result<()>;
    fn result_exists(&self, email: &str, task: &str, round: u32, check: &str)
        -> anyhow::Result<bool>;
    fn results_for(&self, email: &str, task: &str, round: u32)
        -> anyhow::Result<Vec<CheckResultRecord>>;
    fn all_results(&self) -> anyhow::Result<Vec<CheckResultRecord>>;

    /// Submissions that have no stored results yet, in insertion order.
    fn submissions_without_results(&self, round: Option<u32>)
        -> anyhow::Result<Vec<SubmissionRecord>>;
}
