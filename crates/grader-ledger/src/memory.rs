use std::sync::Mutex;

use anyhow::bail;
use grader_core::{CheckResultRecord, SubmissionRecord, TaskRecord};

use crate::traits::Ledger;

/// In-memory ledger for tests. Not durable, but enforces the same
/// write-once keys as the sqlite implementation.
#[derive(Default)]
pub struct MemoryLedger {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    tasks: Vec<TaskRecord>,
    submissions: Vec<SubmissionRecord>,
    results: Vec<CheckResultRecord>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Ledger for MemoryLedger {
    fn insert_task(&self, task: &TaskRecord) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .tasks
            .iter()
            .any(|t| t.email == task.email && t.task == task.task && t.round == task.round)
        {
            bail!(
                "task already recorded for {} / {} round {}",
                task.email,
                task.task,
                task.round
            );
        }
        if inner.tasks.iter().any(|t| t.nonce == task.nonce) {
            bail!("nonce already in use: {}", task.nonce);
        }
        inner.tasks.push(task.clone());
        Ok(())
    }

    fn task_exists(&self, email: &str, task: &str, round: u32) -> anyhow::Result<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .tasks
            .iter()
            .any(|t| t.email == email && t.task == task && t.round == round))
    }

    fn task_by_nonce(&self, nonce: &str) -> anyhow::Result<Option<TaskRecord>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.tasks.iter().find(|t| t.nonce == nonce).cloned())
    }

    fn tasks_by_round(&self, round: u32) -> anyhow::Result<Vec<TaskRecord>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .tasks
            .iter()
            .filter(|t| t.round == round)
            .cloned()
            .collect())
    }

    fn insert_submission(&self, submission: &SubmissionRecord) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.submissions.iter().any(|s| {
            s.email == submission.email && s.task == submission.task && s.round == submission.round
        }) {
            bail!(
                "submission already recorded for {} / {} round {}",
                submission.email,
                submission.task,
                submission.round
            );
        }
        inner.submissions.push(submission.clone());
        Ok(())
    }

    fn submission_exists(&self, email: &str, task: &str, round: u32) -> anyhow::Result<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .submissions
            .iter()
            .any(|s| s.email == email && s.task == task && s.round == round))
    }

    fn submissions_by_round(&self, round: u32) -> anyhow::Result<Vec<SubmissionRecord>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .submissions
            .iter()
            .filter(|s| s.round == round)
            .cloned()
            .collect())
    }

    fn all_submissions(&self) -> anyhow::Result<Vec<SubmissionRecord>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.submissions.clone())
    }

    fn insert_results(&self, results: &[CheckResultRecord]) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        // validate the whole batch before touching storage, matching the
        // sqlite implementation's all-or-nothing transaction
        for (i, result) in results.iter().enumerate() {
            let same_key = |r: &CheckResultRecord| {
                r.email == result.email
                    && r.task == result.task
                    && r.round == result.round
                    && r.check == result.check
            };
            if inner.results.iter().any(same_key) || results[..i].iter().any(same_key) {
                bail!(
                    "result already recorded for {} / {} round {} check {}",
                    result.email,
                    result.task,
                    result.round,
                    result.check
                );
            }
        }
        inner.results.extend(results.iter().cloned());
        Ok(())
    }

    fn result_exists(
        &self,
        email: &str,
        task: &str,
        round: u32,
        check: &str,
    ) -> anyhow::Result<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.results.iter().any(|r| {
            r.email == email && r.task == task && r.round == round && r.check == check
        }))
    }

    fn results_for(
        &self,
        email: &str,
        task: &str,
        round: u32,
    ) -> anyhow::Result<Vec<CheckResultRecord>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .results
            .iter()
            .filter(|r| r.email == email && r.task == task && r.round == round)
            .cloned()
            .collect())
    }

    fn all_results(&self) -> anyhow::Result<Vec<CheckResultRecord>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.results.clone())
    }

    fn submissions_without_results(
        &self,
        round: Option<u32>,
    ) -> anyhow::Result<Vec<SubmissionRecord>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .submissions
            .iter()
            .filter(|s| round.map_or(true, |r| s.round == r))
            .filter(|s| {
                !inner
                    .results
                    .iter()
                    .any(|r| r.email == s.email && r.task == s.task && r.round == s.round)
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grader_core::new_nonce;

    fn task(email: &str, task_id: &str, round: u32) -> TaskRecord {
        TaskRecord {
            timestamp: "2025-10-16T14:00:00Z".into(),
            email: email.into(),
            task: task_id.into(),
            round,
            nonce: new_nonce(),
            brief: "Build the thing".into(),
            attachments: vec![],
            checks: vec![],
            evaluation_url: "http://collector/api/submissions".into(),
            endpoint: "http://participant/endpoint".into(),
            dispatch_status: Some(200),
            dispatch_error: None,
        }
    }

    fn submission(email: &str, task_id: &str, round: u32, nonce: &str) -> SubmissionRecord {
        SubmissionRecord {
            timestamp: "2025-10-16T15:00:00Z".into(),
            email: email.into(),
            task: task_id.into(),
            round,
            nonce: nonce.into(),
            repo_url: "https://github.com/x/repo".into(),
            commit_sha: "abc123".into(),
            pages_url: "https://x.github.io/repo/".into(),
        }
    }

    #[test]
    fn task_write_once_per_email_task_round() {
        let ledger = MemoryLedger::new();
        let t = task("a@x.com", "calculator-ab12c", 1);
        ledger.insert_task(&t).unwrap();
        assert!(ledger.task_exists("a@x.com", "calculator-ab12c", 1).unwrap());

        let mut dup = task("a@x.com", "calculator-ab12c", 1);
        dup.nonce = new_nonce();
        assert!(ledger.insert_task(&dup).is_err());

        // Same task id in a different round is a distinct record.
        ledger.insert_task(&task("a@x.com", "calculator-ab12c", 2)).unwrap();
    }

    #[test]
    fn nonce_lookup_finds_the_owning_task() {
        let ledger = MemoryLedger::new();
        let t = task("a@x.com", "todo-list-ffee0", 1);
        ledger.insert_task(&t).unwrap();
        let found = ledger.task_by_nonce(&t.nonce).unwrap().unwrap();
        assert_eq!(found.email, "a@x.com");
        assert!(ledger.task_by_nonce("no-such-nonce").unwrap().is_none());
    }

    #[test]
    fn duplicate_submission_is_rejected() {
        let ledger = MemoryLedger::new();
        let s = submission("a@x.com", "quiz-app-11111", 1, "n-1");
        ledger.insert_submission(&s).unwrap();
        assert!(ledger.insert_submission(&s).is_err());
        assert!(ledger.submission_exists("a@x.com", "quiz-app-11111", 1).unwrap());
    }

    #[test]
    fn results_are_write_once_per_check() {
        let ledger = MemoryLedger::new();
        let s = submission("a@x.com", "quiz-app-11111", 1, "n-1");
        let r = CheckResultRecord::for_submission(&s, "page_load", 1.0, "loaded", "");
        ledger.insert_results(std::slice::from_ref(&r)).unwrap();
        assert!(ledger.insert_results(std::slice::from_ref(&r)).is_err());
        assert!(ledger
            .result_exists("a@x.com", "quiz-app-11111", 1, "page_load")
            .unwrap());

        let stored = ledger.results_for("a@x.com", "quiz-app-11111", 1).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].score, 1.0);
    }

    #[test]
    fn result_batch_with_an_internal_duplicate_inserts_nothing() {
        let ledger = MemoryLedger::new();
        let s = submission("a@x.com", "quiz-app-11111", 1, "n-1");
        let batch = vec![
            CheckResultRecord::for_submission(&s, "page_load", 1.0, "loaded", ""),
            CheckResultRecord::for_submission(&s, "license_file", 1.0, "found", ""),
            CheckResultRecord::for_submission(&s, "page_load", 0.0, "again", ""),
        ];
        assert!(ledger.insert_results(&batch).is_err());
        assert!(ledger.results_for("a@x.com", "quiz-app-11111", 1).unwrap().is_empty());
    }

    #[test]
    fn pending_submissions_excludes_already_graded() {
        let ledger = MemoryLedger::new();
        let graded = submission("a@x.com", "quiz-app-11111", 1, "n-1");
        let pending = submission("b@x.com", "calculator-ab12c", 1, "n-2");
        let round2 = submission("c@x.com", "todo-list-ffee0", 2, "n-3");
        ledger.insert_submission(&graded).unwrap();
        ledger.insert_submission(&pending).unwrap();
        ledger.insert_submission(&round2).unwrap();
        ledger
            .insert_results(&[CheckResultRecord::for_submission(
                &graded, "page_load", 1.0, "loaded", "",
            )])
            .unwrap();

        let all = ledger.submissions_without_results(None).unwrap();
        assert_eq!(all.len(), 2);

        let only_r1 = ledger.submissions_without_results(Some(1)).unwrap();
        assert_eq!(only_r1.len(), 1);
        assert_eq!(only_r1[0].email, "b@x.com");
    }
}
