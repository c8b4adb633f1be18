use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use grader_core::{Check, CheckResultRecord, SubmissionRecord, TaskRecord};
use grader_ledger::Ledger;

/// Durable ledger on a single sqlite file. Write-once keys are enforced by
/// UNIQUE constraints in the schema, so concurrent writers cannot slip a
/// duplicate past the `*_exists` probes.
pub struct SqliteLedger {
    conn: Mutex<Connection>,
}

impl SqliteLedger {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(db_path)
            .with_context(|| format!("open sqlite db {}", db_path.display()))?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let init_sql = include_str!("../migrations/0001_init.sql");
        conn.execute_batch(init_sql)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let init_sql = include_str!("../migrations/0001_init.sql");
        conn.execute_batch(init_sql)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Dump all results as CSV, one row per (participant, task, round, check).
    pub fn export_results_csv(&self) -> Result<String> {
        let results = self.all_results()?;
        let mut out = String::from(
            "timestamp,email,task,round,repo_url,commit_sha,pages_url,check,score,reason\n",
        );
        for r in &results {
            let row = [
                r.timestamp.as_str(),
                r.email.as_str(),
                r.task.as_str(),
                &r.round.to_string(),
                r.repo_url.as_str(),
                r.commit_sha.as_str(),
                r.pages_url.as_str(),
                r.check.as_str(),
                &r.score.to_string(),
                r.reason.as_str(),
            ]
            .map(csv_field)
            .join(",");
            out.push_str(&row);
            out.push('\n');
        }
        Ok(out)
    }

    fn task_from_row(row: &Row<'_>) -> rusqlite::Result<TaskRecord> {
        let attachments_json: String = row.get(6)?;
        let checks_json: String = row.get(7)?;
        let checks: Vec<Check> = serde_json::from_str(&checks_json).unwrap_or_default();
        Ok(TaskRecord {
            timestamp: row.get(0)?,
            email: row.get(1)?,
            task: row.get(2)?,
            round: row.get::<_, i64>(3)? as u32,
            nonce: row.get(4)?,
            brief: row.get(5)?,
            attachments: serde_json::from_str(&attachments_json).unwrap_or_default(),
            checks,
            evaluation_url: row.get(8)?,
            endpoint: row.get(9)?,
            dispatch_status: row.get::<_, Option<i64>>(10)?.map(|s| s as u16),
            dispatch_error: row.get(11)?,
        })
    }

    fn submission_from_row(row: &Row<'_>) -> rusqlite::Result<SubmissionRecord> {
        Ok(SubmissionRecord {
            timestamp: row.get(0)?,
            email: row.get(1)?,
            task: row.get(2)?,
            round: row.get::<_, i64>(3)? as u32,
            nonce: row.get(4)?,
            repo_url: row.get(5)?,
            commit_sha: row.get(6)?,
            pages_url: row.get(7)?,
        })
    }

    fn result_from_row(row: &Row<'_>) -> rusqlite::Result<CheckResultRecord> {
        Ok(CheckResultRecord {
            timestamp: row.get(0)?,
            email: row.get(1)?,
            task: row.get(2)?,
            round: row.get::<_, i64>(3)? as u32,
            repo_url: row.get(4)?,
            commit_sha: row.get(5)?,
            pages_url: row.get(6)?,
            check: row.get(7)?,
            score: row.get(8)?,
            reason: row.get(9)?,
            logs: row.get(10)?,
        })
    }
}

const TASK_COLS: &str = "timestamp, email, task, round, nonce, brief, attachments_json, \
     checks_json, evaluation_url, endpoint, dispatch_status, dispatch_error";
const SUBMISSION_COLS: &str =
    "timestamp, email, task, round, nonce, repo_url, commit_sha, pages_url";
const RESULT_COLS: &str = "timestamp, email, task, round, repo_url, commit_sha, pages_url, \
     \"check\", score, reason, logs";

impl Ledger for SqliteLedger {
    fn insert_task(&self, task: &TaskRecord) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let attachments_json =
            serde_json::to_string(&task.attachments).unwrap_or_else(|_| "[]".to_string());
        let checks_json = serde_json::to_string(&task.checks).unwrap_or_else(|_| "[]".to_string());
        conn.execute(
            "INSERT INTO tasks(timestamp, email, task, round, nonce, brief, attachments_json, \
             checks_json, evaluation_url, endpoint, dispatch_status, dispatch_error) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                task.timestamp,
                task.email,
                task.task,
                task.round as i64,
                task.nonce,
                task.brief,
                attachments_json,
                checks_json,
                task.evaluation_url,
                task.endpoint,
                task.dispatch_status.map(|s| s as i64),
                task.dispatch_error,
            ],
        )
        .with_context(|| format!("insert task {} for {}", task.task, task.email))?;
        Ok(())
    }

    fn task_exists(&self, email: &str, task: &str, round: u32) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(1) FROM tasks WHERE email=?1 AND task=?2 AND round=?3",
            params![email, task, round as i64],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    }

    fn task_by_nonce(&self, nonce: &str) -> Result<Option<TaskRecord>> {
        let conn = self.conn.lock().unwrap();
        let record = conn
            .query_row(
                &format!("SELECT {TASK_COLS} FROM tasks WHERE nonce=?1"),
                params![nonce],
                Self::task_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn tasks_by_round(&self, round: u32) -> Result<Vec<TaskRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare(&format!("SELECT {TASK_COLS} FROM tasks WHERE round=?1 ORDER BY id"))?;
        let rows = stmt.query_map(params![round as i64], Self::task_from_row)?;
        let mut tasks = vec![];
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }

    fn insert_submission(&self, submission: &SubmissionRecord) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO submissions(timestamp, email, task, round, nonce, repo_url, \
             commit_sha, pages_url) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                submission.timestamp,
                submission.email,
                submission.task,
                submission.round as i64,
                submission.nonce,
                submission.repo_url,
                submission.commit_sha,
                submission.pages_url,
            ],
        )
        .with_context(|| {
            format!(
                "insert submission {} for {}",
                submission.task, submission.email
            )
        })?;
        Ok(())
    }

    fn submission_exists(&self, email: &str, task: &str, round: u32) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(1) FROM submissions WHERE email=?1 AND task=?2 AND round=?3",
            params![email, task, round as i64],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    }

    fn submissions_by_round(&self, round: u32) -> Result<Vec<SubmissionRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SUBMISSION_COLS} FROM submissions WHERE round=?1 ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![round as i64], Self::submission_from_row)?;
        let mut submissions = vec![];
        for row in rows {
            submissions.push(row?);
        }
        Ok(submissions)
    }

    fn all_submissions(&self) -> Result<Vec<SubmissionRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare(&format!("SELECT {SUBMISSION_COLS} FROM submissions ORDER BY id"))?;
        let rows = stmt.query_map([], Self::submission_from_row)?;
        let mut submissions = vec![];
        for row in rows {
            submissions.push(row?);
        }
        Ok(submissions)
    }

    fn insert_results(&self, results: &[CheckResultRecord]) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let tx = conn.unchecked_transaction()?;
        for result in results {
            tx.execute(
                "INSERT INTO results(timestamp, email, task, round, repo_url, commit_sha, \
                 pages_url, \"check\", score, reason, logs) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    result.timestamp,
                    result.email,
                    result.task,
                    result.round as i64,
                    result.repo_url,
                    result.commit_sha,
                    result.pages_url,
                    result.check,
                    result.score,
                    result.reason,
                    result.logs,
                ],
            )
            .with_context(|| {
                format!(
                    "insert result {} for {} / {}",
                    result.check, result.email, result.task
                )
            })?;
        }
        tx.commit()?;
        Ok(())
    }

    fn result_exists(&self, email: &str, task: &str, round: u32, check: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(1) FROM results WHERE email=?1 AND task=?2 AND round=?3 AND \"check\"=?4",
            params![email, task, round as i64, check],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    }

    fn results_for(&self, email: &str, task: &str, round: u32) -> Result<Vec<CheckResultRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {RESULT_COLS} FROM results WHERE email=?1 AND task=?2 AND round=?3 ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![email, task, round as i64], Self::result_from_row)?;
        let mut results = vec![];
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    fn all_results(&self) -> Result<Vec<CheckResultRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!("SELECT {RESULT_COLS} FROM results ORDER BY id"))?;
        let rows = stmt.query_map([], Self::result_from_row)?;
        let mut results = vec![];
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    fn submissions_without_results(&self, round: Option<u32>) -> Result<Vec<SubmissionRecord>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {SUBMISSION_COLS} FROM submissions s \
             WHERE NOT EXISTS (SELECT 1 FROM results r \
                 WHERE r.email = s.email AND r.task = s.task AND r.round = s.round) \
             {} ORDER BY s.id",
            if round.is_some() { "AND s.round = ?1" } else { "" }
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut submissions = vec![];
        match round {
            Some(r) => {
                let rows = stmt.query_map(params![r as i64], Self::submission_from_row)?;
                for row in rows {
                    submissions.push(row?);
                }
            }
            None => {
                let rows = stmt.query_map([], Self::submission_from_row)?;
                for row in rows {
                    submissions.push(row?);
                }
            }
        }
        Ok(submissions)
    }
}

/// RFC 4180 quoting: fields containing a comma, quote or newline get quoted,
/// with embedded quotes doubled.
fn csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
