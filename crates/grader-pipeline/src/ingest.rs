use grader_core::{time, IngestError, SubmissionPayload, SubmissionRecord};
use grader_ledger::Ledger;
use tracing::info;

/// Validate and record one incoming submission.
///
/// The nonce is the capability: it must resolve to a dispatched task, and
/// the identity fields riding along must agree with that task record.
/// Validation order is fixed (nonce, email, task, round, duplicate) so
/// callers get stable error responses.
pub fn ingest_submission(
    ledger: &dyn Ledger,
    payload: SubmissionPayload,
) -> Result<SubmissionRecord, IngestError> {
    let task = ledger
        .task_by_nonce(&payload.nonce)?
        .ok_or(IngestError::NonceNotFound)?;

    if payload.email != task.email {
        return Err(IngestError::IdentityMismatch { field: "email" });
    }
    if payload.task != task.task {
        return Err(IngestError::IdentityMismatch { field: "task" });
    }
    if payload.round != task.round {
        return Err(IngestError::IdentityMismatch { field: "round" });
    }
    if ledger.submission_exists(&payload.email, &payload.task, payload.round)? {
        return Err(IngestError::Duplicate);
    }

    let record = payload.into_record(time::now_iso());
    ledger.insert_submission(&record)?;
    info!(
        "accepted submission {} from {} (round {})",
        record.task, record.email, record.round
    );
    Ok(record)
}
