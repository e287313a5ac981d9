//! Submission orchestrator
//!
//! Sends one save level to the backend and reconciles the draft with the
//! identifiers the backend assigns. Failures are classified into
//! [`ProposalError`] and the draft's answers are left as entered.

use tracing::{debug, info, warn};

use crate::backend::{BackendReply, Credential, ProposalBackend, ProposalRecord, SubmissionRequest};
use crate::error::{ProposalError, Result};
use crate::levels::SaveLevel;
use crate::payload::build_payload;
use crate::session::ProposalSession;

/// Submit `session` at `level`.
///
/// On the first successful submission that returns a reference number and
/// slug they are copied into the session; later submissions never overwrite
/// them.
pub async fn submit(
    session: &mut ProposalSession,
    level: SaveLevel,
    credential: &Credential,
    backend: &dyn ProposalBackend,
) -> Result<ProposalRecord> {
    let payload = build_payload(session, level)?;
    debug!(level = %level, fields = payload.len(), "Submitting proposal");
    let request = SubmissionRequest { level, payload };

    let reply = backend.submit(&request, credential).await.map_err(|err| {
        warn!(level = %level, error = %err, "Proposal submission failed in transport");
        ProposalError::from(err)
    })?;

    let record = match reply {
        BackendReply::Accepted(record) => record,
        BackendReply::Rejected(body) => {
            let err = ProposalError::from_rejection(body);
            warn!(level = %level, code = err.code(), "Proposal submission rejected");
            return Err(err);
        }
    };

    if let (Some(reference_number), Some(slug)) = (&record.reference_number, &record.slug) {
        if session.assign_reference(reference_number.clone(), slug.clone()) {
            info!(level = %level, reference = %reference_number, "Proposal reference assigned");
        }
    }
    Ok(record)
}
