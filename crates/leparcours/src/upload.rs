//! Benefit-area attachment
//!
//! Initiating an upload with the file service, polling its processing
//! status with a bounded number of evenly spaced checks, and folding the
//! outcome back into the draft.
//!
//! The poller waits inside the request that asked for it. It returns after
//! at most `max_attempts` status checks and never sleeps after the last one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::backend::{Credential, TransportError};
use crate::error::{ProposalError, Result};
use crate::session::{ProposalSession, UploadState};
use crate::steps::SUMMARY_PATH;

/// Upload page path.
pub const UPLOAD_PATH: &str = "/proposal/benefit-area-file";

/// Status polling path; the file service redirects here once the file is sent.
pub const UPLOAD_STATUS_PATH: &str = "/proposal/benefit-area-file/status";

/// Reason recorded when the file service rejects a file without saying why.
pub const GENERIC_REJECTION_REASON: &str = "The selected file could not be uploaded";

/// Default number of status checks.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default wait between status checks.
pub const DEFAULT_POLL_DELAY: Duration = Duration::from_secs(2);

/// Request to start an upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    /// Kind of owning entity, always `proposal`
    pub entity_type: String,
    /// Owning proposal's slug
    pub entity_id: String,
    /// Owning proposal's reference number
    pub reference: String,
    /// Where the file service sends the browser afterwards
    pub redirect_path: String,
    /// Free-form document metadata
    pub metadata: Map<String, Value>,
}

impl UploadRequest {
    /// Benefit-area shapefile request for a proposal.
    pub fn benefit_area(reference: &str, slug: &str) -> Self {
        let mut metadata = Map::new();
        metadata.insert("documentType".to_string(), Value::from("benefit_area"));
        Self {
            entity_type: "proposal".to_string(),
            entity_id: slug.to_string(),
            reference: reference.to_string(),
            redirect_path: UPLOAD_STATUS_PATH.to_string(),
            metadata,
        }
    }
}

/// File-service handle for a started upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadHandle {
    /// Upload identifier used for status checks
    pub upload_id: String,
    /// Where the browser sends the file
    pub upload_url: String,
}

/// Processing state reported by the file service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// Waiting for the file
    Pending,
    /// Queued for scanning
    Queued,
    /// Being scanned or converted
    Processing,
    /// Accepted
    #[serde(alias = "complete", alias = "completed")]
    Ready,
    /// Refused
    #[serde(alias = "failed")]
    Rejected,
    /// Anything else; treated as still in progress
    #[serde(other)]
    Unknown,
}

/// One status report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadStatusReport {
    /// Processing state
    pub upload_status: UploadStatus,
    /// Original file name
    #[serde(default)]
    pub filename: Option<String>,
    /// Why the file was refused
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

/// File-upload service.
#[async_trait]
pub trait UploadService: Send + Sync {
    /// Start an upload.
    async fn initiate(
        &self,
        request: &UploadRequest,
        credential: &Credential,
    ) -> std::result::Result<UploadHandle, TransportError>;

    /// Current processing state. Implementations must not retry.
    async fn status(
        &self,
        upload_id: &str,
        credential: &Credential,
    ) -> std::result::Result<UploadStatusReport, TransportError>;

    /// Fresh, short-lived download link for an accepted file.
    async fn download_url(
        &self,
        upload_id: &str,
        credential: &Credential,
    ) -> std::result::Result<String, TransportError>;
}

/// Outcome of polling, or of classifying one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResult {
    /// Not finished yet
    Pending,
    /// File accepted
    Success {
        /// Original file name, when reported
        filename: Option<String>,
    },
    /// File refused
    Failure {
        /// Reason shown to the caseworker
        reason: String,
    },
    /// Still processing when the attempt budget ran out
    Timeout {
        /// Status checks issued
        attempts: u32,
    },
}

impl PollResult {
    /// Classify one status report.
    pub fn classify(report: &UploadStatusReport) -> Self {
        match report.upload_status {
            UploadStatus::Ready => PollResult::Success {
                filename: report.filename.clone(),
            },
            UploadStatus::Rejected => PollResult::Failure {
                reason: report
                    .rejection_reason
                    .clone()
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| GENERIC_REJECTION_REASON.to_string()),
            },
            UploadStatus::Pending
            | UploadStatus::Queued
            | UploadStatus::Processing
            | UploadStatus::Unknown => PollResult::Pending,
        }
    }

    /// Whether polling stops here.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollResult::Pending)
    }
}

/// Poll budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Status checks before giving up
    pub max_attempts: u32,
    /// Wait between checks
    pub delay: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_POLL_DELAY,
        }
    }
}

/// Bounded status poller.
pub struct UploadStatusPoller<'a> {
    service: &'a dyn UploadService,
    config: PollConfig,
}

impl<'a> UploadStatusPoller<'a> {
    /// Poller over `service` with the given budget.
    pub fn new(service: &'a dyn UploadService, config: PollConfig) -> Self {
        Self { service, config }
    }

    /// Poll until a terminal status or the budget runs out.
    ///
    /// A transport error on one check is logged and counted as an
    /// inconclusive attempt. Returns exactly one of `Success`, `Failure` or
    /// `Timeout`.
    pub async fn poll(&self, upload_id: &str, credential: &Credential) -> PollResult {
        for attempt in 1..=self.config.max_attempts {
            match self.service.status(upload_id, credential).await {
                Ok(report) => {
                    let result = PollResult::classify(&report);
                    if result.is_terminal() {
                        debug!(upload_id, attempt, "Upload reached terminal status");
                        return result;
                    }
                    debug!(upload_id, attempt, status = ?report.upload_status, "Upload still processing");
                }
                Err(err) => {
                    warn!(upload_id, attempt, error = %err, "Upload status check failed");
                }
            }
            if attempt < self.config.max_attempts {
                tokio::time::sleep(self.config.delay).await;
            }
        }
        warn!(upload_id, attempts = self.config.max_attempts, "Upload polling timed out");
        PollResult::Timeout {
            attempts: self.config.max_attempts,
        }
    }
}

/// Start a benefit-area upload for the draft's proposal.
///
/// Stores the pending handle in the session and returns the URL the
/// browser should send the file to.
pub async fn initiate_upload(
    session: &mut ProposalSession,
    service: &dyn UploadService,
    credential: &Credential,
) -> Result<UploadHandle> {
    let reference = session
        .reference()
        .cloned()
        .ok_or_else(|| ProposalError::MissingReference {
            page: "benefit-area-file".to_string(),
        })?;

    let request = UploadRequest::benefit_area(&reference.reference_number, &reference.slug);
    let handle = service.initiate(&request, credential).await.map_err(|err| {
        warn!(reference = %reference.reference_number, error = %err, "Upload initiation failed");
        ProposalError::from(err)
    })?;

    info!(reference = %reference.reference_number, upload_id = %handle.upload_id, "Upload initiated");
    session.upload = Some(UploadState::Pending {
        upload_id: handle.upload_id.clone(),
    });
    Ok(handle)
}

/// Fold a poll outcome into the draft and return the redirect path.
///
/// Success returns to the summary; anything else returns to the upload page
/// with the failure code in `?error=`.
pub fn record_poll_result(session: &mut ProposalSession, upload_id: &str, result: PollResult) -> String {
    let failure = match result {
        PollResult::Success { filename } => {
            info!(upload_id, filename = ?filename, "Upload accepted");
            session.upload = Some(UploadState::Ready {
                upload_id: upload_id.to_string(),
                filename,
            });
            return SUMMARY_PATH.to_string();
        }
        PollResult::Failure { reason } => ProposalError::UploadRejected { reason },
        PollResult::Timeout { attempts } => ProposalError::UploadTimeout { attempts },
        PollResult::Pending => ProposalError::UploadTimeout { attempts: 0 },
    };

    let reason = match &failure {
        ProposalError::UploadRejected { reason } => reason.clone(),
        other => other.to_string(),
    };
    warn!(upload_id, code = failure.code(), reason = %reason, "Upload failed");
    session.upload = Some(UploadState::Failed {
        upload_id: upload_id.to_string(),
        code: failure.code().to_string(),
        reason,
    });
    format!("{UPLOAD_PATH}?error={}", failure.code())
}
