//! leparcours - Proposal Authoring Journey
//!
//! *Le Parcours* (The Journey) - session-scoped state machine through which a
//! caseworker authors a multi-page project proposal: step registry,
//! navigation, save-level payloads, backend submission, summary enrichment
//! and attachment status polling.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Backend proposal API and area directory collaborators.
pub mod backend;
/// Injected calendar clock.
pub mod clock;
/// Calendar and fiscal-year arithmetic.
pub mod dates;
/// Enrichment pipeline over read models.
pub mod enrichment;
/// Workflow error taxonomy.
pub mod error;
/// Answer fields, form values and the draft answer map.
pub mod fields;
/// Save levels and their field lists.
pub mod levels;
/// Next-step and back-link computation.
pub mod navigation;
/// Save-level payload projection.
pub mod payload;
/// Proposal draft and session store.
pub mod session;
/// Step registry and guarded transitions.
pub mod steps;
/// Backend submission and reference reconciliation.
pub mod submission;
/// Summary page view model and its enrichments.
pub mod summary;
/// Proposal domain enumerations.
pub mod types;
/// Attachment initiation and status polling.
pub mod upload;
/// Step validators.
pub mod validation;
/// Per-page read and write paths.
pub mod workflow;

pub use backend::{
    Area, AreaDirectory, BackendReply, Credential, ProposalBackend, ProposalRecord,
    SubmissionRequest, TransportError,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use enrichment::{enrich, Enrichment, EnrichmentError, EnrichmentResult, EnrichmentStep};
pub use error::{FieldError, ProposalError, Result, ValidationErrors};
pub use fields::{Answer, Answers, Field, FieldKind, FormValues};
pub use levels::{fields_for, SaveLevel};
pub use navigation::{back_link, next_step, next_transition};
pub use payload::build_payload;
pub use session::{
    InMemorySessionStore, JourneyId, ProposalReference, ProposalSession, SessionStore,
    UploadState,
};
pub use steps::{descriptor, Mode, StepDescriptor, StepId, Target, STEP_REGISTRY};
pub use submission::submit;
pub use summary::{build_summary, SummaryContext, SummaryView};
pub use types::{InterventionType, ProjectType, UrgencyReason};
pub use upload::{
    initiate_upload, record_poll_result, PollConfig, PollResult, UploadHandle, UploadRequest,
    UploadService, UploadStatus, UploadStatusPoller, UploadStatusReport,
};
pub use validation::{ValidationContext, Validator};
pub use workflow::{load_step, process_step, StepOutcome, StepPage};
