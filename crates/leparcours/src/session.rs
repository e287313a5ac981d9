//! Proposal session and session store
//!
//! A [`ProposalSession`] is the draft one caseworker accumulates across the
//! pages of a single authoring journey. The store is read-modify-write:
//! handlers `get` the draft, mutate it, and `set` it back. Two requests on
//! the same journey race with last-write-wins.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use crate::fields::{Answers, Field};
use crate::steps::Mode;

/// Identifier of one authoring journey.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JourneyId(String);

impl JourneyId {
    /// Wrap a journey identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JourneyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-assigned identity of a created proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalReference {
    /// Human reference, e.g. `ANC501E/000A/001A`
    pub reference_number: String,
    /// URL-safe form of the reference
    pub slug: String,
}

/// State of the benefit-area attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UploadState {
    /// Upload initiated; the file service is still processing it.
    Pending {
        /// File-service handle
        upload_id: String,
    },
    /// File accepted.
    Ready {
        /// File-service handle
        upload_id: String,
        /// Original file name, when reported
        filename: Option<String>,
    },
    /// File rejected, or processing outlasted the poll budget.
    Failed {
        /// File-service handle
        upload_id: String,
        /// Redirect-carried error code
        code: String,
        /// Reason shown to the caseworker
        reason: String,
    },
}

impl UploadState {
    /// File-service handle, whatever the state.
    pub fn upload_id(&self) -> &str {
        match self {
            UploadState::Pending { upload_id }
            | UploadState::Ready { upload_id, .. }
            | UploadState::Failed { upload_id, .. } => upload_id,
        }
    }
}

/// Draft of one proposal, scoped to one authoring journey.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalSession {
    /// Every answer given so far
    pub answers: Answers,
    /// Caseworker came in from the summary page to change an answer
    pub is_edit: bool,
    /// Benefit-area attachment, if one was started
    pub upload: Option<UploadState>,
    reference: Option<ProposalReference>,
}

impl ProposalSession {
    /// Fresh, empty draft
    pub fn new() -> Self {
        Self::default()
    }

    /// Draft for an already-created proposal.
    pub fn with_reference(reference_number: impl Into<String>, slug: impl Into<String>) -> Self {
        let mut session = Self::new();
        session.assign_reference(reference_number, slug);
        session
    }

    /// Assigned reference, if the proposal exists on the backend.
    pub fn reference(&self) -> Option<&ProposalReference> {
        self.reference.as_ref()
    }

    /// Assigned reference number
    pub fn reference_number(&self) -> Option<&str> {
        self.reference.as_ref().map(|r| r.reference_number.as_str())
    }

    /// Assigned slug
    pub fn slug(&self) -> Option<&str> {
        self.reference.as_ref().map(|r| r.slug.as_str())
    }

    /// Record the server-assigned reference.
    ///
    /// Write-once: returns `false` and changes nothing when a reference is
    /// already present.
    pub fn assign_reference(
        &mut self,
        reference_number: impl Into<String>,
        slug: impl Into<String>,
    ) -> bool {
        if self.reference.is_some() {
            return false;
        }
        self.reference = Some(ProposalReference {
            reference_number: reference_number.into(),
            slug: slug.into(),
        });
        true
    }

    /// Edit mode needs both the flag and an existing proposal.
    pub fn mode(&self) -> Mode {
        if self.is_edit && self.reference.is_some() {
            Mode::Edit
        } else {
            Mode::Create
        }
    }

    /// JSON value of a field, reference number included.
    pub fn value_of(&self, field: Field) -> Option<Value> {
        match field {
            Field::ReferenceNumber => self.reference_number().map(Value::from),
            other => self.answers.get(other).map(|a| a.to_value()),
        }
    }
}

/// Per-journey draft storage.
pub trait SessionStore: Send + Sync {
    /// Draft for a journey, if one was written.
    fn get(&self, journey: &JourneyId) -> Option<ProposalSession>;

    /// Replace a journey's draft.
    fn set(&self, journey: &JourneyId, session: ProposalSession);

    /// Forget a journey's draft (restart or completion).
    fn remove(&self, journey: &JourneyId);
}

/// Process-local session store.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<JourneyId, ProposalSession>>,
}

impl InMemorySessionStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of journeys with a draft
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no journey has a draft
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, journey: &JourneyId) -> Option<ProposalSession> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(journey)
            .cloned()
    }

    fn set(&self, journey: &JourneyId, session: ProposalSession) {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(journey.clone(), session);
    }

    fn remove(&self, journey: &JourneyId) {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(journey);
    }
}
