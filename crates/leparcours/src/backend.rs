//! Backend collaborators
//!
//! The proposal API and the area directory are reached through traits so the
//! journey can be driven against the HTTP gateway in production and against
//! in-memory fakes in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

use crate::levels::SaveLevel;

/// Caller's access token, forwarded as a bearer credential.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token, for the `Authorization` header only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Failure to reach a collaborator or to read its answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection, timeout or protocol failure
    #[error("request failed: {0}")]
    Request(String),

    /// Non-success status without a usable body
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// Body did not have the expected shape
    #[error("undecodable response: {0}")]
    Decode(String),
}

/// One partial submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    /// Checkpoint being saved
    pub level: SaveLevel,
    /// Fields owned by the level
    pub payload: Map<String, Value>,
}

/// Proposal as echoed back by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalRecord {
    /// Assigned reference number
    #[serde(default)]
    pub reference_number: Option<String>,
    /// Assigned slug
    #[serde(default)]
    pub slug: Option<String>,
    /// Any other returned attributes
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Outcome of a well-formed backend response.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendReply {
    /// `success: true`
    Accepted(ProposalRecord),
    /// `success: false`; the whole body is kept for classification
    Rejected(Value),
}

impl BackendReply {
    /// Read a `{ success, data | validationErrors | errors }` envelope.
    ///
    /// Anything without `success: true` is a rejection.
    pub fn from_body(body: Value) -> Self {
        if body.get("success").and_then(Value::as_bool) != Some(true) {
            return BackendReply::Rejected(body);
        }
        let record = body
            .get("data")
            .cloned()
            .and_then(|data| serde_json::from_value(data).ok())
            .unwrap_or_default();
        BackendReply::Accepted(record)
    }
}

/// Organisational area a proposal belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    /// Area identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Hierarchy level, e.g. `PSO Area`
    #[serde(default)]
    pub area_type: Option<String>,
}

/// Backend proposal API.
#[async_trait]
pub trait ProposalBackend: Send + Sync {
    /// Submit one save level.
    async fn submit(
        &self,
        request: &SubmissionRequest,
        credential: &Credential,
    ) -> Result<BackendReply, TransportError>;
}

/// Reference data for organisational areas.
#[async_trait]
pub trait AreaDirectory: Send + Sync {
    /// Look up an area; `None` when it does not exist.
    async fn area(&self, id: i64, credential: &Credential) -> Result<Option<Area>, TransportError>;
}
