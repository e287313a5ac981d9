//! Proposal workflow errors
//!
//! *La Gestion des Erreurs* for the authoring journey. Every failure the
//! journey can surface is one [`ProposalError`] variant; [`ProposalError::code`]
//! gives the stable code rendered in banners and redirect query strings, and
//! [`ProposalError::field_errors`] the inline errors for both validation kinds.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::backend::TransportError;
use crate::fields::Field;
use crate::steps::{Mode, StepId};

/// Result type for proposal workflow operations
pub type Result<T> = std::result::Result<T, ProposalError>;

/// Code for field-level failures, local or server-side.
pub const VALIDATION_ERROR_CODE: &str = "VALIDATION_ERROR";
/// Fallback code when no structured backend error is available.
pub const NETWORK_ERROR_CODE: &str = "NETWORK_ERROR";
/// Upload still processing when the attempt budget ran out.
pub const UPLOAD_TIMEOUT_CODE: &str = "UPLOAD_TIMEOUT";
/// Upload refused by the file service.
pub const UPLOAD_REJECTED_CODE: &str = "UPLOAD_REJECTED";
/// Step table or save-level table out of step with each other.
pub const CONFIGURATION_ERROR_CODE: &str = "CONFIGURATION_ERROR";
/// A step that edits an existing proposal was reached before one exists.
pub const REFERENCE_REQUIRED_CODE: &str = "REFERENCE_REQUIRED";

/// One field-level error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Wire key of the offending field
    pub field: String,
    /// Machine-readable reason, e.g. `required`
    pub code: String,
}

impl FieldError {
    /// Create a field error
    pub fn new(field: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
        }
    }

    /// Read one entry of a backend `validationErrors` array.
    ///
    /// Accepts `field` or `path` for the key and `code`, `errorCode` or
    /// `type` for the reason.
    fn from_api(entry: &Value) -> Option<Self> {
        let field = entry
            .get("field")
            .or_else(|| entry.get("path"))
            .and_then(Value::as_str)?;
        let code = ["code", "errorCode", "type"]
            .iter()
            .find_map(|key| entry.get(*key).and_then(Value::as_str))
            .unwrap_or("invalid");
        Some(Self::new(field, code))
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.field, self.code)
    }
}

/// Collected field-level errors, in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// No errors yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error against a field.
    pub fn push(&mut self, field: Field, code: impl Into<String>) {
        self.0.push(FieldError::new(field.key(), code));
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of errors
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate errors
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Whether `field` carries an error with `code`.
    pub fn contains(&self, field: Field, code: &str) -> bool {
        self.0
            .iter()
            .any(|e| e.field == field.key() && e.code == code)
    }

    /// Whether `field` carries any error.
    pub fn has_field(&self, field: Field) -> bool {
        self.0.iter().any(|e| e.field == field.key())
    }

    /// `Ok` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> std::result::Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<Vec<FieldError>> for ValidationErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&rendered.join(", "))
    }
}

/// Proposal workflow error types
#[derive(Debug, Error)]
pub enum ProposalError {
    /// Step validator refused the submission; nothing reached the network.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// Backend refused individual fields.
    #[error("backend rejected fields: {0}")]
    ApiValidation(ValidationErrors),

    /// Backend failure carrying its own error code.
    #[error("backend error [{code}]")]
    Api {
        /// Backend error code
        code: String,
        /// Full response body
        body: Value,
    },

    /// Transport failure, or a rejection without structured details.
    #[error("network error: {message}")]
    Network {
        /// What went wrong
        message: String,
    },

    /// Upload still processing after every status check.
    #[error("upload still processing after {attempts} status checks")]
    UploadTimeout {
        /// Status checks issued
        attempts: u32,
    },

    /// Upload refused by the file service.
    #[error("upload rejected: {reason}")]
    UploadRejected {
        /// Rejection reason shown to the caseworker
        reason: String,
    },

    /// Save level missing from the field table, or an unparsable level name.
    #[error("unknown save level: {0}")]
    UnknownSaveLevel(String),

    /// Step missing from the registry, or an unparsable step slug.
    #[error("unknown step: {0}")]
    UnknownStep(String),

    /// No guarded transition matched.
    #[error("no transition out of {step} in {mode} mode")]
    NoTransition {
        /// Step being left
        step: StepId,
        /// Journey mode at the time
        mode: Mode,
    },

    /// Page edits an existing proposal but none has been created yet.
    #[error("{page} needs an assigned proposal reference")]
    MissingReference {
        /// Page that was requested
        page: String,
    },
}

impl ProposalError {
    /// Classify an unsuccessful backend response body.
    ///
    /// Field errors win over coded errors; a body with neither falls back to
    /// a generic network error.
    pub fn from_rejection(body: Value) -> Self {
        let field_errors: Vec<FieldError> = body
            .get("validationErrors")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().filter_map(FieldError::from_api).collect())
            .unwrap_or_default();
        if !field_errors.is_empty() {
            return Self::ApiValidation(field_errors.into());
        }

        let code = body
            .get("errors")
            .and_then(Value::as_array)
            .and_then(|errors| {
                errors.iter().find_map(|e| {
                    e.get("errorCode")
                        .or_else(|| e.get("code"))
                        .and_then(|c| match c {
                            Value::String(s) => Some(s.clone()),
                            Value::Number(n) => Some(n.to_string()),
                            _ => None,
                        })
                })
            });

        match code {
            Some(code) => Self::Api { code, body },
            None => Self::Network {
                message: "unsuccessful response without error details".to_string(),
            },
        }
    }

    /// Stable code for banners and redirect query strings.
    pub fn code(&self) -> &str {
        match self {
            ProposalError::Validation(_) | ProposalError::ApiValidation(_) => {
                VALIDATION_ERROR_CODE
            }
            ProposalError::Api { code, .. } => code.as_str(),
            ProposalError::Network { .. } => NETWORK_ERROR_CODE,
            ProposalError::UploadTimeout { .. } => UPLOAD_TIMEOUT_CODE,
            ProposalError::UploadRejected { .. } => UPLOAD_REJECTED_CODE,
            ProposalError::UnknownSaveLevel(_)
            | ProposalError::UnknownStep(_)
            | ProposalError::NoTransition { .. } => CONFIGURATION_ERROR_CODE,
            ProposalError::MissingReference { .. } => REFERENCE_REQUIRED_CODE,
        }
    }

    /// Inline field errors, for both local and server-side validation.
    pub fn field_errors(&self) -> Option<&ValidationErrors> {
        match self {
            ProposalError::Validation(errors) | ProposalError::ApiValidation(errors) => {
                Some(errors)
            }
            _ => None,
        }
    }

    /// Whether the error points at a broken step/level table.
    pub fn is_misconfiguration(&self) -> bool {
        matches!(
            self,
            ProposalError::UnknownSaveLevel(_)
                | ProposalError::UnknownStep(_)
                | ProposalError::NoTransition { .. }
        )
    }
}

impl From<TransportError> for ProposalError {
    fn from(err: TransportError) -> Self {
        ProposalError::Network {
            message: err.to_string(),
        }
    }
}

impl From<ValidationErrors> for ProposalError {
    fn from(errors: ValidationErrors) -> Self {
        ProposalError::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn backend_code_is_not_a_broken_table() {
        let err = ProposalError::from_rejection(json!({
            "success": false,
            "errors": [{ "errorCode": CONFIGURATION_ERROR_CODE }]
        }));
        assert_eq!(err.code(), CONFIGURATION_ERROR_CODE);
        assert!(!err.is_misconfiguration());
        assert!(ProposalError::UnknownStep("nope".into()).is_misconfiguration());
        assert!(ProposalError::UnknownSaveLevel("half".into()).is_misconfiguration());
    }

    #[test]
    fn validation_errors_render_field_and_code() {
        let mut errors = ValidationErrors::new();
        errors.push(Field::Name, "required");
        errors.push(Field::AreaId, "invalid");
        assert_eq!(errors.to_string(), "name.required, areaId.invalid");
        assert!(errors.contains(Field::Name, "required"));
        assert!(!errors.contains(Field::Name, "invalid"));
    }

    #[test]
    fn empty_errors_convert_to_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn rejection_with_field_errors_is_api_validation() {
        let err = ProposalError::from_rejection(json!({
            "success": false,
            "validationErrors": [{ "field": "name", "errorCode": "duplicate" }],
            "errors": [{ "errorCode": "PROPOSAL_001" }]
        }));
        let fields = err.field_errors().expect("field errors");
        assert!(fields.contains(Field::Name, "duplicate"));
        assert_eq!(err.code(), VALIDATION_ERROR_CODE);
    }

    #[test]
    fn rejection_with_coded_error_keeps_code_and_body() {
        let err = ProposalError::from_rejection(json!({
            "success": false,
            "errors": [{ "errorCode": "PROPOSAL_LOCKED", "message": "locked" }]
        }));
        match &err {
            ProposalError::Api { code, body } => {
                assert_eq!(code, "PROPOSAL_LOCKED");
                assert_eq!(body["errors"][0]["message"], "locked");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        assert_eq!(err.code(), "PROPOSAL_LOCKED");
    }

    #[test]
    fn rejection_without_details_falls_back_to_network() {
        let err = ProposalError::from_rejection(json!({ "success": false }));
        assert_eq!(err.code(), NETWORK_ERROR_CODE);
        assert!(err.field_errors().is_none());
    }

    #[test]
    fn transport_errors_classify_as_network() {
        let err: ProposalError = TransportError::Request("connection reset".into()).into();
        assert_eq!(err.code(), NETWORK_ERROR_CODE);
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn table_faults_are_misconfiguration() {
        assert!(ProposalError::UnknownSaveLevel("bogus".into()).is_misconfiguration());
        assert!(!ProposalError::UploadTimeout { attempts: 10 }.is_misconfiguration());
    }
}
