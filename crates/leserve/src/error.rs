//! API error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use leparcours::{FieldError, ProposalError};
use serde::Serialize;
use thiserror::Error;

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// API error with HTTP status code
#[derive(Debug, Clone, Serialize, Error)]
pub struct ApiError {
    /// HTTP status code
    #[serde(skip)]
    pub status: StatusCode,

    /// Error message
    pub message: String,

    /// Optional error code for client handling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Inline field errors
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub field_errors: Vec<FieldError>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: None,
            field_errors: Vec::new(),
        }
    }

    /// Create a new API error with code
    pub fn with_code(
        status: StatusCode,
        message: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            status,
            message: message.into(),
            code: Some(code.into()),
            field_errors: Vec::new(),
        }
    }

    /// 400 Bad Request
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 401 Unauthorized
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::UNAUTHORIZED, message, "UNAUTHORIZED")
    }

    /// 404 Not Found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::with_code(
            StatusCode::NOT_FOUND,
            format!("Resource not found: {}", resource.into()),
            "NOT_FOUND",
        )
    }

    /// 500 Internal Server Error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_code(
            StatusCode::INTERNAL_SERVER_ERROR,
            message,
            "INTERNAL_ERROR",
        )
    }
}

/// HTTP status for a journey failure.
pub fn status_for(err: &ProposalError) -> StatusCode {
    match err {
        ProposalError::Validation(_) | ProposalError::ApiValidation(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ProposalError::Api { .. }
        | ProposalError::Network { .. }
        | ProposalError::UploadTimeout { .. }
        | ProposalError::UploadRejected { .. } => StatusCode::BAD_GATEWAY,
        ProposalError::UnknownStep(_) => StatusCode::NOT_FOUND,
        ProposalError::MissingReference { .. } => StatusCode::CONFLICT,
        ProposalError::UnknownSaveLevel(_) | ProposalError::NoTransition { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<ProposalError> for ApiError {
    fn from(err: ProposalError) -> Self {
        let field_errors: Vec<FieldError> = err
            .field_errors()
            .map(|errors| errors.iter().cloned().collect())
            .unwrap_or_default();
        Self {
            status: status_for(&err),
            message: err.to_string(),
            code: Some(err.code().to_string()),
            field_errors,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{:?}] [{}] {}", self.status, code, self.message),
            None => write!(f, "[{:?}] {}", self.status, self.message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "success": false,
            "error": self.message,
            "code": self.code,
            "fieldErrors": self.field_errors,
        }));

        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leparcours::{Field, Mode, StepId, ValidationErrors};
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_api_error_bad_request() {
        let error = ApiError::bad_request("Invalid input");
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert!(error.message.contains("Invalid input"));
    }

    #[test]
    fn test_api_error_not_found() {
        let error = ApiError::not_found("proposal/unknown");
        assert_eq!(error.status, StatusCode::NOT_FOUND);
        assert!(error.message.contains("proposal/unknown"));
        assert_eq!(error.code, Some("NOT_FOUND".to_string()));
    }

    #[test]
    fn test_api_error_display() {
        let error = ApiError::unauthorized("missing bearer token");
        let display = format!("{}", error);
        assert!(display.contains("UNAUTHORIZED"));
        assert!(display.contains("bearer"));
    }

    #[rstest]
    #[case(ProposalError::UnknownStep("nope".into()), StatusCode::NOT_FOUND, "CONFIGURATION_ERROR")]
    #[case(
        ProposalError::Network { message: "timeout".into() },
        StatusCode::BAD_GATEWAY,
        "NETWORK_ERROR"
    )]
    #[case(
        ProposalError::Api { code: "PROPOSAL_NAME_DUPLICATE".into(), body: json!({}) },
        StatusCode::BAD_GATEWAY,
        "PROPOSAL_NAME_DUPLICATE"
    )]
    #[case(
        ProposalError::MissingReference { page: "urgency".into() },
        StatusCode::CONFLICT,
        "REFERENCE_REQUIRED"
    )]
    #[case(
        ProposalError::NoTransition { step: StepId::Name, mode: Mode::Create },
        StatusCode::INTERNAL_SERVER_ERROR,
        "CONFIGURATION_ERROR"
    )]
    fn test_proposal_error_mapping(
        #[case] err: ProposalError,
        #[case] status: StatusCode,
        #[case] code: &str,
    ) {
        let api: ApiError = err.into();
        assert_eq!(api.status, status);
        assert_eq!(api.code.as_deref(), Some(code));
        assert!(api.field_errors.is_empty());
    }

    #[test]
    fn test_validation_error_keeps_field_errors() {
        let mut errors = ValidationErrors::new();
        errors.push(Field::Name, "required");
        let api: ApiError = ProposalError::Validation(errors).into();

        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(api.field_errors, vec![FieldError::new("name", "required")]);
    }

    #[test]
    fn test_api_error_into_response() {
        let error = ApiError::bad_request("test error");
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
