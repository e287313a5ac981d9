//! API response types for the journey pages

use leparcours::{
    EnrichmentError, EnrichmentResult, FieldError, ProposalError, ProposalSession, StepPage,
    SummaryView, UploadState,
};
use serde::Serialize;

/// One step page, optionally re-rendered with errors
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepView {
    /// Page read model
    #[serde(flatten)]
    pub page: StepPage,

    /// Banner error code (from a failed submission or a redirect)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Inline field errors
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub field_errors: Vec<FieldError>,
}

impl StepView {
    /// Plain page, echoing any redirect-carried error code
    pub fn new(page: StepPage, error: Option<String>) -> Self {
        Self {
            page,
            error,
            field_errors: Vec::new(),
        }
    }

    /// Page re-rendered after a failed submission
    pub fn failed(page: StepPage, err: &ProposalError) -> Self {
        let field_errors: Vec<FieldError> = err
            .field_errors()
            .map(|errors| errors.iter().cloned().collect())
            .unwrap_or_default();
        Self {
            page,
            error: Some(err.code().to_string()),
            field_errors,
        }
    }
}

/// Summary page
#[derive(Debug, Clone, Serialize)]
pub struct SummaryResponse {
    /// Every enrichment succeeded
    pub success: bool,

    /// Summary read model
    pub view: SummaryView,

    /// Enrichment failures, in pipeline order
    pub errors: Vec<EnrichmentError>,
}

impl From<EnrichmentResult<SummaryView>> for SummaryResponse {
    fn from(result: EnrichmentResult<SummaryView>) -> Self {
        Self {
            success: result.success,
            view: result.data,
            errors: result.errors,
        }
    }
}

/// Benefit-area upload page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPage {
    /// Owning proposal's reference number
    pub reference_number: Option<String>,

    /// Current attachment, if any
    pub upload: Option<UploadState>,

    /// Redirect-carried error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadPage {
    /// Page for the current draft
    pub fn new(session: &ProposalSession, error: Option<String>) -> Self {
        Self {
            reference_number: session.reference_number().map(str::to_string),
            upload: session.upload.clone(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leparcours::{load_step, Field, StepId, ValidationErrors};

    #[test]
    fn test_step_view_flattens_page() {
        let page = load_step(&ProposalSession::new(), StepId::Name).expect("page");
        let json = serde_json::to_value(StepView::new(page, None)).expect("serialize");

        assert_eq!(json["step"], "name");
        assert_eq!(json["mode"], "create");
        assert!(json.get("error").is_none());
        assert!(json.get("fieldErrors").is_none());
    }

    #[test]
    fn test_failed_step_view_carries_code_and_fields() {
        let page = load_step(&ProposalSession::new(), StepId::Name).expect("page");
        let mut errors = ValidationErrors::new();
        errors.push(Field::Name, "required");
        let view = StepView::failed(page, &ProposalError::Validation(errors));

        let json = serde_json::to_value(view).expect("serialize");
        assert_eq!(json["error"], "VALIDATION_ERROR");
        assert_eq!(json["fieldErrors"][0]["field"], "name");
        assert_eq!(json["fieldErrors"][0]["code"], "required");
    }

    #[test]
    fn test_upload_page_echoes_error() {
        let session = ProposalSession::with_reference("ANC501E/000A/001A", "ANC501E-000A-001A");
        let page = UploadPage::new(&session, Some("UPLOAD_TIMEOUT".to_string()));
        let json = serde_json::to_value(page).expect("serialize");

        assert_eq!(json["referenceNumber"], "ANC501E/000A/001A");
        assert_eq!(json["error"], "UPLOAD_TIMEOUT");
        assert!(json["upload"].is_null());
    }
}
