//! HTTP handlers for the journey pages

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Json, Router,
};
use http::header::AUTHORIZATION;
use leparcours::{
    build_summary, initiate_upload, load_step, process_step, record_poll_result, AreaDirectory,
    Clock, Credential, FormValues, InMemorySessionStore, JourneyId, ProposalBackend,
    ProposalError, ProposalSession, SessionStore, StepId, SummaryContext, SystemClock,
    UploadService, UploadState, UploadStatusPoller, ValidationContext,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::error::{status_for, ApiError, ApiResult};
use crate::responses::{StepView, SummaryResponse, UploadPage};

/// Header carrying the journey identifier
pub const JOURNEY_HEADER: &str = "x-journey-id";

/// Redirect-carried error code
#[derive(Debug, Default, Deserialize)]
pub struct ErrorQuery {
    /// Code to show in the page banner
    pub error: Option<String>,
}

/// Query the file service appends when it sends the browser back
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    /// Upload the file service reports on; must match the pending upload in the session
    pub upload_id: Option<String>,
}

/// State shared across all handlers
///
/// Collaborators sit behind trait objects so tests can swap in fakes.
#[derive(Clone)]
pub struct AppState {
    /// Per-journey drafts
    pub sessions: Arc<dyn SessionStore>,

    /// Backend proposal API
    pub backend: Arc<dyn ProposalBackend>,

    /// Area directory
    pub areas: Arc<dyn AreaDirectory>,

    /// File-upload service
    pub uploads: Arc<dyn UploadService>,

    /// Source of "today" for date rules
    pub clock: Arc<dyn Clock>,

    /// Immutable server configuration
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create state with an in-memory session store and the system clock
    pub fn new(
        config: ServerConfig,
        backend: Arc<dyn ProposalBackend>,
        areas: Arc<dyn AreaDirectory>,
        uploads: Arc<dyn UploadService>,
    ) -> Self {
        Self {
            sessions: Arc::new(InMemorySessionStore::new()),
            backend,
            areas,
            uploads,
            clock: Arc::new(SystemClock),
            config: Arc::new(config),
        }
    }

    /// Replace the clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the session store
    #[must_use]
    pub fn with_sessions(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }

    fn session(&self, journey: &JourneyId) -> ProposalSession {
        self.sessions.get(journey).unwrap_or_default()
    }
}

fn journey(headers: &HeaderMap) -> ApiResult<JourneyId> {
    headers
        .get(JOURNEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(JourneyId::new)
        .ok_or_else(|| ApiError::bad_request(format!("missing {JOURNEY_HEADER} header")))
}

fn credential(headers: &HeaderMap) -> ApiResult<Credential> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(Credential::new)
        .ok_or_else(|| ApiError::unauthorized("missing bearer credential"))
}

/// GET /api/health - Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "leserve",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /proposal/start - Begin a fresh journey
pub async fn start_journey(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Redirect> {
    let journey = journey(&headers)?;
    state.sessions.remove(&journey);
    info!(journey = %journey, "Journey started");
    Ok(Redirect::to(&StepId::Name.path()))
}

/// GET /proposal/:step - Render a step
pub async fn show_step(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<ErrorQuery>,
    headers: HeaderMap,
) -> ApiResult<Json<StepView>> {
    let journey = journey(&headers)?;
    let step: StepId = slug.parse()?;
    let page = load_step(&state.session(&journey), step)?;
    Ok(Json(StepView::new(page, query.error)))
}

/// POST /proposal/:step - Submit a step form
///
/// The draft is stored whatever the outcome so entered values survive a
/// failed submission.
pub async fn submit_step(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    Form(pairs): Form<Vec<(String, String)>>,
) -> ApiResult<Response> {
    let journey = journey(&headers)?;
    let credential = credential(&headers)?;
    let step: StepId = slug.parse()?;

    let mut session = state.session(&journey);
    let form = FormValues::from_pairs(pairs);
    let ctx = ValidationContext::from_clock(state.clock.as_ref());
    let result = process_step(
        &mut session,
        step,
        &form,
        &ctx,
        &credential,
        state.backend.as_ref(),
    )
    .await;
    state.sessions.set(&journey, session.clone());

    match result {
        Ok(outcome) => {
            debug!(journey = %journey, step = %step, "Step accepted");
            Ok(Redirect::to(&outcome.target.path()).into_response())
        }
        Err(err)
            if err.is_misconfiguration()
                || matches!(err, ProposalError::MissingReference { .. }) =>
        {
            Err(err.into())
        }
        Err(err) => {
            if err.field_errors().is_none() {
                warn!(journey = %journey, step = %step, code = err.code(), "Step submission failed");
            }
            let status = status_for(&err);
            let page = load_step(&session, step)?;
            Ok((status, Json(StepView::failed(page, &err))).into_response())
        }
    }
}

/// GET /proposal/summary - Enriched summary of the draft
///
/// Reaching the summary with an assigned reference switches the journey to
/// edit mode.
pub async fn show_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<SummaryResponse>> {
    let journey = journey(&headers)?;
    let credential = credential(&headers)?;

    let mut session = state.session(&journey);
    if session.reference().is_some() && !session.is_edit {
        session.is_edit = true;
        state.sessions.set(&journey, session.clone());
    }

    let ctx = SummaryContext {
        credential,
        areas: Arc::clone(&state.areas),
        uploads: Arc::clone(&state.uploads),
    };
    let result = build_summary(&session, &ctx).await;
    Ok(Json(result.into()))
}

/// GET /proposal/benefit-area-file - Upload page
pub async fn show_upload(
    State(state): State<AppState>,
    Query(query): Query<ErrorQuery>,
    headers: HeaderMap,
) -> ApiResult<Json<UploadPage>> {
    let journey = journey(&headers)?;
    let session = state.session(&journey);
    if session.reference().is_none() {
        return Err(ProposalError::MissingReference {
            page: "benefit-area-file".to_string(),
        }
        .into());
    }
    Ok(Json(UploadPage::new(&session, query.error)))
}

/// POST /proposal/benefit-area-file - Start an upload and hand over to the file service
pub async fn start_upload(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Redirect> {
    let journey = journey(&headers)?;
    let credential = credential(&headers)?;

    let mut session = state.session(&journey);
    let handle = initiate_upload(&mut session, state.uploads.as_ref(), &credential).await?;
    state.sessions.set(&journey, session);
    Ok(Redirect::to(&handle.upload_url))
}

/// GET /proposal/benefit-area-file/status - Wait for the file service verdict
pub async fn upload_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
    headers: HeaderMap,
) -> ApiResult<Redirect> {
    let journey = journey(&headers)?;
    let credential = credential(&headers)?;

    let mut session = state.session(&journey);
    let upload_id = match &session.upload {
        Some(UploadState::Pending { upload_id }) => upload_id.clone(),
        _ => return Err(ApiError::bad_request("no upload in progress")),
    };
    if let Some(requested) = query.upload_id.as_deref() {
        if requested != upload_id {
            warn!(journey = %journey, requested, pending = %upload_id, "Upload id does not match the journey");
            return Err(ApiError::with_code(
                StatusCode::CONFLICT,
                "upload does not belong to this proposal",
                "UPLOAD_MISMATCH",
            ));
        }
    }

    let poller = UploadStatusPoller::new(state.uploads.as_ref(), state.config.poll_config());
    let result = poller.poll(&upload_id, &credential).await;
    let target = record_poll_result(&mut session, &upload_id, result);
    state.sessions.set(&journey, session);
    Ok(Redirect::to(&target))
}

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "no such page")
}

/// Create router with all journey endpoints
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/proposal/start", get(start_journey))
        .route("/proposal/summary", get(show_summary))
        .route(
            "/proposal/benefit-area-file",
            get(show_upload).post(start_upload),
        )
        .route("/proposal/benefit-area-file/status", get(upload_status))
        .route("/proposal/:step", get(show_step).post(submit_step))
        .fallback(not_found)
}
