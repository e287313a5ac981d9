use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use leparcours::{
    Area, AreaDirectory, BackendReply, Credential, FixedClock, InMemorySessionStore, JourneyId,
    ProposalBackend, ProposalRecord, ProposalSession, SaveLevel, SessionStore, SubmissionRequest,
    TransportError, UploadHandle, UploadRequest, UploadService, UploadState, UploadStatus,
    UploadStatusReport,
};
use leserve::{create_router, AppState, ServerConfig};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const JOURNEY: &str = "journey-1";
const REFERENCE: &str = "ANC501E/000A/001A";
const SLUG: &str = "ANC501E-000A-001A";

#[derive(Default)]
struct Backend {
    seen: Mutex<Vec<SubmissionRequest>>,
    reject_with: Option<&'static str>,
}

impl Backend {
    fn levels(&self) -> Vec<SaveLevel> {
        self.seen.lock().expect("lock").iter().map(|r| r.level).collect()
    }

    fn last(&self) -> SubmissionRequest {
        self.seen.lock().expect("lock").last().cloned().expect("a submission")
    }
}

#[async_trait]
impl ProposalBackend for Backend {
    async fn submit(
        &self,
        request: &SubmissionRequest,
        _credential: &Credential,
    ) -> Result<BackendReply, TransportError> {
        self.seen.lock().expect("lock").push(request.clone());
        if let Some(code) = self.reject_with {
            return Ok(BackendReply::Rejected(
                json!({ "success": false, "errors": [{ "errorCode": code }] }),
            ));
        }
        Ok(BackendReply::Accepted(ProposalRecord {
            reference_number: Some(REFERENCE.to_string()),
            slug: Some(SLUG.to_string()),
            ..Default::default()
        }))
    }
}

struct Areas;

#[async_trait]
impl AreaDirectory for Areas {
    async fn area(&self, id: i64, _credential: &Credential) -> Result<Option<Area>, TransportError> {
        Ok((id == 12).then(|| Area {
            id,
            name: "Thames".to_string(),
            area_type: None,
        }))
    }
}

struct Uploads;

#[async_trait]
impl UploadService for Uploads {
    async fn initiate(
        &self,
        request: &UploadRequest,
        _credential: &Credential,
    ) -> Result<UploadHandle, TransportError> {
        Ok(UploadHandle {
            upload_id: format!("up-{}", request.entity_id),
            upload_url: "https://files.example/put/1".to_string(),
        })
    }

    async fn status(
        &self,
        _upload_id: &str,
        _credential: &Credential,
    ) -> Result<UploadStatusReport, TransportError> {
        Ok(UploadStatusReport {
            upload_status: UploadStatus::Ready,
            filename: Some("area.zip".to_string()),
            rejection_reason: None,
        })
    }

    async fn download_url(
        &self,
        upload_id: &str,
        _credential: &Credential,
    ) -> Result<String, TransportError> {
        Ok(format!("https://files.example/{upload_id}"))
    }
}

struct Harness {
    app: Router,
    backend: Arc<Backend>,
    sessions: Arc<InMemorySessionStore>,
}

fn harness_with(backend: Backend) -> Harness {
    let backend = Arc::new(backend);
    let sessions = Arc::new(InMemorySessionStore::new());
    let config = ServerConfig {
        poll_delay_ms: 1,
        ..Default::default()
    };
    let today = NaiveDate::from_ymd_opt(2026, 6, 15).expect("date");
    let state = AppState::new(config, backend.clone(), Arc::new(Areas), Arc::new(Uploads))
        .with_clock(Arc::new(FixedClock::new(today)))
        .with_sessions(sessions.clone());
    Harness {
        app: create_router().with_state(state),
        backend,
        sessions,
    }
}

fn harness() -> Harness {
    harness_with(Backend::default())
}

impl Harness {
    fn seed(&self, session: ProposalSession) {
        self.sessions.set(&JourneyId::new(JOURNEY), session);
    }

    fn session(&self) -> ProposalSession {
        self.sessions.get(&JourneyId::new(JOURNEY)).expect("session")
    }

    async fn get(&self, uri: &str) -> (StatusCode, Option<String>, Value) {
        let request = Request::get(uri)
            .header("x-journey-id", JOURNEY)
            .header(header::AUTHORIZATION, "Bearer token")
            .body(Body::empty())
            .expect("request");
        send(&self.app, request).await
    }

    async fn post(&self, uri: &str, form: &str) -> (StatusCode, Option<String>, Value) {
        let request = Request::post(uri)
            .header("x-journey-id", JOURNEY)
            .header(header::AUTHORIZATION, "Bearer token")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .expect("request");
        send(&self.app, request).await
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, location, body)
}

fn assert_redirect(result: &(StatusCode, Option<String>, Value), to: &str) {
    assert_eq!(result.0, StatusCode::SEE_OTHER, "body: {}", result.2);
    assert_eq!(result.1.as_deref(), Some(to));
}

#[tokio::test]
async fn health_reports_ok() {
    let h = harness();
    let request = Request::get("/api/health").body(Body::empty()).expect("request");
    let (status, _, body) = send(&h.app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn create_journey_saves_once_then_edits_from_summary() {
    let h = harness();

    assert_redirect(&h.get("/proposal/start").await, "/proposal/name");
    assert_redirect(&h.post("/proposal/name", "name=Riverside+weir").await, "/proposal/area");
    assert_redirect(&h.post("/proposal/area", "areaId=12").await, "/proposal/project-type");
    assert_redirect(
        &h.post("/proposal/project-type", "projectType=STR").await,
        "/proposal/financial-start-year",
    );
    assert_redirect(
        &h.post("/proposal/financial-start-year", "financialStartYear=2026").await,
        "/proposal/financial-end-year",
    );
    assert!(h.backend.levels().is_empty());

    assert_redirect(
        &h.post("/proposal/financial-end-year", "financialEndYear=2028").await,
        "/proposal/summary",
    );
    assert_eq!(h.backend.levels(), vec![SaveLevel::InitialSave]);
    let initial = h.backend.last();
    assert_eq!(initial.payload["name"], "Riverside weir");
    assert!(!initial.payload.contains_key("interventionTypes"));

    let (status, _, summary) = h.get("/proposal/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["success"], true);
    assert_eq!(summary["view"]["referenceNumber"], REFERENCE);
    assert_eq!(summary["view"]["areaName"], "Thames");
    assert!(h.session().is_edit);

    // Edit mode: changing the name goes straight back to the summary.
    let (_, _, page) = h.get("/proposal/name").await;
    assert_eq!(page["mode"], "edit");
    assert_eq!(page["backLink"], "/proposal/summary");
    assert_redirect(&h.post("/proposal/name", "name=Riverside+weir+2").await, "/proposal/summary");
    assert_eq!(
        h.backend.levels(),
        vec![SaveLevel::InitialSave, SaveLevel::ProjectName]
    );
    assert_eq!(h.backend.last().payload["referenceNumber"], REFERENCE);
}

#[tokio::test]
async fn edit_mode_defence_with_two_interventions_asks_for_primary() {
    let h = harness();
    let mut session = ProposalSession::with_reference(REFERENCE, SLUG);
    session.is_edit = true;
    h.seed(session);

    assert_redirect(
        &h.post("/proposal/project-type", "projectType=DEF").await,
        "/proposal/intervention-types",
    );
    assert_redirect(
        &h.post(
            "/proposal/intervention-types",
            "interventionTypes=NFM&interventionTypes=PFR",
        )
        .await,
        "/proposal/primary-intervention-type",
    );
    assert!(h.backend.levels().is_empty());

    assert_redirect(
        &h.post("/proposal/primary-intervention-type", "primaryInterventionType=PFR").await,
        "/proposal/summary",
    );
    assert_eq!(h.backend.levels(), vec![SaveLevel::ProjectType]);
    let saved = h.backend.last();
    assert_eq!(saved.payload["projectType"], "DEF");
    assert_eq!(saved.payload["interventionTypes"], json!(["NFM", "PFR"]));
    assert_eq!(saved.payload["primaryInterventionType"], "PFR");
}

#[tokio::test]
async fn repeated_intervention_counts_as_one() {
    let h = harness();
    let mut session = ProposalSession::with_reference(REFERENCE, SLUG);
    session.is_edit = true;
    h.seed(session);

    assert_redirect(
        &h.post("/proposal/project-type", "projectType=DEF").await,
        "/proposal/intervention-types",
    );
    assert_redirect(
        &h.post(
            "/proposal/intervention-types",
            "interventionTypes=NFM&interventionTypes=NFM",
        )
        .await,
        "/proposal/summary",
    );
    assert_eq!(h.backend.levels(), vec![SaveLevel::ProjectType]);
    let saved = h.backend.last();
    assert_eq!(saved.payload["interventionTypes"], json!(["NFM"]));
    assert_eq!(saved.payload["primaryInterventionType"], "NFM");
}

#[tokio::test]
async fn invalid_form_is_re_rendered_with_inline_errors() {
    let h = harness();

    let (status, location, body) = h.post("/proposal/name", "name=").await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(location, None);
    assert_eq!(body["step"], "name");
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert_eq!(body["fieldErrors"][0]["field"], "name");
    assert_eq!(body["fieldErrors"][0]["code"], "required");
    assert!(h.backend.levels().is_empty());
}

#[tokio::test]
async fn backend_rejection_keeps_entered_values() {
    let h = harness_with(Backend {
        reject_with: Some("PROPOSAL_NAME_DUPLICATE"),
        ..Default::default()
    });
    let mut session = ProposalSession::with_reference(REFERENCE, SLUG);
    session.is_edit = true;
    h.seed(session);

    let (status, _, body) = h.post("/proposal/name", "name=Taken").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "PROPOSAL_NAME_DUPLICATE");
    assert_eq!(body["values"]["name"], "Taken");
    assert_eq!(h.session().answers.text(leparcours::Field::Name), Some("Taken"));
}

#[tokio::test]
async fn backend_configuration_code_is_re_rendered_like_any_rejection() {
    let h = harness_with(Backend {
        reject_with: Some("CONFIGURATION_ERROR"),
        ..Default::default()
    });
    let mut session = ProposalSession::with_reference(REFERENCE, SLUG);
    session.is_edit = true;
    h.seed(session);

    let (status, _, body) = h.post("/proposal/name", "name=Weir").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["step"], "name");
    assert_eq!(body["error"], "CONFIGURATION_ERROR");
    assert_eq!(body["values"]["name"], "Weir");
}

#[tokio::test]
async fn dates_need_an_existing_proposal() {
    let h = harness();

    let (status, _, body) = h.get("/proposal/start-work").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "REFERENCE_REQUIRED");

    let (status, _, _) = h.get("/proposal/benefit-area-file").await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn start_discards_the_previous_draft() {
    let h = harness();
    h.seed(ProposalSession::with_reference(REFERENCE, SLUG));

    assert_redirect(&h.get("/proposal/start").await, "/proposal/name");

    assert!(h.sessions.get(&JourneyId::new(JOURNEY)).is_none());
    let (_, _, page) = h.get("/proposal/name").await;
    assert_eq!(page["mode"], "create");
}

#[tokio::test]
async fn unknown_step_is_not_found() {
    let h = harness();
    let (status, _, _) = h.get("/proposal/not-a-step").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_headers_are_refused() {
    let h = harness();

    let request = Request::get("/proposal/name").body(Body::empty()).expect("request");
    let (status, _, _) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = Request::post("/proposal/name")
        .header("x-journey-id", JOURNEY)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("name=Weir"))
        .expect("request");
    let (status, _, _) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn could_start_early_no_submits_important_dates() {
    let h = harness();
    h.seed(ProposalSession::with_reference(REFERENCE, SLUG));

    assert_redirect(
        &h.post(
            "/proposal/start-outline-business-case",
            "startOutlineBusinessCaseMonth=7&startOutlineBusinessCaseYear=2026",
        )
        .await,
        "/proposal/complete-outline-business-case",
    );
    let (status, _, body) = h
        .post(
            "/proposal/complete-outline-business-case",
            "completeOutlineBusinessCaseMonth=7&completeOutlineBusinessCaseYear=2026",
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fieldErrors"][0]["code"], "notAfterPrevious");

    assert_redirect(
        &h.post(
            "/proposal/complete-outline-business-case",
            "completeOutlineBusinessCaseMonth=1&completeOutlineBusinessCaseYear=2027",
        )
        .await,
        "/proposal/award-contract",
    );
    assert_redirect(
        &h.post("/proposal/award-contract", "awardContractMonth=6&awardContractYear=2027").await,
        "/proposal/start-work",
    );
    assert_redirect(
        &h.post("/proposal/start-work", "startWorkMonth=9&startWorkYear=2027").await,
        "/proposal/start-benefits",
    );
    assert_redirect(
        &h.post("/proposal/start-benefits", "startBenefitsMonth=4&startBenefitsYear=2028").await,
        "/proposal/could-start-early",
    );
    assert!(h.backend.levels().is_empty());

    assert_redirect(
        &h.post("/proposal/could-start-early", "couldStartEarly=no").await,
        "/proposal/summary",
    );
    assert_eq!(h.backend.levels(), vec![SaveLevel::ImportantDates]);
    assert_eq!(h.backend.last().payload["startWorkYear"], 2027);
}

#[tokio::test]
async fn upload_round_trip_lands_on_summary() {
    let h = harness();
    h.seed(ProposalSession::with_reference(REFERENCE, SLUG));

    assert_redirect(
        &h.post("/proposal/benefit-area-file", "").await,
        "https://files.example/put/1",
    );
    assert!(matches!(h.session().upload, Some(UploadState::Pending { .. })));

    assert_redirect(&h.get("/proposal/benefit-area-file/status").await, "/proposal/summary");
    assert_eq!(
        h.session().upload,
        Some(UploadState::Ready {
            upload_id: format!("up-{SLUG}"),
            filename: Some("area.zip".to_string()),
        })
    );

    let (_, _, summary) = h.get("/proposal/summary").await;
    assert_eq!(
        summary["view"]["attachment"]["downloadUrl"],
        format!("https://files.example/up-{SLUG}")
    );
}

#[tokio::test]
async fn upload_status_only_follows_the_pending_upload() {
    let h = harness();
    let mut session = ProposalSession::with_reference(REFERENCE, SLUG);
    session.upload = Some(UploadState::Pending {
        upload_id: "up-mine".to_string(),
    });
    h.seed(session);

    let (status, location, body) = h
        .get("/proposal/benefit-area-file/status?uploadId=someone-elses")
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(location, None);
    assert_eq!(body["code"], "UPLOAD_MISMATCH");
    assert_eq!(
        h.session().upload,
        Some(UploadState::Pending {
            upload_id: "up-mine".to_string(),
        })
    );

    assert_redirect(
        &h.get("/proposal/benefit-area-file/status?uploadId=up-mine").await,
        "/proposal/summary",
    );
    assert!(matches!(
        h.session().upload,
        Some(UploadState::Ready { ref upload_id, .. }) if upload_id == "up-mine"
    ));
}

#[tokio::test]
async fn upload_status_without_pending_upload_is_refused() {
    let h = harness();
    h.seed(ProposalSession::with_reference(REFERENCE, SLUG));

    let (status, _, _) = h
        .get("/proposal/benefit-area-file/status?uploadId=up-anything")
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(h.session().upload, None);
}
