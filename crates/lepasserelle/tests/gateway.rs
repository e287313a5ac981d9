use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use leparcours::{
    AreaDirectory, BackendReply, Credential, ProposalBackend, SaveLevel, SubmissionRequest,
    TransportError, UploadRequest, UploadService, UploadStatus,
};
use lepasserelle::{GatewayClient, GatewayConfig, HttpBackend, HttpUploadService};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Calls {
    status: AtomicU32,
    area: AtomicU32,
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn save(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    if bearer(&headers) != Some("secret") {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "success": false })));
    }
    if body["payload"]["name"] == "taken" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "errors": [{ "errorCode": "PROPOSAL_NAME_DUPLICATE", "field": "name" }]
            })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": { "referenceNumber": "ANC501E/000A/001A", "slug": "ANC501E-000A-001A" }
        })),
    )
}

async fn area(State(calls): State<Arc<Calls>>, Path(id): Path<i64>) -> impl IntoResponse {
    let n = calls.area.fetch_add(1, Ordering::SeqCst);
    match id {
        12 => (
            StatusCode::OK,
            Json(json!({ "data": { "id": 12, "name": "Thames", "areaType": "PSO Area" } })),
        ),
        // Fails once, then recovers.
        13 if n == 0 => (StatusCode::SERVICE_UNAVAILABLE, Json(json!({}))),
        13 => (StatusCode::OK, Json(json!({ "id": 13, "name": "Wessex" }))),
        _ => (StatusCode::NOT_FOUND, Json(json!({ "message": "no area" }))),
    }
}

async fn initiate(Json(body): Json<Value>) -> impl IntoResponse {
    Json(json!({
        "data": {
            "uploadId": format!("up-{}", body["entityId"].as_str().unwrap_or("?")),
            "uploadUrl": "https://files.example/put"
        }
    }))
}

async fn status(State(calls): State<Arc<Calls>>, Path(id): Path<String>) -> impl IntoResponse {
    calls.status.fetch_add(1, Ordering::SeqCst);
    if id == "broken" {
        return (StatusCode::BAD_GATEWAY, "upstream down".to_string()).into_response();
    }
    Json(json!({ "uploadStatus": "completed", "filename": "area.zip" })).into_response()
}

async fn download(Path(id): Path<String>) -> impl IntoResponse {
    Json(json!({ "downloadUrl": format!("https://files.example/{id}?sig=1") }))
}

async fn spawn_fake() -> (GatewayConfig, Arc<Calls>) {
    let calls = Arc::new(Calls::default());
    let app = Router::new()
        .route("/api/proposals", post(save))
        .route("/api/areas/:id", get(area))
        .route("/files/uploads", post(initiate))
        .route("/files/uploads/:id/status", get(status))
        .route("/files/uploads/:id/download", get(download))
        .with_state(calls.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    let config = GatewayConfig {
        backend_url: format!("http://{addr}/api"),
        upload_url: format!("http://{addr}/files"),
        request_timeout_secs: 5,
        read_retries: 2,
    };
    (config, calls)
}

fn request(name: &str) -> SubmissionRequest {
    let mut payload = Map::new();
    payload.insert("name".to_string(), Value::from(name));
    SubmissionRequest {
        level: SaveLevel::ProjectName,
        payload,
    }
}

#[tokio::test]
async fn accepted_submission_carries_identifiers() {
    let (config, _) = spawn_fake().await;
    let backend = HttpBackend::new(GatewayClient::new(config).expect("client"));

    let reply = backend
        .submit(&request("Riverside weir"), &Credential::new("secret"))
        .await
        .expect("reply");

    match reply {
        BackendReply::Accepted(record) => {
            assert_eq!(record.reference_number.as_deref(), Some("ANC501E/000A/001A"));
            assert_eq!(record.slug.as_deref(), Some("ANC501E-000A-001A"));
        }
        other => panic!("expected acceptance, got {other:?}"),
    }
}

#[tokio::test]
async fn rejection_envelope_is_returned_not_raised() {
    let (config, _) = spawn_fake().await;
    let backend = HttpBackend::new(GatewayClient::new(config).expect("client"));

    let reply = backend
        .submit(&request("taken"), &Credential::new("secret"))
        .await
        .expect("reply");

    match reply {
        BackendReply::Rejected(body) => {
            assert_eq!(body["errors"][0]["errorCode"], "PROPOSAL_NAME_DUPLICATE");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn area_lookup_handles_envelope_missing_and_retry() {
    let (config, calls) = spawn_fake().await;
    let backend = HttpBackend::new(GatewayClient::new(config).expect("client"));
    let credential = Credential::new("secret");

    let thames = backend.area(12, &credential).await.expect("lookup");
    assert_eq!(thames.map(|a| a.name).as_deref(), Some("Thames"));

    assert_eq!(backend.area(404, &credential).await.expect("lookup"), None);

    calls.area.store(0, Ordering::SeqCst);
    let wessex = backend.area(13, &credential).await.expect("retried lookup");
    assert_eq!(wessex.map(|a| a.name).as_deref(), Some("Wessex"));
    assert_eq!(calls.area.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn upload_service_round_trip() {
    let (config, _) = spawn_fake().await;
    let uploads = HttpUploadService::new(GatewayClient::new(config).expect("client"));
    let credential = Credential::new("secret");

    let handle = uploads
        .initiate(
            &UploadRequest::benefit_area("ANC501E/000A/001A", "ANC501E-000A-001A"),
            &credential,
        )
        .await
        .expect("initiate");
    assert_eq!(handle.upload_id, "up-ANC501E-000A-001A");

    let report = uploads
        .status(&handle.upload_id, &credential)
        .await
        .expect("status");
    assert_eq!(report.upload_status, UploadStatus::Ready);
    assert_eq!(report.filename.as_deref(), Some("area.zip"));

    let link = uploads
        .download_url(&handle.upload_id, &credential)
        .await
        .expect("link");
    assert!(link.ends_with("?sig=1"));
}

#[tokio::test]
async fn status_check_is_not_retried() {
    let (config, calls) = spawn_fake().await;
    let uploads = HttpUploadService::new(GatewayClient::new(config).expect("client"));

    let err = uploads
        .status("broken", &Credential::new("secret"))
        .await
        .expect_err("bad gateway");

    assert_eq!(
        err,
        TransportError::Status {
            status: 502,
            body: "upstream down".to_string()
        }
    );
    assert_eq!(calls.status.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unreachable_service_is_a_request_error() {
    let config = GatewayConfig {
        backend_url: "http://127.0.0.1:9/api".to_string(),
        read_retries: 0,
        ..Default::default()
    };
    let backend = HttpBackend::new(GatewayClient::new(config).expect("client"));

    let err = backend
        .submit(&request("x"), &Credential::new("secret"))
        .await
        .expect_err("connection refused");
    assert!(matches!(err, TransportError::Request(_)));
}
