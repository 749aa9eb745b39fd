use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use vibeshift::api::{router, AppState};
use vibeshift::auth::{AccessGate, ConfirmPolicy, HostCapability, KeyStore};
use vibeshift::error::{AppError, AppResult};
use vibeshift::prompt::GenerationRequest;
use vibeshift::service::{AnalyzeService, GenerateService};
use vibeshift::types::{GeneratedImage, SourceImage};
use vibeshift::workflow::Orchestrator;

struct FixedAnalyzer(&'static str);

#[async_trait]
impl AnalyzeService for FixedAnalyzer {
    async fn analyze(&self, _image: &SourceImage) -> AppResult<String> {
        Ok(self.0.to_string())
    }
}

/// Echoes the prompt back as the "image" bytes so tests can inspect it.
struct EchoGenerator;

#[async_trait]
impl GenerateService for EchoGenerator {
    async fn generate(&self, request: &GenerationRequest) -> AppResult<GeneratedImage> {
        if request.prompt.is_empty() {
            return Err(AppError::Service { message: None });
        }
        Ok(GeneratedImage::new(
            request.prompt.clone().into_bytes(),
            "image/png",
            Some("echo".into()),
        ))
    }
}

fn app(initial_key: Option<&str>) -> (Router, KeyStore) {
    let keys = KeyStore::new(initial_key.map(str::to_string));
    let gate = Arc::new(AccessGate::new(
        HostCapability::Available(Arc::new(keys.clone())),
        ConfirmPolicy {
            attempts: 1,
            interval: std::time::Duration::from_millis(1),
        },
    ));
    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(FixedAnalyzer("a smiling woman in a red dress")),
        Arc::new(EchoGenerator),
        gate,
    ));
    let state = Arc::new(AppState {
        orchestrator,
        keys: keys.clone(),
        output_dir: std::env::temp_dir().join(format!("vibeshift-api-{}", uuid::Uuid::new_v4())),
    });
    (router(state), keys)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = hyper::body::to_bytes(resp.into_body()).await.unwrap();
    (status, body.to_vec())
}

async fn send_json(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, req).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn upload_request() -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload?filename=me.png")
        .header(header::CONTENT_TYPE, "image/png")
        .body(Body::from(vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]))
        .unwrap()
}

#[tokio::test]
async fn presets_are_listed_per_axis() {
    let (app, _) = app(None);
    let (status, body) = send_json(
        &app,
        Request::get("/presets/pose").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 7);
    assert_eq!(body[0]["id"], "pose1");

    let (status, _) = send(&app, Request::get("/presets/mood").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn all_presets_are_listed_by_axis() {
    let (app, _) = app(None);
    let (status, body) = send_json(&app, Request::get("/presets").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    for (axis, first) in [("angle", "cam1"), ("pose", "pose1"), ("lighting", "light1")] {
        assert_eq!(body[axis].as_array().unwrap().len(), 7, "axis {}", axis);
        assert_eq!(body[axis][0]["id"], first);
    }
}

#[tokio::test]
async fn unauthorized_upload_is_blocked_until_a_key_is_supplied() {
    let (app, _) = app(None);

    let (_, body) = send_json(&app, upload_request()).await;
    assert_eq!(body["outcome"]["status"], "rejected");
    assert_eq!(body["outcome"]["reason"], "unauthorized");
    assert_eq!(body["state"]["has_image"], false);

    let (status, body) = send_json(&app, post_json("/auth", json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["outcome"], "declined");

    let (status, body) = send_json(&app, post_json("/auth", json!({"api_key": "k"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "authorized");

    let (_, body) = send_json(&app, upload_request()).await;
    assert_eq!(body["outcome"]["status"], "analyzed");
}

#[tokio::test]
async fn full_session_over_http() {
    let (app, _) = app(Some("key"));

    let (_, body) = send_json(&app, upload_request()).await;
    assert_eq!(body["state"]["phase"], "analyzed_ready");
    assert_eq!(body["state"]["image_file_name"], "me.png");

    let (_, body) = send_json(
        &app,
        post_json("/select", json!({"axis": "angle", "preset_id": "cam4"})),
    )
    .await;
    assert_eq!(body["outcome"], true);

    let (_, body) = send_json(
        &app,
        post_json("/select", json!({"axis": "angle", "preset_id": "light1"})),
    )
    .await;
    assert_eq!(body["outcome"], false);
    assert_eq!(body["state"]["selections"]["angle"]["id"], "cam4");

    let (_, body) = send_json(
        &app,
        post_json("/settings", json!({"resolution": "2K", "aspect_ratio": "16:9"})),
    )
    .await;
    assert_eq!(body["state"]["resolution"], "2K");
    assert_eq!(body["state"]["aspect_ratio"], "16:9");

    let (_, body) = send_json(&app, post_json("/manifest", json!({}))).await;
    assert_eq!(body["outcome"]["status"], "completed");
    assert_eq!(body["state"]["phase"], "result");

    let (status, bytes) = send(&app, Request::get("/result").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let prompt = String::from_utf8(bytes).unwrap();
    assert!(prompt.starts_with("a smiling woman in a red dress, dynamic orbital camera movement"));

    let (status, body) = send_json(&app, post_json("/download", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    let path = std::path::PathBuf::from(body["path"].as_str().unwrap());
    assert!(path.file_name().unwrap().to_string_lossy().starts_with("VibeShift_"));
    assert_eq!(std::fs::read(&path).unwrap(), prompt.as_bytes());
    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
}

#[tokio::test]
async fn manifest_without_upload_reports_precondition() {
    let (app, _) = app(Some("key"));
    let (_, body) = send_json(&app, post_json("/manifest", json!({}))).await;
    assert_eq!(body["outcome"]["reason"], "missing_image");
    assert_eq!(body["state"]["error"], "Please upload an image first.");

    let (_, body) = send_json(&app, post_json("/dismiss_error", json!({}))).await;
    assert!(body["error"].is_null());
    assert_eq!(body["phase"], "idle");

    let (status, _) = send(&app, Request::get("/result").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
