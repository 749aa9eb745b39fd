//! Axum request handlers for the HTTP API.
//!
//! Handlers are thin: each forwards to one orchestrator transition and
//! returns the outcome together with a fresh session snapshot. Workflow
//! failures are reported through the snapshot's `error` field, not through
//! HTTP status codes.
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::routes::AppState;
use crate::auth::AuthOutcome;
use crate::presets::{list_presets, PresetAxis, VibePreset};
use crate::types::{AspectRatio, Resolution, SourceImage};
use crate::utils::download::save_generated;
use crate::workflow::{ManifestOutcome, SessionSnapshot, UploadOutcome};

type HandlerError = (StatusCode, String);

#[derive(Debug, Serialize)]
pub struct ActionResponse<T> {
    pub outcome: T,
    pub state: SessionSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct AuthPayload {
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SelectPayload {
    pub axis: PresetAxis,
    pub preset_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SettingsPayload {
    pub resolution: Option<Resolution>,
    pub aspect_ratio: Option<AspectRatio>,
}

pub async fn root() -> &'static str {
    "VibeShift API"
}

pub async fn all_presets() -> Json<Value> {
    let mut out = serde_json::Map::new();
    for axis in PresetAxis::ALL {
        out.insert(axis.to_string(), json!(list_presets(axis)));
    }
    Json(Value::Object(out))
}

pub async fn presets_for_axis(
    Path(axis): Path<String>,
) -> Result<Json<&'static [VibePreset]>, HandlerError> {
    let axis: PresetAxis = axis
        .parse()
        .map_err(|e: String| (StatusCode::NOT_FOUND, e))?;
    Ok(Json(list_presets(axis)))
}

pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    Json(state.orchestrator.snapshot().await)
}

pub async fn auth_status(State(state): State<Arc<AppState>>) -> Json<Value> {
    let authorized = state.orchestrator.gate().is_authorized().await;
    Json(json!({ "authorized": authorized }))
}

/// Stores the supplied key (if any), then runs the gate's confirmation flow.
pub async fn authorize(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AuthPayload>,
) -> (StatusCode, Json<AuthOutcome>) {
    if let Some(key) = payload.api_key {
        state.keys.select(key).await;
    }
    let outcome = state.orchestrator.gate().request_authorization().await;
    let status = match outcome {
        AuthOutcome::Authorized => StatusCode::OK,
        AuthOutcome::Declined => StatusCode::UNAUTHORIZED,
        AuthOutcome::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        AuthOutcome::Failed(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(outcome))
}

pub async fn revoke_auth(State(state): State<Arc<AppState>>) -> StatusCode {
    state.keys.clear().await;
    state.orchestrator.gate().revoke();
    StatusCode::NO_CONTENT
}

pub async fn upload(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ActionResponse<UploadOutcome>>, HandlerError> {
    if body.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Request body must contain the image".to_string()));
    }
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let image = SourceImage::new(body.to_vec(), content_type, params.filename);

    let outcome = state.orchestrator.upload_image(image).await;
    Ok(Json(ActionResponse {
        outcome,
        state: state.orchestrator.snapshot().await,
    }))
}

pub async fn reanalyze(State(state): State<Arc<AppState>>) -> Json<ActionResponse<UploadOutcome>> {
    let outcome = state.orchestrator.reanalyze().await;
    Json(ActionResponse {
        outcome,
        state: state.orchestrator.snapshot().await,
    })
}

pub async fn select_preset(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SelectPayload>,
) -> Json<ActionResponse<bool>> {
    let applied = state
        .orchestrator
        .select_preset(payload.axis, &payload.preset_id)
        .await;
    Json(ActionResponse {
        outcome: applied,
        state: state.orchestrator.snapshot().await,
    })
}

pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SettingsPayload>,
) -> Json<ActionResponse<bool>> {
    let mut applied = true;
    if let Some(resolution) = payload.resolution {
        applied &= state.orchestrator.set_resolution(resolution).await;
    }
    if let Some(ratio) = payload.aspect_ratio {
        applied &= state.orchestrator.set_aspect_ratio(ratio).await;
    }
    Json(ActionResponse {
        outcome: applied,
        state: state.orchestrator.snapshot().await,
    })
}

pub async fn manifest(State(state): State<Arc<AppState>>) -> Json<ActionResponse<ManifestOutcome>> {
    let outcome = state.orchestrator.manifest().await;
    Json(ActionResponse {
        outcome,
        state: state.orchestrator.snapshot().await,
    })
}

pub async fn dismiss_error(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    state.orchestrator.dismiss_error().await;
    Json(state.orchestrator.snapshot().await)
}

pub async fn preview(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, HandlerError> {
    let image = state
        .orchestrator
        .source_image()
        .await
        .ok_or((StatusCode::NOT_FOUND, "No image uploaded".to_string()))?;
    Ok(([(header::CONTENT_TYPE, image.mime_type)], image.data))
}

pub async fn result(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, HandlerError> {
    let image = state
        .orchestrator
        .generated_image()
        .await
        .ok_or((StatusCode::NOT_FOUND, "Nothing generated yet".to_string()))?;
    Ok(([(header::CONTENT_TYPE, image.mime_type)], image.data))
}

pub async fn download(State(state): State<Arc<AppState>>) -> Result<Json<Value>, HandlerError> {
    let image = state
        .orchestrator
        .generated_image()
        .await
        .ok_or((StatusCode::NOT_FOUND, "Nothing generated yet".to_string()))?;
    let path = save_generated(&image, &state.output_dir).await.map_err(|e| {
        tracing::error!("Failed to save generated image: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok(Json(json!({ "path": path.display().to_string() })))
}
