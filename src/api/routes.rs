//! Shared handler state and the router.
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::api::handlers;
use crate::auth::KeyStore;
use crate::workflow::Orchestrator;

/// Uploaded photos can be large; axum's 2 MB default is too small.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub keys: KeyStore,
    pub output_dir: PathBuf,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/presets", get(handlers::all_presets))
        .route("/presets/:axis", get(handlers::presets_for_axis))
        .route("/state", get(handlers::get_state))
        .route(
            "/auth",
            get(handlers::auth_status)
                .post(handlers::authorize)
                .delete(handlers::revoke_auth),
        )
        .route("/upload", post(handlers::upload))
        .route("/reanalyze", post(handlers::reanalyze))
        .route("/select", post(handlers::select_preset))
        .route("/settings", post(handlers::update_settings))
        .route("/manifest", post(handlers::manifest))
        .route("/dismiss_error", post(handlers::dismiss_error))
        .route("/preview", get(handlers::preview))
        .route("/result", get(handlers::result))
        .route("/download", post(handlers::download))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
