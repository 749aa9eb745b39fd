//! VibeShift library
//!
//! Modules:
//! - `presets`: Static camera-angle, pose and lighting catalogs.
//! - `prompt`: Composes the generation request from description and presets.
//! - `workflow`: Session state and the upload/analyze/manifest state machine.
//! - `auth`: Access gate and the in-memory key store behind it.
//! - `service`: Traits for the remote analyze and generate operations.
//! - `gemini`: Gemini client implementing both service traits.
//! - `api`: Axum HTTP handlers and router setup used by the binary.
//! - `utils`: Local download of generated images.
//! - `config`: Env-driven configuration loader.
//! - `error`: Common error type and alias.
//!
//! Re-exports are provided for common types: `Config`, `GeminiClient`,
//! `PromptConstructor`, `Orchestrator` and `AccessGate`.
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod gemini;
pub mod presets;
pub mod prompt;
pub mod service;
pub mod types;
pub mod utils;
pub mod workflow;

pub use auth::{AccessGate, KeyStore};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use gemini::client::GeminiClient;
pub use prompt::constructor::PromptConstructor;
pub use workflow::orchestrator::Orchestrator;
