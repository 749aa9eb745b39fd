//! The session state machine: upload → analyze → select → manifest.
//!
//! Every transition takes the state lock, mutates, and releases it before any
//! remote call is awaited. Remote results come back through `apply_*` methods
//! that re-take the lock, so callers never observe a half-updated session.
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::auth::AccessGate;
use crate::error::{AppError, AppResult};
use crate::presets::{find_preset, PresetAxis};
use crate::prompt::{GenerationRequest, PromptConstructor};
use crate::service::{AnalyzeService, GenerateService};
use crate::types::{AspectRatio, GeneratedImage, Resolution, SourceImage};
use crate::workflow::state::{SessionSnapshot, SessionState};

pub const ANALYSIS_FAILED_MESSAGE: &str = "Failed to analyze image. Try a clearer photo.";
pub const MISSING_IMAGE_MESSAGE: &str = "Please upload an image first.";
pub const GENERATION_FAILED_MESSAGE: &str = "Manifestation failed. The cosmos is busy.";
pub const UNAUTHORIZED_MESSAGE: &str = "Connect a Gemini API key to continue.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// A generation is in flight.
    Busy,
    Unauthorized,
    MissingImage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum UploadOutcome {
    Analyzed,
    AnalysisFailed,
    /// A newer upload started before this analysis returned; its result was dropped.
    Superseded,
    Rejected(Rejection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ManifestOutcome {
    Completed,
    Failed,
    Rejected(Rejection),
}

pub struct Orchestrator {
    state: RwLock<SessionState>,
    analyzer: Arc<dyn AnalyzeService>,
    generator: Arc<dyn GenerateService>,
    gate: Arc<AccessGate>,
    composer: PromptConstructor,
}

impl Orchestrator {
    pub fn new(
        analyzer: Arc<dyn AnalyzeService>,
        generator: Arc<dyn GenerateService>,
        gate: Arc<AccessGate>,
    ) -> Self {
        Orchestrator {
            state: RwLock::new(SessionState::new()),
            analyzer,
            generator,
            gate,
            composer: PromptConstructor::new(),
        }
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.read().await.snapshot()
    }

    pub async fn source_image(&self) -> Option<SourceImage> {
        self.state.read().await.image.clone()
    }

    pub async fn generated_image(&self) -> Option<GeneratedImage> {
        self.state.read().await.generated.clone()
    }

    /// Replaces the source image and runs analysis on it.
    pub async fn upload_image(&self, image: SourceImage) -> UploadOutcome {
        if let Err(e) = self.gate.ensure_authorized().await {
            return self.reject_unauthorized(e).await.into_upload();
        }

        let (epochs, image) = {
            let mut state = self.state.write().await;
            if state.is_generating {
                tracing::warn!("Upload rejected while a generation is in flight");
                return UploadOutcome::Rejected(Rejection::Busy);
            }
            state.upload_epoch += 1;
            state.image = Some(image.clone());
            state.analyzed_description = None;
            state.generated = None;
            state.error = None;
            state.is_analyzing = true;
            tracing::info!(
                epoch = state.upload_epoch,
                bytes = image.data.len(),
                mime = %image.mime_type,
                "Image uploaded"
            );
            ((state.upload_epoch, state.manifest_epoch), image)
        };

        self.run_analysis(epochs, &image).await
    }

    /// Runs analysis again on the current image.
    pub async fn reanalyze(&self) -> UploadOutcome {
        if let Err(e) = self.gate.ensure_authorized().await {
            return self.reject_unauthorized(e).await.into_upload();
        }

        let (epochs, image) = {
            let mut state = self.state.write().await;
            if state.is_generating {
                return UploadOutcome::Rejected(Rejection::Busy);
            }
            let Some(image) = state.image.clone() else {
                state.error = Some(MISSING_IMAGE_MESSAGE.to_string());
                return UploadOutcome::Rejected(Rejection::MissingImage);
            };
            // A fresh epoch makes any analysis still in flight stale.
            state.upload_epoch += 1;
            state.error = None;
            state.is_analyzing = true;
            ((state.upload_epoch, state.manifest_epoch), image)
        };

        self.run_analysis(epochs, &image).await
    }

    async fn run_analysis(&self, epochs: (u64, u64), image: &SourceImage) -> UploadOutcome {
        let result = self.analyzer.analyze(image).await;
        self.apply_analysis(epochs, result).await
    }

    /// `epochs` is the (upload, manifest) pair captured when the analysis started.
    async fn apply_analysis(
        &self,
        (epoch, manifest_epoch): (u64, u64),
        result: AppResult<String>,
    ) -> UploadOutcome {
        let mut state = self.state.write().await;
        if state.upload_epoch != epoch {
            tracing::warn!(
                epoch,
                current = state.upload_epoch,
                "Discarding analysis for a superseded upload"
            );
            return UploadOutcome::Superseded;
        }
        state.is_analyzing = false;
        match result {
            Ok(description) => {
                tracing::info!(epoch, "Image analyzed");
                tracing::debug!(%description, "Analysis result");
                state.analyzed_description = Some(description);
                UploadOutcome::Analyzed
            }
            Err(e) => {
                tracing::error!(epoch, "Image analysis failed: {}", e);
                if state.manifest_epoch == manifest_epoch {
                    state.error = Some(ANALYSIS_FAILED_MESSAGE.to_string());
                } else {
                    tracing::debug!(epoch, "Manifest ran meanwhile; keeping its outcome");
                }
                UploadOutcome::AnalysisFailed
            }
        }
    }

    /// Selects a preset on one axis. Unknown ids and selections made during a
    /// generation are ignored.
    pub async fn select_preset(&self, axis: PresetAxis, preset_id: &str) -> bool {
        let Some(preset) = find_preset(axis, preset_id) else {
            tracing::debug!(%axis, preset_id, "Ignoring unknown preset");
            return false;
        };
        let mut state = self.state.write().await;
        if state.is_generating {
            return false;
        }
        state.selections.set(axis, preset);
        true
    }

    pub async fn set_resolution(&self, resolution: Resolution) -> bool {
        let mut state = self.state.write().await;
        if state.is_generating {
            return false;
        }
        state.resolution = resolution;
        true
    }

    pub async fn set_aspect_ratio(&self, aspect_ratio: AspectRatio) -> bool {
        let mut state = self.state.write().await;
        if state.is_generating {
            return false;
        }
        state.aspect_ratio = aspect_ratio;
        true
    }

    /// Clears the visible error; the phase falls back to what the data implies.
    pub async fn dismiss_error(&self) {
        self.state.write().await.error = None;
    }

    /// Composes a request from the current selections and generates the image.
    pub async fn manifest(&self) -> ManifestOutcome {
        if self.state.read().await.is_generating {
            return ManifestOutcome::Rejected(Rejection::Busy);
        }
        if let Err(e) = self.gate.ensure_authorized().await {
            return self.reject_unauthorized(e).await.into_manifest();
        }

        let request = match self.begin_manifest().await {
            Ok(request) => request,
            Err(outcome) => return outcome,
        };

        tracing::info!(
            resolution = %request.resolution,
            aspect_ratio = %request.aspect_ratio,
            "Dispatching generation request"
        );
        tracing::debug!(prompt = %request.prompt, "Composed prompt");

        let result = self.generator.generate(&request).await;

        let mut state = self.state.write().await;
        state.is_generating = false;
        match result {
            Ok(image) => {
                tracing::info!(bytes = image.data.len(), "Generation completed");
                state.generated = Some(image);
                ManifestOutcome::Completed
            }
            Err(e) => {
                tracing::error!("Generation failed: {}", e);
                state.error = Some(
                    e.user_message()
                        .unwrap_or_else(|| GENERATION_FAILED_MESSAGE.to_string()),
                );
                ManifestOutcome::Failed
            }
        }
    }

    /// Checks preconditions and marks the session as generating, all under one lock.
    async fn begin_manifest(&self) -> Result<GenerationRequest, ManifestOutcome> {
        let mut state = self.state.write().await;
        if state.is_generating {
            return Err(ManifestOutcome::Rejected(Rejection::Busy));
        }
        let Some(image) = state.image.as_ref() else {
            state.error = Some(MISSING_IMAGE_MESSAGE.to_string());
            return Err(ManifestOutcome::Rejected(Rejection::MissingImage));
        };

        let request = self.composer.compose(
            image,
            state.analyzed_description.as_deref(),
            Some(state.selections.angle),
            Some(state.selections.pose),
            Some(state.selections.lighting),
            state.resolution,
            state.aspect_ratio,
        );
        match request {
            Ok(request) => {
                state.manifest_epoch += 1;
                state.is_generating = true;
                state.error = None;
                state.generated = None;
                Ok(request)
            }
            Err(e) => {
                tracing::error!("Could not compose generation request: {}", e);
                state.error = Some(MISSING_IMAGE_MESSAGE.to_string());
                Err(ManifestOutcome::Rejected(Rejection::MissingImage))
            }
        }
    }

    async fn reject_unauthorized(&self, err: AppError) -> Rejection {
        tracing::warn!("Remote call blocked: {}", err);
        self.state.write().await.error = Some(UNAUTHORIZED_MESSAGE.to_string());
        Rejection::Unauthorized
    }
}

impl Rejection {
    fn into_upload(self) -> UploadOutcome {
        UploadOutcome::Rejected(self)
    }

    fn into_manifest(self) -> ManifestOutcome {
        ManifestOutcome::Rejected(self)
    }
}
