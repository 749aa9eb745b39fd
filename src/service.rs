//! Seams for the two remote operations the workflow depends on.
use async_trait::async_trait;

use crate::error::AppResult;
use crate::prompt::GenerationRequest;
use crate::types::{GeneratedImage, SourceImage};

/// Describes the subject of an uploaded photo.
#[async_trait]
pub trait AnalyzeService: Send + Sync {
    async fn analyze(&self, image: &SourceImage) -> AppResult<String>;
}

/// Produces the final image for a composed request.
#[async_trait]
pub trait GenerateService: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> AppResult<GeneratedImage>;
}
