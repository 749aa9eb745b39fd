//! Thin HTTP client for the Gemini `generateContent` endpoint.
//!
//! - `analyze` sends the photo to a text model and returns a one-sentence
//!   subject description.
//! - `generate` sends the photo plus the composed prompt to an image model,
//!   with aspect ratio and output size as structured `imageConfig` fields.
//!
//! The API key is read from the shared [`KeyStore`] on every call, so a key
//! selected after start-up is picked up without rebuilding the client.
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::auth::KeyStore;
use crate::config::Config;
use crate::error::{parse_retry_after, sanitize_error_message, AppError, AppResult};
use crate::prompt::GenerationRequest;
use crate::service::{AnalyzeService, GenerateService};
use crate::types::{GeneratedImage, SourceImage};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_ANALYSIS_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";

const ANALYSIS_INSTRUCTION: &str = "Describe the main subject of this photo for an image \
generation prompt in one concise sentence: apparent age, gender presentation, hair, \
clothing and any distinctive features. Do not describe the background or the lighting.";

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    analysis_model: String,
    image_model: String,
    keys: KeyStore,
}

impl GeminiClient {
    pub fn new(base_url: String, keys: KeyStore) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        GeminiClient {
            client: Client::new(),
            base_url: base,
            analysis_model: DEFAULT_ANALYSIS_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            keys,
        }
    }

    pub fn from_config(config: &Config, keys: KeyStore) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(GeminiClient {
            client,
            ..Self::new(config.gemini_base_url.clone(), keys)
                .with_models(config.analysis_model.clone(), config.image_model.clone())
        })
    }

    pub fn with_models(mut self, analysis_model: String, image_model: String) -> Self {
        self.analysis_model = analysis_model;
        self.image_model = image_model;
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    async fn api_key(&self) -> AppResult<String> {
        self.keys
            .current()
            .await
            .ok_or_else(|| AppError::Unauthorized("no Gemini API key selected".to_string()))
    }

    /// Posts a `generateContent` body and checks the prompt feedback and
    /// finish reason before handing back the first candidate's parts.
    async fn generate_content(&self, model: &str, body: &GeminiRequest) -> AppResult<Vec<GeminiPartResponse>> {
        let url = self.endpoint(model);
        let key = self.api_key().await?;
        tracing::info!("Sending request to Gemini model {}", model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", key)
            .json(body)
            .send()
            .await
            .map_err(AppError::HttpClient)?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());
            let err = parse_error(status.as_u16(), &text, &headers);
            tracing::error!("Gemini request failed. Status: {}, Error: {}", status, err);
            return Err(err);
        }

        let parsed: GeminiResponse = response.json().await.map_err(AppError::HttpClient)?;
        parsed.into_parts()
    }
}

#[async_trait]
impl AnalyzeService for GeminiClient {
    async fn analyze(&self, image: &SourceImage) -> AppResult<String> {
        let body = GeminiRequest::analysis(image);
        let parts = self.generate_content(&self.analysis_model, &body).await?;
        let text = parts
            .into_iter()
            .filter_map(|p| p.text)
            .map(|t| t.trim().to_string())
            .find(|t| !t.is_empty())
            .ok_or_else(|| {
                AppError::UnexpectedResponse("No description in Gemini response".into())
            })?;
        Ok(text)
    }
}

#[async_trait]
impl GenerateService for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> AppResult<GeneratedImage> {
        let start = Instant::now();
        let body = GeminiRequest::generation(request);
        let parts = self.generate_content(&self.image_model, &body).await?;

        let inline = parts
            .into_iter()
            .find_map(|p| p.inline_data)
            .ok_or_else(|| {
                AppError::UnexpectedResponse(
                    "The model returned no image. Try a different combination.".into(),
                )
            })?;

        let data = base64::engine::general_purpose::STANDARD
            .decode(&inline.data)
            .map_err(|e| AppError::UnexpectedResponse(format!("Invalid image data: {}", e)))?;

        tracing::debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            bytes = data.len(),
            "Gemini image received"
        );
        Ok(GeneratedImage::new(
            data,
            inline.mime_type,
            Some(self.image_model.clone()),
        ))
    }
}

fn parse_error(status: u16, text: &str, headers: &reqwest::header::HeaderMap) -> AppError {
    let message = sanitize_error_message(text);
    match status {
        401 | 403 => AppError::Unauthorized(message),
        429 => AppError::RateLimited {
            retry_after: parse_retry_after(headers).map(Duration::from_secs),
        },
        _ => {
            let lower = message.to_lowercase();
            if lower.contains("safety") || lower.contains("blocked") || lower.contains("prohibited") {
                AppError::ContentBlocked(message)
            } else {
                AppError::Gemini(message)
            }
        }
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
    image_config: ImageConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: String,
    image_size: String,
}

impl GeminiRequestPart {
    fn image(image: &SourceImage) -> Self {
        GeminiRequestPart::InlineData {
            inline_data: GeminiInlineData {
                mime_type: image.mime_type.clone(),
                data: image.to_base64(),
            },
        }
    }
}

impl GeminiRequest {
    fn analysis(image: &SourceImage) -> Self {
        GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![
                    GeminiRequestPart::image(image),
                    GeminiRequestPart::Text {
                        text: ANALYSIS_INSTRUCTION.to_string(),
                    },
                ],
            }],
            generation_config: None,
        }
    }

    /// Source image first, then the prompt.
    fn generation(req: &GenerationRequest) -> Self {
        GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![
                    GeminiRequestPart::image(&req.source_image),
                    GeminiRequestPart::Text {
                        text: req.prompt.clone(),
                    },
                ],
            }],
            generation_config: Some(GeminiConfig {
                response_modalities: vec!["IMAGE".to_string()],
                image_config: ImageConfig {
                    aspect_ratio: req.aspect_ratio.as_str().to_string(),
                    image_size: req.resolution.as_str().to_string(),
                },
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

impl GeminiResponse {
    fn into_parts(self) -> AppResult<Vec<GeminiPartResponse>> {
        // Blocked prompts come back as HTTP 200.
        if let Some(feedback) = self.prompt_feedback {
            if let Some(reason) = feedback.block_reason {
                let msg = feedback
                    .block_reason_message
                    .unwrap_or_else(|| format!("Prompt blocked: {}", reason));
                return Err(AppError::ContentBlocked(msg));
            }
        }

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AppError::UnexpectedResponse("No candidates in Gemini response".into()))?;

        if let Some(reason) = candidate.finish_reason.as_deref() {
            match reason {
                "SAFETY" | "IMAGE_SAFETY" | "IMAGE_PROHIBITED_CONTENT" | "PROHIBITED_CONTENT"
                | "RECITATION" | "IMAGE_RECITATION" | "BLOCKLIST" => {
                    return Err(AppError::ContentBlocked(format!(
                        "Content blocked by Gemini safety filter: {}",
                        reason
                    )));
                }
                _ => {}
            }
        }

        candidate
            .content
            .map(|c| c.parts)
            .ok_or_else(|| AppError::UnexpectedResponse("No content in Gemini candidate".into()))
    }
}
