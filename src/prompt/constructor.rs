//! Builds the generation request from the subject description and presets.
//!
//! Prompt segments always appear in the same order: subject description,
//! camera angle, pose, lighting. Each segment is trimmed, empty ones are
//! skipped and the rest are joined with `", "`. Resolution and aspect ratio
//! never go into the prompt text; they travel as their own request fields.
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::presets::VibePreset;
use crate::types::{AspectRatio, Resolution, SourceImage};

/// Subject used when no analysis result is available.
pub const FALLBACK_DESCRIPTION: &str = "A person";

const SEGMENT_SEPARATOR: &str = ", ";

/// Everything the generation service needs for one manifest call.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    #[serde(skip)]
    pub source_image: SourceImage,
    pub prompt: String,
    pub resolution: Resolution,
    pub aspect_ratio: AspectRatio,
}

#[derive(Debug, Default)]
pub struct PromptConstructor;

impl PromptConstructor {
    pub fn new() -> Self {
        PromptConstructor
    }

    /// Compose a request from the current selections.
    #[allow(clippy::too_many_arguments)]
    pub fn compose(
        &self,
        image: &SourceImage,
        description: Option<&str>,
        angle: Option<&VibePreset>,
        pose: Option<&VibePreset>,
        light: Option<&VibePreset>,
        resolution: Resolution,
        aspect_ratio: AspectRatio,
    ) -> AppResult<GenerationRequest> {
        self.validate_image(image)?;

        let prompt = self.compose_prompt(
            description,
            [angle, pose, light].map(|p| p.map(|p| p.prompt_fragment).unwrap_or("")),
        );

        Ok(GenerationRequest {
            source_image: image.clone(),
            prompt,
            resolution,
            aspect_ratio,
        })
    }

    /// Subject first, then the fragments in the order given.
    pub fn compose_prompt(&self, description: Option<&str>, fragments: [&str; 3]) -> String {
        let subject = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(FALLBACK_DESCRIPTION);

        std::iter::once(subject)
            .chain(fragments.iter().map(|f| f.trim()))
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join(SEGMENT_SEPARATOR)
    }

    fn validate_image(&self, image: &SourceImage) -> AppResult<()> {
        if image.is_empty() {
            return Err(AppError::PromptConstruction(
                "Source image payload is empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Free-function form of [`PromptConstructor::compose`].
#[allow(clippy::too_many_arguments)]
pub fn compose_generation_request(
    image: &SourceImage,
    description: Option<&str>,
    angle: Option<&VibePreset>,
    pose: Option<&VibePreset>,
    light: Option<&VibePreset>,
    resolution: Resolution,
    aspect_ratio: AspectRatio,
) -> AppResult<GenerationRequest> {
    PromptConstructor::new().compose(image, description, angle, pose, light, resolution, aspect_ratio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::{find_preset, PresetAxis};

    fn image() -> SourceImage {
        SourceImage::new(vec![0x89, 0x50, 0x4E, 0x47], Some("image/png"), None)
    }

    #[test]
    fn fragments_follow_description_in_fixed_order() {
        let angle = find_preset(PresetAxis::Angle, "cam4").unwrap();
        let pose = find_preset(PresetAxis::Pose, "pose5").unwrap();
        let light = find_preset(PresetAxis::Lighting, "light7").unwrap();

        let req = compose_generation_request(
            &image(),
            Some("a smiling woman in a red dress"),
            Some(angle),
            Some(pose),
            Some(light),
            Resolution::Res4K,
            AspectRatio::Portrait9x16,
        )
        .unwrap();

        assert_eq!(
            req.prompt,
            "a smiling woman in a red dress, \
             dynamic orbital camera movement frozen in time, motion blur on background, \
             standing confident, athletic posture, checking reflection, intense focus, \
             high-key fashion photography lighting, pure white background, crisp details"
        );
        assert_eq!(req.resolution.as_str(), "4K");
        assert_eq!(req.aspect_ratio.as_str(), "9:16");
        assert!(!req.prompt.contains("4K"));
        assert!(!req.prompt.contains("9:16"));
    }

    #[test]
    fn missing_description_uses_fallback() {
        let pc = PromptConstructor::new();
        assert_eq!(pc.compose_prompt(None, ["a", "b", "c"]), "A person, a, b, c");
        assert_eq!(pc.compose_prompt(Some("   "), ["a", "b", "c"]), "A person, a, b, c");
    }

    #[test]
    fn unset_presets_contribute_nothing() {
        let req = compose_generation_request(
            &image(),
            Some("a dog"),
            None,
            find_preset(PresetAxis::Pose, "pose1"),
            None,
            Resolution::Res1K,
            AspectRatio::Square,
        )
        .unwrap();
        assert_eq!(
            req.prompt,
            "a dog, sitting up in bed, messy hair perfection, stretching arms, soft expression"
        );
    }

    #[test]
    fn composition_is_deterministic() {
        let pc = PromptConstructor::new();
        let a = pc.compose_prompt(Some("x"), ["one", "two", "three"]);
        let b = pc.compose_prompt(Some("x"), ["one", "two", "three"]);
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn empty_image_is_rejected() {
        let empty = SourceImage::new(Vec::new(), Some("image/png"), None);
        let err = compose_generation_request(
            &empty,
            None,
            None,
            None,
            None,
            Resolution::default(),
            AspectRatio::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::PromptConstruction(_)));
    }

    #[test]
    fn request_serializes_sizing_as_separate_fields() {
        let req = compose_generation_request(
            &image(),
            Some("a cat"),
            None,
            None,
            None,
            Resolution::Res2K,
            AspectRatio::Landscape16x9,
        )
        .unwrap();
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["resolution"], "2K");
        assert_eq!(json["aspect_ratio"], "16:9");
        assert_eq!(json["prompt"], "a cat");
        assert!(json.get("source_image").is_none());
    }
}
