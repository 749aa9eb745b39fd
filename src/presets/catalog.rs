//! Static style presets for the three independent axes.
//!
//! Each catalog is ordered; the first entry is the axis default. The order is
//! also the display order, so it must not be shuffled.
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetAxis {
    Angle,
    Pose,
    Lighting,
}

impl PresetAxis {
    pub const ALL: [PresetAxis; 3] = [Self::Angle, Self::Pose, Self::Lighting];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Angle => "angle",
            Self::Pose => "pose",
            Self::Lighting => "lighting",
        }
    }
}

impl fmt::Display for PresetAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PresetAxis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "angle" | "camera" => Ok(Self::Angle),
            "pose" => Ok(Self::Pose),
            "lighting" | "light" => Ok(Self::Lighting),
            other => Err(format!("Unknown preset axis '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VibePreset {
    pub id: &'static str,
    pub label: &'static str,
    pub prompt_fragment: &'static str,
}

impl VibePreset {
    pub const fn new(id: &'static str, label: &'static str, prompt_fragment: &'static str) -> Self {
        VibePreset { id, label, prompt_fragment }
    }
}

/// An ordered, non-empty preset list with an id index.
#[derive(Debug)]
pub struct PresetCatalog {
    presets: Vec<VibePreset>,
    index: HashMap<&'static str, usize>,
}

impl PresetCatalog {
    /// Builds a catalog. Empty lists and duplicate ids are rejected so that
    /// `default_preset` always has something to return.
    pub fn new(axis: PresetAxis, presets: Vec<VibePreset>) -> AppResult<Self> {
        if presets.is_empty() {
            return Err(AppError::Config(format!("Preset catalog '{}' is empty", axis)));
        }
        let mut index = HashMap::with_capacity(presets.len());
        for (i, preset) in presets.iter().enumerate() {
            if index.insert(preset.id, i).is_some() {
                return Err(AppError::Config(format!(
                    "Duplicate preset id '{}' in catalog '{}'",
                    preset.id, axis
                )));
            }
        }
        Ok(PresetCatalog { presets, index })
    }

    pub fn presets(&self) -> &[VibePreset] {
        &self.presets
    }

    pub fn find(&self, id: &str) -> Option<&VibePreset> {
        self.index.get(id).map(|&i| &self.presets[i])
    }

    pub fn default_preset(&self) -> &VibePreset {
        &self.presets[0]
    }
}

const CAMERA_ANGLES: [VibePreset; 7] = [
    VibePreset::new("cam1", "Low Angle God", "shot from a dramatic low angle, looking up at the subject, imposing presence"),
    VibePreset::new("cam2", "Golden Hour Worship", "shot during golden hour with warm sun flares directly into the lens"),
    VibePreset::new("cam3", "Over-the-Shoulder Tease", "over-the-shoulder POV shot, intimate and cinematic depth of field"),
    VibePreset::new("cam4", "Cinematic Orbit", "dynamic orbital camera movement frozen in time, motion blur on background"),
    VibePreset::new("cam5", "POV You’re In Love", "intimate close-up POV, shallow depth of field focusing on eyes, dreamy soft focus"),
    VibePreset::new("cam6", "Drone God’s Eye", "high angle top-down view, fashion editorial composition"),
    VibePreset::new("cam7", "Fisheye 90s", "extreme wide angle fisheye lens, 90s music video aesthetic"),
];

const MODEL_POSES: [VibePreset; 7] = [
    VibePreset::new("pose1", "Just Woke Up Angel", "sitting up in bed, messy hair perfection, stretching arms, soft expression"),
    VibePreset::new("pose2", "Counter Lean Brat", "leaning back against a counter, crossing ankles, confident smirk, casual defiance"),
    VibePreset::new("pose3", "Slow Walk Wind", "walking towards camera, wind blowing hair back, clothes flowing dynamically"),
    VibePreset::new("pose4", "Hands In Hair", "both hands running through hair, elbows out, looking off camera, vogue cover style"),
    VibePreset::new("pose5", "Gym Mirror", "standing confident, athletic posture, checking reflection, intense focus"),
    VibePreset::new("pose6", "Floating Zen", "body suspended in zero gravity, clothes floating, serene expression"),
    VibePreset::new("pose7", "Cyberpunk Crouch", "crouching on a ledge, futuristic city background, ready for action"),
];

const LIGHTING_MOODS: [VibePreset; 7] = [
    VibePreset::new("light1", "Neon Tokyo Vice", "illuminated by pink and cyan neon signs, rain-slicked reflections, high contrast"),
    VibePreset::new("light2", "Sunset Rim Light", "strong orange rim light outlining the silhouette, dark shadows, dramatic"),
    VibePreset::new("light3", "Moody Chiaroscuro", "Renaissance painting lighting, deep shadows and focused soft light beams"),
    VibePreset::new("light4", "Ring Light Demon", "perfect circular ring light reflection in eyes, flawless skin illumination, beauty studio lighting"),
    VibePreset::new("light5", "Soft Morning Window", "diffused natural light coming from a large window, ethereal and airy"),
    VibePreset::new("light6", "Cyberpunk Rain", "heavy rain at night, wet skin, reflections of street lights, cold blue tones"),
    VibePreset::new("light7", "Studio Strobe", "high-key fashion photography lighting, pure white background, crisp details"),
];

static ANGLE_CATALOG: Lazy<PresetCatalog> = Lazy::new(|| builtin(PresetAxis::Angle, &CAMERA_ANGLES));
static POSE_CATALOG: Lazy<PresetCatalog> = Lazy::new(|| builtin(PresetAxis::Pose, &MODEL_POSES));
static LIGHTING_CATALOG: Lazy<PresetCatalog> =
    Lazy::new(|| builtin(PresetAxis::Lighting, &LIGHTING_MOODS));

/// Wraps a built-in table; these are non-empty with unique ids.
fn builtin(axis: PresetAxis, presets: &[VibePreset]) -> PresetCatalog {
    PresetCatalog::new(axis, presets.to_vec()).expect("built-in preset catalog is valid")
}

/// The built-in catalog for `axis`.
pub fn catalog(axis: PresetAxis) -> &'static PresetCatalog {
    match axis {
        PresetAxis::Angle => &ANGLE_CATALOG,
        PresetAxis::Pose => &POSE_CATALOG,
        PresetAxis::Lighting => &LIGHTING_CATALOG,
    }
}

pub fn list_presets(axis: PresetAxis) -> &'static [VibePreset] {
    catalog(axis).presets()
}

pub fn find_preset(axis: PresetAxis, id: &str) -> Option<&'static VibePreset> {
    catalog(axis).find(id)
}

pub fn default_preset(axis: PresetAxis) -> &'static VibePreset {
    catalog(axis).default_preset()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_axis_has_seven_presets_and_first_is_default() {
        for axis in PresetAxis::ALL {
            let presets = list_presets(axis);
            assert_eq!(presets.len(), 7);
            assert_eq!(default_preset(axis), &presets[0]);
        }
        assert_eq!(default_preset(PresetAxis::Angle).id, "cam1");
        assert_eq!(default_preset(PresetAxis::Pose).id, "pose1");
        assert_eq!(default_preset(PresetAxis::Lighting).id, "light1");
    }

    #[test]
    fn lookup_is_scoped_to_the_axis() {
        assert_eq!(find_preset(PresetAxis::Pose, "pose5").unwrap().label, "Gym Mirror");
        assert!(find_preset(PresetAxis::Angle, "pose5").is_none());
        assert!(find_preset(PresetAxis::Lighting, "nope").is_none());
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert!(matches!(
            PresetCatalog::new(PresetAxis::Angle, vec![]),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let dup = vec![
            VibePreset::new("a", "A", "one"),
            VibePreset::new("a", "B", "two"),
        ];
        assert!(PresetCatalog::new(PresetAxis::Pose, dup).is_err());
    }

    #[test]
    fn axis_parses_aliases() {
        assert_eq!("Camera".parse::<PresetAxis>(), Ok(PresetAxis::Angle));
        assert_eq!("light".parse::<PresetAxis>(), Ok(PresetAxis::Lighting));
        assert!("mood".parse::<PresetAxis>().is_err());
    }
}
