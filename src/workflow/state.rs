//! Session state owned by the orchestrator, plus its read-only snapshot.
use serde::Serialize;
use uuid::Uuid;

use crate::presets::{default_preset, PresetAxis, VibePreset};
use crate::types::{AspectRatio, GeneratedImage, Resolution, SourceImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Analyzing,
    AnalyzedReady,
    Manifesting,
    Result,
    Error,
}

/// One selected preset per axis, never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selections {
    pub angle: &'static VibePreset,
    pub pose: &'static VibePreset,
    pub lighting: &'static VibePreset,
}

impl Default for Selections {
    fn default() -> Self {
        Selections {
            angle: default_preset(PresetAxis::Angle),
            pose: default_preset(PresetAxis::Pose),
            lighting: default_preset(PresetAxis::Lighting),
        }
    }
}

impl Selections {
    pub(crate) fn set(&mut self, axis: PresetAxis, preset: &'static VibePreset) {
        match axis {
            PresetAxis::Angle => self.angle = preset,
            PresetAxis::Pose => self.pose = preset,
            PresetAxis::Lighting => self.lighting = preset,
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionState {
    pub image: Option<SourceImage>,
    pub analyzed_description: Option<String>,
    pub resolution: Resolution,
    pub aspect_ratio: AspectRatio,
    pub selections: Selections,
    pub is_analyzing: bool,
    pub is_generating: bool,
    pub generated: Option<GeneratedImage>,
    pub error: Option<String>,
    /// Bumped on every upload; analysis results from older uploads are dropped.
    pub upload_epoch: u64,
    /// Bumped on every manifest attempt; an analysis failure that lands after
    /// a later attempt started does not overwrite that attempt's outcome.
    pub manifest_epoch: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase implied by the current data. Clearing the error therefore
    /// returns the session to wherever it was before the failure. A loaded
    /// image is ready to manifest even without a description.
    pub fn phase(&self) -> Phase {
        if self.error.is_some() {
            Phase::Error
        } else if self.is_generating {
            Phase::Manifesting
        } else if self.is_analyzing {
            Phase::Analyzing
        } else if self.generated.is_some() {
            Phase::Result
        } else if self.analyzed_description.is_some() || self.image.is_some() {
            Phase::AnalyzedReady
        } else {
            Phase::Idle
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase(),
            has_image: self.image.is_some(),
            preview_id: self.image.as_ref().map(|i| i.id),
            image_file_name: self.image.as_ref().and_then(|i| i.file_name.clone()),
            analyzed_description: self.analyzed_description.clone(),
            resolution: self.resolution,
            aspect_ratio: self.aspect_ratio,
            selections: self.selections.clone(),
            is_analyzing: self.is_analyzing,
            is_generating: self.is_generating,
            result_id: self.generated.as_ref().map(|g| g.id),
            error: self.error.clone(),
        }
    }
}

/// What a presentation client sees.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub has_image: bool,
    pub preview_id: Option<Uuid>,
    pub image_file_name: Option<String>,
    pub analyzed_description: Option<String>,
    pub resolution: Resolution,
    pub aspect_ratio: AspectRatio,
    pub selections: Selections,
    pub is_analyzing: bool,
    pub is_generating: bool,
    pub result_id: Option<Uuid>,
    pub error: Option<String>,
}
