pub mod catalog;

pub use catalog::{
    catalog, default_preset, find_preset, list_presets, PresetAxis, PresetCatalog, VibePreset,
};
