//! Editor settings, read from `lightwall.json` in the config directory.

use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::entities::CountPolicy;

/// Settings file name inside the config directory.
pub const SETTINGS_FILE: &str = "lightwall.json";

/// Editor defaults and tuning. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct EditorSettings {
    // New scene
    pub background_width_meters: f32,
    pub background_height_meters: f32,
    pub projector_size_meters: f32,

    // Estimation
    pub count_policy: CountPolicy,

    // Stage
    pub auto_size_fraction: f32, // Fraction of canvas width for freshly loaded layers
    pub min_box_px: f32,         // Smallest bounding box a resize may produce
    pub duplicate_offset_px: f32,

    // Decoding
    pub decode_workers: u32, // 0 = auto

    // 3D preview
    pub show_light_grid: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            background_width_meters: 30.0,
            background_height_meters: 30.0,
            projector_size_meters: 5.0,
            count_policy: CountPolicy::Grid,
            auto_size_fraction: 0.2,
            min_box_px: 5.0,
            duplicate_offset_px: 20.0,
            decode_workers: 0,
            show_light_grid: true,
        }
    }
}

impl EditorSettings {
    /// Load from `path`. A missing file yields defaults; malformed JSON is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        let settings: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse settings: {}", path.display()))?;
        info!("Settings loaded from {}", path.display());
        Ok(settings)
    }

    /// Load from `path`, writing the defaults there first if the file is missing
    /// so there is something to edit.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }
        let settings = Self::default();
        match settings.save(path) {
            Ok(()) => info!("Default settings written to {}", path.display()),
            Err(e) => warn!("{:#}", e),
        }
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write settings: {}", path.display()))?;
        Ok(())
    }

    /// Decode thread count: override, or a quarter of the cores (at least 1).
    pub fn decode_threads(&self) -> usize {
        if self.decode_workers > 0 {
            self.decode_workers as usize
        } else {
            (num_cpus::get() / 4).max(1)
        }
    }
}
