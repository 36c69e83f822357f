use std::fmt;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{PatchError, Result};
use crate::occupancy::PatchConfig;

// ── Output format ────────────────────────────────────────────────

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Html,
    Json,
    Text,
    /// Accepted for compatibility with existing scripts; rendering fails.
    Pdf,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Html => write!(f, "HTML"),
            OutputFormat::Json => write!(f, "JSON"),
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Pdf => write!(f, "PDF"),
        }
    }
}

// ── Report settings ──────────────────────────────────────────────

pub const DEFAULT_UNIVERSE_COUNT: u16 = 9;
pub const DEFAULT_CHANNELS_PER_UNIVERSE: u16 = 512;
pub const DEFAULT_GRID_COLUMNS: u16 = 32;

/// Everything that shapes one report run. Every field has a default, so a
/// settings file only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub universe_count: u16,
    pub channels_per_universe: u16,
    pub format: OutputFormat,
    /// Cells per row in the HTML occupancy grid.
    pub grid_columns: u16,
    /// Render universes that have no fixtures patched.
    pub include_empty_universes: bool,
    /// Overrides the venue-derived report title.
    pub title: Option<String>,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            universe_count: DEFAULT_UNIVERSE_COUNT,
            channels_per_universe: DEFAULT_CHANNELS_PER_UNIVERSE,
            format: OutputFormat::default(),
            grid_columns: DEFAULT_GRID_COLUMNS,
            include_empty_universes: false,
            title: None,
        }
    }
}

impl ReportSettings {
    /// Load settings from a YAML (`.yaml`/`.yml`) or JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PatchError::io(path, e))?;
        let origin = path.display().to_string();
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

        let settings: Self = if is_yaml {
            serde_yaml::from_str(&text).map_err(|source| PatchError::Yaml { origin, source })?
        } else {
            serde_json::from_str(&text).map_err(|source| PatchError::Json { origin, source })?
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.universe_count == 0 {
            return Err(PatchError::InvalidSettings(
                "universe_count must be at least 1".into(),
            ));
        }
        if self.channels_per_universe == 0 {
            return Err(PatchError::InvalidSettings(
                "channels_per_universe must be at least 1".into(),
            ));
        }
        if self.grid_columns == 0 {
            return Err(PatchError::InvalidSettings(
                "grid_columns must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The mapper's view of these settings.
    pub fn patch_config(&self) -> PatchConfig {
        PatchConfig {
            universe_count: self.universe_count,
            channels_per_universe: self.channels_per_universe,
        }
    }
}
