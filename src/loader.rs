//! Input documents: the VRSL fixture export (JSON) and the venue extras
//! file (YAML).

use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::audit::{self, Finding};
use crate::error::{PatchError, Result};
use crate::model::{Fixture, FixtureSource, VenueInfo};
use crate::occupancy::{compute_occupancy, PatchConfig, PatchPlan};

// ── Document shapes ─────────────────────────────────────────────────

/// Top level of a VRSL export. Only the fixture list is read.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VrslDocument {
    pub fixtures: Vec<Fixture>,
}

/// Venue-specific additions that VRSL does not know about.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Extras {
    #[serde(default)]
    pub venue: VenueInfo,
    #[serde(default)]
    pub gpu_readback_fixtures: Vec<Fixture>,
}

// ── Parsing ─────────────────────────────────────────────────────────

/// Parse a VRSL export. `origin` names the document in error messages.
pub fn parse_vrsl_fixtures(text: &str, origin: &str) -> Result<Vec<Fixture>> {
    let doc: VrslDocument = serde_json::from_str(text).map_err(|source| PatchError::Json {
        origin: origin.to_string(),
        source,
    })?;
    check_footprints(&doc.fixtures, FixtureSource::Venue, origin)?;
    Ok(doc.fixtures)
}

/// Parse an extras file. An empty document yields empty extras.
pub fn parse_extras(text: &str, origin: &str) -> Result<Extras> {
    if text.trim().is_empty() {
        return Ok(Extras::default());
    }
    let extras: Extras = serde_yaml::from_str(text).map_err(|source| PatchError::Yaml {
        origin: origin.to_string(),
        source,
    })?;
    check_footprints(&extras.gpu_readback_fixtures, FixtureSource::Auxiliary, origin)?;
    Ok(extras)
}

fn check_footprints(fixtures: &[Fixture], list: FixtureSource, origin: &str) -> Result<()> {
    match fixtures.iter().position(|f| f.channel_names.is_empty()) {
        Some(index) => Err(PatchError::EmptyFootprint {
            origin: origin.to_string(),
            list,
            index,
        }),
        None => Ok(()),
    }
}

// ── Loading ─────────────────────────────────────────────────────────

pub fn load_vrsl_fixtures(path: &Path) -> Result<Vec<Fixture>> {
    let text = std::fs::read_to_string(path).map_err(|e| PatchError::io(path, e))?;
    let fixtures = parse_vrsl_fixtures(&text, &path.display().to_string())?;
    tracing::info!(path = %path.display(), count = fixtures.len(), "loaded VRSL fixtures");
    Ok(fixtures)
}

pub fn load_extras(path: &Path) -> Result<Extras> {
    let text = std::fs::read_to_string(path).map_err(|e| PatchError::io(path, e))?;
    let extras = parse_extras(&text, &path.display().to_string())?;
    tracing::info!(
        path = %path.display(),
        venue = extras.venue.display_name(),
        count = extras.gpu_readback_fixtures.len(),
        "loaded extras"
    );
    Ok(extras)
}

// ── Inputs bundle ───────────────────────────────────────────────────

/// Both input documents of one run, parsed.
#[derive(Debug, Clone)]
pub struct PatchInputs {
    pub venue_fixtures: Vec<Fixture>,
    pub extras: Extras,
}

impl PatchInputs {
    pub fn load(vrsl_path: &Path, extras_path: &Path) -> Result<Self> {
        Ok(Self {
            venue_fixtures: load_vrsl_fixtures(vrsl_path)?,
            extras: load_extras(extras_path)?,
        })
    }

    pub fn aux_fixtures(&self) -> &[Fixture] {
        &self.extras.gpu_readback_fixtures
    }

    pub fn audit(&self, config: &PatchConfig) -> Vec<Finding> {
        audit::audit(&self.venue_fixtures, self.aux_fixtures(), config)
    }

    pub fn plan(&self, config: &PatchConfig) -> PatchPlan<'_> {
        compute_occupancy(&self.venue_fixtures, self.aux_fixtures(), config)
    }
}

/// JSON Schemas of both input documents, keyed by document name.
pub fn input_schemas() -> serde_json::Value {
    let vrsl = schemars::schema_for!(VrslDocument);
    let extras = schemars::schema_for!(Extras);
    serde_json::json!({
        "vrsl": vrsl,
        "extras": extras,
    })
}
