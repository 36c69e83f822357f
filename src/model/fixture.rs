use std::fmt;

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ── DMX Addressing ──────────────────────────────────────────────────

/// DMX universe number, 1-indexed as written in patch files.
///
/// Holds any integer the input carries. Whether it names a real universe is
/// decided against the configured universe count.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct Universe(pub i64);

impl Universe {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Universe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// DMX channel address within a universe, 1-indexed.
///
/// Not range-checked on construction: the valid ceiling depends on the
/// configured channel count, so bounds are enforced where slots are marked.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct DmxAddress(pub i64);

impl DmxAddress {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for DmxAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

/// Where a fixture record came from. Venue fixtures are processed first,
/// so auxiliary fixtures take precedence on shared channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FixtureSource {
    /// Fixtures from the VRSL export.
    Venue,
    /// GPU readback fixtures from the extras file.
    #[serde(rename = "aux")]
    Auxiliary,
}

impl fmt::Display for FixtureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixtureSource::Venue => write!(f, "venue"),
            FixtureSource::Auxiliary => write!(f, "aux"),
        }
    }
}

/// One patched fixture: a universe, a start address and a named channel
/// footprint. Any other fields of the input record are kept in `extra`,
/// in input order, and written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    pub universe: Universe,
    pub channel: DmxAddress,
    /// One label per occupied channel, starting at `channel`.
    pub channel_names: Vec<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl Fixture {
    pub fn new(universe: i64, channel: i64, channel_names: &[&str]) -> Self {
        Self {
            universe: Universe(universe),
            channel: DmxAddress(channel),
            channel_names: channel_names.iter().map(|n| (*n).to_string()).collect(),
            extra: IndexMap::new(),
        }
    }

    /// Number of consecutive channels this fixture occupies. Always at least
    /// one: the primary channel is claimed even with no channel names.
    pub fn footprint(&self) -> u16 {
        u16::try_from(self.channel_names.len())
            .unwrap_or(u16::MAX)
            .max(1)
    }

    /// Last channel covered by the footprint, before any clamping.
    pub fn last_channel(&self) -> i64 {
        self.channel
            .get()
            .saturating_add(i64::from(self.footprint()) - 1)
    }

    /// Display label: the record's `name` field when present, otherwise the
    /// first channel name.
    pub fn label(&self) -> &str {
        self.extra
            .get("name")
            .and_then(serde_json::Value::as_str)
            .or_else(|| self.channel_names.first().map(String::as_str))
            .unwrap_or("(unnamed)")
    }
}
