//! Channel occupancy mapping.
//!
//! Given the venue fixtures and the auxiliary fixtures, builds for every
//! universe the list of fixtures patched into it (ordered by start address)
//! and a dense table recording, per channel, whether it is free, a fixture's
//! primary (addressed) channel, or one of its footprint channels.
//!
//! Overlapping fixtures are not rejected: marks are applied in processing
//! order (venue fixtures, then auxiliary fixtures, each in list order) and
//! the last write wins.

use std::ops::RangeInclusive;

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

use crate::config::{DEFAULT_CHANNELS_PER_UNIVERSE, DEFAULT_UNIVERSE_COUNT};
use crate::model::{DmxAddress, Fixture, FixtureSource, Universe};

// ── Configuration ───────────────────────────────────────────────────

/// Shape of the addressable space: how many universes, how many channels each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchConfig {
    pub universe_count: u16,
    pub channels_per_universe: u16,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            universe_count: DEFAULT_UNIVERSE_COUNT,
            channels_per_universe: DEFAULT_CHANNELS_PER_UNIVERSE,
        }
    }
}

impl PatchConfig {
    pub fn contains_universe(&self, universe: Universe) -> bool {
        (1..=i64::from(self.universe_count)).contains(&universe.get())
    }

    pub fn contains_channel(&self, channel: i64) -> bool {
        (1..=i64::from(self.channels_per_universe)).contains(&channel)
    }

    pub fn universes(&self) -> impl Iterator<Item = Universe> {
        (1..=self.universe_count).map(|u| Universe(i64::from(u)))
    }

    /// Zero-based slot of `universe` in the plan, `None` when it is not configured.
    pub(crate) fn universe_index(&self, universe: Universe) -> Option<usize> {
        if !self.contains_universe(universe) {
            return None;
        }
        usize::try_from(universe.get() - 1).ok()
    }
}

// ── Channel state ───────────────────────────────────────────────────

/// State of one channel slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    #[default]
    Unused,
    /// The addressed start channel of a fixture.
    Primary,
    /// A footprint channel following a fixture's start channel.
    Secondary,
}

impl ChannelState {
    pub fn used(self) -> bool {
        !matches!(self, ChannelState::Unused)
    }

    /// Whether the slot is a primary channel. Unused slots report `true`;
    /// the flag carries no meaning for them.
    pub fn primary(self) -> bool {
        !matches!(self, ChannelState::Secondary)
    }
}

/// Serialized as `{"used": bool, "primary": bool}`.
impl Serialize for ChannelState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ChannelState", 2)?;
        state.serialize_field("used", &self.used())?;
        state.serialize_field("primary", &self.primary())?;
        state.end()
    }
}

// ── Occupancy table ─────────────────────────────────────────────────

/// Dense per-channel occupancy for one universe. Slot `i` holds channel `i + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyTable {
    slots: Vec<ChannelState>,
}

impl OccupancyTable {
    pub fn new(channels: u16) -> Self {
        Self {
            slots: vec![ChannelState::Unused; usize::from(channels)],
        }
    }

    pub fn channel_count(&self) -> usize {
        self.slots.len()
    }

    /// State of a 1-indexed channel, `None` when outside the universe.
    pub fn get(&self, channel: u16) -> Option<ChannelState> {
        let index = usize::from(channel).checked_sub(1)?;
        self.slots.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DmxAddress, ChannelState)> + '_ {
        (1..)
            .zip(self.slots.iter())
            .map(|(channel, state)| (DmxAddress(channel), *state))
    }

    pub fn used_count(&self) -> usize {
        self.slots.iter().filter(|s| s.used()).count()
    }

    /// Maximal runs of unused channels, in ascending order.
    pub fn free_runs(&self) -> Vec<RangeInclusive<u16>> {
        let mut runs = Vec::new();
        let mut start: Option<u16> = None;
        let mut last = 0;
        for (channel, state) in (1..=u16::MAX).zip(self.slots.iter()) {
            if state.used() {
                if let Some(s) = start.take() {
                    runs.push(s..=last);
                }
            } else if start.is_none() {
                start = Some(channel);
            }
            last = channel;
        }
        if let Some(s) = start {
            runs.push(s..=last);
        }
        runs
    }

    /// Mark one 1-indexed channel. Channels outside the table are ignored.
    fn mark(&mut self, channel: i64, state: ChannelState) {
        let Some(index) = usize::try_from(channel).ok().and_then(|c| c.checked_sub(1)) else {
            return;
        };
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = state;
        }
    }

    /// Mark a fixture's primary channel and its footprint. The footprint is
    /// clamped at the last channel of the universe.
    fn mark_fixture(&mut self, fixture: &Fixture) {
        let start = fixture.channel.get();
        let ceiling = i64::try_from(self.slots.len()).unwrap_or(i64::MAX);
        self.mark(start, ChannelState::Primary);
        for channel in start.saturating_add(1).max(1)..=fixture.last_channel().min(ceiling) {
            self.mark(channel, ChannelState::Secondary);
        }
    }
}

/// Serialized as a map from channel number to state, covering every channel.
impl Serialize for OccupancyTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.slots.len()))?;
        for (channel, state) in self.iter() {
            map.serialize_entry(&channel, &state)?;
        }
        map.end()
    }
}

// ── Patch plan ──────────────────────────────────────────────────────

/// A fixture as placed in a universe, tagged with the list it came from.
/// Serializes as the fixture record alone; the tag is exposed separately
/// through [`PatchPlan::sources_by_universe`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatchedFixture<'a> {
    pub source: FixtureSource,
    pub fixture: &'a Fixture,
}

impl Serialize for PatchedFixture<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fixture.serialize(serializer)
    }
}

/// Everything patched into one universe.
#[derive(Debug, Clone, PartialEq)]
pub struct UniversePatch<'a> {
    pub universe: Universe,
    /// Sorted by start channel; ties keep processing order.
    pub fixtures: Vec<PatchedFixture<'a>>,
    pub occupancy: OccupancyTable,
}

impl UniversePatch<'_> {
    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }
}

/// Result of the occupancy mapping: one entry per universe in
/// `1..=universe_count`, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchPlan<'a> {
    pub config: PatchConfig,
    universes: Vec<UniversePatch<'a>>,
}

impl<'a> PatchPlan<'a> {
    pub fn universe(&self, universe: Universe) -> Option<&UniversePatch<'a>> {
        let index = self.config.universe_index(universe)?;
        self.universes.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UniversePatch<'a>> {
        self.universes.iter()
    }

    pub fn fixture_count(&self) -> usize {
        self.universes.iter().map(|u| u.fixtures.len()).sum()
    }

    /// Serializable view: universe number to sorted fixture list.
    pub fn fixtures_by_universe(&self) -> FixturesByUniverse<'_, 'a> {
        FixturesByUniverse(self)
    }

    /// Serializable view: universe number to the source list of each fixture,
    /// parallel to [`Self::fixtures_by_universe`].
    pub fn sources_by_universe(&self) -> SourcesByUniverse<'_, 'a> {
        SourcesByUniverse(self)
    }

    /// Serializable view: universe number to dense occupancy table.
    pub fn occupancy_by_universe(&self) -> OccupancyByUniverse<'_, 'a> {
        OccupancyByUniverse(self)
    }
}

pub struct FixturesByUniverse<'p, 'a>(&'p PatchPlan<'a>);

impl Serialize for FixturesByUniverse<'_, '_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.universes.len()))?;
        for patch in &self.0.universes {
            map.serialize_entry(&patch.universe, &patch.fixtures)?;
        }
        map.end()
    }
}

pub struct SourcesByUniverse<'p, 'a>(&'p PatchPlan<'a>);

impl Serialize for SourcesByUniverse<'_, '_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.universes.len()))?;
        for patch in &self.0.universes {
            let sources: Vec<FixtureSource> = patch.fixtures.iter().map(|p| p.source).collect();
            map.serialize_entry(&patch.universe, &sources)?;
        }
        map.end()
    }
}

pub struct OccupancyByUniverse<'p, 'a>(&'p PatchPlan<'a>);

impl Serialize for OccupancyByUniverse<'_, '_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.universes.len()))?;
        for patch in &self.0.universes {
            map.serialize_entry(&patch.universe, &patch.occupancy)?;
        }
        map.end()
    }
}

/// Map venue and auxiliary fixtures onto the configured universes.
///
/// Fixtures whose universe lies outside `1..=universe_count` are skipped.
/// A start address outside the universe keeps the fixture in its universe's
/// list but marks only the footprint channels that fall inside it.
pub fn compute_occupancy<'a>(
    venue: &'a [Fixture],
    aux: &'a [Fixture],
    config: &PatchConfig,
) -> PatchPlan<'a> {
    let mut universes: Vec<UniversePatch<'a>> = config
        .universes()
        .map(|universe| UniversePatch {
            universe,
            fixtures: Vec::new(),
            occupancy: OccupancyTable::new(config.channels_per_universe),
        })
        .collect();

    let ordered = venue
        .iter()
        .map(|f| (FixtureSource::Venue, f))
        .chain(aux.iter().map(|f| (FixtureSource::Auxiliary, f)));

    for (source, fixture) in ordered {
        let Some(patch) = config
            .universe_index(fixture.universe)
            .and_then(|i| universes.get_mut(i))
        else {
            continue;
        };
        patch.fixtures.push(PatchedFixture { source, fixture });
        patch.occupancy.mark_fixture(fixture);
    }

    for patch in &mut universes {
        patch.fixtures.sort_by_key(|p| p.fixture.channel);
    }

    PatchPlan {
        config: *config,
        universes,
    }
}
