//! Non-fatal checks on the patch inputs.
//!
//! The occupancy mapper accepts any input and resolves problems silently
//! (skipping foreign universes, clamping footprints, letting later fixtures
//! overwrite earlier ones). The audit reports each of those decisions so the
//! operator can see what the report glossed over.

use std::fmt;

use indexmap::IndexMap;

use crate::model::{Fixture, FixtureSource};
use crate::occupancy::PatchConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Position of a fixture in its input list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixtureRef {
    pub source: FixtureSource,
    pub index: usize,
    pub universe: i64,
    pub channel: i64,
}

impl FixtureRef {
    fn new(source: FixtureSource, index: usize, fixture: &Fixture) -> Self {
        Self {
            source,
            index,
            universe: fixture.universe.get(),
            channel: fixture.channel.get(),
        }
    }
}

impl fmt::Display for FixtureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} fixture #{} ({}.{})",
            self.source, self.index, self.universe, self.channel
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// The fixture's universe does not exist; it appears nowhere in the report.
    UniverseOutOfRange {
        fixture: FixtureRef,
        universe_count: u16,
    },
    /// The start channel is 0 or above the universe ceiling.
    AddressOutOfRange {
        fixture: FixtureRef,
        channels_per_universe: u16,
    },
    /// The footprint runs past the last channel; `overflow` channels were dropped.
    FootprintOverrun { fixture: FixtureRef, overflow: i64 },
    /// `later` overwrote `channels` channels previously claimed by `earlier`,
    /// starting at `first_channel`.
    Overlap {
        earlier: FixtureRef,
        later: FixtureRef,
        first_channel: u16,
        channels: usize,
    },
}

impl Finding {
    pub fn severity(&self) -> Severity {
        match self {
            Finding::Overlap { .. } => Severity::Warning,
            Finding::UniverseOutOfRange { .. }
            | Finding::AddressOutOfRange { .. }
            | Finding::FootprintOverrun { .. } => Severity::Error,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::UniverseOutOfRange {
                fixture,
                universe_count,
            } => write!(
                f,
                "{fixture}: universe {} is outside 1..={universe_count}, fixture skipped",
                fixture.universe
            ),
            Finding::AddressOutOfRange {
                fixture,
                channels_per_universe,
            } => write!(
                f,
                "{fixture}: channel {} is outside 1..={channels_per_universe}",
                fixture.channel
            ),
            Finding::FootprintOverrun { fixture, overflow } => write!(
                f,
                "{fixture}: footprint runs {overflow} channel(s) past the end of the universe"
            ),
            Finding::Overlap {
                earlier,
                later,
                first_channel,
                channels,
            } => write!(
                f,
                "{later} overwrites {channels} channel(s) of {earlier} from channel {first_channel}"
            ),
        }
    }
}

/// Check both fixture lists against `config`, in the order the mapper
/// processes them. Range findings come first, overlaps after.
pub fn audit(venue: &[Fixture], aux: &[Fixture], config: &PatchConfig) -> Vec<Finding> {
    let mut findings = Vec::new();
    // Per universe, which fixture (by processing position) last claimed each channel.
    let mut owners: Vec<Vec<Option<FixtureRef>>> = config
        .universes()
        .map(|_| vec![None; usize::from(config.channels_per_universe)])
        .collect();
    // (earlier, later) -> (first channel, channel count)
    let mut overlaps: IndexMap<(FixtureRef, FixtureRef), (u16, usize)> = IndexMap::new();

    let ordered = venue
        .iter()
        .enumerate()
        .map(|(i, f)| (FixtureRef::new(FixtureSource::Venue, i, f), f))
        .chain(
            aux.iter()
                .enumerate()
                .map(|(i, f)| (FixtureRef::new(FixtureSource::Auxiliary, i, f), f)),
        );

    for (fixture_ref, fixture) in ordered {
        if !config.contains_universe(fixture.universe) {
            findings.push(Finding::UniverseOutOfRange {
                fixture: fixture_ref,
                universe_count: config.universe_count,
            });
            continue;
        }
        let start = fixture.channel.get();
        let last = fixture.last_channel();
        let ceiling = i64::from(config.channels_per_universe);
        if !config.contains_channel(start) {
            findings.push(Finding::AddressOutOfRange {
                fixture: fixture_ref,
                channels_per_universe: config.channels_per_universe,
            });
        } else if last > ceiling {
            findings.push(Finding::FootprintOverrun {
                fixture: fixture_ref,
                overflow: last - ceiling,
            });
        }

        let Some(universe_owners) = config
            .universe_index(fixture.universe)
            .and_then(|i| owners.get_mut(i))
        else {
            continue;
        };
        for channel in start.max(1)..=last.min(ceiling) {
            let Some(slot) = usize::try_from(channel - 1)
                .ok()
                .and_then(|i| universe_owners.get_mut(i))
            else {
                continue;
            };
            if let Some(previous) = slot.replace(fixture_ref) {
                let first = u16::try_from(channel).unwrap_or(u16::MAX);
                overlaps
                    .entry((previous, fixture_ref))
                    .or_insert((first, 0))
                    .1 += 1;
            }
        }
    }

    findings.extend(
        overlaps
            .into_iter()
            .map(|((earlier, later), (first_channel, channels))| Finding::Overlap {
                earlier,
                later,
                first_channel,
                channels,
            }),
    );
    findings
}

pub fn error_count(findings: &[Finding]) -> usize {
    findings
        .iter()
        .filter(|f| f.severity() == Severity::Error)
        .count()
}

/// Log every finding at a level matching its severity.
pub fn log_findings(findings: &[Finding]) {
    for finding in findings {
        match finding.severity() {
            Severity::Error => tracing::error!(%finding, "patch problem"),
            Severity::Warning => tracing::warn!(%finding, "patch overlap"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn clean_patch_has_no_findings() {
        let venue = [Fixture::new(1, 1, &["dim"]), Fixture::new(1, 2, &["r", "g", "b"])];
        let aux = [Fixture::new(2, 1, &["x"])];
        assert!(audit(&venue, &aux, &PatchConfig::default()).is_empty());
    }

    #[test]
    fn foreign_universe_is_an_error() {
        let venue = [Fixture::new(15, 1, &["dim"])];
        let findings = audit(&venue, &[], &PatchConfig::default());
        assert_eq!(findings.len(), 1);
        assert!(matches!(
            findings[0],
            Finding::UniverseOutOfRange {
                universe_count: 9,
                ..
            }
        ));
        assert_eq!(error_count(&findings), 1);
        assert!(findings[0].to_string().contains("universe 15"));
    }

    #[test]
    fn addresses_beyond_dmx_range_are_reported_not_rejected() {
        let venue = [
            Fixture::new(-1, 1, &["dim"]),
            Fixture::new(70_000, 1, &["dim"]),
            Fixture::new(1, 70_000, &["dim"]),
        ];
        let findings = audit(&venue, &[], &PatchConfig::default());
        assert_eq!(findings.len(), 3);
        assert!(matches!(findings[0], Finding::UniverseOutOfRange { .. }));
        assert!(matches!(findings[1], Finding::UniverseOutOfRange { .. }));
        assert!(matches!(findings[2], Finding::AddressOutOfRange { .. }));
        assert!(findings[0].to_string().contains("universe -1"));
        assert!(findings[2].to_string().contains("channel 70000"));
    }

    #[test]
    fn overrun_reports_dropped_channel_count() {
        let aux = [Fixture::new(1, 511, &["a", "b", "c", "d"])];
        let findings = audit(&[], &aux, &PatchConfig::default());
        assert_eq!(findings.len(), 1);
        match &findings[0] {
            Finding::FootprintOverrun { fixture, overflow } => {
                assert_eq!(*overflow, 2);
                assert_eq!(fixture.source, FixtureSource::Auxiliary);
                assert_eq!(fixture.index, 0);
            }
            other => panic!("unexpected finding: {other}"),
        }
    }

    #[test]
    fn zero_address_is_out_of_range() {
        let venue = [Fixture::new(1, 0, &["a"])];
        let findings = audit(&venue, &[], &PatchConfig::default());
        assert!(matches!(findings[0], Finding::AddressOutOfRange { .. }));
    }

    #[test]
    fn overlap_is_a_warning_naming_both_fixtures() {
        let venue = [Fixture::new(2, 10, &["a", "b", "c"])];
        let aux = [Fixture::new(2, 11, &["x", "y"])];
        let findings = audit(&venue, &aux, &PatchConfig::default());

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity(), Severity::Warning);
        assert_eq!(error_count(&findings), 0);
        match &findings[0] {
            Finding::Overlap {
                earlier,
                later,
                first_channel,
                channels,
            } => {
                assert_eq!(earlier.source, FixtureSource::Venue);
                assert_eq!(later.source, FixtureSource::Auxiliary);
                assert_eq!(*first_channel, 11);
                assert_eq!(*channels, 2);
            }
            other => panic!("unexpected finding: {other}"),
        }
    }

    #[test]
    fn same_channel_in_different_universes_is_not_an_overlap() {
        let venue = [Fixture::new(1, 10, &["a"]), Fixture::new(2, 10, &["a"])];
        assert!(audit(&venue, &[], &PatchConfig::default()).is_empty());
    }

    #[test]
    fn overlaps_follow_errors() {
        let venue = [Fixture::new(1, 1, &["a", "b"]), Fixture::new(1, 2, &["a"])];
        let aux = [Fixture::new(12, 1, &["a"])];
        let findings = audit(&venue, &aux, &PatchConfig::default());
        assert_eq!(findings.len(), 2);
        assert!(matches!(findings[0], Finding::UniverseOutOfRange { .. }));
        assert!(matches!(findings[1], Finding::Overlap { .. }));
    }
}
