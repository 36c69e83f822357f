//! Report rendering. Formatting only: every number shown comes from the
//! `PatchPlan` built by the occupancy mapper.

pub mod html;
pub mod text;

use std::ops::RangeInclusive;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::config::{OutputFormat, ReportSettings};
use crate::error::{PatchError, Result};
use crate::model::VenueInfo;
use crate::occupancy::{
    FixturesByUniverse, OccupancyByUniverse, PatchPlan, SourcesByUniverse, UniversePatch,
};

/// Everything a renderer needs for one report.
#[derive(Debug, Clone, Copy)]
pub struct PatchReport<'a> {
    pub venue: &'a VenueInfo,
    pub plan: &'a PatchPlan<'a>,
    pub generated_at: DateTime<FixedOffset>,
    pub settings: &'a ReportSettings,
}

impl<'a> PatchReport<'a> {
    pub fn title(&self) -> String {
        match self.settings.title {
            Some(ref title) => title.clone(),
            None => format!("DMX Patch Set: {}", self.venue.display_name()),
        }
    }

    /// Universes shown in the human-readable formats.
    pub fn universes(&self) -> impl Iterator<Item = &'a UniversePatch<'a>> + '_ {
        self.plan
            .iter()
            .filter(|u| self.settings.include_empty_universes || !u.is_empty())
    }

    pub fn generated_label(&self) -> String {
        self.generated_at.format("%Y-%m-%d %H:%M:%S %:z").to_string()
    }
}

/// JSON shape: venue metadata plus the two mapper outputs. `sources` runs
/// parallel to `universes`, so fixture records stay as they were read.
#[derive(Serialize)]
struct JsonReport<'r, 'a> {
    title: String,
    generated_at: String,
    venue: &'a VenueInfo,
    universes: FixturesByUniverse<'r, 'a>,
    sources: SourcesByUniverse<'r, 'a>,
    occupancy: OccupancyByUniverse<'r, 'a>,
}

/// Render `report` in `format`.
pub fn render(report: &PatchReport<'_>, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Html => Ok(html::render(report)?),
        OutputFormat::Text => Ok(text::render(report)?),
        OutputFormat::Json => {
            let doc = JsonReport {
                title: report.title(),
                generated_at: report.generated_at.to_rfc3339(),
                venue: report.venue,
                universes: report.plan.fixtures_by_universe(),
                sources: report.plan.sources_by_universe(),
                occupancy: report.plan.occupancy_by_universe(),
            };
            serde_json::to_string_pretty(&doc).map_err(|source| PatchError::Json {
                origin: "report".to_string(),
                source,
            })
        }
        OutputFormat::Pdf => Err(PatchError::UnsupportedFormat(format)),
    }
}

/// "1-12, 20, 30-512", or "none".
pub(crate) fn format_runs(runs: &[RangeInclusive<u16>]) -> String {
    if runs.is_empty() {
        return "none".to_string();
    }
    runs.iter()
        .map(|r| {
            if r.start() == r.end() {
                r.start().to_string()
            } else {
                format!("{}-{}", r.start(), r.end())
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}


#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::model::Fixture;
    use crate::occupancy::compute_occupancy;

    #[test]
    fn format_runs_collapses_single_channels() {
        assert_eq!(format_runs(&[]), "none");
        assert_eq!(format_runs(&[1..=12, 20..=20, 30..=512]), "1-12, 20, 30-512");
    }

    #[test]
    fn title_prefers_settings_override() {
        let venue = fixtures::venue();
        let plan = compute_occupancy(&[], &[], &Default::default());
        let settings = ReportSettings::default();
        let report = PatchReport {
            venue: &venue,
            plan: &plan,
            generated_at: fixtures::timestamp(),
            settings: &settings,
        };
        assert_eq!(report.title(), "DMX Patch Set: Club <Aurora> & Co");

        let titled = ReportSettings {
            title: Some("Friday patch".into()),
            ..ReportSettings::default()
        };
        let report = PatchReport {
            settings: &titled,
            ..report
        };
        assert_eq!(report.title(), "Friday patch");
        assert_eq!(report.generated_label(), "2024-05-17 21:30:00 +02:00");
    }

    #[test]
    fn empty_universes_are_hidden_by_default() {
        let venue = fixtures::venue();
        let vf = fixtures::venue_fixtures();
        let plan = compute_occupancy(&vf, &[], &Default::default());
        let mut settings = ReportSettings::default();
        let shown = |settings: &ReportSettings| {
            let report = PatchReport {
                venue: &venue,
                plan: &plan,
                generated_at: fixtures::timestamp(),
                settings,
            };
            report.universes().map(|u| u.universe.get()).collect::<Vec<_>>()
        };
        assert_eq!(shown(&settings), [1, 3]);
        settings.include_empty_universes = true;
        assert_eq!(shown(&settings).len(), 9);
    }

    #[test]
    fn json_report_exposes_both_mapper_outputs() {
        let venue = fixtures::venue();
        let vf = fixtures::venue_fixtures();
        let af = fixtures::aux_fixtures();
        let plan = compute_occupancy(&vf, &af, &Default::default());
        let settings = ReportSettings::default();
        let report = PatchReport {
            venue: &venue,
            plan: &plan,
            generated_at: fixtures::timestamp(),
            settings: &settings,
        };

        let out = render(&report, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["generated_at"], "2024-05-17T21:30:00+02:00");
        assert_eq!(value["venue"]["name"], "Club <Aurora> & Co");

        let u1 = value["universes"]["1"].as_array().unwrap();
        assert_eq!(u1.len(), 2);
        assert_eq!(u1[0]["name"], "Par 1");
        assert!(u1[1].get("source").is_none());
        assert_eq!(value["sources"]["1"], serde_json::json!(["venue", "aux"]));
        assert_eq!(value["universes"]["2"], serde_json::json!([]));
        assert_eq!(value["sources"]["2"], serde_json::json!([]));

        let occupancy = &value["occupancy"];
        assert_eq!(occupancy.as_object().unwrap().len(), 9);
        assert_eq!(occupancy["1"].as_object().unwrap().len(), 512);
        assert_eq!(occupancy["1"]["6"], serde_json::json!({"used": true, "primary": false}));
        assert_eq!(occupancy["3"]["101"]["used"], true);
    }

    #[test]
    fn json_report_keeps_a_fixture_source_field_intact() {
        let venue = fixtures::venue();
        let mut tagged = Fixture::new(1, 1, &["a"]);
        tagged
            .extra
            .insert("source".into(), serde_json::Value::String("stage-left".into()));
        let vf = [tagged];
        let plan = compute_occupancy(&vf, &[], &Default::default());
        let settings = ReportSettings::default();
        let report = PatchReport {
            venue: &venue,
            plan: &plan,
            generated_at: fixtures::timestamp(),
            settings: &settings,
        };

        let out = render(&report, OutputFormat::Json).unwrap();
        assert_eq!(out.matches("\"source\"").count(), 1);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(
            value["universes"]["1"][0],
            serde_json::json!({"universe": 1, "channel": 1, "channelNames": ["a"], "source": "stage-left"})
        );
        assert_eq!(value["sources"]["1"], serde_json::json!(["venue"]));
    }

    #[test]
    fn pdf_is_rejected() {
        let venue = fixtures::venue();
        let plan = compute_occupancy(&[], &[], &Default::default());
        let settings = ReportSettings::default();
        let report = PatchReport {
            venue: &venue,
            plan: &plan,
            generated_at: fixtures::timestamp(),
            settings: &settings,
        };
        let err = render(&report, OutputFormat::Pdf).unwrap_err();
        assert!(matches!(err, PatchError::UnsupportedFormat(OutputFormat::Pdf)));
    }
}
