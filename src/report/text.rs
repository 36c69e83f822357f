use std::fmt::{self, Write};

use super::{format_runs, PatchReport};

/// Plain-text report: venue header, then one block per universe.
pub fn render(report: &PatchReport<'_>) -> Result<String, fmt::Error> {
    let mut out = String::new();

    writeln!(out, "{}", report.title())?;
    for (label, value) in report.venue.fields() {
        writeln!(out, "{label}: {value}")?;
    }
    writeln!(out, "Generated: {}", report.generated_label())?;

    let mut shown = 0;
    for patch in report.universes() {
        shown += 1;
        let occupancy = &patch.occupancy;
        writeln!(out)?;
        writeln!(
            out,
            "Universe {}: {} fixtures, {}/{} channels used",
            patch.universe,
            patch.fixtures.len(),
            occupancy.used_count(),
            occupancy.channel_count()
        )?;
        writeln!(out, "  free: {}", format_runs(&occupancy.free_runs()))?;
        for placed in &patch.fixtures {
            let f = placed.fixture;
            writeln!(
                out,
                "  [{:>3}] {} ({} ch: {}) {}",
                f.channel.get(),
                f.label(),
                f.footprint(),
                f.channel_names.join(", "),
                placed.source
            )?;
        }
    }

    if shown == 0 {
        writeln!(out)?;
        writeln!(out, "No fixtures patched.")?;
    }
    Ok(out)
}
