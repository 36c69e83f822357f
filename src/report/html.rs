use std::fmt::{self, Write};

use super::{format_runs, PatchReport};
use crate::occupancy::{ChannelState, UniversePatch};

const STYLE: &str = "\
body { font-family: sans-serif; margin: 2em; color: #222; }
h1 { margin-bottom: 0.2em; }
dl.venue { display: grid; grid-template-columns: max-content auto; gap: 0.2em 1em; }
dl.venue dt { font-weight: bold; }
table { border-collapse: collapse; margin: 0.5em 0 1.5em; }
th, td { border: 1px solid #bbb; padding: 0.2em 0.5em; }
table.grid td { width: 2.2em; text-align: center; font-size: 0.75em; padding: 0.1em; }
td.primary { background: #2e7d32; color: #fff; }
td.secondary { background: #a5d6a7; }
td.free { background: #fafafa; color: #999; }
td.overrun { color: #c62828; font-weight: bold; }
section.universe { page-break-inside: avoid; }
footer { margin-top: 2em; font-size: 0.8em; color: #666; }
";

/// Escape text for use in HTML element content and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render(report: &PatchReport<'_>) -> Result<String, fmt::Error> {
    let mut out = String::new();
    let title = escape_html(&report.title());

    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html lang=\"en\">")?;
    writeln!(out, "<head>")?;
    writeln!(out, "<meta charset=\"utf-8\">")?;
    writeln!(out, "<title>{title}</title>")?;
    writeln!(out, "<style>\n{STYLE}</style>")?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;

    writeln!(out, "<header>")?;
    writeln!(out, "<h1>{title}</h1>")?;
    let fields = report.venue.fields();
    if !fields.is_empty() {
        writeln!(out, "<dl class=\"venue\">")?;
        for (label, value) in &fields {
            writeln!(
                out,
                "<dt>{}</dt><dd>{}</dd>",
                escape_html(label),
                escape_html(value)
            )?;
        }
        writeln!(out, "</dl>")?;
    }
    writeln!(out, "</header>")?;

    write_summary(&mut out, report)?;
    for patch in report.universes() {
        write_universe(&mut out, report, patch)?;
    }

    writeln!(
        out,
        "<footer>Generated {}</footer>",
        escape_html(&report.generated_label())
    )?;
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")?;
    Ok(out)
}

fn write_summary(out: &mut String, report: &PatchReport<'_>) -> fmt::Result {
    writeln!(out, "<section class=\"summary\">")?;
    writeln!(out, "<h2>Summary</h2>")?;
    writeln!(out, "<table>")?;
    writeln!(
        out,
        "<thead><tr><th>Universe</th><th>Fixtures</th><th>Used</th><th>Free</th></tr></thead>"
    )?;
    writeln!(out, "<tbody>")?;
    for patch in report.universes() {
        let used = patch.occupancy.used_count();
        writeln!(
            out,
            "<tr><td><a href=\"#universe-{u}\">{u}</a></td><td>{}</td><td>{used}</td><td>{}</td></tr>",
            patch.fixtures.len(),
            patch.occupancy.channel_count() - used,
            u = patch.universe,
        )?;
    }
    writeln!(out, "</tbody>")?;
    writeln!(out, "</table>")?;
    writeln!(out, "</section>")
}

fn write_universe(
    out: &mut String,
    report: &PatchReport<'_>,
    patch: &UniversePatch<'_>,
) -> fmt::Result {
    let occupancy = &patch.occupancy;
    let universe = patch.universe;

    writeln!(
        out,
        "<section class=\"universe\" id=\"universe-{universe}\">"
    )?;
    writeln!(out, "<h2>Universe {universe}</h2>")?;
    writeln!(
        out,
        "<p>{} of {} channels used. Free: {}</p>",
        occupancy.used_count(),
        occupancy.channel_count(),
        format_runs(&occupancy.free_runs())
    )?;

    // Occupancy grid
    let columns = usize::from(report.settings.grid_columns.max(1));
    writeln!(out, "<table class=\"grid\">")?;
    let cells: Vec<_> = occupancy.iter().collect();
    for row in cells.chunks(columns) {
        write!(out, "<tr>")?;
        for (channel, state) in row {
            let class = match state {
                ChannelState::Primary => "primary",
                ChannelState::Secondary => "secondary",
                ChannelState::Unused => "free",
            };
            write!(out, "<td class=\"{class}\">{channel}</td>")?;
        }
        writeln!(out, "</tr>")?;
    }
    writeln!(out, "</table>")?;

    // Fixture list
    if !patch.fixtures.is_empty() {
        let ceiling = i64::try_from(occupancy.channel_count()).unwrap_or(i64::MAX);
        writeln!(out, "<table class=\"fixtures\">")?;
        writeln!(
            out,
            "<thead><tr><th>Channel</th><th>End</th><th>Fixture</th><th>Channels</th><th>Source</th></tr></thead>"
        )?;
        writeln!(out, "<tbody>")?;
        for placed in &patch.fixtures {
            let fixture = placed.fixture;
            let last = fixture.last_channel();
            let end_class = if last > ceiling {
                " class=\"overrun\""
            } else {
                ""
            };
            writeln!(
                out,
                "<tr><td>{}</td><td{end_class}>{last}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                fixture.channel,
                escape_html(fixture.label()),
                escape_html(&fixture.channel_names.join(", ")),
                placed.source,
            )?;
        }
        writeln!(out, "</tbody>")?;
        writeln!(out, "</table>")?;
    }

    writeln!(out, "</section>")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::ReportSettings;
    use crate::occupancy::compute_occupancy;
    use crate::report::fixtures;

    fn rendered(settings: &ReportSettings) -> String {
        let venue = fixtures::venue();
        let vf = fixtures::venue_fixtures();
        let af = fixtures::aux_fixtures();
        let plan = compute_occupancy(&vf, &af, &settings.patch_config());
        let report = PatchReport {
            venue: &venue,
            plan: &plan,
            generated_at: fixtures::timestamp(),
            settings,
        };
        render(&report).unwrap()
    }

    #[test]
    fn escape_html_handles_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn venue_strings_are_escaped() {
        let html = rendered(&ReportSettings::default());
        assert!(html.contains("<h1>DMX Patch Set: Club &lt;Aurora&gt; &amp; Co</h1>"));
        assert!(!html.contains("<Aurora>"));
        assert!(html.contains("<dt>address</dt><dd>1 Neon Street</dd>"));
        assert!(html.contains("<footer>Generated 2024-05-17 21:30:00 +02:00</footer>"));
    }

    #[test]
    fn grid_marks_primary_and_secondary_cells() {
        let html = rendered(&ReportSettings::default());
        assert!(html.contains("<td class=\"primary\">1</td>"));
        assert!(html.contains("<td class=\"free\">2</td>"));
        assert!(html.contains("<td class=\"primary\">5</td>"));
        assert!(html.contains("<td class=\"secondary\">6</td>"));
        assert!(html.contains("<td class=\"secondary\">7</td>"));
        assert!(html.contains("<p>4 of 512 channels used. Free: 2-4, 8-512</p>"));
    }

    #[test]
    fn grid_rows_follow_configured_width() {
        let settings = ReportSettings {
            grid_columns: 64,
            ..ReportSettings::default()
        };
        let html = rendered(&settings);
        let section = html.split("id=\"universe-1\"").nth(1).unwrap();
        let grid = section.split("<table class=\"grid\">").nth(1).unwrap();
        let grid = grid.split("</table>").next().unwrap();
        assert_eq!(grid.matches("<tr>").count(), 8);
    }

    #[test]
    fn fixture_rows_are_listed_by_channel() {
        let html = rendered(&ReportSettings::default());
        let par = html.find("<td>Par 1</td>").unwrap();
        let rgb = html.find("<td>r, g, b</td>").unwrap();
        assert!(par < rgb);
        assert!(html.contains("<td>r</td><td>r, g, b</td><td>aux</td>"));
        assert!(!html.contains("id=\"universe-2\""));
        assert!(html.contains("id=\"universe-3\""));
    }
}
