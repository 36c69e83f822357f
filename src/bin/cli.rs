use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};

use vrsl_patchset::audit::{self, Finding};
use vrsl_patchset::config::{OutputFormat, ReportSettings};
use vrsl_patchset::loader::{self, PatchInputs};
use vrsl_patchset::report::{self, PatchReport};
use vrsl_patchset::{logging, output, PatchError};

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "vrsl-patchset",
    about = "VRSL DMX patch set generator",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// More log output (repeatable)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Less log output (repeatable)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    quiet: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the universe occupancy report
    Render {
        /// VRSL fixture export (JSON)
        vrsl_json: PathBuf,
        /// Extra fixtures and venue info (YAML)
        extras: PathBuf,
        /// Output file, or `-` for stdout
        outfile: PathBuf,
        /// Output format
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        /// Report title override
        #[arg(long)]
        title: Option<String>,
        /// Also render universes with nothing patched
        #[arg(long)]
        include_empty: bool,
        #[command(flatten)]
        patch: PatchArgs,
    },
    /// Load and audit the inputs without rendering
    Check {
        /// VRSL fixture export (JSON)
        vrsl_json: PathBuf,
        /// Extra fixtures and venue info (YAML)
        extras: PathBuf,
        #[command(flatten)]
        patch: PatchArgs,
    },
    /// Print JSON Schemas of the two input documents
    Schema,
}

#[derive(Args)]
struct PatchArgs {
    /// Settings file (YAML or JSON)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of universes
    #[arg(long)]
    universes: Option<u16>,
    /// Channels per universe
    #[arg(long)]
    channels: Option<u16>,
    /// Fail when the audit finds errors
    #[arg(long)]
    strict: bool,
}

// ── Settings ─────────────────────────────────────────────────────

fn resolve_settings(patch: &PatchArgs) -> Result<ReportSettings> {
    let mut settings = match patch.config {
        Some(ref path) => ReportSettings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => ReportSettings::default(),
    };
    if let Some(universes) = patch.universes {
        settings.universe_count = universes;
    }
    if let Some(channels) = patch.channels {
        settings.channels_per_universe = channels;
    }
    settings.validate()?;
    Ok(settings)
}

// ── Commands ─────────────────────────────────────────────────────

fn load_and_audit(
    vrsl_json: &Path,
    extras: &Path,
    settings: &ReportSettings,
    strict: bool,
) -> Result<(PatchInputs, Vec<Finding>)> {
    let inputs = PatchInputs::load(vrsl_json, extras)?;
    let findings = inputs.audit(&settings.patch_config());
    audit::log_findings(&findings);

    let errors = audit::error_count(&findings);
    if strict && errors > 0 {
        return Err(PatchError::AuditFailed { errors }.into());
    }
    Ok((inputs, findings))
}

fn run_check(vrsl_json: &Path, extras: &Path, patch: &PatchArgs) -> Result<()> {
    let settings = resolve_settings(patch)?;
    let (inputs, findings) = load_and_audit(vrsl_json, extras, &settings, patch.strict)?;
    let plan = inputs.plan(&settings.patch_config());

    for universe in plan.iter().filter(|u| !u.is_empty()) {
        tracing::info!(
            universe = universe.universe.get(),
            fixtures = universe.fixtures.len(),
            used = universe.occupancy.used_count(),
            "universe"
        );
    }
    tracing::info!(
        fixtures = plan.fixture_count(),
        errors = audit::error_count(&findings),
        warnings = findings.len() - audit::error_count(&findings),
        "check complete"
    );
    Ok(())
}

struct RenderArgs<'a> {
    vrsl_json: &'a Path,
    extras: &'a Path,
    outfile: &'a Path,
    format: Option<OutputFormat>,
    title: Option<&'a str>,
    include_empty: bool,
    patch: &'a PatchArgs,
}

fn run_render(args: &RenderArgs<'_>) -> Result<()> {
    let mut settings = resolve_settings(args.patch)?;
    if let Some(format) = args.format {
        settings.format = format;
    }
    if let Some(title) = args.title {
        settings.title = Some(title.to_string());
    }
    settings.include_empty_universes |= args.include_empty;

    tracing::info!(
        vrsl = %args.vrsl_json.display(),
        extras = %args.extras.display(),
        outfile = %args.outfile.display(),
        format = %settings.format,
        "generating patch set"
    );

    // Fail before loading anything when the format cannot be produced.
    if settings.format == OutputFormat::Pdf {
        return Err(PatchError::UnsupportedFormat(settings.format).into());
    }

    let (inputs, _findings) =
        load_and_audit(args.vrsl_json, args.extras, &settings, args.patch.strict)?;
    let plan = inputs.plan(&settings.patch_config());
    for universe in plan.iter() {
        tracing::debug!(
            universe = universe.universe.get(),
            fixtures = universe.fixtures.len(),
            used = universe.occupancy.used_count(),
            "mapped universe"
        );
    }

    let report = PatchReport {
        venue: &inputs.extras.venue,
        plan: &plan,
        generated_at: chrono::Local::now().fixed_offset(),
        settings: &settings,
    };
    let rendered = report::render(&report, settings.format)?;
    output::write_report(args.outfile, &rendered)
        .with_context(|| format!("failed to write {}", args.outfile.display()))?;
    Ok(())
}

fn run_schema() -> Result<()> {
    let schemas = loader::input_schemas();
    println!("{}", serde_json::to_string_pretty(&schemas)?);
    Ok(())
}

// ── Main ─────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbosity = i8::try_from(i16::from(cli.verbose) - i16::from(cli.quiet)).unwrap_or(0);
    logging::init(verbosity);

    let result = match &cli.command {
        Commands::Render {
            vrsl_json,
            extras,
            outfile,
            format,
            title,
            include_empty,
            patch,
        } => run_render(&RenderArgs {
            vrsl_json,
            extras,
            outfile,
            format: *format,
            title: title.as_deref(),
            include_empty: *include_empty,
            patch,
        }),
        Commands::Check {
            vrsl_json,
            extras,
            patch,
        } => run_check(vrsl_json, extras, patch),
        Commands::Schema => run_schema(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
