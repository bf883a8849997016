//! Command line interface for the release pipeline.
//!
//! Parses arguments, builds the [`Settings`](crate::bundler::Settings)
//! context, runs the preflight and then the pipeline, and prints the run
//! report.

mod args;
mod output;

pub use args::{Args, RuntimeConfig};
pub use output::OutputManager;

use crate::{
    bundler::{
        BundleSettings, CommandRunner, Pipeline, Settings, SettingsBuilder, SystemRunner,
        builder::{Preflight, tool_detection},
    },
    error::{BundlerError, CliError, Result},
    metadata,
};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    run_with(args, SystemRunner).await
}

/// Run with parsed arguments and a given command runner.
pub async fn run_with<R: CommandRunner>(args: Args, runner: R) -> Result<i32> {
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    let config = RuntimeConfig::from(&args);
    let output = config.output();

    let settings = build_settings(&args)?;

    output.section("Preflight")?;
    let preflight = tool_detection::preflight(&settings)?;
    print_preflight(output, &settings, &preflight)?;

    if !preflight.tools.is_complete() {
        return Err(CliError::MissingTools {
            tools: preflight.tools.missing_required,
        }
        .into());
    }

    if args.check {
        output.success("Preflight passed")?;
        return Ok(0);
    }

    let mut pipeline = Pipeline::new(settings, runner);
    let result = pipeline.run().await;
    let report = pipeline.report();

    output.report(report)?;

    if let Some(path) = &args.report {
        std::fs::write(path, report.to_json()?)?;
        output.verbose(&format!("Report written to {}", path.display()))?;
    }

    let image = result?;

    for record in report.advisory_failures() {
        output.warn(&format!("{} did not complete; see the log above", record.step))?;
    }
    output.success(&format!("Release image ready: {}", image.display()))?;

    Ok(0)
}

fn build_settings(args: &Args) -> Result<Settings> {
    let root = std::fs::canonicalize(&args.root)?;

    let bundle_settings = match &args.config {
        Some(path) => metadata::load_bundle_settings(path)?,
        None => BundleSettings::default(),
    };

    SettingsBuilder::new()
        .root(root)
        .bundle_settings(bundle_settings)
        .log_level(&args.log_level)
        .build_env(&args.build_env)
        .code_sign_enabled(args.code_sign_enabled.clone())
        .apple_dev_id(args.apple_dev_id.clone())
        .keychain_profile(&args.keychain_profile)
        .build()
        .map_err(BundlerError::from)
}

fn print_preflight(
    output: &OutputManager,
    settings: &Settings,
    preflight: &Preflight,
) -> std::io::Result<()> {
    output.info(&format!("Root: {}", settings.root().display()))?;
    output.info(&format!(
        "Image: {}",
        settings
            .final_image_path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    ))?;
    match &preflight.version {
        Some(version) => output.indent(&format!("version {}", version))?,
        None => output.indent("no version marker")?,
    }
    output.info(&format!(
        "Code signing: {}",
        match settings.signing() {
            Some(signing) => format!("enabled ({})", signing.identity),
            None => "disabled".to_string(),
        }
    ))?;

    for (tool, path) in &preflight.tools.found {
        output.verbose(&format!("{} → {}", tool, path.display()))?;
    }
    for tool in &preflight.tools.missing_optional {
        output.warn(&format!("{} not found; the DMG layout will be incomplete", tool))?;
    }
    for tool in &preflight.tools.missing_required {
        output.error(&format!("{} not found on PATH", tool));
    }

    output.info(&format!(
        "{} build requirements apply to {}",
        preflight.requirements.len(),
        tool_detection::TARGET_PLATFORM
    ))?;
    for req in &preflight.unpinned {
        output.warn(&format!(
            "{} is not pinned (line {})",
            req.name, req.line
        ))?;
    }

    Ok(())
}
