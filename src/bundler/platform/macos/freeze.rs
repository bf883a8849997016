//! Application bundle creation with PyInstaller.

use crate::{
    bail,
    bundler::{
        error::{Context, Result},
        process::{CommandRunner, ToolCommand, run_checked},
        settings::Settings,
        utils::fs,
    },
};
use std::path::PathBuf;

/// Freeze the application into `dist/<Product>.app`.
///
/// The output directory is wiped first so nothing from a previous build can
/// end up in the new bundle or the image.
///
/// # Returns
/// Path to the produced `.app` bundle.
pub async fn build_bundle<R: CommandRunner>(settings: &Settings, runner: &R) -> Result<PathBuf> {
    let output_dir = settings.output_dir();
    fs::create_dir_all(&output_dir, true).await?;

    log::info!(
        "Freezing {} with log level {}",
        settings.build_spec_path().display(),
        settings.log_level()
    );

    run_checked(
        runner,
        ToolCommand::from_path(&settings.env_python())
            .args(["-m", "PyInstaller"])
            .arg_path(&settings.build_spec_path())
            .arg("--noconfirm")
            .arg(format!("--log-level={}", settings.log_level()))
            .arg("--distpath")
            .arg_path(&output_dir)
            .arg("--workpath")
            .arg_path(&settings.work_dir())
            .dir(settings.root()),
    )
    .await
    .context("freezing application")?;

    let app_path = settings.built_app_path();
    if !app_path.is_dir() {
        bail!(
            "PyInstaller finished but {} was not produced",
            app_path.display()
        );
    }

    log::info!("✓ Built {}", app_path.display());

    Ok(app_path)
}
