//! Isolated build environment.
//!
//! The environment is recreated on every run so that a stale or partially
//! upgraded interpreter can never leak into a release build.

use crate::bundler::{
    error::{Context, Result},
    process::{CommandRunner, ToolCommand, run_checked},
    settings::Settings,
    utils::fs,
};

/// Recreate the build environment and install the pinned build dependencies.
///
/// # Process
/// 1. Remove `<root>/<BUILD_ENV>`
/// 2. `python3 -m venv <env>`
/// 3. `<env>/bin/python -m pip install --upgrade pip`
/// 4. `<env>/bin/python -m pip install -r <requirements>`
///
/// Any failure is fatal; there is no partial-success mode.
pub async fn prepare_environment<R: CommandRunner>(settings: &Settings, runner: &R) -> Result<()> {
    let env_dir = settings.env_dir();
    log::info!("Creating build environment at {}", env_dir.display());

    fs::remove_dir_all(&env_dir).await?;

    run_checked(
        runner,
        ToolCommand::new(&settings.package().python)
            .args(["-m", "venv"])
            .arg_path(&env_dir)
            .dir(settings.root()),
    )
    .await
    .context("creating build environment")?;

    let python = settings.env_python();

    run_checked(
        runner,
        ToolCommand::from_path(&python)
            .args(["-m", "pip", "install", "--upgrade", "pip"])
            .dir(settings.root()),
    )
    .await
    .context("upgrading pip")?;

    let requirements = settings.requirements_path();
    run_checked(
        runner,
        ToolCommand::from_path(&python)
            .args(["-m", "pip", "install", "-r"])
            .arg_path(&requirements)
            .dir(settings.root()),
    )
    .await
    .with_context(|| format!("installing {}", requirements.display()))?;

    log::info!("✓ Build dependencies installed");

    Ok(())
}
