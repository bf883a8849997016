//! Writable disk image creation and mounting using hdiutil.

use crate::bundler::{
    error::{Context, Result},
    process::{CommandRunner, ToolCommand, run_checked},
    settings::Settings,
    utils::fs,
};
use std::path::{Path, PathBuf};

/// Create a writable, uncompressed (UDRW) image from the staging directory.
///
/// UDRW is required because the layout is written into the volume's
/// `.DS_Store` while mounted; a compressed image would discard the changes.
///
/// # Returns
/// Path to the writable image.
pub async fn create_image<R: CommandRunner>(settings: &Settings, runner: &R) -> Result<PathBuf> {
    let image = settings.writable_image_path();
    fs::create_dir_all(&settings.temp_dir(), false).await?;
    fs::remove_file(&image).await?;

    log::info!("Creating writable disk image {}", image.display());

    run_checked(
        runner,
        ToolCommand::new("hdiutil")
            .args(["create", "-fs", "HFS+", "-srcfolder"])
            .arg_path(&settings.staging_dir())
            .args(["-format", "UDRW", "-volname", settings.product_name(), "-ov"])
            .arg_path(&image),
    )
    .await
    .context("creating writable disk image")?;

    log::info!("✓ Created UDRW image: {}", image.display());

    Ok(image)
}

/// Attach the writable image read-write at the fixed mount point.
///
/// Mounted without verification and without Finder auto-opening it, then
/// waits one settle delay for Finder to notice the new volume.
///
/// # Returns
/// The mount point.
pub async fn mount_image<R: CommandRunner>(
    settings: &Settings,
    runner: &R,
    image: &Path,
) -> Result<PathBuf> {
    let mount_point = settings.mount_point();
    fs::create_dir_all(&mount_point, false).await?;

    log::debug!("Mounting {} at {}", image.display(), mount_point.display());

    run_checked(
        runner,
        ToolCommand::new("hdiutil")
            .arg("attach")
            .arg_path(image)
            .args(["-readwrite", "-noverify", "-noautoopen", "-mountpoint"])
            .arg_path(&mount_point),
    )
    .await
    .context("mounting writable disk image")?;

    tokio::time::sleep(settings.dmg().settle_delay()).await;

    Ok(mount_point)
}
