//! DMG format conversion and final naming.
//!
//! The writable UDRW image is converted to compressed read-only UDZO after
//! the layout has been written and the volume detached. Changes made to a
//! mounted UDZO would only land in a shadow file and be lost on detach, so
//! the order UDRW → layout → detach → UDZO is fixed.

use crate::bundler::{
    error::{Context, ErrorExt, Result},
    process::{CommandRunner, ToolCommand, run_checked},
    settings::Settings,
    utils::fs,
};
use std::path::{Path, PathBuf};

/// Convert the writable image to `dist/<Product>.dmg` (UDZO, zlib level 9).
///
/// Deletes the writable image once conversion succeeded.
///
/// # Returns
/// Path to the compressed image.
pub async fn convert_image<R: CommandRunner>(
    settings: &Settings,
    runner: &R,
    writable_image: &Path,
) -> Result<PathBuf> {
    log::info!("Converting DMG to compressed format...");

    let compressed = settings.default_image_path();
    fs::remove_file(&compressed).await?;

    run_checked(
        runner,
        ToolCommand::new("hdiutil")
            .arg("convert")
            .arg_path(writable_image)
            .args(["-format", "UDZO", "-imagekey", "zlib-level=9", "-ov", "-o"])
            .arg_path(&compressed),
    )
    .await
    .context("converting disk image to UDZO")?;

    fs::remove_file(writable_image).await?;

    log::info!("✓ DMG converted to compressed UDZO format");

    Ok(compressed)
}

/// Rename the compressed image to embed the version from the marker.
///
/// # Returns
/// The final artifact path (unchanged when there is no version).
pub async fn rename_image(settings: &Settings, image: &Path) -> Result<PathBuf> {
    let target = settings.final_image_path();
    if target == image {
        return Ok(target);
    }

    tokio::fs::rename(image, &target)
        .await
        .fs_context("renaming disk image", image)?;

    log::info!("✓ Renamed image to {}", target.display());

    Ok(target)
}
