//! Install-staging directory assembly.
//!
//! The staging directory becomes the root of the disk image volume:
//!
//! ```text
//! installdir/
//! ├── Tribler.app
//! ├── Applications -> /Applications
//! ├── .background/background.png
//! └── .VolumeIcon.icns
//! ```

use crate::bundler::{
    error::{Context, Error, Result},
    settings::Settings,
    utils::fs,
};
use std::path::{Path, PathBuf};

/// Hidden directory Finder reads the background picture from.
pub const BACKGROUND_DIR: &str = ".background";

/// File name Finder uses for a custom volume icon.
pub const VOLUME_ICON: &str = ".VolumeIcon.icns";

/// Move the app bundle into the staging directory and add resources.
///
/// # Returns
/// Path to the staged `.app` bundle.
pub async fn stage_installer(settings: &Settings, app_bundle: &Path) -> Result<PathBuf> {
    let staging = settings.staging_dir();
    fs::create_dir_all(&staging, true).await?;

    let staged_app = settings.staged_app_path();
    log::debug!("Moving {} to {}", app_bundle.display(), staged_app.display());
    fs::move_dir(app_bundle, &staged_app)
        .await
        .context("moving app bundle into staging directory")?;

    let background = settings.background_path();
    let background_name = background.file_name().ok_or_else(|| {
        Error::InvalidConfig(format!(
            "background image path {} has no file name",
            background.display()
        ))
    })?;
    fs::copy_file(
        &background,
        &staging.join(BACKGROUND_DIR).join(background_name),
    )
    .await
    .context("copying background image")?;

    fs::copy_file(&settings.volume_icon_path(), &staging.join(VOLUME_ICON))
        .await
        .context("copying volume icon")?;

    // Drag-to-install target
    fs::symlink(Path::new("/Applications"), &staging.join("Applications")).await?;

    log::info!("✓ Staged installer contents in {}", staging.display());

    Ok(staged_app)
}
