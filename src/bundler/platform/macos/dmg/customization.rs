//! DMG appearance customization.
//!
//! Everything in here is cosmetic. Callers treat failures as advisory.

use super::template::render_layout_scripts;
use crate::bundler::{
    error::{Context, Error, Result},
    process::{CommandRunner, ToolCommand, run_checked},
    settings::Settings,
};

/// Apply the Finder window layout to the mounted volume.
///
/// # Process
/// 1. `bless` the volume root so it opens when the image is mounted
/// 2. Run the window presentation script
/// 3. Run the icon placement script
/// 4. Flag the volume as having a custom icon
///
/// Each action is attempted even if an earlier one failed, and each is
/// followed by a settle delay because Finder applies changes asynchronously.
///
/// # Errors
/// Returns an error listing every failed action. The volume is left
/// mounted either way.
pub async fn apply_layout<R: CommandRunner>(settings: &Settings, runner: &R) -> Result<()> {
    log::info!("Applying DMG window layout...");

    let mount_point = settings.mount_point();
    let scripts = render_layout_scripts(settings)?;

    let actions = [
        (
            "bless volume",
            ToolCommand::new("bless")
                .arg("--folder")
                .arg_path(&mount_point)
                .arg("--openfolder")
                .arg_path(&mount_point),
        ),
        (
            "window layout",
            ToolCommand::new("osascript").arg("-e").arg(&scripts.window),
        ),
        (
            "icon positions",
            ToolCommand::new("osascript").arg("-e").arg(&scripts.icons),
        ),
        (
            "volume icon",
            ToolCommand::new("SetFile")
                .args(["-a", "C"])
                .arg_path(&mount_point),
        ),
    ];

    let total = actions.len();
    let mut failures = Vec::new();

    for (label, command) in actions {
        match run_checked(runner, command.capture()).await {
            Ok(_) => log::debug!("Layout action '{}' done", label),
            Err(e) => {
                log::warn!("Layout action '{}' had issues: {}", label, e);
                failures.push(format!("{label}: {e}"));
            }
        }
        tokio::time::sleep(settings.dmg().settle_delay()).await;
    }

    if !failures.is_empty() {
        return Err(Error::GenericError(format!(
            "{} of {} layout actions failed ({})",
            failures.len(),
            total,
            failures.join("; ")
        )));
    }

    log::info!("✓ DMG layout applied");

    Ok(())
}

/// Detach (unmount) the writable image, forcing it if a plain detach fails.
pub async fn detach_image<R: CommandRunner>(settings: &Settings, runner: &R) -> Result<()> {
    log::debug!("Detaching DMG...");

    let mount_point = settings.mount_point();

    let detach = ToolCommand::new("hdiutil")
        .arg("detach")
        .arg_path(&mount_point)
        .capture();

    if let Err(e) = run_checked(runner, detach).await {
        log::warn!("DMG detach had issues: {}; retrying with -force", e);

        run_checked(
            runner,
            ToolCommand::new("hdiutil")
                .arg("detach")
                .arg_path(&mount_point)
                .arg("-force")
                .capture(),
        )
        .await
        .with_context(|| format!("force-detaching {}", mount_point.display()))?;
    }

    Ok(())
}
