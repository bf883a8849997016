//! Code signing, Gatekeeper assessment, notarization and stapling.
//!
//! Every function here is only called when signing is enabled, i.e. when
//! [`Settings::signing`] returns `Some`.

use crate::bundler::{
    error::{Context, Error, Result},
    process::{CommandRunner, ToolCommand, run_checked},
    settings::{Settings, SigningSettings},
};
use serde::Deserialize;
use std::path::Path;

/// Status the notary service reports for an accepted submission.
pub const ACCEPTED_STATUS: &str = "Accepted";

/// Result of `notarytool submit --wait --output-format json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NotarySubmission {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl NotarySubmission {
    pub fn is_accepted(&self) -> bool {
        self.status == ACCEPTED_STATUS
    }
}

fn require_signing(settings: &Settings) -> Result<&SigningSettings> {
    settings
        .signing()
        .context("code signing is not enabled for this run")
}

/// Deep-sign the staged app bundle with the hardened runtime.
///
/// Runs before the image is created so the image contains the signed app.
pub async fn sign_bundle<R: CommandRunner>(
    settings: &Settings,
    runner: &R,
    app_bundle: &Path,
) -> Result<()> {
    let signing = require_signing(settings)?;
    log::info!("Signing {}", app_bundle.display());

    let mut command = ToolCommand::new("codesign")
        .args(["--deep", "--force", "--verbose", "--sign"])
        .arg(&signing.identity)
        .args(["--options", "runtime"]);

    if let Some(entitlements) = &signing.entitlements {
        command = command.arg("--entitlements").arg_path(entitlements);
    }

    run_checked(runner, command.arg_path(app_bundle).capture())
        .await
        .context("signing app bundle")?;

    log::info!("✓ App bundle signed");

    Ok(())
}

/// Sign the final disk image.
pub async fn sign_image<R: CommandRunner>(
    settings: &Settings,
    runner: &R,
    image: &Path,
) -> Result<()> {
    let signing = require_signing(settings)?;
    log::info!("Signing {}", image.display());

    run_checked(
        runner,
        ToolCommand::new("codesign")
            .args(["--force", "--verbose", "--sign"])
            .arg(&signing.identity)
            .arg_path(image)
            .capture(),
    )
    .await
    .context("signing disk image")?;

    Ok(())
}

/// Verify the image signature, once at default and once at maximum verbosity.
pub async fn verify_signature<R: CommandRunner>(runner: &R, image: &Path) -> Result<()> {
    for verbosity in ["--verbose", "--verbose=4"] {
        let output = run_checked(
            runner,
            ToolCommand::new("codesign")
                .args(["--verify", verbosity])
                .arg_path(image)
                .capture(),
        )
        .await
        .context("verifying disk image signature")?;

        // codesign reports verification details on stderr
        for line in output.stderr.lines().filter(|l| !l.trim().is_empty()) {
            log::debug!("codesign: {}", line);
        }
    }

    log::info!("✓ Signature verified");

    Ok(())
}

/// Ask Gatekeeper whether the image would be accepted when opened.
///
/// An unsigned-by-notary image is normally rejected at this point, so callers
/// treat a failure as advisory.
pub async fn assess_gatekeeper<R: CommandRunner>(runner: &R, image: &Path) -> Result<()> {
    let output = run_checked(
        runner,
        ToolCommand::new("spctl")
            .args([
                "--assess",
                "--type",
                "open",
                "--context",
                "context:primary-signature",
                "--verbose",
            ])
            .arg_path(image)
            .capture(),
    )
    .await
    .context("Gatekeeper assessment")?;

    log::info!("✓ Gatekeeper: {}", output.stderr.trim());

    Ok(())
}

/// Submit the image to the notary service and wait for the verdict.
///
/// # Errors
/// Fails when the submission cannot be made, when the answer cannot be
/// parsed, or with [`Error::NotarizationRejected`] when the status is not
/// `Accepted`.
pub async fn notarize<R: CommandRunner>(
    settings: &Settings,
    runner: &R,
    image: &Path,
) -> Result<NotarySubmission> {
    let signing = require_signing(settings)?;
    log::info!(
        "Submitting {} for notarization (profile {})",
        image.display(),
        signing.keychain_profile
    );

    let output = run_checked(
        runner,
        ToolCommand::new("xcrun")
            .args(["notarytool", "submit"])
            .arg_path(image)
            .arg("--keychain-profile")
            .arg(&signing.keychain_profile)
            .args(["--wait", "--output-format", "json"])
            .capture(),
    )
    .await
    .context("submitting disk image for notarization")?;

    let submission = parse_submission(&output.stdout)?;

    if !submission.is_accepted() {
        return Err(Error::NotarizationRejected {
            id: submission.id,
            status: submission.status,
            message: submission.message,
        });
    }

    log::info!("✓ Notarization accepted (submission {})", submission.id);

    Ok(submission)
}

/// Parse notarytool's JSON answer.
///
/// notarytool may print progress lines before the JSON document, so parsing
/// starts at the first `{`.
pub fn parse_submission(stdout: &str) -> Result<NotarySubmission> {
    let start = stdout
        .find('{')
        .context("notarytool produced no JSON output")?;

    serde_json::from_str(stdout[start..].trim())
        .map_err(Error::from)
        .context("parsing notarytool output")
}

/// Staple the notarization ticket to the image.
pub async fn staple<R: CommandRunner>(runner: &R, image: &Path) -> Result<()> {
    run_checked(
        runner,
        ToolCommand::new("xcrun")
            .args(["stapler", "staple"])
            .arg_path(image)
            .capture(),
    )
    .await
    .context("stapling notarization ticket")?;

    log::info!("✓ Ticket stapled to {}", image.display());

    Ok(())
}
