//! Release run orchestration.
//!
//! This module provides the [`Pipeline`] that drives every release step in
//! order and records what happened in a [`RunReport`].

use super::{
    checksum::calculate_sha256,
    report::{NotarizationRecord, Outcome, RunReport, Step},
};
use crate::bundler::{
    Error, Result, Settings,
    platform::macos::{
        build_bundle,
        dmg::{
            apply_layout, convert_image, create_image, detach_image, mount_image, rename_image,
        },
        prepare_environment,
        sign::{assess_gatekeeper, notarize, sign_bundle, sign_image, staple, verify_signature},
        stage_installer,
    },
    process::CommandRunner,
};
use chrono::Utc;
use std::{future::Future, path::PathBuf, time::Instant};

/// Drives a release run.
///
/// Steps run strictly in sequence. A failing fatal step ends the run; a
/// failing advisory step (layout, detach, Gatekeeper) is recorded and the run
/// continues.
///
/// # Examples
///
/// ```no_run
/// use tribler_dmg_bundler::bundler::{Pipeline, SettingsBuilder, SystemRunner};
///
/// # async fn example() -> tribler_dmg_bundler::bundler::Result<()> {
/// let settings = SettingsBuilder::new().root(".").build()?;
/// let mut pipeline = Pipeline::new(settings, SystemRunner);
///
/// let image = pipeline.run().await?;
/// println!("Created {}", image.display());
/// println!("{}", pipeline.report().to_json()?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Pipeline<R> {
    settings: Settings,
    runner: R,
    report: RunReport,
}

impl<R: CommandRunner> Pipeline<R> {
    pub fn new(settings: Settings, runner: R) -> Self {
        let report = RunReport::new(settings.product_name());
        Self {
            settings,
            runner,
            report,
        }
    }

    /// Report of the run so far. Complete once [`run`](Self::run) returned,
    /// whether it succeeded or not.
    pub fn report(&self) -> &RunReport {
        &self.report
    }

    /// Execute the release run.
    ///
    /// # Returns
    /// Path to the final disk image.
    pub async fn run(&mut self) -> Result<PathBuf> {
        log::info!(
            "Starting release of {} (signing {})",
            self.settings.product_name(),
            if self.settings.signing().is_some() {
                "enabled"
            } else {
                "disabled"
            }
        );

        let result = self.run_steps().await;

        if let Err(e) = &result {
            let failed = self
                .report
                .steps
                .iter()
                .rev()
                .find(|r| r.outcome.is_failed())
                .map(|r| r.step);
            let reason = match failed {
                Some(step) => format!("not reached: {step} failed"),
                None => format!("not reached: {e}"),
            };
            for step in Step::ALL {
                if self.report.outcome_of(step).is_none() {
                    self.report.skip(step, reason.clone());
                }
            }
        }

        self.report.finish();
        result
    }

    async fn run_steps(&mut self) -> Result<PathBuf> {
        let settings = &self.settings;
        let runner = &self.runner;
        let report = &mut self.report;
        let signing = settings.signing().is_some();

        run_fatal(
            report,
            Step::PrepareEnvironment,
            prepare_environment(settings, runner),
        )
        .await?;

        let app = run_fatal(report, Step::BuildBundle, build_bundle(settings, runner)).await?;

        let staged_app = run_fatal(
            report,
            Step::StageInstaller,
            stage_installer(settings, &app),
        )
        .await?;

        if signing {
            run_fatal(
                report,
                Step::SignBundle,
                sign_bundle(settings, runner, &staged_app),
            )
            .await?;
        } else {
            report.skip(Step::SignBundle, SIGNING_DISABLED);
        }

        let writable = run_fatal(report, Step::CreateImage, create_image(settings, runner)).await?;

        run_fatal(
            report,
            Step::MountImage,
            mount_image(settings, runner, &writable),
        )
        .await?;

        run_advisory(report, Step::ApplyLayout, apply_layout(settings, runner)).await;
        run_advisory(report, Step::DetachImage, detach_image(settings, runner)).await;

        let mut image = run_fatal(
            report,
            Step::ConvertImage,
            convert_image(settings, runner, &writable),
        )
        .await?;

        if settings.version().is_some() {
            image = run_fatal(report, Step::RenameImage, rename_image(settings, &image)).await?;
        } else {
            report.skip(Step::RenameImage, "no version marker");
        }
        report.artifact = Some(image.clone());

        if signing {
            run_fatal(report, Step::SignImage, sign_image(settings, runner, &image)).await?;
            run_fatal(
                report,
                Step::VerifySignature,
                verify_signature(runner, &image),
            )
            .await?;
            run_advisory(
                report,
                Step::AssessGatekeeper,
                assess_gatekeeper(runner, &image),
            )
            .await;

            let submission =
                match run_fatal(report, Step::Notarize, notarize(settings, runner, &image)).await {
                    Ok(submission) => submission,
                    Err(e) => {
                        if let Error::NotarizationRejected { id, status, .. } = &e {
                            report.notarization = Some(NotarizationRecord {
                                id: id.clone(),
                                status: status.clone(),
                            });
                        }
                        return Err(e);
                    }
                };
            report.notarization = Some(NotarizationRecord {
                id: submission.id,
                status: submission.status,
            });

            run_fatal(report, Step::Staple, staple(runner, &image)).await?;
        } else {
            for step in Step::ALL {
                if step.requires_signing() && report.outcome_of(step).is_none() {
                    report.skip(step, SIGNING_DISABLED);
                }
            }
        }

        let sha256 = run_fatal(report, Step::Checksum, calculate_sha256(&image)).await?;
        log::info!("SHA256 {}  {}", sha256, image.display());
        report.sha256 = Some(sha256);

        Ok(image)
    }
}

const SIGNING_DISABLED: &str = "code signing disabled";

/// Run a step whose failure ends the run.
async fn run_fatal<T, F>(report: &mut RunReport, step: Step, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    log::debug!("Step: {}", step);
    let started_at = Utc::now();
    let clock = Instant::now();

    let result = fut.await;

    let outcome = match &result {
        Ok(_) => Outcome::Succeeded,
        Err(e) => {
            log::error!("{} failed: {}", step, e);
            Outcome::Failed(e.to_string())
        }
    };
    report.record(step, outcome, started_at, clock.elapsed());

    result
}

/// Run a step whose failure is only recorded.
async fn run_advisory<T, F>(report: &mut RunReport, step: Step, fut: F) -> Option<T>
where
    F: Future<Output = Result<T>>,
{
    log::debug!("Step: {} (advisory)", step);
    let started_at = Utc::now();
    let clock = Instant::now();

    match fut.await {
        Ok(value) => {
            report.record(step, Outcome::Succeeded, started_at, clock.elapsed());
            Some(value)
        }
        Err(e) => {
            log::warn!("{} failed, continuing: {}", step, e);
            report.record(step, Outcome::Failed(e.to_string()), started_at, clock.elapsed());
            None
        }
    }
}
