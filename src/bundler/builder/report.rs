//! Per-run step records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{fmt, path::PathBuf, time::Duration};

/// Every step of a release run, in execution order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    PrepareEnvironment,
    BuildBundle,
    StageInstaller,
    SignBundle,
    CreateImage,
    MountImage,
    ApplyLayout,
    DetachImage,
    ConvertImage,
    RenameImage,
    SignImage,
    VerifySignature,
    AssessGatekeeper,
    Notarize,
    Staple,
    Checksum,
}

impl Step {
    /// All steps in the order a run executes them.
    pub const ALL: [Step; 16] = [
        Step::PrepareEnvironment,
        Step::BuildBundle,
        Step::StageInstaller,
        Step::SignBundle,
        Step::CreateImage,
        Step::MountImage,
        Step::ApplyLayout,
        Step::DetachImage,
        Step::ConvertImage,
        Step::RenameImage,
        Step::SignImage,
        Step::VerifySignature,
        Step::AssessGatekeeper,
        Step::Notarize,
        Step::Staple,
        Step::Checksum,
    ];

    /// Whether a failure of this step ends the run.
    pub fn tier(self) -> Tier {
        match self {
            Step::ApplyLayout | Step::DetachImage | Step::AssessGatekeeper => Tier::Advisory,
            _ => Tier::Fatal,
        }
    }

    /// Steps that only run when code signing is enabled.
    pub fn requires_signing(self) -> bool {
        matches!(
            self,
            Step::SignBundle
                | Step::SignImage
                | Step::VerifySignature
                | Step::AssessGatekeeper
                | Step::Notarize
                | Step::Staple
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::PrepareEnvironment => "prepare environment",
            Step::BuildBundle => "build app bundle",
            Step::StageInstaller => "stage installer",
            Step::SignBundle => "sign app bundle",
            Step::CreateImage => "create image",
            Step::MountImage => "mount image",
            Step::ApplyLayout => "apply layout",
            Step::DetachImage => "detach image",
            Step::ConvertImage => "convert image",
            Step::RenameImage => "rename image",
            Step::SignImage => "sign image",
            Step::VerifySignature => "verify signature",
            Step::AssessGatekeeper => "Gatekeeper assessment",
            Step::Notarize => "notarize",
            Step::Staple => "staple ticket",
            Step::Checksum => "checksum",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Failure policy of a step.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Failure ends the run.
    Fatal,
    /// Failure is recorded and the run continues.
    Advisory,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    Succeeded,
    Failed(String),
    Skipped(String),
}

impl Outcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct StepRecord {
    pub step: Step,
    pub tier: Tier,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub started_at: DateTime<Utc>,
    #[serde(with = "duration_ms", rename = "duration_ms")]
    pub duration: Duration,
}

/// Notarization verdict kept in the report.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct NotarizationRecord {
    pub id: String,
    pub status: String,
}

/// Everything a run did, in order.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub product_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub steps: Vec<StepRecord>,
    pub artifact: Option<PathBuf>,
    pub sha256: Option<String>,
    pub notarization: Option<NotarizationRecord>,
}

impl RunReport {
    pub fn new(product_name: impl Into<String>) -> Self {
        Self {
            product_name: product_name.into(),
            started_at: Utc::now(),
            finished_at: None,
            steps: Vec::new(),
            artifact: None,
            sha256: None,
            notarization: None,
        }
    }

    pub fn record(&mut self, step: Step, outcome: Outcome, started_at: DateTime<Utc>, duration: Duration) {
        self.steps.push(StepRecord {
            step,
            tier: step.tier(),
            outcome,
            started_at,
            duration,
        });
    }

    pub fn skip(&mut self, step: Step, reason: impl Into<String>) {
        self.record(step, Outcome::Skipped(reason.into()), Utc::now(), Duration::ZERO);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn outcome_of(&self, step: Step) -> Option<&Outcome> {
        self.steps.iter().find(|r| r.step == step).map(|r| &r.outcome)
    }

    /// Advisory steps that failed without ending the run.
    pub fn advisory_failures(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps
            .iter()
            .filter(|r| r.tier == Tier::Advisory && r.outcome.is_failed())
    }

    pub fn to_json(&self) -> crate::bundler::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }
}
