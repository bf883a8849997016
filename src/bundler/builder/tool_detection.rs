//! External tool detection and build-input preflight.
//!
//! Locates every tool a run will invoke on `PATH` before anything is
//! touched, and parses the pinned dependency manifest.

use crate::{
    bundler::{Result, Settings, error::Context},
    metadata::{Requirement, RequirementsManifest},
};
use std::path::PathBuf;

/// Platform the build dependencies are resolved for.
pub const TARGET_PLATFORM: &str = "darwin";

/// A tool the run may invoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRequirement {
    pub name: String,
    /// Missing required tools abort the run; optional ones only degrade the
    /// image layout.
    pub required: bool,
}

impl ToolRequirement {
    fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
        }
    }

    fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
        }
    }
}

/// Tools needed for a run with these settings.
pub fn tool_requirements(settings: &Settings) -> Vec<ToolRequirement> {
    let mut tools = vec![
        ToolRequirement::required(&settings.package().python),
        ToolRequirement::required("hdiutil"),
        ToolRequirement::optional("bless"),
        ToolRequirement::optional("osascript"),
        ToolRequirement::optional("SetFile"),
    ];

    if settings.signing().is_some() {
        tools.extend(["codesign", "spctl", "xcrun"].map(ToolRequirement::required));
    }

    tools
}

/// Outcome of locating tools.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolReport {
    pub found: Vec<(String, PathBuf)>,
    pub missing_required: Vec<String>,
    pub missing_optional: Vec<String>,
}

impl ToolReport {
    pub fn is_complete(&self) -> bool {
        self.missing_required.is_empty()
    }
}

/// Locate tools on `PATH`.
pub fn detect_tools(settings: &Settings) -> ToolReport {
    detect_tools_with(settings, |name| which::which(name).ok())
}

/// Locate tools with a custom lookup.
pub fn detect_tools_with<F>(settings: &Settings, lookup: F) -> ToolReport
where
    F: Fn(&str) -> Option<PathBuf>,
{
    let mut report = ToolReport::default();

    for tool in tool_requirements(settings) {
        match lookup(&tool.name) {
            Some(path) => {
                log::debug!("Found {} at: {}", tool.name, path.display());
                report.found.push((tool.name, path));
            }
            None if tool.required => {
                log::debug!("{} not found in PATH", tool.name);
                report.missing_required.push(tool.name);
            }
            None => {
                log::warn!(
                    "{} not found in PATH. The DMG layout step will report a failure.",
                    tool.name
                );
                report.missing_optional.push(tool.name);
            }
        }
    }

    report
}

/// Everything the preflight found out.
#[derive(Debug, Clone)]
pub struct Preflight {
    pub tools: ToolReport,
    /// Requirements applying on [`TARGET_PLATFORM`].
    pub requirements: Vec<Requirement>,
    /// Applying requirements not pinned with `==`.
    pub unpinned: Vec<Requirement>,
    pub version: Option<String>,
}

/// Run the preflight: locate tools and parse the manifest.
///
/// # Errors
/// Fails when the requirements manifest is missing or unparseable. Missing
/// tools are reported in [`Preflight::tools`], not as an error.
pub fn preflight(settings: &Settings) -> Result<Preflight> {
    preflight_with(settings, detect_tools(settings))
}

/// Run the preflight with an already computed tool report.
pub fn preflight_with(settings: &Settings, tools: ToolReport) -> Result<Preflight> {
    let manifest_path = settings.requirements_path();
    let manifest = RequirementsManifest::load(&manifest_path)
        .with_context(|| format!("checking {}", manifest_path.display()))?;

    let requirements: Vec<Requirement> =
        manifest.for_platform(TARGET_PLATFORM).cloned().collect();
    let unpinned: Vec<Requirement> = manifest
        .unpinned_for(TARGET_PLATFORM)
        .into_iter()
        .cloned()
        .collect();

    for req in &unpinned {
        log::warn!(
            "{} (line {}) is not pinned with '==': {}",
            req.name,
            req.line,
            if req.specifier.is_empty() {
                "no version constraint"
            } else {
                req.specifier.as_str()
            }
        );
    }

    Ok(Preflight {
        tools,
        requirements,
        unpinned,
        version: settings.version().map(str::to_string),
    })
}
