//! Command line argument parsing and validation.
//!
//! Every pipeline input can come from a flag or from the environment
//! variable the release scripts have always used.

use crate::bundler::settings::{
    DEFAULT_BUILD_ENV, DEFAULT_KEYCHAIN_PROFILE, DEFAULT_LOG_LEVEL, LOG_LEVELS,
};
use clap::Parser;
use std::path::PathBuf;

/// macOS DMG release pipeline for Tribler
#[derive(Parser, Debug)]
#[command(
    name = "tribler_dmg_bundler",
    version,
    about = "Builds the Tribler macOS disk image",
    long_about = "Builds the Tribler macOS disk image from a source tree.

Creates a build environment, freezes the app with PyInstaller, stages the
installer, packages a compressed DMG with a custom Finder layout and, when
CODE_SIGN_ENABLED and APPLE_DEV_ID are set, signs, notarizes and staples it.

Usage:
  tribler_dmg_bundler --root ~/src/tribler
  LOG_LEVEL=INFO tribler_dmg_bundler --report dist/report.json
  CODE_SIGN_ENABLED=1 APPLE_DEV_ID=\"Developer ID Application: ...\" tribler_dmg_bundler
  tribler_dmg_bundler --check

Exit code 0 = the image exists under dist/."
)]
pub struct Args {
    /// Root of the source tree
    #[arg(short = 'r', long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Release configuration file ([package], [dmg] and [macos] tables)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// PyInstaller log level
    #[arg(long, env = "LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// Build environment directory name
    #[arg(long, env = "BUILD_ENV", default_value = DEFAULT_BUILD_ENV)]
    pub build_env: String,

    /// Any non-empty value enables signing (together with --apple-dev-id)
    #[arg(long, env = "CODE_SIGN_ENABLED", value_name = "FLAG")]
    pub code_sign_enabled: Option<String>,

    /// Developer ID signing identity
    #[arg(long, env = "APPLE_DEV_ID", value_name = "IDENTITY")]
    pub apple_dev_id: Option<String>,

    /// notarytool credential profile stored in the keychain
    #[arg(long, env = "KEYCHAIN_PROFILE", default_value = DEFAULT_KEYCHAIN_PROFILE)]
    pub keychain_profile: String,

    /// Write the run report as JSON to this path
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Only run the preflight checks
    #[arg(long)]
    pub check: bool,

    /// Verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        let level = self.log_level.trim().to_ascii_uppercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Valid levels: {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            ));
        }

        if !self.root.is_dir() {
            return Err(format!(
                "Root {} is not a directory",
                self.root.display()
            ));
        }

        if let Some(config) = self.config.as_ref().filter(|c| !c.is_file()) {
            return Err(format!(
                "Configuration file {} does not exist",
                config.display()
            ));
        }

        Ok(())
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(args.verbose, args.quiet),
        }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }
}
