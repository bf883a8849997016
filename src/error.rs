//! Top-level error types for the command-line tool.
//!
//! This module defines the errors surfaced to the user, with actionable
//! recovery suggestions.

use crate::bundler::Error as PipelineError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Main error type for all CLI operations
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Release pipeline errors
    #[error("Bundler error: {0}")]
    Bundler(#[from] PipelineError),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Required external tools are not on PATH
    #[error("Missing required tools: {}", .tools.join(", "))]
    MissingTools {
        /// Tool names
        tools: Vec<String>,
    },

    /// Command execution failed
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },
}

impl BundlerError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            BundlerError::Cli(CliError::MissingTools { tools }) => {
                let mut suggestions = vec![format!("Put {} on PATH", tools.join(", "))];
                if tools.iter().any(|t| matches!(t.as_str(), "codesign" | "xcrun" | "spctl")) {
                    suggestions.push("Install the Xcode Command Line Tools: xcode-select --install".into());
                }
                suggestions
            }
            BundlerError::Cli(CliError::InvalidArguments { .. }) => {
                vec!["Run with --help to see accepted values".to_string()]
            }
            BundlerError::Bundler(e) => pipeline_suggestions(e),
            BundlerError::Toml(_) => {
                vec!["Check the configuration file against the [package], [dmg] and [macos] tables".to_string()]
            }
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Check if this error is recoverable
    ///
    /// Rejections by the notary service need a changed build, not a rerun.
    pub fn is_recoverable(&self) -> bool {
        match self {
            BundlerError::Bundler(e) => {
                !matches!(root_cause(e), PipelineError::NotarizationRejected { .. })
            }
            _ => true,
        }
    }
}

fn root_cause(error: &PipelineError) -> &PipelineError {
    match error {
        PipelineError::Context(_, inner) => root_cause(inner),
        other => other,
    }
}

fn pipeline_suggestions(error: &PipelineError) -> Vec<String> {
    match root_cause(error) {
        PipelineError::NotarizationRejected { id, .. } => vec![format!(
            "Inspect the notary log: xcrun notarytool log {id} --keychain-profile <profile>"
        )],
        PipelineError::CommandFailed { .. } => {
            vec!["Run with --check to verify that all tools are installed".to_string()]
        }
        PipelineError::ToolFailed { command, .. } if command.starts_with("hdiutil") => vec![
            "Eject any leftover volume mounted from dist/temp/mnt and retry".to_string(),
        ],
        PipelineError::InvalidConfig(_) => {
            vec!["Run with --help to see accepted values".to_string()]
        }
        _ => vec!["Rerun with RUST_LOG=debug for the full command lines".to_string()],
    }
}
