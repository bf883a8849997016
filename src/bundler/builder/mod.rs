//! Release run orchestration and coordination.
//!
//! This module provides the [`Pipeline`] that turns a source tree into a
//! distributable disk image.
//!
//! # Overview
//!
//! A run:
//! 1. Reads configuration from [`Settings`](crate::bundler::Settings)
//! 2. Prepares the build environment and freezes the app
//! 3. Stages the installer and packages the disk image
//! 4. Signs, notarizes and staples when signing is enabled
//! 5. Calculates the image checksum
//! 6. Leaves a [`RunReport`] behind, whether the run succeeded or not
//!
//! # Module Organization
//!
//! - [`checksum`] - SHA256 checksum calculation for the image
//! - [`orchestrator`] - Main [`Pipeline`] struct and step policy
//! - [`report`] - Per-step records
//! - [`tool_detection`] - External tool availability and manifest preflight

pub mod checksum;
mod orchestrator;
pub mod report;
pub mod tool_detection;

pub use orchestrator::Pipeline;
pub use report::{NotarizationRecord, Outcome, RunReport, Step, StepRecord, Tier};
pub use tool_detection::{Preflight, ToolReport, preflight};
