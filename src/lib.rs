//! macOS release pipeline for Tribler
//!
//! This library builds the distributable disk image:
//! - build environment and pinned build dependencies
//! - PyInstaller `.app` bundle
//! - drag-to-install DMG with a custom Finder layout
//! - optional code signing, notarization and stapling
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;
pub mod metadata;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
