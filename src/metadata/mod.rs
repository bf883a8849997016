//! Release inputs read from the working tree.
//!
//! - the optional version marker that names the output image
//! - the optional release configuration file
//! - the pinned build dependency manifest (see [`requirements`])

pub mod requirements;

use crate::bundler::{
    BundleSettings,
    error::{Context, ErrorExt, Result},
};
use std::io;
use std::path::Path;

pub use requirements::{Requirement, RequirementsManifest};

/// Read the version marker.
///
/// Returns `None` when the file does not exist or holds only whitespace.
/// Otherwise returns the first line, trimmed.
pub fn read_version_marker(path: &Path) -> Result<Option<String>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).fs_context("reading version marker", path),
    };

    let version = contents.lines().next().unwrap_or_default().trim();
    if version.is_empty() {
        return Ok(None);
    }

    Ok(Some(version.to_string()))
}

/// Load the release configuration file.
pub fn load_bundle_settings(config_path: &Path) -> Result<BundleSettings> {
    let text = std::fs::read_to_string(config_path)
        .fs_context("reading release configuration", config_path)?;

    BundleSettings::from_toml(&text)
        .with_context(|| format!("parsing {}", config_path.display()))
}
