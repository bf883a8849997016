//! Application and working-tree layout settings.

use std::path::PathBuf;

/// Where the application's build inputs live and what it is called.
///
/// Maps from the `[package]` table of the release configuration file. All
/// paths are relative to the working tree root.
///
/// # Examples
///
/// ```toml
/// [package]
/// product_name = "Tribler"
/// build_spec = "build/mac/tribler.spec"
/// requirements = "requirements-build.txt"
/// ```
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackageSettings {
    /// Product name: names the `.app` bundle, the disk-image volume and
    /// the output file.
    ///
    /// Default: "Tribler"
    pub product_name: String,

    /// Build specification handed to the freezing tool.
    ///
    /// Default: "tribler.spec"
    pub build_spec: PathBuf,

    /// Pinned build dependency manifest.
    ///
    /// Default: "requirements-build.txt"
    pub requirements: PathBuf,

    /// Optional file whose contents are embedded in the output file name.
    ///
    /// Default: ".TriblerVersion"
    pub version_marker: PathBuf,

    /// Interpreter used to create the isolated build environment.
    ///
    /// Default: "python3"
    pub python: String,

    /// Output directory, wiped at the start of every build.
    ///
    /// Default: "dist"
    pub output_dir: PathBuf,
}

impl Default for PackageSettings {
    fn default() -> Self {
        Self {
            product_name: "Tribler".into(),
            build_spec: PathBuf::from("tribler.spec"),
            requirements: PathBuf::from("requirements-build.txt"),
            version_marker: PathBuf::from(".TriblerVersion"),
            python: "python3".into(),
            output_dir: PathBuf::from("dist"),
        }
    }
}
