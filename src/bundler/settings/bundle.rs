//! Release configuration file.

use super::{DmgSettings, MacOsSettings, PackageSettings};

/// Contents of the optional release configuration file.
///
/// Every table and every key is optional; missing values fall back to the
/// defaults used to build Tribler.
///
/// # Configuration
///
/// ```toml
/// [package]
/// product_name = "Tribler"
///
/// [dmg]
/// icon_size = 96
///
/// [macos]
/// entitlements = "build/mac/entitlements.plist"
/// ```
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BundleSettings {
    /// Application and working-tree layout.
    pub package: PackageSettings,

    /// Disk image resources and layout.
    pub dmg: DmgSettings,

    /// Code signing options.
    pub macos: MacOsSettings,
}

impl BundleSettings {
    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str) -> crate::bundler::Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
