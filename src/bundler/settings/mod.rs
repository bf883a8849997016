//! Configuration structures for the release pipeline.
//!
//! Raw inputs (flags, environment variables, the optional TOML file) are
//! collected by [`SettingsBuilder`] and validated once into [`Settings`],
//! the build context every step receives.

mod builder;
mod bundle;
mod core;
mod macos;
mod package;

// Re-export all public types
pub use builder::{
    DEFAULT_BUILD_ENV, DEFAULT_KEYCHAIN_PROFILE, DEFAULT_LOG_LEVEL, LOG_LEVELS, SettingsBuilder,
};
pub use bundle::BundleSettings;
pub use core::{Settings, image_file_name};
pub use macos::{DmgSettings, MacOsSettings, SigningSettings, WINDOW_SETTLE_DELAY};
pub use package::PackageSettings;
