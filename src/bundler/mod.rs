//! macOS release pipeline: build environment, PyInstaller bundle, installer
//! disk image and optional signing.
//!
//! # Configuration
//!
//! Defaults describe the Tribler source tree. An optional TOML file
//! overrides them:
//!
//! ```toml
//! [package]
//! product_name = "Tribler"
//! build_spec = "build/tribler.spec"
//!
//! [dmg]
//! window_bounds = [100, 100, 1100, 850]
//! icon_size = 128
//!
//! [macos]
//! entitlements = "build/mac/entitlements.plist"
//! ```
//!
//! # Integration
//!
//! ```no_run
//! use tribler_dmg_bundler::bundler::{Pipeline, SettingsBuilder, SystemRunner};
//!
//! # async fn example() -> tribler_dmg_bundler::bundler::Result<()> {
//! let settings = SettingsBuilder::new()
//!     .root("/src/tribler")
//!     .log_level("info")
//!     .build()?;
//!
//! let image = Pipeline::new(settings, SystemRunner).run().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Code Signing
//!
//! Signing and notarization run only when both `CODE_SIGN_ENABLED` and
//! `APPLE_DEV_ID` are set; see [`SettingsBuilder::code_sign_enabled`].

pub mod builder;
pub mod error;
pub mod platform;
pub mod process;
pub mod settings;
pub mod utils;

// Public re-exports
pub use builder::{Pipeline, RunReport, Step};
pub use error::{Error, Result};
pub use process::{CommandOutput, CommandRunner, SystemRunner, ToolCommand};
pub use settings::{
    BundleSettings, DmgSettings, MacOsSettings, PackageSettings, Settings, SettingsBuilder,
    SigningSettings,
};
