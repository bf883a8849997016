//! macOS release steps: from source tree to distributable disk image.
//!
//! # Steps
//!
//! | Step | Module | Tools |
//! |------|--------|-------|
//! | Build environment | [`environment`] | `python3 -m venv`, `pip` |
//! | App bundle | [`freeze`] | PyInstaller |
//! | Installer staging | [`staging`] | filesystem only |
//! | Disk image | [`dmg`] | `hdiutil`, `bless`, `osascript`, `SetFile` |
//! | Signing | [`sign`] | `codesign`, `spctl`, `xcrun notarytool`, `xcrun stapler` |
//!
//! # Output Location
//!
//! Everything lands in `<root>/dist/`:
//! - `dist/Tribler.app` - frozen bundle (moved into staging afterwards)
//! - `dist/installdir/` - image contents
//! - `dist/Tribler-<version>.dmg` - final image

pub mod dmg;
pub mod environment;
pub mod freeze;
pub mod sign;
pub mod staging;

pub use environment::prepare_environment;
pub use freeze::build_bundle;
pub use staging::stage_installer;
