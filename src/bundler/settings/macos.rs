//! macOS disk image and code signing settings.

use std::path::PathBuf;
use std::time::Duration;

/// Default pause after mounting the image and after each Finder scripting
/// action.
///
/// Finder applies window changes asynchronously and exposes no readiness
/// signal, so this is a heuristic delay rather than a protocol wait.
pub const WINDOW_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// macOS DMG disk image configuration.
///
/// Configures the staging resources and the Finder window layout of the
/// installer image.
///
/// # Configuration
///
/// ```toml
/// [dmg]
/// background = "build/mac/resources/background.png"
/// window_bounds = [100, 100, 1100, 850]
/// icon_size = 128
/// ```
///
/// # See Also
///
/// - [`MacOsSettings`] - code signing configuration
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DmgSettings {
    /// Background image shown in the installer window.
    ///
    /// Copied to `.background/` inside the image.
    pub background: PathBuf,

    /// Volume icon, copied to `.VolumeIcon.icns` inside the image.
    pub volume_icon: PathBuf,

    /// Finder window bounds `[left, top, right, bottom]`.
    ///
    /// Deliberately large: a small window makes Finder re-arrange the icons.
    pub window_bounds: [u32; 4],

    /// Icon size in points.
    pub icon_size: u32,

    /// Position of the application bundle icon.
    pub app_position: (u32, u32),

    /// Position of the `Applications` shortcut icon.
    pub applications_position: (u32, u32),

    /// Settle delay in milliseconds. See [`WINDOW_SETTLE_DELAY`].
    pub settle_delay_ms: u64,
}

impl Default for DmgSettings {
    fn default() -> Self {
        Self {
            background: PathBuf::from("build/mac/resources/background.png"),
            volume_icon: PathBuf::from("build/mac/resources/tribler.icns"),
            window_bounds: [100, 100, 1100, 850],
            icon_size: 128,
            app_position: (250, 330),
            applications_position: (750, 330),
            settle_delay_ms: WINDOW_SETTLE_DELAY.as_millis() as u64,
        }
    }
}

impl DmgSettings {
    /// Settle delay as a [`Duration`].
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Code signing options that come from the configuration file.
///
/// The identity itself is never read from the file; it comes from
/// `APPLE_DEV_ID` so that it stays out of the repository.
///
/// ```toml
/// [macos]
/// entitlements = "build/mac/entitlements.plist"
/// ```
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MacOsSettings {
    /// Path to entitlements.plist applied when signing the app bundle.
    ///
    /// Default: None
    pub entitlements: Option<PathBuf>,
}

/// Active signing configuration.
///
/// Only exists when signing was enabled and an identity was provided.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SigningSettings {
    /// Developer ID signing identity.
    pub identity: String,

    /// Stored notarytool credential profile name.
    pub keychain_profile: String,

    /// Entitlements applied to the app bundle, resolved against the root.
    pub entitlements: Option<PathBuf>,
}
