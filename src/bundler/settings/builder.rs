//! Builder for constructing Settings.

use super::{BundleSettings, Settings, SigningSettings};
use crate::bundler::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Log levels accepted by PyInstaller's `--log-level`.
pub const LOG_LEVELS: &[&str] = &[
    "TRACE",
    "DEBUG",
    "INFO",
    "WARN",
    "DEPRECATION",
    "ERROR",
    "FATAL",
];

/// Default PyInstaller log level: the most verbose one that is not trace.
pub const DEFAULT_LOG_LEVEL: &str = "DEBUG";

/// Default build environment directory name.
pub const DEFAULT_BUILD_ENV: &str = "venv";

/// Default notarytool credential profile.
pub const DEFAULT_KEYCHAIN_PROFILE: &str = "tribler-codesign-profile";

/// Builder for constructing [`Settings`].
///
/// Collects the raw configuration surface (environment variables, flags and
/// the optional configuration file) and validates it once in [`build`].
///
/// # Examples
///
/// ```no_run
/// use tribler_dmg_bundler::bundler::SettingsBuilder;
///
/// # fn example() -> tribler_dmg_bundler::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .root("/path/to/tribler")
///     .log_level("info")
///     .code_sign_enabled(Some("1".into()))
///     .apple_dev_id(Some("Developer ID Application: Tribler (ABC123)".into()))
///     .build()?;
///
/// assert!(settings.signing().is_some());
/// # Ok(())
/// # }
/// ```
///
/// [`build`]: SettingsBuilder::build
#[derive(Debug)]
pub struct SettingsBuilder {
    root: Option<PathBuf>,
    bundle_settings: BundleSettings,
    log_level: String,
    build_env: String,
    code_sign_enabled: Option<String>,
    apple_dev_id: Option<String>,
    keychain_profile: String,
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self {
            root: None,
            bundle_settings: BundleSettings::default(),
            log_level: DEFAULT_LOG_LEVEL.into(),
            build_env: DEFAULT_BUILD_ENV.into(),
            code_sign_enabled: None,
            apple_dev_id: None,
            keychain_profile: DEFAULT_KEYCHAIN_PROFILE.into(),
        }
    }
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the working tree root.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn root<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the configuration file contents.
    ///
    /// Default: [`BundleSettings::default`]
    pub fn bundle_settings(mut self, settings: BundleSettings) -> Self {
        self.bundle_settings = settings;
        self
    }

    /// Sets the freezing tool log level (`LOG_LEVEL`).
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Sets the build environment directory name (`BUILD_ENV`).
    pub fn build_env(mut self, name: impl Into<String>) -> Self {
        self.build_env = name.into();
        self
    }

    /// Sets the signing switch (`CODE_SIGN_ENABLED`). Any non-empty value enables it.
    pub fn code_sign_enabled(mut self, value: Option<String>) -> Self {
        self.code_sign_enabled = value;
        self
    }

    /// Sets the signing identity (`APPLE_DEV_ID`).
    pub fn apple_dev_id(mut self, identity: Option<String>) -> Self {
        self.apple_dev_id = identity;
        self
    }

    /// Sets the notarytool credential profile (`KEYCHAIN_PROFILE`).
    pub fn keychain_profile(mut self, profile: impl Into<String>) -> Self {
        self.keychain_profile = profile.into();
        self
    }

    /// Validates everything and builds the settings.
    ///
    /// Reads the version marker as part of building, so the output name is
    /// fixed before any step runs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for an unknown log level, an unusable
    /// environment name or product name, an output directory that would
    /// wipe build inputs, inverted window bounds, an empty credential profile
    /// while signing is active, or a version marker that cannot be part of a
    /// file name.
    pub fn build(self) -> Result<Settings> {
        use crate::bundler::error::Context;

        let root = self.root.context("root is required")?;

        let log_level = normalize_log_level(&self.log_level)?;
        validate_dir_name("build environment name", &self.build_env)?;
        validate_dir_name("product name", &self.bundle_settings.package.product_name)?;
        validate_output_dir(&root, &self.build_env, &self.bundle_settings)?;

        let [left, top, right, bottom] = self.bundle_settings.dmg.window_bounds;
        if right <= left || bottom <= top {
            return Err(Error::InvalidConfig(format!(
                "window bounds {:?} must be [left, top, right, bottom] with right > left and bottom > top",
                self.bundle_settings.dmg.window_bounds
            )));
        }

        let signing = match signing_identity(
            self.code_sign_enabled.as_deref(),
            self.apple_dev_id.as_deref(),
        ) {
            Some(identity) => {
                let keychain_profile = self.keychain_profile.trim();
                if keychain_profile.is_empty() {
                    return Err(Error::InvalidConfig(
                        "keychain profile must not be empty when code signing is enabled".into(),
                    ));
                }
                Some(SigningSettings {
                    identity,
                    keychain_profile: keychain_profile.to_string(),
                    entitlements: self
                        .bundle_settings
                        .macos
                        .entitlements
                        .as_ref()
                        .map(|p| root.join(p)),
                })
            }
            None => {
                if is_set(self.code_sign_enabled.as_deref()) {
                    log::warn!("CODE_SIGN_ENABLED is set but APPLE_DEV_ID is not; skipping code signing");
                }
                None
            }
        };

        let marker = root.join(&self.bundle_settings.package.version_marker);
        let version = crate::metadata::read_version_marker(&marker)?;
        if let Some(v) = &version {
            validate_version(v)?;
        }
        match &version {
            Some(v) => log::info!("Version marker {} holds {}", marker.display(), v),
            None => log::debug!("No version marker at {}", marker.display()),
        }

        Ok(Settings::new(
            root,
            self.bundle_settings,
            log_level,
            self.build_env,
            version,
            signing,
        ))
    }
}

fn is_set(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Returns the identity when both the signing switch and the identity are set.
fn signing_identity(enabled: Option<&str>, identity: Option<&str>) -> Option<String> {
    if !is_set(enabled) {
        return None;
    }
    identity
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
}

fn normalize_log_level(level: &str) -> Result<String> {
    let upper = level.trim().to_ascii_uppercase();
    if LOG_LEVELS.contains(&upper.as_str()) {
        Ok(upper)
    } else {
        Err(Error::InvalidConfig(format!(
            "unknown log level '{}'. Valid levels: {}",
            level,
            LOG_LEVELS.join(", ")
        )))
    }
}

fn validate_dir_name(what: &str, name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(Error::InvalidConfig(format!(
            "{what} '{name}' must be a plain directory name"
        )));
    }
    Ok(())
}

/// The output directory is wiped before every build, so it must be a
/// subdirectory of the root that holds no build input and is neither the
/// build environment nor inside it.
fn validate_output_dir(root: &Path, build_env: &str, bundle: &BundleSettings) -> Result<()> {
    let configured = &bundle.package.output_dir;
    let invalid = |reason: &str| {
        Err(Error::InvalidConfig(format!(
            "output directory '{}' {reason}",
            configured.display()
        )))
    };

    let mut relative = PathBuf::new();
    for component in configured.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir => return invalid("must not contain '..'"),
            Component::RootDir | Component::Prefix(_) => {
                return invalid("must be relative to the working tree root");
            }
        }
    }
    if relative.as_os_str().is_empty() {
        return invalid("must name a subdirectory of the working tree root");
    }
    if relative.starts_with(build_env) {
        return invalid("overlaps the build environment");
    }

    let output_dir = root.join(&relative);
    let inputs = [
        &bundle.package.build_spec,
        &bundle.package.requirements,
        &bundle.package.version_marker,
        &bundle.dmg.background,
        &bundle.dmg.volume_icon,
    ]
    .into_iter()
    .chain(bundle.macos.entitlements.as_ref());

    for input in inputs {
        if root.join(input).starts_with(&output_dir) {
            return invalid(&format!("contains build input {}", input.display()));
        }
    }

    Ok(())
}

/// The version ends up in the output file name.
fn validate_version(version: &str) -> Result<()> {
    if version.contains(['/', '\\'])
        || version.contains("..")
        || version.chars().any(char::is_control)
    {
        return Err(Error::InvalidConfig(format!(
            "version marker value {version:?} cannot be used in a file name"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(root: &Path) -> SettingsBuilder {
        SettingsBuilder::new().root(root)
    }

    #[test]
    fn test_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = builder(tmp.path()).build().unwrap();
        assert_eq!(settings.log_level(), "DEBUG");
        assert_eq!(settings.build_env_name(), "venv");
        assert!(settings.signing().is_none());
        assert!(settings.version().is_none());
    }

    #[test]
    fn test_log_level_is_normalized() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = builder(tmp.path()).log_level(" warn ").build().unwrap();
        assert_eq!(settings.log_level(), "WARN");
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let err = builder(tmp.path()).log_level("VERBOSE").build().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_build_env_must_be_plain_name() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(builder(tmp.path()).build_env("../venv").build().is_err());
        assert!(builder(tmp.path()).build_env("").build().is_err());
        assert!(builder(tmp.path()).build_env("build-env").build().is_ok());
    }

    #[test]
    fn test_signing_requires_both_flag_and_identity() {
        let tmp = tempfile::tempdir().unwrap();

        let only_flag = builder(tmp.path())
            .code_sign_enabled(Some("yes".into()))
            .build()
            .unwrap();
        assert!(only_flag.signing().is_none());

        let only_identity = builder(tmp.path())
            .apple_dev_id(Some("Developer ID".into()))
            .build()
            .unwrap();
        assert!(only_identity.signing().is_none());

        let empty_flag = builder(tmp.path())
            .code_sign_enabled(Some("  ".into()))
            .apple_dev_id(Some("Developer ID".into()))
            .build()
            .unwrap();
        assert!(empty_flag.signing().is_none());

        let both = builder(tmp.path())
            .code_sign_enabled(Some("1".into()))
            .apple_dev_id(Some("Developer ID".into()))
            .build()
            .unwrap();
        let signing = both.signing().unwrap();
        assert_eq!(signing.identity, "Developer ID");
        assert_eq!(signing.keychain_profile, DEFAULT_KEYCHAIN_PROFILE);
    }

    #[test]
    fn test_empty_keychain_profile_rejected_when_signing() {
        let tmp = tempfile::tempdir().unwrap();
        let err = builder(tmp.path())
            .code_sign_enabled(Some("1".into()))
            .apple_dev_id(Some("Developer ID".into()))
            .keychain_profile("")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_version_marker_is_read_at_build() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(".TriblerVersion"), "7.14.0\n").unwrap();
        let settings = builder(tmp.path()).build().unwrap();
        assert_eq!(settings.version(), Some("7.14.0"));
        assert!(settings.final_image_path().ends_with("Tribler-7.14.0.dmg"));
    }

    #[test]
    fn test_output_dir_must_not_cover_inputs_or_environment() {
        let tmp = tempfile::tempdir().unwrap();
        for output_dir in [".", "..", "/", "", "venv", "venv/dist", "build", "./", "dist/../.."] {
            let mut bundle = BundleSettings::default();
            bundle.package.output_dir = PathBuf::from(output_dir);
            let err = builder(tmp.path()).bundle_settings(bundle).build().unwrap_err();
            assert!(
                matches!(err, Error::InvalidConfig(_)),
                "output_dir {output_dir:?} was accepted"
            );
        }

        let mut bundle = BundleSettings::default();
        bundle.package.output_dir = PathBuf::from("out/release");
        assert!(builder(tmp.path()).bundle_settings(bundle).build().is_ok());
    }

    #[test]
    fn test_output_dir_follows_build_env_name() {
        let tmp = tempfile::tempdir().unwrap();
        let mut bundle = BundleSettings::default();
        bundle.package.output_dir = PathBuf::from("buildenv");
        assert!(
            builder(tmp.path())
                .bundle_settings(bundle.clone())
                .build_env("buildenv")
                .build()
                .is_err()
        );
        assert!(builder(tmp.path()).bundle_settings(bundle).build().is_ok());
    }

    #[test]
    fn test_version_unusable_in_file_name_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        for marker in ["8.0/rc1", "..", "7.14\\0", "7.14\t0"] {
            std::fs::write(tmp.path().join(".TriblerVersion"), marker).unwrap();
            let err = builder(tmp.path()).build().unwrap_err();
            assert!(
                matches!(err, Error::InvalidConfig(_)),
                "marker {marker:?} was accepted"
            );
        }

        std::fs::write(tmp.path().join(".TriblerVersion"), "8.0.0-rc1").unwrap();
        assert_eq!(builder(tmp.path()).build().unwrap().version(), Some("8.0.0-rc1"));
    }

    #[test]
    fn test_inverted_window_bounds_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let mut bundle = BundleSettings::default();
        bundle.dmg.window_bounds = [500, 100, 400, 800];
        assert!(builder(tmp.path()).bundle_settings(bundle).build().is_err());
    }
}
