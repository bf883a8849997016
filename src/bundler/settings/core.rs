//! Core Settings struct: the build context passed to every pipeline step.

use super::{BundleSettings, DmgSettings, PackageSettings, SigningSettings};
use std::path::{Path, PathBuf};

/// Name of the staging directory inside the output directory.
const STAGING_DIR: &str = "installdir";

/// Name of the scratch directory holding the writable image and mount point.
const TEMP_DIR: &str = "temp";

/// Output file name of the final image.
///
/// `<product>.dmg` without a version, `<product>-<version>.dmg` with one.
///
/// # Examples
///
/// ```
/// use tribler_dmg_bundler::bundler::settings::image_file_name;
///
/// assert_eq!(image_file_name("Tribler", None), "Tribler.dmg");
/// assert_eq!(image_file_name("Tribler", Some("7.14.0")), "Tribler-7.14.0.dmg");
/// ```
pub fn image_file_name(product_name: &str, version: Option<&str>) -> String {
    match version {
        Some(version) => format!("{product_name}-{version}.dmg"),
        None => format!("{product_name}.dmg"),
    }
}

/// Immutable build context.
///
/// Constructed once at startup via [`SettingsBuilder`](super::SettingsBuilder)
/// after every environment variable and configuration value has been
/// validated. Steps never consult the process environment or the current
/// directory; every path they touch is derived from here.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Working tree root.
    root: PathBuf,

    /// Configuration file contents (or defaults).
    bundle_settings: BundleSettings,

    /// PyInstaller log level, upper case.
    log_level: String,

    /// Directory name of the isolated build environment.
    build_env: String,

    /// Version read from the version marker at startup.
    version: Option<String>,

    /// Present only when signing is enabled and an identity is configured.
    signing: Option<SigningSettings>,
}

impl Settings {
    /// Returns the working tree root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the product name.
    pub fn product_name(&self) -> &str {
        &self.bundle_settings.package.product_name
    }

    /// Returns the `.app` bundle directory name, e.g. `Tribler.app`.
    pub fn app_bundle_name(&self) -> String {
        format!("{}.app", self.product_name())
    }

    /// Returns the PyInstaller log level.
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Returns the build environment directory name.
    pub fn build_env_name(&self) -> &str {
        &self.build_env
    }

    /// Returns the version read from the version marker, if any.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Returns the signing configuration when signing is active.
    pub fn signing(&self) -> Option<&SigningSettings> {
        self.signing.as_ref()
    }

    pub fn package(&self) -> &PackageSettings {
        &self.bundle_settings.package
    }

    pub fn dmg(&self) -> &DmgSettings {
        &self.bundle_settings.dmg
    }

    /// Resolves a configured path against the working tree root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    /// Isolated build environment directory.
    pub fn env_dir(&self) -> PathBuf {
        self.root.join(&self.build_env)
    }

    /// Interpreter inside the build environment.
    pub fn env_python(&self) -> PathBuf {
        self.env_dir().join("bin").join("python")
    }

    pub fn requirements_path(&self) -> PathBuf {
        self.resolve(&self.package().requirements)
    }

    pub fn build_spec_path(&self) -> PathBuf {
        self.resolve(&self.package().build_spec)
    }

    pub fn version_marker_path(&self) -> PathBuf {
        self.resolve(&self.package().version_marker)
    }

    pub fn background_path(&self) -> PathBuf {
        self.resolve(&self.dmg().background)
    }

    pub fn volume_icon_path(&self) -> PathBuf {
        self.resolve(&self.dmg().volume_icon)
    }

    /// Output directory, wiped before every build.
    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.package().output_dir)
    }

    /// Scratch directory for PyInstaller.
    pub fn work_dir(&self) -> PathBuf {
        self.root.join("build").join("pyinstaller")
    }

    /// Where the freezing tool leaves the application bundle.
    pub fn built_app_path(&self) -> PathBuf {
        self.output_dir().join(self.app_bundle_name())
    }

    /// Install-staging directory that becomes the image contents.
    pub fn staging_dir(&self) -> PathBuf {
        self.output_dir().join(STAGING_DIR)
    }

    /// Application bundle inside the staging directory.
    pub fn staged_app_path(&self) -> PathBuf {
        self.staging_dir().join(self.app_bundle_name())
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.output_dir().join(TEMP_DIR)
    }

    /// Fixed mount point of the writable image.
    pub fn mount_point(&self) -> PathBuf {
        self.temp_dir().join("mnt")
    }

    /// Intermediate read-write image.
    pub fn writable_image_path(&self) -> PathBuf {
        self.temp_dir()
            .join(format!("{}-rw.dmg", self.product_name()))
    }

    /// Compressed image before the optional version rename.
    pub fn default_image_path(&self) -> PathBuf {
        self.output_dir()
            .join(image_file_name(self.product_name(), None))
    }

    /// Final artifact path.
    pub fn final_image_path(&self) -> PathBuf {
        self.output_dir()
            .join(image_file_name(self.product_name(), self.version()))
    }

    /// Creates a new Settings instance (used by SettingsBuilder).
    pub(super) fn new(
        root: PathBuf,
        bundle_settings: BundleSettings,
        log_level: String,
        build_env: String,
        version: Option<String>,
        signing: Option<SigningSettings>,
    ) -> Self {
        Self {
            root,
            bundle_settings,
            log_level,
            build_env,
            version,
            signing,
        }
    }
}
