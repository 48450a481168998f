//! Core Settings struct and implementations.

use super::{PackageSettings, Platform, PlatformSelection, RuntimeSettings, SigningSettings};
use std::path::{Path, PathBuf};

/// Main settings for a bundling run.
///
/// Constructed once at startup via [`SettingsBuilder`](super::SettingsBuilder)
/// and passed explicitly to every stage. No stage reads environment variables
/// or the working directory on its own.
///
/// # Layout
///
/// ```text
/// <cache_dir>/<archive filename>          downloaded runtime archive
/// <build_dir>/python-<token>/             extracted runtime
/// <build_dir>/venv-<token>/               provisioned environment
/// <bundle_dir>[/<token>]/                 final bundle
/// ```
#[derive(Clone, Debug)]
pub struct Settings {
    /// Platforms this run targets.
    selection: PlatformSelection,

    /// Working area for extraction and environment directories.
    build_dir: PathBuf,

    /// Final bundle location.
    ///
    /// When several platforms are selected each bundle lands in a
    /// subdirectory named after its token.
    bundle_dir: PathBuf,

    /// Where runtime archives are cached between runs.
    cache_dir: PathBuf,

    /// Runtime release to fetch.
    runtime: RuntimeSettings,

    /// Target application.
    package: PackageSettings,

    /// Code signing.
    signing: SigningSettings,
}

impl Settings {
    /// Returns the platform selection.
    pub fn selection(&self) -> &PlatformSelection {
        &self.selection
    }

    /// Returns the build working area.
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Returns the download cache directory.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the runtime settings.
    pub fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    /// Returns the target package settings.
    pub fn package(&self) -> &PackageSettings {
        &self.package
    }

    /// Returns the signing settings.
    pub fn signing(&self) -> &SigningSettings {
        &self.signing
    }

    /// Extraction directory for a platform's runtime.
    pub fn extract_dir(&self, platform: Platform) -> PathBuf {
        self.build_dir.join(format!("python-{}", platform.token()))
    }

    /// Environment directory for a platform.
    pub fn env_dir(&self, platform: Platform) -> PathBuf {
        self.build_dir.join(format!("venv-{}", platform.token()))
    }

    /// Bundle directory for a platform.
    pub fn bundle_dir(&self, platform: Platform) -> PathBuf {
        if self.selection.is_multi() {
            self.bundle_dir.join(platform.token())
        } else {
            self.bundle_dir.clone()
        }
    }

    /// Cache path for an archive filename.
    pub fn cache_path(&self, filename: &str) -> PathBuf {
        self.cache_dir.join(filename)
    }

    /// Creates a new Settings instance (used by SettingsBuilder).
    pub(super) fn new(
        selection: PlatformSelection,
        build_dir: PathBuf,
        bundle_dir: PathBuf,
        cache_dir: PathBuf,
        runtime: RuntimeSettings,
        package: PackageSettings,
        signing: SigningSettings,
    ) -> Self {
        Self {
            selection,
            build_dir,
            bundle_dir,
            cache_dir,
            runtime,
            package,
            signing,
        }
    }
}
