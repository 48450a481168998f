//! Builder for constructing Settings.

use super::{
    ConfigFile, PackageSettings, PlatformSelection, RuntimeSettings, Settings, SigningSettings,
    package::default_module,
};
use crate::bundler::error::{Context, Error, Result};
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};

/// Builder for constructing [`Settings`].
///
/// Values set directly on the builder win over values from a
/// [`ConfigFile`], which win over built-in defaults.
///
/// # Examples
///
/// ```no_run
/// use runtime_bundler::bundler::{Platform, PlatformSelection, SettingsBuilder};
///
/// # fn example() -> runtime_bundler::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .selection(PlatformSelection::One(Platform::MacOsArm64))
///     .project_root(".")
///     .package_name("esphome")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
    selection: Option<PlatformSelection>,
    project_root: Option<PathBuf>,
    config: Option<ConfigFile>,
    build_dir: Option<PathBuf>,
    bundle_dir: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    runtime_version: Option<String>,
    runtime_release: Option<String>,
    base_url: Option<String>,
    package_name: Option<String>,
    wheels_dir: Option<PathBuf>,
    entitlements: Option<PathBuf>,
    signing_identity: Option<String>,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the platforms to build.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn selection(mut self, selection: PlatformSelection) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Sets the project root.
    ///
    /// Default: current directory
    pub fn project_root<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.project_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Layers a parsed config file under the explicit values.
    pub fn config_file(mut self, config: ConfigFile) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the build working area.
    ///
    /// Default: `<project_root>/build`
    pub fn build_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.build_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the final bundle directory.
    ///
    /// Default: `<project_root>/resources/python`
    pub fn bundle_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.bundle_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the download cache directory.
    ///
    /// Default: the OS temporary directory
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the runtime version.
    pub fn runtime_version(mut self, version: impl Into<String>) -> Self {
        self.runtime_version = Some(version.into());
        self
    }

    /// Sets the upstream release tag.
    pub fn runtime_release(mut self, release: impl Into<String>) -> Self {
        self.runtime_release = Some(release.into());
        self
    }

    /// Sets the release download root.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the target application package.
    pub fn package_name(mut self, name: impl Into<String>) -> Self {
        self.package_name = Some(name.into());
        self
    }

    /// Sets a local wheel directory for offline installs.
    pub fn wheels_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.wheels_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the entitlements plist used for signing.
    pub fn entitlements<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.entitlements = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the signing identity. `None` disables signing.
    pub fn signing_identity(mut self, identity: Option<String>) -> Self {
        self.signing_identity = identity;
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the selection is missing, the runtime version is
    /// not `MAJOR.MINOR.PATCH`, the base URL does not parse, or the package
    /// name is empty.
    pub fn build(self) -> Result<Settings> {
        let selection = self.selection.context("platform selection is required")?;

        let root = match self.project_root {
            Some(root) => root,
            None => std::env::current_dir()?,
        };
        let project_root = root.absolutize()?.into_owned();
        let resolve = |p: PathBuf| -> Result<PathBuf> {
            let joined = if p.is_absolute() { p } else { project_root.join(p) };
            Ok(joined.absolutize()?.into_owned())
        };

        let config = self.config.unwrap_or_default();

        let build_dir = resolve(
            self.build_dir
                .or(config.paths.build_dir)
                .unwrap_or_else(|| PathBuf::from("build")),
        )?;
        let bundle_dir = resolve(
            self.bundle_dir
                .or(config.paths.bundle_dir)
                .unwrap_or_else(|| PathBuf::from("resources").join("python")),
        )?;
        let cache_dir = match self.cache_dir.or(config.paths.cache_dir) {
            Some(dir) => resolve(dir)?,
            None => std::env::temp_dir(),
        };

        let defaults = RuntimeSettings::default();
        let runtime = RuntimeSettings {
            version: self
                .runtime_version
                .or(config.runtime.version)
                .unwrap_or(defaults.version),
            release: self
                .runtime_release
                .or(config.runtime.release)
                .unwrap_or(defaults.release),
            base_url: self
                .base_url
                .or(config.runtime.base_url)
                .unwrap_or(defaults.base_url),
            sha256: config.runtime.sha256,
        };
        validate_runtime(&runtime)?;

        let mut package = PackageSettings::default();
        match self.package_name {
            // The file's module and verify args describe the file's package.
            Some(name) => package = PackageSettings::for_package(&name),
            None => {
                if let Some(name) = config.package.name {
                    package = PackageSettings::for_package(&name);
                }
                if let Some(module) = config.package.module {
                    package.module = module;
                }
                if let Some(args) = config.package.verify_args {
                    package.verify_args = args;
                }
            }
        }
        package.wheels_dir = self
            .wheels_dir
            .or(config.package.wheels_dir)
            .map(resolve)
            .transpose()?;
        if package.name.trim().is_empty() {
            return Err(Error::Config("package name must not be empty".into()));
        }
        if package.module.trim().is_empty() {
            package.module = default_module(&package.name);
        }

        let signing = SigningSettings {
            identity: self.signing_identity,
            entitlements: self
                .entitlements
                .or(config.signing.entitlements)
                .map(resolve)
                .transpose()?,
        };

        Ok(Settings::new(
            selection,
            build_dir,
            bundle_dir,
            cache_dir,
            runtime,
            package,
            signing,
        ))
    }
}

fn validate_runtime(runtime: &RuntimeSettings) -> Result<()> {
    semver::Version::parse(&runtime.version).map_err(|e| {
        Error::Config(format!(
            "runtime version `{}` is not MAJOR.MINOR.PATCH: {}",
            runtime.version, e
        ))
    })?;
    if runtime.release.is_empty() || runtime.release.contains('/') {
        return Err(Error::Config(format!(
            "invalid runtime release tag `{}`",
            runtime.release
        )));
    }
    url::Url::parse(&runtime.base_url).map_err(|e| {
        Error::Config(format!("invalid base URL `{}`: {}", runtime.base_url, e))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::Platform;

    fn builder(root: &Path) -> SettingsBuilder {
        SettingsBuilder::new()
            .selection(PlatformSelection::One(Platform::LinuxX64))
            .project_root(root)
    }

    #[test]
    fn defaults_resolve_against_project_root() {
        let dir = tempfile::tempdir().unwrap();
        let settings = builder(dir.path()).build().unwrap();
        let root = dir.path().absolutize().unwrap().into_owned();

        assert_eq!(settings.build_dir(), root.join("build"));
        assert_eq!(
            settings.bundle_dir(Platform::LinuxX64),
            root.join("resources").join("python")
        );
        assert_eq!(
            settings.extract_dir(Platform::LinuxX64),
            root.join("build").join("python-linux-x64")
        );
        assert_eq!(
            settings.env_dir(Platform::LinuxX64),
            root.join("build").join("venv-linux-x64")
        );
        assert_eq!(settings.cache_dir(), std::env::temp_dir());
        assert_eq!(settings.package().name, "esphome");
        assert!(!settings.signing().is_enabled());
    }

    #[test]
    fn explicit_values_beat_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigFile::parse(
            "[runtime]\nversion = \"3.11.11\"\nrelease = \"20250115\"\n[package]\nname = \"from-file\"\n",
        )
        .unwrap();
        let settings = builder(dir.path())
            .config_file(config)
            .runtime_version("3.13.1")
            .build()
            .unwrap();

        assert_eq!(settings.runtime().version, "3.13.1");
        assert_eq!(settings.runtime().release, "20250115");
        assert_eq!(settings.package().name, "from-file");
        assert_eq!(settings.package().module, "from_file");
    }

    #[test]
    fn cli_package_ignores_file_module_and_verify_args() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigFile::parse(
            "[package]\nname = \"from-file\"\nmodule = \"file_mod\"\nverify_args = [\"--version\"]\n",
        )
        .unwrap();

        let settings = builder(dir.path())
            .config_file(config)
            .package_name("my-app")
            .build()
            .unwrap();
        assert_eq!(settings.package().name, "my-app");
        assert_eq!(settings.package().module, "my_app");
        assert_eq!(settings.package().verify_args, ["version"]);
    }

    #[test]
    fn file_package_keeps_its_module_and_verify_args() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigFile::parse(
            "[package]\nname = \"from-file\"\nmodule = \"file_mod\"\nverify_args = [\"--version\"]\n",
        )
        .unwrap();

        let settings = builder(dir.path()).config_file(config).build().unwrap();
        assert_eq!(settings.package().module, "file_mod");
        assert_eq!(settings.package().verify_args, ["--version"]);
    }

    #[test]
    fn all_selection_nests_bundles_by_token() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SettingsBuilder::new()
            .selection(PlatformSelection::All)
            .project_root(dir.path())
            .bundle_dir("out")
            .build()
            .unwrap();
        let root = dir.path().absolutize().unwrap().into_owned();
        assert_eq!(
            settings.bundle_dir(Platform::MacOsArm64),
            root.join("out").join("macos-arm64")
        );
    }

    #[test]
    fn rejects_non_semver_version() {
        let dir = tempfile::tempdir().unwrap();
        let err = builder(dir.path()).runtime_version("3.12").build().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn rejects_bad_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let err = builder(dir.path()).base_url("not a url").build().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_selection_is_an_error() {
        assert!(SettingsBuilder::new().build().is_err());
    }

    #[test]
    fn identity_enables_signing() {
        let dir = tempfile::tempdir().unwrap();
        let settings = builder(dir.path())
            .signing_identity(Some("Developer ID Application: Test".into()))
            .build()
            .unwrap();
        assert!(settings.signing().is_enabled());
    }
}
