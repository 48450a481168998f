//! Target application package settings.

use std::path::PathBuf;

/// Default target application.
pub const DEFAULT_PACKAGE: &str = "esphome";

/// The application installed into the provisioned environment.
///
/// The package is always installed at its latest version; there is no pin.
///
/// # Examples
///
/// ```no_run
/// use runtime_bundler::bundler::PackageSettings;
///
/// let settings = PackageSettings::for_package("esphome");
/// assert_eq!(settings.module, "esphome");
/// assert_eq!(settings.verify_args, vec!["version".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct PackageSettings {
    /// Distribution name passed to the installer.
    pub name: String,

    /// Importable module run with `-m` for verification.
    ///
    /// Default: `name` with `-` replaced by `_`
    pub module: String,

    /// Arguments passed to the module to prove it runs.
    ///
    /// Default: `["version"]`
    pub verify_args: Vec<String>,

    /// Local wheel directory for offline installs.
    ///
    /// When set, installation uses `--no-index --find-links <dir>`.
    ///
    /// Default: None (install from the package index)
    pub wheels_dir: Option<PathBuf>,
}

impl PackageSettings {
    /// Settings for a package name with default module and verification.
    pub fn for_package(name: &str) -> Self {
        Self {
            name: name.to_string(),
            module: default_module(name),
            verify_args: vec!["version".to_string()],
            wheels_dir: None,
        }
    }
}

impl Default for PackageSettings {
    fn default() -> Self {
        Self::for_package(DEFAULT_PACKAGE)
    }
}

/// Module name derived from a distribution name.
pub fn default_module(name: &str) -> String {
    name.replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_replaces_dashes() {
        assert_eq!(default_module("my-tool"), "my_tool");
        assert_eq!(PackageSettings::for_package("esphome").module, "esphome");
    }
}
