//! Optional TOML configuration file.
//!
//! Every field is optional; anything left out falls back to the command line
//! or the built-in defaults.

use crate::bundler::error::{Error, ErrorExt, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Conventional config file name looked up in the project root.
pub const DEFAULT_CONFIG_FILE: &str = "bundle.toml";

/// Parsed contents of a bundle config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// `[runtime]` table
    #[serde(default)]
    pub runtime: RuntimeSection,
    /// `[package]` table
    #[serde(default)]
    pub package: PackageSection,
    /// `[paths]` table
    #[serde(default)]
    pub paths: PathsSection,
    /// `[signing]` table
    #[serde(default)]
    pub signing: SigningSection,
}

/// `[runtime]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeSection {
    pub version: Option<String>,
    pub release: Option<String>,
    pub base_url: Option<String>,
    #[serde(default)]
    pub sha256: HashMap<String, String>,
}

/// `[package]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageSection {
    pub name: Option<String>,
    pub module: Option<String>,
    pub verify_args: Option<Vec<String>>,
    pub wheels_dir: Option<PathBuf>,
}

/// `[paths]` table. Relative paths resolve against the project root.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsSection {
    pub build_dir: Option<PathBuf>,
    pub bundle_dir: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
}

/// `[signing]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SigningSection {
    pub entitlements: Option<PathBuf>,
}

impl ConfigFile {
    /// Reads and parses a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).fs_context("reading config file", path)?;
        Self::parse(&contents)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parses config file contents.
    pub fn parse(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Loads `path` if given, otherwise `bundle.toml` under `project_root`
    /// when it exists.
    pub fn discover(path: Option<&Path>, project_root: &Path) -> Result<Option<Self>> {
        if let Some(path) = path {
            return Self::load(path).map(Some);
        }
        let default = project_root.join(DEFAULT_CONFIG_FILE);
        if default.is_file() {
            log::debug!("Using config file {}", default.display());
            return Self::load(&default).map(Some);
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_sections() {
        let cfg = ConfigFile::parse(
            r#"
            [runtime]
            version = "3.11.11"
            release = "20250115"

            [runtime.sha256]
            linux-x64 = "abc123"

            [package]
            name = "my-tool"
            verify_args = ["--version"]

            [paths]
            bundle_dir = "out/python"

            [signing]
            entitlements = "ent.plist"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.runtime.version.as_deref(), Some("3.11.11"));
        assert_eq!(cfg.runtime.sha256.get("linux-x64").map(String::as_str), Some("abc123"));
        assert_eq!(cfg.package.name.as_deref(), Some("my-tool"));
        assert_eq!(cfg.paths.bundle_dir, Some(PathBuf::from("out/python")));
        assert_eq!(cfg.signing.entitlements, Some(PathBuf::from("ent.plist")));
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let cfg = ConfigFile::parse("").unwrap();
        assert!(cfg.runtime.version.is_none());
        assert!(cfg.package.name.is_none());
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(ConfigFile::parse("[runtime]\nchecksum = \"x\"\n").is_err());
    }

    #[test]
    fn discover_without_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ConfigFile::discover(None, dir.path()).unwrap().is_none());
    }
}
