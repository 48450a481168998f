//! Command line argument parsing and validation.

use crate::bundler::settings::{
    DEFAULT_CONFIG_FILE, DEFAULT_RUNTIME_RELEASE, DEFAULT_RUNTIME_VERSION, SIGNING_IDENTITY_ENV,
};
use crate::error::CliError;
use clap::Parser;
use std::path::PathBuf;

/// Relocatable runtime bundler
#[derive(Parser, Debug)]
#[command(
    name = "bundle_runtime",
    version,
    about = "Bundles a relocatable Python runtime and an application into a self-contained directory",
    long_about = "Downloads a relocatable Python build for the target platform, installs the \
application into an isolated environment, assembles the result into a bundle directory \
and, when a signing identity is available, code-signs every native binary in it.

Platforms: macos-arm64, macos-x64, linux-x64, windows-x64, or `all`.
Without a platform the host platform is used.

Usage:
  bundle_runtime
  bundle_runtime macos-arm64
  bundle_runtime --platform all --package esphome
  APPLE_SIGNING_IDENTITY=\"Developer ID Application: ...\" bundle_runtime --sign-only macos-arm64

Exit code 0 = bundle built (and signed, if an identity was supplied)."
)]
pub struct Args {
    /// Platform token (or `all`); detected from the host when omitted
    #[arg(value_name = "PLATFORM")]
    pub platform_arg: Option<String>,

    /// Platform token, as an alternative to the positional argument
    #[arg(short, long = "platform", value_name = "PLATFORM")]
    pub platform_flag: Option<String>,

    /// Project root; relative paths resolve against it
    #[arg(long, value_name = "DIR")]
    pub project_root: Option<PathBuf>,

    #[arg(
        short,
        long,
        value_name = "FILE",
        help = format!("Config file (default: <project-root>/{DEFAULT_CONFIG_FILE} when present)"),
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "RUNTIME_VERSION",
        value_name = "VERSION",
        help = format!("Runtime version [default: {DEFAULT_RUNTIME_VERSION}]"),
    )]
    pub runtime_version: Option<String>,

    #[arg(
        long,
        env = "RUNTIME_RELEASE",
        value_name = "TAG",
        help = format!("Runtime release tag [default: {DEFAULT_RUNTIME_RELEASE}]"),
    )]
    pub runtime_release: Option<String>,

    /// Application package to install
    #[arg(long, value_name = "NAME")]
    pub package: Option<String>,

    /// Build working area for extraction and environment directories
    #[arg(long, value_name = "DIR")]
    pub build_dir: Option<PathBuf>,

    /// Output bundle directory
    #[arg(long, value_name = "DIR")]
    pub bundle_dir: Option<PathBuf>,

    /// Download cache directory
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Install the application from local wheels only
    #[arg(long, value_name = "DIR")]
    pub wheels_dir: Option<PathBuf>,

    /// Entitlements plist for code signing
    #[arg(long, value_name = "FILE")]
    pub entitlements: Option<PathBuf>,

    #[arg(
        long,
        help = format!("Only sign an existing bundle (identity from {SIGNING_IDENTITY_ENV})"),
    )]
    pub sign_only: bool,

    /// Show detailed output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), CliError> {
        if let (Some(arg), Some(flag)) = (&self.platform_arg, &self.platform_flag) {
            if arg != flag {
                return Err(CliError::ConflictingArguments {
                    arguments: vec![format!("PLATFORM={arg}"), format!("--platform={flag}")],
                });
            }
        }
        if self.package.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(CliError::InvalidArguments {
                reason: "--package cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    /// The requested platform token, if any.
    pub fn platform(&self) -> Option<&str> {
        self.platform_arg
            .as_deref()
            .or(self.platform_flag.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn positional_or_flag_platform() {
        let args = Args::parse_from(["bundle_runtime", "linux-x64"]);
        assert_eq!(args.platform(), Some("linux-x64"));

        let args = Args::parse_from(["bundle_runtime", "--platform", "all"]);
        assert_eq!(args.platform(), Some("all"));

        let args = Args::parse_from(["bundle_runtime"]);
        assert_eq!(args.platform(), None);
    }

    #[test]
    fn conflicting_platforms_are_rejected() {
        let args = Args::parse_from(["bundle_runtime", "linux-x64", "--platform", "macos-x64"]);
        assert!(matches!(
            args.validate(),
            Err(CliError::ConflictingArguments { .. })
        ));
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Args::try_parse_from(["bundle_runtime", "-v", "-q"]).is_err());
    }
}
