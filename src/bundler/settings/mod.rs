//! Configuration structures for bundling operations.
//!
//! This module provides the platform table, runtime release settings, target
//! package settings, signing settings and the builder that folds command line
//! values and an optional config file into one [`Settings`] value.

mod arch;
mod builder;
mod core;
mod file;
mod macos;
mod package;
mod platform;
mod runtime;

// Re-export all public types
pub use arch::{Arch, OsFamily};
pub use builder::SettingsBuilder;
pub use self::core::Settings;
pub use file::{ConfigFile, DEFAULT_CONFIG_FILE};
pub use macos::{SIGNING_IDENTITY_ENV, SigningSettings};
pub use package::{DEFAULT_PACKAGE, PackageSettings};
pub use platform::{ALL_TOKEN, Platform, PlatformDescriptor, PlatformSelection, valid_tokens};
pub use runtime::{
    DEFAULT_BASE_URL, DEFAULT_RUNTIME_RELEASE, DEFAULT_RUNTIME_VERSION, RuntimeSettings,
};
