//! Runtime bundling pipeline.
//!
//! Packages a relocatable interpreter runtime together with an application
//! into a self-contained directory, then optionally code-signs it.
//!
//! # Stages
//!
//! 1. [`runtime`] - download (with caching) and extract the runtime
//! 2. [`environment`] - create an isolated environment and install the application
//! 3. [`assemble`] - merge the environment and runtime libraries into the bundle
//! 4. [`platform::macos`] - sign shared libraries, then native executables
//!
//! [`Bundler`] runs the stages in order for each selected platform.

pub mod assemble;
pub mod builder;
pub mod environment;
pub mod error;
pub mod platform;
pub mod runtime;
pub mod settings;
pub mod utils;

#[cfg(test)]
mod testing;

pub use assemble::Bundle;
pub use builder::{Bundler, PlatformReport, SigningOutcome};
pub use error::{Error, Result};
pub use settings::{
    PackageSettings, Platform, PlatformDescriptor, PlatformSelection, Settings, SettingsBuilder,
};
