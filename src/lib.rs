//! Relocatable runtime bundler.
//!
//! Packages a relocatable Python runtime and an application into a
//! self-contained, platform-specific directory and code-signs its native
//! binaries for distribution.
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
