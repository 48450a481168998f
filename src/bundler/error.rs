//! Error types for the bundling pipeline.
//!
//! Every stage reports failures through [`Error`]. The variants map one-to-one
//! onto the pipeline's failure kinds so that the CLI can print a message that
//! identifies the failing step.

use std::path::{Path, PathBuf};

/// Result type alias for bundler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by pipeline stages.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No platform token matched, either explicitly or by host detection.
    #[error("unknown platform `{token}`. Valid platforms: {valid}")]
    UnknownPlatform {
        /// The token that failed to resolve (or a host description)
        token: String,
        /// Comma-separated list of accepted tokens
        valid: String,
    },

    /// Runtime archive could not be fetched or failed its integrity check.
    #[error("failed to download {url}: {reason}")]
    DownloadFailure {
        /// Source URL
        url: String,
        /// What went wrong
        reason: String,
    },

    /// Archive was corrupt or the extracted runtime failed its version check.
    #[error("failed to extract runtime into {}: {reason}", path.display())]
    ExtractionFailure {
        /// Extraction target
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Environment creation, installer bootstrap, package install or
    /// post-install verification failed.
    #[error("provisioning failed during {step}: {reason}")]
    ProvisioningFailure {
        /// Step name
        step: &'static str,
        /// What went wrong
        reason: String,
    },

    /// Signing was requested but no bundle exists yet.
    #[error("bundle not found at {}. The bundle must be built first", path.display())]
    MissingBundle {
        /// Expected bundle location
        path: PathBuf,
    },

    /// A signing command failed for one file.
    #[error("failed to sign {}: {reason}", path.display())]
    SigningFailure {
        /// The file being signed
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Filesystem operation failed on a known path.
    #[error("{context} ({}): {source}", path.display())]
    Fs {
        /// What was being attempted
        context: String,
        /// The path involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be assembled.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// IO error without path context
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    /// Directory traversal error
    #[error("{0}")]
    Walkdir(#[from] walkdir::Error),

    /// Path prefix stripping error
    #[error("{0}")]
    StripPrefix(#[from] std::path::StripPrefixError),

    /// Catch-all with a message
    #[error("{0}")]
    GenericError(String),
}

/// Attach path context to I/O results.
pub trait ErrorExt<T> {
    /// Wraps an I/O error with a description and the path involved.
    fn fs_context(self, context: &str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|source| Error::Fs {
            context: context.to_string(),
            path: path.as_ref().to_path_buf(),
            source,
        })
    }
}

/// Convert options into [`Error::GenericError`] with a message.
pub trait Context<T> {
    /// Attach a static message.
    fn context<C: std::fmt::Display>(self, context: C) -> Result<T>;

    /// Attach a lazily built message.
    fn with_context<C: std::fmt::Display, F: FnOnce() -> C>(self, f: F) -> Result<T>;
}

impl<T> Context<T> for Option<T> {
    fn context<C: std::fmt::Display>(self, context: C) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }

    fn with_context<C: std::fmt::Display, F: FnOnce() -> C>(self, f: F) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

/// Return early with a [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($($arg)*)))
    };
}
