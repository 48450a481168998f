//! Platform-specific post-processing of assembled bundles.

pub mod macos;
