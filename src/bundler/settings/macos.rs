//! macOS code signing settings.

use std::path::PathBuf;

/// Environment variable holding the signing identity.
pub const SIGNING_IDENTITY_ENV: &str = "APPLE_SIGNING_IDENTITY";

/// Code signing configuration.
///
/// Signing is active only when an identity is present. The identity comes
/// from the environment and is never read from the config file.
///
/// # Configuration
///
/// ```toml
/// [signing]
/// entitlements = "entitlements.plist"
/// ```
#[derive(Clone, Debug, Default)]
pub struct SigningSettings {
    /// Code signing identity name.
    ///
    /// Example: "Developer ID Application: Your Name (TEAMID)"
    ///
    /// Default: None (signing skipped)
    pub identity: Option<String>,

    /// Path to entitlements.plist for code signing.
    ///
    /// Default: None (built-in hardened-runtime profile)
    pub entitlements: Option<PathBuf>,
}

impl SigningSettings {
    /// Reads the identity from [`SIGNING_IDENTITY_ENV`]. Empty values count as unset.
    pub fn identity_from_env() -> Option<String> {
        std::env::var(SIGNING_IDENTITY_ENV)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Whether the signing stage should run.
    pub fn is_enabled(&self) -> bool {
        self.identity.is_some()
    }
}
