//! Relocatable runtime release settings.

use std::collections::HashMap;

/// Default runtime version.
pub const DEFAULT_RUNTIME_VERSION: &str = "3.12.8";

/// Default upstream release tag matching [`DEFAULT_RUNTIME_VERSION`].
pub const DEFAULT_RUNTIME_RELEASE: &str = "20241219";

/// Default release download root.
pub const DEFAULT_BASE_URL: &str =
    "https://github.com/astral-sh/python-build-standalone/releases/download";

/// Which runtime build to fetch and where from.
///
/// # Configuration
///
/// ```toml
/// [runtime]
/// version = "3.12.8"
/// release = "20241219"
///
/// [runtime.sha256]
/// macos-arm64 = "<hex digest>"
/// ```
#[derive(Clone, Debug)]
pub struct RuntimeSettings {
    /// Runtime version, e.g. `3.12.8`
    pub version: String,

    /// Upstream release tag, e.g. `20241219`
    pub release: String,

    /// Release download root; the release tag and filename are appended.
    pub base_url: String,

    /// Optional expected SHA-256 digests keyed by platform token.
    ///
    /// Default: empty (the archive is trusted as downloaded)
    pub sha256: HashMap<String, String>,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            version: DEFAULT_RUNTIME_VERSION.to_string(),
            release: DEFAULT_RUNTIME_RELEASE.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            sha256: HashMap::new(),
        }
    }
}

impl RuntimeSettings {
    /// Expected digest for a platform token, if configured.
    pub fn expected_sha256(&self, token: &str) -> Option<&str> {
        self.sha256.get(token).map(String::as_str)
    }
}
