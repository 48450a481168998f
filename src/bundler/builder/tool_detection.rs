//! External tool detection.

use std::path::PathBuf;
use std::sync::LazyLock;

/// Location of `codesign`, if it is on the PATH.
///
/// Resolved once per process.
pub static CODESIGN: LazyLock<Option<PathBuf>> = LazyLock::new(|| match which::which("codesign") {
    Ok(path) => {
        log::debug!("Found codesign at: {}", path.display());
        Some(path)
    }
    Err(e) => {
        log::debug!("codesign not found in PATH: {}", e);
        None
    }
});
