//! Signing stage activation.
//!
//! Signing runs only when a signing identity was supplied. An enabled stage
//! needs an assembled bundle and fails with [`Error::MissingBundle`] before
//! touching any file when there is none.

use super::tool_detection::CODESIGN;
use crate::bundler::{
    error::{Error, ErrorExt, Result},
    platform::macos::{Codesign, SignTool, sign_bundle},
    settings::{OsFamily, Platform, Settings},
    utils::fs,
};
use crate::cli::OutputManager;
use std::path::{Path, PathBuf};

/// Hardened-runtime entitlements used when none are configured.
const DEFAULT_ENTITLEMENTS: &[&str] = &[
    "com.apple.security.cs.allow-jit",
    "com.apple.security.cs.allow-unsigned-executable-memory",
    "com.apple.security.cs.disable-library-validation",
];

/// File name of the generated entitlements profile inside the build directory.
const ENTITLEMENTS_FILE: &str = "entitlements.plist";

/// Result of the signing stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SigningOutcome {
    /// No identity was supplied.
    Skipped,
    /// Every library and native executable was signed.
    Signed { count: usize },
}

/// Runs the signing stage for `platform` with `codesign`.
pub async fn sign_platform(
    settings: &Settings,
    platform: Platform,
    output: &OutputManager,
) -> Result<SigningOutcome> {
    sign_platform_with(settings, platform, output, |identity, entitlements| {
        let program = CODESIGN.clone().ok_or_else(|| Error::SigningFailure {
            path: settings.bundle_dir(platform),
            reason: "codesign not found in PATH".into(),
        })?;
        Ok(Codesign::new(program, identity, entitlements))
    })
    .await
}

/// Runs the signing stage with a signer built by `make_signer`.
///
/// `make_signer` receives the identity and the entitlements path, and is
/// only called once the stage is enabled and the bundle exists.
pub async fn sign_platform_with<S, F>(
    settings: &Settings,
    platform: Platform,
    output: &OutputManager,
    make_signer: F,
) -> Result<SigningOutcome>
where
    S: SignTool,
    F: FnOnce(&str, PathBuf) -> Result<S>,
{
    let Some(identity) = settings.signing().identity.as_deref() else {
        output.indent("No signing identity set; skipping code signing");
        log::info!("Signing skipped for {}", platform);
        return Ok(SigningOutcome::Skipped);
    };
    let bundle_dir = settings.bundle_dir(platform);
    if !bundle_dir.is_dir() {
        return Err(Error::MissingBundle { path: bundle_dir });
    }

    if platform.descriptor().os != OsFamily::MacOs {
        output.indent(&format!("Code signing applies to macOS bundles only; skipping {}", platform));
        return Ok(SigningOutcome::Skipped);
    }

    let entitlements = ensure_entitlements(settings).await?;
    let signer = make_signer(identity, entitlements)?;

    output.progress(&format!("Signing {} with \"{}\"", bundle_dir.display(), identity));
    let count = sign_bundle(&bundle_dir, platform, &signer, output).await?;
    output.success(&format!("Signed {} binaries", count));

    Ok(SigningOutcome::Signed { count })
}

/// The configured entitlements file, or the built-in profile written into
/// the build directory.
async fn ensure_entitlements(settings: &Settings) -> Result<PathBuf> {
    if let Some(path) = &settings.signing().entitlements {
        if let Err(e) = plist::Value::from_file(path) {
            return Err(Error::SigningFailure {
                path: path.clone(),
                reason: format!("unreadable entitlements: {}", e),
            });
        }
        return Ok(path.clone());
    }

    let path = settings.build_dir().join(ENTITLEMENTS_FILE);
    write_default_entitlements(&path).await?;
    Ok(path)
}

fn default_entitlements() -> Result<Vec<u8>> {
    let mut dict = plist::Dictionary::new();
    for key in DEFAULT_ENTITLEMENTS {
        dict.insert((*key).to_string(), plist::Value::Boolean(true));
    }
    let mut xml = Vec::new();
    plist::Value::Dictionary(dict)
        .to_writer_xml(&mut xml)
        .map_err(|e| Error::GenericError(format!("failed to serialize entitlements: {}", e)))?;
    Ok(xml)
}

async fn write_default_entitlements(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent, false).await?;
    }
    tokio::fs::write(path, default_entitlements()?)
        .await
        .fs_context("failed to write entitlements", path)?;
    log::debug!("Wrote default entitlements to {}", path.display());
    Ok(())
}
