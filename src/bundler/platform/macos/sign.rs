//! Bundle code signing.
//!
//! Shared libraries are signed first, then the native executables. A
//! library's signature has to exist before anything that loads it is sealed.

use super::binary::is_native_binary;
use crate::bundler::{
    error::{Error, ErrorExt, Result},
    settings::Platform,
    utils::process,
};
use crate::cli::OutputManager;
use std::ffi::OsStr;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};

/// File extensions treated as shared libraries.
const LIBRARY_EXTENSIONS: &[&str] = &["dylib", "so"];

/// What kind of file a signing target is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetKind {
    SharedLibrary,
    Executable,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::SharedLibrary => f.write_str("library"),
            TargetKind::Executable => f.write_str("executable"),
        }
    }
}

/// A single file to be signed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SigningTarget {
    pub path: PathBuf,
    pub kind: TargetKind,
}

/// Signs one file.
pub trait SignTool {
    fn sign(&self, target: &SigningTarget) -> impl Future<Output = Result<()>> + Send;
}

/// `codesign` with hardened runtime, secure timestamp and entitlements.
#[derive(Clone, Debug)]
pub struct Codesign {
    program: PathBuf,
    identity: String,
    entitlements: PathBuf,
}

impl Codesign {
    pub fn new(program: PathBuf, identity: impl Into<String>, entitlements: PathBuf) -> Self {
        Self {
            program,
            identity: identity.into(),
            entitlements,
        }
    }

    fn args<'a>(&'a self, file: &'a Path) -> [&'a OsStr; 9] {
        [
            OsStr::new("--force"),
            OsStr::new("--options"),
            OsStr::new("runtime"),
            OsStr::new("--timestamp"),
            OsStr::new("--entitlements"),
            self.entitlements.as_os_str(),
            OsStr::new("--sign"),
            OsStr::new(&self.identity),
            file.as_os_str(),
        ]
    }
}

impl SignTool for Codesign {
    async fn sign(&self, target: &SigningTarget) -> Result<()> {
        process::run(&self.program, self.args(&target.path))
            .await
            .map(|_| ())
            .map_err(|reason| Error::SigningFailure {
                path: target.path.clone(),
                reason,
            })
    }
}

/// Every regular file below `bundle` with a shared-library extension.
/// Symbolic links are skipped; the file they point at is signed on its own.
pub fn discover_libraries(bundle: &Path) -> Result<Vec<SigningTarget>> {
    let mut targets = Vec::new();
    for entry in walkdir::WalkDir::new(bundle).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_library = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| LIBRARY_EXTENSIONS.contains(&ext));
        if is_library {
            targets.push(SigningTarget {
                path: entry.into_path(),
                kind: TargetKind::SharedLibrary,
            });
        }
    }
    targets.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(targets)
}

/// Native binaries directly inside the bundle's executable directory.
pub fn discover_executables(bundle: &Path, platform: Platform) -> Result<Vec<SigningTarget>> {
    let exec_dir = bundle.join(platform.descriptor().executable_dir);
    if !exec_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut targets = Vec::new();
    for entry in std::fs::read_dir(&exec_dir).fs_context("failed to list executables", &exec_dir)? {
        let entry = entry.fs_context("failed to list executables", &exec_dir)?;
        let path = entry.path();
        let file_type = entry.file_type().fs_context("failed to stat", &path)?;
        if !file_type.is_file() {
            continue;
        }
        if is_native_binary(&path)? {
            targets.push(SigningTarget {
                path,
                kind: TargetKind::Executable,
            });
        } else {
            log::debug!("Skipping non-native entry {}", path.display());
        }
    }
    targets.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(targets)
}

/// Signs all libraries, then all native executables, of the bundle at
/// `bundle`. Returns the number of files signed.
pub async fn sign_bundle<S: SignTool>(
    bundle: &Path,
    platform: Platform,
    signer: &S,
    output: &OutputManager,
) -> Result<usize> {
    let mut count = 0usize;

    let libraries = discover_libraries(bundle)?;
    log::info!("Found {} shared libraries to sign", libraries.len());
    for target in &libraries {
        sign_one(bundle, signer, target, &mut count, output).await?;
    }

    let exec_dir = bundle.join(platform.descriptor().executable_dir);
    if !exec_dir.is_dir() {
        output.warn(&format!("No executable directory at {}", exec_dir.display()));
    }

    // Discovered only after the libraries are signed.
    let executables = discover_executables(bundle, platform)?;
    log::info!("Found {} native executables to sign", executables.len());
    for target in &executables {
        sign_one(bundle, signer, target, &mut count, output).await?;
    }

    Ok(count)
}

async fn sign_one<S: SignTool>(
    bundle: &Path,
    signer: &S,
    target: &SigningTarget,
    count: &mut usize,
    output: &OutputManager,
) -> Result<()> {
    signer.sign(target).await?;
    *count += 1;
    let shown = target.path.strip_prefix(bundle).unwrap_or(&target.path);
    output.indent(&format!("[{}] signed {} {}", count, target.kind, shown.display()));
    Ok(())
}
