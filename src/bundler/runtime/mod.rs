//! Relocatable runtime acquisition.
//!
//! Resolves the download URL for a versioned runtime build, keeps a copy in
//! the download cache, and extracts it into a freshly rebuilt directory whose
//! interpreter has been proven to run.
//!
//! # Cache policy
//!
//! A cache file with the exact expected name is reused as-is and never
//! re-downloaded. If the configuration supplies a SHA-256 for the platform,
//! the file is checked against it; a mismatch removes the file and fails.

mod checksum;
mod extract;

#[cfg(test)]
pub(crate) use extract::tests::write_archive;

use crate::bundler::{
    error::{Error, Result},
    settings::{Platform, Settings},
    utils::{fs, http, process},
};
use crate::cli::OutputManager;
use std::path::{Path, PathBuf};
use url::Url;

/// A versioned, platform-specific runtime download.
#[derive(Clone, Debug)]
pub struct RuntimeArtifact {
    /// Runtime version, e.g. `3.12.8`
    pub version: String,
    /// Upstream release tag
    pub release: String,
    /// Archive filename
    pub filename: String,
    /// Source URL
    pub url: Url,
    /// Local cache file
    pub cache_path: PathBuf,
    /// Directory the runtime is extracted into
    pub extract_dir: PathBuf,
}

impl RuntimeArtifact {
    /// Computes the artifact for a platform from the run settings.
    pub fn new(settings: &Settings, platform: Platform) -> Result<Self> {
        let runtime = settings.runtime();
        let filename = platform
            .descriptor()
            .archive_filename(&runtime.version, &runtime.release);
        let url = release_url(&runtime.base_url, &runtime.release, &filename)?;

        Ok(Self {
            version: runtime.version.clone(),
            release: runtime.release.clone(),
            cache_path: settings.cache_path(&filename),
            extract_dir: settings.extract_dir(platform),
            filename,
            url,
        })
    }
}

/// `{base}/{release}/{filename}`
fn release_url(base: &str, release: &str, filename: &str) -> Result<Url> {
    let base = format!("{}/", base.trim_end_matches('/'));
    Url::parse(&base)
        .and_then(|u| u.join(&format!("{release}/")))
        .and_then(|u| u.join(filename))
        .map_err(|e| Error::Config(format!("cannot build download URL from {base}: {e}")))
}

/// Whether the fetch touched the network.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CacheStatus {
    /// Existing cache file reused
    Hit,
    /// Archive downloaded into the cache
    Downloaded,
}

/// A runtime that has been extracted and verified.
#[derive(Clone, Debug)]
pub struct FetchedRuntime {
    /// The artifact that was fetched
    pub artifact: RuntimeArtifact,
    /// Extraction directory containing the runtime tree
    pub dir: PathBuf,
    /// The runtime's own interpreter
    pub interpreter: PathBuf,
    /// First line of the interpreter's version output
    pub version_line: String,
    /// Whether the archive came from the cache
    pub cache: CacheStatus,
}

/// Produces a populated, verified extraction directory for `platform`.
///
/// # Process
///
/// 1. Compute filename, URL and cache path
/// 2. Reuse the cache file or download it
/// 3. Rebuild the extraction directory, stripping the archive's top folder
/// 4. Run the runtime interpreter with `--version`
pub async fn fetch_runtime(
    settings: &Settings,
    platform: Platform,
    output: &OutputManager,
) -> Result<FetchedRuntime> {
    let artifact = RuntimeArtifact::new(settings, platform)?;
    output.indent(&format!("Runtime {} ({})", artifact.version, artifact.release));
    output.verbose(&format!("Source: {}", artifact.url));

    let cache = ensure_cached(
        &artifact,
        settings.runtime().expected_sha256(platform.token()),
        output,
    )
    .await?;

    let descriptor = platform.descriptor();
    let archive = artifact.cache_path.clone();
    let extract_dir = artifact.extract_dir.clone();

    output.progress(&format!("Extracting into {}", extract_dir.display()));
    let version_line = fs::rebuild_dir(&artifact.extract_dir, |staging| async move {
        extract_archive(&archive, &staging, &extract_dir).await?;
        let interpreter = descriptor.runtime_interpreter_in(&staging);
        verify_interpreter(&interpreter, &extract_dir).await
    })
    .await?;

    output.success(&format!("Runtime ready: {}", version_line));

    Ok(FetchedRuntime {
        interpreter: descriptor.runtime_interpreter_in(&artifact.extract_dir),
        dir: artifact.extract_dir.clone(),
        artifact,
        version_line,
        cache,
    })
}

/// Makes sure the artifact's archive is present in the cache.
pub async fn ensure_cached(
    artifact: &RuntimeArtifact,
    expected_sha256: Option<&str>,
    output: &OutputManager,
) -> Result<CacheStatus> {
    let status = if artifact.cache_path.is_file() {
        log::info!("Reusing cached archive {}", artifact.cache_path.display());
        output.progress(&format!(
            "Using cached {} (no download)",
            artifact.cache_path.display()
        ));
        CacheStatus::Hit
    } else {
        output.progress(&format!("Downloading {}", artifact.filename));
        let bytes = http::download_to_file(artifact.url.as_str(), &artifact.cache_path).await?;
        output.indent(&format!(
            "Saved {} to {}",
            fs::format_size(bytes),
            artifact.cache_path.display()
        ));
        CacheStatus::Downloaded
    };

    let digest = checksum::calculate_file_sha256(&artifact.cache_path).await?;
    log::info!("{} sha256 {}", artifact.filename, digest);

    if let Some(expected) = expected_sha256 {
        if !checksum::digests_match(expected, &digest) {
            fs::remove_file(&artifact.cache_path).await?;
            return Err(Error::DownloadFailure {
                url: artifact.url.to_string(),
                reason: format!(
                    "checksum mismatch: expected {}, got {} (cache file removed)",
                    expected.trim(),
                    digest
                ),
            });
        }
        output.verbose("Checksum verified");
    }

    Ok(status)
}

async fn extract_archive(archive: &Path, staging: &Path, extract_dir: &Path) -> Result<()> {
    let archive_owned = archive.to_path_buf();
    let staging_owned = staging.to_path_buf();
    let failure = |reason: String| Error::ExtractionFailure {
        path: extract_dir.to_path_buf(),
        reason,
    };

    let count = tokio::task::spawn_blocking(move || {
        extract::extract_tar_gz_strip_one(&archive_owned, &staging_owned)
    })
    .await
    .map_err(|e| failure(format!("extraction task panicked: {e}")))?
    .map_err(|e| failure(format!("{}: {}", archive.display(), e)))?;

    log::debug!("Extracted {} entries from {}", count, archive.display());
    Ok(())
}

async fn verify_interpreter(interpreter: &Path, extract_dir: &Path) -> Result<String> {
    let output = process::run(interpreter, ["--version"])
        .await
        .map_err(|reason| Error::ExtractionFailure {
            path: extract_dir.to_path_buf(),
            reason: format!("runtime version check failed: {reason}"),
        })?;
    Ok(process::first_line(&output))
}
