//! HTTP utilities for downloading runtime archives.

use crate::bundler::error::{Error, ErrorExt, Result};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Downloads `url` into `dest`, returning the number of bytes written.
///
/// The body is streamed to `<dest>.part` and renamed into place only after
/// the transfer completes, so `dest` never holds a truncated download.
///
/// Used by:
/// - Runtime fetcher (relocatable runtime archives)
pub async fn download_to_file(url: &str, dest: &Path) -> Result<u64> {
    log::info!("Downloading {}", url);

    let failure = |reason: String| Error::DownloadFailure {
        url: url.to_string(),
        reason,
    };

    let response = reqwest::get(url)
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| failure(e.to_string()))?;

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .fs_context("creating cache directory", parent)?;
    }

    let partial = partial_path(dest);
    let written = match stream_to_file(response, &partial, &failure).await {
        Ok(written) => written,
        Err(e) => {
            discard_partial(&partial).await;
            return Err(e);
        }
    };

    if let Err(e) = tokio::fs::rename(&partial, dest).await {
        discard_partial(&partial).await;
        return Err(e).fs_context("moving download into cache", dest);
    }

    log::debug!("Downloaded {} bytes to {}", written, dest.display());
    Ok(written)
}

async fn stream_to_file(
    mut response: reqwest::Response,
    partial: &Path,
    failure: &impl Fn(String) -> Error,
) -> Result<u64> {
    let mut file = tokio::fs::File::create(partial)
        .await
        .fs_context("creating download file", partial)?;

    let mut written = 0u64;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| failure(format!("failed to read response: {e}")))?
    {
        file.write_all(&chunk)
            .await
            .fs_context("writing download", partial)?;
        written += chunk.len() as u64;
    }

    file.flush().await.fs_context("flushing download", partial)?;
    Ok(written)
}

/// Removes an unfinished download, logging rather than failing.
async fn discard_partial(partial: &Path) {
    match tokio::fs::remove_file(partial).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Failed to clean up {}: {}", partial.display(), e),
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}
