//! File system utilities for bundling.
//!
//! Provides idempotent directory creation and removal, symlink-preserving
//! recursive copies, and [`rebuild_dir`], which owns a scratch directory for
//! the duration of one stage.

use crate::bundler::error::{Context, Error, ErrorExt, Result};
use std::{
    future::Future,
    io::{self},
    path::{Path, PathBuf},
};
use tokio::fs;

/// Creates all of the directories of the specified path, erasing it first if specified.
pub async fn create_dir_all(path: &Path, erase: bool) -> Result<()> {
    if erase {
        remove_dir_all(path).await?;
    }

    // create_dir_all is already idempotent - succeeds even if dir exists
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

/// Removes the directory and its contents if it exists.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()), // Idempotent
        Err(e) => Err(e).fs_context("removing directory", path),
    }
}

/// Removes a single file if it exists.
pub async fn remove_file(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).fs_context("removing file", path),
    }
}

/// Rebuilds `target` from scratch.
///
/// Any existing `target` is removed, then `populate` fills a hidden staging
/// sibling. Only when `populate` succeeds is the staging directory renamed to
/// `target`. On failure the staging directory is removed and `target` does
/// not exist, so a later run never mistakes a half-built directory for a
/// finished one.
pub async fn rebuild_dir<F, Fut, T>(target: &Path, populate: F) -> Result<T>
where
    F: FnOnce(PathBuf) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let staging = staging_path(target)?;

    if let Some(parent) = target.parent() {
        create_dir_all(parent, false).await?;
    }
    remove_dir_all(target).await?;
    create_dir_all(&staging, true).await?;

    match populate(staging.clone()).await {
        Ok(value) => {
            fs::rename(&staging, target)
                .await
                .fs_context("moving rebuilt directory into place", target)?;
            Ok(value)
        }
        Err(e) => {
            if let Err(cleanup) = remove_dir_all(&staging).await {
                log::warn!("Failed to clean up {}: {}", staging.display(), cleanup);
            }
            Err(e)
        }
    }
}

/// Staging sibling used by [`rebuild_dir`]: `<parent>/.<name>.partial`.
fn staging_path(target: &Path) -> Result<PathBuf> {
    let name = target
        .file_name()
        .with_context(|| format!("{} has no final path component", target.display()))?;
    Ok(target.with_file_name(format!(".{}.partial", name.to_string_lossy())))
}

/// Makes a symbolic link to a directory.
#[cfg(unix)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a directory.
#[cfg(windows)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(unix)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(windows)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(src, dst)
}

/// Recursively copies a directory from one path to another, creating any
/// parent directories of the destination path as necessary.
///
/// Preserves symlinks on platforms that support them. An existing
/// destination is merged into: directories are reused and files or links
/// with the same relative path are replaced.
/// Fails if the source path is not a directory or doesn't exist.
pub async fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        crate::bail!("{from:?} does not exist");
    }
    if !from.is_dir() {
        crate::bail!("{from:?} is not a Directory");
    }

    // Clone paths for move into blocking closure
    let from = from.to_path_buf();
    let to = to.to_path_buf();

    // Offload blocking work to dedicated thread pool
    tokio::task::spawn_blocking(move || copy_dir_blocking(&from, &to))
        .await
        .map_err(|e| Error::GenericError(format!("Directory copy task panicked: {}", e)))?
}

fn copy_dir_blocking(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent).fs_context("creating destination parent", parent)?;
    }

    for entry in walkdir::WalkDir::new(from) {
        let entry = entry?;
        debug_assert!(entry.path().starts_with(from));
        let rel_path = entry.path().strip_prefix(from)?;
        let dest_path = to.join(rel_path);

        if entry.file_type().is_symlink() {
            let target = std::fs::read_link(entry.path())
                .fs_context("reading symlink", entry.path())?;
            replace_existing(&dest_path)?;
            let linked = if entry.path().is_dir() {
                symlink_dir(&target, &dest_path)
            } else {
                symlink_file(&target, &dest_path)
            };
            linked.fs_context("creating symlink", &dest_path)?;
        } else if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest_path).fs_context("creating directory", &dest_path)?;
        } else {
            if dest_path.is_symlink() {
                replace_existing(&dest_path)?;
            }
            std::fs::copy(entry.path(), &dest_path).fs_context("copying file", &dest_path)?;
        }
    }

    Ok(())
}

/// Removes a file or symlink sitting where a link or file is about to be written.
fn replace_existing(path: &Path) -> Result<()> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => Err(Error::GenericError(format!(
            "{} is a directory and cannot be replaced",
            path.display()
        ))),
        Ok(_) => std::fs::remove_file(path).fs_context("replacing existing entry", path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).fs_context("inspecting existing entry", path),
    }
}

/// Total size in bytes of the regular files under `path`. Symlinks are not followed.
pub fn dir_size(path: &Path) -> Result<u64> {
    let mut total = 0u64;
    for entry in walkdir::WalkDir::new(path).follow_links(false) {
        let entry = entry?;
        if entry.file_type().is_file() {
            total += entry.metadata().map_err(Error::from)?.len();
        }
    }
    Ok(total)
}

/// Formats a byte count for humans, e.g. `48.2 MiB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = UNITS[0];
    for next in &UNITS[1..] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.1} {unit}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rebuild_dir_replaces_previous_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("out");
        std::fs::create_dir_all(target.join("stale")).unwrap();
        std::fs::write(target.join("stale/old.txt"), b"old").unwrap();

        rebuild_dir(&target, |dir| async move {
            tokio::fs::write(dir.join("new.txt"), b"new").await?;
            Ok::<(), Error>(())
        })
        .await
        .unwrap();

        assert!(target.join("new.txt").exists());
        assert!(!target.join("stale").exists());
        assert!(!tmp.path().join(".out.partial").exists());
    }

    #[tokio::test]
    async fn rebuild_dir_failure_leaves_nothing_behind() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("out");
        std::fs::create_dir_all(&target).unwrap();
        std::fs::write(target.join("old.txt"), b"old").unwrap();

        let result: Result<()> = rebuild_dir(&target, |dir| async move {
            tokio::fs::write(dir.join("half.txt"), b"half").await?;
            Err::<(), Error>(Error::GenericError("boom".into()))
        })
        .await;

        assert!(result.is_err());
        assert!(!target.exists());
        assert!(!tmp.path().join(".out.partial").exists());
    }

    #[tokio::test]
    async fn copy_dir_merges_into_existing_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        let dest = tmp.path().join("dest");
        std::fs::create_dir_all(a.join("lib/site")).unwrap();
        std::fs::write(a.join("lib/site/mod.py"), b"x").unwrap();
        std::fs::create_dir_all(b.join("lib")).unwrap();
        std::fs::write(b.join("lib/libcore.so"), b"y").unwrap();

        copy_dir(&a, &dest).await.unwrap();
        copy_dir(&b.join("lib"), &dest.join("lib")).await.unwrap();

        assert!(dest.join("lib/site/mod.py").exists());
        assert!(dest.join("lib/libcore.so").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn copy_dir_preserves_symlinks() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("real"), b"data").unwrap();
        std::os::unix::fs::symlink("real", src.join("link")).unwrap();

        let dest = tmp.path().join("dest");
        copy_dir(&src, &dest).await.unwrap();

        let meta = std::fs::symlink_metadata(dest.join("link")).unwrap();
        assert!(meta.file_type().is_symlink());
        assert_eq!(std::fs::read_link(dest.join("link")).unwrap(), PathBuf::from("real"));
    }

    #[test]
    fn dir_size_counts_files() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("d")).unwrap();
        std::fs::write(tmp.path().join("a"), vec![0u8; 100]).unwrap();
        std::fs::write(tmp.path().join("d/b"), vec![0u8; 24]).unwrap();
        assert_eq!(dir_size(tmp.path()).unwrap(), 124);
    }

    #[test]
    fn format_size_picks_unit() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KiB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MiB");
    }
}
