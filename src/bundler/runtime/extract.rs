//! Runtime archive extraction.
//!
//! Runtime archives wrap everything in a single top-level folder. Extraction
//! strips exactly that one component so the destination directly contains
//! the runtime tree (`bin/`, `lib/`, ...).

use std::fs::File;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] io::Error),

    /// A path in the archive attempts to escape the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The archive has no entries below its top-level folder.
    #[error("archive contains no runtime files")]
    EmptyArchive,
}

/// Extracts a `.tar.gz` archive into `dest`, dropping the first path component
/// of every entry. Returns the number of entries written.
///
/// Blocking; call from `spawn_blocking`.
pub fn extract_tar_gz_strip_one(archive_path: &Path, dest: &Path) -> Result<usize, ExtractError> {
    let file = File::open(archive_path)?;
    let decoder = flate2::read::GzDecoder::new(file);
    let mut archive = tar::Archive::new(decoder);
    archive.set_preserve_permissions(true);

    std::fs::create_dir_all(dest)?;
    let root = dest.canonicalize()?;
    let mut written = 0usize;

    for entry_result in archive.entries()? {
        let mut entry = entry_result?;
        let entry_path = entry.path()?.into_owned();

        validate_entry_path(&entry_path)?;
        let Some(relative) = strip_first_component(&entry_path) else {
            continue;
        };
        let dest_path = dest.join(&relative);

        if let Some(parent) = dest_path.parent() {
            ensure_within(&root, parent, &entry_path)?;
            std::fs::create_dir_all(parent)?;
        }
        // Never write through a link left by an earlier entry.
        if std::fs::symlink_metadata(&dest_path).is_ok_and(|m| m.file_type().is_symlink()) {
            std::fs::remove_file(&dest_path)?;
        }

        if entry.header().entry_type().is_hard_link() {
            let link = entry
                .link_name()?
                .map(|l| l.into_owned())
                .ok_or_else(|| ExtractError::PathTraversal {
                    path: entry_path.display().to_string(),
                })?;
            validate_entry_path(&link)?;
            let Some(link_rel) = strip_first_component(&link) else {
                return Err(ExtractError::PathTraversal {
                    path: link.display().to_string(),
                });
            };
            std::fs::hard_link(dest.join(link_rel), &dest_path)?;
        } else {
            entry.unpack(&dest_path)?;
        }
        written += 1;
    }

    if written == 0 {
        return Err(ExtractError::EmptyArchive);
    }
    Ok(written)
}

/// Drops the archive's wrapping folder. `None` for the folder entry itself.
fn strip_first_component(path: &Path) -> Option<PathBuf> {
    let mut components = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir));
    components.next()?;
    let rest: PathBuf = components.collect();
    if rest.as_os_str().is_empty() {
        None
    } else {
        Some(rest)
    }
}

/// Checks that `path`, once symlinks created by earlier entries are
/// resolved, still lies below `root`. Only the deepest existing ancestor is
/// resolved, so nothing is created before the check.
fn ensure_within(root: &Path, path: &Path, entry_path: &Path) -> Result<(), ExtractError> {
    let mut existing = path;
    while !existing.exists() {
        match existing.parent() {
            Some(parent) => existing = parent,
            None => break,
        }
    }
    let resolved = existing.canonicalize()?;
    if !resolved.starts_with(root) {
        return Err(ExtractError::PathTraversal {
            path: entry_path.display().to_string(),
        });
    }
    Ok(())
}

/// Validate that a tar entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractError> {
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
    if escapes {
        return Err(ExtractError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a `.tar.gz` at `archive` whose entries live under `top/`.
    pub(crate) fn write_archive(archive: &Path, top: &str, files: &[(&str, &[u8], u32)]) {
        let out = File::create(archive).unwrap();
        let encoder = flate2::write::GzEncoder::new(out, flate2::Compression::fast());
        let mut builder = tar::Builder::new(encoder);

        let mut dir = tar::Header::new_gnu();
        dir.set_entry_type(tar::EntryType::Directory);
        dir.set_mode(0o755);
        dir.set_size(0);
        builder
            .append_data(&mut dir, format!("{top}/"), io::empty())
            .unwrap();

        for (name, data, mode) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(*mode);
            header.set_entry_type(tar::EntryType::Regular);
            builder
                .append_data(&mut header, format!("{top}/{name}"), *data)
                .unwrap();
        }

        let encoder = builder.into_inner().unwrap();
        encoder.finish().unwrap();
    }

    #[test]
    fn strips_wrapping_folder() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("rt.tar.gz");
        write_archive(
            &archive,
            "python",
            &[("bin/python3", b"#!/bin/sh\n", 0o755), ("lib/libpython.so", b"elf", 0o644)],
        );

        let dest = tmp.path().join("out");
        let n = extract_tar_gz_strip_one(&archive, &dest).unwrap();

        assert_eq!(n, 2);
        assert!(dest.join("bin/python3").is_file());
        assert!(dest.join("lib/libpython.so").is_file());
        assert!(!dest.join("python").exists());
    }

    #[cfg(unix)]
    #[test]
    fn keeps_executable_bit() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("rt.tar.gz");
        write_archive(&archive, "python", &[("bin/python3", b"#!/bin/sh\n", 0o755)]);

        let dest = tmp.path().join("out");
        extract_tar_gz_strip_one(&archive, &dest).unwrap();

        let mode = std::fs::metadata(dest.join("bin/python3")).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn empty_archive_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("rt.tar.gz");
        write_archive(&archive, "python", &[]);

        let err = extract_tar_gz_strip_one(&archive, &tmp.path().join("out")).unwrap_err();
        assert!(matches!(err, ExtractError::EmptyArchive));
    }

    #[test]
    fn corrupt_archive_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("rt.tar.gz");
        std::fs::write(&archive, b"definitely not gzip").unwrap();

        let err = extract_tar_gz_strip_one(&archive, &tmp.path().join("out")).unwrap_err();
        assert!(matches!(err, ExtractError::Io(_)));
    }

    #[test]
    fn strip_first_component_cases() {
        assert_eq!(strip_first_component(Path::new("python/")), None);
        assert_eq!(
            strip_first_component(Path::new("python/bin/python3")),
            Some(PathBuf::from("bin/python3"))
        );
        assert_eq!(
            strip_first_component(Path::new("./python/lib")),
            Some(PathBuf::from("lib"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directory_cannot_redirect_writes() {
        let tmp = tempfile::tempdir().unwrap();
        let outside = tmp.path().join("outside");
        std::fs::create_dir_all(&outside).unwrap();

        let archive = tmp.path().join("rt.tar.gz");
        let out = File::create(&archive).unwrap();
        let encoder = flate2::write::GzEncoder::new(out, flate2::Compression::fast());
        let mut builder = tar::Builder::new(encoder);

        let mut link = tar::Header::new_gnu();
        link.set_entry_type(tar::EntryType::Symlink);
        link.set_size(0);
        link.set_mode(0o777);
        link.set_link_name(&outside).unwrap();
        builder
            .append_data(&mut link, "python/lib", io::empty())
            .unwrap();

        let data = b"escaped";
        let mut file = tar::Header::new_gnu();
        file.set_entry_type(tar::EntryType::Regular);
        file.set_size(data.len() as u64);
        file.set_mode(0o644);
        builder
            .append_data(&mut file, "python/lib/evil.txt", &data[..])
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let err = extract_tar_gz_strip_one(&archive, &tmp.path().join("out")).unwrap_err();
        assert!(matches!(err, ExtractError::PathTraversal { .. }));
        assert!(!outside.join("evil.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn internal_symlinks_are_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("rt.tar.gz");
        let out = File::create(&archive).unwrap();
        let encoder = flate2::write::GzEncoder::new(out, flate2::Compression::fast());
        let mut builder = tar::Builder::new(encoder);

        let data = b"#!/bin/sh\n";
        let mut file = tar::Header::new_gnu();
        file.set_entry_type(tar::EntryType::Regular);
        file.set_size(data.len() as u64);
        file.set_mode(0o755);
        builder
            .append_data(&mut file, "python/bin/python3.12", &data[..])
            .unwrap();

        let mut link = tar::Header::new_gnu();
        link.set_entry_type(tar::EntryType::Symlink);
        link.set_size(0);
        link.set_mode(0o777);
        link.set_link_name("python3.12").unwrap();
        builder
            .append_data(&mut link, "python/bin/python3", io::empty())
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let dest = tmp.path().join("out");
        extract_tar_gz_strip_one(&archive, &dest).unwrap();
        let meta = std::fs::symlink_metadata(dest.join("bin/python3")).unwrap();
        assert!(meta.file_type().is_symlink());
        assert!(dest.join("bin/python3").is_file());
    }

    #[test]
    fn rejects_parent_components() {
        assert!(validate_entry_path(Path::new("python/../../etc/passwd")).is_err());
        assert!(validate_entry_path(Path::new("/etc/passwd")).is_err());
        assert!(validate_entry_path(Path::new("python/bin")).is_ok());
    }
}
