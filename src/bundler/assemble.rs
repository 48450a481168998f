//! Final bundle assembly.
//!
//! The bundle is the provisioned environment tree plus the runtime's
//! shared-library directory, which the environment alone does not carry.
//! Any previous bundle is removed first and the new one is built in a staging
//! sibling, so a failed assembly never leaves a directory at the bundle path.

use crate::bundler::{
    error::Result,
    settings::{Platform, Settings},
    utils::fs,
};
use crate::cli::OutputManager;
use std::path::{Path, PathBuf};

/// A completed bundle.
#[derive(Clone, Debug)]
pub struct Bundle {
    /// Bundle root
    pub dir: PathBuf,
    /// Total size of regular files in bytes
    pub size: u64,
}

/// Merges `env_dir` and `<runtime_dir>/<shared-library dir>` into the bundle
/// directory for `platform`.
pub async fn assemble_bundle(
    settings: &Settings,
    platform: Platform,
    env_dir: &Path,
    runtime_dir: &Path,
    output: &OutputManager,
) -> Result<Bundle> {
    let bundle_dir = settings.bundle_dir(platform);
    let lib_name = platform.descriptor().shared_library_dir;
    let runtime_libs = runtime_dir.join(lib_name);

    output.progress(&format!("Assembling {}", bundle_dir.display()));

    fs::rebuild_dir(&bundle_dir, |staging| async move {
        log::debug!("Copying environment {} -> {}", env_dir.display(), staging.display());
        fs::copy_dir(env_dir, &staging).await?;

        log::debug!(
            "Copying runtime libraries {} -> {}",
            runtime_libs.display(),
            staging.join(lib_name).display()
        );
        fs::copy_dir(&runtime_libs, &staging.join(lib_name)).await
    })
    .await?;

    let size = {
        let dir = bundle_dir.clone();
        tokio::task::spawn_blocking(move || fs::dir_size(&dir))
            .await
            .map_err(|e| {
                crate::bundler::Error::GenericError(format!("size task panicked: {e}"))
            })??
    };
    output.success(&format!(
        "Bundle ready at {} ({})",
        bundle_dir.display(),
        fs::format_size(size)
    ));

    Ok(Bundle {
        dir: bundle_dir,
        size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::settings::{PlatformSelection, SettingsBuilder};

    fn write(path: &Path, data: &[u8]) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, data).unwrap();
    }

    fn fixture() -> (tempfile::TempDir, Settings, PathBuf, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let settings = SettingsBuilder::new()
            .selection(PlatformSelection::One(Platform::MacOsArm64))
            .project_root(tmp.path())
            .build()
            .unwrap();
        let env = settings.env_dir(Platform::MacOsArm64);
        let runtime = settings.extract_dir(Platform::MacOsArm64);
        write(&env.join("bin/python"), b"env-python");
        write(&env.join("lib/python3.12/site-packages/esphome/__init__.py"), b"");
        write(&runtime.join("lib/libpython3.12.dylib"), b"core");
        write(&runtime.join("bin/python3"), b"runtime-python");
        (tmp, settings, env, runtime)
    }

    #[tokio::test]
    async fn bundle_is_env_plus_runtime_libs() {
        let (_tmp, settings, env, runtime) = fixture();
        let bundle = assemble_bundle(
            &settings,
            Platform::MacOsArm64,
            &env,
            &runtime,
            &OutputManager::new(false, true),
        )
        .await
        .unwrap();

        assert!(bundle.dir.join("bin/python").is_file());
        assert!(bundle.dir.join("lib/python3.12/site-packages/esphome/__init__.py").is_file());
        assert!(bundle.dir.join("lib/libpython3.12.dylib").is_file());
        // Only the library tree comes from the runtime.
        assert!(!bundle.dir.join("bin/python3").exists());
        assert_eq!(bundle.size, (b"env-python".len() + b"core".len()) as u64);
    }

    #[tokio::test]
    async fn previous_bundle_contents_are_removed() {
        let (_tmp, settings, env, runtime) = fixture();
        let bundle_dir = settings.bundle_dir(Platform::MacOsArm64);
        write(&bundle_dir.join("leftover.txt"), b"old run");
        write(&bundle_dir.join("lib/old.dylib"), b"old lib");

        let bundle = assemble_bundle(
            &settings,
            Platform::MacOsArm64,
            &env,
            &runtime,
            &OutputManager::new(false, true),
        )
        .await
        .unwrap();

        assert!(!bundle.dir.join("leftover.txt").exists());
        assert!(!bundle.dir.join("lib/old.dylib").exists());
        assert!(bundle.dir.join("lib/libpython3.12.dylib").exists());
    }

    #[tokio::test]
    async fn missing_runtime_libs_leave_no_bundle() {
        let (_tmp, settings, env, runtime) = fixture();
        std::fs::remove_dir_all(runtime.join("lib")).unwrap();

        let result = assemble_bundle(
            &settings,
            Platform::MacOsArm64,
            &env,
            &runtime,
            &OutputManager::new(false, true),
        )
        .await;

        assert!(result.is_err());
        assert!(!settings.bundle_dir(Platform::MacOsArm64).exists());
    }
}
