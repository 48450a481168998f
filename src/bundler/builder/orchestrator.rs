//! Pipeline orchestration.
//!
//! Runs the stages strictly in order for every selected platform. The first
//! failure ends the whole run; nothing is retried.

use super::signing::{SigningOutcome, sign_platform};
use crate::bundler::{
    Result, Settings,
    assemble::{Bundle, assemble_bundle},
    environment::provision_environment,
    runtime::fetch_runtime,
    settings::Platform,
    utils::fs,
};
use crate::cli::OutputManager;

/// What a full pipeline run produced for one platform.
#[derive(Clone, Debug)]
pub struct PlatformReport {
    pub platform: Platform,
    /// Runtime interpreter version line
    pub runtime_version: String,
    /// Application version line printed during verification
    pub app_version: String,
    pub bundle: Bundle,
    pub signing: SigningOutcome,
}

/// Main pipeline orchestrator.
///
/// # Examples
///
/// ```no_run
/// use runtime_bundler::bundler::{Bundler, PlatformSelection, Platform, SettingsBuilder};
/// use runtime_bundler::cli::OutputManager;
///
/// # async fn example() -> runtime_bundler::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .selection(PlatformSelection::One(Platform::MacOsArm64))
///     .project_root(".")
///     .build()?;
///
/// let bundler = Bundler::new(settings, OutputManager::new(false, false));
/// for report in bundler.run().await? {
///     println!("{}: {}", report.platform, report.bundle.dir.display());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Bundler {
    settings: Settings,
    output: OutputManager,
}

impl Bundler {
    pub fn new(settings: Settings, output: OutputManager) -> Self {
        Self { settings, output }
    }

    /// Runs fetch, provision, assemble and sign for every selected platform.
    pub async fn run(&self) -> Result<Vec<PlatformReport>> {
        let platforms = self.settings.selection().platforms();
        let mut reports = Vec::with_capacity(platforms.len());
        for platform in platforms {
            reports.push(self.run_platform(platform).await?);
        }
        Ok(reports)
    }

    /// Runs only the signing stage against already assembled bundles.
    pub async fn sign_only(&self) -> Result<Vec<(Platform, SigningOutcome)>> {
        let mut outcomes = Vec::new();
        for platform in self.settings.selection().platforms() {
            self.output.section(&format!("Code signing ({})", platform));
            outcomes.push((platform, sign_platform(&self.settings, platform, &self.output).await?));
        }
        Ok(outcomes)
    }

    async fn run_platform(&self, platform: Platform) -> Result<PlatformReport> {
        let settings = &self.settings;
        let output = &self.output;
        let descriptor = platform.descriptor();

        output.section(&format!("Platform {}", platform));
        output.indent(&format!("{} / {} ({})", descriptor.os, descriptor.arch, descriptor.triple));
        log::info!("Bundling for {} ({})", platform, descriptor.triple);

        // The environment is owned by this run from here on.
        fs::remove_dir_all(&settings.env_dir(platform)).await?;

        output.section("Fetching runtime");
        let runtime = fetch_runtime(settings, platform, output).await?;

        output.section("Provisioning environment");
        let env = provision_environment(settings, platform, &runtime, output).await?;

        output.section("Assembling bundle");
        let bundle = assemble_bundle(settings, platform, &env.dir, &runtime.dir, output).await?;

        output.section("Code signing");
        let signing = sign_platform(settings, platform, output).await?;

        Ok(PlatformReport {
            platform,
            runtime_version: runtime.version_line,
            app_version: env.app_version,
            bundle,
            signing,
        })
    }
}
