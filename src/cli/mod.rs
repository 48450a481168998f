//! Command line interface for the runtime bundler.

mod args;
mod output;

pub use args::Args;
pub use output::OutputManager;

use crate::bundler::{
    Bundler, PlatformReport, PlatformSelection, SettingsBuilder, SigningOutcome,
    settings::{ConfigFile, SigningSettings},
};
use crate::error::Result;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    args.validate()?;
    run_with(args).await
}

/// Runs the pipeline for already parsed arguments.
pub async fn run_with(args: Args) -> Result<i32> {
    // Resolved first so an unknown token fails before anything is touched.
    let selection = PlatformSelection::resolve(args.platform())?;
    let output = OutputManager::new(args.verbose, args.quiet);

    let project_root = match &args.project_root {
        Some(root) => root.clone(),
        None => std::env::current_dir()?,
    };

    let mut builder = SettingsBuilder::new()
        .selection(selection)
        .project_root(&project_root)
        .signing_identity(SigningSettings::identity_from_env());

    if let Some(config) = ConfigFile::discover(args.config.as_deref(), &project_root)? {
        builder = builder.config_file(config);
    }
    if let Some(version) = &args.runtime_version {
        builder = builder.runtime_version(version);
    }
    if let Some(release) = &args.runtime_release {
        builder = builder.runtime_release(release);
    }
    if let Some(package) = &args.package {
        builder = builder.package_name(package);
    }
    if let Some(dir) = &args.build_dir {
        builder = builder.build_dir(dir);
    }
    if let Some(dir) = &args.bundle_dir {
        builder = builder.bundle_dir(dir);
    }
    if let Some(dir) = &args.cache_dir {
        builder = builder.cache_dir(dir);
    }
    if let Some(dir) = &args.wheels_dir {
        builder = builder.wheels_dir(dir);
    }
    if let Some(path) = &args.entitlements {
        builder = builder.entitlements(path);
    }

    let settings = builder.build()?;
    log::debug!("Resolved settings: {:?}", settings);

    let bundler = Bundler::new(settings, output.clone());

    if args.sign_only {
        let outcomes = bundler.sign_only().await?;
        output.section("Summary");
        for (platform, outcome) in outcomes {
            output.indent(&format!("{}: {}", platform, describe(outcome)));
        }
        return Ok(0);
    }

    let reports = bundler.run().await?;
    output.section("Summary");
    for report in &reports {
        print_report(&output, report);
    }
    Ok(0)
}

fn print_report(output: &OutputManager, report: &PlatformReport) {
    output.success(&format!(
        "{}: {} ({})",
        report.platform,
        report.bundle.dir.display(),
        crate::bundler::utils::fs::format_size(report.bundle.size)
    ));
    output.indent(&format!("runtime: {}", report.runtime_version));
    output.indent(&format!("application: {}", report.app_version));
    output.indent(&format!("signing: {}", describe(report.signing)));
}

fn describe(outcome: SigningOutcome) -> String {
    match outcome {
        SigningOutcome::Skipped => "skipped".to_string(),
        SigningOutcome::Signed { count } => format!("{} binaries signed", count),
    }
}
