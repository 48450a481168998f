//! Isolated environment provisioning.
//!
//! Creates a virtual environment from the extracted runtime's own
//! interpreter, layers the fast installer on top of the baseline one, installs
//! the target application and proves that it runs.
//!
//! The environment directory is cleared by the orchestrator at the start of a
//! run; this stage refuses to work on a directory that already exists.

use crate::bundler::{
    error::{Error, Result},
    runtime::FetchedRuntime,
    settings::{Platform, Settings},
    utils::process,
};
use crate::cli::OutputManager;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Baseline installer shipped with the runtime.
const BASELINE_INSTALLER: &str = "pip";

/// Faster installer layered on top of the baseline one.
const FAST_INSTALLER: &str = "uv";

/// An environment with the target application installed.
#[derive(Clone, Debug)]
pub struct ProvisionedEnvironment {
    /// Environment root
    pub dir: PathBuf,
    /// The environment's interpreter
    pub interpreter: PathBuf,
    /// First line of the application's version output
    pub app_version: String,
}

/// Provisions the environment for `platform` from a fetched runtime.
pub async fn provision_environment(
    settings: &Settings,
    platform: Platform,
    runtime: &FetchedRuntime,
    output: &OutputManager,
) -> Result<ProvisionedEnvironment> {
    let env_dir = settings.env_dir(platform);
    let package = settings.package();

    if env_dir.exists() {
        return Err(Error::ProvisioningFailure {
            step: "environment creation",
            reason: format!(
                "{} already exists; environments are only created fresh",
                env_dir.display()
            ),
        });
    }

    output.progress(&format!("Creating environment at {}", env_dir.display()));
    let mut create: Vec<OsString> = vec!["-m".into(), "venv".into(), "--copies".into()];
    create.push(env_dir.clone().into_os_string());
    step("environment creation", &runtime.interpreter, create).await?;

    let interpreter = platform.descriptor().env_interpreter_in(&env_dir);
    if !interpreter.is_file() {
        return Err(Error::ProvisioningFailure {
            step: "environment creation",
            reason: format!("interpreter missing at {}", interpreter.display()),
        });
    }

    output.progress(&format!("Upgrading {}", BASELINE_INSTALLER));
    step(
        "installer bootstrap",
        &interpreter,
        ["-m", BASELINE_INSTALLER, "install", "--upgrade", BASELINE_INSTALLER],
    )
    .await?;

    output.progress(&format!("Installing {}", FAST_INSTALLER));
    step(
        "installer bootstrap",
        &interpreter,
        ["-m", BASELINE_INSTALLER, "install", "--upgrade", FAST_INSTALLER],
    )
    .await?;

    output.progress(&format!("Installing {} (latest)", package.name));
    step(
        "package install",
        &interpreter,
        install_args(&interpreter, &package.name, package.wheels_dir.as_deref()),
    )
    .await?;

    output.progress(&format!("Verifying {}", package.name));
    let mut verify: Vec<OsString> = vec!["-m".into(), package.module.clone().into()];
    verify.extend(package.verify_args.iter().map(OsString::from));
    let verified = step("verification", &interpreter, verify).await?;
    let app_version = process::first_line(&verified);

    output.success(&format!("{} installed: {}", package.name, app_version));

    Ok(ProvisionedEnvironment {
        dir: env_dir,
        interpreter,
        app_version,
    })
}

/// Arguments for installing `package` through the fast installer.
fn install_args(interpreter: &Path, package: &str, wheels_dir: Option<&Path>) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-m".into(),
        FAST_INSTALLER.into(),
        "pip".into(),
        "install".into(),
        "--python".into(),
        interpreter.as_os_str().to_owned(),
    ];
    if let Some(wheels) = wheels_dir {
        args.push("--no-index".into());
        args.push("--find-links".into());
        args.push(wheels.as_os_str().to_owned());
    }
    args.push(package.into());
    args
}

async fn step<I, S>(name: &'static str, program: &Path, args: I) -> Result<std::process::Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    process::run(program, args)
        .await
        .map_err(|reason| Error::ProvisioningFailure { step: name, reason })
}
