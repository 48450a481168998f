//! External command execution.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Output;
use tokio::process::Command;

/// Runs `program` with `args` to completion and captures its output.
///
/// Returns the captured output when the process exits successfully. Any
/// other outcome (spawn failure, non-zero exit, signal) becomes a
/// human-readable reason that the caller wraps in its own error kind.
pub async fn run<I, S>(program: &Path, args: I) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command.args(args);
    log::debug!("Running {:?}", command.as_std());

    let output = command
        .output()
        .await
        .map_err(|e| format!("failed to execute {}: {}", program.display(), e))?;

    if output.status.success() {
        return Ok(output);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    Err(match output.status.code() {
        Some(code) if stderr.is_empty() => format!("{} exited with code {}", program.display(), code),
        Some(code) => format!("{} exited with code {}: {}", program.display(), code, stderr),
        None => format!("{} was terminated by a signal", program.display()),
    })
}

/// First non-empty line of a command's stdout, falling back to stderr.
///
/// Some interpreters print their version to stderr.
pub fn first_line(output: &Output) -> String {
    [&output.stdout, &output.stderr]
        .into_iter()
        .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())
        .find(|s| !s.is_empty())
        .and_then(|s| s.lines().next().map(str::to_string))
        .unwrap_or_default()
}
