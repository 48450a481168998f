//! Terminal output for pipeline progress.
//!
//! Status lines go to stdout; warnings and errors go to stderr. Output is
//! decorative, so write failures (a closed pipe, for instance) are ignored.

use cyrup_termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use std::io::Write;

/// User-facing progress reporter.
#[derive(Clone, Debug)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
    color: ColorChoice,
}

impl OutputManager {
    /// Creates a reporter. `quiet` silences everything except warnings and
    /// errors; `verbose` enables [`OutputManager::verbose`] lines.
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            color: ColorChoice::Auto,
        }
    }

    /// Labeled header printed before each pipeline stage.
    pub fn section(&self, title: &str) {
        if self.quiet {
            return;
        }
        let mut out = StandardStream::stdout(self.color);
        let _ = writeln!(out);
        let _ = write_colored(&mut out, "==> ", title, bold(Color::Blue));
    }

    pub fn progress(&self, message: &str) {
        if !self.quiet {
            let mut out = StandardStream::stdout(self.color);
            let _ = write_colored(&mut out, "  -> ", message, plain(Color::Cyan));
        }
    }

    pub fn indent(&self, message: &str) {
        if !self.quiet {
            let mut out = StandardStream::stdout(self.color);
            let _ = writeln!(out, "     {}", message);
        }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            let mut out = StandardStream::stdout(self.color);
            let _ = write_colored(&mut out, "  ✓ ", message, bold(Color::Green));
        }
    }

    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            let mut out = StandardStream::stdout(self.color);
            let mut dim = ColorSpec::new();
            dim.set_dimmed(true);
            let _ = write_colored(&mut out, "     ", message, dim);
        }
    }

    /// Printed even in quiet mode.
    pub fn warn(&self, message: &str) {
        let mut err = StandardStream::stderr(self.color);
        let _ = write_colored(&mut err, "  ! ", message, bold(Color::Yellow));
    }
}

fn plain(color: Color) -> ColorSpec {
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(color));
    spec
}

fn bold(color: Color) -> ColorSpec {
    let mut spec = plain(color);
    spec.set_bold(true);
    spec
}

/// Writes `marker` in `spec`, then `message` uncolored, then a newline.
fn write_colored(
    out: &mut StandardStream,
    marker: &str,
    message: &str,
    spec: ColorSpec,
) -> std::io::Result<()> {
    out.set_color(&spec)?;
    write!(out, "{}", marker)?;
    out.reset()?;
    writeln!(out, "{}", message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_use_colored_specs() {
        let spec = bold(Color::Green);
        assert_eq!(spec.fg(), Some(&Color::Green));
        assert!(spec.bold());
        assert!(!plain(Color::Cyan).bold());
    }

    #[test]
    fn quiet_output_never_fails() {
        let output = OutputManager::new(true, true);
        output.section("Fetching runtime");
        output.progress("Downloading");
        output.indent("detail");
        output.success("done");
        output.verbose("hidden");
        output.warn("still shown");
    }
}
