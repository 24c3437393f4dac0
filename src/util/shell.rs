//! Terminal output for build progress.
//!
//! All user-visible build output funnels through [`Shell`]: the per-unit
//! compile counter lines, phase banners, and error reports. Diagnostic
//! logging goes through `tracing` instead.

use std::fmt::Display;
use std::io::{self, IsTerminal};

const GREEN: &str = "\x1b[92m";
const RED: &str = "\x1b[91m";
const GRAY: &str = "\x1b[90m";
const LIGHT_GRAY: &str = "\x1b[38;5;250m";
const RESET: &str = "\x1b[0m";

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Detect TTY and use colors if available.
    #[default]
    Auto,
    /// Always use ANSI colors.
    Always,
    /// Never use ANSI colors.
    Never,
}

impl std::str::FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            _ => Err(format!(
                "invalid color choice '{}'; expected 'auto', 'always', or 'never'",
                s
            )),
        }
    }
}

/// One finished compile unit, ready to be printed.
#[derive(Debug)]
pub struct CompileReport<'a> {
    /// 1-based completion index.
    pub index: usize,
    /// Total number of units in this component.
    pub total: usize,
    /// Wall time of this unit in seconds.
    pub seconds: f64,
    /// Owning component name.
    pub component: &'a str,
    /// Whether the compiler exited zero.
    pub success: bool,
    /// Source path (filename on success, full path on failure).
    pub path: &'a str,
    /// Captured compiler output, possibly empty.
    pub message: &'a str,
}

/// Central handle for user-facing output.
#[derive(Debug)]
pub struct Shell {
    use_color: bool,
    quiet: bool,
}

impl Shell {
    /// Create a new shell.
    pub fn new(color: ColorChoice, quiet: bool) -> Self {
        let use_color = match color {
            ColorChoice::Auto => io::stderr().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        };
        Shell { use_color, quiet }
    }

    /// Check if colors are enabled.
    pub fn use_color(&self) -> bool {
        self.use_color
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_color {
            format!("{}{}{}", color, text, RESET)
        } else {
            text.to_string()
        }
    }

    /// Print an informational phase banner (`Configure [name]`, `Build [name]`, ...).
    pub fn phase(&self, msg: impl Display) {
        if !self.quiet {
            eprintln!("{}", msg);
        }
    }

    /// Print an error message.
    pub fn error(&self, msg: impl Display) {
        eprintln!("{} {}", self.paint(RED, "error:"), msg);
    }

    /// Print one compile progress line.
    ///
    /// Format: `[index/total (pct%) seconds] (component) status path`,
    /// followed by the compiler's own output when there is any.
    pub fn compile_line(&self, report: &CompileReport<'_>) {
        let percent = (100.0 / report.total as f64 * report.index as f64) as u32;
        let counter = format!(
            "{}/{} ({}%) {:.3}s",
            report.index, report.total, percent, report.seconds
        );
        let status = if report.success {
            self.paint(GRAY, "Compiled")
        } else {
            self.paint(RED, "Failed to compile")
        };
        let line = format!(
            "[{}] ({}) {} {}",
            self.paint(if report.success { GREEN } else { RED }, &counter),
            self.paint(LIGHT_GRAY, report.component),
            status,
            self.paint(GRAY, report.path),
        );
        if report.message.is_empty() {
            eprintln!("{}", line);
        } else {
            eprintln!("{}\n{}", line, report.message.trim_end());
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(ColorChoice::Auto, false)
    }
}
