//! Styled terminal output for lintpass
//!
//! Results go to stdout; errors always go to stderr, even in quiet mode.

use console::style;

use crate::diagnostics::Diagnostic;
use crate::engine::Severity;

/// Output handler for consistent CLI formatting
pub struct Output {
    verbose: bool,
    quiet: bool,
}

impl Output {
    /// Create a new output handler
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("✔").green(), message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✖").red(), message);
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("⚠").yellow(), message);
        }
    }

    /// Print a verbose message (only if verbose mode is enabled)
    pub fn verbose(&self, message: &str) {
        if self.verbose {
            println!("{} {}", style("ℹ").dim(), style(message).dim());
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Print a header/title
    pub fn header(&self, title: &str) {
        if !self.quiet {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    /// Print a file name heading its diagnostics
    pub fn file_header(&self, file: &str) {
        println!("\n{}", style(file).underlined());
    }

    /// Print one diagnostic below its file header.
    ///
    /// Diagnostics are results, so they are printed in quiet mode too.
    pub fn diagnostic(&self, diagnostic: &Diagnostic) {
        let severity = match diagnostic.severity {
            Severity::Error => style(diagnostic.severity.to_string()).red().bold(),
            Severity::Warning => style(diagnostic.severity.to_string()).yellow(),
            Severity::Info => style(diagnostic.severity.to_string()).blue(),
        };
        println!(
            "  {:>4}:{:<3} {:<7} {}  {}",
            style(diagnostic.line).yellow(),
            diagnostic.column,
            severity,
            diagnostic.message,
            style(&diagnostic.rule).dim()
        );
    }

    /// Print a table row
    pub fn table_row(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {:<20} {}", style(key).dim(), value);
        }
    }

    /// Print blank line
    pub fn blank_line(&self) {
        if !self.quiet {
            println!();
        }
    }
}
