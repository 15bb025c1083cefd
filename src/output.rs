//! Output formatting and styling module.
//!
//! Provides a single interface for all user-facing output: colored status
//! lines, section headers and the progress bar shown while moving entries.
//! The formatter writes to any [`Write`] so the interactive shell can be driven
//! against an in-memory buffer.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};

/// Writes styled lines to an output stream.
///
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
pub struct OutputFormatter<W: Write> {
    out: W,
}

impl OutputFormatter<io::Stdout> {
    /// Creates a formatter writing to standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> OutputFormatter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```
    /// use fileops::output::OutputFormatter;
    ///
    /// let mut output = OutputFormatter::new(Vec::new());
    /// output.success("Folder 'reports' created.").unwrap();
    /// assert!(String::from_utf8(output.into_inner()).unwrap().contains("reports"));
    /// ```
    pub fn success(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{} {}", "✓".green(), message)
    }

    /// Prints an error message in red with an X mark.
    pub fn error(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{} {}", "✗".red(), message)
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{} {}", "⚠".yellow(), message)
    }

    /// Prints an info message in cyan.
    pub fn info(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{}", message.cyan())
    }

    /// Prints a regular message without styling.
    pub fn plain(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{}", message)
    }

    /// Prints a section header preceded by a blank line.
    pub fn header(&mut self, header: &str) -> io::Result<()> {
        writeln!(self.out, "\n{}", header.bold())
    }

    /// Prints a prompt without a trailing newline and flushes it.
    pub fn prompt(&mut self, message: &str) -> io::Result<()> {
        write!(self.out, "{}", message)?;
        self.out.flush()
    }

    /// Prints one `label: count` row, with the count highlighted.
    pub fn count_row(&mut self, label: &str, count: usize) -> io::Result<()> {
        writeln!(self.out, "{} files: {}", label, count.to_string().green())
    }

    /// Consumes the formatter, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Creates a progress bar for entry moves.
///
/// The bar draws on stderr and stays hidden when stderr is not a terminal.
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    match ProgressStyle::default_bar()
        .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        Ok(style) => pb.set_style(style.progress_chars("█▓░")),
        Err(e) => tracing::debug!("progress bar template rejected: {}", e),
    }
    pb
}
