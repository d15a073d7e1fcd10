//! Operator-facing progress output.
//!
//! Progress lines go to the `out` stream, warnings and failure reports to
//! the `err` stream. The output is meant for humans and is not a stable
//! format.

use std::{
    io::{self, Write},
    path::Path,
};

use crate::{
    dispatch::{Completion, Invocation, Report},
    domain::RequirementNumber,
    terminal::{self, Colorize},
};

/// A pair of output streams with optional colouring.
#[derive(Debug)]
pub struct Console<O, E> {
    out: O,
    err: E,
    color: bool,
    width: usize,
}

impl Console<io::StdoutLock<'static>, io::StderrLock<'static>> {
    /// A console on the process's standard streams, coloured when stdout
    /// supports it.
    #[must_use]
    pub fn stdio() -> Self {
        Self {
            out: io::stdout().lock(),
            err: io::stderr().lock(),
            color: terminal::supports_color(),
            width: terminal::delimiter_width(),
        }
    }
}

impl<O: Write, E: Write> Console<O, E> {
    /// An uncoloured console writing to the given streams.
    pub const fn plain(out: O, err: E) -> Self {
        Self {
            out,
            err,
            color: false,
            width: terminal::MAX_DELIMITER_WIDTH,
        }
    }

    /// Consume the console, returning the underlying streams.
    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }

    fn paint(&self, text: &str, style: fn(&str) -> String) -> String {
        if self.color {
            style(text)
        } else {
            text.to_string()
        }
    }

    /// Flush both streams.
    ///
    /// # Errors
    ///
    /// Returns an error if either stream fails to flush.
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()?;
        self.err.flush()
    }

    /// Print a delimiter line.
    ///
    /// # Errors
    ///
    /// Returns an error if the output stream cannot be written.
    pub fn delimiter(&mut self) -> io::Result<()> {
        let line = self.paint(&"-".repeat(self.width), str::dim);
        writeln!(self.out, "{line}")
    }

    /// Announce a discovery sweep.
    ///
    /// # Errors
    ///
    /// Returns an error if the output stream cannot be written.
    pub fn searching(&mut self, dir: &Path, prefix: &str) -> io::Result<()> {
        writeln!(
            self.out,
            "Searching for property files in '{}/' starting with '{prefix}'...",
            dir.display()
        )
    }

    /// Report a discovery sweep that found nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the output stream cannot be written.
    pub fn nothing_found(&mut self, dir: &Path, prefix: &str, suffix: &str) -> io::Result<()> {
        writeln!(
            self.out,
            "No '{prefix}*{suffix}' files found in '{}/'.",
            dir.display()
        )?;
        writeln!(self.out, "Nothing to do.")
    }

    /// Warn about a requested requirement without a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the error stream cannot be written.
    pub fn missing(&mut self, number: RequirementNumber, path: &Path) -> io::Result<()> {
        let text = format!(
            "Warning: requirement {number} not found ('{}'), skipping.",
            path.display()
        );
        let text = self.paint(&text, str::warning);
        writeln!(self.err, "{text}")
    }

    /// Announce the file about to be dispatched.
    ///
    /// # Errors
    ///
    /// Returns an error if the output stream cannot be written.
    pub fn processing(&mut self, path: &Path) -> io::Result<()> {
        writeln!(self.out, "Processing property file: '{}'", path.display())
    }

    /// Show the invocation a dry run would execute.
    ///
    /// # Errors
    ///
    /// Returns an error if the output stream cannot be written.
    pub fn would_run(&mut self, invocation: &Invocation) -> io::Result<()> {
        let text = self.paint(&format!("Would run: {invocation}"), str::dim);
        writeln!(self.out, "{text}")
    }

    /// Forward the captured output of a successful run.
    ///
    /// # Errors
    ///
    /// Returns an error if either stream cannot be written.
    pub fn captured(&mut self, completion: &Completion) -> io::Result<()> {
        let stdout = completion.stdout.trim();
        if !stdout.is_empty() {
            writeln!(self.out, "{stdout}")?;
        }
        let stderr = completion.stderr.trim();
        if !stderr.is_empty() {
            writeln!(self.err, "{stderr}")?;
        }
        Ok(())
    }

    /// Confirm a successfully processed file.
    ///
    /// # Errors
    ///
    /// Returns an error if the output stream cannot be written.
    pub fn succeeded(&mut self, path: &Path) -> io::Result<()> {
        let text = self.paint(
            &format!("Successfully processed '{}'.", path.display()),
            str::success,
        );
        writeln!(self.out, "{text}")
    }

    /// Report a failed run together with everything it printed.
    ///
    /// # Errors
    ///
    /// Returns an error if the error stream cannot be written.
    pub fn failure_report(
        &mut self,
        invocation: &Invocation,
        path: &Path,
        completion: &Completion,
    ) -> io::Result<()> {
        let headline = self.paint(
            &format!(
                "Error: '{}' failed for '{}' ({}).",
                invocation.short(),
                path.display(),
                completion.status()
            ),
            str::error,
        );
        writeln!(self.err, "{headline}")?;
        writeln!(self.err, "Command: {invocation}")?;
        let stdout = completion.stdout.trim();
        if !stdout.is_empty() {
            writeln!(self.err, "Stdout:\n{stdout}")?;
        }
        let stderr = completion.stderr.trim();
        if !stderr.is_empty() {
            writeln!(self.err, "Stderr:\n{stderr}")?;
        }
        Ok(())
    }

    /// Report a run that could not be started.
    ///
    /// # Errors
    ///
    /// Returns an error if the error stream cannot be written.
    pub fn spawn_failure(
        &mut self,
        invocation: &Invocation,
        path: &Path,
        error: &dyn std::error::Error,
    ) -> io::Result<()> {
        let mut text = format!(
            "Error: could not run '{}' for '{}': {error}",
            invocation.short(),
            path.display()
        );
        let mut cause = error.source();
        while let Some(inner) = cause {
            text.push_str(": ");
            text.push_str(&inner.to_string());
            cause = inner.source();
        }
        let text = self.paint(&text, str::error);
        writeln!(self.err, "{text}")
    }

    /// Print the closing summary of a batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the output stream cannot be written.
    pub fn summary(&mut self, report: &Report) -> io::Result<()> {
        let mut parts = vec![
            format!("{} succeeded", report.succeeded()),
            format!("{} failed", report.failed()),
            format!("{} missing", report.missing()),
        ];
        if report.skipped() > 0 {
            parts.push(format!("{} skipped", report.skipped()));
        }
        let text = format!("Finished: {}.", parts.join(", "));
        let text = if report.is_success() {
            self.paint(&text, str::success)
        } else {
            self.paint(&text, str::warning)
        };
        writeln!(self.out, "{text}")
    }
}
