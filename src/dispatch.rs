//! Sequential dispatch of property files to the external build tool.
//!
//! Every file becomes one invocation of the form
//! `<tool> <target> PROPERTY_FILE=<path> [VERBOSE=<0|1>]`. Files are run
//! strictly one after another; each child process is waited for before the
//! next one starts.
//!
//! Two output modes exist:
//!
//! - [`OutputMode::Capture`] collects the child's output, prints it after the
//!   fact, and records failures without stopping the batch.
//! - [`OutputMode::Direct`] lets the child inherit the standard streams and
//!   aborts the batch at the first failure.
//!
//! A missing build tool aborts the batch in either mode.

use std::{
    fmt, io,
    path::{Path, PathBuf},
    process,
};

use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{console::Console, domain::DispatchTarget};

/// How the build tool's output is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Capture stdout and stderr, report failures and continue.
    Capture,
    /// Stream output live and stop at the first failure.
    Direct,
}

/// A single command line to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
}

impl Invocation {
    /// Start an invocation of `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Returns the program name.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Returns the arguments.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The program and its first argument, e.g. `make pbes`.
    #[must_use]
    pub fn short(&self) -> String {
        self.args.first().map_or_else(
            || self.program.clone(),
            |first| format!("{} {first}", self.program),
        )
    }
}

impl fmt::Display for Invocation {
    /// Formats the command line, single-quoting words that contain
    /// whitespace.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_word(f, &self.program)?;
        for arg in &self.args {
            f.write_str(" ")?;
            write_word(f, arg)?;
        }
        Ok(())
    }
}

fn write_word(f: &mut fmt::Formatter, word: &str) -> fmt::Result {
    if word.is_empty() || word.contains(char::is_whitespace) {
        write!(f, "'{word}'")
    } else {
        f.write_str(word)
    }
}

/// The result of a child process that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    /// The exit code, or `None` if the process was terminated by a signal.
    pub code: Option<i32>,
    /// Captured standard output (empty in direct mode).
    pub stdout: String,
    /// Captured standard error (empty in direct mode).
    pub stderr: String,
}

impl Completion {
    /// A successful completion without output.
    #[must_use]
    pub fn success() -> Self {
        Self {
            code: Some(0),
            ..Self::default()
        }
    }

    /// Whether the process exited with status zero.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.code, Some(0))
    }

    /// A human-readable description of how the process ended.
    #[must_use]
    pub fn status(&self) -> String {
        describe_exit(self.code)
    }
}

fn describe_exit(code: Option<i32>) -> String {
    code.map_or_else(
        || "terminated by signal".to_string(),
        |code| format!("exit status {code}"),
    )
}

/// Errors starting a child process.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The program could not be found.
    #[error("'{program}' command not found")]
    NotFound {
        /// The program that was looked up.
        program: String,
    },

    /// The program was found but could not be started.
    #[error("failed to start '{program}'")]
    Io {
        /// The program that failed to start.
        program: String,
        /// The underlying error.
        source: io::Error,
    },
}

/// Executes invocations.
///
/// [`ProcessRunner`] is the real implementation; tests substitute scripted
/// runners.
pub trait Runner {
    /// Run an invocation to completion.
    ///
    /// In [`OutputMode::Capture`] the returned [`Completion`] carries the
    /// child's output; in [`OutputMode::Direct`] the child writes straight to
    /// the inherited streams.
    ///
    /// # Errors
    ///
    /// Returns a [`RunError`] if the process cannot be started.
    fn run(&mut self, invocation: &Invocation, mode: OutputMode) -> Result<Completion, RunError>;
}

impl<R: Runner + ?Sized> Runner for &mut R {
    fn run(&mut self, invocation: &Invocation, mode: OutputMode) -> Result<Completion, RunError> {
        (**self).run(invocation, mode)
    }
}

/// Runs invocations as child processes of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl Runner for ProcessRunner {
    #[instrument(skip(self), fields(command = %invocation))]
    fn run(&mut self, invocation: &Invocation, mode: OutputMode) -> Result<Completion, RunError> {
        let mut command = process::Command::new(invocation.program());
        command.args(invocation.args());

        let spawn_error = |source: io::Error| {
            let program = invocation.program().to_string();
            if source.kind() == io::ErrorKind::NotFound {
                RunError::NotFound { program }
            } else {
                RunError::Io { program, source }
            }
        };

        let completion = match mode {
            OutputMode::Capture => {
                let output = command.output().map_err(spawn_error)?;
                Completion {
                    code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                }
            }
            OutputMode::Direct => {
                let status = command.status().map_err(spawn_error)?;
                Completion {
                    code: status.code(),
                    ..Completion::default()
                }
            }
        };

        tracing::debug!(code = ?completion.code, "Child process finished");
        Ok(completion)
    }
}

/// What happened to one requested file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The build tool exited with status zero.
    Succeeded,
    /// The build tool failed or could not be started.
    Failed {
        /// The exit code, if the process ran and exited normally.
        code: Option<i32>,
    },
    /// The requested requirement has no file; nothing was dispatched.
    Missing,
    /// Not executed because of a dry run.
    Skipped,
}

/// The outcome of one file in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// The property file (for missing requirements, its conventional path).
    pub path: PathBuf,
    /// What happened to it.
    pub outcome: Outcome,
}

/// Outcomes of a batch, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    records: Vec<Record>,
}

impl Report {
    /// Append an outcome.
    pub fn record(&mut self, path: PathBuf, outcome: Outcome) {
        self.records.push(Record { path, outcome });
    }

    /// Append every record of another report.
    pub fn append(&mut self, other: Self) {
        self.records.extend(other.records);
    }

    /// Returns all records.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    fn count(&self, predicate: impl Fn(&Outcome) -> bool) -> usize {
        self.records.iter().filter(|r| predicate(&r.outcome)).count()
    }

    /// Number of successfully processed files.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Succeeded))
    }

    /// Number of failed files.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. }))
    }

    /// Number of requested requirements without a file.
    #[must_use]
    pub fn missing(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Missing))
    }

    /// Number of files skipped by a dry run.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped))
    }

    /// Whether nothing failed and nothing was missing.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.missing() == 0
    }
}

/// Errors that abort a batch.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The build tool is not installed or not on the search path.
    #[error("'{tool}' command not found. Please ensure '{tool}' is installed and in your PATH.")]
    ToolNotFound {
        /// The build tool that was looked up.
        tool: String,
    },

    /// A file failed in direct mode.
    #[error("'{command}' failed for '{}' ({})", path.display(), describe_exit(*code))]
    Failed {
        /// The short form of the failed command.
        command: String,
        /// The property file being processed.
        path: PathBuf,
        /// The exit code, or `None` if terminated by a signal.
        code: Option<i32>,
    },

    /// The build tool could not be started in direct mode.
    #[error("could not run '{command}' for '{}'", path.display())]
    Spawn {
        /// The short form of the command.
        command: String,
        /// The property file being processed.
        path: PathBuf,
        /// The underlying error.
        source: RunError,
    },

    /// Progress output could not be written.
    #[error("failed to write output")]
    Output(#[from] io::Error),
}

/// Dispatches property files to the build tool one at a time.
#[derive(Debug)]
pub struct Dispatcher<R> {
    runner: R,
    tool: String,
    target: DispatchTarget,
    verbose: Option<bool>,
    mode: OutputMode,
    dry_run: bool,
}

impl<R: Runner> Dispatcher<R> {
    /// Create a dispatcher invoking `tool` with `target`.
    ///
    /// The `VERBOSE` parameter is omitted until [`Self::verbose`] is called.
    pub fn new(
        runner: R,
        tool: impl Into<String>,
        target: DispatchTarget,
        mode: OutputMode,
    ) -> Self {
        Self {
            runner,
            tool: tool.into(),
            target,
            verbose: None,
            mode,
            dry_run: false,
        }
    }

    /// Pass `VERBOSE=<0|1>` to the build tool, or omit it with `None`.
    #[must_use]
    pub const fn verbose(mut self, verbose: Option<bool>) -> Self {
        self.verbose = verbose;
        self
    }

    /// Print invocations instead of running them.
    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Consume the dispatcher, returning its runner.
    pub fn into_runner(self) -> R {
        self.runner
    }

    /// The command line used for a property file.
    #[must_use]
    pub fn invocation(&self, file: &Path) -> Invocation {
        let invocation = Invocation::new(&self.tool)
            .arg(self.target.as_str())
            .arg(format!("PROPERTY_FILE={}", file.display()));
        match self.verbose {
            Some(verbose) => invocation.arg(format!("VERBOSE={}", u8::from(verbose))),
            None => invocation,
        }
    }

    /// Dispatch every file in order.
    ///
    /// # Errors
    ///
    /// Returns an error, without processing the remaining files, if
    ///
    /// - the build tool cannot be found
    /// - in direct mode, a file fails or the tool cannot be started
    /// - progress output cannot be written
    #[instrument(skip_all, fields(target = %self.target, mode = ?self.mode, files = files.len()))]
    pub fn dispatch<O: io::Write, E: io::Write>(
        &mut self,
        files: &NonEmpty<PathBuf>,
        console: &mut Console<O, E>,
    ) -> Result<Report, DispatchError> {
        let mut report = Report::default();

        for file in files.iter() {
            console.delimiter()?;
            console.processing(file)?;
            let invocation = self.invocation(file);

            if self.dry_run {
                console.would_run(&invocation)?;
                report.record(file.clone(), Outcome::Skipped);
                continue;
            }

            console.flush()?;
            let outcome = self.dispatch_one(file, &invocation, console)?;
            report.record(file.clone(), outcome);
        }

        Ok(report)
    }

    fn dispatch_one<O: io::Write, E: io::Write>(
        &mut self,
        file: &Path,
        invocation: &Invocation,
        console: &mut Console<O, E>,
    ) -> Result<Outcome, DispatchError> {
        match self.runner.run(invocation, self.mode) {
            Ok(completion) if completion.is_success() => {
                if self.mode == OutputMode::Capture {
                    console.captured(&completion)?;
                }
                console.succeeded(file)?;
                tracing::info!("Processed {}", file.display());
                Ok(Outcome::Succeeded)
            }
            Ok(completion) => match self.mode {
                OutputMode::Capture => {
                    console.failure_report(invocation, file, &completion)?;
                    tracing::warn!("{} failed: {}", file.display(), completion.status());
                    Ok(Outcome::Failed {
                        code: completion.code,
                    })
                }
                OutputMode::Direct => Err(DispatchError::Failed {
                    command: invocation.short(),
                    path: file.to_path_buf(),
                    code: completion.code,
                }),
            },
            Err(RunError::NotFound { .. }) => Err(DispatchError::ToolNotFound {
                tool: self.tool.clone(),
            }),
            Err(source) => match self.mode {
                OutputMode::Capture => {
                    console.spawn_failure(invocation, file, &source)?;
                    Ok(Outcome::Failed { code: None })
                }
                OutputMode::Direct => Err(DispatchError::Spawn {
                    command: invocation.short(),
                    path: file.to_path_buf(),
                    source,
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use nonempty::nonempty;

    use super::*;
    use crate::testing::ScriptedRunner;

    fn files(names: &[&str]) -> NonEmpty<PathBuf> {
        NonEmpty::from_vec(
            names
                .iter()
                .map(|name| Path::new("properties").join(name))
                .collect(),
        )
        .unwrap()
    }

    fn console() -> Console<Vec<u8>, Vec<u8>> {
        Console::plain(Vec::new(), Vec::new())
    }

    #[test]
    fn invocation_includes_verbose_when_enabled() {
        let dispatcher = Dispatcher::new(
            ScriptedRunner::default(),
            "make",
            DispatchTarget::Graph,
            OutputMode::Direct,
        )
        .verbose(Some(true));

        let invocation = dispatcher.invocation(Path::new("properties/Requirement 3.mcf"));

        assert_eq!(invocation.program(), "make");
        assert_eq!(
            invocation.args(),
            ["graph", "PROPERTY_FILE=properties/Requirement 3.mcf", "VERBOSE=1"]
        );
    }

    #[test]
    fn invocation_omits_verbose_when_unsupported() {
        let dispatcher = Dispatcher::new(
            ScriptedRunner::default(),
            "make",
            DispatchTarget::Req,
            OutputMode::Capture,
        );

        let invocation = dispatcher.invocation(Path::new("p/Requirement 1.mcf"));

        assert_eq!(invocation.args(), ["req", "PROPERTY_FILE=p/Requirement 1.mcf"]);
        assert_eq!(invocation.to_string(), "make req 'PROPERTY_FILE=p/Requirement 1.mcf'");
    }

    #[test]
    fn verbose_defaults_to_zero_when_forwarded() {
        let dispatcher = Dispatcher::new(
            ScriptedRunner::default(),
            "make",
            DispatchTarget::Pbes,
            OutputMode::Direct,
        )
        .verbose(Some(false));

        let invocation = dispatcher.invocation(Path::new("Requirement 1.mcf"));
        assert_eq!(invocation.args().last().unwrap(), "VERBOSE=0");
    }

    #[test]
    fn capture_mode_continues_after_failure() {
        let runner = ScriptedRunner::default().fail("Requirement 1.mcf", 2);
        let mut dispatcher =
            Dispatcher::new(runner, "make", DispatchTarget::Req, OutputMode::Capture);
        let mut console = console();

        let report = dispatcher
            .dispatch(&files(&["Requirement 1.mcf", "Requirement 2.mcf"]), &mut console)
            .unwrap();

        assert_eq!(report.failed(), 1);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.records()[0].outcome, Outcome::Failed { code: Some(2) });
        assert_eq!(dispatcher.into_runner().dispatched_files().len(), 2);

        let (out, err) = console.into_inner();
        let out = String::from_utf8(out).unwrap();
        let err = String::from_utf8(err).unwrap();
        assert!(err.contains("Error: 'make req' failed for 'properties/Requirement 1.mcf'"));
        assert!(out.contains("Successfully processed 'properties/Requirement 2.mcf'."));
    }

    #[test]
    fn direct_mode_aborts_on_first_failure() {
        let runner = ScriptedRunner::default().fail("Requirement 1.mcf", 1);
        let mut dispatcher =
            Dispatcher::new(runner, "make", DispatchTarget::Pbes, OutputMode::Direct);
        let mut console = console();

        let error = dispatcher
            .dispatch(&files(&["Requirement 1.mcf", "Requirement 2.mcf"]), &mut console)
            .unwrap_err();

        assert!(matches!(error, DispatchError::Failed { code: Some(1), .. }));
        assert_eq!(
            dispatcher.into_runner().dispatched_files(),
            ["properties/Requirement 1.mcf"]
        );
    }

    #[test]
    fn missing_tool_aborts_even_in_capture_mode() {
        let runner = ScriptedRunner::default().tool_missing();
        let mut dispatcher =
            Dispatcher::new(runner, "gmake", DispatchTarget::Pbes, OutputMode::Capture);
        let mut console = console();

        let error = dispatcher
            .dispatch(&files(&["Requirement 1.mcf", "Requirement 2.mcf"]), &mut console)
            .unwrap_err();

        assert!(matches!(error, DispatchError::ToolNotFound { ref tool } if tool == "gmake"));
        assert_eq!(dispatcher.into_runner().dispatched_files().len(), 1);
    }

    #[test]
    fn announces_each_file_after_a_delimiter() {
        let mut dispatcher = Dispatcher::new(
            ScriptedRunner::default(),
            "make",
            DispatchTarget::Pbes,
            OutputMode::Direct,
        );
        let mut console = console();

        dispatcher
            .dispatch(&nonempty![PathBuf::from("properties/Requirement 4.mcf")], &mut console)
            .unwrap();

        let (out, _) = console.into_inner();
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].chars().all(|c| c == '-'));
        assert_eq!(lines[1], "Processing property file: 'properties/Requirement 4.mcf'");
    }

    #[test]
    fn dry_run_executes_nothing() {
        let mut dispatcher = Dispatcher::new(
            ScriptedRunner::default(),
            "make",
            DispatchTarget::Pbes,
            OutputMode::Direct,
        )
        .dry_run(true);
        let mut console = console();

        let report = dispatcher
            .dispatch(&files(&["Requirement 1.mcf"]), &mut console)
            .unwrap();

        assert_eq!(report.skipped(), 1);
        assert!(dispatcher.into_runner().dispatched_files().is_empty());
        let (out, _) = console.into_inner();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Would run: make pbes 'PROPERTY_FILE=properties/Requirement 1.mcf'"));
    }

    #[test]
    fn capture_mode_records_unstartable_tool_and_continues() {
        let runner = ScriptedRunner::default().spawn_error("Requirement 1.mcf");
        let mut dispatcher =
            Dispatcher::new(runner, "./noexec", DispatchTarget::Pbes, OutputMode::Capture);
        let mut console = console();

        let report = dispatcher
            .dispatch(&files(&["Requirement 1.mcf", "Requirement 2.mcf"]), &mut console)
            .unwrap();

        assert_eq!(report.records()[0].outcome, Outcome::Failed { code: None });
        assert_eq!(report.succeeded(), 1);
        assert_eq!(
            dispatcher.into_runner().dispatched_files(),
            ["properties/Requirement 1.mcf", "properties/Requirement 2.mcf"]
        );

        let (_, err) = console.into_inner();
        let err = String::from_utf8(err).unwrap();
        assert!(err.contains(
            "Error: could not run './noexec pbes' for 'properties/Requirement 1.mcf': \
             failed to start './noexec': permission denied"
        ));
    }

    #[test]
    fn direct_mode_aborts_when_tool_cannot_start() {
        let runner = ScriptedRunner::default().spawn_error("Requirement 1.mcf");
        let mut dispatcher =
            Dispatcher::new(runner, "./noexec", DispatchTarget::Pbes, OutputMode::Direct);
        let mut console = console();

        let error = dispatcher
            .dispatch(&files(&["Requirement 1.mcf", "Requirement 2.mcf"]), &mut console)
            .unwrap_err();

        assert!(matches!(
            error,
            DispatchError::Spawn {
                source: RunError::Io { .. },
                ..
            }
        ));
        assert_eq!(
            error.to_string(),
            "could not run './noexec pbes' for 'properties/Requirement 1.mcf'"
        );
        let cause = std::error::Error::source(&error).unwrap();
        assert_eq!(cause.to_string(), "failed to start './noexec'");
        assert_eq!(
            dispatcher.into_runner().dispatched_files(),
            ["properties/Requirement 1.mcf"]
        );
    }
}
