//! The batch routine: resolve the selection, dispatch, report.

use std::io;

use nonempty::NonEmpty;
use tracing::instrument;

use crate::{
    Config,
    console::Console,
    dispatch::{DispatchError, Dispatcher, Outcome, OutputMode, Report, Runner},
    domain::{Request, RequirementNumber, Selection},
    storage::{DirectoryError, FilePattern, PropertyDirectory},
};

/// How a batch ended, when it did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// A discovery sweep found no matching files.
    NothingToDo,
    /// Files were dispatched; the report holds one record per file.
    Completed(Report),
}

/// Errors that end a batch with a non-zero exit status.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// The properties directory is missing or unreadable.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// None of the requested requirement numbers has a file.
    #[error("No valid requirement files to process (missing: {})", join(.missing))]
    NoValidTargets {
        /// The requested numbers, none of which has a file.
        missing: Vec<RequirementNumber>,
    },

    /// Dispatch was aborted.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Progress output could not be written.
    #[error("failed to write output")]
    Output(#[from] io::Error),
}

fn join(numbers: &[RequirementNumber]) -> String {
    numbers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A configured batch, ready to run.
#[derive(Debug)]
pub struct Batch<'a> {
    request: &'a Request,
    config: &'a Config,
    mode: OutputMode,
    dry_run: bool,
}

impl<'a> Batch<'a> {
    /// Prepare a batch for a request.
    ///
    /// The output mode comes from the configuration, or follows the
    /// selection if none is configured.
    #[must_use]
    pub fn new(request: &'a Request, config: &'a Config) -> Self {
        Self {
            request,
            config,
            mode: config.mode_for(request.selection.is_discover()),
            dry_run: false,
        }
    }

    /// Print invocations instead of running them.
    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Returns the output mode the batch will use.
    #[must_use]
    pub const fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Resolve the selection and dispatch every resolved file.
    ///
    /// Requested numbers without a file are warned about and recorded as
    /// missing. A discovery sweep that finds nothing is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if
    ///
    /// - the properties directory does not exist or cannot be read
    /// - no requested number has a file
    /// - dispatch is aborted (see [`Dispatcher::dispatch`])
    /// - progress output cannot be written
    #[instrument(skip_all, fields(target = %self.request.target, mode = ?self.mode))]
    pub fn run<R, O, E>(
        self,
        runner: R,
        console: &mut Console<O, E>,
    ) -> Result<BatchOutcome, BatchError>
    where
        R: Runner,
        O: io::Write,
        E: io::Write,
    {
        let directory = PropertyDirectory::open(
            self.config.properties_dir().to_path_buf(),
            FilePattern::new(self.config.prefix(), self.config.suffix()),
        )?;

        let mut report = Report::default();

        let files = match &self.request.selection {
            Selection::Discover => {
                console.searching(directory.root(), self.config.prefix())?;
                let files = directory.discover()?;
                let Some(files) = NonEmpty::from_vec(files) else {
                    console.nothing_found(
                        directory.root(),
                        self.config.prefix(),
                        self.config.suffix(),
                    )?;
                    tracing::info!("No property files found, nothing to do");
                    return Ok(BatchOutcome::NothingToDo);
                };
                files
            }
            Selection::ByNumber(numbers) => {
                let resolution = directory.resolve(numbers);
                for &number in &resolution.missing {
                    let path = directory.pattern().path_for(directory.root(), number);
                    console.missing(number, &path)?;
                    report.record(path, Outcome::Missing);
                }
                NonEmpty::from_vec(resolution.found).ok_or(BatchError::NoValidTargets {
                    missing: resolution.missing,
                })?
            }
        };

        tracing::info!("Dispatching {} property files", files.len());

        let verbose = self.config.verbose_param.then_some(self.request.verbose);
        let mut dispatcher = Dispatcher::new(
            runner,
            self.config.tool(),
            self.request.target,
            self.mode,
        )
        .verbose(verbose)
        .dry_run(self.dry_run);

        report.append(dispatcher.dispatch(&files, console)?);

        console.delimiter()?;
        console.summary(&report)?;

        Ok(BatchOutcome::Completed(report))
    }
}
