use std::path::{Path, PathBuf};

use clap::{ArgAction, CommandFactory, error::ErrorKind};
use mcfrun::{Batch, BatchOutcome, Config, Console, OutputMode, ProcessRunner, Request};
use tracing::instrument;

/// Configuration file picked up from the working directory when present.
const DEFAULT_CONFIG: &str = ".mcfrun.toml";

/// Run the build tool for requirement property files.
///
/// Property files are named 'Requirement <N>.mcf' and live in the properties
/// directory. Each selected file is passed to the build tool together with
/// the target, the file's path and the verbosity setting.
#[derive(Debug, clap::Parser)]
#[command(name = "mcfrun", version, about, arg_required_else_help = true)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Forward VERBOSE=1 to the build tool
    #[arg(short, long)]
    verbose: bool,

    /// Process every 'Requirement*.mcf' file instead of explicit numbers
    #[arg(short, long)]
    all: bool,

    /// How build-tool output is handled [default: capture with --all, direct
    /// otherwise]
    #[arg(long, value_enum)]
    mode: Option<OutputMode>,

    /// Do not pass the VERBOSE parameter to the build tool
    #[arg(long)]
    no_verbose_param: bool,

    /// Directory containing the property files [default: properties]
    #[arg(long, value_name = "DIR")]
    properties: Option<PathBuf>,

    /// Build tool to invoke [default: make]
    #[arg(long, value_name = "PROGRAM")]
    tool: Option<String>,

    /// Configuration file [default: .mcfrun.toml, if present]
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the commands instead of running them
    #[arg(long)]
    dry_run: bool,

    /// Diagnostic logging (-d, -dd, -ddd)
    #[arg(short, long, action = ArgAction::Count)]
    debug: u8,

    /// Optional target (pbes, graph, pbesnoce, req) followed by requirement
    /// numbers
    #[arg(value_name = "TARGET|NUMBER")]
    tokens: Vec<String>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.debug);

        let config = self.load_config()?;

        let request = match Request::from_tokens(
            &self.tokens,
            self.all,
            self.verbose,
            config.default_target,
        ) {
            Ok(request) => request,
            Err(e) => Self::command().error(ErrorKind::ValueValidation, e).exit(),
        };

        self.dispatch(&request, &config)
    }

    #[instrument(skip(self, config))]
    fn dispatch(&self, request: &Request, config: &Config) -> anyhow::Result<()> {
        let mut console = Console::stdio();

        let outcome = Batch::new(request, config)
            .dry_run(self.dry_run)
            .run(ProcessRunner, &mut console)?;

        match outcome {
            BatchOutcome::NothingToDo => tracing::info!("Nothing to do"),
            BatchOutcome::Completed(report) => tracing::info!(
                succeeded = report.succeeded(),
                failed = report.failed(),
                missing = report.missing(),
                "Batch finished"
            ),
        }

        Ok(())
    }

    fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .map_err(|e| anyhow::anyhow!("{e} ({})", path.display()))?,
            None => load_default_config(Path::new(DEFAULT_CONFIG)),
        };

        if let Some(dir) = &self.properties {
            config.set_properties_dir(dir.clone());
        }
        if let Some(tool) = &self.tool {
            config.set_tool(tool.clone());
        }
        if let Some(mode) = self.mode {
            config.mode = Some(mode);
        }
        if self.no_verbose_param {
            config.verbose_param = false;
        }

        Ok(config)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        // stdout carries progress output
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

fn load_default_config(path: &Path) -> Config {
    if !path.exists() {
        return Config::default();
    }
    Config::load(path).unwrap_or_else(|e| {
        tracing::warn!("Ignoring {}: {e}", path.display());
        Config::default()
    })
}
