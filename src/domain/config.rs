use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::DispatchTarget;
use crate::dispatch::OutputMode;

/// Configuration for batch dispatch.
///
/// This struct holds the naming convention of property files, where to find
/// them, and how the external build tool is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// The directory holding the property files.
    ///
    /// Relative paths are resolved against the working directory.
    properties_dir: PathBuf,

    /// The file name prefix shared by all requirement files.
    ///
    /// A requirement file for number `N` is named `<prefix> <N><suffix>`.
    prefix: String,

    /// The file name suffix (including the extension dot).
    suffix: String,

    /// The build tool to invoke for every file.
    tool: String,

    /// The target used when the command line does not name one.
    pub default_target: DispatchTarget,

    /// Whether the `VERBOSE=<0|1>` parameter is passed to the build tool.
    pub verbose_param: bool,

    /// How output of the build tool is handled.
    ///
    /// When unset the mode follows the selection: discovery sweeps capture
    /// output and keep going, explicit numbers stream output and stop at the
    /// first failure.
    pub mode: Option<OutputMode>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            properties_dir: default_properties_dir(),
            prefix: default_prefix(),
            suffix: default_suffix(),
            tool: default_tool(),
            default_target: DispatchTarget::default(),
            verbose_param: true,
            mode: None,
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Returns the properties directory.
    #[must_use]
    pub fn properties_dir(&self) -> &Path {
        &self.properties_dir
    }

    /// Returns the requirement file name prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the requirement file name suffix.
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Returns the build tool program.
    #[must_use]
    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Sets the properties directory.
    pub fn set_properties_dir(&mut self, dir: PathBuf) {
        self.properties_dir = dir;
    }

    /// Sets the build tool program.
    pub fn set_tool(&mut self, tool: String) {
        self.tool = tool;
    }

    /// The output mode for a batch, falling back to the selection's natural
    /// mode when none is configured.
    #[must_use]
    pub fn mode_for(&self, discover: bool) -> OutputMode {
        self.mode.unwrap_or(if discover {
            OutputMode::Capture
        } else {
            OutputMode::Direct
        })
    }
}

fn default_properties_dir() -> PathBuf {
    PathBuf::from("properties")
}

fn default_prefix() -> String {
    "Requirement".to_string()
}

fn default_suffix() -> String {
    ".mcf".to_string()
}

fn default_tool() -> String {
    "make".to_string()
}

const fn default_true() -> bool {
    true
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_properties_dir")]
        properties_dir: PathBuf,

        #[serde(default = "default_prefix")]
        prefix: String,

        #[serde(default = "default_suffix")]
        suffix: String,

        #[serde(default = "default_tool")]
        tool: String,

        #[serde(default)]
        default_target: DispatchTarget,

        #[serde(default = "default_true")]
        verbose_param: bool,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        mode: Option<OutputMode>,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                properties_dir,
                prefix,
                suffix,
                tool,
                default_target,
                verbose_param,
                mode,
            } => Self {
                properties_dir,
                prefix,
                suffix,
                tool,
                default_target,
                verbose_param,
                mode,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            properties_dir: config.properties_dir,
            prefix: config.prefix,
            suffix: config.suffix,
            tool: config.tool,
            default_target: config.default_target,
            verbose_param: config.verbose_param,
            mode: config.mode,
        }
    }
}
