//! Batch dispatch of model-checker requirement files
//!
//! Requirement properties are `.mcf` files named `Requirement <N>.mcf` in a
//! properties directory. This crate selects those files, either by number or
//! by sweeping the directory, and hands each one to an external build tool
//! (`make <target> PROPERTY_FILE=<path>`), one at a time.

pub mod domain;
pub use domain::{Config, DispatchTarget, Request, RequirementNumber, Selection, UsageError};

/// Property file lookup in the properties directory.
pub mod storage;
pub use storage::{DirectoryError, FilePattern, PropertyDirectory, Resolution};

pub mod dispatch;
pub use dispatch::{
    Completion, DispatchError, Dispatcher, Invocation, Outcome, OutputMode, ProcessRunner, Report,
    RunError, Runner,
};

pub mod batch;
pub use batch::{Batch, BatchError, BatchOutcome};

pub mod console;
pub use console::Console;

pub mod terminal;

#[cfg(test)]
mod testing;
