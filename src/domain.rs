//! Domain models for requirement dispatch.
//!
//! This module contains the pure types of the dispatcher: requirement
//! numbers, build targets, the parsed command-line request and the
//! configuration. Nothing in here touches the filesystem or spawns processes.

/// Requirement numbers and their parsing.
pub mod requirement;
pub use requirement::{Error as RequirementError, RequirementNumber};

/// Build-tool targets.
pub mod target;
pub use target::DispatchTarget;

/// The parsed command-line request.
pub mod request;
pub use request::{Request, Selection, UsageError};

mod config;
pub use config::Config;
