//! Test doubles shared by unit tests.

use std::{collections::HashMap, io};

use crate::dispatch::{Completion, Invocation, OutputMode, RunError, Runner};

/// A [`Runner`] that records invocations and answers from a script.
///
/// Every file succeeds unless registered with [`Self::fail`] or
/// [`Self::spawn_error`].
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    failures: HashMap<String, i32>,
    unstartable: Vec<String>,
    tool_missing: bool,
    invocations: Vec<(Invocation, OutputMode)>,
}

impl ScriptedRunner {
    /// Make the file with the given name exit with `code`.
    pub fn fail(mut self, file_name: &str, code: i32) -> Self {
        self.failures.insert(file_name.to_string(), code);
        self
    }

    /// Make the file with the given name fail to start, as if the build
    /// tool were not executable.
    pub fn spawn_error(mut self, file_name: &str) -> Self {
        self.unstartable.push(file_name.to_string());
        self
    }

    /// Behave as if the build tool is not installed.
    pub fn tool_missing(mut self) -> Self {
        self.tool_missing = true;
        self
    }

    /// Every recorded invocation with the mode it was run in.
    pub fn invocations(&self) -> &[(Invocation, OutputMode)] {
        &self.invocations
    }

    /// The `PROPERTY_FILE` of every recorded invocation, in order.
    pub fn dispatched_files(&self) -> Vec<String> {
        self.invocations
            .iter()
            .filter_map(|(invocation, _)| property_file(invocation))
            .map(str::to_string)
            .collect()
    }
}

fn property_file(invocation: &Invocation) -> Option<&str> {
    invocation
        .args()
        .iter()
        .find_map(|arg| arg.strip_prefix("PROPERTY_FILE="))
}

impl Runner for ScriptedRunner {
    fn run(&mut self, invocation: &Invocation, mode: OutputMode) -> Result<Completion, RunError> {
        self.invocations.push((invocation.clone(), mode));

        if self.tool_missing {
            return Err(RunError::NotFound {
                program: invocation.program().to_string(),
            });
        }

        if property_file(invocation).is_some_and(|file| {
            self.unstartable
                .iter()
                .any(|name| file.ends_with(name.as_str()))
        }) {
            return Err(RunError::Io {
                program: invocation.program().to_string(),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            });
        }

        let failure = property_file(invocation).and_then(|file| {
            self.failures
                .iter()
                .find(|(name, _)| file.ends_with(name.as_str()))
                .map(|(_, code)| *code)
        });

        Ok(failure.map_or_else(Completion::success, |code| Completion {
            code: Some(code),
            stdout: format!("checking {}", property_file(invocation).unwrap_or_default()),
            stderr: "error: property violated".to_string(),
        }))
    }
}
