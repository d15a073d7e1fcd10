//! Naming convention of requirement property files
//!
//! A property file for requirement `N` is named `<prefix> <N><suffix>`, for
//! example `Requirement 12.mcf`. Discovery is looser: any file whose name
//! starts with the prefix and ends with the suffix is selected, so
//! `Requirement 3a.mcf` or `Requirements.mcf` are swept up as well.

use std::path::{Path, PathBuf};

use crate::domain::RequirementNumber;

/// The prefix/suffix pair identifying requirement files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePattern {
    prefix: String,
    suffix: String,
}

impl FilePattern {
    /// Create a pattern from a prefix and suffix.
    #[must_use]
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Returns the prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The conventional file name for a requirement number.
    #[must_use]
    pub fn file_name(&self, number: RequirementNumber) -> String {
        format!("{} {number}{}", self.prefix, self.suffix)
    }

    /// The conventional path of a requirement file inside `dir`.
    #[must_use]
    pub fn path_for(&self, dir: &Path, number: RequirementNumber) -> PathBuf {
        dir.join(self.file_name(number))
    }

    /// Whether a file name is selected by discovery.
    ///
    /// Names that are not valid UTF-8 never match.
    #[must_use]
    pub fn matches(&self, file_name: &std::ffi::OsStr) -> bool {
        file_name
            .to_str()
            .is_some_and(|name| name.starts_with(&self.prefix) && name.ends_with(&self.suffix))
    }
}
