//! The directory of requirement property files
//!
//! The [`PropertyDirectory`] resolves a batch selection into an ordered list
//! of existing property files. It never reads file contents; files are handed
//! to the build tool as opaque paths.

use std::{
    collections::BTreeSet,
    fs, io,
    path::{Path, PathBuf},
};

use tracing::instrument;
use walkdir::WalkDir;

use crate::{domain::RequirementNumber, storage::FilePattern};

/// A directory containing requirement property files.
#[derive(Debug, Clone)]
pub struct PropertyDirectory {
    /// The directory the property files are stored in.
    root: PathBuf,
    pattern: FilePattern,
}

/// Errors raised when the properties directory cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// The directory does not exist, or is not a directory.
    #[error("'{}' directory not found!", .0.display())]
    NotFound(PathBuf),

    /// The directory exists but its entries cannot be listed.
    #[error("Error accessing directory '{}'", path.display())]
    Unreadable {
        /// The directory that could not be read.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
}

/// The outcome of resolving requirement numbers against the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Paths of existing requirement files, in ascending number order.
    pub found: Vec<PathBuf>,
    /// Requested numbers without a backing file, in ascending order.
    pub missing: Vec<RequirementNumber>,
}

impl PropertyDirectory {
    /// Opens the properties directory at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::NotFound`] if `root` is not an existing
    /// directory, or [`DirectoryError::Unreadable`] if its entries cannot be
    /// listed.
    pub fn open(root: PathBuf, pattern: FilePattern) -> Result<Self, DirectoryError> {
        if !root.is_dir() {
            return Err(DirectoryError::NotFound(root));
        }
        if let Err(source) = fs::read_dir(&root) {
            return Err(DirectoryError::Unreadable { path: root, source });
        }
        Ok(Self { root, pattern })
    }

    /// Returns the directory path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the naming pattern of requirement files.
    #[must_use]
    pub const fn pattern(&self) -> &FilePattern {
        &self.pattern
    }

    /// Split requested numbers into existing files and missing numbers.
    ///
    /// Both lists follow the ascending order of the set.
    #[instrument(skip(self))]
    pub fn resolve(&self, numbers: &BTreeSet<RequirementNumber>) -> Resolution {
        let mut resolution = Resolution::default();
        for &number in numbers {
            let path = self.pattern.path_for(&self.root, number);
            if path.is_file() {
                tracing::debug!("Resolved requirement {number} to {}", path.display());
                resolution.found.push(path);
            } else {
                tracing::debug!("No file for requirement {number} at {}", path.display());
                resolution.missing.push(number);
            }
        }
        resolution
    }

    /// List every regular file in the directory matching the naming pattern.
    ///
    /// The scan is not recursive. Symbolic links are followed, and entries
    /// that cannot be inspected (such as dangling links) are skipped. The
    /// result is sorted lexicographically.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Unreadable`] if the directory itself cannot
    /// be listed.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn discover(&self) -> Result<Vec<PathBuf>, DirectoryError> {
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(DirectoryError::Unreadable {
                        path: self.root.clone(),
                        source: e.into(),
                    });
                }
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry: {e}");
                    continue;
                }
            };

            if entry.file_type().is_file() && self.pattern.matches(entry.file_name()) {
                files.push(entry.into_path());
            }
        }

        files.sort();
        tracing::debug!("Discovered {} property files", files.len());
        Ok(files)
    }
}
