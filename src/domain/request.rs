use std::collections::BTreeSet;

use super::{DispatchTarget, RequirementError, RequirementNumber};

/// How the property files of a batch are selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every file in the properties directory matching the naming pattern.
    Discover,
    /// The files of explicitly requested requirement numbers.
    ///
    /// Numbers are held in a set, so duplicates collapse and iteration is
    /// ascending.
    ByNumber(BTreeSet<RequirementNumber>),
}

impl Selection {
    /// Returns `true` for discovery (sweep) mode.
    #[must_use]
    pub const fn is_discover(&self) -> bool {
        matches!(self, Self::Discover)
    }
}

/// A fully interpreted command-line request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The build-tool target to invoke for every file.
    pub target: DispatchTarget,
    /// Whether to forward `VERBOSE=1` to the build tool.
    pub verbose: bool,
    /// Which files to dispatch.
    pub selection: Selection,
}

/// Errors in the positional arguments.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UsageError {
    /// Nothing left to dispatch once the target token was consumed.
    #[error("no requirement numbers given (pass one or more numbers, or --all)")]
    NoRequirements,

    /// A remaining token is not a requirement number.
    #[error(transparent)]
    InvalidNumber(#[from] RequirementError),

    /// Requirement numbers cannot be combined with discovery mode.
    #[error("requirement numbers cannot be combined with --all (got: {})", .0.join(" "))]
    NumbersWithDiscovery(Vec<String>),
}

impl Request {
    /// Interpret the positional tokens of the command line.
    ///
    /// If the first token names a [`DispatchTarget`] it is consumed as the
    /// target, otherwise `default_target` is used. The remaining tokens are
    /// requirement numbers, or must be absent when `discover` is set.
    ///
    /// # Errors
    ///
    /// Returns a [`UsageError`] if
    ///
    /// - no numbers remain and `discover` is not set
    /// - any remaining token is not a non-negative integer
    /// - numbers are given together with `discover`
    pub fn from_tokens<S: AsRef<str>>(
        tokens: &[S],
        discover: bool,
        verbose: bool,
        default_target: DispatchTarget,
    ) -> Result<Self, UsageError> {
        let (target, rest) = tokens
            .split_first()
            .and_then(|(first, rest)| {
                first
                    .as_ref()
                    .parse::<DispatchTarget>()
                    .ok()
                    .map(|target| (target, rest))
            })
            .unwrap_or((default_target, tokens));

        let selection = if discover {
            if !rest.is_empty() {
                return Err(UsageError::NumbersWithDiscovery(
                    rest.iter().map(|s| s.as_ref().to_string()).collect(),
                ));
            }
            Selection::Discover
        } else {
            if rest.is_empty() {
                return Err(UsageError::NoRequirements);
            }
            let numbers = rest
                .iter()
                .map(|token| token.as_ref().parse::<RequirementNumber>())
                .collect::<Result<BTreeSet<_>, _>>()?;
            Selection::ByNumber(numbers)
        };

        tracing::debug!(%target, verbose, ?selection, "Parsed request");

        Ok(Self {
            target,
            verbose,
            selection,
        })
    }
}
