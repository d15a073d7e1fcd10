use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// A target of the external build tool.
///
/// Each property file is handed to the build tool as
/// `<tool> <target> PROPERTY_FILE=<path>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchTarget {
    /// Generate and solve the PBES for the property (the toolchain's primary
    /// target).
    #[default]
    Pbes,
    /// Render the state-space graph.
    Graph,
    /// Generate and solve the PBES without counter-example generation.
    Pbesnoce,
    /// Check the requirement.
    Req,
}

impl DispatchTarget {
    /// All known targets, in the order they are listed in help text.
    pub const ALL: [Self; 4] = [Self::Pbes, Self::Graph, Self::Pbesnoce, Self::Req];

    /// The name the build tool knows this target by.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pbes => "pbes",
            Self::Graph => "graph",
            Self::Pbesnoce => "pbesnoce",
            Self::Req => "req",
        }
    }
}

impl fmt::Display for DispatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a token does not name a known target.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown target '{0}': expected one of pbes, graph, pbesnoce, req")]
pub struct UnknownTargetError(String);

impl FromStr for DispatchTarget {
    type Err = UnknownTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|target| target.as_str() == s)
            .ok_or_else(|| UnknownTargetError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("pbes", DispatchTarget::Pbes)]
    #[test_case("graph", DispatchTarget::Graph)]
    #[test_case("pbesnoce", DispatchTarget::Pbesnoce)]
    #[test_case("req", DispatchTarget::Req)]
    fn names_round_trip(name: &str, target: DispatchTarget) {
        assert_eq!(name.parse::<DispatchTarget>().unwrap(), target);
        assert_eq!(target.to_string(), name);
    }

    #[test_case("PBES"; "uppercase")]
    #[test_case("all"; "unknown")]
    #[test_case("3"; "number")]
    fn rejects_unknown_names(name: &str) {
        assert!(name.parse::<DispatchTarget>().is_err());
    }

    #[test]
    fn defaults_to_pbes() {
        assert_eq!(DispatchTarget::default(), DispatchTarget::Pbes);
    }
}
