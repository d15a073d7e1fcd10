use std::{fmt, num::ParseIntError, str::FromStr};

/// The number identifying a requirement property file.
///
/// A requirement number maps deterministically onto a file name through the
/// naming convention `<prefix> <N><suffix>`, e.g. `Requirement 7.mcf`.
///
/// Numbers are ordered numerically, so a `BTreeSet<RequirementNumber>` yields
/// them in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequirementNumber(u32);

impl RequirementNumber {
    /// Create a requirement number.
    #[must_use]
    pub const fn new(number: u32) -> Self {
        Self(number)
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for RequirementNumber {
    fn from(number: u32) -> Self {
        Self(number)
    }
}

impl fmt::Display for RequirementNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a token is not a valid requirement number.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid requirement number '{token}': {reason}")]
pub struct Error {
    token: String,
    reason: ParseIntError,
}

impl Error {
    /// The token that failed to parse.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl FromStr for RequirementNumber {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>().map(Self).map_err(|reason| Error {
            token: s.to_string(),
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("0", 0; "zero")]
    #[test_case("7", 7; "single digit")]
    #[test_case("042", 42; "leading zeros")]
    #[test_case("4294967295", u32::MAX; "upper bound")]
    fn parses_valid_numbers(token: &str, expected: u32) {
        let number: RequirementNumber = token.parse().unwrap();
        assert_eq!(number.get(), expected);
    }

    #[test_case(""; "empty")]
    #[test_case("-1"; "negative")]
    #[test_case("1.5"; "fractional")]
    #[test_case("seven"; "word")]
    #[test_case("4294967296"; "overflow")]
    fn rejects_invalid_tokens(token: &str) {
        let error = token.parse::<RequirementNumber>().unwrap_err();
        assert_eq!(error.token(), token);
        assert!(error.to_string().contains(token));
    }

    #[test]
    fn error_message_carries_the_parse_failure_once() {
        let error = "x7".parse::<RequirementNumber>().unwrap_err();
        assert_eq!(
            error.to_string(),
            "Invalid requirement number 'x7': invalid digit found in string"
        );
        assert!(std::error::Error::source(&error).is_none());
    }

    #[test]
    fn orders_numerically() {
        let mut numbers: Vec<RequirementNumber> = [10, 2, 1].map(RequirementNumber::new).to_vec();
        numbers.sort();
        assert_eq!(numbers, [1, 2, 10].map(RequirementNumber::new));
    }
}
