//! Book condition enumeration.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Physical condition of a listed book.
///
/// The API uses the capitalized strings `"New"` and `"Used"` both in
/// book records and as the `condition` filter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookCondition {
    New,
    Used,
}

impl BookCondition {
    /// All conditions, in display order (for filter dropdowns).
    pub const ALL: [Self; 2] = [Self::New, Self::Used];

    /// The wire representation used by the API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Used => "Used",
        }
    }
}

impl fmt::Display for BookCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookCondition {
    type Err = UnknownCondition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(Self::New),
            "Used" => Ok(Self::Used),
            other => Err(UnknownCondition(other.to_owned())),
        }
    }
}

/// Error returned when parsing an unrecognized condition string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown book condition: {0}")]
pub struct UnknownCondition(pub String);
