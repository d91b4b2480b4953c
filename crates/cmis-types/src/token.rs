use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Optimistic concurrency stamp carried by every persisted object.
///
/// The first persist of an object yields token `"1"`; every later persist
/// yields the successor. Callers present the token they last saw and the
/// update is rejected if it no longer matches.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChangeToken(u64);

impl ChangeToken {
    /// Token assigned on first persist.
    pub const fn first() -> Self {
        Self(1)
    }

    /// The token that follows this one.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// The numeric value of this token.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ChangeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChangeToken({})", self.0)
    }
}

impl fmt::Display for ChangeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChangeToken {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| TypeError::InvalidChangeToken(s.to_string()))
    }
}

impl TryFrom<String> for ChangeToken {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ChangeToken> for String {
    fn from(token: ChangeToken) -> Self {
        token.to_string()
    }
}
