use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// The "(used/total)" reservation counter of an activity row.
///
/// `used <= total` is expected from the site but never enforced; an
/// inverted counter simply reports no space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CapacityCounter {
    used: u32,
    total: u32,
}

impl CapacityCounter {
    pub fn new(used: u32, total: u32) -> Self {
        Self { used, total }
    }

    /// Parse a `"(used/total)"` token.
    pub fn parse(token: &str) -> Result<Self, ParseError> {
        let err = || ParseError::Capacity(token.to_string());
        let inner = token
            .trim()
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .ok_or_else(err)?;
        let (used, total) = inner.split_once('/').ok_or_else(err)?;
        let used = used.trim().parse().map_err(|_| err())?;
        let total = total.trim().parse().map_err(|_| err())?;
        Ok(Self { used, total })
    }

    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn has_space(&self) -> bool {
        self.used < self.total
    }
}

impl FromStr for CapacityCounter {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CapacityCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}/{})", self.used, self.total)
    }
}
