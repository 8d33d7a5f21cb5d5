//! Sync conflict model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ListDocument;
use crate::error::Error;

/// A pending conflict: both replicas moved since the last rendezvous.
///
/// Held only until the user picks a [`ResolutionStrategy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    /// The unmerged local document
    pub local: ListDocument,
    /// Remote snapshot captured when the conflict was detected
    pub remote: ListDocument,
    /// Detection time (Unix ms)
    pub detected_at: i64,
}

/// How a pending conflict is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStrategy {
    /// Discard local changes and adopt the remote snapshot
    Remote,
    /// Keep local state and overwrite the remote copy
    Mine,
    /// Merge both sides and push the result
    Merge,
}

impl ResolutionStrategy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Mine => "mine",
            Self::Merge => "merge",
        }
    }
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "remote" => Ok(Self::Remote),
            "mine" => Ok(Self::Mine),
            "merge" => Ok(Self::Merge),
            other => Err(Error::InvalidInput(format!(
                "unknown resolution strategy '{other}' (expected remote, mine, or merge)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_parse_accepts_only_three_values() {
        assert_eq!("remote".parse::<ResolutionStrategy>().unwrap(), ResolutionStrategy::Remote);
        assert_eq!(" mine ".parse::<ResolutionStrategy>().unwrap(), ResolutionStrategy::Mine);
        assert_eq!("merge".parse::<ResolutionStrategy>().unwrap(), ResolutionStrategy::Merge);
        assert!("theirs".parse::<ResolutionStrategy>().is_err());
        assert!("Remote".parse::<ResolutionStrategy>().is_err());
    }
}
