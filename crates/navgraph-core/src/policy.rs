//! Strategy and policy selectors shared by the engine and configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Propagation strategy used after a stock price changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Upward traversal re-evaluating every affected portfolio by dot product.
    FullRecompute,
    /// Precomputed sensitivity matrix with incremental deltas.
    #[default]
    Sensitivity,
}

impl StrategyKind {
    /// Returns the string identifier for this strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullRecompute => "full_recompute",
            Self::Sensitivity => "sensitivity",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "full_recompute" | "full" | "recompute" => Ok(Self::FullRecompute),
            "sensitivity" | "delta" => Ok(Self::Sensitivity),
            other => Err(format!("unknown strategy: {other}")),
        }
    }
}

/// What a streaming loop does with a record it cannot apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Log the rejected record and continue.
    #[default]
    Skip,
    /// Stop the loop and return the error.
    Abort,
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => f.write_str("skip"),
            Self::Abort => f.write_str("abort"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_parse() {
        assert_eq!("sensitivity".parse(), Ok(StrategyKind::Sensitivity));
        assert_eq!("full-recompute".parse(), Ok(StrategyKind::FullRecompute));
        assert_eq!(" Delta ".parse(), Ok(StrategyKind::Sensitivity));
        assert!("bfs".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_strategy_round_trips_through_display() {
        for kind in [StrategyKind::FullRecompute, StrategyKind::Sensitivity] {
            assert_eq!(kind.to_string().parse(), Ok(kind));
        }
    }
}
