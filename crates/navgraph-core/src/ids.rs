//! Identifier types used across the valuation graph.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Component name (ticker for a stock, label for a portfolio).
///
/// Names are the stable external key of a component; every name maps to
/// exactly one [`Slot`] once the graph is built.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentName(pub String);

impl ComponentName {
    /// Create a new component name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ComponentName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ComponentName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Borrow<str> for ComponentName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Dense index of a component in the shared price store.
///
/// Slots are allocated once when the node registry is built and never reused.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slot(pub usize);

impl Slot {
    /// Create a slot from a raw index.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Raw index into the price store.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_name_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(ComponentName::new("AAPL"), Slot::new(3));

        assert_eq!(map.get("AAPL"), Some(&Slot(3)));
        assert_eq!(map.get("MSFT"), None);
    }

    #[test]
    fn test_name_serializes_as_plain_string() {
        let name = ComponentName::from("TECH");
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"TECH\"");
        assert_eq!(name.to_string(), "TECH");
    }
}
