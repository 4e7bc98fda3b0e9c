//! Records exchanged between the graph and its collaborators.
//!
//! - [`Declaration`]: one line of structural input
//! - [`PriceUpdate`]: one stock price arriving from a feed
//! - [`PriceEvent`]: a component whose stored price actually changed

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::ComponentName;

// =============================================================================
// STRUCTURAL INPUT
// =============================================================================

/// A structural declaration.
///
/// Either a bare container declaration (`weight` and `parent` both absent)
/// or a weighted ownership edge (`weight` and `parent` both present). Mixed
/// forms are rejected by the adjacency builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    /// Component being declared.
    pub name: String,
    /// Units of `name` held by `parent`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Owning portfolio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl Declaration {
    /// Declares `name` as a container.
    pub fn container(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: None,
            parent: None,
        }
    }

    /// Declares that `parent` holds `weight` units of `name`.
    pub fn holding(name: impl Into<String>, weight: f64, parent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: Some(weight),
            parent: Some(parent.into()),
        }
    }
}

// =============================================================================
// PRICE INPUT / OUTPUT
// =============================================================================

/// A stock price arriving from a feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdate {
    /// Stock name.
    pub name: String,
    /// New price.
    pub price: f64,
}

impl PriceUpdate {
    /// Creates a price update.
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }
}

/// Kind of a component once the structure is frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// Leaf priced directly from the feed.
    Stock,
    /// Container valued from its holdings.
    Portfolio,
}

impl ComponentKind {
    /// Returns the string identifier for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stock => "stock",
            Self::Portfolio => "portfolio",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emitted whenever a component's stored price changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEvent {
    /// Component whose price changed.
    pub name: ComponentName,
    /// Stock or portfolio.
    pub kind: ComponentKind,
    /// Price after the change.
    pub price: f64,
}

impl PriceEvent {
    /// Creates a price event.
    pub fn new(name: ComponentName, kind: ComponentKind, price: f64) -> Self {
        Self { name, kind, price }
    }
}

impl fmt::Display for PriceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.name, self.price)
    }
}

/// Valuation state of a component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "price", rename_all = "snake_case")]
pub enum Valuation {
    /// No price yet.
    Unpriced,
    /// Known price.
    Priced(f64),
}

impl Valuation {
    /// Builds a valuation from a raw store value (NaN means unknown).
    pub fn from_raw(value: f64) -> Self {
        if value.is_nan() {
            Self::Unpriced
        } else {
            Self::Priced(value)
        }
    }

    /// Returns the price, if known.
    pub fn price(&self) -> Option<f64> {
        match self {
            Self::Unpriced => None,
            Self::Priced(p) => Some(*p),
        }
    }

    /// Returns true once a price is known.
    pub fn is_priced(&self) -> bool {
        matches!(self, Self::Priced(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_constructors() {
        let c = Declaration::container("TECH");
        assert_eq!(c.weight, None);
        assert_eq!(c.parent, None);

        let h = Declaration::holding("AAPL", 100.0, "TECH");
        assert_eq!(h.weight, Some(100.0));
        assert_eq!(h.parent.as_deref(), Some("TECH"));
    }

    #[test]
    fn test_event_display_matches_csv_row() {
        let event = PriceEvent::new("TECH".into(), ComponentKind::Portfolio, 12.5);
        assert_eq!(event.to_string(), "TECH,12.5");
    }

    #[test]
    fn test_valuation_from_raw() {
        assert_eq!(Valuation::from_raw(f64::NAN), Valuation::Unpriced);
        assert_eq!(Valuation::from_raw(3.0).price(), Some(3.0));
        assert!(!Valuation::Unpriced.is_priced());
    }

    #[test]
    fn test_container_declaration_omits_empty_fields() {
        let json = serde_json::to_string(&Declaration::container("AUTOS")).unwrap();
        assert_eq!(json, r#"{"name":"AUTOS"}"#);
    }
}
