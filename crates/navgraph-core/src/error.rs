//! Error types for graph construction, price propagation and data feeds.

use thiserror::Error;

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors raised by the valuation graph.
///
/// Every variant is reported at the offending call, before any state has been
/// mutated. A portfolio that stays unpriced is not an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Malformed structural input (missing or extra fields).
    #[error("Invalid declaration for '{name}': {reason}")]
    InvalidDeclaration {
        /// The declared component.
        name: String,
        /// Why the declaration was rejected.
        reason: String,
    },

    /// An ownership edge names a parent that was never declared as a container.
    #[error("'{child}' is held by undeclared portfolio '{parent}'")]
    DanglingReference {
        /// The held component.
        child: String,
        /// The missing parent.
        parent: String,
    },

    /// A price update names a component that was never declared.
    #[error("Unknown component: {name}")]
    UnknownComponent {
        /// The unknown name.
        name: String,
    },

    /// The ownership structure contains a cycle.
    #[error("Ownership cycle detected through '{component}'")]
    CycleDetected {
        /// A component on the cycle.
        component: String,
    },

    /// A price update targets a portfolio; portfolios are only valued.
    #[error("'{name}' is a portfolio and cannot be priced directly")]
    NotAStock {
        /// The portfolio name.
        name: String,
    },

    /// A portfolio-only query names a stock.
    #[error("'{name}' is not a portfolio")]
    NotAPortfolio {
        /// The stock name.
        name: String,
    },

    /// A price that is NaN or infinite.
    #[error("Invalid price for '{name}': {price}")]
    InvalidPrice {
        /// The stock name.
        name: String,
        /// The rejected value.
        price: f64,
    },
}

impl GraphError {
    /// Create an invalid declaration error.
    #[must_use]
    pub fn invalid_declaration(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDeclaration {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a dangling reference error.
    #[must_use]
    pub fn dangling(child: impl Into<String>, parent: impl Into<String>) -> Self {
        Self::DanglingReference {
            child: child.into(),
            parent: parent.into(),
        }
    }

    /// Create an unknown component error.
    #[must_use]
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::UnknownComponent { name: name.into() }
    }

    /// Create a cycle error.
    #[must_use]
    pub fn cycle(component: impl Into<String>) -> Self {
        Self::CycleDetected {
            component: component.into(),
        }
    }
}

/// Result type for feed and sink operations.
pub type FeedResult<T> = Result<T, FeedError>;

/// Errors raised by input feeds and output sinks.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    /// Underlying I/O failure.
    #[error("IO error: {0}")]
    Io(String),

    /// The header row does not match the expected layout.
    #[error("Header {found:?} does not match expected format '{expected}'")]
    Header {
        /// Expected header, e.g. `NAME,SHARES`.
        expected: String,
        /// Header as read.
        found: String,
    },

    /// A row could not be parsed.
    #[error("Parse error on line {line}: {reason}")]
    Parse {
        /// 1-based line number.
        line: u64,
        /// What was wrong with the row.
        reason: String,
    },

    /// The producing side of a stream went away.
    #[error("Feed disconnected")]
    Disconnected,
}

impl FeedError {
    /// Create a parse error.
    #[must_use]
    pub fn parse(line: u64, reason: impl Into<String>) -> Self {
        Self::Parse {
            line,
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for FeedError {
    fn from(e: std::io::Error) -> Self {
        FeedError::Io(e.to_string())
    }
}
