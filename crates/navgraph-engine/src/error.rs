//! Engine error types.

use thiserror::Error;

use navgraph_core::{FeedError, GraphError};

/// Result type for streaming runs.
pub type StreamResult<T> = Result<T, StreamError>;

/// Error that stopped a streaming run.
#[derive(Debug, Error)]
pub enum StreamError {
    /// An update was rejected by the graph.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// The source failed to produce a record.
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),

    /// The sink failed to accept an event.
    #[error("sink error: {0}")]
    Sink(FeedError),
}
