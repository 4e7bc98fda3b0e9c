//! Streaming loop: price records in, value-change events out.
//!
//! ```text
//! price source ──► StreamingLoop ──► ValuationGraph::apply
//!                        │
//!                        └──────────► PriceSink (one call per event)
//! ```
//!
//! The loop is single-threaded and synchronous. A source that blocks (such
//! as a tailed file) blocks the loop until the next record arrives or the
//! source ends.

use serde::Serialize;
use tracing::{debug, info, warn};

use navgraph_config::StreamSettings;
use navgraph_core::{ErrorPolicy, FeedError, PriceSink, PriceUpdate};

use crate::error::{StreamError, StreamResult};
use crate::graph::ValuationGraph;

/// Counters for one streaming run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreamSummary {
    /// Records that changed the stock's price.
    pub applied: usize,
    /// Records repeating the stock's current price.
    pub unchanged: usize,
    /// Records skipped after an error.
    pub rejected: usize,
    /// Events forwarded to the sink.
    pub events: usize,
}

impl StreamSummary {
    /// Records consumed from the source.
    pub fn records(&self) -> usize {
        self.applied + self.unchanged + self.rejected
    }
}

/// Feeds price records to a graph and forwards events to a sink.
pub struct StreamingLoop<'g, S> {
    graph: &'g mut ValuationGraph,
    sink: S,
    policy: ErrorPolicy,
    max_updates: Option<usize>,
}

impl<'g, S: PriceSink> StreamingLoop<'g, S> {
    /// Creates a loop that skips bad records and never stops early.
    pub fn new(graph: &'g mut ValuationGraph, sink: S) -> Self {
        Self {
            graph,
            sink,
            policy: ErrorPolicy::Skip,
            max_updates: None,
        }
    }

    /// Takes the error policy and update bound from `settings`.
    #[must_use]
    pub fn with_settings(mut self, settings: &StreamSettings) -> Self {
        self.policy = settings.on_error;
        self.max_updates = settings.max_updates;
        self
    }

    /// Sets the error policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Stops after `max` records.
    #[must_use]
    pub fn with_max_updates(mut self, max: usize) -> Self {
        self.max_updates = Some(max);
        self
    }

    /// Runs until the source ends, the update bound is reached, or (under
    /// [`ErrorPolicy::Abort`]) a record fails.
    ///
    /// Sink failures always stop the run.
    pub fn run<I, E>(mut self, source: I) -> StreamResult<StreamSummary>
    where
        I: IntoIterator<Item = Result<PriceUpdate, E>>,
        E: Into<FeedError>,
    {
        let mut summary = StreamSummary::default();
        let mut source = source.into_iter();

        loop {
            if self.max_updates.is_some_and(|max| summary.records() >= max) {
                debug!(records = summary.records(), "Update bound reached");
                break;
            }
            let Some(record) = source.next() else {
                break;
            };

            let outcome = record
                .map_err(|e| StreamError::Feed(e.into()))
                .and_then(|update| self.graph.apply_update(&update).map_err(StreamError::from));

            match outcome {
                Ok(events) if events.is_empty() => summary.unchanged += 1,
                Ok(events) => {
                    self.sink.publish_batch(&events).map_err(StreamError::Sink)?;
                    summary.applied += 1;
                    summary.events += events.len();
                }
                Err(e) => match self.policy {
                    ErrorPolicy::Skip => {
                        warn!(error = %e, "Skipping record");
                        summary.rejected += 1;
                    }
                    ErrorPolicy::Abort => return Err(e),
                },
            }
        }

        self.sink.flush().map_err(StreamError::Sink)?;

        info!(
            applied = summary.applied,
            unchanged = summary.unchanged,
            rejected = summary.rejected,
            events = summary.events,
            "Stream finished"
        );

        Ok(summary)
    }
}
