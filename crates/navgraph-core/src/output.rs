//! Output publishing for price events.
//!
//! A [`PriceSink`] receives every [`PriceEvent`] the graph emits. Sinks can
//! print, write CSV, forward to a channel, or simply collect.

use crate::error::FeedResult;
use crate::records::PriceEvent;

/// Receiver of value-change events.
pub trait PriceSink {
    /// Publish one event.
    fn publish(&mut self, event: &PriceEvent) -> FeedResult<()>;

    /// Publish a batch of events in order.
    fn publish_batch(&mut self, events: &[PriceEvent]) -> FeedResult<()> {
        for event in events {
            self.publish(event)?;
        }
        Ok(())
    }

    /// Flush any buffered output.
    fn flush(&mut self) -> FeedResult<()> {
        Ok(())
    }
}

impl<S: PriceSink + ?Sized> PriceSink for &mut S {
    fn publish(&mut self, event: &PriceEvent) -> FeedResult<()> {
        (**self).publish(event)
    }

    fn flush(&mut self) -> FeedResult<()> {
        (**self).flush()
    }
}

/// Sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Vec<PriceEvent>,
}

impl CollectingSink {
    /// Create an empty collecting sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far.
    pub fn events(&self) -> &[PriceEvent] {
        &self.events
    }

    /// Consume the sink, returning the events.
    pub fn into_events(self) -> Vec<PriceEvent> {
        self.events
    }
}

impl PriceSink for CollectingSink {
    fn publish(&mut self, event: &PriceEvent) -> FeedResult<()> {
        self.events.push(event.clone());
        Ok(())
    }
}

/// Sink that discards events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl PriceSink for NullSink {
    fn publish(&mut self, _event: &PriceEvent) -> FeedResult<()> {
        Ok(())
    }
}
