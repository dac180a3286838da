//! Ordered dispatch of canonical events to registered handlers.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error};

use crate::{
    interfaces::EventHandler,
    types::{ChainEvent, EventData},
};

/// An ordered chain of [`EventHandler`]s sharing one exclusion policy.
///
/// Cloning is cheap; the listener and its driver task each hold one.
pub struct HandlerChain<D: EventData> {
    handlers: Vec<Arc<dyn EventHandler<D>>>,
    /// Kinds dropped before any handler runs.
    excluded: Vec<D::Kind>,
}

impl<D: EventData> Clone for HandlerChain<D> {
    fn clone(&self) -> Self {
        Self { handlers: self.handlers.clone(), excluded: self.excluded.clone() }
    }
}

impl<D: EventData> Default for HandlerChain<D> {
    fn default() -> Self {
        Self { handlers: Vec::new(), excluded: Vec::new() }
    }
}

impl<D: EventData> HandlerChain<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler; dispatch order is registration order.
    pub fn register(&mut self, handler: Arc<dyn EventHandler<D>>) {
        self.handlers.push(handler);
    }

    /// Drops events of these kinds before any handler runs.
    pub fn exclude(&mut self, kinds: impl IntoIterator<Item = D::Kind>) {
        self.excluded.extend(kinds);
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Runs the chain for one event.
    ///
    /// Each handler receives the previous handler's output. A handler whose
    /// exclusion list names this event's kind is skipped and the previous
    /// output passes through unchanged. A handler error is logged and stops
    /// the remaining handlers for this event only; the chain stays usable
    /// for the next event.
    pub async fn dispatch(&self, event: &ChainEvent<D>) {
        let kind = event.kind();
        if self.excluded.contains(&kind) {
            debug!(kind = ?kind, block = event.block_number, "event kind globally excluded");
            return;
        }
        let mut prev: Option<Value> = None;
        for handler in &self.handlers {
            if handler.excluded_events().contains(&kind) {
                continue;
            }
            match handler.handle(event, prev.take()).await {
                Ok(out) => prev = out,
                Err(err) => {
                    error!(
                        handler = handler.name(),
                        kind = ?kind,
                        block = event.block_number,
                        error = %err,
                        "event handler failed, skipping remaining handlers for this event"
                    );
                    return;
                }
            }
        }
    }
}
