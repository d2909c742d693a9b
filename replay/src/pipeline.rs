//! Ordered chain of content handlers applied to every stream event.

use tracing::debug;

use crate::types::Event;

/// A pipeline stage that inspects, transforms, consumes or passes through one event.
///
/// Returning `Some` hands the (possibly replaced) event to the next stage, returning `None`
/// consumes it. Handlers report failures through their sink and never return errors, so one
/// bad event cannot stop the stream.
pub trait ContentHandler {
    fn process_event(&mut self, event: Event) -> Option<Event>;

    /// Called once when the stream stops. The default implementation does nothing.
    fn shutdown(&mut self) {}
}

impl<F> ContentHandler for F
where
    F: FnMut(Event) -> Option<Event>,
{
    fn process_event(&mut self, event: Event) -> Option<Event> {
        self(event)
    }
}

/// Handlers invoked in registration order for every dispatched event.
///
/// Registration takes `&mut self`, so the handler list cannot change during a dispatch.
#[derive(Default)]
pub struct ContentHandlerPipeline {
    handlers: Vec<Box<dyn ContentHandler + Send>>,
}

impl ContentHandlerPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler to the end of the pipeline.
    pub fn push_back<H>(&mut self, handler: H)
    where
        H: ContentHandler + Send + 'static,
    {
        self.handlers.push(Box::new(handler));
    }

    /// Passes `event` through the handlers in order.
    ///
    /// Stops at the first handler that consumes the event and returns `None`. Otherwise returns
    /// the event as left by the last handler.
    pub fn dispatch(&mut self, event: Event) -> Option<Event> {
        let mut event = event;
        for (index, handler) in self.handlers.iter_mut().enumerate() {
            match handler.process_event(event) {
                Some(next) => event = next,
                None => {
                    debug!(handler = index, "event consumed");
                    return None;
                }
            }
        }

        Some(event)
    }

    /// Notifies every handler that the stream stopped.
    pub fn shutdown(&mut self) {
        for handler in self.handlers.iter_mut() {
            handler.shutdown();
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for ContentHandlerPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentHandlerPipeline")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
