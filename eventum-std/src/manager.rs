//! The event manager: one synthesizer, one registry, one dispatcher.
//!
//! [`EventManager`] is the convenience wiring exposing the whole public
//! surface — synthesize, build factories, register listeners, dispatch —
//! from a single value. Multiple managers are independent; their dispatch
//! results over the same event may be merged externally with
//! [`DispatchResult::combine`](eventum_core::DispatchResult::combine).

use crate::dispatch::{AsyncDispatch, EventDispatcher};
use crate::registry::ListenerRegistry;
use crate::synth::{EventInstance, EventSynthesizer};
use eventum_core::{ALL, DispatchResult, EventLogger, EventType, LogContext};
use std::sync::Arc;

/// Front door of the engine.
pub struct EventManager {
    synthesizer: Arc<EventSynthesizer>,
    registry: Arc<ListenerRegistry>,
    dispatcher: EventDispatcher,
}

impl EventManager {
    /// Manager with a no-op logger.
    pub fn new() -> Self {
        Self::with_logger(Arc::new(eventum_core::NoopLogger))
    }

    /// Manager reporting through `logger`.
    pub fn with_logger(logger: Arc<dyn EventLogger>) -> Self {
        let synthesizer = Arc::new(EventSynthesizer::with_logger(Arc::clone(&logger)));
        let registry = Arc::new(ListenerRegistry::new());
        let dispatcher = EventDispatcher::with_logger(Arc::clone(&registry), logger);
        Self {
            synthesizer,
            registry,
            dispatcher,
        }
    }

    /// The type synthesizer.
    pub fn synthesizer(&self) -> &Arc<EventSynthesizer> {
        &self.synthesizer
    }

    /// The listener registry.
    pub fn registry(&self) -> &Arc<ListenerRegistry> {
        &self.registry
    }

    /// The dispatcher.
    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    /// Dispatch under the instance's own declared type.
    pub async fn dispatch(
        &self,
        event: &EventInstance,
        dispatcher_id: &str,
        channel: &str,
    ) -> DispatchResult {
        self.dispatcher
            .dispatch(
                event,
                &event.event_type(),
                dispatcher_id,
                channel,
                &LogContext::new(),
            )
            .await
    }

    /// Dispatch to every channel.
    pub async fn dispatch_all(&self, event: &EventInstance, dispatcher_id: &str) -> DispatchResult {
        self.dispatch(event, dispatcher_id, ALL).await
    }

    /// Dispatch under an explicit declared type, e.g. to supply generic
    /// witness information the instance does not carry.
    pub async fn dispatch_as(
        &self,
        event: &EventInstance,
        declared: &EventType,
        dispatcher_id: &str,
        channel: &str,
        context: &LogContext,
    ) -> DispatchResult {
        self.dispatcher
            .dispatch(event, declared, dispatcher_id, channel, context)
            .await
    }

    /// Blocking dispatch under the instance's own declared type.
    pub fn dispatch_blocking(
        &self,
        event: &EventInstance,
        dispatcher_id: &str,
        channel: &str,
    ) -> DispatchResult {
        self.dispatcher.dispatch_blocking(
            event,
            &event.event_type(),
            dispatcher_id,
            channel,
            &LogContext::new(),
        )
    }

    /// Worker-task dispatch under the instance's own declared type.
    pub fn dispatch_async(
        &self,
        event: EventInstance,
        dispatcher_id: impl Into<String>,
        channel: impl Into<String>,
    ) -> AsyncDispatch {
        let declared = event.event_type();
        self.dispatcher
            .dispatch_async(event, declared, dispatcher_id, channel, LogContext::new())
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new()
    }
}
