//! The dispatcher: routing instances to resolved listener bindings.
//!
//! Dispatch resolves the interested bindings from the registry, invokes
//! them in priority order, and aggregates a [`DispatchResult`]. One
//! listener's failure never prevents the remaining listeners from running:
//! errors and panics are caught per listener, recorded in that listener's
//! outcome, and reported through the logging collaborator.
//!
//! Three modes are offered: `dispatch` awaits every listener on the caller
//! task, `dispatch_blocking` is the synchronous-on-caller-thread variant,
//! and `dispatch_async` hands the whole ordered dispatch to a worker task
//! (requires a tokio runtime) and returns a joinable [`AsyncDispatch`].
//! There is no cancellation of an in-flight listener and no per-listener
//! timeout; a hung listener blocks that dispatch's completion.

use crate::registry::{ListenerRegistry, ResolvedBinding};
use crate::synth::EventInstance;
use eventum_core::{
    BoxError, DispatchResult, EventLogger, EventType, ListenError, ListenOutcome, ListenStatus,
    ListenerCall, LogContext, NoopLogger, ParameterPlan, Severity, SkipReason, Value,
};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Dispatches event instances to the listeners of one registry.
#[derive(Clone)]
pub struct EventDispatcher {
    registry: Arc<ListenerRegistry>,
    logger: Arc<dyn EventLogger>,
}

impl EventDispatcher {
    /// Dispatcher over `registry` with a no-op logger.
    pub fn new(registry: Arc<ListenerRegistry>) -> Self {
        Self::with_logger(registry, Arc::new(NoopLogger))
    }

    /// Dispatcher reporting listener failures through `logger`.
    pub fn with_logger(registry: Arc<ListenerRegistry>, logger: Arc<dyn EventLogger>) -> Self {
        Self { registry, logger }
    }

    /// The backing registry.
    pub fn registry(&self) -> &Arc<ListenerRegistry> {
        &self.registry
    }

    /// Dispatch `event` under the declared type `declared` to `channel`,
    /// awaiting every bound listener in priority order.
    pub async fn dispatch(
        &self,
        event: &EventInstance,
        declared: &EventType,
        dispatcher_id: &str,
        channel: &str,
        context: &LogContext,
    ) -> DispatchResult {
        let context = context
            .clone()
            .with("dispatcher", dispatcher_id)
            .with("channel", channel);
        let mut result = DispatchResult::new(channel);
        for binding in self.registry.lookup(declared, channel) {
            let status = self.run_binding(event, declared, &binding, &context).await;
            result.push(ListenOutcome {
                owner: binding.owner,
                listener: binding.id,
                status,
            });
        }
        result
    }

    /// Synchronous-on-caller-thread dispatch; blocks until every bound
    /// listener has run.
    pub fn dispatch_blocking(
        &self,
        event: &EventInstance,
        declared: &EventType,
        dispatcher_id: &str,
        channel: &str,
        context: &LogContext,
    ) -> DispatchResult {
        futures::executor::block_on(self.dispatch(event, declared, dispatcher_id, channel, context))
    }

    /// Hand the whole ordered dispatch to a worker task. Requires a running
    /// tokio runtime; the returned handle can be joined asynchronously or
    /// blockingly.
    pub fn dispatch_async(
        &self,
        event: EventInstance,
        declared: EventType,
        dispatcher_id: impl Into<String>,
        channel: impl Into<String>,
        context: LogContext,
    ) -> AsyncDispatch {
        let this = self.clone();
        let dispatcher_id = dispatcher_id.into();
        let channel = channel.into();
        AsyncDispatch {
            handle: tokio::spawn(async move {
                this.dispatch(&event, &declared, &dispatcher_id, &channel, &context)
                    .await
            }),
        }
    }

    async fn run_binding(
        &self,
        event: &EventInstance,
        declared: &EventType,
        binding: &ResolvedBinding,
        context: &LogContext,
    ) -> ListenStatus {
        if binding.spec.ignore_cancelled && event.is_cancelled() {
            return ListenStatus::Skipped(SkipReason::Cancelled);
        }
        let call = match build_call(event, &binding.spec.plan) {
            Ok(call) => call,
            Err(reason) => return ListenStatus::Skipped(reason),
        };

        let invocation = AssertUnwindSafe(binding.handler.invoke_dyn(call)).catch_unwind();
        let error = match invocation.await {
            Ok(Ok(())) => return ListenStatus::Success,
            Ok(Err(err)) => ListenError::Failed(err),
            Err(panic) => ListenError::Panicked(panic_message(panic.as_ref())),
        };
        self.logger.log(
            &format!(
                "listener `{}` failed for event `{:?}`: {}",
                binding.owner, declared, error
            ),
            Severity::Error,
            context,
        );
        ListenStatus::Failed(error)
    }
}

/// Build the call arguments for one binding per its parameter plan.
///
/// A required property pull that finds no value skips the listener; an
/// optional pull binds `None`.
fn build_call(
    event: &EventInstance,
    plan: &ParameterPlan,
) -> Result<ListenerCall<EventInstance>, SkipReason> {
    let mut arguments: Vec<Option<Value>> = Vec::with_capacity(plan.pulls.len());
    for pull in &plan.pulls {
        match event.get(&pull.name) {
            Some(value) => arguments.push(Some(value)),
            None if pull.optional => arguments.push(None),
            None => return Err(SkipReason::MissingProperty(pull.name.clone())),
        }
    }
    Ok(ListenerCall {
        event: plan.first_is_event.then(|| event.clone()),
        arguments,
    })
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Handle to a dispatch running on a worker task.
pub struct AsyncDispatch {
    handle: tokio::task::JoinHandle<DispatchResult>,
}

impl AsyncDispatch {
    /// Wait for the dispatch to complete.
    pub async fn join(self) -> Result<DispatchResult, BoxError> {
        self.handle.await.map_err(|err| Box::new(err) as BoxError)
    }

    /// Block the current thread until the dispatch completes. Must not be
    /// called from within the runtime driving the dispatch.
    pub fn join_blocking(self) -> Result<DispatchResult, BoxError> {
        futures::executor::block_on(self.join())
    }
}
