//! Listener bindings: priorities, parameter plans, and handler traits.
//!
//! A [`ListenerSpec`] is the declarative metadata a registry stores for one
//! listener: which contract it observes, on which channels, at which
//! priority, and how call arguments are extracted from a dispatched instance
//! (its [`ParameterPlan`]). The executable side is a [`ListenerHandler`],
//! usually built from a closure with [`handler_fn`] or [`sync_handler_fn`].

use crate::channel::ChannelSet;
use crate::contract::ContractHandle;
use crate::error::BoxError;
use crate::value::{PropertyType, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Listener execution priority. Lower priorities run first, letting
/// higher-priority listeners observe earlier mutations; ties are broken by
/// registration order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub enum Priority {
    /// Runs before every other priority.
    First,
    /// Runs early.
    High,
    /// Default priority.
    #[default]
    Normal,
    /// Runs late.
    Low,
    /// Runs after every other priority.
    Last,
}

/// Identity of a registered listener, usable for unregistration.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ListenerId(pub u64);

/// Which event contracts a listener observes.
#[derive(Clone, Debug)]
pub enum ContractFilter {
    /// Any event. Used by property-filtered listeners that span many event
    /// types and extract one common property across all of them.
    Any,
    /// Events assignable to the given contract (itself or a sub-contract).
    Contract(ContractHandle),
}

/// One named-property extraction in a parameter plan.
#[derive(Clone, Debug)]
pub struct PropertyPull {
    /// Property name to read from the dispatched instance.
    pub name: String,
    /// When true, an absent property binds `None` instead of skipping the
    /// listener.
    pub optional: bool,
}

/// How call arguments are built from a dispatched instance.
#[derive(Clone, Debug)]
pub struct ParameterPlan {
    /// Whether the listener receives the whole instance.
    pub first_is_event: bool,
    /// Named-property extractions, in declared parameter order.
    pub pulls: Vec<PropertyPull>,
}

impl ParameterPlan {
    /// Plan binding only the whole instance.
    pub fn event_only() -> Self {
        Self {
            first_is_event: true,
            pulls: Vec::new(),
        }
    }

    /// Whether this is a filtered listener: it binds no instance and fires
    /// only when every required property is present.
    pub fn is_filtered(&self) -> bool {
        !self.first_is_event
    }
}

impl Default for ParameterPlan {
    fn default() -> Self {
        Self::event_only()
    }
}

/// Declarative metadata for one listener binding.
#[derive(Clone, Debug)]
pub struct ListenerSpec {
    /// Contract filter.
    pub filter: ContractFilter,
    /// Required generic witness; `None` matches any parameterization.
    pub witness: Option<PropertyType>,
    /// Execution priority.
    pub priority: Priority,
    /// Channel restriction.
    pub channels: ChannelSet,
    /// Skip this listener once a prior listener cancelled the event.
    pub ignore_cancelled: bool,
    /// Argument extraction plan.
    pub plan: ParameterPlan,
}

impl ListenerSpec {
    /// Listener for events assignable to `contract`, bound to the whole
    /// instance, normal priority, all channels.
    pub fn of(contract: &ContractHandle) -> Self {
        Self {
            filter: ContractFilter::Contract(Arc::clone(contract)),
            witness: None,
            priority: Priority::default(),
            channels: ChannelSet::All,
            ignore_cancelled: false,
            plan: ParameterPlan::event_only(),
        }
    }

    /// Filtered listener over any event type; add required pulls with
    /// [`pull`](Self::pull).
    pub fn any() -> Self {
        Self {
            filter: ContractFilter::Any,
            witness: None,
            priority: Priority::default(),
            channels: ChannelSet::All,
            ignore_cancelled: false,
            plan: ParameterPlan {
                first_is_event: false,
                pulls: Vec::new(),
            },
        }
    }

    /// Set the priority.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Restrict to a single channel.
    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.channels = ChannelSet::single(channel);
        self
    }

    /// Restrict to a channel set.
    pub fn channels(mut self, channels: ChannelSet) -> Self {
        self.channels = channels;
        self
    }

    /// Skip this listener when the event is already cancelled.
    pub fn ignore_cancelled(mut self) -> Self {
        self.ignore_cancelled = true;
        self
    }

    /// Require an exact generic witness.
    pub fn witness(mut self, witness: PropertyType) -> Self {
        self.witness = Some(witness);
        self
    }

    /// Append a required named-property extraction. When the property is
    /// absent on a dispatched instance the listener is skipped.
    pub fn pull(mut self, name: impl Into<String>) -> Self {
        self.plan.pulls.push(PropertyPull {
            name: name.into(),
            optional: false,
        });
        self
    }

    /// Append an optional named-property extraction; absence binds `None`.
    pub fn pull_optional(mut self, name: impl Into<String>) -> Self {
        self.plan.pulls.push(PropertyPull {
            name: name.into(),
            optional: true,
        });
        self
    }

    /// Drop the whole-instance parameter, turning the listener into a
    /// filtered one.
    pub fn filtered(mut self) -> Self {
        self.plan.first_is_event = false;
        self
    }
}

/// The resolved arguments for one listener invocation.
pub struct ListenerCall<E> {
    /// The dispatched instance, when the plan binds it.
    pub event: Option<E>,
    /// Plan-extracted property values, one per pull, `None` where an
    /// optional property was absent.
    pub arguments: Vec<Option<Value>>,
}

impl<E> ListenerCall<E> {
    /// Argument at `index`, flattened over absence.
    pub fn argument(&self, index: usize) -> Option<&Value> {
        self.arguments.get(index).and_then(Option::as_ref)
    }
}

/// The executable side of a listener binding.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `ListenerHandler` for `{E}`",
    label = "missing `ListenerHandler` implementation",
    note = "Use `handler_fn` or `sync_handler_fn` to build a handler from a closure."
)]
pub trait ListenerHandler<E: Send + Sync + 'static>: Send + Sync + 'static {
    /// Execute the listener with plan-resolved arguments.
    fn invoke(
        &self,
        call: ListenerCall<E>,
    ) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// Object-safe form of [`ListenerHandler`], implemented for every handler.
pub trait DynListenerHandler<E>: Send + Sync + 'static {
    /// Execute the listener with plan-resolved arguments.
    fn invoke_dyn<'a>(
        &'a self,
        call: ListenerCall<E>,
    ) -> Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send + 'a>>;
}

impl<H, E> DynListenerHandler<E> for H
where
    H: ListenerHandler<E>,
    E: Send + Sync + 'static,
{
    fn invoke_dyn<'a>(
        &'a self,
        call: ListenerCall<E>,
    ) -> Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send + 'a>> {
        Box::pin(self.invoke(call))
    }
}

/// An asynchronous closure handler. See [`handler_fn`].
pub struct FnHandler<F> {
    func: F,
}

impl<F, E, Fut> ListenerHandler<E> for FnHandler<F>
where
    E: Send + Sync + 'static,
    F: Fn(ListenerCall<E>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    fn invoke(
        &self,
        call: ListenerCall<E>,
    ) -> impl Future<Output = Result<(), BoxError>> + Send {
        (self.func)(call)
    }
}

/// Build a handler from an async closure.
pub fn handler_fn<F, E, Fut>(func: F) -> FnHandler<F>
where
    E: Send + Sync + 'static,
    F: Fn(ListenerCall<E>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    FnHandler { func }
}

/// A synchronous closure handler. See [`sync_handler_fn`].
pub struct SyncFnHandler<F> {
    func: F,
}

impl<F, E> ListenerHandler<E> for SyncFnHandler<F>
where
    E: Send + Sync + 'static,
    F: Fn(ListenerCall<E>) -> Result<(), BoxError> + Send + Sync + 'static,
{
    fn invoke(
        &self,
        call: ListenerCall<E>,
    ) -> impl Future<Output = Result<(), BoxError>> + Send {
        std::future::ready((self.func)(call))
    }
}

/// Build a handler from a synchronous closure.
pub fn sync_handler_fn<F, E>(func: F) -> SyncFnHandler<F>
where
    E: Send + Sync + 'static,
    F: Fn(ListenerCall<E>) -> Result<(), BoxError> + Send + Sync + 'static,
{
    SyncFnHandler { func }
}
