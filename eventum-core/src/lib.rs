//! # eventum-core
//!
//! Core data model for the Eventum event synthesis framework.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! extensions and listener sources that don't need the full `eventum-std`
//! engine.
//!
//! # Model
//!
//! Eventum lets callers declare an event as a contract — named, typed
//! properties with optional mutability, validation, and cancellation
//! semantics — and obtain at runtime a concrete type implementing it, a
//! factory constructing instances from named arguments, and a registry that
//! routes instances to listeners in priority order. This crate holds the
//! declarative half of that system:
//!
//! - [`Value`] / [`PropertyType`] - dynamically typed property payloads
//! - [`PropertyDescriptor`] / [`Validator`] - one named value slot
//! - [`ContractDescriptor`] - the normalized event shape, with inheritance
//!   flattening, conflict detection, and the implicit `cancelled` slot
//! - [`ChannelSet`] - listener channel partitioning
//! - [`ListenerSpec`] / [`ListenerHandler`] - listener metadata and the
//!   executable callable
//! - [`DispatchResult`] - per-listener outcomes with error isolation
//! - [`EventLogger`] - the logging collaborator consumed by the engine
//!
//! # Error Types
//!
//! - [`EventumError`] - Top-level error type
//! - [`ContractError`] - Inherited-property conflicts
//! - [`ValidationError`] - Construction/set-time rejections
//! - [`FactoryError`] - Named-argument binding failures
//! - [`ListenError`] - Isolated per-listener failures

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod channel;
mod contract;
mod error;
mod listener;
mod logging;
mod property;
mod result;
mod value;

// Re-exports
pub use channel::{ALL, ChannelSet, NONE};
pub use contract::{
    BehaviorDescriptor, CANCELLED, ContractBuilder, ContractDescriptor, ContractHandle,
    ContractId, EventType,
};
pub use error::{
    BoxError, ContractError, EventumError, FactoryError, ListenError, SynthesisError,
    ValidationError,
};
pub use listener::{
    ContractFilter, DynListenerHandler, FnHandler, ListenerCall, ListenerHandler, ListenerId,
    ListenerSpec, ParameterPlan, Priority, PropertyPull, SyncFnHandler, handler_fn,
    sync_handler_fn,
};
pub use logging::{EventLogger, LogContext, NoopLogger, Severity};
pub use property::{PropertyDescriptor, Validator, derive_property_name};
pub use result::{DispatchResult, ListenOutcome, ListenStatus, SkipReason};
pub use value::{PropertyType, Value};
