//! # eventum - Runtime Event Synthesis Framework
//!
//! `eventum` lets callers declare events as **contracts** — named, typed
//! properties with mutability, validation, and cancellation semantics —
//! and obtain at runtime a concrete type implementing each contract, a
//! factory constructing instances from named arguments, and a dispatcher
//! routing instances to listeners in priority order with per-listener
//! error isolation.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use eventum::prelude::*;
//!
//! let manager = EventManager::new();
//! let contract = ContractDescriptor::builder("MessageEvent")
//!     .property(PropertyDescriptor::of::<String>("message").not_null())
//!     .build()?;
//!
//! manager.registry().register(
//!     "printer",
//!     ListenerSpec::of(&contract),
//!     handler_fn(|call| async move { /* ... */ Ok(()) }),
//! );
//!
//! let ty = manager.synthesizer().synthesize(&contract)?;
//! let event = ty.construct(vec![Value::new(String::from("hello"))])?;
//! let result = manager.dispatch_all(&event, "demo").await;
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use eventum_core::{
    // Channels
    ALL,
    // Error types
    BoxError,
    CANCELLED,
    // Contracts
    BehaviorDescriptor,
    ChannelSet,
    ContractBuilder,
    ContractDescriptor,
    ContractError,
    ContractFilter,
    ContractHandle,
    ContractId,
    // Results
    DispatchResult,
    DynListenerHandler,
    // Logging collaborator
    EventLogger,
    EventType,
    EventumError,
    FactoryError,
    FnHandler,
    ListenError,
    ListenOutcome,
    ListenStatus,
    // Listeners
    ListenerCall,
    ListenerHandler,
    ListenerId,
    ListenerSpec,
    LogContext,
    NONE,
    NoopLogger,
    ParameterPlan,
    Priority,
    // Properties
    PropertyDescriptor,
    PropertyPull,
    PropertyType,
    Severity,
    SkipReason,
    SyncFnHandler,
    SynthesisError,
    Validator,
    ValidationError,
    Value,
    derive_property_name,
    handler_fn,
    sync_handler_fn,
};

pub use eventum_std::dispatch::{AsyncDispatch, EventDispatcher};
pub use eventum_std::factory::{
    EventFactory, FactoryBuilder, FactoryDescriptor, FactoryMethodBuilder,
    FactoryMethodDescriptor, FactoryParameter,
};
pub use eventum_std::logging::TracingLogger;
pub use eventum_std::manager::EventManager;
pub use eventum_std::registry::{DynHandler, ListenerRegistry, ListenerSource, ResolvedBinding};
pub use eventum_std::synth::{
    DelegateFactory, EventInstance, EventSynthesizer, ExtensionBuilder, ExtensionDelegate,
    ExtensionId, ExtensionSpecification, PropertyOverride, SynthesizedType, SynthesizedTypeId,
};

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use eventum_std::testing::*;
}

/// Prelude module - common imports for Eventum.
///
/// # Usage
///
/// ```rust,ignore
/// use eventum::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        ALL,
        BoxError,
        ChannelSet,
        ContractDescriptor,
        DispatchResult,
        EventFactory,
        EventInstance,
        EventManager,
        EventSynthesizer,
        EventType,
        EventumError,
        ExtensionBuilder,
        FactoryBuilder,
        FactoryMethodBuilder,
        ListenerHandler,
        ListenerRegistry,
        ListenerSpec,
        Priority,
        PropertyDescriptor,
        Value,
        handler_fn,
        sync_handler_fn,
    };
}
