//! Error types for Eventum.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`EventumError`] - Top-level error type for all Eventum operations
//! - [`ContractError`] - Contract descriptor construction errors
//! - [`ValidationError`] - Property validation errors at construction/set time
//! - [`SynthesisError`] - Type synthesis errors
//! - [`FactoryError`] - Factory building and invocation errors
//! - [`ListenError`] - Per-listener execution failures, recorded but never
//!   propagated to the dispatch caller

use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all Eventum operations.
#[derive(Error, Debug)]
pub enum EventumError {
    /// A contract descriptor could not be built.
    #[error("contract error: {0}")]
    Contract(#[from] ContractError),

    /// A property value was rejected.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A type could not be synthesized.
    #[error("synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    /// A factory could not be built or invoked.
    #[error("factory error: {0}")]
    Factory(#[from] FactoryError),

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

/// Errors reported while building a contract descriptor.
#[derive(Error, Debug)]
pub enum ContractError {
    /// Two ancestors declare the same property name with incompatible types.
    #[error(
        "contract `{contract}` inherits property `{property}` with incompatible types `{first}` and `{second}`"
    )]
    Conflict {
        /// Contract being built.
        contract: String,
        /// Conflicting property name.
        property: String,
        /// Type seen first.
        first: String,
        /// Incompatible type seen later.
        second: String,
    },
}

/// Errors raised when a property value is rejected.
///
/// All variants surface at construction or set time, never at dispatch time.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A non-nullable property received no value.
    #[error("property `{property}` of `{event}` must not be null")]
    NullProperty {
        /// Event type name.
        event: String,
        /// Property name.
        property: String,
    },

    /// A validator rejected the value.
    #[error("validator `{validator}` rejected property `{property}` of `{event}`: {reason}")]
    Rejected {
        /// Event type name.
        event: String,
        /// Property name.
        property: String,
        /// Label of the rejecting validator.
        validator: String,
        /// Reason produced by the validator.
        reason: String,
    },

    /// The supplied value's type does not match the declared property type.
    #[error(
        "property `{property}` of `{event}` declared as `{expected}`, received `{found}`"
    )]
    TypeMismatch {
        /// Event type name.
        event: String,
        /// Property name.
        property: String,
        /// Declared type.
        expected: String,
        /// Supplied type.
        found: String,
    },

    /// Attempted to set a property that has no setter.
    #[error("property `{property}` of `{event}` is immutable")]
    Immutable {
        /// Event type name.
        event: String,
        /// Property name.
        property: String,
    },

    /// The named property does not exist on the event.
    #[error("`{event}` has no property named `{property}`")]
    UnknownProperty {
        /// Event type name.
        event: String,
        /// Property name.
        property: String,
    },

    /// Constructor received the wrong number of arguments.
    #[error("`{event}` constructor takes {expected} arguments, {supplied} supplied")]
    ArityMismatch {
        /// Event type name.
        event: String,
        /// Expected argument count.
        expected: usize,
        /// Supplied argument count.
        supplied: usize,
    },
}

/// Errors raised while synthesizing a concrete event type.
#[derive(Error, Debug)]
pub enum SynthesisError {
    /// A declared behavior has no providing extension.
    #[error("behavior `{behavior}` of `{event}` is not implemented by any extension")]
    UnimplementedBehavior {
        /// Event type name.
        event: String,
        /// Behavior name.
        behavior: String,
    },

    /// A mutable property is overridden by only one of its accessors.
    #[error("mutable property `{property}` of `{event}` is only partially overridden")]
    IncompleteOverride {
        /// Event type name.
        event: String,
        /// Property name.
        property: String,
    },

    /// A behavior was invoked that the synthesized type does not carry.
    #[error("`{event}` has no behavior named `{behavior}`")]
    UnknownBehavior {
        /// Event type name.
        event: String,
        /// Behavior name.
        behavior: String,
    },
}

/// Errors raised while building or invoking a synthesized factory.
#[derive(Error, Debug)]
pub enum FactoryError {
    /// A constructor slot has no corresponding named argument.
    ///
    /// Carries the full set of supplied names for diagnosis.
    #[error(
        "cannot resolve constructor slot `{property}` of `{event}`; supplied arguments: {supplied:?}"
    )]
    UnresolvedProperty {
        /// Target event type name.
        event: String,
        /// Missing property name.
        property: String,
        /// Every supplied argument name.
        supplied: Vec<String>,
    },

    /// The factory has no method with the given name.
    #[error("factory `{factory}` has no method named `{method}`")]
    UnknownMethod {
        /// Factory name.
        factory: String,
        /// Requested method name.
        method: String,
    },

    /// A factory method received the wrong number of arguments.
    #[error("factory method `{method}` takes {expected} arguments, {supplied} supplied")]
    ArityMismatch {
        /// Method name.
        method: String,
        /// Declared parameter count.
        expected: usize,
        /// Supplied argument count.
        supplied: usize,
    },

    /// The witness argument did not carry a type token.
    #[error("factory method `{method}` expects a `PropertyType` witness argument")]
    InvalidWitness {
        /// Method name.
        method: String,
    },

    /// The cached constructor plan references an argument position the
    /// invoked method does not declare.
    #[error(
        "factory method `{method}` does not supply argument {index} required by the cached constructor plan"
    )]
    PlanMismatch {
        /// Method name.
        method: String,
        /// Out-of-range argument index.
        index: usize,
    },

    /// Constructing the event rejected an argument.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A single listener's execution failure.
///
/// Caught per listener, recorded in that listener's dispatch outcome, and
/// never propagated to the dispatch caller.
#[derive(Error, Debug)]
pub enum ListenError {
    /// The listener returned an error.
    #[error("listener failed: {0}")]
    Failed(#[source] BoxError),

    /// The listener panicked during execution.
    #[error("listener panicked: {0}")]
    Panicked(String),
}

impl From<BoxError> for EventumError {
    fn from(err: BoxError) -> Self {
        EventumError::Custom(err)
    }
}
