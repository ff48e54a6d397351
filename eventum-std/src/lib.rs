//! Standard implementations for the Eventum runtime event engine.
//!
//! This crate provides the working engine on top of the `eventum-core`
//! model: the type synthesizer, event factories, the listener registry,
//! the dispatcher, and the default `tracing` logger.
//!
//! Most users should depend on the `eventum` facade crate instead, which
//! re-exports everything here together with the core model types.

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use eventum_core;

pub mod dispatch;
pub mod factory;
pub mod logging;
pub mod manager;
pub mod registry;
pub mod synth;
pub mod testing;
