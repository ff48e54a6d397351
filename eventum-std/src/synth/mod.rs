//! The type synthesizer: contract in, cached concrete type out.
//!
//! [`EventSynthesizer`] owns the synthesized-type cache keyed by
//! `(contract, extension-set)`. It is accessed from arbitrary caller
//! threads; the cache computes under its lock so that concurrent first-time
//! requests for one key observe at most one synthesis and every caller
//! receives the same `Arc` (reference equality is what the override and
//! bridge tables rely on). A failed synthesis inserts nothing and is
//! reported through the logging collaborator.

mod extension;
mod model;

pub use extension::{
    DelegateFactory, ExtensionBuilder, ExtensionDelegate, ExtensionId, ExtensionSpecification,
    PropertyOverride,
};
pub use model::{EventInstance, SynthesizedType, SynthesizedTypeId};

use eventum_core::{
    ContractHandle, ContractId, EventLogger, EventumError, LogContext, NoopLogger, Severity,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

type TypeKey = (ContractId, Vec<ExtensionId>);

/// Synthesizes and caches concrete event types.
pub struct EventSynthesizer {
    types: Mutex<HashMap<TypeKey, Arc<SynthesizedType>>>,
    registered: Mutex<HashMap<ContractId, Vec<ExtensionSpecification>>>,
    logger: Arc<dyn EventLogger>,
}

impl EventSynthesizer {
    /// Synthesizer with a no-op logger.
    pub fn new() -> Self {
        Self::with_logger(Arc::new(NoopLogger))
    }

    /// Synthesizer reporting diagnostics through `logger`.
    pub fn with_logger(logger: Arc<dyn EventLogger>) -> Self {
        Self {
            types: Mutex::new(HashMap::new()),
            registered: Mutex::new(HashMap::new()),
            logger,
        }
    }

    /// Synthesize (or fetch) the concrete type for `contract` with no
    /// request-scoped extensions. Idempotent: repeated calls return the same
    /// `Arc`.
    pub fn synthesize(
        &self,
        contract: &ContractHandle,
    ) -> Result<Arc<SynthesizedType>, EventumError> {
        self.synthesize_with(contract, Vec::new())
    }

    /// Synthesize (or fetch) the concrete type for `contract` plus
    /// `extensions`. Extensions previously registered against the contract
    /// through [`register_extension`](Self::register_extension) are always
    /// merged in.
    pub fn synthesize_with(
        &self,
        contract: &ContractHandle,
        extensions: Vec<ExtensionSpecification>,
    ) -> Result<Arc<SynthesizedType>, EventumError> {
        let mut all = self.registered_for(contract.id());
        for ext in extensions {
            if !all.iter().any(|e| e.id() == ext.id()) {
                all.push(ext);
            }
        }

        let mut ids: Vec<ExtensionId> = all.iter().map(|e| e.id()).collect();
        ids.sort_unstable();
        let key = (contract.id(), ids);

        let mut types = self.types.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = types.get(&key) {
            return Ok(Arc::clone(existing));
        }
        // Built while holding the lock: concurrent first requests for this
        // key block and then observe the single cached type.
        let built = match SynthesizedType::build(Arc::clone(contract), all) {
            Ok(built) => built,
            Err(err) => {
                self.logger.log(
                    &format!("failed to synthesize type for `{}`: {err}", contract.name()),
                    Severity::Warn,
                    &LogContext::new(),
                );
                return Err(err);
            }
        };
        types.insert(key, Arc::clone(&built));
        self.logger.log(
            &format!(
                "synthesized type for `{}` with {} extension(s)",
                contract.name(),
                built.extensions().len()
            ),
            Severity::Debug,
            &LogContext::new(),
        );
        Ok(built)
    }

    /// Attach an extension to every future synthesis of `contract`.
    ///
    /// Already-synthesized types are unaffected; the extension set is part
    /// of the cache key, so the next request produces a new type. Lazy
    /// factory methods re-resolve per call and therefore observe late
    /// registrations.
    pub fn register_extension(&self, contract: &ContractHandle, spec: ExtensionSpecification) {
        self.registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(contract.id())
            .or_default()
            .push(spec);
    }

    /// Number of distinct synthesized types currently cached.
    pub fn synthesized_count(&self) -> usize {
        self.types
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn registered_for(&self, contract: ContractId) -> Vec<ExtensionSpecification> {
        self.registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&contract)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for EventSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventum_core::{ContractDescriptor, PropertyDescriptor, Value};

    fn login_contract() -> ContractHandle {
        ContractDescriptor::builder("LoginEvent")
            .property(PropertyDescriptor::of::<String>("name").not_null().mutable())
            .build()
            .unwrap()
    }

    #[test]
    fn synthesis_is_cached_by_identity() {
        let synthesizer = EventSynthesizer::new();
        let contract = login_contract();

        let a = synthesizer.synthesize(&contract).unwrap();
        let b = synthesizer.synthesize(&contract).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(synthesizer.synthesized_count(), 1);
    }

    #[test]
    fn registered_extension_changes_the_key() {
        let synthesizer = EventSynthesizer::new();
        let contract = login_contract();

        let plain = synthesizer.synthesize(&contract).unwrap();
        synthesizer.register_extension(
            &contract,
            ExtensionSpecification::builder("test")
                .capability("Audited")
                .delegate_instance(Arc::new(NullDelegate)),
        );
        let extended = synthesizer.synthesize(&contract).unwrap();

        assert!(!Arc::ptr_eq(&plain, &extended));
        assert!(extended.capabilities().contains("Audited"));
        assert_eq!(synthesizer.synthesized_count(), 2);
    }

    #[test]
    fn construct_and_read_back() {
        let synthesizer = EventSynthesizer::new();
        let ty = synthesizer.synthesize(&login_contract()).unwrap();

        let event = ty.construct(vec![Value::new(String::from("Player"))]).unwrap();
        assert_eq!(event.get_as::<String>("name").as_deref(), Some("Player"));
    }

    struct NullDelegate;

    impl ExtensionDelegate for NullDelegate {
        fn call(
            &self,
            method: &str,
            _args: &[Value],
        ) -> Result<Value, eventum_core::BoxError> {
            Err(format!("no method `{method}`").into())
        }
    }
}
