//! Extension attachment: property accessor overrides, storage omission,
//! and per-instance delegate construction.

use eventum::testing::CollectingLogger;
use eventum::{
    BoxError, ContractDescriptor, EventInstance, EventSynthesizer, EventumError,
    ExtensionDelegate, ExtensionSpecification, PropertyDescriptor, Severity, SynthesisError,
    Value,
};
use std::sync::{Arc, Mutex};

/// Delegate owning the storage of one overridden mutable property.
#[derive(Default)]
struct TagStore {
    tag: Mutex<Option<Value>>,
}

impl ExtensionDelegate for TagStore {
    fn call(&self, method: &str, _args: &[Value]) -> Result<Value, BoxError> {
        Err(format!("no method `{method}`").into())
    }

    fn get(&self, property: &str) -> Option<Value> {
        (property == "tag")
            .then(|| self.tag.lock().unwrap().clone())
            .flatten()
    }

    fn set(&self, _property: &str, value: Value) -> Result<(), BoxError> {
        *self.tag.lock().unwrap() = Some(value);
        Ok(())
    }
}

#[test]
fn fully_overridden_mutable_property_delegates_storage() {
    let contract = ContractDescriptor::builder("SessionEvent")
        .property(PropertyDescriptor::of::<String>("user").not_null())
        .property(PropertyDescriptor::of::<String>("tag").mutable())
        .build()
        .unwrap();

    let store = Arc::new(TagStore::default());
    let synthesizer = EventSynthesizer::new();
    let ty = synthesizer
        .synthesize_with(
            &contract,
            vec![
                ExtensionSpecification::builder("session-plugin")
                    .override_property("tag")
                    .delegate_instance(store.clone()),
            ],
        )
        .unwrap();

    // The overridden property loses its storage slot.
    let order: Vec<_> = ty.constructor_order().iter().map(|p| p.name()).collect();
    assert_eq!(order, ["user"]);

    let event = ty.construct(vec![Value::new(String::from("alice"))]).unwrap();
    assert!(event.get("tag").is_none());

    event.set("tag", Value::new(String::from("vip"))).unwrap();
    assert_eq!(event.get_as::<String>("tag").as_deref(), Some("vip"));
    assert!(store.tag.lock().unwrap().is_some());
}

/// Delegate computing an overridden getter from the event it was built for.
struct DisplayDelegate {
    event: EventInstance,
}

impl ExtensionDelegate for DisplayDelegate {
    fn call(&self, method: &str, _args: &[Value]) -> Result<Value, BoxError> {
        Err(format!("no method `{method}`").into())
    }

    fn get(&self, _property: &str) -> Option<Value> {
        self.event
            .get_as::<String>("user")
            .map(|user| Value::new(format!("user:{user}")))
    }
}

#[test]
fn getter_override_is_built_from_the_event_and_computes_lazily() {
    let contract = ContractDescriptor::builder("DisplayEvent")
        .property(PropertyDescriptor::of::<String>("user").not_null())
        .property(PropertyDescriptor::of::<String>("display"))
        .build()
        .unwrap();

    let synthesizer = EventSynthesizer::new();
    let ty = synthesizer
        .synthesize_with(
            &contract,
            vec![
                ExtensionSpecification::builder("display-plugin")
                    .override_getter("display")
                    .delegate_with(|event| Arc::new(DisplayDelegate { event })),
            ],
        )
        .unwrap();

    // Getter-alone override of an immutable property omits its slot too.
    assert_eq!(ty.constructor_order().len(), 1);

    let event = ty.construct(vec![Value::new(String::from("alice"))]).unwrap();
    assert_eq!(
        event.get_as::<String>("display").as_deref(),
        Some("user:alice")
    );
}

#[test]
fn half_override_of_a_mutable_property_is_rejected_and_logged() {
    let contract = ContractDescriptor::builder("SessionEvent")
        .property(PropertyDescriptor::of::<String>("tag").mutable())
        .build()
        .unwrap();

    let logger = CollectingLogger::new();
    let synthesizer = EventSynthesizer::with_logger(Arc::new(logger.clone()));
    let err = synthesizer
        .synthesize_with(
            &contract,
            vec![
                ExtensionSpecification::builder("session-plugin")
                    .override_getter("tag")
                    .delegate_instance(Arc::new(TagStore::default())),
            ],
        )
        .unwrap_err();

    assert!(matches!(
        err,
        EventumError::Synthesis(SynthesisError::IncompleteOverride { .. })
    ));
    assert_eq!(logger.count_at(Severity::Warn), 1);
    // The failed build inserts nothing.
    assert_eq!(synthesizer.synthesized_count(), 0);
}
