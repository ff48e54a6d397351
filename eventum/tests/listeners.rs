//! Listener dispatch: ordering, cancellation, error isolation, and
//! property-filtered listeners.

use eventum::testing::{CollectingLogger, CountingHandler, RecordingHandler};
use eventum::{
    ContractDescriptor, ContractHandle, EventManager, ListenStatus, ListenerSpec, Priority,
    PropertyDescriptor, Severity, SkipReason, Value, sync_handler_fn,
};
use std::sync::{Arc, Mutex};

fn login_contract() -> ContractHandle {
    ContractDescriptor::builder("LoginEvent")
        .property(PropertyDescriptor::of::<String>("name").not_null())
        .cancellable()
        .build()
        .unwrap()
}

fn login_event(manager: &EventManager, name: &str) -> eventum::EventInstance {
    let ty = manager.synthesizer().synthesize(&login_contract()).unwrap();
    ty.construct(vec![Value::new(String::from(name)), Value::new(false)])
        .unwrap()
}

fn trace(log: &Arc<Mutex<Vec<&'static str>>>, label: &'static str) -> impl Fn() + use<> {
    let log = Arc::clone(log);
    move || log.lock().unwrap().push(label)
}

#[tokio::test]
async fn listeners_run_in_priority_order_with_stable_ties() {
    let manager = EventManager::new();
    let contract = login_contract();
    let order = Arc::new(Mutex::new(Vec::new()));

    for (label, priority) in [
        ("low", Priority::Low),
        ("normal-1", Priority::Normal),
        ("first", Priority::First),
        ("normal-2", Priority::Normal),
        ("last", Priority::Last),
        ("high", Priority::High),
    ] {
        let mark = trace(&order, label);
        manager.registry().register(
            label,
            ListenerSpec::of(&contract).priority(priority),
            sync_handler_fn(move |_call| {
                mark();
                Ok(())
            }),
        );
    }

    let ty = manager.synthesizer().synthesize(&contract).unwrap();
    let event = ty
        .construct(vec![Value::new(String::from("Player")), Value::new(false)])
        .unwrap();
    let result = manager.dispatch_all(&event, "test").await;

    assert!(result.is_success());
    assert_eq!(result.executed(), 6);
    assert_eq!(
        *order.lock().unwrap(),
        ["first", "high", "normal-1", "normal-2", "low", "last"]
    );
}

#[tokio::test]
async fn cancellation_skips_ignoring_listeners_only() {
    let manager = EventManager::new();
    let contract = login_contract();

    // The first listener cancels; one later listener opts out of cancelled
    // events, the other still observes them.
    manager.registry().register(
        "canceller",
        ListenerSpec::of(&contract).priority(Priority::First),
        sync_handler_fn(|call: eventum::ListenerCall<eventum::EventInstance>| {
            let event = call.event.as_ref().ok_or("missing event")?;
            event.set_cancelled(true)?;
            Ok(())
        }),
    );
    let skipped = CountingHandler::new();
    manager.registry().register(
        "skipped",
        ListenerSpec::of(&contract).ignore_cancelled(),
        skipped.clone(),
    );
    let observer = CountingHandler::new();
    manager
        .registry()
        .register("observer", ListenerSpec::of(&contract), observer.clone());

    let event = login_event(&manager, "Player");
    let result = manager.dispatch_all(&event, "test").await;

    assert_eq!(skipped.count(), 0);
    assert_eq!(observer.count(), 1);
    assert!(event.is_cancelled());
    assert!(matches!(
        result.outcomes()[1].status,
        ListenStatus::Skipped(SkipReason::Cancelled)
    ));
}

#[tokio::test]
async fn failures_are_isolated_and_logged() {
    let logger = CollectingLogger::new();
    let manager = EventManager::with_logger(Arc::new(logger.clone()));
    let contract = login_contract();

    let failing = RecordingHandler::new();
    failing.fail_with("database unavailable");
    manager
        .registry()
        .register("failing", ListenerSpec::of(&contract), failing.clone());
    let survivor = CountingHandler::new();
    manager
        .registry()
        .register("survivor", ListenerSpec::of(&contract), survivor.clone());

    let event = login_event(&manager, "Player");
    let result = manager.dispatch_all(&event, "test").await;

    // The failure is recorded, logged, and does not stop the later listener.
    assert!(!result.is_success());
    assert_eq!(result.failures().count(), 1);
    assert_eq!(survivor.count(), 1);
    assert_eq!(logger.count_at(Severity::Error), 1);
    assert!(logger.records()[0].message.contains("database unavailable"));
}

#[tokio::test]
async fn panics_are_contained_per_listener() {
    let manager = EventManager::new();
    let contract = login_contract();

    manager.registry().register(
        "panicking",
        ListenerSpec::of(&contract),
        sync_handler_fn(|_call: eventum::ListenerCall<eventum::EventInstance>| {
            panic!("listener bug")
        }),
    );
    let survivor = CountingHandler::new();
    manager
        .registry()
        .register("survivor", ListenerSpec::of(&contract), survivor.clone());

    let event = login_event(&manager, "Player");
    let result = manager.dispatch_all(&event, "test").await;

    assert!(!result.is_success());
    assert_eq!(survivor.count(), 1);
    match &result.outcomes()[0].status {
        ListenStatus::Failed(eventum::ListenError::Panicked(message)) => {
            assert!(message.contains("listener bug"));
        }
        other => panic!("unexpected status: {other:?}"),
    }
}

#[tokio::test]
async fn filtered_listeners_pull_one_property_across_event_types() {
    let manager = EventManager::new();
    let connect = ContractDescriptor::builder("ConnectEvent")
        .property(PropertyDescriptor::of::<String>("ip").not_null())
        .build()
        .unwrap();
    let disconnect = ContractDescriptor::builder("DisconnectEvent")
        .property(PropertyDescriptor::of::<String>("ip").not_null())
        .build()
        .unwrap();
    let empty = ContractDescriptor::builder("EmptyEvent").build().unwrap();

    let required = RecordingHandler::new();
    manager.registry().register(
        "required-ip",
        ListenerSpec::any().pull("ip"),
        required.clone(),
    );
    let optional = RecordingHandler::new();
    manager.registry().register(
        "optional-ip",
        ListenerSpec::any().pull_optional("ip"),
        optional.clone(),
    );

    let synthesizer = manager.synthesizer();
    let events = [
        synthesizer
            .synthesize(&connect)
            .unwrap()
            .construct(vec![Value::new(String::from("10.0.0.1"))])
            .unwrap(),
        synthesizer
            .synthesize(&disconnect)
            .unwrap()
            .construct(vec![Value::new(String::from("10.0.0.2"))])
            .unwrap(),
        synthesizer.synthesize(&empty).unwrap().construct(vec![]).unwrap(),
    ];

    let mut skipped = 0;
    for event in &events {
        let result = manager.dispatch_all(event, "test").await;
        skipped += result
            .outcomes()
            .iter()
            .filter(|o| {
                matches!(
                    o.status,
                    ListenStatus::Skipped(SkipReason::MissingProperty(_))
                )
            })
            .count();
    }

    // The required pull fires for the two events carrying `ip` and skips the
    // third; the optional pull fires for all three, binding `None` once.
    assert_eq!(required.count(), 2);
    assert_eq!(
        required.arguments_as::<String>(),
        [Some("10.0.0.1".to_string()), Some("10.0.0.2".to_string())]
    );
    assert_eq!(optional.count(), 3);
    assert_eq!(
        optional.arguments_as::<String>(),
        [Some("10.0.0.1".to_string()), Some("10.0.0.2".to_string()), None]
    );
    assert_eq!(skipped, 1);
}

#[tokio::test]
async fn witness_bindings_match_exact_parameterization() {
    use eventum::{EventType, LogContext, PropertyType};

    let manager = EventManager::new();
    let contract = ContractDescriptor::builder("PayloadEvent")
        .property(PropertyDescriptor::of::<String>("label").not_null())
        .generic()
        .build()
        .unwrap();

    let stringy = CountingHandler::new();
    manager.registry().register(
        "stringy",
        ListenerSpec::of(&contract).witness(PropertyType::of::<String>()),
        stringy.clone(),
    );
    let any = CountingHandler::new();
    manager
        .registry()
        .register("any", ListenerSpec::of(&contract), any.clone());

    let ty = manager.synthesizer().synthesize(&contract).unwrap();
    let string_event = ty
        .construct_with_witness(
            vec![Value::new(String::from("a"))],
            Some(PropertyType::of::<String>()),
        )
        .unwrap();
    let int_event = ty
        .construct_with_witness(
            vec![Value::new(String::from("b"))],
            Some(PropertyType::of::<i64>()),
        )
        .unwrap();

    manager.dispatch_all(&string_event, "test").await;
    manager.dispatch_all(&int_event, "test").await;
    assert_eq!(stringy.count(), 1);
    assert_eq!(any.count(), 2);

    // An explicit declared type overrides the instance's own witness.
    manager
        .dispatch_as(
            &int_event,
            &EventType::with_witness(&contract, PropertyType::of::<String>()),
            "test",
            eventum::ALL,
            &LogContext::new(),
        )
        .await;
    assert_eq!(stringy.count(), 2);
}

#[tokio::test]
async fn unregistered_listeners_stop_receiving() {
    let manager = EventManager::new();
    let contract = login_contract();

    let counter = CountingHandler::new();
    let id = manager
        .registry()
        .register("counter", ListenerSpec::of(&contract), counter.clone());

    let event = login_event(&manager, "Player");
    manager.dispatch_all(&event, "test").await;
    assert!(manager.registry().unregister(id));
    manager.dispatch_all(&event, "test").await;

    assert_eq!(counter.count(), 1);
}
