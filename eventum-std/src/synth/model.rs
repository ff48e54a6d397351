//! Synthesized event types and their instances.
//!
//! A [`SynthesizedType`] is the concrete implementation produced for one
//! `(contract, extension-set)` pair. Rather than emitting code, it is a
//! data-driven record: a constructor order over the retained properties, a
//! name-to-slot map, an override table resolved once at synthesis time, and
//! a method table routing behaviors (and their bridge aliases) to extension
//! delegates. An [`EventInstance`] is a cheap-clone handle over one
//! property-holder backing store, satisfying the contract interpretively by
//! name/index lookup.

use crate::synth::extension::{DelegateFactory, ExtensionDelegate, ExtensionSpecification};
use eventum_core::{
    BoxError, CANCELLED, ContractHandle, EventType, EventumError, PropertyDescriptor,
    PropertyType, SynthesisError, ValidationError, Value,
};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

static NEXT_TYPE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a synthesized type, the key of the constructor plan cache.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SynthesizedTypeId(u64);

/// The concrete, instantiable type produced for a contract plus extensions.
pub struct SynthesizedType {
    id: SynthesizedTypeId,
    contract: ContractHandle,
    extensions: Vec<ExtensionSpecification>,
    /// Retained properties in flattened declaration order; constructor
    /// argument order. Fully overridden properties are omitted.
    constructor_order: Vec<PropertyDescriptor>,
    /// Property name to storage slot index.
    slots: HashMap<String, usize>,
    /// Property name to extension index supplying the getter.
    getter_overrides: HashMap<String, usize>,
    /// Property name to extension index supplying the setter.
    setter_overrides: HashMap<String, usize>,
    /// Behavior or alias name to extension index.
    methods: HashMap<String, usize>,
    capabilities: BTreeSet<String>,
}

impl SynthesizedType {
    pub(crate) fn build(
        contract: ContractHandle,
        extensions: Vec<ExtensionSpecification>,
    ) -> Result<Arc<Self>, EventumError> {
        let mut getter_overrides = HashMap::new();
        let mut setter_overrides = HashMap::new();

        // Resolve the override table once: per property, storage is owned by
        // the core unless the extension set together fully overrides it.
        for property in contract.properties() {
            let mut getter = None;
            let mut setter = None;
            for (index, ext) in extensions.iter().enumerate() {
                if let Some(claim) = ext.override_for(property.name()) {
                    if claim.getter {
                        getter.get_or_insert(index);
                    }
                    if claim.setter {
                        setter.get_or_insert(index);
                    }
                }
            }
            match (getter, setter) {
                (None, None) => {}
                (Some(g), Some(s)) => {
                    getter_overrides.insert(property.name().to_string(), g);
                    setter_overrides.insert(property.name().to_string(), s);
                }
                (Some(g), None) if !property.is_mutable() => {
                    getter_overrides.insert(property.name().to_string(), g);
                }
                _ => {
                    return Err(SynthesisError::IncompleteOverride {
                        event: contract.name().to_string(),
                        property: property.name().to_string(),
                    }
                    .into());
                }
            }
        }

        let fully_overridden = |p: &PropertyDescriptor| {
            getter_overrides.contains_key(p.name())
                && (!p.is_mutable() || setter_overrides.contains_key(p.name()))
        };

        let constructor_order: Vec<PropertyDescriptor> = contract
            .properties()
            .iter()
            .filter(|p| !fully_overridden(p))
            .cloned()
            .collect();
        let slots = constructor_order
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name().to_string(), i))
            .collect();

        // Behaviors must be provided by an extension; aliases land on the
        // same entry so calls through a wider ancestor name still dispatch
        // to the providing delegate.
        let mut methods = HashMap::new();
        for behavior in contract.behaviors() {
            let Some(index) = extensions
                .iter()
                .position(|e| e.provides_method(behavior.name()))
            else {
                return Err(SynthesisError::UnimplementedBehavior {
                    event: contract.name().to_string(),
                    behavior: behavior.name().to_string(),
                }
                .into());
            };
            methods.insert(behavior.name().to_string(), index);
            for alias in behavior.aliases() {
                methods.insert(alias.clone(), index);
            }
        }
        for (index, ext) in extensions.iter().enumerate() {
            for method in ext.provides() {
                methods.entry(method.clone()).or_insert(index);
            }
        }

        let capabilities = extensions
            .iter()
            .filter_map(|e| e.capability().map(str::to_string))
            .collect();

        Ok(Arc::new(Self {
            id: SynthesizedTypeId(NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed)),
            contract,
            extensions,
            constructor_order,
            slots,
            getter_overrides,
            setter_overrides,
            methods,
            capabilities,
        }))
    }

    /// Identity of this type.
    pub fn identity(&self) -> SynthesizedTypeId {
        self.id
    }

    /// The backing contract.
    pub fn contract(&self) -> &ContractHandle {
        &self.contract
    }

    /// Attached extension specifications.
    pub fn extensions(&self) -> &[ExtensionSpecification] {
        &self.extensions
    }

    /// Retained properties in constructor argument order.
    pub fn constructor_order(&self) -> &[PropertyDescriptor] {
        &self.constructor_order
    }

    /// Capabilities contributed by extensions.
    pub fn capabilities(&self) -> &BTreeSet<String> {
        &self.capabilities
    }

    /// Construct an instance; one argument per retained property, in
    /// constructor order. [`Value::null`] counts as an absent value.
    pub fn construct(
        self: &Arc<Self>,
        args: Vec<Value>,
    ) -> Result<EventInstance, EventumError> {
        self.construct_with_witness(args, None)
    }

    /// Construct an instance carrying a generic witness type.
    pub fn construct_with_witness(
        self: &Arc<Self>,
        args: Vec<Value>,
        witness: Option<PropertyType>,
    ) -> Result<EventInstance, EventumError> {
        if args.len() != self.constructor_order.len() {
            return Err(ValidationError::ArityMismatch {
                event: self.contract.name().to_string(),
                expected: self.constructor_order.len(),
                supplied: args.len(),
            }
            .into());
        }

        let mut slots = Vec::with_capacity(args.len());
        for (property, arg) in self.constructor_order.iter().zip(args) {
            slots.push(self.admit(property, arg)?);
        }

        let instance = EventInstance {
            inner: Arc::new(InstanceInner {
                ty: Arc::clone(self),
                slots: RwLock::new(slots),
                delegates: OnceLock::new(),
                witness,
            }),
        };

        // Delegates are built after the inner handle exists so builder-style
        // factories can take the event as their sole constructor argument.
        let delegates: Vec<Arc<dyn ExtensionDelegate>> = self
            .extensions
            .iter()
            .map(|ext| match ext.delegate() {
                DelegateFactory::Instance(delegate) => Arc::clone(delegate),
                DelegateFactory::Builder(build) => build(instance.clone()),
            })
            .collect();
        let _ = instance.inner.delegates.set(delegates);

        Ok(instance)
    }

    /// Validate one value against a property; `Ok(None)` is an accepted
    /// absent value.
    fn admit(
        &self,
        property: &PropertyDescriptor,
        value: Value,
    ) -> Result<Option<Value>, EventumError> {
        if value.is_null() {
            if !property.is_nullable() {
                return Err(ValidationError::NullProperty {
                    event: self.contract.name().to_string(),
                    property: property.name().to_string(),
                }
                .into());
            }
            return Ok(None);
        }
        if value.property_type() != property.declared_type() {
            return Err(ValidationError::TypeMismatch {
                event: self.contract.name().to_string(),
                property: property.name().to_string(),
                expected: property.declared_type().name().to_string(),
                found: value.property_type().name().to_string(),
            }
            .into());
        }
        for validator in property.validators() {
            validator
                .check(&value)
                .map_err(|reason| ValidationError::Rejected {
                    event: self.contract.name().to_string(),
                    property: property.name().to_string(),
                    validator: validator.label().to_string(),
                    reason,
                })?;
        }
        Ok(Some(value))
    }
}

impl fmt::Debug for SynthesizedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynthesizedType")
            .field("contract", &self.contract.name())
            .field("extensions", &self.extensions.len())
            .field(
                "constructor_order",
                &self
                    .constructor_order
                    .iter()
                    .map(|p| p.name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

struct InstanceInner {
    ty: Arc<SynthesizedType>,
    slots: RwLock<Vec<Option<Value>>>,
    delegates: OnceLock<Vec<Arc<dyn ExtensionDelegate>>>,
    witness: Option<PropertyType>,
}

/// A runtime instance of a synthesized event type.
///
/// Cloning is O(1); clones share the same property storage, so a mutation
/// made by one listener is observed by the next.
#[derive(Clone)]
pub struct EventInstance {
    inner: Arc<InstanceInner>,
}

impl EventInstance {
    /// The synthesized type of this instance.
    pub fn synthesized_type(&self) -> &Arc<SynthesizedType> {
        &self.inner.ty
    }

    /// The backing contract.
    pub fn contract(&self) -> &ContractHandle {
        self.inner.ty.contract()
    }

    /// The declared runtime type: contract plus witness.
    pub fn event_type(&self) -> EventType {
        match self.inner.witness {
            Some(w) => EventType::with_witness(self.contract(), w),
            None => EventType::of(self.contract()),
        }
    }

    /// The generic witness carried by this instance, if any.
    pub fn witness(&self) -> Option<PropertyType> {
        self.inner.witness
    }

    /// Whether the contract declares a property named `name`.
    pub fn has_property(&self, name: &str) -> bool {
        self.contract().property(name).is_some()
    }

    /// Read a property. Returns `None` for unknown properties and for
    /// nullable properties holding no value.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(&index) = self.inner.ty.getter_overrides.get(name) {
            return self.delegates().get(index).and_then(|d| d.get(name));
        }
        let index = *self.inner.ty.slots.get(name)?;
        self.read_slots().get(index).cloned().flatten()
    }

    /// Read a property and downcast it.
    pub fn get_as<T: Clone + 'static>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(|v| v.get())
    }

    /// Write a property, enforcing mutability, the declared type, and the
    /// property's validators.
    pub fn set(&self, name: &str, value: Value) -> Result<(), EventumError> {
        let ty = &self.inner.ty;
        let Some(property) = ty.contract().property(name) else {
            return Err(ValidationError::UnknownProperty {
                event: ty.contract().name().to_string(),
                property: name.to_string(),
            }
            .into());
        };
        if !property.is_mutable() {
            return Err(ValidationError::Immutable {
                event: ty.contract().name().to_string(),
                property: name.to_string(),
            }
            .into());
        }
        if let Some(&index) = ty.setter_overrides.get(name) {
            let delegate = self
                .delegates()
                .get(index)
                .cloned()
                .ok_or_else(|| -> BoxError { "extension delegate missing".into() })
                .map_err(EventumError::Custom)?;
            return delegate.set(name, value).map_err(EventumError::Custom);
        }
        let admitted = ty.admit(property, value)?;
        if let Some(&index) = ty.slots.get(name) {
            self.write_slots()[index] = admitted;
        }
        Ok(())
    }

    /// Invoke a behavior (or one of its bridge aliases) through the
    /// providing extension delegate.
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Value, EventumError> {
        let Some(&index) = self.inner.ty.methods.get(method) else {
            return Err(SynthesisError::UnknownBehavior {
                event: self.contract().name().to_string(),
                behavior: method.to_string(),
            }
            .into());
        };
        let delegate = self
            .delegates()
            .get(index)
            .cloned()
            .ok_or_else(|| -> BoxError { "extension delegate missing".into() })
            .map_err(EventumError::Custom)?;
        delegate.call(method, args).map_err(EventumError::Custom)
    }

    /// Whether an attached extension contributes `capability`.
    pub fn implements(&self, capability: &str) -> bool {
        self.inner.ty.capabilities.contains(capability)
    }

    /// Current cancellation flag; `false` when the contract has none.
    pub fn is_cancelled(&self) -> bool {
        self.get_as::<bool>(CANCELLED).unwrap_or(false)
    }

    /// Flip the cancellation flag. Fails on non-cancellable contracts.
    pub fn set_cancelled(&self, cancelled: bool) -> Result<(), EventumError> {
        self.set(CANCELLED, Value::new(cancelled))
    }

    fn delegates(&self) -> &[Arc<dyn ExtensionDelegate>] {
        self.inner
            .delegates
            .get()
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn read_slots(&self) -> std::sync::RwLockReadGuard<'_, Vec<Option<Value>>> {
        self.inner
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_slots(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Option<Value>>> {
        self.inner
            .slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for EventInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventInstance({:?})", self.event_type())
    }
}
