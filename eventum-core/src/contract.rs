//! Event contract descriptors.
//!
//! A contract is the abstract shape of an event: its properties, the
//! contracts it extends, whether it is cancellable, and the behaviors that
//! extensions must supply. Contracts are built once through
//! [`ContractDescriptor::builder`] and shared as [`ContractHandle`]s; the
//! build flattens inherited properties, detects conflicts, and injects the
//! implicit `cancelled` property, so the resulting descriptor is the fully
//! normalized input to type synthesis.

use crate::error::ContractError;
use crate::property::PropertyDescriptor;
use crate::value::PropertyType;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Name of the implicit cancellation property.
pub const CANCELLED: &str = "cancelled";

static NEXT_CONTRACT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide identity of a built contract descriptor.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ContractId(u64);

/// A shared, immutable contract descriptor.
pub type ContractHandle = Arc<ContractDescriptor>;

/// A non-property method the synthesized type must expose.
///
/// Behaviors are implemented by extensions; `aliases` lists additional names
/// the same implementation answers to, so that calls through a wider ancestor
/// signature still dispatch to the narrower implementation.
#[derive(Clone, Debug)]
pub struct BehaviorDescriptor {
    name: String,
    aliases: Vec<String>,
}

impl BehaviorDescriptor {
    /// Declare a behavior with no aliases.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
        }
    }

    /// Add an alias name that dispatches to the same implementation.
    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.aliases.push(name.into());
        self
    }

    /// Primary behavior name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alias names.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }
}

/// The normalized description of an event contract.
#[derive(Debug)]
pub struct ContractDescriptor {
    id: ContractId,
    name: String,
    properties: Vec<PropertyDescriptor>,
    super_contracts: Vec<ContractHandle>,
    behaviors: Vec<BehaviorDescriptor>,
    generic: bool,
    cancellable: bool,
    implicit_cancelled: bool,
    ancestry: BTreeSet<ContractId>,
}

impl ContractDescriptor {
    /// Start building a contract named `name`.
    pub fn builder(name: impl Into<String>) -> ContractBuilder {
        ContractBuilder {
            name: name.into(),
            properties: Vec::new(),
            super_contracts: Vec::new(),
            behaviors: Vec::new(),
            generic: false,
            cancellable: false,
        }
    }

    /// Unique identity of this descriptor.
    pub fn id(&self) -> ContractId {
        self.id
    }

    /// Contract name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Flattened properties in ancestor-then-self declaration order,
    /// de-duplicated by name and including any implicit `cancelled` slot.
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Look up a flattened property by name.
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// Directly extended contracts.
    pub fn super_contracts(&self) -> &[ContractHandle] {
        &self.super_contracts
    }

    /// Behaviors extensions must supply, including inherited ones.
    pub fn behaviors(&self) -> &[BehaviorDescriptor] {
        &self.behaviors
    }

    /// Whether the contract declares an open generic witness slot.
    pub fn is_generic(&self) -> bool {
        self.generic
    }

    /// Whether the contract carries cancellation semantics.
    pub fn is_cancellable(&self) -> bool {
        self.cancellable
    }

    /// Whether the `cancelled` property was synthesized rather than declared.
    ///
    /// Factories inject a literal `true` only for the implicit slot.
    pub fn has_implicit_cancelled(&self) -> bool {
        self.implicit_cancelled
    }

    /// Transitive set of contract ids this contract is assignable to,
    /// including itself.
    pub fn ancestry(&self) -> &BTreeSet<ContractId> {
        &self.ancestry
    }

    /// Whether events of this contract are assignable to `other`.
    pub fn extends(&self, other: ContractId) -> bool {
        self.ancestry.contains(&other)
    }
}

/// Builder for [`ContractDescriptor`].
pub struct ContractBuilder {
    name: String,
    properties: Vec<PropertyDescriptor>,
    super_contracts: Vec<ContractHandle>,
    behaviors: Vec<BehaviorDescriptor>,
    generic: bool,
    cancellable: bool,
}

impl ContractBuilder {
    /// Declare a property. Declaration order is constructor order.
    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    /// Extend another contract; its properties and behaviors are inherited.
    pub fn extends(mut self, contract: &ContractHandle) -> Self {
        self.super_contracts.push(Arc::clone(contract));
        self
    }

    /// Declare a behavior that extensions must implement.
    pub fn behavior(mut self, behavior: BehaviorDescriptor) -> Self {
        self.behaviors.push(behavior);
        self
    }

    /// Declare an open generic witness slot.
    pub fn generic(mut self) -> Self {
        self.generic = true;
        self
    }

    /// Give the contract cancellation semantics. A `cancelled: bool`
    /// property is synthesized if not declared.
    pub fn cancellable(mut self) -> Self {
        self.cancellable = true;
        self
    }

    /// Flatten, check conflicts, and produce the shared descriptor.
    pub fn build(self) -> Result<ContractHandle, ContractError> {
        let mut properties: Vec<PropertyDescriptor> = Vec::new();
        let mut behaviors: Vec<BehaviorDescriptor> = Vec::new();
        let mut ancestry = BTreeSet::new();

        for sup in &self.super_contracts {
            ancestry.extend(sup.ancestry().iter().copied());
            for prop in sup.properties() {
                merge_property(&self.name, &mut properties, prop.clone())?;
            }
            for behavior in sup.behaviors() {
                merge_behavior(&mut behaviors, behavior.clone());
            }
        }

        for mut prop in self.properties {
            prop.set_owner(&self.name);
            merge_property(&self.name, &mut properties, prop)?;
        }
        for behavior in self.behaviors {
            merge_behavior(&mut behaviors, behavior);
        }

        let cancellable =
            self.cancellable || self.super_contracts.iter().any(|s| s.is_cancellable());
        let inherited_implicit = self
            .super_contracts
            .iter()
            .any(|s| s.has_implicit_cancelled());
        let mut implicit_cancelled = inherited_implicit;
        if cancellable && !properties.iter().any(|p| p.name() == CANCELLED) {
            let mut cancelled = PropertyDescriptor::of::<bool>(CANCELLED)
                .mutable()
                .not_null();
            cancelled.set_owner(&self.name);
            properties.push(cancelled);
            implicit_cancelled = true;
        }

        let id = ContractId(NEXT_CONTRACT_ID.fetch_add(1, Ordering::Relaxed));
        ancestry.insert(id);

        Ok(Arc::new(ContractDescriptor {
            id,
            name: self.name,
            properties,
            super_contracts: self.super_contracts,
            behaviors,
            generic: self.generic,
            cancellable,
            implicit_cancelled,
            ancestry,
        }))
    }
}

fn merge_property(
    contract: &str,
    properties: &mut Vec<PropertyDescriptor>,
    prop: PropertyDescriptor,
) -> Result<(), ContractError> {
    match properties.iter_mut().find(|p| p.name() == prop.name()) {
        None => properties.push(prop),
        Some(existing) => {
            if existing.declared_type() != prop.declared_type() {
                return Err(ContractError::Conflict {
                    contract: contract.to_string(),
                    property: prop.name().to_string(),
                    first: existing.declared_type().name().to_string(),
                    second: prop.declared_type().name().to_string(),
                });
            }
            // Later declaration refines the earlier one (mutability,
            // validators) while keeping its position in constructor order.
            *existing = prop;
        }
    }
    Ok(())
}

fn merge_behavior(behaviors: &mut Vec<BehaviorDescriptor>, behavior: BehaviorDescriptor) {
    match behaviors.iter_mut().find(|b| b.name() == behavior.name()) {
        None => behaviors.push(behavior),
        Some(existing) => {
            for alias in behavior.aliases {
                if !existing.aliases.contains(&alias) {
                    existing.aliases.push(alias);
                }
            }
        }
    }
}

/// The declared runtime type of a dispatched event: a contract plus an
/// optional generic witness.
///
/// Equality and hashing consider the contract identity and the witness only.
#[derive(Clone)]
pub struct EventType {
    contract: ContractHandle,
    witness: Option<PropertyType>,
}

impl EventType {
    /// Type of a plain (non-parameterized) event of `contract`.
    pub fn of(contract: &ContractHandle) -> Self {
        Self {
            contract: Arc::clone(contract),
            witness: None,
        }
    }

    /// Type of an event of `contract` parameterized with `witness`.
    pub fn with_witness(contract: &ContractHandle, witness: PropertyType) -> Self {
        Self {
            contract: Arc::clone(contract),
            witness: Some(witness),
        }
    }

    /// The contract.
    pub fn contract(&self) -> &ContractHandle {
        &self.contract
    }

    /// The contract identity.
    pub fn contract_id(&self) -> ContractId {
        self.contract.id()
    }

    /// Contract name, for diagnostics.
    pub fn name(&self) -> &str {
        self.contract.name()
    }

    /// The generic witness, if any.
    pub fn witness(&self) -> Option<PropertyType> {
        self.witness
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.contract.id() == other.contract.id() && self.witness == other.witness
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.contract.id().hash(state);
        self.witness.hash(state);
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.witness {
            Some(w) => write!(f, "{}<{}>", self.contract.name(), w),
            None => f.write_str(self.contract.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ContractHandle {
        ContractDescriptor::builder("BaseEvent")
            .property(PropertyDescriptor::of::<String>("id").not_null())
            .build()
            .unwrap()
    }

    #[test]
    fn flattens_ancestor_then_self() {
        let base = base();
        let child = ContractDescriptor::builder("ChildEvent")
            .extends(&base)
            .property(PropertyDescriptor::of::<i64>("amount"))
            .build()
            .unwrap();

        let names: Vec<_> = child.properties().iter().map(|p| p.name()).collect();
        assert_eq!(names, ["id", "amount"]);
        assert_eq!(child.property("id").unwrap().owner(), "BaseEvent");
        assert!(child.extends(base.id()));
        assert!(child.extends(child.id()));
        assert!(!base.extends(child.id()));
    }

    #[test]
    fn duplicate_same_type_collapses() {
        let base = base();
        let child = ContractDescriptor::builder("ChildEvent")
            .extends(&base)
            .property(PropertyDescriptor::of::<String>("id").not_null().mutable())
            .build()
            .unwrap();

        assert_eq!(child.properties().len(), 1);
        assert!(child.property("id").unwrap().is_mutable());
    }

    #[test]
    fn incompatible_inherited_types_conflict() {
        let a = ContractDescriptor::builder("A")
            .property(PropertyDescriptor::of::<String>("value"))
            .build()
            .unwrap();
        let b = ContractDescriptor::builder("B")
            .property(PropertyDescriptor::of::<i64>("value"))
            .build()
            .unwrap();

        let err = ContractDescriptor::builder("C")
            .extends(&a)
            .extends(&b)
            .build()
            .unwrap_err();
        let ContractError::Conflict { property, .. } = err;
        assert_eq!(property, "value");
    }

    #[test]
    fn cancellable_synthesizes_cancelled() {
        let c = ContractDescriptor::builder("CancelEvent")
            .property(PropertyDescriptor::of::<i64>("amount"))
            .cancellable()
            .build()
            .unwrap();

        let cancelled = c.property(CANCELLED).unwrap();
        assert!(cancelled.is_mutable());
        assert!(!cancelled.is_nullable());
        assert!(c.has_implicit_cancelled());
        assert_eq!(c.properties().last().unwrap().name(), CANCELLED);
    }

    #[test]
    fn declared_cancelled_is_not_implicit() {
        let c = ContractDescriptor::builder("CancelEvent")
            .property(PropertyDescriptor::of::<bool>(CANCELLED).mutable().not_null())
            .cancellable()
            .build()
            .unwrap();

        assert!(c.is_cancellable());
        assert!(!c.has_implicit_cancelled());
    }

    #[test]
    fn cancellable_inherited() {
        let sup = ContractDescriptor::builder("Cancellable")
            .cancellable()
            .build()
            .unwrap();
        let child = ContractDescriptor::builder("Child")
            .extends(&sup)
            .build()
            .unwrap();

        assert!(child.is_cancellable());
        assert!(child.has_implicit_cancelled());
        assert!(child.property(CANCELLED).is_some());
    }

    #[test]
    fn event_type_equality() {
        let base = base();
        let plain = EventType::of(&base);
        let stringy = EventType::with_witness(&base, PropertyType::of::<String>());
        let inty = EventType::with_witness(&base, PropertyType::of::<i64>());

        assert_eq!(plain, EventType::of(&base));
        assert_ne!(plain, stringy);
        assert_ne!(stringy, inty);
    }
}
