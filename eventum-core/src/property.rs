//! Property descriptors and validators.

use crate::value::{PropertyType, Value};
use std::fmt;
use std::sync::Arc;

/// A value predicate attached to a property and run on every write.
#[derive(Clone)]
pub struct Validator {
    label: String,
    check: Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>,
}

impl Validator {
    /// Create a validator. `label` identifies it in diagnostics.
    pub fn new<F>(label: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            check: Arc::new(check),
        }
    }

    /// Run the predicate against `value`.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        (self.check)(value)
    }

    /// Diagnostic label.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validator({})", self.label)
    }
}

/// A named, typed value slot declared by an event contract.
///
/// Declaration order within a contract is fixed and equals constructor
/// argument order on the synthesized type.
#[derive(Clone, Debug)]
pub struct PropertyDescriptor {
    name: String,
    declared_type: PropertyType,
    mutable: bool,
    nullable: bool,
    validators: Vec<Validator>,
    owner: String,
}

impl PropertyDescriptor {
    /// Declare a nullable, immutable property of type `T`.
    pub fn of<T: Send + Sync + 'static>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: PropertyType::of::<T>(),
            mutable: false,
            nullable: true,
            validators: Vec::new(),
            owner: String::new(),
        }
    }

    /// Mark the property as having a setter.
    pub fn mutable(mut self) -> Self {
        self.mutable = true;
        self
    }

    /// Mark the property as rejecting absent values.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Append a validator; validators run in attachment order.
    pub fn validate<F>(mut self, label: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validators.push(Validator::new(label, check));
        self
    }

    pub(crate) fn set_owner(&mut self, owner: &str) {
        self.owner = owner.to_string();
    }

    /// Property name, unique within a contract.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared value type.
    pub fn declared_type(&self) -> PropertyType {
        self.declared_type
    }

    /// Whether the property has a setter.
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// Whether an absent value is accepted.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Attached validators, in run order.
    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    /// Name of the contract that declared this property.
    pub fn owner(&self) -> &str {
        &self.owner
    }
}

/// Derive a property name from a conventional accessor name.
///
/// `get_foo` and `is_foo` both yield `foo`; any other shape is taken as the
/// property name itself.
pub fn derive_property_name(accessor: &str) -> &str {
    accessor
        .strip_prefix("get_")
        .or_else(|| accessor.strip_prefix("is_"))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(accessor)
}
