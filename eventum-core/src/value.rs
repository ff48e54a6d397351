//! Dynamically typed property values.
//!
//! Synthesized events store their properties as [`Value`] slots instead of
//! generated fields. A `Value` remembers the concrete Rust type it was built
//! from, so accessors can check it against the property's declared type and
//! listeners can downcast it back.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

/// Identity of a Rust type usable as a property type or a generic witness.
///
/// Two `PropertyType`s compare equal exactly when they were captured from the
/// same concrete type.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyType {
    id: TypeId,
    name: &'static str,
}

impl PropertyType {
    /// Capture the identity of `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// The captured [`TypeId`].
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The full path name of the captured type.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Debug for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyType({})", self.name)
    }
}

/// Marker stored inside [`Value::null`].
struct NullValue;

/// A shared, dynamically typed property value.
///
/// Cloning is O(1); the payload is behind an [`Arc`].
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Any + Send + Sync>,
    ty: PropertyType,
}

impl Value {
    /// Wrap `value`.
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            ty: PropertyType::of::<T>(),
        }
    }

    /// An explicit "no value" marker.
    ///
    /// Constructors treat a null argument as an absent value: nullable
    /// properties store nothing, non-nullable properties reject it.
    pub fn null() -> Self {
        Self::new(NullValue)
    }

    /// Whether this value is the [`Value::null`] marker.
    pub fn is_null(&self) -> bool {
        self.is::<NullValue>()
    }

    /// Whether the payload is a `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.ty.id() == TypeId::of::<T>()
    }

    /// Borrow the payload as a `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }

    /// Clone the payload out as a `T`.
    pub fn get<T: Clone + 'static>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }

    /// The type identity of the payload.
    pub fn property_type(&self) -> PropertyType {
        self.ty
    }
}

impl PartialEq for Value {
    /// Identity comparison: two values are equal when both are the
    /// [`Value::null`] marker or when they share the same payload allocation.
    fn eq(&self, other: &Self) -> bool {
        (self.is_null() && other.is_null()) || Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("Value(null)")
        } else {
            write!(f, "Value({})", self.ty.name())
        }
    }
}
