//! Extension specifications: externally supplied behavior merged into a
//! synthesized type.
//!
//! An extension contributes a capability (an additional interface the
//! synthesized type implements), method implementations for contract
//! behaviors, and optionally property accessor overrides. The executable
//! side is an [`ExtensionDelegate`] obtained through the specification's
//! [`DelegateFactory`]; a builder-style factory receives the freshly
//! constructed event instance as its sole dependency.

use crate::synth::model::EventInstance;
use eventum_core::{BoxError, Value};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_EXTENSION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide identity of an extension specification.
///
/// Part of the synthesis cache key: two synthesize requests share a type
/// exactly when they name the same contract and the same extension set.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ExtensionId(u64);

/// The runtime behavior an extension plugs into synthesized instances.
///
/// `call` handles behavior invocations routed through the instance's method
/// table. The `get`/`set` hooks back property accessor overrides; they are
/// consulted only for properties the specification declares overridden.
pub trait ExtensionDelegate: Send + Sync + 'static {
    /// Invoke a provided method.
    fn call(&self, method: &str, args: &[Value]) -> Result<Value, BoxError>;

    /// Read an overridden property.
    fn get(&self, property: &str) -> Option<Value> {
        let _ = property;
        None
    }

    /// Write an overridden property.
    fn set(&self, property: &str, value: Value) -> Result<(), BoxError> {
        let _ = value;
        Err(format!("extension does not override setter for `{property}`").into())
    }
}

/// How to obtain an [`ExtensionDelegate`] for a new instance.
#[derive(Clone)]
pub enum DelegateFactory {
    /// A pre-built delegate shared by every instance.
    Instance(Arc<dyn ExtensionDelegate>),
    /// Built per instance, with the event itself as sole constructor
    /// argument.
    Builder(Arc<dyn Fn(EventInstance) -> Arc<dyn ExtensionDelegate> + Send + Sync>),
}

impl fmt::Debug for DelegateFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(_) => f.write_str("DelegateFactory::Instance"),
            Self::Builder(_) => f.write_str("DelegateFactory::Builder"),
        }
    }
}

/// A property accessor override claimed by an extension.
///
/// An extension may override a mutable property only by supplying both
/// getter and setter; immutable properties may be overridden by getter
/// alone. When a property is fully overridden the synthesizer omits its
/// storage slot.
#[derive(Clone, Debug)]
pub struct PropertyOverride {
    /// Property name.
    pub name: String,
    /// Whether the getter is supplied.
    pub getter: bool,
    /// Whether the setter is supplied.
    pub setter: bool,
}

/// Specification of one extension attached to a synthesized type.
#[derive(Clone, Debug)]
pub struct ExtensionSpecification {
    id: ExtensionId,
    owner: String,
    capability: Option<String>,
    provides: Vec<String>,
    overrides: Vec<PropertyOverride>,
    delegate: DelegateFactory,
}

impl ExtensionSpecification {
    /// Start building an extension registered by `owner`.
    pub fn builder(owner: impl Into<String>) -> ExtensionBuilder {
        ExtensionBuilder {
            owner: owner.into(),
            capability: None,
            provides: Vec::new(),
            overrides: Vec::new(),
        }
    }

    /// Cache-key identity.
    pub fn id(&self) -> ExtensionId {
        self.id
    }

    /// Registrant identity, for bookkeeping.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The capability name the synthesized type additionally implements.
    pub fn capability(&self) -> Option<&str> {
        self.capability.as_deref()
    }

    /// Method names this extension implements.
    pub fn provides(&self) -> &[String] {
        &self.provides
    }

    /// Whether this extension implements `method`.
    pub fn provides_method(&self, method: &str) -> bool {
        self.provides.iter().any(|m| m == method)
    }

    /// Claimed property overrides.
    pub fn overrides(&self) -> &[PropertyOverride] {
        &self.overrides
    }

    /// Look up an override claim by property name.
    pub fn override_for(&self, property: &str) -> Option<&PropertyOverride> {
        self.overrides.iter().find(|o| o.name == property)
    }

    /// The delegate factory.
    pub fn delegate(&self) -> &DelegateFactory {
        &self.delegate
    }
}

/// Builder for [`ExtensionSpecification`].
pub struct ExtensionBuilder {
    owner: String,
    capability: Option<String>,
    provides: Vec<String>,
    overrides: Vec<PropertyOverride>,
}

impl ExtensionBuilder {
    /// Name the capability the synthesized type will additionally implement.
    pub fn capability(mut self, name: impl Into<String>) -> Self {
        self.capability = Some(name.into());
        self
    }

    /// Declare a method this extension implements.
    pub fn provides(mut self, method: impl Into<String>) -> Self {
        self.provides.push(method.into());
        self
    }

    /// Override both accessors of a property; its storage slot is omitted.
    pub fn override_property(mut self, name: impl Into<String>) -> Self {
        self.overrides.push(PropertyOverride {
            name: name.into(),
            getter: true,
            setter: true,
        });
        self
    }

    /// Override only the getter of a property. Valid alone only for
    /// immutable properties.
    pub fn override_getter(mut self, name: impl Into<String>) -> Self {
        self.overrides.push(PropertyOverride {
            name: name.into(),
            getter: true,
            setter: false,
        });
        self
    }

    /// Finish with a shared pre-built delegate.
    pub fn delegate_instance(
        self,
        delegate: Arc<dyn ExtensionDelegate>,
    ) -> ExtensionSpecification {
        self.finish(DelegateFactory::Instance(delegate))
    }

    /// Finish with a per-instance delegate builder; the closure receives the
    /// constructed event as its sole dependency.
    pub fn delegate_with<F>(self, build: F) -> ExtensionSpecification
    where
        F: Fn(EventInstance) -> Arc<dyn ExtensionDelegate> + Send + Sync + 'static,
    {
        self.finish(DelegateFactory::Builder(Arc::new(build)))
    }

    fn finish(self, delegate: DelegateFactory) -> ExtensionSpecification {
        ExtensionSpecification {
            id: ExtensionId(NEXT_EXTENSION_ID.fetch_add(1, Ordering::Relaxed)),
            owner: self.owner,
            capability: self.capability,
            provides: self.provides,
            overrides: self.overrides,
            delegate,
        }
    }
}
