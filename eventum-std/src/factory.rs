//! Factory synthesis: named-argument construction of event instances.
//!
//! A factory contract declares methods that return an event type and take
//! named parameters. Building the factory resolves each eager method's
//! synthesized type up front; lazy methods defer to first invocation and
//! re-resolve on every call, which is how they observe extensions
//! registered after the factory was built.
//!
//! Construction is the hot path of the system. The name-to-constructor-slot
//! binding is therefore computed once per synthesized type and cached as a
//! [`ConstructorPlan`]: an ordered list of "take named argument i" /
//! "inject literal `true`" instructions applied on every call. Each factory
//! owns its plan cache, keyed by synthesized-type identity — methods of one
//! factory producing the same event type share one plan, which requires them
//! to declare consistent parameter names; independent factories never share
//! plans.

use crate::synth::{
    EventInstance, EventSynthesizer, ExtensionSpecification, SynthesizedType, SynthesizedTypeId,
};
use eventum_core::{
    CANCELLED, ContractHandle, EventumError, FactoryError, PropertyType, Value,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// One named parameter of a factory method.
#[derive(Clone, Debug)]
pub struct FactoryParameter {
    name: String,
    witness: bool,
}

impl FactoryParameter {
    /// Parameter name; must match a constructor slot of the target type.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this parameter carries the generic witness instead of a
    /// property value.
    pub fn is_witness(&self) -> bool {
        self.witness
    }
}

/// Declarative description of one factory method.
#[derive(Clone, Debug)]
pub struct FactoryMethodDescriptor {
    name: String,
    target: ContractHandle,
    extensions: Vec<ExtensionSpecification>,
    parameters: Vec<FactoryParameter>,
    lazy: bool,
}

impl FactoryMethodDescriptor {
    /// Start describing a method named `name` producing events of `target`.
    pub fn builder(name: impl Into<String>, target: &ContractHandle) -> FactoryMethodBuilder {
        FactoryMethodBuilder {
            descriptor: FactoryMethodDescriptor {
                name: name.into(),
                target: Arc::clone(target),
                extensions: Vec::new(),
                parameters: Vec::new(),
                lazy: false,
            },
        }
    }

    /// Method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Target event contract.
    pub fn target(&self) -> &ContractHandle {
        &self.target
    }

    /// Declared parameters, in call order.
    pub fn parameters(&self) -> &[FactoryParameter] {
        &self.parameters
    }

    /// Whether synthesis is deferred until first invocation.
    pub fn is_lazy(&self) -> bool {
        self.lazy
    }
}

/// Builder for [`FactoryMethodDescriptor`].
pub struct FactoryMethodBuilder {
    descriptor: FactoryMethodDescriptor,
}

impl FactoryMethodBuilder {
    /// Declare a named parameter bound to the property of the same name.
    pub fn parameter(mut self, name: impl Into<String>) -> Self {
        self.descriptor.parameters.push(FactoryParameter {
            name: name.into(),
            witness: false,
        });
        self
    }

    /// Declare the generic-witness parameter. Callers pass a
    /// [`PropertyType`] value in this position.
    pub fn witness_parameter(mut self, name: impl Into<String>) -> Self {
        self.descriptor.parameters.push(FactoryParameter {
            name: name.into(),
            witness: true,
        });
        self
    }

    /// Attach a request-scoped extension to the target type.
    pub fn extension(mut self, spec: ExtensionSpecification) -> Self {
        self.descriptor.extensions.push(spec);
        self
    }

    /// Defer type synthesis until the method is first invoked.
    pub fn lazy(mut self) -> Self {
        self.descriptor.lazy = true;
        self
    }

    /// Finish the method description.
    pub fn build(self) -> FactoryMethodDescriptor {
        self.descriptor
    }
}

/// Declarative description of a factory contract.
#[derive(Clone, Debug)]
pub struct FactoryDescriptor {
    name: String,
    methods: Vec<FactoryMethodDescriptor>,
}

impl FactoryDescriptor {
    /// Start describing a factory named `name`.
    pub fn builder(name: impl Into<String>) -> FactoryBuilder {
        FactoryBuilder {
            descriptor: FactoryDescriptor {
                name: name.into(),
                methods: Vec::new(),
            },
        }
    }

    /// Factory name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared methods.
    pub fn methods(&self) -> &[FactoryMethodDescriptor] {
        &self.methods
    }
}

/// Builder for [`FactoryDescriptor`].
pub struct FactoryBuilder {
    descriptor: FactoryDescriptor,
}

impl FactoryBuilder {
    /// Add a method.
    pub fn method(mut self, method: FactoryMethodDescriptor) -> Self {
        self.descriptor.methods.push(method);
        self
    }

    /// Finish the factory description.
    pub fn build(self) -> FactoryDescriptor {
        self.descriptor
    }
}

/// One instruction of a constructor plan.
#[derive(Clone, Copy, Debug)]
enum PlanStep {
    /// Take the caller's argument at this index.
    Argument(usize),
    /// Inject a literal `true` for the implicit cancelled slot.
    CancelledTrue,
}

/// The memoized argument-reordering function for one synthesized type.
#[derive(Debug)]
pub struct ConstructorPlan {
    steps: Vec<PlanStep>,
}

impl ConstructorPlan {
    fn compute(
        ty: &SynthesizedType,
        parameters: &[FactoryParameter],
    ) -> Result<Self, EventumError> {
        let mut steps = Vec::with_capacity(ty.constructor_order().len());
        for slot in ty.constructor_order() {
            if let Some(index) = parameters
                .iter()
                .position(|p| !p.witness && p.name == slot.name())
            {
                steps.push(PlanStep::Argument(index));
            } else if slot.name() == CANCELLED && ty.contract().has_implicit_cancelled() {
                steps.push(PlanStep::CancelledTrue);
            } else {
                return Err(FactoryError::UnresolvedProperty {
                    event: ty.contract().name().to_string(),
                    property: slot.name().to_string(),
                    supplied: parameters.iter().map(|p| p.name.clone()).collect(),
                }
                .into());
            }
        }
        Ok(Self { steps })
    }

    /// A plan computed for one method may be applied by a sibling method
    /// sharing the target type; an argument position the caller did not
    /// supply is an error, never an out-of-bounds read.
    fn apply(&self, method: &str, args: &[Value]) -> Result<Vec<Value>, EventumError> {
        self.steps
            .iter()
            .map(|step| match step {
                PlanStep::Argument(index) => {
                    args.get(*index).cloned().ok_or_else(|| {
                        FactoryError::PlanMismatch {
                            method: method.to_string(),
                            index: *index,
                        }
                        .into()
                    })
                }
                PlanStep::CancelledTrue => Ok(Value::new(true)),
            })
            .collect()
    }
}

/// One factory's thread-safe cache of constructor plans keyed by
/// synthesized-type identity.
struct PlanCache {
    plans: Mutex<HashMap<SynthesizedTypeId, Arc<ConstructorPlan>>>,
}

impl PlanCache {
    fn new() -> Self {
        Self {
            plans: Mutex::new(HashMap::new()),
        }
    }

    fn plan_for(
        &self,
        ty: &SynthesizedType,
        parameters: &[FactoryParameter],
    ) -> Result<Arc<ConstructorPlan>, EventumError> {
        let mut plans = self.plans.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(plan) = plans.get(&ty.identity()) {
            return Ok(Arc::clone(plan));
        }
        let plan = Arc::new(ConstructorPlan::compute(ty, parameters)?);
        plans.insert(ty.identity(), Arc::clone(&plan));
        Ok(plan)
    }

    fn len(&self) -> usize {
        self.plans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

enum TargetResolution {
    Eager(Arc<SynthesizedType>),
    Lazy,
}

struct FactoryMethod {
    descriptor: FactoryMethodDescriptor,
    target: TargetResolution,
    witness_index: Option<usize>,
}

/// A concrete factory implementing a [`FactoryDescriptor`].
pub struct EventFactory {
    name: String,
    methods: HashMap<String, FactoryMethod>,
    synthesizer: Arc<EventSynthesizer>,
    plans: PlanCache,
}

impl EventFactory {
    /// Factory name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of constructor plans this factory currently caches.
    pub fn plan_count(&self) -> usize {
        self.plans.len()
    }

    /// Invoke a factory method with positional arguments matching its
    /// declared parameter order. [`Value::null`] passes an absent value.
    pub fn create(&self, method: &str, args: Vec<Value>) -> Result<EventInstance, EventumError> {
        let Some(entry) = self.methods.get(method) else {
            return Err(FactoryError::UnknownMethod {
                factory: self.name.clone(),
                method: method.to_string(),
            }
            .into());
        };
        let parameters = entry.descriptor.parameters();
        if args.len() != parameters.len() {
            return Err(FactoryError::ArityMismatch {
                method: method.to_string(),
                expected: parameters.len(),
                supplied: args.len(),
            }
            .into());
        }

        let ty = match &entry.target {
            TargetResolution::Eager(ty) => Arc::clone(ty),
            TargetResolution::Lazy => self.synthesizer.synthesize_with(
                entry.descriptor.target(),
                entry.descriptor.extensions.clone(),
            )?,
        };

        let witness = match entry.witness_index {
            Some(index) => Some(args[index].get::<PropertyType>().ok_or(
                FactoryError::InvalidWitness {
                    method: method.to_string(),
                },
            )?),
            None => None,
        };

        let plan = self.plans.plan_for(&ty, parameters)?;
        ty.construct_with_witness(plan.apply(method, &args)?, witness)
    }
}

impl EventSynthesizer {
    /// Build a concrete factory for `descriptor`. Eager methods synthesize
    /// their target type now; lazy methods defer to first invocation.
    pub fn build_factory(
        self: &Arc<Self>,
        descriptor: FactoryDescriptor,
    ) -> Result<EventFactory, EventumError> {
        let mut methods = HashMap::with_capacity(descriptor.methods.len());
        for method in descriptor.methods {
            let witness_index = method.parameters.iter().position(|p| p.witness);
            let target = if method.lazy {
                TargetResolution::Lazy
            } else {
                TargetResolution::Eager(
                    self.synthesize_with(&method.target, method.extensions.clone())?,
                )
            };
            methods.insert(
                method.name.clone(),
                FactoryMethod {
                    descriptor: method,
                    target,
                    witness_index,
                },
            );
        }
        Ok(EventFactory {
            name: descriptor.name,
            methods,
            synthesizer: Arc::clone(self),
            plans: PlanCache::new(),
        })
    }
}
