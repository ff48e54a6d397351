//! The listener registry: binding storage and lookup.
//!
//! The registry stores listener bindings and answers lookup queries from
//! the dispatcher. It performs no scanning itself: discovery of listener
//! methods is the job of a [`ListenerSource`] collaborator, the registry
//! only stores what the source reports.

use crate::synth::EventInstance;
use eventum_core::{
    ALL, ContractFilter, DynListenerHandler, EventType, ListenerHandler, ListenerId,
    ListenerSpec,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// A shared listener handler over synthesized event instances.
pub type DynHandler = Arc<dyn DynListenerHandler<EventInstance>>;

/// A collaborator that reports the listener bindings carried by some object.
///
/// This is the stand-in for annotation scanning: implementors enumerate
/// their tagged methods as `(spec, handler)` pairs.
pub trait ListenerSource {
    /// The bindings to register.
    fn listeners(&self) -> Vec<(ListenerSpec, DynHandler)>;
}

struct Registration {
    id: ListenerId,
    owner: String,
    seq: u64,
    spec: ListenerSpec,
    handler: DynHandler,
}

/// A binding resolved for one dispatch, in execution order.
pub struct ResolvedBinding {
    /// Registry identity.
    pub id: ListenerId,
    /// Registrant identity.
    pub owner: String,
    /// The binding's metadata.
    pub spec: ListenerSpec,
    /// The executable handler.
    pub handler: DynHandler,
}

/// Mapping from event types (and channels) to ordered listener bindings.
///
/// Registration is assumed to happen-before any dispatch that observes the
/// new binding; each lookup takes a snapshot under the read lock, so
/// concurrent registration never disturbs an in-flight dispatch.
pub struct ListenerRegistry {
    entries: RwLock<Vec<Registration>>,
    next: AtomicU64,
}

impl ListenerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            next: AtomicU64::new(1),
        }
    }

    /// Register one listener binding.
    pub fn register<H>(&self, owner: &str, spec: ListenerSpec, handler: H) -> ListenerId
    where
        H: ListenerHandler<EventInstance>,
    {
        self.register_dyn(owner, spec, Arc::new(handler))
    }

    /// Register one listener binding from a shared handler.
    pub fn register_dyn(&self, owner: &str, spec: ListenerSpec, handler: DynHandler) -> ListenerId {
        let seq = self.next.fetch_add(1, Ordering::Relaxed);
        let id = ListenerId(seq);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Registration {
                id,
                owner: owner.to_string(),
                seq,
                spec,
                handler,
            });
        id
    }

    /// Register every binding reported by `source`.
    pub fn register_all(&self, owner: &str, source: &dyn ListenerSource) -> Vec<ListenerId> {
        source
            .listeners()
            .into_iter()
            .map(|(spec, handler)| self.register_dyn(owner, spec, handler))
            .collect()
    }

    /// Remove one binding. Returns whether it existed.
    pub fn unregister(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|r| r.id != id);
        entries.len() != before
    }

    /// Remove every binding registered under `owner`. Returns the count.
    pub fn unregister_owner(&self, owner: &str) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|r| r.owner != owner);
        before - entries.len()
    }

    /// Number of registered bindings.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no binding is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve the bindings interested in `declared` on `channel`, sorted
    /// ascending by priority with registration order breaking ties.
    ///
    /// A binding matches when its contract filter admits the declared type
    /// (exact contract, a supertype, or `Any`), its witness is absent or
    /// equal to the declared witness, and its channel set includes the
    /// dispatch channel (an [`ALL`] dispatch reaches every binding).
    pub fn lookup(&self, declared: &EventType, channel: &str) -> Vec<ResolvedBinding> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut matched: Vec<&Registration> = entries
            .iter()
            .filter(|r| {
                let contract_ok = match &r.spec.filter {
                    ContractFilter::Any => true,
                    ContractFilter::Contract(c) => declared.contract().extends(c.id()),
                };
                let witness_ok = match r.spec.witness {
                    None => true,
                    Some(w) => declared.witness() == Some(w),
                };
                let channel_ok = channel == ALL || r.spec.channels.contains(channel);
                contract_ok && witness_ok && channel_ok
            })
            .collect();
        matched.sort_by_key(|r| (r.spec.priority, r.seq));
        matched
            .into_iter()
            .map(|r| ResolvedBinding {
                id: r.id,
                owner: r.owner.clone(),
                spec: r.spec.clone(),
                handler: Arc::clone(&r.handler),
            })
            .collect()
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
