//! Aggregated dispatch results.

use crate::error::ListenError;
use crate::listener::ListenerId;

/// Why a listener was skipped without being invoked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The listener ignores cancelled events and the event was cancelled.
    Cancelled,
    /// A required property pull found no value on the instance.
    MissingProperty(String),
}

/// The result of one listener slot within a dispatch.
#[derive(Debug)]
pub enum ListenStatus {
    /// The listener ran to completion.
    Success,
    /// The listener failed; the error is recorded here and logged, never
    /// propagated.
    Failed(ListenError),
    /// The listener was skipped before invocation.
    Skipped(SkipReason),
}

impl ListenStatus {
    /// Whether this outcome is [`ListenStatus::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Whether this outcome is [`ListenStatus::Failed`].
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// One listener's outcome within a dispatch, in execution order.
#[derive(Debug)]
pub struct ListenOutcome {
    /// Registrant identity of the listener.
    pub owner: String,
    /// Registry identity of the listener.
    pub listener: ListenerId,
    /// What happened.
    pub status: ListenStatus,
}

/// The aggregated result of dispatching one event.
///
/// Listener failures are isolated per listener; this result is the only
/// channel through which callers learn of partial failure. Results from
/// independent dispatchers over the same event may be merged with
/// [`combine`](Self::combine).
#[derive(Debug, Default)]
pub struct DispatchResult {
    channel: String,
    outcomes: Vec<ListenOutcome>,
}

impl DispatchResult {
    /// Empty result for `channel`.
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            outcomes: Vec::new(),
        }
    }

    /// Record an outcome. Outcomes keep execution order.
    pub fn push(&mut self, outcome: ListenOutcome) {
        self.outcomes.push(outcome);
    }

    /// The channel this event was dispatched to.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Per-listener outcomes in execution order.
    pub fn outcomes(&self) -> &[ListenOutcome] {
        &self.outcomes
    }

    /// Whether no listener failed.
    pub fn is_success(&self) -> bool {
        !self.outcomes.iter().any(|o| o.status.is_failed())
    }

    /// Number of listeners that ran to completion.
    pub fn executed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_success()).count()
    }

    /// Outcomes of listeners that failed.
    pub fn failures(&self) -> impl Iterator<Item = &ListenOutcome> {
        self.outcomes.iter().filter(|o| o.status.is_failed())
    }

    /// Union of this result and `other`, in order.
    pub fn combine(mut self, other: DispatchResult) -> Self {
        self.outcomes.extend(other.outcomes);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(status: ListenStatus) -> ListenOutcome {
        ListenOutcome {
            owner: "test".into(),
            listener: ListenerId(0),
            status,
        }
    }

    #[test]
    fn success_accounting() {
        let mut result = DispatchResult::new("withdraw");
        result.push(outcome(ListenStatus::Success));
        result.push(outcome(ListenStatus::Skipped(SkipReason::Cancelled)));
        assert!(result.is_success());
        assert_eq!(result.executed(), 1);

        result.push(outcome(ListenStatus::Failed(ListenError::Panicked(
            "boom".into(),
        ))));
        assert!(!result.is_success());
        assert_eq!(result.failures().count(), 1);
    }

    #[test]
    fn combine_keeps_order() {
        let mut a = DispatchResult::new("withdraw");
        a.push(outcome(ListenStatus::Success));
        let mut b = DispatchResult::new("deposit");
        b.push(outcome(ListenStatus::Skipped(SkipReason::Cancelled)));

        let combined = a.combine(b);
        assert_eq!(combined.outcomes().len(), 2);
        assert!(combined.outcomes()[0].status.is_success());
    }
}
