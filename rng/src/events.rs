//! Protocol events, for observability and external indexing.
//!
//! Each service owns an [`EventLog`]: an inspectable in-memory record of
//! everything a chain indexer would see, mirrored to `tracing` for live
//! observability. Tests assert against the log the way the original
//! integrations assert against emitted events.

use serde::Serialize;
use std::sync::Mutex;
use tombola_chain::WordsRequest;
use tombola_types::{Address, KeyHash, RandomValue, TokenAmount};

/// An event emitted by an RNG service or the coordinator.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum RngEvent {
    RandomNumberRequested {
        id: u64,
        requestor: Address,
        token: Address,
        budget: TokenAmount,
    },
    RandomNumberCompleted {
        id: u64,
        value: RandomValue,
    },
    /// An oracle request was issued; `correlation_id` is the oracle's own
    /// identifier for it.
    VrfRequested {
        id: u64,
        correlation_id: u64,
    },
    KeyHashSet(KeyHash),
    FeeSet(TokenAmount),
    ThresholdSet(TokenAmount),
    SubscriptionIdSet(u64),
    CallbackGasLimitSet(u32),
    RequestConfirmationsSet(u16),
    NumWordsSet(u32),
    StartBlockSet(u64),
    BlockStepSet(u64),
    ManagerSet(Address),
    VrfCoordinatorSet(Address),
    RequestConfigSet(WordsRequest),
    RngServiceAdded {
        service: Address,
        offset: u64,
    },
}

/// Append-only event record for one service.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<RngEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `event` and mirror it to tracing.
    pub fn emit(&self, event: RngEvent) {
        tracing::info!(event = ?event, "rng event");
        self.events.lock().unwrap().push(event);
    }

    /// Snapshot of all events emitted so far, in order.
    pub fn events(&self) -> Vec<RngEvent> {
        self.events.lock().unwrap().clone()
    }

    /// The most recent event, if any.
    pub fn last(&self) -> Option<RngEvent> {
        self.events.lock().unwrap().last().cloned()
    }

    /// Whether `event` has been emitted.
    pub fn contains(&self, event: &RngEvent) -> bool {
        self.events.lock().unwrap().contains(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_preserves_emission_order() {
        let log = EventLog::new();
        log.emit(RngEvent::FeeSet(TokenAmount::new(1)));
        log.emit(RngEvent::ThresholdSet(TokenAmount::new(10)));

        let events = log.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], RngEvent::FeeSet(TokenAmount::new(1)));
        assert_eq!(log.last(), Some(RngEvent::ThresholdSet(TokenAmount::new(10))));
    }

    #[test]
    fn contains_matches_exact_event() {
        let log = EventLog::new();
        log.emit(RngEvent::SubscriptionIdSet(7));
        assert!(log.contains(&RngEvent::SubscriptionIdSet(7)));
        assert!(!log.contains(&RngEvent::SubscriptionIdSet(8)));
    }
}
