//! Oracle-backed VRF randomness with subscription fee accounting.
//!
//! No tokens move at request time — fees are debited from a subscription
//! registered with the oracle network out-of-band. Configuration authority
//! (the owner) is separated from request-issuing authority (the manager):
//! only the manager may issue requests.

use crate::events::{EventLog, RngEvent};
use crate::{RngError, RngRequest, RngService};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tombola_chain::{BlockSource, SubscriptionVrfOracle, WordsRequest};
use tombola_types::{Address, KeyHash, RandomValue, TokenAmount};

/// Subscription-funded VRF randomness.
pub struct SubscriptionVrfRng {
    address: Address,
    owner: Address,
    manager: Mutex<Option<Address>>,
    chain: Arc<dyn BlockSource>,
    oracle: Arc<dyn SubscriptionVrfOracle>,
    config: Mutex<WordsRequest>,
    request_count: AtomicU64,
    random_numbers: Mutex<HashMap<u64, RandomValue>>,
    /// Two-way correlation <-> internal id maps. Retained after
    /// fulfillment so historical lookups stay valid; the completion check
    /// guards against double fulfillment.
    by_correlation: Mutex<HashMap<u64, u64>>,
    by_internal: Mutex<HashMap<u64, u64>>,
    events: EventLog,
}

fn validate_config(config: &WordsRequest) -> Result<(), RngError> {
    if config.subscription_id == 0 {
        return Err(RngError::ZeroSubscriptionId);
    }
    if config.callback_gas_limit == 0 {
        return Err(RngError::ZeroCallbackGasLimit);
    }
    if config.request_confirmations == 0 {
        return Err(RngError::ZeroRequestConfirmations);
    }
    if config.num_words == 0 {
        return Err(RngError::ZeroNumWords);
    }
    if config.key_hash.is_zero() {
        return Err(RngError::EmptyKeyHash);
    }
    Ok(())
}

impl SubscriptionVrfRng {
    /// Build the service, failing fast — before any state is committed —
    /// on a zero oracle address or any non-positive configuration value.
    pub fn new(
        address: Address,
        owner: Address,
        chain: Arc<dyn BlockSource>,
        oracle: Arc<dyn SubscriptionVrfOracle>,
        config: WordsRequest,
    ) -> Result<Self, RngError> {
        if oracle.address().is_zero() {
            return Err(RngError::ZeroOracleAddress);
        }
        validate_config(&config)?;

        let events = EventLog::new();
        events.emit(RngEvent::VrfCoordinatorSet(oracle.address()));
        events.emit(RngEvent::RequestConfigSet(config));
        Ok(Self {
            address,
            owner,
            manager: Mutex::new(None),
            chain,
            oracle,
            config: Mutex::new(config),
            request_count: AtomicU64::new(0),
            random_numbers: Mutex::new(HashMap::new()),
            by_correlation: Mutex::new(HashMap::new()),
            by_internal: Mutex::new(HashMap::new()),
            events,
        })
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    fn ensure_owner(&self, caller: Address) -> Result<(), RngError> {
        if caller != self.owner {
            return Err(RngError::NotOwner(caller));
        }
        Ok(())
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn vrf_coordinator(&self) -> Address {
        self.oracle.address()
    }

    pub fn subscription_id(&self) -> u64 {
        self.config.lock().unwrap().subscription_id
    }

    pub fn request_config(&self) -> WordsRequest {
        *self.config.lock().unwrap()
    }

    pub fn manager(&self) -> Option<Address> {
        *self.manager.lock().unwrap()
    }

    /// The internal request id an oracle correlation id maps to.
    pub fn internal_request_id(&self, correlation_id: u64) -> Option<u64> {
        self.by_correlation
            .lock()
            .unwrap()
            .get(&correlation_id)
            .copied()
    }

    /// The oracle correlation id an internal request id maps to.
    pub fn correlation_id(&self, internal_id: u64) -> Option<u64> {
        self.by_internal.lock().unwrap().get(&internal_id).copied()
    }

    // ── Owner surface ──────────────────────────────────────────────────

    /// Appoint the request-issuing principal. Owner-only, non-zero.
    pub fn set_manager(&self, caller: Address, manager: Address) -> Result<(), RngError> {
        self.ensure_owner(caller)?;
        if manager.is_zero() {
            return Err(RngError::ZeroManagerAddress);
        }
        *self.manager.lock().unwrap() = Some(manager);
        self.events.emit(RngEvent::ManagerSet(manager));
        Ok(())
    }

    pub fn set_subscription_id(&self, caller: Address, subscription_id: u64) -> Result<(), RngError> {
        self.ensure_owner(caller)?;
        if subscription_id == 0 {
            return Err(RngError::ZeroSubscriptionId);
        }
        self.config.lock().unwrap().subscription_id = subscription_id;
        self.events.emit(RngEvent::SubscriptionIdSet(subscription_id));
        Ok(())
    }

    pub fn set_callback_gas_limit(&self, caller: Address, gas_limit: u32) -> Result<(), RngError> {
        self.ensure_owner(caller)?;
        if gas_limit == 0 {
            return Err(RngError::ZeroCallbackGasLimit);
        }
        self.config.lock().unwrap().callback_gas_limit = gas_limit;
        self.events.emit(RngEvent::CallbackGasLimitSet(gas_limit));
        Ok(())
    }

    pub fn set_request_confirmations(
        &self,
        caller: Address,
        confirmations: u16,
    ) -> Result<(), RngError> {
        self.ensure_owner(caller)?;
        if confirmations == 0 {
            return Err(RngError::ZeroRequestConfirmations);
        }
        self.config.lock().unwrap().request_confirmations = confirmations;
        self.events
            .emit(RngEvent::RequestConfirmationsSet(confirmations));
        Ok(())
    }

    pub fn set_num_words(&self, caller: Address, num_words: u32) -> Result<(), RngError> {
        self.ensure_owner(caller)?;
        if num_words == 0 {
            return Err(RngError::ZeroNumWords);
        }
        self.config.lock().unwrap().num_words = num_words;
        self.events.emit(RngEvent::NumWordsSet(num_words));
        Ok(())
    }

    pub fn set_keyhash(&self, caller: Address, key_hash: KeyHash) -> Result<(), RngError> {
        self.ensure_owner(caller)?;
        if key_hash.is_zero() {
            return Err(RngError::EmptyKeyHash);
        }
        self.config.lock().unwrap().key_hash = key_hash;
        self.events.emit(RngEvent::KeyHashSet(key_hash));
        Ok(())
    }

    // ── Oracle callback ────────────────────────────────────────────────

    /// Inbound fulfillment carrying the oracle's random words.
    ///
    /// Oracle-only. A correlation id that is not outstanding — never
    /// issued, or already fulfilled — is rejected as a protocol violation.
    /// The first word becomes the request's random value.
    pub fn fulfill_random_words(
        &self,
        caller: Address,
        correlation_id: u64,
        words: &[RandomValue],
    ) -> Result<(), RngError> {
        if caller != self.oracle.address() {
            return Err(RngError::InvalidVrfCoordinator(caller));
        }
        let id = self
            .internal_request_id(correlation_id)
            .ok_or(RngError::UnknownCorrelationId(correlation_id))?;
        let mut values = self.random_numbers.lock().unwrap();
        if values.contains_key(&id) {
            return Err(RngError::UnknownCorrelationId(correlation_id));
        }
        let value = *words.first().ok_or(RngError::EmptyFulfillment)?;
        values.insert(id, value);
        drop(values);
        self.events.emit(RngEvent::RandomNumberCompleted { id, value });
        Ok(())
    }
}

impl RngService for SubscriptionVrfRng {
    fn address(&self) -> Address {
        self.address
    }

    /// Manager-only: configuration authority and request-issuing authority
    /// are separate principals.
    fn request_random_number(
        &self,
        caller: Address,
        token: Address,
        budget: TokenAmount,
    ) -> Result<RngRequest, RngError> {
        if self.manager().map_or(true, |manager| caller != manager) {
            return Err(RngError::NotManager(caller));
        }

        let config = *self.config.lock().unwrap();
        let correlation_id = self.oracle.request_random_words(&config);
        let id = self.request_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.by_correlation.lock().unwrap().insert(correlation_id, id);
        self.by_internal.lock().unwrap().insert(id, correlation_id);

        let lock_block = self.chain.block_number();
        self.events.emit(RngEvent::VrfRequested { id, correlation_id });
        self.events.emit(RngEvent::RandomNumberRequested {
            id,
            requestor: caller,
            token,
            budget,
        });
        Ok(RngRequest { id, lock_block })
    }

    fn is_request_complete(&self, request_id: u64) -> Result<bool, RngError> {
        Ok(self
            .random_numbers
            .lock()
            .unwrap()
            .contains_key(&request_id))
    }

    fn random_number(&self, request_id: u64) -> Result<RandomValue, RngError> {
        Ok(self
            .random_numbers
            .lock()
            .unwrap()
            .get(&request_id)
            .copied()
            .unwrap_or(RandomValue::ZERO))
    }

    fn get_request_fee(&self) -> Result<(Address, TokenAmount), RngError> {
        // The subscription absorbs fees; callers are never charged.
        Ok((Address::ZERO, TokenAmount::ZERO))
    }

    fn get_last_request_id(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }
}
