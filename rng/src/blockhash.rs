//! Blockhash-derived randomness, with oracle escalation above a budget
//! threshold.
//!
//! Below the threshold a request commits to the hash of the next block:
//! the value becomes derivable once that block has itself been built upon
//! (a two-block latency) and stays derivable for the 256-block retrieval
//! window. At or above the threshold the request is escalated to the VRF
//! oracle, paying the oracle fee from this service's own held balance.

use crate::events::{EventLog, RngEvent};
use crate::oracle::derive_seed;
use crate::{RngError, RngRequest, RngService};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tombola_chain::{BlockSource, FeeToken, VrfOracle, BLOCKHASH_WINDOW};
use tombola_types::{Address, KeyHash, RandomValue, TokenAmount};

#[derive(Clone, Copy)]
struct Settings {
    key_hash: KeyHash,
    fee: TokenAmount,
    threshold: TokenAmount,
}

struct Request {
    lock_block: u64,
    escalated: bool,
}

/// Randomness from a future block hash, escalating to the oracle when the
/// caller's budget meets the configured threshold.
///
/// Escalation is off until the owner configures a non-zero threshold.
pub struct BlockhashRng {
    address: Address,
    owner: Address,
    chain: Arc<dyn BlockSource>,
    token: Arc<dyn FeeToken>,
    oracle: Arc<dyn VrfOracle>,
    settings: Mutex<Settings>,
    request_count: AtomicU64,
    seed_nonce: AtomicU64,
    requests: Mutex<HashMap<u64, Request>>,
    random_numbers: Mutex<HashMap<u64, RandomValue>>,
    /// Oracle correlation id -> local request id, for escalated requests
    /// awaiting their callback. Entries are consumed on fulfillment.
    pending_vrf: Mutex<HashMap<u64, u64>>,
    events: EventLog,
}

impl BlockhashRng {
    pub fn new(
        address: Address,
        owner: Address,
        chain: Arc<dyn BlockSource>,
        token: Arc<dyn FeeToken>,
        oracle: Arc<dyn VrfOracle>,
    ) -> Self {
        Self {
            address,
            owner,
            chain,
            token,
            oracle,
            settings: Mutex::new(Settings {
                key_hash: KeyHash::ZERO,
                fee: TokenAmount::ZERO,
                threshold: TokenAmount::ZERO,
            }),
            request_count: AtomicU64::new(0),
            seed_nonce: AtomicU64::new(0),
            requests: Mutex::new(HashMap::new()),
            random_numbers: Mutex::new(HashMap::new()),
            pending_vrf: Mutex::new(HashMap::new()),
            events: EventLog::new(),
        }
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

    /// Set the oracle proving key used for escalated requests. Owner-only.
    pub fn set_keyhash(&self, caller: Address, key_hash: KeyHash) -> Result<(), RngError> {
        self.ensure_owner(caller)?;
        if key_hash.is_zero() {
            return Err(RngError::EmptyKeyHash);
        }
        self.settings.lock().unwrap().key_hash = key_hash;
        self.events.emit(RngEvent::KeyHashSet(key_hash));
        Ok(())
    }

    /// Set the oracle fee paid per escalated request. Owner-only.
    pub fn set_fee(&self, caller: Address, fee: TokenAmount) -> Result<(), RngError> {
        self.ensure_owner(caller)?;
        if fee.is_zero() {
            return Err(RngError::ZeroFee);
        }
        self.settings.lock().unwrap().fee = fee;
        self.events.emit(RngEvent::FeeSet(fee));
        Ok(())
    }

    /// Set the budget threshold at which requests escalate. Owner-only.
    pub fn set_threshold(&self, caller: Address, threshold: TokenAmount) -> Result<(), RngError> {
        self.ensure_owner(caller)?;
        if threshold.is_zero() {
            return Err(RngError::ZeroThreshold);
        }
        self.settings.lock().unwrap().threshold = threshold;
        self.events.emit(RngEvent::ThresholdSet(threshold));
        Ok(())
    }

    /// Withdraw fee tokens held by this service to the owner. Owner-only.
    ///
    /// Fails with `InsufficientBalance` when `amount` exceeds the held
    /// balance and `TransferFailed` when the token refuses the transfer.
    pub fn withdraw(&self, caller: Address, amount: TokenAmount) -> Result<(), RngError> {
        self.ensure_owner(caller)?;
        let available = self.token.balance_of(self.address);
        if amount > available {
            return Err(RngError::InsufficientBalance {
                requested: amount.raw(),
                available: available.raw(),
            });
        }
        if !self.token.transfer(self.owner, amount) {
            return Err(RngError::TransferFailed);
        }
        Ok(())
    }

    /// Inbound oracle callback for escalated requests.
    ///
    /// Only the registered oracle address may deliver it; a correlation id
    /// with no outstanding request is a protocol violation and is rejected
    /// without state change.
    pub fn fulfill_randomness(
        &self,
        caller: Address,
        correlation_id: u64,
        value: RandomValue,
    ) -> Result<(), RngError> {
        if caller != self.oracle.address() {
            return Err(RngError::InvalidVrfCoordinator(caller));
        }
        let id = self
            .pending_vrf
            .lock()
            .unwrap()
            .remove(&correlation_id)
            .ok_or(RngError::UnknownCorrelationId(correlation_id))?;
        self.random_numbers.lock().unwrap().insert(id, value);
        self.events.emit(RngEvent::RandomNumberCompleted { id, value });
        Ok(())
    }

    fn derive_from_blockhash(&self, id: u64, lock_block: u64) -> Result<RandomValue, RngError> {
        let mut values = self.random_numbers.lock().unwrap();
        if let Some(value) = values.get(&id) {
            return Ok(*value);
        }
        match self.chain.block_hash(lock_block) {
            Some(hash) => {
                let mut hasher = Sha256::new();
                hasher.update(id.to_be_bytes());
                hasher.update(hash.as_bytes());
                let value = RandomValue::new(hasher.finalize().into());
                values.insert(id, value);
                drop(values);
                self.events.emit(RngEvent::RandomNumberCompleted { id, value });
                Ok(value)
            }
            None if self.chain.block_number() > lock_block + BLOCKHASH_WINDOW => {
                Err(RngError::ResultExpired { id, lock_block })
            }
            // Lock block not yet built upon: still pending.
            None => Ok(RandomValue::ZERO),
        }
    }
}

impl RngService for BlockhashRng {
    fn address(&self) -> Address {
        self.address
    }

    fn request_random_number(
        &self,
        caller: Address,
        token: Address,
        budget: TokenAmount,
    ) -> Result<RngRequest, RngError> {
        let settings = *self.settings.lock().unwrap();
        let current = self.chain.block_number();
        let escalate = !settings.threshold.is_zero() && budget >= settings.threshold;

        if escalate {
            // Collaborator calls precede the id allocation so a refused
            // transfer consumes no id.
            let nonce = self.seed_nonce.fetch_add(1, Ordering::SeqCst);
            let seed = derive_seed(settings.key_hash, caller, nonce);
            if !self
                .token
                .transfer_and_call(self.oracle.address(), settings.fee, &seed)
            {
                return Err(RngError::TransferFailed);
            }
            let correlation_id = self.oracle.request_randomness(settings.key_hash, seed);
            let id = self.request_count.fetch_add(1, Ordering::SeqCst) + 1;
            self.pending_vrf.lock().unwrap().insert(correlation_id, id);
            self.requests.lock().unwrap().insert(
                id,
                Request {
                    lock_block: current,
                    escalated: true,
                },
            );
            self.events.emit(RngEvent::VrfRequested { id, correlation_id });
            self.events.emit(RngEvent::RandomNumberRequested {
                id,
                requestor: caller,
                token,
                budget,
            });
            return Ok(RngRequest {
                id,
                lock_block: current,
            });
        }

        let id = self.request_count.fetch_add(1, Ordering::SeqCst) + 1;
        let lock_block = current + 1;
        self.requests.lock().unwrap().insert(
            id,
            Request {
                lock_block,
                escalated: false,
            },
        );
        self.events.emit(RngEvent::RandomNumberRequested {
            id,
            requestor: caller,
            token,
            budget,
        });
        Ok(RngRequest { id, lock_block })
    }

    fn is_request_complete(&self, request_id: u64) -> Result<bool, RngError> {
        if self
            .random_numbers
            .lock()
            .unwrap()
            .contains_key(&request_id)
        {
            return Ok(true);
        }
        let requests = self.requests.lock().unwrap();
        let Some(request) = requests.get(&request_id) else {
            return Ok(false);
        };
        if request.escalated {
            return Ok(false);
        }
        Ok(self.chain.is_hash_available(request.lock_block))
    }

    fn random_number(&self, request_id: u64) -> Result<RandomValue, RngError> {
        let (lock_block, escalated) = {
            let requests = self.requests.lock().unwrap();
            match requests.get(&request_id) {
                Some(request) => (request.lock_block, request.escalated),
                None => return Ok(RandomValue::ZERO),
            }
        };
        if escalated {
            return Ok(self
                .random_numbers
                .lock()
                .unwrap()
                .get(&request_id)
                .copied()
                .unwrap_or(RandomValue::ZERO));
        }
        self.derive_from_blockhash(request_id, lock_block)
    }

    fn get_request_fee(&self) -> Result<(Address, TokenAmount), RngError> {
        // Callers are never charged directly; escalation is paid from the
        // service's held balance.
        Ok((Address::ZERO, TokenAmount::ZERO))
    }

    fn get_last_request_id(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }
}
