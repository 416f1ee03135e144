//! Oracle-backed VRF randomness with per-request fee accounting.
//!
//! Each request charges the configured fee from the caller's approved
//! token balance, forwards it to the oracle alongside the request seed,
//! and then waits for the asynchronous fulfillment callback. The oracle
//! assigns its own correlation id at request time; the callback carries
//! only that id, so a side-mapping translates it back to the local
//! request id.

use crate::events::{EventLog, RngEvent};
use crate::{RngError, RngRequest, RngService};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tombola_chain::{BlockSource, FeeToken, VrfOracle};
use tombola_types::{Address, KeyHash, RandomValue, TokenAmount};

/// Request seed: the proving key, the requestor, and a per-request nonce.
pub(crate) fn derive_seed(key_hash: KeyHash, requestor: Address, nonce: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(key_hash.as_bytes());
    hasher.update(requestor.as_bytes());
    hasher.update(nonce.to_be_bytes());
    hasher.finalize().into()
}

#[derive(Clone, Copy)]
struct Settings {
    key_hash: KeyHash,
    fee: TokenAmount,
}

/// VRF oracle randomness, fee charged per request.
pub struct VrfOracleRng {
    address: Address,
    owner: Address,
    chain: Arc<dyn BlockSource>,
    token: Arc<dyn FeeToken>,
    oracle: Arc<dyn VrfOracle>,
    settings: Mutex<Settings>,
    request_count: AtomicU64,
    seed_nonce: AtomicU64,
    random_numbers: Mutex<HashMap<u64, RandomValue>>,
    /// Oracle correlation id -> local request id; consumed on fulfillment.
    pending: Mutex<HashMap<u64, u64>>,
    events: EventLog,
}

impl VrfOracleRng {
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
            }),
            request_count: AtomicU64::new(0),
            seed_nonce: AtomicU64::new(0),
            random_numbers: Mutex::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
            events: EventLog::new(),
        }
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// The fee token this service charges in.
    pub fn fee_token(&self) -> Address {
        self.token.address()
    }

    fn ensure_owner(&self, caller: Address) -> Result<(), RngError> {
        if caller != self.owner {
            return Err(RngError::NotOwner(caller));
        }
        Ok(())
    }

    /// Set the oracle proving key. Owner-only, non-zero.
    pub fn set_keyhash(&self, caller: Address, key_hash: KeyHash) -> Result<(), RngError> {
        self.ensure_owner(caller)?;
        if key_hash.is_zero() {
            return Err(RngError::EmptyKeyHash);
        }
        self.settings.lock().unwrap().key_hash = key_hash;
        self.events.emit(RngEvent::KeyHashSet(key_hash));
        Ok(())
    }

    /// Set the per-request fee. Owner-only, non-zero. Affects only
    /// subsequent requests; in-flight requests were charged at their own
    /// request time.
    pub fn set_fee(&self, caller: Address, fee: TokenAmount) -> Result<(), RngError> {
        self.ensure_owner(caller)?;
        if fee.is_zero() {
            return Err(RngError::ZeroFee);
        }
        self.settings.lock().unwrap().fee = fee;
        self.events.emit(RngEvent::FeeSet(fee));
        Ok(())
    }

    /// Withdraw fee tokens held by this service to the owner. Owner-only.
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

    /// Inbound oracle callback. Oracle-only; an unknown correlation id is
    /// rejected as a protocol violation.
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
            .pending
            .lock()
            .unwrap()
            .remove(&correlation_id)
            .ok_or(RngError::UnknownCorrelationId(correlation_id))?;
        self.random_numbers.lock().unwrap().insert(id, value);
        self.events.emit(RngEvent::RandomNumberCompleted { id, value });
        Ok(())
    }
}

impl RngService for VrfOracleRng {
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

        // Charge the caller, then forward the fee with the seed. Both
        // precede the id allocation so a refusal consumes no id.
        if !self.token.transfer_from(caller, self.address, settings.fee) {
            return Err(RngError::TransferFailed);
        }
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
        self.pending.lock().unwrap().insert(correlation_id, id);

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
        let fee = self.settings.lock().unwrap().fee;
        Ok((self.token.address(), fee))
    }

    fn get_last_request_id(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tombola_nullables::token::TokenCall;
    use tombola_nullables::{NullChain, NullOracle, NullToken};

    struct Fixture {
        rng: VrfOracleRng,
        token: Arc<NullToken>,
        oracle: Arc<NullOracle>,
        owner: Address,
        caller: Address,
    }

    fn fixture() -> Fixture {
        let chain = Arc::new(NullChain::new(500));
        let token = Arc::new(NullToken::new(Address::from_label("link")));
        let oracle = Arc::new(NullOracle::new(Address::from_label("vrf-coordinator")));
        let owner = Address::from_label("owner");
        let rng = VrfOracleRng::new(
            Address::from_label("rng-vrf"),
            owner,
            chain,
            token.clone(),
            oracle.clone(),
        );
        rng.set_keyhash(owner, KeyHash::new([0xce; 32])).unwrap();
        rng.set_fee(owner, TokenAmount::new(1)).unwrap();
        Fixture {
            rng,
            token,
            oracle,
            owner,
            caller: Address::from_label("alice"),
        }
    }

    #[test]
    fn request_charges_and_forwards_the_fee() {
        let f = fixture();
        let request = f
            .rng
            .request_random_number(f.caller, Address::from_label("link"), TokenAmount::new(1))
            .unwrap();
        assert_eq!(request.id, 1);
        assert_eq!(request.lock_block, 500);

        let calls = f.token.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0],
            TokenCall::TransferFrom {
                from: f.caller,
                to: Address::from_label("rng-vrf"),
                amount: TokenAmount::new(1),
            }
        );
        assert!(matches!(
            &calls[1],
            TokenCall::TransferAndCall { to, amount, data }
                if *to == Address::from_label("vrf-coordinator")
                    && *amount == TokenAmount::new(1)
                    && data.len() == 32
        ));
    }

    #[test]
    fn completion_is_deferred_until_fulfillment() {
        let f = fixture();
        let request = f
            .rng
            .request_random_number(f.caller, Address::ZERO, TokenAmount::new(1))
            .unwrap();
        assert!(!f.rng.is_request_complete(request.id).unwrap());
        assert_eq!(f.rng.random_number(request.id).unwrap(), RandomValue::ZERO);

        let value = RandomValue::from_u64(999);
        f.rng
            .fulfill_randomness(Address::from_label("vrf-coordinator"), 7001, value)
            .unwrap();
        assert!(f.rng.is_request_complete(request.id).unwrap());
        assert_eq!(f.rng.random_number(request.id).unwrap(), value);
        // Idempotent thereafter.
        assert_eq!(f.rng.random_number(request.id).unwrap(), value);
    }

    #[test]
    fn charge_refusal_fails_without_state_change() {
        let f = fixture();
        f.token.fail_transfer_from(true);
        assert_eq!(
            f.rng
                .request_random_number(f.caller, Address::ZERO, TokenAmount::new(1)),
            Err(RngError::TransferFailed)
        );
        assert_eq!(f.rng.get_last_request_id(), 0);
        assert!(f.oracle.randomness_requests().is_empty());
    }

    #[test]
    fn forward_refusal_fails_without_state_change() {
        let f = fixture();
        f.token.fail_transfer_and_call(true);
        assert_eq!(
            f.rng
                .request_random_number(f.caller, Address::ZERO, TokenAmount::new(1)),
            Err(RngError::TransferFailed)
        );
        assert_eq!(f.rng.get_last_request_id(), 0);
        assert!(f.oracle.randomness_requests().is_empty());
    }

    #[test]
    fn fulfillment_authentication() {
        let f = fixture();
        f.rng
            .request_random_number(f.caller, Address::ZERO, TokenAmount::new(1))
            .unwrap();

        let stranger = Address::from_label("stranger");
        assert_eq!(
            f.rng
                .fulfill_randomness(stranger, 7001, RandomValue::from_u64(1)),
            Err(RngError::InvalidVrfCoordinator(stranger))
        );
        assert_eq!(
            f.rng.fulfill_randomness(
                Address::from_label("vrf-coordinator"),
                12345,
                RandomValue::from_u64(1)
            ),
            Err(RngError::UnknownCorrelationId(12345))
        );
    }

    #[test]
    fn seeds_vary_per_request() {
        let f = fixture();
        f.rng
            .request_random_number(f.caller, Address::ZERO, TokenAmount::new(1))
            .unwrap();
        f.rng
            .request_random_number(f.caller, Address::ZERO, TokenAmount::new(1))
            .unwrap();

        let requests = f.oracle.randomness_requests();
        assert_eq!(requests.len(), 2);
        assert_ne!(requests[0].1, requests[1].1);
    }

    #[test]
    fn fee_quote_reflects_current_fee() {
        let f = fixture();
        assert_eq!(
            f.rng.get_request_fee().unwrap(),
            (Address::from_label("link"), TokenAmount::new(1))
        );

        f.rng.set_fee(f.owner, TokenAmount::new(3)).unwrap();
        assert_eq!(
            f.rng.get_request_fee().unwrap(),
            (Address::from_label("link"), TokenAmount::new(3))
        );
        assert!(f.rng.events().contains(&RngEvent::FeeSet(TokenAmount::new(3))));
    }

    #[test]
    fn owner_gate_on_setters() {
        let f = fixture();
        let stranger = Address::from_label("stranger");
        assert_eq!(
            f.rng.set_fee(stranger, TokenAmount::new(2)),
            Err(RngError::NotOwner(stranger))
        );
        assert_eq!(
            f.rng.set_keyhash(stranger, KeyHash::new([1; 32])),
            Err(RngError::NotOwner(stranger))
        );
        assert!(f.rng.set_fee(f.owner, TokenAmount::new(2)).is_ok());
    }

    #[test]
    fn fee_token_accessor() {
        let f = fixture();
        assert_eq!(f.rng.fee_token(), Address::from_label("link"));
    }
}
