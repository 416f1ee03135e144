//! Beacon-pulse randomness — polling a third-party beacon's schedule.
//!
//! The beacon publishes at fixed block intervals. A request locks onto the
//! next pulse at or after the current block; from then on both poll
//! operations simply read the beacon at that pulse. There is no local
//! completion transition: reads are idempotent and side-effect-free, and
//! a pulse the beacon has not yet published for reads as incomplete.

use crate::events::{EventLog, RngEvent};
use crate::{RngError, RngRequest, RngService};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tombola_chain::{BlockSource, RandomnessBeacon};
use tombola_types::{Address, RandomValue, TokenAmount};

#[derive(Clone, Copy)]
struct Schedule {
    start_block: u64,
    block_step: u64,
}

impl Schedule {
    /// The next pulse at or after `current`.
    fn next_pulse(&self, current: u64) -> u64 {
        if current <= self.start_block {
            return self.start_block;
        }
        let elapsed = current - self.start_block;
        let steps = elapsed.div_ceil(self.block_step);
        self.start_block + steps * self.block_step
    }
}

/// Randomness read from a beacon at computed pulse blocks.
pub struct BeaconPulseRng {
    address: Address,
    owner: Address,
    chain: Arc<dyn BlockSource>,
    beacon: Arc<dyn RandomnessBeacon>,
    schedule: Mutex<Schedule>,
    request_count: AtomicU64,
    lock_blocks: Mutex<HashMap<u64, u64>>,
    events: EventLog,
}

impl BeaconPulseRng {
    /// Build the service. The pulse step must be non-zero.
    pub fn new(
        address: Address,
        owner: Address,
        chain: Arc<dyn BlockSource>,
        beacon: Arc<dyn RandomnessBeacon>,
        start_block: u64,
        block_step: u64,
    ) -> Result<Self, RngError> {
        if block_step == 0 {
            return Err(RngError::ZeroBlockStep);
        }
        Ok(Self {
            address,
            owner,
            chain,
            beacon,
            schedule: Mutex::new(Schedule {
                start_block,
                block_step,
            }),
            request_count: AtomicU64::new(0),
            lock_blocks: Mutex::new(HashMap::new()),
            events: EventLog::new(),
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

    /// Move the schedule origin. Owner-only; affects subsequent requests.
    pub fn set_start_block(&self, caller: Address, start_block: u64) -> Result<(), RngError> {
        self.ensure_owner(caller)?;
        self.schedule.lock().unwrap().start_block = start_block;
        self.events.emit(RngEvent::StartBlockSet(start_block));
        Ok(())
    }

    /// Change the pulse interval. Owner-only, non-zero.
    pub fn set_block_step(&self, caller: Address, block_step: u64) -> Result<(), RngError> {
        self.ensure_owner(caller)?;
        if block_step == 0 {
            return Err(RngError::ZeroBlockStep);
        }
        self.schedule.lock().unwrap().block_step = block_step;
        self.events.emit(RngEvent::BlockStepSet(block_step));
        Ok(())
    }

    fn lock_block_of(&self, request_id: u64) -> Option<u64> {
        self.lock_blocks.lock().unwrap().get(&request_id).copied()
    }
}

impl RngService for BeaconPulseRng {
    fn address(&self) -> Address {
        self.address
    }

    fn request_random_number(
        &self,
        caller: Address,
        token: Address,
        budget: TokenAmount,
    ) -> Result<RngRequest, RngError> {
        let schedule = *self.schedule.lock().unwrap();
        let lock_block = schedule.next_pulse(self.chain.block_number());
        let id = self.request_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.lock_blocks.lock().unwrap().insert(id, lock_block);
        self.events.emit(RngEvent::RandomNumberRequested {
            id,
            requestor: caller,
            token,
            budget,
        });
        Ok(RngRequest { id, lock_block })
    }

    fn is_request_complete(&self, request_id: u64) -> Result<bool, RngError> {
        match self.lock_block_of(request_id) {
            Some(lock_block) => Ok(!self.beacon.randomness(lock_block).is_zero()),
            None => Ok(false),
        }
    }

    fn random_number(&self, request_id: u64) -> Result<RandomValue, RngError> {
        match self.lock_block_of(request_id) {
            Some(lock_block) => Ok(self.beacon.randomness(lock_block)),
            None => Ok(RandomValue::ZERO),
        }
    }

    fn get_request_fee(&self) -> Result<(Address, TokenAmount), RngError> {
        Ok((Address::ZERO, TokenAmount::ZERO))
    }

    fn get_last_request_id(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }
}
