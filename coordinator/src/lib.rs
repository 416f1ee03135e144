//! Request router for the Tombola RNG services.
//!
//! The coordinator owns the authoritative global request-id sequence. Each
//! registered service keeps issuing its own local ids; the coordinator
//! remaps them into the global space through a fixed per-service offset
//! captured once at registration time. New requests always go to the most
//! recently registered service — an explicit hot-swap policy, not load
//! balancing — while queries keep routing to whichever service owns the
//! id's range, so historical requests stay readable after a swap.
//!
//! The coordinator implements [`RngService`] itself: consumers cannot tell
//! it apart from a single backend.

use std::sync::{Arc, Mutex};
use tombola_rng::{EventLog, RngError, RngEvent, RngRequest, RngService};
use tombola_types::{Address, RandomValue, TokenAmount};

/// A registered service and the global-id offset fixed at registration.
struct Registration {
    service: Arc<dyn RngService>,
    offset: u64,
}

/// Multiplexes randomness requests across registered RNG services.
pub struct Coordinator {
    address: Address,
    owner: Address,
    registrations: Mutex<Vec<Registration>>,
    events: EventLog,
}

impl Coordinator {
    pub fn new(address: Address, owner: Address) -> Self {
        Self {
            address,
            owner,
            registrations: Mutex::new(Vec::new()),
            events: EventLog::new(),
        }
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn service_count(&self) -> usize {
        self.registrations.lock().unwrap().len()
    }

    /// Register `service` and make it the target for new requests.
    ///
    /// Owner-only. The service's offset is captured here, from the running
    /// total of ids issued so far, and never recomputed — registration
    /// cannot retroactively move ids that are already out in the world.
    pub fn add_rng_service(
        &self,
        caller: Address,
        service: Arc<dyn RngService>,
    ) -> Result<(), RngError> {
        if caller != self.owner {
            return Err(RngError::NotOwner(caller));
        }
        if service.address().is_zero() {
            return Err(RngError::InvalidRngService);
        }
        let mut registrations = self.registrations.lock().unwrap();
        let offset = match registrations.last() {
            Some(last) => last.offset + last.service.get_last_request_id(),
            None => 0,
        };
        tracing::info!(service = %service.address(), offset, "rng service registered");
        self.events.emit(RngEvent::RngServiceAdded {
            service: service.address(),
            offset,
        });
        registrations.push(Registration { service, offset });
        Ok(())
    }

    /// The service currently serving new requests, with its offset.
    fn active(&self) -> Result<(Arc<dyn RngService>, u64), RngError> {
        let registrations = self.registrations.lock().unwrap();
        registrations
            .last()
            .map(|reg| (reg.service.clone(), reg.offset))
            .ok_or(RngError::NoRngService)
    }

    /// Locate the service owning `global_id` and translate to its local id.
    ///
    /// Scans registrations newest-first for the first offset below the id,
    /// so when ranges have grown to overlap, the most recent registration
    /// wins — the same precedence as request routing.
    fn resolve(&self, global_id: u64) -> Result<(Arc<dyn RngService>, u64), RngError> {
        let registrations = self.registrations.lock().unwrap();
        if registrations.is_empty() {
            return Err(RngError::NoRngService);
        }
        if global_id == 0 {
            return Err(RngError::UnknownRequestId(global_id));
        }
        for reg in registrations.iter().rev() {
            if reg.offset < global_id {
                let local_id = global_id - reg.offset;
                if local_id > reg.service.get_last_request_id() {
                    return Err(RngError::UnknownRequestId(global_id));
                }
                return Ok((reg.service.clone(), local_id));
            }
        }
        Err(RngError::UnknownRequestId(global_id))
    }
}

impl RngService for Coordinator {
    fn address(&self) -> Address {
        self.address
    }

    fn request_random_number(
        &self,
        caller: Address,
        token: Address,
        budget: TokenAmount,
    ) -> Result<RngRequest, RngError> {
        let (service, offset) = self.active()?;
        let request = service.request_random_number(caller, token, budget)?;
        Ok(RngRequest {
            id: offset + request.id,
            lock_block: request.lock_block,
        })
    }

    fn is_request_complete(&self, request_id: u64) -> Result<bool, RngError> {
        let (service, local_id) = self.resolve(request_id)?;
        service.is_request_complete(local_id)
    }

    fn random_number(&self, request_id: u64) -> Result<RandomValue, RngError> {
        let (service, local_id) = self.resolve(request_id)?;
        service.random_number(local_id)
    }

    fn get_request_fee(&self) -> Result<(Address, TokenAmount), RngError> {
        let (service, _) = self.active()?;
        service.get_request_fee()
    }

    fn get_last_request_id(&self) -> u64 {
        let registrations = self.registrations.lock().unwrap();
        match registrations.last() {
            Some(last) => last.offset + last.service.get_last_request_id(),
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tombola_nullables::{NullBeacon, NullChain};
    use tombola_rng::BeaconPulseRng;

    fn owner() -> Address {
        Address::from_label("owner")
    }

    fn caller() -> Address {
        Address::from_label("alice")
    }

    fn coordinator() -> Coordinator {
        Coordinator::new(Address::from_label("coordinator"), owner())
    }

    /// A beacon-backed service whose pulses land on every block, so each
    /// request is addressable by publishing at its lock block.
    fn beacon_service(label: &str, chain: Arc<NullChain>) -> (Arc<BeaconPulseRng>, Arc<NullBeacon>) {
        let beacon = Arc::new(NullBeacon::new());
        let service = Arc::new(
            BeaconPulseRng::new(
                Address::from_label(label),
                owner(),
                chain,
                beacon.clone(),
                0,
                1,
            )
            .unwrap(),
        );
        (service, beacon)
    }

    #[test]
    fn fails_closed_with_no_service() {
        let coordinator = coordinator();
        assert_eq!(coordinator.random_number(1), Err(RngError::NoRngService));
        assert_eq!(
            coordinator.is_request_complete(1),
            Err(RngError::NoRngService)
        );
        assert_eq!(
            coordinator.request_random_number(caller(), Address::ZERO, TokenAmount::ZERO),
            Err(RngError::NoRngService)
        );
        assert_eq!(coordinator.get_request_fee(), Err(RngError::NoRngService));
        assert_eq!(coordinator.get_last_request_id(), 0);
    }

    #[test]
    fn registration_is_owner_gated() {
        let coordinator = coordinator();
        let chain = Arc::new(NullChain::new(10));
        let (service, _) = beacon_service("svc-a", chain);

        let stranger = Address::from_label("stranger");
        assert_eq!(
            coordinator.add_rng_service(stranger, service.clone()),
            Err(RngError::NotOwner(stranger))
        );
        assert!(coordinator.add_rng_service(owner(), service).is_ok());
        assert_eq!(coordinator.service_count(), 1);
    }

    #[test]
    fn zero_address_service_is_rejected() {
        let coordinator = coordinator();
        let chain = Arc::new(NullChain::new(10));
        let beacon = Arc::new(NullBeacon::new());
        let service = Arc::new(
            BeaconPulseRng::new(Address::ZERO, owner(), chain, beacon, 0, 1).unwrap(),
        );
        assert_eq!(
            coordinator.add_rng_service(owner(), service),
            Err(RngError::InvalidRngService)
        );
    }

    #[test]
    fn last_request_id_tracks_the_active_service() {
        let coordinator = coordinator();
        let chain = Arc::new(NullChain::new(10));
        let (service, _) = beacon_service("svc-a", chain);

        // The service already issued ids before registration.
        for _ in 0..3 {
            service
                .request_random_number(caller(), Address::ZERO, TokenAmount::ZERO)
                .unwrap();
        }
        coordinator.add_rng_service(owner(), service).unwrap();
        assert_eq!(coordinator.get_last_request_id(), 3);
    }

    #[test]
    fn second_service_requests_continue_the_global_sequence() {
        let coordinator = coordinator();
        let chain = Arc::new(NullChain::new(10));
        let (service_a, _) = beacon_service("svc-a", chain.clone());
        let (service_b, _) = beacon_service("svc-b", chain);

        coordinator.add_rng_service(owner(), service_a).unwrap();
        for expected in 1..=2u64 {
            let request = coordinator
                .request_random_number(caller(), Address::ZERO, TokenAmount::ZERO)
                .unwrap();
            assert_eq!(request.id, expected);
        }

        coordinator.add_rng_service(owner(), service_b).unwrap();
        let request = coordinator
            .request_random_number(caller(), Address::ZERO, TokenAmount::ZERO)
            .unwrap();
        // B's local id 1, offset by A's two requests.
        assert_eq!(request.id, 3);
        assert!(coordinator.events().contains(&RngEvent::RngServiceAdded {
            service: Address::from_label("svc-b"),
            offset: 2,
        }));
    }

    #[test]
    fn queries_route_to_the_owning_service() {
        let coordinator = coordinator();
        let chain = Arc::new(NullChain::new(10));
        let (service_a, beacon_a) = beacon_service("svc-a", chain.clone());
        let (service_b, beacon_b) = beacon_service("svc-b", chain.clone());

        coordinator.add_rng_service(owner(), service_a).unwrap();
        let first = coordinator
            .request_random_number(caller(), Address::ZERO, TokenAmount::ZERO)
            .unwrap();

        coordinator.add_rng_service(owner(), service_b).unwrap();
        chain.advance(5);
        let second = coordinator
            .request_random_number(caller(), Address::ZERO, TokenAmount::ZERO)
            .unwrap();
        assert_eq!(second.id, 2);

        let value_a = RandomValue::from_u64(99_999_999);
        let value_b = RandomValue::from_u64(8_888_888);
        beacon_a.publish(first.lock_block, value_a);
        beacon_b.publish(second.lock_block, value_b);

        // Global id 1 still routes to A after B took over new requests.
        assert!(coordinator.is_request_complete(1).unwrap());
        assert_eq!(coordinator.random_number(1).unwrap(), value_a);
        assert_eq!(coordinator.random_number(2).unwrap(), value_b);
    }

    #[test]
    fn ids_outside_every_range_are_rejected() {
        let coordinator = coordinator();
        let chain = Arc::new(NullChain::new(10));
        let (service, _) = beacon_service("svc-a", chain);
        coordinator.add_rng_service(owner(), service).unwrap();
        coordinator
            .request_random_number(caller(), Address::ZERO, TokenAmount::ZERO)
            .unwrap();

        assert_eq!(
            coordinator.random_number(0),
            Err(RngError::UnknownRequestId(0))
        );
        assert_eq!(
            coordinator.random_number(2),
            Err(RngError::UnknownRequestId(2))
        );
        assert_eq!(coordinator.random_number(1).unwrap(), RandomValue::ZERO);
    }

    #[test]
    fn fee_quote_comes_from_the_active_service() {
        let coordinator = coordinator();
        let chain = Arc::new(NullChain::new(10));
        let (service, _) = beacon_service("svc-a", chain);
        coordinator.add_rng_service(owner(), service).unwrap();
        assert_eq!(
            coordinator.get_request_fee().unwrap(),
            (Address::ZERO, TokenAmount::ZERO)
        );
    }

    #[test]
    fn blockhash_service_end_to_end() {
        use tombola_nullables::{NullOracle, NullToken};
        use tombola_rng::BlockhashRng;

        let coordinator = coordinator();
        let chain = Arc::new(NullChain::new(100));
        let token = Arc::new(NullToken::new(Address::from_label("link")));
        let oracle = Arc::new(NullOracle::new(Address::from_label("vrf-coordinator")));
        let service = Arc::new(BlockhashRng::new(
            Address::from_label("rng-blockhash"),
            owner(),
            chain.clone(),
            token,
            oracle,
        ));
        coordinator.add_rng_service(owner(), service).unwrap();

        let request = coordinator
            .request_random_number(caller(), Address::ZERO, TokenAmount::new(1))
            .unwrap();
        assert!(!coordinator.is_request_complete(request.id).unwrap());

        chain.advance(2);
        assert!(coordinator.is_request_complete(request.id).unwrap());
        let value = coordinator.random_number(request.id).unwrap();
        assert!(!value.is_zero());
        assert_eq!(coordinator.random_number(request.id).unwrap(), value);
    }
}
