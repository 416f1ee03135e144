//! Nullable fee token — programmable balances and transfer outcomes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tombola_chain::FeeToken;
use tombola_types::{Address, TokenAmount};

/// A record of one transfer-shaped call observed by the null token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenCall {
    Transfer {
        to: Address,
        amount: TokenAmount,
    },
    TransferFrom {
        from: Address,
        to: Address,
        amount: TokenAmount,
    },
    TransferAndCall {
        to: Address,
        amount: TokenAmount,
        data: Vec<u8>,
    },
}

/// A deterministic fee token for testing.
///
/// Balances are set directly; transfers succeed unless a failure flag is
/// raised, and every call is recorded for assertions.
pub struct NullToken {
    address: Address,
    balances: Mutex<HashMap<Address, TokenAmount>>,
    calls: Mutex<Vec<TokenCall>>,
    fail_transfer: AtomicBool,
    fail_transfer_from: AtomicBool,
    fail_transfer_and_call: AtomicBool,
}

impl NullToken {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            balances: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            fail_transfer: AtomicBool::new(false),
            fail_transfer_from: AtomicBool::new(false),
            fail_transfer_and_call: AtomicBool::new(false),
        }
    }

    pub fn set_balance(&self, account: Address, amount: TokenAmount) {
        self.balances.lock().unwrap().insert(account, amount);
    }

    /// Make subsequent `transfer` calls report failure.
    pub fn fail_transfer(&self, fail: bool) {
        self.fail_transfer.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `transfer_from` calls report failure.
    pub fn fail_transfer_from(&self, fail: bool) {
        self.fail_transfer_from.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `transfer_and_call` calls report failure.
    pub fn fail_transfer_and_call(&self, fail: bool) {
        self.fail_transfer_and_call.store(fail, Ordering::SeqCst);
    }

    /// All transfer-shaped calls observed so far, in order.
    pub fn calls(&self) -> Vec<TokenCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl FeeToken for NullToken {
    fn address(&self) -> Address {
        self.address
    }

    fn balance_of(&self, account: Address) -> TokenAmount {
        self.balances
            .lock()
            .unwrap()
            .get(&account)
            .copied()
            .unwrap_or(TokenAmount::ZERO)
    }

    fn transfer(&self, to: Address, amount: TokenAmount) -> bool {
        self.calls
            .lock()
            .unwrap()
            .push(TokenCall::Transfer { to, amount });
        !self.fail_transfer.load(Ordering::SeqCst)
    }

    fn transfer_from(&self, from: Address, to: Address, amount: TokenAmount) -> bool {
        self.calls
            .lock()
            .unwrap()
            .push(TokenCall::TransferFrom { from, to, amount });
        !self.fail_transfer_from.load(Ordering::SeqCst)
    }

    fn transfer_and_call(&self, to: Address, amount: TokenAmount, data: &[u8]) -> bool {
        self.calls.lock().unwrap().push(TokenCall::TransferAndCall {
            to,
            amount,
            data: data.to_vec(),
        });
        !self.fail_transfer_and_call.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balances_default_to_zero() {
        let token = NullToken::new(Address::from_label("link"));
        assert!(token.balance_of(Address::from_label("anyone")).is_zero());
    }

    #[test]
    fn failure_flags_flip_outcomes() {
        let token = NullToken::new(Address::from_label("link"));
        let to = Address::from_label("rng");
        assert!(token.transfer(to, TokenAmount::new(1)));

        token.fail_transfer(true);
        assert!(!token.transfer(to, TokenAmount::new(1)));
    }

    #[test]
    fn calls_are_recorded_in_order() {
        let token = NullToken::new(Address::from_label("link"));
        let a = Address::from_label("a");
        let b = Address::from_label("b");
        token.transfer_from(a, b, TokenAmount::new(5));
        token.transfer(a, TokenAmount::new(7));

        let calls = token.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0],
            TokenCall::TransferFrom {
                from: a,
                to: b,
                amount: TokenAmount::new(5)
            }
        );
    }
}
