//! Fee token transfer surface.

use tombola_types::{Address, TokenAmount};

/// The fee token consumed by oracle-backed generators.
///
/// Shaped after the token standard the original integrations use: transfer
/// methods report success as a boolean rather than trapping, and callers
/// are responsible for surfacing `false` as a distinct error.
pub trait FeeToken: Send + Sync {
    /// The token contract's address, returned in fee quotes.
    fn address(&self) -> Address;

    fn balance_of(&self, account: Address) -> TokenAmount;

    /// Transfer from the service's own balance. Returns `false` on refusal.
    fn transfer(&self, to: Address, amount: TokenAmount) -> bool;

    /// Transfer from a caller's pre-approved balance. Returns `false` on
    /// refusal (insufficient approval or balance).
    fn transfer_from(&self, from: Address, to: Address, amount: TokenAmount) -> bool;

    /// Transfer and notify the recipient with `data` in the same step —
    /// how oracle request fees are forwarded alongside their seed.
    fn transfer_and_call(&self, to: Address, amount: TokenAmount, data: &[u8]) -> bool;
}
