use thiserror::Error;
use tombola_types::Address;

/// Error taxonomy of the randomness protocol.
///
/// Every rejection is synchronous and leaves no partial state: a failed
/// operation consumes no request id, charges no fee, and writes no record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RngError {
    // Authorization
    #[error("caller {0} is not the owner")]
    NotOwner(Address),

    #[error("caller {0} is not the manager")]
    NotManager(Address),

    #[error("fulfillment from {0} is not the registered VRF coordinator")]
    InvalidVrfCoordinator(Address),

    // Invalid configuration
    #[error("no RNG service registered")]
    NoRngService,

    #[error("invalid RNG service: zero address")]
    InvalidRngService,

    #[error("VRF coordinator address must not be zero")]
    ZeroOracleAddress,

    #[error("manager address must not be zero")]
    ZeroManagerAddress,

    #[error("subscription id must be greater than zero")]
    ZeroSubscriptionId,

    #[error("callback gas limit must be greater than zero")]
    ZeroCallbackGasLimit,

    #[error("request confirmations must be greater than zero")]
    ZeroRequestConfirmations,

    #[error("number of words must be greater than zero")]
    ZeroNumWords,

    #[error("key hash must not be empty")]
    EmptyKeyHash,

    #[error("fee must be greater than zero")]
    ZeroFee,

    #[error("threshold must be greater than zero")]
    ZeroThreshold,

    #[error("block step must be greater than zero")]
    ZeroBlockStep,

    // Insufficient resources
    #[error("insufficient fee-token balance: requested {requested}, have {available}")]
    InsufficientBalance { requested: u128, available: u128 },

    #[error("fee-token transfer failed")]
    TransferFailed,

    // Protocol integrity
    #[error("no outstanding request for correlation id {0}")]
    UnknownCorrelationId(u64),

    #[error("request id {0} is outside every registered service's range")]
    UnknownRequestId(u64),

    #[error("fulfillment carried no random words")]
    EmptyFulfillment,

    // Timing edge
    #[error("request {id}: block {lock_block} hash left the retrieval window before derivation")]
    ResultExpired { id: u64, lock_block: u64 },
}
