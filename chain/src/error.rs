use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("failed to fetch pulse: {0}")]
    RelayFetch(String),

    #[error("invalid relay response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Other(String),
}
