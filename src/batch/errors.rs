use crate::composer::ComposerError;
use crate::transaction::Address;
use crate::transport::TransportError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("Composer error: {0}")]
    Composer(#[from] ComposerError),

    /// A chunk returned a different number of results than it submitted
    #[error("Chunk {chunk_index} returned {got} results for {expected} items")]
    ResultCountMismatch {
        chunk_index: usize,
        expected: usize,
        got: usize,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetManagerError {
    #[error("Asset not found: {asset_id}")]
    AssetNotFound { asset_id: u64 },

    #[error("Account not found: {address}")]
    AccountNotFound { address: Address },

    #[error("Account {address} is not opted into asset {asset_id}")]
    NotOptedIn { address: Address, asset_id: u64 },

    #[error("Account {address} has non-zero balance {balance} for asset {asset_id}")]
    NonZeroBalance {
        address: Address,
        asset_id: u64,
        balance: u64,
    },

    #[error("Asset {asset_id} has an unparseable creator address {creator}")]
    InvalidCreator { asset_id: u64, creator: String },

    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl AssetManagerError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_retryable(),
            Self::Batch(BatchError::Composer(e)) => e.is_retryable(),
            _ => false,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::AssetNotFound { .. } => "asset_not_found",
            Self::AccountNotFound { .. } => "account_not_found",
            Self::NotOptedIn { .. } => "not_opted_in",
            Self::NonZeroBalance { .. } => "non_zero_balance",
            Self::InvalidCreator { .. } => "invalid_creator",
            Self::Batch(BatchError::Composer(e)) => e.category(),
            Self::Batch(BatchError::ResultCountMismatch { .. }) => "result_count_mismatch",
            Self::Transport(_) => "transport",
        }
    }
}
