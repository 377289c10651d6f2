use thiserror::Error;

/// Errors raised while shaping, encoding or grouping transactions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Group size is outside `1..=MAX_TX_GROUP_SIZE`
    #[error("Transaction group size {size} is outside the allowed range 1..={max}")]
    GroupSize { size: usize, max: usize },

    #[error("Transaction at index {index} is already grouped")]
    AlreadyGrouped { index: usize },

    #[error("Transaction fee {fee} exceeds max fee {max_fee}")]
    MaxFeeExceeded { fee: u64, max_fee: u64 },

    #[error("Invalid genesis hash: expected 32 bytes, got {0}")]
    InvalidGenesisHash(usize),
}

impl From<bincode::Error> for TransactionError {
    fn from(err: bincode::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}
