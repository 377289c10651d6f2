use crate::transaction::{Address, TransactionError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignerError {
    /// Neither an address-specific nor a default signer is registered
    #[error("No signer registered for address {address}")]
    NoSignerRegistered { address: Address },

    #[error("Transaction index {index} out of range for {len} transactions")]
    IndexOutOfRange { index: usize, len: usize },

    /// Fewer held keys than the multisig threshold
    #[error("Multisig needs {need} signatures, only {have} keys available")]
    MultisigThreshold { have: usize, need: usize },

    #[error("Signer returned {got} signatures for {expected} transactions")]
    SignatureCountMismatch { expected: usize, got: usize },

    #[error("Encoding error: {0}")]
    Encoding(#[from] TransactionError),
}

impl SignerError {
    /// Signing errors are local and deterministic; none are retryable
    pub fn is_retryable(&self) -> bool {
        false
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::NoSignerRegistered { .. } => "no_signer",
            Self::IndexOutOfRange { .. } | Self::SignatureCountMismatch { .. } => "contract",
            Self::MultisigThreshold { .. } => "multisig",
            Self::Encoding(_) => "encoding",
        }
    }
}
