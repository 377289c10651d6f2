use crate::signer::SignerError;
use crate::transaction::TransactionError;
use crate::transport::TransportError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComposerError {
    /// Malformed request, rejected before any network call
    #[error("Invalid {kind} request at index {index}: {message}")]
    Validation {
        index: usize,
        kind: &'static str,
        message: String,
    },

    #[error("Group of {size} transactions exceeds the maximum of {max}")]
    GroupSizeExceeded { size: usize, max: usize },

    /// `add` after `send` without a `reset`
    #[error("Composer already sent its group; reset it before adding more requests")]
    AlreadySent,

    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),

    #[error("Signer error: {0}")]
    Signer(#[from] SignerError),

    #[error("Transaction at index {index} was not signed")]
    SignatureMissing { index: usize },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The node refused the submitted group
    #[error("Node rejected group (HTTP {status}): {message}")]
    NodeRejected { status: u16, message: String },

    /// Dropped from the transaction pool after submission
    #[error("Transaction {tx_id} rejected from pool: {reason}")]
    PoolRejected { tx_id: String, reason: String },

    #[error("Transaction {tx_id} not confirmed after {attempts} attempts")]
    ConfirmationTimeout { tx_id: String, attempts: u64 },
}

impl ComposerError {
    /// Transport failures only; a submitted group is never resent as is
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_retryable(),
            _ => false,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::GroupSizeExceeded { .. } => "group_size",
            Self::AlreadySent => "already_sent",
            Self::Transaction(_) => "transaction",
            Self::Signer(_) | Self::SignatureMissing { .. } => "signing",
            Self::Transport(_) => "transport",
            Self::NodeRejected { .. } => "node_rejected",
            Self::PoolRejected { .. } => "pool_rejected",
            Self::ConfirmationTimeout { .. } => "confirmation_timeout",
        }
    }

    /// Submission failures: statuses mean the node looked at the group and
    /// said no, anything else is a transport problem.
    pub(crate) fn from_submission(err: TransportError) -> Self {
        match err {
            TransportError::Status { status, message, .. } => Self::NodeRejected { status, message },
            other => Self::Transport(other),
        }
    }
}
