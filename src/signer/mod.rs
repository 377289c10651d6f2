//! Signer abstraction and registry
//!
//! - [`TransactionSigner`]: async capability, batch-first
//! - [`SigningCredential`]: single key, multisig or logic signature
//! - [`SignerRegistry`]: address lookup with an optional default

mod credential;
pub mod errors;
mod registry;

pub use credential::SigningCredential;
pub use errors::SignerError;
pub use registry::SignerRegistry;

use crate::transaction::{SignedTransaction, Transaction};
use async_trait::async_trait;
use std::sync::Arc;

pub type SharedSigner = Arc<dyn TransactionSigner>;

impl std::fmt::Debug for dyn TransactionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TransactionSigner")
    }
}

#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Sign `transactions[i]` for every `i` in `indices`, returning the
    /// signed transactions in `indices` order.
    async fn sign_transactions(
        &self,
        transactions: &[Transaction],
        indices: &[usize],
    ) -> Result<Vec<SignedTransaction>, SignerError>;
}
