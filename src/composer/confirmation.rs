//! Confirmation polling
//!
//! Bounded-attempt loop with a fixed wall-clock pause between polls. One
//! attempt stands in for one round; the poller never reads chain rounds.

use super::errors::ComposerError;
use crate::node::{NodeApi, PendingTransactionResponse};
use std::time::Duration;
use tracing::{debug, warn};

/// Settlement details of a confirmed transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub confirmed_round: u64,
    /// Set when the transaction created an asset
    pub asset_id: Option<u64>,
    /// Set when the transaction created an application
    pub app_id: Option<u64>,
    pub logs: Vec<Vec<u8>>,
}

impl Settlement {
    fn from_pending(pending: PendingTransactionResponse) -> Self {
        Self {
            confirmed_round: pending.confirmed_round.unwrap_or_default(),
            asset_id: pending.asset_index,
            app_id: pending.application_index,
            logs: pending.logs,
        }
    }
}

pub struct ConfirmationPoller<'a> {
    node: &'a dyn NodeApi,
    interval: Duration,
}

impl<'a> ConfirmationPoller<'a> {
    pub fn new(node: &'a dyn NodeApi, interval: Duration) -> Self {
        Self { node, interval }
    }

    /// Poll until settled, pool-rejected, or `max_rounds` attempts are used.
    /// A 404 means the node has not seen the transaction yet and costs one
    /// attempt; other transport failures end polling.
    pub async fn wait(&self, tx_id: &str, max_rounds: u64) -> Result<Settlement, ComposerError> {
        let max_attempts = max_rounds.max(1);
        let mut attempts = 0u64;

        while attempts < max_attempts {
            attempts += 1;
            match self.node.pending_transaction(tx_id).await {
                Ok(pending) if !pending.pool_error.is_empty() => {
                    warn!(transaction_id = tx_id, reason = %pending.pool_error, "Transaction dropped from pool");
                    return Err(ComposerError::PoolRejected {
                        tx_id: tx_id.to_string(),
                        reason: pending.pool_error,
                    });
                }
                Ok(pending) if pending.is_confirmed() => {
                    debug!(
                        transaction_id = tx_id,
                        confirmed_round = pending.confirmed_round,
                        attempts,
                        "Transaction confirmed"
                    );
                    return Ok(Settlement::from_pending(pending));
                }
                Ok(_) => {}
                Err(e) if e.is_not_found() => {
                    debug!(transaction_id = tx_id, attempt = attempts, "Transaction not visible yet");
                }
                Err(e) => return Err(ComposerError::Transport(e)),
            }

            if attempts < max_attempts {
                tokio::time::sleep(self.interval).await;
            }
        }

        Err(ComposerError::ConfirmationTimeout {
            tx_id: tx_id.to_string(),
            attempts,
        })
    }
}
