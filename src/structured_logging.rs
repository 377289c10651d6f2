//! Structured logging for composer cycles

use crate::observability::CorrelationId;

/// Emits the lifecycle events of one composer cycle, all tagged with the
/// cycle's correlation id.
#[derive(Debug, Clone)]
pub struct CycleLogger {
    correlation_id: CorrelationId,
}

impl CycleLogger {
    pub fn new(correlation_id: CorrelationId) -> Self {
        Self { correlation_id }
    }

    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    pub fn cycle_started(&self, tx_count: usize) {
        tracing::info!(
            correlation_id = %self.correlation_id,
            tx_count = %tx_count,
            "Composer cycle started"
        );
    }

    pub fn built(&self, tx_count: usize, group_id: Option<&str>, last_round: u64) {
        tracing::debug!(
            correlation_id = %self.correlation_id,
            tx_count = %tx_count,
            group_id = ?group_id,
            last_round = %last_round,
            "Transactions built"
        );
    }

    pub fn signed(&self, signer_count: usize) {
        tracing::debug!(
            correlation_id = %self.correlation_id,
            signer_count = %signer_count,
            "Signatures gathered"
        );
    }

    pub fn submitted(&self, transaction_ids: &[String], max_rounds: u64) {
        tracing::info!(
            correlation_id = %self.correlation_id,
            transaction_ids = ?transaction_ids,
            max_rounds = %max_rounds,
            "Group submitted"
        );
    }

    pub fn confirmed(&self, transaction_id: &str, confirmed_round: u64) {
        tracing::info!(
            correlation_id = %self.correlation_id,
            transaction_id = %transaction_id,
            confirmed_round = %confirmed_round,
            "Transaction confirmed"
        );
    }

    pub fn unconfirmed(&self, transaction_id: &str, error: &str) {
        tracing::warn!(
            correlation_id = %self.correlation_id,
            transaction_id = %transaction_id,
            error = %error,
            "Transaction not confirmed"
        );
    }

    pub fn cycle_failed(&self, category: &str, error: &str, latency_ms: u64) {
        tracing::warn!(
            correlation_id = %self.correlation_id,
            category = %category,
            error = %error,
            latency_ms = %latency_ms,
            "Composer cycle failed"
        );
    }

    pub fn cycle_finished(&self, confirmed: usize, unconfirmed: usize, latency_ms: u64) {
        tracing::info!(
            correlation_id = %self.correlation_id,
            confirmed = %confirmed,
            unconfirmed = %unconfirmed,
            latency_ms = %latency_ms,
            "Composer cycle finished"
        );
    }
}

impl Default for CycleLogger {
    fn default() -> Self {
        Self::new(CorrelationId::new())
    }
}
