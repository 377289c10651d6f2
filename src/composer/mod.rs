//! Transaction composer
//!
//! Collects operation requests, then in one `send`:
//! 1. fetches fresh network parameters
//! 2. builds each transaction (fee, validity window, genesis binding)
//! 3. stamps a shared group id when there is more than one
//! 4. gathers signatures, one batch call per signer
//! 5. submits the signed group in a single request
//! 6. polls each transaction for confirmation
//!
//! A composer is single-use: `send` drains the pending list and further
//! `add` calls fail until [`TransactionComposer::reset`].

pub mod build;
pub mod confirmation;
pub mod errors;
pub mod params;

pub use build::{build_group, build_transaction, default_validity_window};
pub use confirmation::{ConfirmationPoller, Settlement};
pub use errors::ComposerError;
pub use params::*;

use crate::config::{ComposerConfig, SdkConfig};
use crate::metrics::{SdkMetrics, Timer};
use crate::node::NodeApi;
use crate::observability::CorrelationId;
use crate::signer::{SharedSigner, SignerError, SignerRegistry};
use crate::structured_logging::CycleLogger;
use crate::transaction::{Byte32, SignedTransaction, Transaction, MAX_TX_GROUP_SIZE};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposerSettings {
    pub windows: ComposerConfig,
    pub poll_interval: Duration,
    /// Overrides the validity-derived confirmation budget
    pub max_rounds_to_wait: Option<u64>,
}

impl Default for ComposerSettings {
    fn default() -> Self {
        SdkConfig::default().into()
    }
}

impl From<&SdkConfig> for ComposerSettings {
    fn from(config: &SdkConfig) -> Self {
        Self {
            windows: config.composer.clone(),
            poll_interval: Duration::from_millis(config.confirmation.poll_interval_ms),
            max_rounds_to_wait: config.confirmation.max_rounds_to_wait,
        }
    }
}

impl From<SdkConfig> for ComposerSettings {
    fn from(config: SdkConfig) -> Self {
        (&config).into()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendParams {
    pub max_rounds_to_wait_for_confirmation: Option<u64>,
}

/// Outcome for one transaction of the group
#[derive(Debug)]
pub struct TransactionResult {
    pub transaction_id: String,
    pub transaction: Transaction,
    /// `Err` holds the timeout, pool rejection or polling failure
    pub confirmation: Result<Settlement, ComposerError>,
}

impl TransactionResult {
    pub fn is_confirmed(&self) -> bool {
        self.confirmation.is_ok()
    }

    pub fn settlement(&self) -> Option<&Settlement> {
        self.confirmation.as_ref().ok()
    }
}

#[derive(Debug, Default)]
pub struct SendResults {
    /// `None` for a single ungrouped transaction
    pub group_id: Option<Byte32>,
    pub transaction_ids: Vec<String>,
    /// In request order
    pub results: Vec<TransactionResult>,
}

impl SendResults {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn all_confirmed(&self) -> bool {
        self.results.iter().all(TransactionResult::is_confirmed)
    }

    pub fn unconfirmed(&self) -> impl Iterator<Item = &TransactionResult> {
        self.results.iter().filter(|r| !r.is_confirmed())
    }

    pub fn settlements(&self) -> impl Iterator<Item = Option<&Settlement>> {
        self.results.iter().map(TransactionResult::settlement)
    }
}

pub struct TransactionComposer {
    node: Arc<dyn NodeApi>,
    signers: SignerRegistry,
    settings: ComposerSettings,
    pending: Vec<OperationRequest>,
    sent: bool,
    metrics: Option<Arc<SdkMetrics>>,
    correlation_id: Option<CorrelationId>,
}

impl TransactionComposer {
    pub fn new(node: Arc<dyn NodeApi>, signers: SignerRegistry) -> Self {
        Self {
            node,
            signers,
            settings: ComposerSettings::default(),
            pending: Vec::new(),
            sent: false,
            metrics: None,
            correlation_id: None,
        }
    }

    pub fn with_settings(mut self, settings: ComposerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<SdkMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Log cycles under `correlation_id` instead of a fresh one
    pub fn with_correlation_id(mut self, correlation_id: CorrelationId) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Validate and queue a request. Never touches the network.
    pub fn add(&mut self, request: impl Into<OperationRequest>) -> Result<&mut Self, ComposerError> {
        if self.sent {
            return Err(ComposerError::AlreadySent);
        }
        let request = request.into();
        let index = self.pending.len();

        request
            .validate()
            .map_err(|message| ComposerError::Validation {
                index,
                kind: request.kind(),
                message,
            })?;

        if index >= MAX_TX_GROUP_SIZE {
            return Err(ComposerError::GroupSizeExceeded {
                size: index + 1,
                max: MAX_TX_GROUP_SIZE,
            });
        }

        self.pending.push(request);
        Ok(self)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drop pending requests and allow a new cycle
    pub fn reset(&mut self) {
        self.pending.clear();
        self.sent = false;
    }

    /// Build the pending group against current network parameters without
    /// signing or submitting it.
    pub async fn build(&self) -> Result<Vec<Transaction>, ComposerError> {
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }
        let params = self.node.suggested_params().await?;
        build_group(&self.pending, &params, &self.settings.windows)
    }

    pub async fn send(&mut self, send_params: SendParams) -> Result<SendResults, ComposerError> {
        let requests = std::mem::take(&mut self.pending);
        if requests.is_empty() {
            return Ok(SendResults::default());
        }
        self.sent = true;

        let logger = CycleLogger::new(self.correlation_id.clone().unwrap_or_default());
        let timer = Timer::new();
        logger.cycle_started(requests.len());
        if let Some(metrics) = &self.metrics {
            metrics.cycles_total.inc();
        }

        let outcome = self.run_cycle(&requests, send_params, &logger).await;
        let latency_ms = (timer.elapsed_secs() * 1_000.0) as u64;

        match &outcome {
            Ok(results) => {
                let unconfirmed = results.unconfirmed().count();
                logger.cycle_finished(results.len() - unconfirmed, unconfirmed, latency_ms);
                if let Some(metrics) = &self.metrics {
                    timer.observe_duration(&metrics.cycle_latency);
                }
            }
            Err(e) => {
                logger.cycle_failed(e.category(), &e.to_string(), latency_ms);
                if let Some(metrics) = &self.metrics {
                    metrics.cycles_failed.with_label_values(&[e.category()]).inc();
                }
            }
        }

        outcome
    }

    async fn run_cycle(
        &self,
        requests: &[OperationRequest],
        send_params: SendParams,
        logger: &CycleLogger,
    ) -> Result<SendResults, ComposerError> {
        // Signers are resolved first so a missing one fails before any I/O
        let signers = self.resolve_signers(requests)?;

        let params = self.node.suggested_params().await?;
        let transactions = build_group(requests, &params, &self.settings.windows)?;
        let group_id = transactions.first().and_then(|tx| tx.header().group);
        logger.built(
            transactions.len(),
            group_id.map(hex::encode).as_deref(),
            params.last_round,
        );

        let signed = self.gather_signatures(&transactions, signers, logger).await?;
        let transaction_ids = signed
            .iter()
            .map(SignedTransaction::id)
            .collect::<Result<Vec<_>, _>>()?;

        let max_rounds = send_params
            .max_rounds_to_wait_for_confirmation
            .or(self.settings.max_rounds_to_wait)
            .unwrap_or_else(|| validity_span(&transactions));

        let body = SignedTransaction::encode_group(&signed)?;
        self.node
            .submit_raw_group(body)
            .await
            .map_err(ComposerError::from_submission)?;
        logger.submitted(&transaction_ids, max_rounds);
        if let Some(metrics) = &self.metrics {
            metrics.transactions_submitted.inc_by(transaction_ids.len() as u64);
        }

        let poller = ConfirmationPoller::new(self.node.as_ref(), self.settings.poll_interval);
        let mut results = Vec::with_capacity(transactions.len());
        for (transaction, transaction_id) in transactions.into_iter().zip(&transaction_ids) {
            let confirmation = poller.wait(transaction_id, max_rounds).await;
            match &confirmation {
                Ok(settlement) => {
                    logger.confirmed(transaction_id, settlement.confirmed_round);
                    if let Some(metrics) = &self.metrics {
                        metrics.transactions_confirmed.inc();
                    }
                }
                Err(e) => {
                    logger.unconfirmed(transaction_id, &e.to_string());
                    if let (Some(metrics), ComposerError::ConfirmationTimeout { .. }) = (&self.metrics, e) {
                        metrics.confirmation_timeouts.inc();
                    }
                }
            }
            results.push(TransactionResult {
                transaction_id: transaction_id.clone(),
                transaction,
                confirmation,
            });
        }

        Ok(SendResults {
            group_id,
            transaction_ids,
            results,
        })
    }

    /// Explicit signer if the request carries one, otherwise the registry
    /// entry for the sender.
    fn resolve_signers(&self, requests: &[OperationRequest]) -> Result<Vec<SharedSigner>, ComposerError> {
        requests
            .iter()
            .map(|request| match request.explicit_signer() {
                Some(signer) => Ok(signer.clone()),
                None => self.signers.get_signer(request.sender()).map_err(Into::into),
            })
            .collect()
    }

    /// One `sign_transactions` call per distinct signer, results slotted
    /// back into group order.
    async fn gather_signatures(
        &self,
        transactions: &[Transaction],
        signers: Vec<SharedSigner>,
        logger: &CycleLogger,
    ) -> Result<Vec<SignedTransaction>, ComposerError> {
        let mut batches: Vec<(SharedSigner, Vec<usize>)> = Vec::new();
        for (index, signer) in signers.into_iter().enumerate() {
            match batches.iter_mut().find(|(existing, _)| same_signer(existing, &signer)) {
                Some((_, indices)) => indices.push(index),
                None => batches.push((signer, vec![index])),
            }
        }

        let mut slots: Vec<Option<SignedTransaction>> = vec![None; transactions.len()];
        for (signer, indices) in &batches {
            let signed = signer.sign_transactions(transactions, indices).await?;
            if signed.len() != indices.len() {
                return Err(SignerError::SignatureCountMismatch {
                    expected: indices.len(),
                    got: signed.len(),
                }
                .into());
            }
            for (&index, signed_tx) in indices.iter().zip(signed) {
                slots[index] = Some(signed_tx);
            }
        }
        logger.signed(batches.len());

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.ok_or(ComposerError::SignatureMissing { index }))
            .collect()
    }
}

fn same_signer(a: &SharedSigner, b: &SharedSigner) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Default confirmation budget: the span of the group's validity windows
fn validity_span(transactions: &[Transaction]) -> u64 {
    let first = transactions.iter().map(|tx| tx.header().first_valid).min();
    let last = transactions.iter().map(|tx| tx.header().last_valid).max();
    match (first, last) {
        (Some(first), Some(last)) => last.saturating_sub(first),
        _ => 0,
    }
}
