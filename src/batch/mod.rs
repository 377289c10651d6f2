//! Bulk operations
//!
//! A [`BatchProcessor`] turns a list of independent items into as few composer
//! cycles as the group size allows: items are de-duplicated in first-seen
//! order, chunked, and each chunk is sent as one atomic group. A failing chunk
//! aborts the remaining chunks; earlier chunks stay committed.

mod asset_manager;
pub mod errors;

pub use asset_manager::{AssetInformation, AssetManager};
pub use errors::{AssetManagerError, BatchError};

use crate::composer::{OperationRequest, SendParams, TransactionComposer};
use crate::observability::TraceContext;
use crate::transaction::MAX_TX_GROUP_SIZE;
use itertools::Itertools;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, info};

/// Creates a fresh composer for each chunk
pub type ComposerFactory = Arc<dyn Fn() -> TransactionComposer + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItemResult<T> {
    pub item: T,
    pub transaction_id: String,
    pub confirmed_round: u64,
}

pub struct BatchProcessor {
    new_composer: ComposerFactory,
    chunk_size: usize,
}

impl BatchProcessor {
    pub fn new(new_composer: ComposerFactory) -> Self {
        Self {
            new_composer,
            chunk_size: MAX_TX_GROUP_SIZE,
        }
    }

    /// Chunk size is clamped to `1..=MAX_TX_GROUP_SIZE`
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.clamp(1, MAX_TX_GROUP_SIZE);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Send one group per chunk of unique items and return per-item results
    /// in first-seen order.
    pub async fn run<T, F>(
        &self,
        items: &[T],
        trace: &TraceContext,
        to_request: F,
    ) -> Result<Vec<BatchItemResult<T>>, BatchError>
    where
        T: Clone + Eq + Hash,
        F: Fn(&T) -> OperationRequest,
    {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let unique = dedupe(items);
        let mut results = Vec::with_capacity(unique.len());

        for (chunk_index, chunk) in unique.chunks(self.chunk_size).enumerate() {
            let span = trace.child_span();
            info!(
                trace_id = %span.trace_id,
                span_id = %span.span_id,
                correlation_id = %span.correlation_id,
                operation = span.operation,
                chunk_index,
                chunk_len = chunk.len(),
                "Sending batch chunk"
            );

            let mut composer = (self.new_composer)().with_correlation_id(span.correlation_id.clone());
            for item in chunk {
                composer.add(to_request(item)).map_err(BatchError::Composer)?;
            }
            let sent = composer.send(SendParams::default()).await?;

            if sent.len() != chunk.len() {
                return Err(BatchError::ResultCountMismatch {
                    chunk_index,
                    expected: chunk.len(),
                    got: sent.len(),
                });
            }

            for (item, result) in chunk.iter().zip(sent.results) {
                let settlement = result.confirmation?;
                results.push(BatchItemResult {
                    item: item.clone(),
                    transaction_id: result.transaction_id,
                    confirmed_round: settlement.confirmed_round,
                });
            }
            debug!(span_id = %span.span_id, chunk_index, "Batch chunk confirmed");
        }

        Ok(results)
    }
}

impl std::fmt::Debug for BatchProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchProcessor")
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

/// Drop repeats, keeping the first occurrence of each item in place
pub fn dedupe<T: Clone + Eq + Hash>(items: &[T]) -> Vec<T> {
    items.iter().cloned().unique().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::{ComposerError, ComposerSettings, CommonParams, PaymentParams};
    use crate::node::PendingTransactionResponse;
    use crate::signer::{SignerRegistry, SigningCredential};
    use crate::test_utils::MockNode;
    use crate::transaction::{Address, Transaction};
    use std::time::Duration;

    fn processor(node: &Arc<MockNode>, registry: &SignerRegistry) -> BatchProcessor {
        let node = node.clone();
        let registry = registry.clone();
        BatchProcessor::new(Arc::new(move || {
            TransactionComposer::new(node.clone(), registry.clone()).with_settings(ComposerSettings {
                poll_interval: Duration::from_millis(1),
                ..Default::default()
            })
        }))
    }

    fn payment(sender: Address) -> impl Fn(&u64) -> OperationRequest {
        move |amount| {
            PaymentParams {
                common: CommonParams::new(sender),
                receiver: sender,
                amount: *amount,
            }
            .into()
        }
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        assert_eq!(dedupe(&[7u64, 3, 7, 9]), vec![7, 3, 9]);
        assert!(dedupe::<u64>(&[]).is_empty());
    }

    #[test]
    fn test_chunk_size_is_clamped() {
        let node = Arc::new(MockNode::new());
        let registry = SignerRegistry::new();
        assert_eq!(processor(&node, &registry).with_chunk_size(0).chunk_size(), 1);
        assert_eq!(processor(&node, &registry).with_chunk_size(99).chunk_size(), 16);
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_calls() {
        let node = Arc::new(MockNode::new());
        let registry = SignerRegistry::new();
        let results = processor(&node, &registry)
            .run(&[], &TraceContext::new("test"), payment(Address::zero()))
            .await
            .unwrap();
        assert!(results.is_empty());
        assert_eq!(node.params_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_chunks_and_order() {
        let node = Arc::new(MockNode::new());
        let registry = SignerRegistry::new();
        let sender = registry.add_credential(SigningCredential::from_seed([5u8; 32]));

        let results = processor(&node, &registry)
            .with_chunk_size(2)
            .run(&[7u64, 3, 7, 9], &TraceContext::new("test"), payment(sender))
            .await
            .unwrap();

        let items: Vec<u64> = results.iter().map(|r| r.item).collect();
        assert_eq!(items, vec![7, 3, 9]);
        let groups = node.submitted_groups();
        assert_eq!(groups.iter().map(Vec::len).collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(results.iter().map(|r| &r.transaction_id).unique().count(), 3);
        assert!(matches!(groups[1][0].transaction, Transaction::Payment(ref p) if p.amount == 9));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unconfirmed_item_aborts_batch() {
        let node = Arc::new(MockNode::new());
        let registry = SignerRegistry::new();
        let sender = registry.add_credential(SigningCredential::from_seed([5u8; 32]));
        let bp = processor(&node, &registry).with_chunk_size(1);

        let mut probe = TransactionComposer::new(node.clone(), registry.clone());
        probe.add(payment(sender)(&1)).unwrap();
        let first_id = probe.build().await.unwrap()[0].id().unwrap();
        node.script_pending(
            &first_id,
            vec![Ok(PendingTransactionResponse {
                pool_error: "overspend".to_string(),
                ..Default::default()
            })],
        );

        let err = bp
            .run(&[1u64, 2], &TraceContext::new("test"), payment(sender))
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::Composer(ComposerError::PoolRejected { .. })));
        assert_eq!(node.submitted_groups().len(), 1);
    }
}
