//! Asset lookups and bulk opt-in / opt-out

use super::{dedupe, BatchItemResult, BatchProcessor, ComposerFactory};
use super::errors::AssetManagerError;
use crate::composer::{AssetOptInParams, AssetOptOutParams, CommonParams};
use crate::node::{AccountAssetInformation, Asset, NodeApi};
use crate::observability::TraceContext;
use crate::transaction::Address;
use crate::transport::TransportError;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetInformation {
    pub asset_id: u64,
    pub creator: String,
    pub total: u64,
    pub decimals: u32,
    pub default_frozen: bool,
    pub asset_name: Option<String>,
    pub unit_name: Option<String>,
    pub url: Option<String>,
    pub manager: Option<String>,
    pub reserve: Option<String>,
    pub freeze: Option<String>,
    pub clawback: Option<String>,
}

impl From<Asset> for AssetInformation {
    fn from(asset: Asset) -> Self {
        let params = asset.params;
        Self {
            asset_id: asset.index,
            creator: params.creator,
            total: params.total,
            decimals: params.decimals,
            default_frozen: params.default_frozen,
            asset_name: params.name,
            unit_name: params.unit_name,
            url: params.url,
            manager: params.manager,
            reserve: params.reserve,
            freeze: params.freeze,
            clawback: params.clawback,
        }
    }
}

pub struct AssetManager {
    node: Arc<dyn NodeApi>,
    batch: BatchProcessor,
}

impl AssetManager {
    pub fn new(node: Arc<dyn NodeApi>, new_composer: ComposerFactory) -> Self {
        Self {
            node,
            batch: BatchProcessor::new(new_composer),
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.batch = self.batch.with_chunk_size(chunk_size);
        self
    }

    pub async fn get_by_id(&self, asset_id: u64) -> Result<AssetInformation, AssetManagerError> {
        match self.node.asset_by_id(asset_id).await {
            Ok(asset) => Ok(asset.into()),
            Err(e) if e.is_not_found() => Err(AssetManagerError::AssetNotFound { asset_id }),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_account_information(
        &self,
        address: &Address,
        asset_id: u64,
    ) -> Result<AccountAssetInformation, AssetManagerError> {
        match self.node.account_asset_information(address, asset_id).await {
            Ok(info) => Ok(info),
            Err(e) if e.is_not_found() => Err(AssetManagerError::NotOptedIn {
                address: *address,
                asset_id,
            }),
            Err(TransportError::Status { status: 400, .. }) => {
                Err(AssetManagerError::AccountNotFound { address: *address })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn bulk_opt_in(
        &self,
        account: &Address,
        asset_ids: &[u64],
    ) -> Result<Vec<BatchItemResult<u64>>, AssetManagerError> {
        let trace = TraceContext::new("bulk_opt_in");
        info!(
            trace_id = %trace.trace_id,
            account = %account,
            assets = asset_ids.len(),
            "Bulk asset opt-in"
        );

        let account = *account;
        let results = self
            .batch
            .run(asset_ids, &trace, |&asset_id| {
                AssetOptInParams {
                    common: CommonParams::new(account),
                    asset_id,
                }
                .into()
            })
            .await?;
        Ok(results)
    }

    /// Opt out of each asset, closing any remainder to the asset creator.
    /// With `ensure_zero_balance` every holding is checked before anything
    /// is sent.
    pub async fn bulk_opt_out(
        &self,
        account: &Address,
        asset_ids: &[u64],
        ensure_zero_balance: bool,
    ) -> Result<Vec<BatchItemResult<u64>>, AssetManagerError> {
        if asset_ids.is_empty() {
            return Ok(Vec::new());
        }
        let trace = TraceContext::new("bulk_opt_out");
        let unique_ids = dedupe(asset_ids);
        info!(
            trace_id = %trace.trace_id,
            account = %account,
            assets = unique_ids.len(),
            ensure_zero_balance,
            "Bulk asset opt-out"
        );

        if ensure_zero_balance {
            for &asset_id in &unique_ids {
                let info = self.get_account_information(account, asset_id).await?;
                let balance = info.asset_holding.map(|h| h.amount).unwrap_or_default();
                if balance > 0 {
                    return Err(AssetManagerError::NonZeroBalance {
                        address: *account,
                        asset_id,
                        balance,
                    });
                }
            }
        }

        // One lookup per unique asset, before any group is built
        let mut pairs = Vec::with_capacity(unique_ids.len());
        for &asset_id in &unique_ids {
            let info = self.get_by_id(asset_id).await?;
            let creator = info
                .creator
                .parse::<Address>()
                .map_err(|_| AssetManagerError::InvalidCreator {
                    asset_id,
                    creator: info.creator.clone(),
                })?;
            pairs.push((asset_id, creator));
        }

        let account = *account;
        let results = self
            .batch
            .run(&pairs, &trace, |&(asset_id, creator)| {
                AssetOptOutParams {
                    common: CommonParams::new(account),
                    asset_id,
                    close_remainder_to: Some(creator),
                }
                .into()
            })
            .await?;

        Ok(results
            .into_iter()
            .map(|r| BatchItemResult {
                item: r.item.0,
                transaction_id: r.transaction_id,
                confirmed_round: r.confirmed_round,
            })
            .collect())
    }
}

impl std::fmt::Debug for AssetManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetManager").field("batch", &self.batch).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchError;
    use crate::composer::{ComposerError, TransactionComposer};
    use crate::node::{AssetDetails, AssetHolding};
    use crate::signer::{SignerError, SignerRegistry, SigningCredential};
    use crate::test_utils::MockNode;

    struct Fixture {
        node: Arc<MockNode>,
        manager: AssetManager,
        account: Address,
        creator: Address,
    }

    fn fixture() -> Fixture {
        let node = Arc::new(MockNode::new());
        let registry = SignerRegistry::new();
        let account = registry.add_credential(SigningCredential::from_seed([8u8; 32]));
        let creator = Address([4u8; 32]);
        for id in [7u64, 3, 9] {
            node.set_asset(Asset {
                index: id,
                params: AssetDetails {
                    creator: creator.to_string(),
                    total: 1_000,
                    ..Default::default()
                },
            });
        }

        let factory_node = node.clone();
        let manager = AssetManager::new(
            node.clone(),
            Arc::new(move || TransactionComposer::new(factory_node.clone(), registry.clone())),
        );
        Fixture {
            node,
            manager,
            account,
            creator,
        }
    }

    #[tokio::test]
    async fn test_get_by_id_maps_not_found() {
        let f = fixture();
        assert_eq!(f.manager.get_by_id(7).await.unwrap().creator, f.creator.to_string());
        assert_eq!(
            f.manager.get_by_id(404).await.unwrap_err(),
            AssetManagerError::AssetNotFound { asset_id: 404 }
        );
    }

    #[tokio::test]
    async fn test_account_information_maps_not_opted_in() {
        let f = fixture();
        assert_eq!(
            f.manager.get_account_information(&f.account, 7).await.unwrap_err(),
            AssetManagerError::NotOptedIn {
                address: f.account,
                asset_id: 7
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_bulk_opt_in_then_out() {
        let f = fixture();
        let opted_in = f.manager.bulk_opt_in(&f.account, &[7, 3, 7, 9]).await.unwrap();
        assert_eq!(opted_in.iter().map(|r| r.item).collect::<Vec<_>>(), vec![7, 3, 9]);
        assert!(f.node.holding(&f.account, 3).is_some());

        let opted_out = f.manager.bulk_opt_out(&f.account, &[9, 3], true).await.unwrap();
        assert_eq!(opted_out.iter().map(|r| r.item).collect::<Vec<_>>(), vec![9, 3]);
        assert!(f.node.holding(&f.account, 9).is_none());
        assert!(f.node.holding(&f.account, 7).is_some());
    }

    #[tokio::test]
    async fn test_opt_out_rejects_non_zero_balance_before_sending() {
        let f = fixture();
        f.node.set_holding(
            f.account,
            AssetHolding {
                amount: 5,
                asset_id: 7,
                is_frozen: false,
            },
        );
        let err = f.manager.bulk_opt_out(&f.account, &[7], true).await.unwrap_err();
        assert_eq!(
            err,
            AssetManagerError::NonZeroBalance {
                address: f.account,
                asset_id: 7,
                balance: 5
            }
        );
        assert_eq!(f.node.submit_calls(), 0);
    }

    #[tokio::test]
    async fn test_opt_out_unknown_asset_fails_before_sending() {
        let f = fixture();
        let err = f.manager.bulk_opt_out(&f.account, &[7, 12], false).await.unwrap_err();
        assert_eq!(err, AssetManagerError::AssetNotFound { asset_id: 12 });
        assert_eq!(f.node.submit_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_signer_surfaces_through_batch() {
        let f = fixture();
        let stranger = Address([1u8; 32]);
        let err = f.manager.bulk_opt_in(&stranger, &[7]).await.unwrap_err();
        assert_eq!(
            err,
            AssetManagerError::Batch(BatchError::Composer(ComposerError::Signer(
                SignerError::NoSignerRegistered { address: stranger }
            )))
        );
        assert_eq!(err.category(), "signing");
    }
}
