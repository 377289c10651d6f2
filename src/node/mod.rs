//! Node API
//!
//! The typed request/response operations the SDK consumes from a node.
//! [`HttpNodeClient`] is the REST implementation; tests use the in-memory
//! double from `test_utils`.

mod client;
pub mod models;

pub use client::{HttpNodeClient, RequestBody};
pub use models::{
    AccountApplicationInformation, AccountAssetInformation, Application,
    ApplicationLocalState, ApplicationParams, ApplicationStateSchema, Asset, AssetDetails,
    AssetHolding, CompileResponse, PendingTransactionResponse, SuggestedParamsResponse,
    TealKeyValue, TealValue,
};

use crate::transaction::{Address, NetworkParameters};
use crate::transport::TransportError;
use async_trait::async_trait;

#[async_trait]
pub trait NodeApi: Send + Sync {
    async fn suggested_params(&self) -> Result<NetworkParameters, TransportError>;

    /// Submit concatenated signed transactions; returns the first transaction id
    async fn submit_raw_group(&self, group: Vec<u8>) -> Result<String, TransportError>;

    async fn pending_transaction(&self, tx_id: &str) -> Result<PendingTransactionResponse, TransportError>;

    async fn compile_program(&self, source: &str) -> Result<CompileResponse, TransportError>;

    async fn application_by_id(&self, app_id: u64) -> Result<Application, TransportError>;

    async fn account_application_information(
        &self,
        address: &Address,
        app_id: u64,
    ) -> Result<AccountApplicationInformation, TransportError>;

    async fn asset_by_id(&self, asset_id: u64) -> Result<Asset, TransportError>;

    async fn account_asset_information(
        &self,
        address: &Address,
        asset_id: u64,
    ) -> Result<AccountAssetInformation, TransportError>;
}
