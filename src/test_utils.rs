//! Test Utilities Module
//!
//! In-memory node double for deterministic composer, asset and application
//! tests. Submitted groups are decoded and recorded, then auto-confirmed one
//! round after the current last round unless a pending script says otherwise.
//!
//! Only compiled for tests or with the `test_utils` feature.

#![cfg(any(test, feature = "test_utils"))]

use crate::node::{
    AccountApplicationInformation, AccountAssetInformation, Application,
    ApplicationLocalState, Asset, AssetHolding, CompileResponse, NodeApi,
    PendingTransactionResponse,
};
use crate::transaction::{
    Address, LogicSignature, NetworkParameters, SignedTransaction, Transaction,
};
use crate::transport::TransportError;
use async_trait::async_trait;
use base64::Engine;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

/// First id handed out for assets and applications created through the mock
pub const FIRST_CREATED_ID: u64 = 1_000;

pub fn test_network_parameters() -> NetworkParameters {
    NetworkParameters {
        consensus_version: "future".to_string(),
        fee_per_byte: 0,
        min_fee: 1_000,
        genesis_id: "testnet-v1.0".to_string(),
        genesis_hash: [1u8; 32],
        last_round: 1_000,
    }
}

fn not_found(what: &str) -> TransportError {
    TransportError::Status {
        url: "mock://node".to_string(),
        status: 404,
        message: format!("{what} not found"),
    }
}

#[derive(Default)]
struct MockState {
    params: Option<NetworkParameters>,
    submissions: Vec<Vec<SignedTransaction>>,
    submit_error: Option<TransportError>,
    /// Scripted responses; the last entry repeats once the queue drains
    scripts: HashMap<String, VecDeque<Result<PendingTransactionResponse, TransportError>>>,
    confirmed: HashMap<String, PendingTransactionResponse>,
    pending_calls: HashMap<String, usize>,
    next_created_id: u64,
    assets: HashMap<u64, Asset>,
    holdings: HashMap<(Address, u64), AssetHolding>,
    applications: HashMap<u64, Application>,
    local_states: HashMap<(Address, u64), ApplicationLocalState>,
}

/// Mock node for testing
#[derive(Default)]
pub struct MockNode {
    state: Mutex<MockState>,
    params_calls: AtomicUsize,
    submit_calls: AtomicUsize,
    compile_calls: AtomicUsize,
    asset_calls: AtomicUsize,
}

impl MockNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn params(&self) -> NetworkParameters {
        self.state.lock().params.clone().unwrap_or_else(test_network_parameters)
    }

    pub fn set_params(&self, params: NetworkParameters) {
        self.state.lock().params = Some(params);
    }

    /// Fail the next submission with `error`
    pub fn fail_next_submit(&self, error: TransportError) {
        self.state.lock().submit_error = Some(error);
    }

    pub fn script_pending(
        &self,
        tx_id: &str,
        responses: Vec<Result<PendingTransactionResponse, TransportError>>,
    ) {
        self.state.lock().scripts.insert(tx_id.to_string(), responses.into());
    }

    pub fn submitted_groups(&self) -> Vec<Vec<SignedTransaction>> {
        self.state.lock().submissions.clone()
    }

    pub fn submitted_transactions(&self) -> Vec<Transaction> {
        self.state
            .lock()
            .submissions
            .iter()
            .flatten()
            .map(|signed| signed.transaction.clone())
            .collect()
    }

    pub fn pending_calls(&self, tx_id: &str) -> usize {
        self.state.lock().pending_calls.get(tx_id).copied().unwrap_or_default()
    }

    pub fn pending_calls_total(&self) -> usize {
        self.state.lock().pending_calls.values().sum()
    }

    pub fn params_calls(&self) -> usize {
        self.params_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn compile_calls(&self) -> usize {
        self.compile_calls.load(Ordering::SeqCst)
    }

    pub fn asset_calls(&self) -> usize {
        self.asset_calls.load(Ordering::SeqCst)
    }

    pub fn set_asset(&self, asset: Asset) {
        self.state.lock().assets.insert(asset.index, asset);
    }

    pub fn set_holding(&self, address: Address, holding: AssetHolding) {
        self.state.lock().holdings.insert((address, holding.asset_id), holding);
    }

    pub fn holding(&self, address: &Address, asset_id: u64) -> Option<AssetHolding> {
        self.state.lock().holdings.get(&(*address, asset_id)).copied()
    }

    pub fn set_application(&self, application: Application) {
        self.state.lock().applications.insert(application.id, application);
    }

    pub fn set_local_state(&self, address: Address, local_state: ApplicationLocalState) {
        self.state.lock().local_states.insert((address, local_state.id), local_state);
    }
}

impl MockState {
    fn last_round(&self) -> u64 {
        self.params.as_ref().map_or(test_network_parameters().last_round, |p| p.last_round)
    }

    fn allocate_id(&mut self) -> u64 {
        let id = FIRST_CREATED_ID + self.next_created_id;
        self.next_created_id += 1;
        id
    }

    /// Record confirmation and apply the holding changes of opt-ins and
    /// opt-outs so follow-up reads observe them.
    fn settle(&mut self, tx_id: String, transaction: &Transaction) {
        let mut response = PendingTransactionResponse {
            confirmed_round: Some(self.last_round() + 1),
            ..Default::default()
        };

        match transaction {
            Transaction::AssetConfig(t) if t.asset_id == 0 => {
                response.asset_index = Some(self.allocate_id());
            }
            Transaction::ApplicationCall(t) if t.app_id == 0 => {
                response.application_index = Some(self.allocate_id());
            }
            Transaction::AssetTransfer(t) => {
                let sender = t.header.sender;
                if t.close_remainder_to.is_some() {
                    self.holdings.remove(&(sender, t.asset_id));
                } else if t.amount == 0 && t.receiver == sender && t.asset_sender.is_none() {
                    self.holdings.entry((sender, t.asset_id)).or_insert(AssetHolding {
                        amount: 0,
                        asset_id: t.asset_id,
                        is_frozen: false,
                    });
                }
            }
            _ => {}
        }

        self.confirmed.insert(tx_id, response);
    }

    fn next_pending(&mut self, tx_id: &str) -> Result<PendingTransactionResponse, TransportError> {
        *self.pending_calls.entry(tx_id.to_string()).or_default() += 1;

        if let Some(script) = self.scripts.get_mut(tx_id) {
            let next = if script.len() > 1 { script.pop_front() } else { script.front().cloned() };
            if let Some(response) = next {
                return response;
            }
        }

        self.confirmed
            .get(tx_id)
            .cloned()
            .ok_or_else(|| not_found("transaction"))
    }
}

#[async_trait]
impl NodeApi for MockNode {
    async fn suggested_params(&self) -> Result<NetworkParameters, TransportError> {
        self.params_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.params())
    }

    async fn submit_raw_group(&self, group: Vec<u8>) -> Result<String, TransportError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();
        if let Some(error) = state.submit_error.take() {
            return Err(error);
        }

        let signed = SignedTransaction::decode_group(&group).map_err(|e| TransportError::Status {
            url: "mock://node".to_string(),
            status: 400,
            message: e.to_string(),
        })?;

        let mut first_id = String::new();
        for (i, stx) in signed.iter().enumerate() {
            let tx_id = stx.id().map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
            if i == 0 {
                first_id = tx_id.clone();
            }
            state.settle(tx_id, &stx.transaction);
        }
        state.submissions.push(signed);
        Ok(first_id)
    }

    async fn pending_transaction(&self, tx_id: &str) -> Result<PendingTransactionResponse, TransportError> {
        self.state.lock().next_pending(tx_id)
    }

    async fn compile_program(&self, source: &str) -> Result<CompileResponse, TransportError> {
        self.compile_calls.fetch_add(1, Ordering::SeqCst);
        let program = source.as_bytes();
        Ok(CompileResponse {
            hash: LogicSignature::program_address(program).to_string(),
            result: base64::engine::general_purpose::STANDARD.encode(program),
            sourcemap: None,
        })
    }

    async fn application_by_id(&self, app_id: u64) -> Result<Application, TransportError> {
        self.state
            .lock()
            .applications
            .get(&app_id)
            .cloned()
            .ok_or_else(|| not_found("application"))
    }

    async fn account_application_information(
        &self,
        address: &Address,
        app_id: u64,
    ) -> Result<AccountApplicationInformation, TransportError> {
        let state = self.state.lock();
        Ok(AccountApplicationInformation {
            round: state.last_round(),
            app_local_state: state.local_states.get(&(*address, app_id)).cloned(),
            created_app: None,
        })
    }

    async fn asset_by_id(&self, asset_id: u64) -> Result<Asset, TransportError> {
        self.asset_calls.fetch_add(1, Ordering::SeqCst);
        self.state
            .lock()
            .assets
            .get(&asset_id)
            .cloned()
            .ok_or_else(|| not_found("asset"))
    }

    async fn account_asset_information(
        &self,
        address: &Address,
        asset_id: u64,
    ) -> Result<AccountAssetInformation, TransportError> {
        let state = self.state.lock();
        match state.holdings.get(&(*address, asset_id)) {
            Some(holding) => Ok(AccountAssetInformation {
                round: state.last_round(),
                asset_holding: Some(*holding),
            }),
            None => Err(not_found("account asset")),
        }
    }
}
