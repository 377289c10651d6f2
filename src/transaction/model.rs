//! Built transaction model
//!
//! A [`Transaction`] is an operation payload merged with live network
//! parameters: sender, explicit fee, validity window, genesis binding and an
//! optional group identifier. Field order is significant because the canonical
//! encoding (and therefore the transaction id) is derived from it.

use super::address::Address;
use super::Byte32;
use serde::{Deserialize, Serialize};

/// Genesis ids of local development networks, which get a wider default
/// validity window.
pub const LOCALNET_GENESIS_IDS: [&str; 3] = ["devnet-v1", "sandnet-v1", "dockernet-v1"];

/// Suggested parameters reported by the node. Fetched fresh for every
/// composer cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParameters {
    pub consensus_version: String,
    /// Suggested fee per byte, in micro-units
    pub fee_per_byte: u64,
    pub min_fee: u64,
    pub genesis_id: String,
    pub genesis_hash: Byte32,
    /// Last round known to the node
    pub last_round: u64,
}

impl NetworkParameters {
    pub fn is_localnet(&self) -> bool {
        LOCALNET_GENESIS_IDS.contains(&self.genesis_id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionHeader {
    pub sender: Address,
    pub fee: Option<u64>,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: Option<String>,
    pub genesis_hash: Option<Byte32>,
    pub note: Option<Vec<u8>>,
    pub rekey_to: Option<Address>,
    pub lease: Option<Byte32>,
    pub group: Option<Byte32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentFields {
    pub header: TransactionHeader,
    pub receiver: Address,
    pub amount: u64,
    pub close_remainder_to: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTransferFields {
    pub header: TransactionHeader,
    pub asset_id: u64,
    pub amount: u64,
    pub receiver: Address,
    /// Holder the units are clawed back from; only set for clawbacks
    pub asset_sender: Option<Address>,
    pub close_remainder_to: Option<Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetParams {
    pub total: Option<u64>,
    pub decimals: Option<u32>,
    pub default_frozen: Option<bool>,
    pub asset_name: Option<String>,
    pub unit_name: Option<String>,
    pub url: Option<String>,
    pub metadata_hash: Option<Byte32>,
    pub manager: Option<Address>,
    pub reserve: Option<Address>,
    pub freeze: Option<Address>,
    pub clawback: Option<Address>,
}

/// Asset configuration. `asset_id == 0` creates an asset, a non-zero id with
/// params reconfigures it, and a non-zero id without params destroys it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfigFields {
    pub header: TransactionHeader,
    pub asset_id: u64,
    pub params: Option<AssetParams>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFreezeFields {
    pub header: TransactionHeader,
    pub asset_id: u64,
    pub freeze_target: Address,
    pub frozen: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnApplicationComplete {
    #[default]
    NoOp,
    OptIn,
    CloseOut,
    ClearState,
    UpdateApplication,
    DeleteApplication,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSchema {
    pub num_uints: u64,
    pub num_byte_slices: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationCallFields {
    pub header: TransactionHeader,
    /// Zero when creating an application
    pub app_id: u64,
    pub on_complete: OnApplicationComplete,
    pub approval_program: Option<Vec<u8>>,
    pub clear_state_program: Option<Vec<u8>>,
    pub global_state_schema: Option<StateSchema>,
    pub local_state_schema: Option<StateSchema>,
    pub extra_program_pages: Option<u32>,
    pub args: Vec<Vec<u8>>,
    pub account_references: Vec<Address>,
    pub app_references: Vec<u64>,
    pub asset_references: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRegistrationFields {
    pub header: TransactionHeader,
    pub vote_key: Option<Byte32>,
    pub selection_key: Option<Byte32>,
    pub state_proof_key: Option<Vec<u8>>,
    pub vote_first: Option<u64>,
    pub vote_last: Option<u64>,
    pub vote_key_dilution: Option<u64>,
    pub non_participation: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transaction {
    Payment(PaymentFields),
    AssetTransfer(AssetTransferFields),
    AssetConfig(AssetConfigFields),
    AssetFreeze(AssetFreezeFields),
    ApplicationCall(ApplicationCallFields),
    KeyRegistration(KeyRegistrationFields),
}

impl Transaction {
    pub fn header(&self) -> &TransactionHeader {
        match self {
            Transaction::Payment(t) => &t.header,
            Transaction::AssetTransfer(t) => &t.header,
            Transaction::AssetConfig(t) => &t.header,
            Transaction::AssetFreeze(t) => &t.header,
            Transaction::ApplicationCall(t) => &t.header,
            Transaction::KeyRegistration(t) => &t.header,
        }
    }

    pub fn header_mut(&mut self) -> &mut TransactionHeader {
        match self {
            Transaction::Payment(t) => &mut t.header,
            Transaction::AssetTransfer(t) => &mut t.header,
            Transaction::AssetConfig(t) => &mut t.header,
            Transaction::AssetFreeze(t) => &mut t.header,
            Transaction::ApplicationCall(t) => &mut t.header,
            Transaction::KeyRegistration(t) => &mut t.header,
        }
    }

    /// Short type tag used in logs and metrics labels
    pub fn type_name(&self) -> &'static str {
        match self {
            Transaction::Payment(_) => "pay",
            Transaction::AssetTransfer(_) => "axfer",
            Transaction::AssetConfig(_) => "acfg",
            Transaction::AssetFreeze(_) => "afrz",
            Transaction::ApplicationCall(_) => "appl",
            Transaction::KeyRegistration(_) => "keyreg",
        }
    }

    pub fn sender(&self) -> &Address {
        &self.header().sender
    }
}
