//! Node response shapes
//!
//! Field names follow the node's kebab-case JSON. Byte fields travel as
//! standard base64 and are decoded into `Vec<u8>` on the way in.

use crate::transaction::{Byte32, NetworkParameters};
use crate::transport::TransportError;
use serde::{Deserialize, Serialize};

pub(crate) mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text).map_err(serde::de::Error::custom)
    }
}

pub(crate) mod base64_bytes_vec {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(items: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
        items
            .iter()
            .map(|b| STANDARD.encode(b))
            .collect::<Vec<_>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Vec<u8>>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .into_iter()
            .map(|s| STANDARD.decode(s).map_err(serde::de::Error::custom))
            .collect()
    }
}

/// `GET /v2/transactions/params`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SuggestedParamsResponse {
    pub consensus_version: String,
    pub fee: u64,
    #[serde(with = "base64_bytes")]
    pub genesis_hash: Vec<u8>,
    pub genesis_id: String,
    pub last_round: u64,
    pub min_fee: u64,
}

impl TryFrom<SuggestedParamsResponse> for NetworkParameters {
    type Error = TransportError;

    fn try_from(dto: SuggestedParamsResponse) -> Result<Self, Self::Error> {
        let genesis_hash: Byte32 = dto.genesis_hash.as_slice().try_into().map_err(|_| {
            TransportError::Decode {
                url: "/v2/transactions/params".to_string(),
                message: format!("genesis hash is {} bytes, expected 32", dto.genesis_hash.len()),
            }
        })?;
        Ok(NetworkParameters {
            consensus_version: dto.consensus_version,
            fee_per_byte: dto.fee,
            min_fee: dto.min_fee,
            genesis_id: dto.genesis_id,
            genesis_hash,
            last_round: dto.last_round,
        })
    }
}

impl From<NetworkParameters> for SuggestedParamsResponse {
    fn from(params: NetworkParameters) -> Self {
        Self {
            consensus_version: params.consensus_version,
            fee: params.fee_per_byte,
            genesis_hash: params.genesis_hash.to_vec(),
            genesis_id: params.genesis_id,
            last_round: params.last_round,
            min_fee: params.min_fee,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(rename = "txId")]
    pub tx_id: String,
}

/// `GET /v2/transactions/pending/{txid}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PendingTransactionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_round: Option<u64>,
    /// Non-empty when the transaction was evicted from the pool
    #[serde(default)]
    pub pool_error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_index: Option<u64>,
    #[serde(default, with = "base64_bytes_vec", skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<Vec<u8>>,
}

impl PendingTransactionResponse {
    pub fn is_confirmed(&self) -> bool {
        self.confirmed_round.is_some_and(|round| round > 0)
    }
}

/// `POST /v2/teal/compile`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileResponse {
    pub hash: String,
    /// Base64 of the compiled program
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sourcemap: Option<serde_json::Value>,
}

/// Tagged value in application state. `type` 1 is bytes, 2 is uint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TealValue {
    #[serde(rename = "type")]
    pub value_type: u64,
    /// Base64 payload when `type == 1`
    #[serde(default)]
    pub bytes: String,
    #[serde(default)]
    pub uint: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TealKeyValue {
    /// Base64 of the raw key
    pub key: String,
    pub value: TealValue,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApplicationStateSchema {
    pub num_uint: u64,
    pub num_byte_slice: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApplicationParams {
    pub creator: String,
    #[serde(with = "base64_bytes")]
    pub approval_program: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub clear_state_program: Vec<u8>,
    #[serde(default)]
    pub global_state: Vec<TealKeyValue>,
    #[serde(default)]
    pub global_state_schema: ApplicationStateSchema,
    #[serde(default)]
    pub local_state_schema: ApplicationStateSchema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_program_pages: Option<u32>,
}

/// `GET /v2/applications/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: u64,
    pub params: ApplicationParams,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApplicationLocalState {
    pub id: u64,
    #[serde(default)]
    pub key_value: Vec<TealKeyValue>,
    #[serde(default)]
    pub schema: ApplicationStateSchema,
}

/// `GET /v2/accounts/{address}/applications/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AccountApplicationInformation {
    pub round: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_local_state: Option<ApplicationLocalState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_app: Option<ApplicationParams>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AssetDetails {
    pub creator: String,
    pub total: u64,
    pub decimals: u32,
    #[serde(default)]
    pub default_frozen: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserve: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freeze: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clawback: Option<String>,
}

/// `GET /v2/assets/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub index: u64,
    pub params: AssetDetails,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AssetHolding {
    pub amount: u64,
    pub asset_id: u64,
    #[serde(default)]
    pub is_frozen: bool,
}

/// `GET /v2/accounts/{address}/assets/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AccountAssetInformation {
    pub round: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_holding: Option<AssetHolding>,
}

/// Error body the node returns alongside non-2xx statuses
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorResponse {
    pub message: String,
}
