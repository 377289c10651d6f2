//! Operation requests accepted by the composer
//!
//! Requests carry only what the caller supplies. Fees, validity window and
//! genesis binding are filled in at send time from fresh network parameters.

use crate::signer::SharedSigner;
use crate::transaction::{Address, AssetParams, Byte32, OnApplicationComplete, StateSchema, Transaction};
use std::fmt;

pub const MAX_NOTE_BYTES: usize = 1024;
pub const MAX_APP_ARGS: usize = 16;
pub const MAX_APP_REFERENCES: usize = 8;
pub const MAX_ASSET_NAME_BYTES: usize = 32;
pub const MAX_UNIT_NAME_BYTES: usize = 8;
pub const MAX_ASSET_URL_BYTES: usize = 96;
pub const MAX_ASSET_DECIMALS: u32 = 19;
pub const MAX_EXTRA_PROGRAM_PAGES: u32 = 3;

/// Fields shared by every request
#[derive(Clone, Default)]
pub struct CommonParams {
    pub sender: Address,
    /// Overrides the registry lookup for this transaction
    pub signer: Option<SharedSigner>,
    pub rekey_to: Option<Address>,
    pub note: Option<Vec<u8>>,
    pub lease: Option<Byte32>,
    /// Exact fee; skips fee calculation
    pub static_fee: Option<u64>,
    pub extra_fee: Option<u64>,
    pub max_fee: Option<u64>,
    /// Rounds between first and last valid
    pub validity_window: Option<u64>,
    pub first_valid_round: Option<u64>,
    pub last_valid_round: Option<u64>,
}

impl CommonParams {
    pub fn new(sender: Address) -> Self {
        Self {
            sender,
            ..Default::default()
        }
    }

    pub fn with_signer(mut self, signer: SharedSigner) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn with_note(mut self, note: impl Into<Vec<u8>>) -> Self {
        self.note = Some(note.into());
        self
    }

    fn validate(&self) -> Result<(), String> {
        if self.note.as_ref().is_some_and(|n| n.len() > MAX_NOTE_BYTES) {
            return Err(format!("note exceeds {} bytes", MAX_NOTE_BYTES));
        }
        if self.static_fee.is_some() && self.extra_fee.is_some() {
            return Err("static_fee and extra_fee cannot both be set".to_string());
        }
        if let (Some(fee), Some(max_fee)) = (self.static_fee, self.max_fee) {
            if fee > max_fee {
                return Err(format!("static_fee {} exceeds max_fee {}", fee, max_fee));
            }
        }
        if self.validity_window == Some(0) {
            return Err("validity_window must be positive".to_string());
        }
        if let (Some(first), Some(last)) = (self.first_valid_round, self.last_valid_round) {
            if last < first {
                return Err(format!(
                    "last_valid_round {} is before first_valid_round {}",
                    last, first
                ));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for CommonParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommonParams")
            .field("sender", &self.sender)
            .field("signer", &self.signer.is_some())
            .field("rekey_to", &self.rekey_to)
            .field("note_len", &self.note.as_ref().map(Vec::len))
            .field("static_fee", &self.static_fee)
            .field("extra_fee", &self.extra_fee)
            .field("max_fee", &self.max_fee)
            .field("validity_window", &self.validity_window)
            .field("first_valid_round", &self.first_valid_round)
            .field("last_valid_round", &self.last_valid_round)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct PaymentParams {
    pub common: CommonParams,
    pub receiver: Address,
    pub amount: u64,
}

/// Closes the sender's account, sending the remaining balance
#[derive(Debug, Clone)]
pub struct AccountCloseParams {
    pub common: CommonParams,
    pub close_remainder_to: Address,
}

#[derive(Debug, Clone)]
pub struct AssetTransferParams {
    pub common: CommonParams,
    pub asset_id: u64,
    pub amount: u64,
    pub receiver: Address,
}

#[derive(Debug, Clone)]
pub struct AssetOptInParams {
    pub common: CommonParams,
    pub asset_id: u64,
}

#[derive(Debug, Clone)]
pub struct AssetOptOutParams {
    pub common: CommonParams,
    pub asset_id: u64,
    /// Usually the asset creator
    pub close_remainder_to: Option<Address>,
}

#[derive(Debug, Clone)]
pub struct AssetClawbackParams {
    pub common: CommonParams,
    pub asset_id: u64,
    pub amount: u64,
    pub receiver: Address,
    pub clawback_target: Address,
}

#[derive(Debug, Clone, Default)]
pub struct AssetCreateParams {
    pub common: CommonParams,
    pub total: u64,
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

#[derive(Debug, Clone)]
pub struct AssetReconfigureParams {
    pub common: CommonParams,
    pub asset_id: u64,
    pub manager: Option<Address>,
    pub reserve: Option<Address>,
    pub freeze: Option<Address>,
    pub clawback: Option<Address>,
}

#[derive(Debug, Clone)]
pub struct AssetDestroyParams {
    pub common: CommonParams,
    pub asset_id: u64,
}

/// Used for both freeze and unfreeze
#[derive(Debug, Clone)]
pub struct AssetFreezeParams {
    pub common: CommonParams,
    pub asset_id: u64,
    pub target: Address,
}

/// Arguments and foreign references of an application call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppCallArgs {
    pub args: Vec<Vec<u8>>,
    pub account_references: Vec<Address>,
    pub app_references: Vec<u64>,
    pub asset_references: Vec<u64>,
}

impl AppCallArgs {
    fn validate(&self) -> Result<(), String> {
        if self.args.len() > MAX_APP_ARGS {
            return Err(format!("at most {} application args", MAX_APP_ARGS));
        }
        let references =
            self.account_references.len() + self.app_references.len() + self.asset_references.len();
        if references > MAX_APP_REFERENCES {
            return Err(format!("at most {} foreign references", MAX_APP_REFERENCES));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AppCallParams {
    pub common: CommonParams,
    pub app_id: u64,
    pub on_complete: OnApplicationComplete,
    pub call: AppCallArgs,
}

#[derive(Debug, Clone)]
pub struct AppCreateParams {
    pub common: CommonParams,
    pub on_complete: OnApplicationComplete,
    pub approval_program: Vec<u8>,
    pub clear_state_program: Vec<u8>,
    pub global_state_schema: Option<StateSchema>,
    pub local_state_schema: Option<StateSchema>,
    pub extra_program_pages: Option<u32>,
    pub call: AppCallArgs,
}

#[derive(Debug, Clone)]
pub struct AppUpdateParams {
    pub common: CommonParams,
    pub app_id: u64,
    pub approval_program: Vec<u8>,
    pub clear_state_program: Vec<u8>,
    pub call: AppCallArgs,
}

#[derive(Debug, Clone)]
pub struct AppDeleteParams {
    pub common: CommonParams,
    pub app_id: u64,
    pub call: AppCallArgs,
}

#[derive(Debug, Clone)]
pub struct OnlineKeyRegistrationParams {
    pub common: CommonParams,
    pub vote_key: Byte32,
    pub selection_key: Byte32,
    pub state_proof_key: Option<Vec<u8>>,
    pub vote_first: u64,
    pub vote_last: u64,
    pub vote_key_dilution: u64,
}

#[derive(Debug, Clone)]
pub struct OfflineKeyRegistrationParams {
    pub common: CommonParams,
}

#[derive(Debug, Clone)]
pub struct NonParticipationKeyRegistrationParams {
    pub common: CommonParams,
}

/// One entry of a composer cycle
#[derive(Debug, Clone)]
pub enum OperationRequest {
    /// Pre-built transaction, used as is
    Transaction {
        transaction: Transaction,
        signer: Option<SharedSigner>,
    },
    Payment(PaymentParams),
    AccountClose(AccountCloseParams),
    AssetTransfer(AssetTransferParams),
    AssetOptIn(AssetOptInParams),
    AssetOptOut(AssetOptOutParams),
    AssetClawback(AssetClawbackParams),
    AssetCreate(AssetCreateParams),
    AssetReconfigure(AssetReconfigureParams),
    AssetDestroy(AssetDestroyParams),
    AssetFreeze(AssetFreezeParams),
    AssetUnfreeze(AssetFreezeParams),
    AppCall(AppCallParams),
    AppCreate(AppCreateParams),
    AppUpdate(AppUpdateParams),
    AppDelete(AppDeleteParams),
    OnlineKeyRegistration(OnlineKeyRegistrationParams),
    OfflineKeyRegistration(OfflineKeyRegistrationParams),
    NonParticipationKeyRegistration(NonParticipationKeyRegistrationParams),
}

macro_rules! impl_from_params {
    ($($params:ty => $variant:ident),* $(,)?) => {
        $(impl From<$params> for OperationRequest {
            fn from(params: $params) -> Self {
                OperationRequest::$variant(params)
            }
        })*
    };
}

impl_from_params! {
    PaymentParams => Payment,
    AccountCloseParams => AccountClose,
    AssetTransferParams => AssetTransfer,
    AssetOptInParams => AssetOptIn,
    AssetOptOutParams => AssetOptOut,
    AssetClawbackParams => AssetClawback,
    AssetCreateParams => AssetCreate,
    AssetReconfigureParams => AssetReconfigure,
    AssetDestroyParams => AssetDestroy,
    AppCallParams => AppCall,
    AppCreateParams => AppCreate,
    AppUpdateParams => AppUpdate,
    AppDeleteParams => AppDelete,
    OnlineKeyRegistrationParams => OnlineKeyRegistration,
    OfflineKeyRegistrationParams => OfflineKeyRegistration,
    NonParticipationKeyRegistrationParams => NonParticipationKeyRegistration,
}

impl From<Transaction> for OperationRequest {
    fn from(transaction: Transaction) -> Self {
        OperationRequest::Transaction {
            transaction,
            signer: None,
        }
    }
}

enum RequestParts<'a> {
    Raw(&'a Transaction),
    Common(&'a CommonParams),
}

impl OperationRequest {
    fn parts(&self) -> RequestParts<'_> {
        RequestParts::Common(match self {
            Self::Transaction { transaction, .. } => return RequestParts::Raw(transaction),
            Self::Payment(p) => &p.common,
            Self::AccountClose(p) => &p.common,
            Self::AssetTransfer(p) => &p.common,
            Self::AssetOptIn(p) => &p.common,
            Self::AssetOptOut(p) => &p.common,
            Self::AssetClawback(p) => &p.common,
            Self::AssetCreate(p) => &p.common,
            Self::AssetReconfigure(p) => &p.common,
            Self::AssetDestroy(p) => &p.common,
            Self::AssetFreeze(p) | Self::AssetUnfreeze(p) => &p.common,
            Self::AppCall(p) => &p.common,
            Self::AppCreate(p) => &p.common,
            Self::AppUpdate(p) => &p.common,
            Self::AppDelete(p) => &p.common,
            Self::OnlineKeyRegistration(p) => &p.common,
            Self::OfflineKeyRegistration(p) => &p.common,
            Self::NonParticipationKeyRegistration(p) => &p.common,
        })
    }

    /// `None` for pre-built transactions
    pub fn common(&self) -> Option<&CommonParams> {
        match self.parts() {
            RequestParts::Raw(_) => None,
            RequestParts::Common(common) => Some(common),
        }
    }

    pub fn sender(&self) -> &Address {
        match self.parts() {
            RequestParts::Raw(transaction) => transaction.sender(),
            RequestParts::Common(common) => &common.sender,
        }
    }

    /// Signer supplied with the request, if any
    pub fn explicit_signer(&self) -> Option<&SharedSigner> {
        match self {
            Self::Transaction { signer, .. } => signer.as_ref(),
            other => other.common().and_then(|c| c.signer.as_ref()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transaction { .. } => "transaction",
            Self::Payment(_) => "payment",
            Self::AccountClose(_) => "account_close",
            Self::AssetTransfer(_) => "asset_transfer",
            Self::AssetOptIn(_) => "asset_opt_in",
            Self::AssetOptOut(_) => "asset_opt_out",
            Self::AssetClawback(_) => "asset_clawback",
            Self::AssetCreate(_) => "asset_create",
            Self::AssetReconfigure(_) => "asset_reconfigure",
            Self::AssetDestroy(_) => "asset_destroy",
            Self::AssetFreeze(_) => "asset_freeze",
            Self::AssetUnfreeze(_) => "asset_unfreeze",
            Self::AppCall(_) => "app_call",
            Self::AppCreate(_) => "app_create",
            Self::AppUpdate(_) => "app_update",
            Self::AppDelete(_) => "app_delete",
            Self::OnlineKeyRegistration(_) => "online_key_registration",
            Self::OfflineKeyRegistration(_) => "offline_key_registration",
            Self::NonParticipationKeyRegistration(_) => "non_participation_key_registration",
        }
    }

    /// Shape checks that need no network access
    pub fn validate(&self) -> Result<(), String> {
        if let Some(common) = self.common() {
            common.validate()?;
        }
        match self {
            Self::Transaction { transaction, .. } => {
                if transaction.header().group.is_some() {
                    return Err("pre-built transaction already has a group id".to_string());
                }
                Ok(())
            }
            Self::Payment(_) | Self::AccountClose(_) => Ok(()),
            Self::AssetTransfer(AssetTransferParams { asset_id, .. })
            | Self::AssetOptIn(AssetOptInParams { asset_id, .. })
            | Self::AssetOptOut(AssetOptOutParams { asset_id, .. })
            | Self::AssetClawback(AssetClawbackParams { asset_id, .. })
            | Self::AssetReconfigure(AssetReconfigureParams { asset_id, .. })
            | Self::AssetDestroy(AssetDestroyParams { asset_id, .. })
            | Self::AssetFreeze(AssetFreezeParams { asset_id, .. })
            | Self::AssetUnfreeze(AssetFreezeParams { asset_id, .. }) => require_id("asset_id", *asset_id),
            Self::AssetCreate(p) => validate_asset_create(p),
            Self::AppCall(p) => {
                require_id("app_id", p.app_id)?;
                p.call.validate()
            }
            Self::AppCreate(p) => {
                if p.approval_program.is_empty() || p.clear_state_program.is_empty() {
                    return Err("approval and clear state programs are required".to_string());
                }
                if p.extra_program_pages.is_some_and(|pages| pages > MAX_EXTRA_PROGRAM_PAGES) {
                    return Err(format!("at most {} extra program pages", MAX_EXTRA_PROGRAM_PAGES));
                }
                p.call.validate()
            }
            Self::AppUpdate(p) => {
                require_id("app_id", p.app_id)?;
                if p.approval_program.is_empty() || p.clear_state_program.is_empty() {
                    return Err("approval and clear state programs are required".to_string());
                }
                p.call.validate()
            }
            Self::AppDelete(p) => {
                require_id("app_id", p.app_id)?;
                p.call.validate()
            }
            Self::OnlineKeyRegistration(p) => {
                if p.vote_first > p.vote_last {
                    return Err(format!(
                        "vote_first {} is after vote_last {}",
                        p.vote_first, p.vote_last
                    ));
                }
                if p.vote_key_dilution == 0 {
                    return Err("vote_key_dilution must be positive".to_string());
                }
                Ok(())
            }
            Self::OfflineKeyRegistration(_) | Self::NonParticipationKeyRegistration(_) => Ok(()),
        }
    }
}

fn require_id(name: &str, id: u64) -> Result<(), String> {
    if id == 0 {
        return Err(format!("{} must be non-zero", name));
    }
    Ok(())
}

fn validate_asset_create(p: &AssetCreateParams) -> Result<(), String> {
    if p.total == 0 {
        return Err("total must be positive".to_string());
    }
    if p.decimals.is_some_and(|d| d > MAX_ASSET_DECIMALS) {
        return Err(format!("decimals must be at most {}", MAX_ASSET_DECIMALS));
    }
    let too_long = |value: &Option<String>, max: usize| value.as_ref().is_some_and(|v| v.len() > max);
    if too_long(&p.asset_name, MAX_ASSET_NAME_BYTES) {
        return Err(format!("asset_name exceeds {} bytes", MAX_ASSET_NAME_BYTES));
    }
    if too_long(&p.unit_name, MAX_UNIT_NAME_BYTES) {
        return Err(format!("unit_name exceeds {} bytes", MAX_UNIT_NAME_BYTES));
    }
    if too_long(&p.url, MAX_ASSET_URL_BYTES) {
        return Err(format!("url exceeds {} bytes", MAX_ASSET_URL_BYTES));
    }
    Ok(())
}

impl AssetCreateParams {
    pub(crate) fn asset_params(&self) -> AssetParams {
        AssetParams {
            total: Some(self.total),
            decimals: self.decimals,
            default_frozen: self.default_frozen,
            asset_name: self.asset_name.clone(),
            unit_name: self.unit_name.clone(),
            url: self.url.clone(),
            metadata_hash: self.metadata_hash,
            manager: self.manager,
            reserve: self.reserve,
            freeze: self.freeze,
            clawback: self.clawback,
        }
    }
}
