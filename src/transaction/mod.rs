//! Transaction model
//!
//! Addresses, network parameters, built and signed transactions, plus the
//! canonical encoding that ids, group ids and signatures are derived from.

mod address;
mod encoding;
pub mod errors;
mod model;
mod signed;

pub use address::Address;
pub use encoding::{assign_group, compute_group_id, sha512_256, FeeParams};
pub use errors::TransactionError;
pub use model::{
    ApplicationCallFields, AssetConfigFields, AssetFreezeFields, AssetParams,
    AssetTransferFields, KeyRegistrationFields, NetworkParameters, OnApplicationComplete,
    PaymentFields, StateSchema, Transaction, TransactionHeader, LOCALNET_GENESIS_IDS,
};
pub use signed::{
    Ed25519Signature, LogicSignature, MultisigSignature, MultisigSubsignature,
    SignatureArtifact, SignedTransaction,
};

pub type Byte32 = [u8; 32];

/// Maximum number of transactions in one atomic group
pub const MAX_TX_GROUP_SIZE: usize = 16;
pub const HASH_BYTES_LENGTH: usize = 32;
pub const PUBLIC_KEY_BYTE_LENGTH: usize = 32;
pub const CHECKSUM_BYTE_LENGTH: usize = 4;
pub const SIGNATURE_BYTE_LENGTH: usize = 64;
/// Bytes a single signature adds to an encoded transaction
pub const SIGNATURE_ENCODING_INCR: usize = 75;
