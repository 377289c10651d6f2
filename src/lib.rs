//! algo-composer
//!
//! Client-side SDK that builds, signs, groups and submits transactions to an
//! Algorand node, with bulk asset operations, TEAL compilation with template
//! substitution, and application state decoding layered on top.

pub mod app;
pub mod batch;
pub mod composer;
pub mod config;
pub mod metrics;
pub mod node;
pub mod observability;
pub mod signer;
pub mod structured_logging;
pub mod test_utils;
pub mod transaction;
pub mod transport;

pub use app::AppManager;
pub use batch::{AssetManager, BatchProcessor};
pub use composer::{ComposerError, SendParams, SendResults, TransactionComposer};
pub use config::SdkConfig;
pub use node::{HttpNodeClient, NodeApi};
pub use signer::{SignerRegistry, SigningCredential, TransactionSigner};
pub use transaction::{Address, NetworkParameters, SignedTransaction, Transaction};
