use super::errors::SignerError;
use super::{SharedSigner, SigningCredential};
use crate::transaction::Address;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Address to signer map with an optional fallback signer.
///
/// Clones share the same underlying map, so one registry can back any number
/// of composers.
#[derive(Clone, Default)]
pub struct SignerRegistry {
    signers: Arc<DashMap<Address, SharedSigner>>,
    default: Arc<RwLock<Option<SharedSigner>>>,
}

impl SignerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact match first, then the default signer
    pub fn get_signer(&self, address: &Address) -> Result<SharedSigner, SignerError> {
        if let Some(signer) = self.signers.get(address) {
            return Ok(signer.value().clone());
        }
        self.default
            .read()
            .clone()
            .ok_or(SignerError::NoSignerRegistered { address: *address })
    }

    pub fn set_signer(&self, address: Address, signer: SharedSigner) {
        debug!(address = %address, "Registering signer");
        self.signers.insert(address, signer);
    }

    /// Register a credential under the address it authorises
    pub fn add_credential(&self, credential: SigningCredential) -> Address {
        let address = credential.address();
        self.set_signer(address, Arc::new(credential));
        address
    }

    pub fn clear_signer(&self, address: &Address) -> bool {
        self.signers.remove(address).is_some()
    }

    pub fn set_default_signer(&self, signer: SharedSigner) {
        *self.default.write() = Some(signer);
    }

    pub fn clear_default_signer(&self) {
        *self.default.write() = None;
    }

    /// Copy address entries from `other`. Existing entries are replaced only
    /// when `overwrite` is set; the default signer is left alone.
    pub fn set_signers(&self, other: &SignerRegistry, overwrite: bool) {
        if Arc::ptr_eq(&self.signers, &other.signers) {
            return;
        }
        // Snapshot first so no shard of `other` stays locked while writing
        let incoming: Vec<(Address, SharedSigner)> = other
            .signers
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        for (address, signer) in incoming {
            if overwrite {
                self.signers.insert(address, signer);
            } else {
                self.signers.entry(address).or_insert(signer);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.signers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }

    pub fn has_default(&self) -> bool {
        self.default.read().is_some()
    }
}

impl std::fmt::Debug for SignerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignerRegistry")
            .field("addresses", &self.signers.iter().map(|e| *e.key()).collect::<Vec<_>>())
            .field("has_default", &self.has_default())
            .finish()
    }
}
