//! Signing credentials
//!
//! Each variant is plain data; [`SigningCredential::sign`] is the single
//! dispatch point that turns a transaction into a signature artifact.

use super::errors::SignerError;
use super::TransactionSigner;
use crate::transaction::{
    Address, Byte32, Ed25519Signature, LogicSignature, MultisigSignature, SignatureArtifact,
    SignedTransaction, Transaction,
};
use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use std::fmt;

#[derive(Clone)]
pub enum SigningCredential {
    SingleKey(SigningKey),
    Multisig {
        version: u8,
        threshold: u8,
        /// Ordered participant public keys; the order fixes the address
        participants: Vec<Byte32>,
        /// Keys held locally, a subset of the participants
        keys: Vec<SigningKey>,
    },
    LogicSig {
        program: Vec<u8>,
        args: Vec<Vec<u8>>,
        /// Present for delegated logic, absent for a contract account
        delegating_key: Option<SigningKey>,
    },
}

impl SigningCredential {
    pub fn from_seed(seed: Byte32) -> Self {
        Self::SingleKey(SigningKey::from_bytes(&seed))
    }

    /// Address this credential authorises
    pub fn address(&self) -> Address {
        match self {
            Self::SingleKey(key) => Address::from_public_key(key.verifying_key().to_bytes()),
            Self::Multisig {
                version,
                threshold,
                participants,
                ..
            } => MultisigSignature::new(*version, *threshold, participants).address(),
            Self::LogicSig {
                program,
                delegating_key,
                ..
            } => match delegating_key {
                Some(key) => Address::from_public_key(key.verifying_key().to_bytes()),
                None => LogicSignature::program_address(program),
            },
        }
    }

    pub fn sign(&self, transaction: &Transaction) -> Result<SignatureArtifact, SignerError> {
        match self {
            Self::SingleKey(key) => {
                let message = transaction.bytes_to_sign()?;
                Ok(SignatureArtifact::Single(sign_bytes(key, &message)))
            }
            Self::Multisig {
                version,
                threshold,
                participants,
                keys,
            } => {
                let message = transaction.bytes_to_sign()?;
                let mut multisig = MultisigSignature::new(*version, *threshold, participants);
                for sub in &mut multisig.subsignatures {
                    if let Some(key) = keys
                        .iter()
                        .find(|k| k.verifying_key().to_bytes() == sub.public_key)
                    {
                        sub.signature = Some(sign_bytes(key, &message));
                    }
                }
                let have = multisig.signature_count();
                let need = usize::from(*threshold);
                if have < need {
                    return Err(SignerError::MultisigThreshold { have, need });
                }
                Ok(SignatureArtifact::Multisig(multisig))
            }
            Self::LogicSig {
                program,
                args,
                delegating_key,
            } => Ok(SignatureArtifact::Logic(LogicSignature {
                program: program.clone(),
                args: args.clone(),
                signature: delegating_key
                    .as_ref()
                    .map(|key| sign_bytes(key, &LogicSignature::bytes_to_sign(program))),
            })),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::SingleKey(_) => "single",
            Self::Multisig { .. } => "multisig",
            Self::LogicSig { .. } => "logicsig",
        }
    }
}

fn sign_bytes(key: &SigningKey, message: &[u8]) -> Ed25519Signature {
    Ed25519Signature(key.sign(message).to_bytes())
}

impl fmt::Debug for SigningCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningCredential")
            .field("kind", &self.kind())
            .field("address", &self.address())
            .finish()
    }
}

#[async_trait]
impl TransactionSigner for SigningCredential {
    async fn sign_transactions(
        &self,
        transactions: &[Transaction],
        indices: &[usize],
    ) -> Result<Vec<SignedTransaction>, SignerError> {
        let address = self.address();
        indices
            .iter()
            .map(|&index| {
                let transaction = transactions.get(index).ok_or(SignerError::IndexOutOfRange {
                    index,
                    len: transactions.len(),
                })?;
                Ok(SignedTransaction {
                    transaction: transaction.clone(),
                    signature: self.sign(transaction)?,
                    auth_address: (transaction.sender() != &address).then_some(address),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{PaymentFields, TransactionHeader};
    use ed25519_dalek::{Signature, Verifier};

    fn payment(sender: Address) -> Transaction {
        Transaction::Payment(PaymentFields {
            header: TransactionHeader {
                sender,
                fee: Some(1000),
                first_valid: 1,
                last_valid: 11,
                genesis_id: None,
                genesis_hash: Some([7u8; 32]),
                note: None,
                rekey_to: None,
                lease: None,
                group: None,
            },
            receiver: Address([2u8; 32]),
            amount: 10,
            close_remainder_to: None,
        })
    }

    #[test]
    fn test_single_key_signature_verifies() {
        let credential = SigningCredential::from_seed([4u8; 32]);
        let tx = payment(credential.address());
        let SignatureArtifact::Single(sig) = credential.sign(&tx).unwrap() else {
            panic!("expected single signature");
        };

        let SigningCredential::SingleKey(key) = &credential else {
            unreachable!()
        };
        key.verifying_key()
            .verify(&tx.bytes_to_sign().unwrap(), &Signature::from_bytes(&sig.0))
            .unwrap();
    }

    #[test]
    fn test_multisig_threshold() {
        let a = SigningKey::from_bytes(&[1u8; 32]);
        let b = SigningKey::from_bytes(&[2u8; 32]);
        let participants = vec![a.verifying_key().to_bytes(), b.verifying_key().to_bytes()];

        let partial = SigningCredential::Multisig {
            version: 1,
            threshold: 2,
            participants: participants.clone(),
            keys: vec![a.clone()],
        };
        let tx = payment(partial.address());
        assert_eq!(
            partial.sign(&tx).unwrap_err(),
            SignerError::MultisigThreshold { have: 1, need: 2 }
        );

        let full = SigningCredential::Multisig {
            version: 1,
            threshold: 2,
            participants,
            keys: vec![b, a],
        };
        let SignatureArtifact::Multisig(msig) = full.sign(&tx).unwrap() else {
            panic!("expected multisig");
        };
        assert_eq!(msig.signature_count(), 2);
    }

    #[test]
    fn test_logicsig_escrow_has_no_signature() {
        let credential = SigningCredential::LogicSig {
            program: vec![0x06, 0x81, 0x01],
            args: vec![],
            delegating_key: None,
        };
        let tx = payment(credential.address());
        let SignatureArtifact::Logic(lsig) = credential.sign(&tx).unwrap() else {
            panic!("expected logic signature");
        };
        assert!(lsig.signature.is_none());
        assert_eq!(
            credential.address(),
            LogicSignature::program_address(&[0x06, 0x81, 0x01])
        );
    }

    #[tokio::test]
    async fn test_sign_transactions_sets_auth_address_for_rekeyed_sender() {
        let credential = SigningCredential::from_seed([9u8; 32]);
        let own = payment(credential.address());
        let rekeyed = payment(Address([5u8; 32]));

        let signed = credential
            .sign_transactions(&[own, rekeyed], &[0, 1])
            .await
            .unwrap();
        assert_eq!(signed[0].auth_address, None);
        assert_eq!(signed[1].auth_address, Some(credential.address()));

        let err = credential.sign_transactions(&[], &[3]).await.unwrap_err();
        assert_eq!(err, SignerError::IndexOutOfRange { index: 3, len: 0 });
    }
}
