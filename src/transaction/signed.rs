//! Signature artifacts and signed transactions

use super::address::Address;
use super::errors::TransactionError;
use super::model::Transaction;
use super::{Byte32, SIGNATURE_BYTE_LENGTH};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha512_256};
use std::fmt;

const MULTISIG_ADDRESS_PREFIX: &[u8] = b"MultisigAddr";
const PROGRAM_PREFIX: &[u8] = b"Program";

/// Raw ed25519 signature bytes
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Ed25519Signature(pub [u8; SIGNATURE_BYTE_LENGTH]);

impl fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Signature({}..)", hex::encode(&self.0[..8]))
    }
}

impl Serialize for Ed25519Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.as_slice().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Ed25519Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        let array: [u8; SIGNATURE_BYTE_LENGTH] = bytes.as_slice().try_into().map_err(|_| {
            serde::de::Error::invalid_length(bytes.len(), &"64 signature bytes")
        })?;
        Ok(Self(array))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigSubsignature {
    pub public_key: Byte32,
    pub signature: Option<Ed25519Signature>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigSignature {
    pub version: u8,
    pub threshold: u8,
    pub subsignatures: Vec<MultisigSubsignature>,
}

impl MultisigSignature {
    /// Unsigned multisig shell for the given participants
    pub fn new(version: u8, threshold: u8, participants: &[Byte32]) -> Self {
        Self {
            version,
            threshold,
            subsignatures: participants
                .iter()
                .map(|pk| MultisigSubsignature {
                    public_key: *pk,
                    signature: None,
                })
                .collect(),
        }
    }

    /// Address of the multisig account: a digest over version, threshold and
    /// the ordered participant keys.
    pub fn address(&self) -> Address {
        let mut hasher = Sha512_256::new();
        hasher.update(MULTISIG_ADDRESS_PREFIX);
        hasher.update([self.version, self.threshold]);
        for sub in &self.subsignatures {
            hasher.update(sub.public_key);
        }
        Address(hasher.finalize().into())
    }

    pub fn signature_count(&self) -> usize {
        self.subsignatures
            .iter()
            .filter(|s| s.signature.is_some())
            .count()
    }
}

/// Delegated-logic signature: the program authorises the transaction, either
/// as an escrow account (no signature) or on behalf of a delegating key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicSignature {
    pub program: Vec<u8>,
    pub args: Vec<Vec<u8>>,
    pub signature: Option<Ed25519Signature>,
}

impl LogicSignature {
    /// Escrow address derived from the program bytes
    pub fn program_address(program: &[u8]) -> Address {
        let mut hasher = Sha512_256::new();
        hasher.update(PROGRAM_PREFIX);
        hasher.update(program);
        Address(hasher.finalize().into())
    }

    /// Bytes a delegating key signs
    pub fn bytes_to_sign(program: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(PROGRAM_PREFIX.len() + program.len());
        bytes.extend_from_slice(PROGRAM_PREFIX);
        bytes.extend_from_slice(program);
        bytes
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureArtifact {
    Single(Ed25519Signature),
    Multisig(MultisigSignature),
    Logic(LogicSignature),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub transaction: Transaction,
    pub signature: SignatureArtifact,
    /// Signing address when it differs from the sender (rekeyed accounts)
    pub auth_address: Option<Address>,
}

impl SignedTransaction {
    pub fn id(&self) -> Result<String, TransactionError> {
        self.transaction.id()
    }

    pub fn encode(&self) -> Result<Vec<u8>, TransactionError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, TransactionError> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Concatenated encodings, the body of a group submission
    pub fn encode_group(group: &[SignedTransaction]) -> Result<Vec<u8>, TransactionError> {
        let mut bytes = Vec::new();
        for signed in group {
            bytes.extend_from_slice(&signed.encode()?);
        }
        Ok(bytes)
    }

    pub fn decode_group(bytes: &[u8]) -> Result<Vec<SignedTransaction>, TransactionError> {
        let mut cursor = std::io::Cursor::new(bytes);
        let mut group = Vec::new();
        while (cursor.position() as usize) < bytes.len() {
            group.push(bincode::deserialize_from(&mut cursor)?);
        }
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multisig_address_depends_on_participant_order() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        let ab = MultisigSignature::new(1, 2, &[a, b]).address();
        let ba = MultisigSignature::new(1, 2, &[b, a]).address();
        assert_ne!(ab, ba);
        assert_eq!(ab, MultisigSignature::new(1, 2, &[a, b]).address());
    }

    #[test]
    fn test_program_address_is_stable() {
        let program = vec![0x06, 0x81, 0x01];
        assert_eq!(
            LogicSignature::program_address(&program),
            LogicSignature::program_address(&program)
        );
        assert_ne!(
            LogicSignature::program_address(&program),
            LogicSignature::program_address(&[0x06, 0x81, 0x00])
        );
    }

    #[test]
    fn test_group_encoding_splits_back_into_members() {
        use crate::transaction::{PaymentFields, TransactionHeader};

        let signed = |amount: u64| SignedTransaction {
            transaction: Transaction::Payment(PaymentFields {
                header: TransactionHeader {
                    sender: Address([1u8; 32]),
                    fee: Some(1000),
                    first_valid: 1,
                    last_valid: 11,
                    genesis_id: None,
                    genesis_hash: None,
                    note: None,
                    rekey_to: None,
                    lease: None,
                    group: None,
                },
                receiver: Address([2u8; 32]),
                amount,
                close_remainder_to: None,
            }),
            signature: SignatureArtifact::Single(Ed25519Signature([9u8; 64])),
            auth_address: None,
        };

        let group = vec![signed(1), signed(2), signed(3)];
        let bytes = SignedTransaction::encode_group(&group).unwrap();
        assert_eq!(SignedTransaction::decode_group(&bytes).unwrap(), group);
    }

    #[test]
    fn test_signature_serde_rejects_short_bytes() {
        let encoded = bincode::serialize(&vec![1u8; 10]).unwrap();
        assert!(bincode::deserialize::<Ed25519Signature>(&encoded).is_err());
    }
}
