//! Canonical encoding, transaction ids, group ids and fee estimation
//!
//! The node's wire codec lives outside this crate. Ids and signatures are
//! computed over a deterministic `bincode` rendering of the transaction with a
//! domain-separation prefix, so the same content always yields the same id.

use super::errors::TransactionError;
use super::model::Transaction;
use super::{Byte32, MAX_TX_GROUP_SIZE, SIGNATURE_ENCODING_INCR};
use serde::Serialize;
use sha2::{Digest, Sha512_256};

const TRANSACTION_PREFIX: &[u8] = b"TX";
const GROUP_PREFIX: &[u8] = b"TG";
const BASE32: base32::Alphabet = base32::Alphabet::Rfc4648 { padding: false };

/// Inputs to fee calculation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeeParams {
    pub fee_per_byte: u64,
    pub min_fee: u64,
    pub extra_fee: Option<u64>,
    pub max_fee: Option<u64>,
}

pub fn sha512_256(bytes: &[u8]) -> Byte32 {
    Sha512_256::digest(bytes).into()
}

fn prefixed<T: Serialize>(prefix: &[u8], value: &T) -> Result<Vec<u8>, TransactionError> {
    let body = bincode::serialize(value)?;
    let mut bytes = Vec::with_capacity(prefix.len() + body.len());
    bytes.extend_from_slice(prefix);
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

impl Transaction {
    pub fn encode_raw(&self) -> Result<Vec<u8>, TransactionError> {
        Ok(bincode::serialize(self)?)
    }

    /// Domain-prefixed bytes that signers sign and ids hash
    pub fn bytes_to_sign(&self) -> Result<Vec<u8>, TransactionError> {
        prefixed(TRANSACTION_PREFIX, self)
    }

    pub fn id_raw(&self) -> Result<Byte32, TransactionError> {
        Ok(sha512_256(&self.bytes_to_sign()?))
    }

    /// Transaction id as unpadded base32, 52 characters
    pub fn id(&self) -> Result<String, TransactionError> {
        Ok(base32::encode(BASE32, &self.id_raw()?))
    }

    /// Size of the signed transaction, assuming a single signature
    pub fn estimate_size(&self) -> Result<usize, TransactionError> {
        Ok(self.encode_raw()?.len() + SIGNATURE_ENCODING_INCR)
    }

    pub fn calculate_fee(&self, params: FeeParams) -> Result<u64, TransactionError> {
        let mut fee = 0u64;
        if params.fee_per_byte > 0 {
            fee = params
                .fee_per_byte
                .saturating_mul(self.estimate_size()? as u64);
        }
        fee = fee.max(params.min_fee);
        if let Some(extra) = params.extra_fee {
            fee = fee.saturating_add(extra);
        }
        if let Some(max_fee) = params.max_fee {
            if fee > max_fee {
                return Err(TransactionError::MaxFeeExceeded { fee, max_fee });
            }
        }
        Ok(fee)
    }

    pub fn assign_fee(mut self, params: FeeParams) -> Result<Self, TransactionError> {
        let fee = self.calculate_fee(params)?;
        self.header_mut().fee = Some(fee);
        Ok(self)
    }
}

/// Deterministic group id over the ordered transaction ids. Changing any
/// member's content or the member order changes the result.
pub fn compute_group_id(transactions: &[Transaction]) -> Result<Byte32, TransactionError> {
    if transactions.is_empty() || transactions.len() > MAX_TX_GROUP_SIZE {
        return Err(TransactionError::GroupSize {
            size: transactions.len(),
            max: MAX_TX_GROUP_SIZE,
        });
    }

    let hashes = transactions
        .iter()
        .enumerate()
        .map(|(index, tx)| {
            if tx.header().group.is_some() {
                return Err(TransactionError::AlreadyGrouped { index });
            }
            tx.id_raw()
        })
        .collect::<Result<Vec<Byte32>, _>>()?;

    Ok(sha512_256(&prefixed(GROUP_PREFIX, &hashes)?))
}

/// Stamp the shared group id on every transaction
pub fn assign_group(mut transactions: Vec<Transaction>) -> Result<Vec<Transaction>, TransactionError> {
    let group = compute_group_id(&transactions)?;
    for tx in &mut transactions {
        tx.header_mut().group = Some(group);
    }
    Ok(transactions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{Address, PaymentFields, TransactionHeader};
    use proptest::prelude::*;

    fn payment(amount: u64) -> Transaction {
        Transaction::Payment(PaymentFields {
            header: TransactionHeader {
                sender: Address([1u8; 32]),
                fee: None,
                first_valid: 100,
                last_valid: 110,
                genesis_id: Some("testnet-v1.0".to_string()),
                genesis_hash: Some([3u8; 32]),
                note: None,
                rekey_to: None,
                lease: None,
                group: None,
            },
            receiver: Address([2u8; 32]),
            amount,
            close_remainder_to: None,
        })
    }

    #[test]
    fn test_id_is_52_chars_and_stable() {
        let tx = payment(5);
        let id = tx.id().unwrap();
        assert_eq!(id.len(), 52);
        assert_eq!(id, payment(5).id().unwrap());
        assert_ne!(id, payment(6).id().unwrap());
    }

    #[test]
    fn test_fee_uses_min_fee_floor() {
        let tx = payment(5);
        let fee = tx
            .calculate_fee(FeeParams {
                fee_per_byte: 0,
                min_fee: 1000,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(fee, 1000);
    }

    #[test]
    fn test_fee_per_byte_and_extra() {
        let tx = payment(5);
        let size = tx.estimate_size().unwrap() as u64;
        let fee = tx
            .calculate_fee(FeeParams {
                fee_per_byte: 10,
                min_fee: 1,
                extra_fee: Some(7),
                max_fee: None,
            })
            .unwrap();
        assert_eq!(fee, size * 10 + 7);
    }

    #[test]
    fn test_fee_over_max_is_rejected() {
        let err = payment(5)
            .calculate_fee(FeeParams {
                fee_per_byte: 0,
                min_fee: 2000,
                extra_fee: None,
                max_fee: Some(1500),
            })
            .unwrap_err();
        assert_eq!(
            err,
            TransactionError::MaxFeeExceeded {
                fee: 2000,
                max_fee: 1500
            }
        );
    }

    #[test]
    fn test_group_rejects_empty_and_oversized() {
        assert!(matches!(
            compute_group_id(&[]),
            Err(TransactionError::GroupSize { size: 0, .. })
        ));
        let many: Vec<_> = (0..=MAX_TX_GROUP_SIZE as u64).map(payment).collect();
        assert!(matches!(
            compute_group_id(&many),
            Err(TransactionError::GroupSize { .. })
        ));
    }

    #[test]
    fn test_group_rejects_pregrouped_members() {
        let grouped = assign_group(vec![payment(1), payment(2)]).unwrap();
        assert!(matches!(
            compute_group_id(&grouped),
            Err(TransactionError::AlreadyGrouped { index: 0 })
        ));
    }

    #[test]
    fn test_assign_group_stamps_all() {
        let grouped = assign_group(vec![payment(1), payment(2), payment(3)]).unwrap();
        let group = grouped[0].header().group;
        assert!(group.is_some());
        assert!(grouped.iter().all(|tx| tx.header().group == group));
    }

    proptest! {
        #[test]
        fn prop_group_id_is_order_sensitive(a in 0u64..1_000_000, b in 0u64..1_000_000) {
            prop_assume!(a != b);
            let forward = compute_group_id(&[payment(a), payment(b)]).unwrap();
            let reverse = compute_group_id(&[payment(b), payment(a)]).unwrap();
            prop_assert_ne!(forward, reverse);
        }

        #[test]
        fn prop_group_id_is_content_sensitive(a in 0u64..1_000_000, b in 0u64..1_000_000, c in 0u64..1_000_000) {
            prop_assume!(b != c);
            let one = compute_group_id(&[payment(a), payment(b)]).unwrap();
            let two = compute_group_id(&[payment(a), payment(c)]).unwrap();
            prop_assert_ne!(one, two);
        }
    }
}
