//! Account addresses
//!
//! An address is a 32-byte public key (or the digest standing in for one, for
//! multisig and logic-signature accounts) rendered as 58 characters of
//! unpadded base32 with a 4-byte SHA-512/256 checksum appended.

use super::errors::TransactionError;
use super::{Byte32, CHECKSUM_BYTE_LENGTH, HASH_BYTES_LENGTH, PUBLIC_KEY_BYTE_LENGTH};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512_256};
use std::fmt;
use std::str::FromStr;

const ADDRESS_STR_LENGTH: usize = 58;
const BASE32: base32::Alphabet = base32::Alphabet::Rfc4648 { padding: false };

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub Byte32);

impl Address {
    pub fn from_public_key(public_key: Byte32) -> Self {
        Self(public_key)
    }

    pub fn as_bytes(&self) -> &Byte32 {
        &self.0
    }

    /// The all-zero address, used by the protocol as "no address".
    pub fn zero() -> Self {
        Self([0u8; PUBLIC_KEY_BYTE_LENGTH])
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    fn checksum(&self) -> [u8; CHECKSUM_BYTE_LENGTH] {
        let digest = Sha512_256::digest(self.0);
        let mut checksum = [0u8; CHECKSUM_BYTE_LENGTH];
        checksum.copy_from_slice(&digest[HASH_BYTES_LENGTH - CHECKSUM_BYTE_LENGTH..]);
        checksum
    }

    pub fn encode(&self) -> String {
        let mut buffer = [0u8; PUBLIC_KEY_BYTE_LENGTH + CHECKSUM_BYTE_LENGTH];
        buffer[..PUBLIC_KEY_BYTE_LENGTH].copy_from_slice(&self.0);
        buffer[PUBLIC_KEY_BYTE_LENGTH..].copy_from_slice(&self.checksum());
        base32::encode(BASE32, &buffer)
    }
}

impl FromStr for Address {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ADDRESS_STR_LENGTH {
            return Err(TransactionError::InvalidAddress(format!(
                "expected {} characters, got {}",
                ADDRESS_STR_LENGTH,
                s.len()
            )));
        }

        let decoded = base32::decode(BASE32, s)
            .ok_or_else(|| TransactionError::InvalidAddress("invalid base32 encoding".into()))?;
        if decoded.len() != PUBLIC_KEY_BYTE_LENGTH + CHECKSUM_BYTE_LENGTH {
            return Err(TransactionError::InvalidAddress(format!(
                "decoded to {} bytes",
                decoded.len()
            )));
        }

        let mut public_key = [0u8; PUBLIC_KEY_BYTE_LENGTH];
        public_key.copy_from_slice(&decoded[..PUBLIC_KEY_BYTE_LENGTH]);
        let address = Address(public_key);

        if address.checksum()[..] != decoded[PUBLIC_KEY_BYTE_LENGTH..] {
            return Err(TransactionError::InvalidAddress(format!(
                "checksum mismatch for {}",
                s
            )));
        }
        Ok(address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.encode())
    }
}

impl From<Byte32> for Address {
    fn from(bytes: Byte32) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_address_encoding() {
        let zero = Address::zero();
        assert_eq!(
            zero.to_string(),
            "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAY5HFKQ"
        );
        assert!(zero.is_zero());
    }

    #[test]
    fn test_address_string_roundtrip() {
        let address = Address([7u8; 32]);
        let parsed: Address = address.to_string().parse().unwrap();
        assert_eq!(parsed, address);
    }

    #[test]
    fn test_rejects_bad_checksum() {
        let encoded = Address([9u8; 32]).to_string();
        // alter the public key portion, keep the checksum
        let first = if encoded.starts_with('A') { "B" } else { "A" };
        let encoded = format!("{}{}", first, &encoded[1..]);
        assert!(matches!(
            encoded.parse::<Address>(),
            Err(TransactionError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert!("SHORT".parse::<Address>().is_err());
    }
}
