//! Primitive identifiers shared by the attester domain.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte hash (SHA-256 roots, block roots, signature domains).
pub type Hash = [u8; 32];

pub type Epoch = u64;
pub type Slot = u64;
pub type CommitteeIndex = u64;
pub type ValidatorIndex = u64;

/// Marker for "no vote recorded for this target".
///
/// No real epoch can reach `u64::MAX`.
pub const FAR_FUTURE_EPOCH: Epoch = u64::MAX;

/// Length of a BLS12-381 public key.
pub const PUBKEY_LEN: usize = 48;

/// Number of leading key bytes shown in logs and metric labels.
const TRUNCATED_LEN: usize = 8;

/// Public key identifying a validator for duties, history and signing.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidatorPubkey(#[serde(with = "pubkey_bytes")] pub [u8; PUBKEY_LEN]);

impl ValidatorPubkey {
    pub fn new(bytes: [u8; PUBKEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PUBKEY_LEN] {
        &self.0
    }

    /// Full lowercase hex, without prefix. Used as a stable file name.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// `0x`-prefixed hex of the first eight bytes.
    pub fn short(&self) -> String {
        format!("0x{}", hex::encode(&self.0[..TRUNCATED_LEN]))
    }
}

impl fmt::Display for ValidatorPubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short())
    }
}

impl fmt::Debug for ValidatorPubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValidatorPubkey({})", self.short())
    }
}

impl From<[u8; PUBKEY_LEN]> for ValidatorPubkey {
    fn from(bytes: [u8; PUBKEY_LEN]) -> Self {
        Self(bytes)
    }
}

// serde only derives arrays up to 32 elements.
mod pubkey_bytes {
    use super::PUBKEY_LEN;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; PUBKEY_LEN], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_bytes(bytes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; PUBKEY_LEN], D::Error> {
        let bytes: Vec<u8> = Deserialize::deserialize(d)?;
        bytes
            .try_into()
            .map_err(|v: Vec<u8>| D::Error::invalid_length(v.len(), &"48 bytes"))
    }
}

/// Truncated `0x` hex of a 32-byte root, as printed in success logs.
pub fn short_root(root: &Hash) -> String {
    format!("0x{}", hex::encode(&root[..TRUNCATED_LEN]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pubkey_display_is_truncated() {
        let mut bytes = [0u8; PUBKEY_LEN];
        bytes[0] = 0xab;
        bytes[7] = 0x01;
        bytes[8] = 0xff;
        let key = ValidatorPubkey::new(bytes);

        assert_eq!(key.to_string(), "0xab00000000000001");
        assert_eq!(key.to_hex().len(), PUBKEY_LEN * 2);
    }

    #[test]
    fn test_pubkey_bincode_roundtrip() {
        let key = ValidatorPubkey::new([7u8; PUBKEY_LEN]);
        let bytes = bincode::serialize(&key).unwrap();
        let decoded: ValidatorPubkey = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, key);
    }
}
