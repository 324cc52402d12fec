//! 128-bit product identities
//!
//! An identity is canonically a lowercase hex string of at most 32
//! digits; the empty string is the "unset" sentinel. Identities are
//! either user-supplied, randomly generated, or derived from a seed
//! string. The derivation is a content-derived pseudo-identifier, not a
//! cryptographic hash: two seeds may collide with negligible
//! probability, so it must not be used where collision resistance is a
//! security requirement.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;

use crate::error::InvalidIdentity;

/// Odd step added to the 128-bit counter on every derivation round
const SEED_STEP: u128 = 0x0000_0012_0103_0307;

/// A 128-bit identity as a lowercase hex string (max 32 digits)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductId(String);

impl ProductId {
    /// Parse and canonicalize (lowercase) an identity string
    pub fn parse(s: &str) -> Result<Self, InvalidIdentity> {
        if !Self::is_valid_str(s) {
            return Err(InvalidIdentity(s.to_string()));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// True iff `s` is at most 32 ASCII hex digits (case-insensitive).
    /// The empty string is valid and means "unset".
    pub fn is_valid_str(s: &str) -> bool {
        s.len() <= 32 && s.bytes().all(|b| b.is_ascii_hexdigit())
    }

    pub fn is_unset(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive a stable identity from an arbitrary seed string.
    ///
    /// A 128-bit counter (two little-endian 64-bit lanes) is stepped by
    /// a fixed odd constant, its bytes are XOR-folded with the seed
    /// characters, and the round repeats until the 16-byte buffer is
    /// non-zero. Total over all seeds, including the empty string.
    pub fn from_seed(seed: &str) -> Self {
        let mut counter: u128 = 0;
        let mut buf = [0u8; 16];

        loop {
            counter = counter.wrapping_add(SEED_STEP);
            buf[..8].copy_from_slice(&(counter as u64).to_le_bytes());
            buf[8..].copy_from_slice(&((counter >> 64) as u64).to_le_bytes());

            for (i, c) in seed.chars().enumerate() {
                let c = c as u32;
                let i = i as u32;
                buf[15 - (i as usize % 16)] ^= c.wrapping_add(i.wrapping_mul(27)) as u8;
                buf[i as usize % 16] ^= c.wrapping_sub(i.wrapping_mul(8)) as u8;
            }

            if buf.iter().any(|&b| b != 0) {
                break;
            }
        }

        Self(hex_encode(&buf))
    }

    /// 128 bits of process-local pseudo-randomness
    pub fn random() -> Self {
        let bits: u128 = rand::thread_rng().r#gen();
        Self(format!("{bits:032x}"))
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ProductId {
    type Error = InvalidIdentity;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ProductId> for String {
    fn from(id: ProductId) -> String {
        id.0
    }
}
