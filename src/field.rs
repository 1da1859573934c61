//! Canonical field elements of the Pallas base field.
//!
//! Every value stored in a tree, a proof or a witness input is a
//! [`FieldElement`]. The wrapped `pallas::Base` is always reduced, so the only
//! place a non-canonical value can show up is while converting from external
//! data (decimal strings, hex, raw bytes). Those conversions reject anything
//! at or above the modulus instead of silently reducing it.

use crate::error::{MerkleError, Result};
use num_bigint::BigUint;
use pasta_curves::group::ff::PrimeField;
use pasta_curves::pallas;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Size in bytes of the canonical little-endian representation.
pub const FIELD_BYTES: usize = 32;

/// A canonical element of the Poseidon hash field.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldElement(pallas::Base);

/// The field modulus as a big integer.
pub fn modulus() -> BigUint {
    let max = -pallas::Base::from(1u64);
    BigUint::from_bytes_le(max.to_repr().as_ref()) + 1u32
}

impl FieldElement {
    pub fn zero() -> Self {
        Self(pallas::Base::zero())
    }

    pub fn from_u64(value: u64) -> Self {
        Self(pallas::Base::from(value))
    }

    /// Wraps an already reduced field value.
    pub fn from_base(value: pallas::Base) -> Self {
        Self(value)
    }

    pub fn inner(&self) -> pallas::Base {
        self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == pallas::Base::zero()
    }

    /// Decodes a little-endian canonical representation.
    ///
    /// # Errors
    /// Returns [`MerkleError::InvalidFieldElement`] if the bytes encode a value
    /// greater than or equal to the modulus.
    pub fn from_repr(bytes: [u8; FIELD_BYTES]) -> Result<Self> {
        Option::<pallas::Base>::from(pallas::Base::from_repr(bytes))
            .map(Self)
            .ok_or_else(|| {
                MerkleError::InvalidFieldElement(format!(
                    "0x{} is not a canonical field encoding",
                    hex::encode(bytes)
                ))
            })
    }

    /// Little-endian canonical representation.
    pub fn to_repr(&self) -> [u8; FIELD_BYTES] {
        let mut bytes = [0u8; FIELD_BYTES];
        bytes.copy_from_slice(self.0.to_repr().as_ref());
        bytes
    }

    /// # Errors
    /// Returns [`MerkleError::InvalidFieldElement`] if `value` is not below the modulus.
    pub fn from_biguint(value: &BigUint) -> Result<Self> {
        if *value >= modulus() {
            return Err(MerkleError::InvalidFieldElement(format!(
                "{value} is not reduced modulo the field prime"
            )));
        }

        let le = value.to_bytes_le();
        let mut bytes = [0u8; FIELD_BYTES];
        bytes[..le.len()].copy_from_slice(&le);
        Self::from_repr(bytes)
    }

    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_le(&self.to_repr())
    }

    /// Parses an unsigned base-10 integer (surrounding whitespace allowed).
    ///
    /// Signs, separators and values at or above the modulus are rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// use zkp_merkle_membership::field::FieldElement;
    ///
    /// let x = FieldElement::from_decimal_str("12345").unwrap();
    /// assert_eq!(x, FieldElement::from_u64(12345));
    /// assert!(FieldElement::from_decimal_str("-1").is_err());
    /// ```
    pub fn from_decimal_str(input: &str) -> Result<Self> {
        let digits = input.trim();
        if digits.is_empty() {
            return Err(MerkleError::InvalidFieldElement(
                "empty decimal string".to_string(),
            ));
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MerkleError::InvalidFieldElement(format!(
                "'{digits}' is not an unsigned decimal integer"
            )));
        }

        let value = BigUint::parse_bytes(digits.as_bytes(), 10).ok_or_else(|| {
            MerkleError::InvalidFieldElement(format!("'{digits}' could not be parsed"))
        })?;
        Self::from_biguint(&value)
    }

    pub fn to_decimal_string(&self) -> String {
        self.to_biguint().to_str_radix(10)
    }

    /// Parses a 64-character big-endian hex string, with or without `0x`.
    pub fn from_hex(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let stripped = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if stripped.len() != FIELD_BYTES * 2 {
            return Err(MerkleError::InvalidFieldElement(format!(
                "hex field element must be {} characters (got {})",
                FIELD_BYTES * 2,
                stripped.len()
            )));
        }

        let decoded = hex::decode(stripped)
            .map_err(|e| MerkleError::InvalidFieldElement(format!("invalid hex: {e}")))?;
        let mut bytes = [0u8; FIELD_BYTES];
        bytes.copy_from_slice(&decoded);
        bytes.reverse();
        Self::from_repr(bytes)
    }

    /// Big-endian hex, 64 characters, no prefix.
    pub fn to_hex(&self) -> String {
        let mut bytes = self.to_repr();
        bytes.reverse();
        hex::encode(bytes)
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<pallas::Base> for FieldElement {
    fn from(value: pallas::Base) -> Self {
        Self(value)
    }
}

impl From<FieldElement> for pallas::Base {
    fn from(value: FieldElement) -> Self {
        value.0
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement(0x{})", self.to_hex())
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal_string())
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal_string())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_decimal_str(&s).map_err(serde::de::Error::custom)
    }
}
