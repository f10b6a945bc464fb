//! # BN254 Scalar Field Elements
//!
//! Public inputs of a Groth16 proof and "commitment"-mode verification
//! queries are decimal strings naming elements of the BN254 scalar field.
//! [`FieldElement`] holds the canonical form (no leading zeros, value below
//! the modulus) and converts to and from the 32-byte big-endian encoding
//! used to compare a commitment against a content hash.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// The BN254 scalar field modulus `r`, in decimal.
pub const BN254_SCALAR_MODULUS: &str =
    "21888242871839275222246405745257275088548364400416034343698204186575808495617";

/// A canonical decimal BN254 scalar (`0 <= v < r`).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FieldElement(String);

fn invalid(value: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidFieldElement {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Compare two canonical decimal strings numerically.
fn cmp_decimal(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

impl FieldElement {
    /// Parse a decimal string. Leading zeros are accepted and stripped.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(invalid(s, "empty"));
        }
        if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid(s, "expected decimal digits only"));
        }
        let stripped = trimmed.trim_start_matches('0');
        let canonical = if stripped.is_empty() { "0" } else { stripped };
        if cmp_decimal(canonical, BN254_SCALAR_MODULUS) != Ordering::Less {
            return Err(invalid(s, "not below the BN254 scalar modulus"));
        }
        Ok(Self(canonical.to_string()))
    }

    /// The zero element.
    pub fn zero() -> Self {
        Self("0".to_string())
    }

    /// Build from a small integer.
    pub fn from_u128(v: u128) -> Self {
        Self(v.to_string())
    }

    /// Decode a 32-byte big-endian value. Fails if it is not below `r`.
    pub fn from_be_bytes(bytes: &[u8; 32]) -> Result<Self, ValidationError> {
        let mut digits: Vec<u8> = Vec::new();
        let mut work = *bytes;
        while work.iter().any(|b| *b != 0) {
            let mut rem: u32 = 0;
            for byte in work.iter_mut() {
                let acc = (rem << 8) | u32::from(*byte);
                *byte = (acc / 10) as u8;
                rem = acc % 10;
            }
            digits.push(b'0' + rem as u8);
        }
        if digits.is_empty() {
            return Ok(Self::zero());
        }
        digits.reverse();
        let decimal = String::from_utf8(digits).map_err(|_| invalid("<bytes>", "non-ascii digit"))?;
        Self::parse(&decimal)
    }

    /// Encode as 32 big-endian bytes.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        for digit in self.0.bytes() {
            let mut carry = u32::from(digit - b'0');
            for byte in out.iter_mut().rev() {
                let v = u32::from(*byte) * 10 + carry;
                *byte = (v & 0xff) as u8;
                carry = v >> 8;
            }
        }
        out
    }

    /// The canonical decimal string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", self.0)
    }
}

impl FromStr for FieldElement {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_leading_zeros() {
        assert_eq!(FieldElement::parse("000123").unwrap().as_str(), "123");
        assert_eq!(FieldElement::parse("0000").unwrap().as_str(), "0");
    }

    #[test]
    fn rejects_modulus_and_above() {
        assert!(FieldElement::parse(BN254_SCALAR_MODULUS).is_err());
        let above = format!("{BN254_SCALAR_MODULUS}0");
        assert!(FieldElement::parse(&above).is_err());
    }

    #[test]
    fn accepts_modulus_minus_one() {
        let r_minus_one =
            "21888242871839275222246405745257275088548364400416034343698204186575808495616";
        assert!(FieldElement::parse(r_minus_one).is_ok());
    }

    #[test]
    fn rejects_non_decimal() {
        assert!(FieldElement::parse("").is_err());
        assert!(FieldElement::parse("-1").is_err());
        assert!(FieldElement::parse("0x10").is_err());
        assert!(FieldElement::parse("12a").is_err());
    }

    #[test]
    fn small_values_encode_big_endian() {
        let bytes = FieldElement::from_u128(0x0102).to_be_bytes();
        assert_eq!(bytes[30], 0x01);
        assert_eq!(bytes[31], 0x02);
        assert!(bytes[..30].iter().all(|b| *b == 0));
    }

    #[test]
    fn modulus_minus_one_round_trips_through_bytes() {
        let r_minus_one = FieldElement::parse(
            "21888242871839275222246405745257275088548364400416034343698204186575808495616",
        )
        .unwrap();
        let bytes = r_minus_one.to_be_bytes();
        assert_eq!(bytes[0], 0x30);
        assert_eq!(FieldElement::from_be_bytes(&bytes).unwrap(), r_minus_one);
    }

    #[test]
    fn bytes_at_or_above_modulus_are_rejected() {
        assert!(FieldElement::from_be_bytes(&[0xff; 32]).is_err());
    }

    proptest! {
        #[test]
        fn u64_encoding_matches_native(v in any::<u64>()) {
            let bytes = FieldElement::from_u128(u128::from(v)).to_be_bytes();
            prop_assert_eq!(&bytes[24..], &v.to_be_bytes()[..]);
            prop_assert!(bytes[..24].iter().all(|b| *b == 0));
        }

        #[test]
        fn u128_decodes_from_bytes(v in any::<u128>()) {
            let mut bytes = [0u8; 32];
            bytes[16..].copy_from_slice(&v.to_be_bytes());
            prop_assert_eq!(FieldElement::from_be_bytes(&bytes).unwrap(), FieldElement::from_u128(v));
        }
    }
}
