//! The 252-bit prime field element.

use core::fmt;
use core::str::FromStr;

use num_bigint::{BigInt, BigUint, Sign};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use starknet_types_core::felt::Felt;

use crate::error::PrimitiveError;

/// The size of a field element in bytes.
pub const FELT_BYTES: usize = 32;

/// The maximum number of hex digits a field element literal may carry.
const MAX_HEX_DIGITS: usize = FELT_BYTES * 2;

/// P = 2^251 + 17 * 2^192 + 1, big-endian.
const MODULUS: [u8; FELT_BYTES] = [
    0x08, 0, 0, 0, 0, 0, 0, 0x11, 0, 0, 0, 0, 0, 0, 0, 0, //
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x01,
];

/// P - 1, big-endian.
const MODULUS_MINUS_ONE: [u8; FELT_BYTES] = [
    0x08, 0, 0, 0, 0, 0, 0, 0x11, 0, 0, 0, 0, 0, 0, 0, 0, //
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
];

/// An element of the Starknet prime field, stored as 32 big-endian bytes.
///
/// The value is always in `[0, P)` where `P = 2^251 + 17 * 2^192 + 1`. Every constructor
/// validates the range, so a `Felt252` can never hold a non-canonical encoding. Equality and
/// ordering are byte-wise, which for big-endian bytes is the same as numeric ordering.
///
/// No field arithmetic lives here; hashing and arithmetic are delegated to
/// `starknet-crypto` through [`crate::hash`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Felt252([u8; FELT_BYTES]);

impl Felt252 {
    pub const ZERO: Self = Self([0; FELT_BYTES]);
    pub const ONE: Self = Self::from_raw([
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1,
    ]);
    /// The largest field element, `P - 1`.
    pub const MAX: Self = Self(MODULUS_MINUS_ONE);

    /// Creates a field element from raw big-endian bytes without range validation.
    ///
    /// Used by the `felt!` and `address!` macros, which validate at compile time.
    #[doc(hidden)]
    pub const fn from_raw(bytes: [u8; FELT_BYTES]) -> Self {
        Self(bytes)
    }

    /// Creates a field element from 32 big-endian bytes.
    pub fn from_bytes_be(bytes: &[u8; FELT_BYTES]) -> Result<Self, PrimitiveError> {
        if *bytes >= MODULUS {
            return Err(PrimitiveError::range(format!(
                "0x{} is not less than the field prime",
                hex::encode(bytes)
            )));
        }
        Ok(Self(*bytes))
    }

    /// Creates a field element from at most 32 big-endian bytes, left-padding with zeros.
    pub fn from_bytes_be_slice(bytes: &[u8]) -> Result<Self, PrimitiveError> {
        if bytes.len() > FELT_BYTES {
            return Err(PrimitiveError::range(format!(
                "{} bytes do not fit in a field element",
                bytes.len()
            )));
        }

        let mut array = [0u8; FELT_BYTES];
        array[FELT_BYTES - bytes.len()..].copy_from_slice(bytes);
        Self::from_bytes_be(&array)
    }

    /// Parses a hexadecimal string, with or without the `0x` prefix.
    ///
    /// Accepts at most 64 hex digits; both cases are accepted.
    pub fn from_hex(s: &str) -> Result<Self, PrimitiveError> {
        let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);

        if digits.is_empty() {
            return Err(PrimitiveError::parse(format!("`{s}` contains no hex digits")));
        }
        if digits.len() > MAX_HEX_DIGITS {
            return Err(PrimitiveError::parse(format!(
                "`{s}` has {} hex digits, at most {MAX_HEX_DIGITS} are allowed",
                digits.len()
            )));
        }

        let padded = format!("{digits:0>MAX_HEX_DIGITS$}");
        let mut bytes = [0u8; FELT_BYTES];
        hex::decode_to_slice(&padded, &mut bytes)
            .map_err(|e| PrimitiveError::parse(format!("`{s}` is not a hex string: {e}")))?;

        Self::from_bytes_be(&bytes)
    }

    /// Parses a decimal string. Negative values are rejected as out of range.
    pub fn from_dec_str(s: &str) -> Result<Self, PrimitiveError> {
        let value = BigInt::parse_bytes(s.as_bytes(), 10)
            .ok_or_else(|| PrimitiveError::parse(format!("`{s}` is not a decimal integer")))?;
        Self::from_bigint(&value)
    }

    pub fn from_biguint(value: &BigUint) -> Result<Self, PrimitiveError> {
        Self::from_bytes_be_slice(&value.to_bytes_be())
            .map_err(|_| PrimitiveError::range(format!("{value} is not less than the field prime")))
    }

    pub fn from_bigint(value: &BigInt) -> Result<Self, PrimitiveError> {
        match value.to_biguint() {
            Some(unsigned) => Self::from_biguint(&unsigned),
            None => Err(PrimitiveError::range(format!("{value} is negative"))),
        }
    }

    pub const fn to_bytes_be(&self) -> [u8; FELT_BYTES] {
        self.0
    }

    pub const fn as_bytes(&self) -> &[u8; FELT_BYTES] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; FELT_BYTES]
    }

    /// Returns the canonical form: `0x` followed by exactly 64 lowercase hex digits.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Returns the shortest `0x`-prefixed hex form, e.g. `0x0` or `0x1f`.
    pub fn to_hex_stripped(&self) -> String {
        let full = hex::encode(self.0);
        let stripped = full.trim_start_matches('0');
        if stripped.is_empty() {
            "0x0".to_string()
        } else {
            format!("0x{stripped}")
        }
    }

    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_be(&self.0)
    }

    pub fn to_bigint(&self) -> BigInt {
        BigInt::from_bytes_be(Sign::Plus, &self.0)
    }

    /// Returns the value if it fits in a `u128`.
    pub fn to_u128(&self) -> Option<u128> {
        let (high, low) = self.0.split_at(16);
        if high.iter().any(|b| *b != 0) {
            return None;
        }
        let mut buf = [0u8; 16];
        buf.copy_from_slice(low);
        Some(u128::from_be_bytes(buf))
    }

    pub fn to_u64(&self) -> Option<u64> {
        self.to_u128().and_then(|v| u64::try_from(v).ok())
    }

    /// Number of significant bits in the value.
    pub fn bits(&self) -> u64 {
        self.to_biguint().bits()
    }

    /// The field prime as an integer.
    pub fn modulus() -> BigUint {
        BigUint::from_bytes_be(&MODULUS)
    }
}

macro_rules! impl_from_unsigned {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Felt252 {
                fn from(value: $ty) -> Self {
                    let bytes = value.to_be_bytes();
                    let mut array = [0u8; FELT_BYTES];
                    array[FELT_BYTES - bytes.len()..].copy_from_slice(&bytes);
                    Self(array)
                }
            }
        )*
    };
}

impl_from_unsigned!(u8, u16, u32, u64, u128, usize);

impl From<bool> for Felt252 {
    fn from(value: bool) -> Self {
        if value {
            Self::ONE
        } else {
            Self::ZERO
        }
    }
}

impl TryFrom<[u8; FELT_BYTES]> for Felt252 {
    type Error = PrimitiveError;

    fn try_from(bytes: [u8; FELT_BYTES]) -> Result<Self, Self::Error> {
        Self::from_bytes_be(&bytes)
    }
}

impl TryFrom<&BigUint> for Felt252 {
    type Error = PrimitiveError;

    fn try_from(value: &BigUint) -> Result<Self, Self::Error> {
        Self::from_biguint(value)
    }
}

impl TryFrom<&BigInt> for Felt252 {
    type Error = PrimitiveError;

    fn try_from(value: &BigInt) -> Result<Self, Self::Error> {
        Self::from_bigint(value)
    }
}

impl From<Felt252> for BigUint {
    fn from(felt: Felt252) -> Self {
        felt.to_biguint()
    }
}

// Any `Felt` is already reduced, so this direction cannot fail.
impl From<Felt> for Felt252 {
    fn from(value: Felt) -> Self {
        Self(value.to_bytes_be())
    }
}

impl From<Felt252> for Felt {
    fn from(value: Felt252) -> Self {
        Felt::from_bytes_be(&value.0)
    }
}

impl From<&Felt252> for Felt {
    fn from(value: &Felt252) -> Self {
        Felt::from_bytes_be(&value.0)
    }
}

impl FromStr for Felt252 {
    type Err = PrimitiveError;

    /// Parses either a `0x`-prefixed hex string or a decimal string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("0x") || s.starts_with("0X") {
            Self::from_hex(s)
        } else {
            Self::from_dec_str(s)
        }
    }
}

impl fmt::Debug for Felt252 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Felt252").field(&format_args!("{}", self.to_hex_stripped())).finish()
    }
}

impl fmt::Display for Felt252 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::LowerHex for Felt252 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stripped = self.to_hex_stripped();
        let digits = &stripped[2..];
        f.pad_integral(true, "0x", digits)
    }
}

impl Serialize for Felt252 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Felt252 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FeltVisitor;

        impl Visitor<'_> for FeltVisitor {
            type Value = Felt252;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a 0x-prefixed hex string, a decimal string or an integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(de::Error::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(Felt252::from(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u64::try_from(v)
                    .map(Felt252::from)
                    .map_err(|_| de::Error::custom(format!("value out of range: {v} is negative")))
            }

            fn visit_u128<E: de::Error>(self, v: u128) -> Result<Self::Value, E> {
                Ok(Felt252::from(v))
            }
        }

        deserializer.deserialize_any(FeltVisitor)
    }
}
