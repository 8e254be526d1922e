//! Fixed-width Cairo integers.
//!
//! Unsigned integers encode into a felt as themselves. Signed integers use the prime-field
//! encoding the Cairo compiler emits: a non-negative value is carried as-is, a negative value
//! `v` is carried as `P + v`. That encoding is only applied by [`to_felt`](Int8::to_felt) /
//! [`from_felt`](Int8::from_felt); the plain conversions (`to_bigint`, `to_hex`) never touch it.

use core::fmt;
use core::str::FromStr;

use alloy_primitives::U256;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::One;

use crate::codec::{deserialize_u256, serialize_u256};
use crate::error::PrimitiveError;
use crate::felt::Felt252;

/// Parses an integer literal: optional `-`, then either `0x`-prefixed hex or decimal digits.
pub fn parse_integer(s: &str) -> Result<BigInt, PrimitiveError> {
    let trimmed = s.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let (radix, digits) = match body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        Some(hex) => (16, hex),
        None => (10, body),
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(PrimitiveError::parse(format!("`{s}` is not an integer literal")));
    }

    let magnitude = BigUint::parse_bytes(digits.as_bytes(), radix)
        .ok_or_else(|| PrimitiveError::parse(format!("`{s}` is not an integer literal")))?;
    let sign = if negative { Sign::Minus } else { Sign::Plus };
    Ok(BigInt::from_biguint(sign, magnitude))
}

fn signed_bounds(bits: u32) -> (BigInt, BigInt) {
    let half = BigInt::one() << (bits - 1);
    (-half.clone(), half - 1)
}

/// Encodes a signed integer of the given width into its field representation.
pub fn encode_signed(value: &BigInt, bits: u32) -> Result<Felt252, PrimitiveError> {
    let (min, max) = signed_bounds(bits);
    if *value < min || *value > max {
        return Err(PrimitiveError::range(format!("{value} is out of range for i{bits} [{min}, {max}]")));
    }

    if value.sign() == Sign::Minus {
        let modulus = BigInt::from(Felt252::modulus());
        Felt252::from_bigint(&(modulus + value))
    } else {
        Felt252::from_bigint(value)
    }
}

/// Inverts [`encode_signed`]: raw values up to the signed maximum decode as themselves,
/// larger ones as `raw - P`.
pub fn decode_signed(felt: &Felt252, bits: u32) -> Result<BigInt, PrimitiveError> {
    let (min, max) = signed_bounds(bits);
    let raw = felt.to_bigint();

    let value = if raw <= max { raw } else { raw - BigInt::from(Felt252::modulus()) };
    if value < min {
        return Err(PrimitiveError::range(format!(
            "{} does not encode an i{bits}",
            felt.to_hex_stripped()
        )));
    }

    Ok(value)
}

/// Encodes an unsigned integer of the given width (at most 251 bits) as a single felt.
pub fn encode_unsigned(value: &BigInt, bits: u32) -> Result<Felt252, PrimitiveError> {
    if value.sign() == Sign::Minus || value.bits() > u64::from(bits) {
        return Err(PrimitiveError::range(format!("{value} is out of range for u{bits}")));
    }
    Felt252::from_bigint(value)
}

/// Reads an unsigned integer of the given width from a felt, rejecting wider values.
pub fn decode_unsigned(felt: &Felt252, bits: u32) -> Result<BigUint, PrimitiveError> {
    if felt.bits() > u64::from(bits) {
        return Err(PrimitiveError::range(format!(
            "{} does not fit in u{bits}",
            felt.to_hex_stripped()
        )));
    }
    Ok(felt.to_biguint())
}

macro_rules! signed_integer {
    ($name:ident, $native:ty, $bits:literal) => {
        #[doc = concat!("A Cairo `i", stringify!($bits), "`.")]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name($native);

        impl $name {
            pub const BITS: u32 = $bits;
            pub const MIN: Self = Self(<$native>::MIN);
            pub const MAX: Self = Self(<$native>::MAX);

            pub const fn new(value: $native) -> Self {
                Self(value)
            }

            pub const fn get(self) -> $native {
                self.0
            }

            /// Field encoding: negative values become `P + value`.
            pub fn to_felt(self) -> Felt252 {
                encode_signed(&self.to_bigint(), $bits).expect("qed; native value is in range")
            }

            /// Inverse of [`Self::to_felt`].
            pub fn from_felt(felt: &Felt252) -> Result<Self, PrimitiveError> {
                Self::try_from(&decode_signed(felt, $bits)?)
            }

            pub fn to_bigint(self) -> BigInt {
                BigInt::from(self.0)
            }

            /// Plain hex form of the logical value, e.g. `0x7f` or `-0x80`.
            pub fn to_hex(self) -> String {
                if self.0 < 0 {
                    format!("-{:#x}", self.0.unsigned_abs())
                } else {
                    format!("{:#x}", self.0)
                }
            }
        }

        impl From<$native> for $name {
            fn from(value: $native) -> Self {
                Self(value)
            }
        }

        impl From<$name> for $native {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<&BigInt> for $name {
            type Error = PrimitiveError;

            fn try_from(value: &BigInt) -> Result<Self, Self::Error> {
                <$native>::try_from(value).map(Self).map_err(|_| {
                    PrimitiveError::range(format!(
                        "{value} is out of range for i{} [{}, {}]",
                        $bits,
                        <$native>::MIN,
                        <$native>::MAX
                    ))
                })
            }
        }

        impl FromStr for $name {
            type Err = PrimitiveError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::try_from(&parse_integer(s)?)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

macro_rules! unsigned_integer {
    ($name:ident, $native:ty, $bits:literal) => {
        #[doc = concat!("A Cairo `u", stringify!($bits), "`.")]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name($native);

        impl $name {
            pub const BITS: u32 = $bits;
            pub const MIN: Self = Self(0);
            pub const MAX: Self = Self(<$native>::MAX);

            pub const fn new(value: $native) -> Self {
                Self(value)
            }

            pub const fn get(self) -> $native {
                self.0
            }

            pub fn to_felt(self) -> Felt252 {
                Felt252::from(self.0)
            }

            pub fn from_felt(felt: &Felt252) -> Result<Self, PrimitiveError> {
                let value = decode_unsigned(felt, $bits)?;
                Self::try_from(&BigInt::from(value))
            }

            pub fn to_bigint(self) -> BigInt {
                BigInt::from(self.0)
            }

            pub fn to_hex(self) -> String {
                format!("{:#x}", self.0)
            }
        }

        impl From<$native> for $name {
            fn from(value: $native) -> Self {
                Self(value)
            }
        }

        impl From<$name> for $native {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<&BigInt> for $name {
            type Error = PrimitiveError;

            fn try_from(value: &BigInt) -> Result<Self, Self::Error> {
                <$native>::try_from(value).map(Self).map_err(|_| {
                    PrimitiveError::range(format!(
                        "{value} is out of range for u{} [0, {}]",
                        $bits,
                        <$native>::MAX
                    ))
                })
            }
        }

        impl FromStr for $name {
            type Err = PrimitiveError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::try_from(&parse_integer(s)?)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

signed_integer!(Int8, i8, 8);
signed_integer!(Int16, i16, 16);
signed_integer!(Int32, i32, 32);
signed_integer!(Int64, i64, 64);
signed_integer!(Int128, i128, 128);

unsigned_integer!(Uint8, u8, 8);
unsigned_integer!(Uint16, u16, 16);
unsigned_integer!(Uint32, u32, 32);
unsigned_integer!(Uint64, u64, 64);
unsigned_integer!(Uint128, u128, 128);

/// A Cairo `u256`.
///
/// There is no single-felt encoding: on the wire a `u256` is always the two 128-bit limbs
/// `(low, high)`, see [`Uint256::split`] and [`crate::codec::serialize_u256`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Uint256(U256);

impl Uint256 {
    pub const BITS: u32 = 256;
    pub const MIN: Self = Self(U256::ZERO);
    pub const MAX: Self = Self(U256::MAX);

    pub const fn new(value: U256) -> Self {
        Self(value)
    }

    pub const fn get(self) -> U256 {
        self.0
    }

    /// Builds a value from its `(low, high)` limbs.
    pub fn from_limbs(low: u128, high: u128) -> Self {
        Self((U256::from(high) << 128usize) | U256::from(low))
    }

    /// Splits the value into its `(low, high)` limbs.
    pub fn split(self) -> (u128, u128) {
        let low: u128 = (self.0 & U256::from(u128::MAX)).to();
        let high: u128 = (self.0 >> 128usize).to();
        (low, high)
    }

    /// The calldata representation: `[low, high]`.
    pub fn to_felts(self) -> [Felt252; 2] {
        serialize_u256(self.0)
    }

    pub fn from_felts(felts: &[Felt252; 2]) -> Result<Self, PrimitiveError> {
        deserialize_u256(felts).map(Self)
    }

    pub fn to_biguint(self) -> BigUint {
        BigUint::from_bytes_be(&self.0.to_be_bytes::<32>())
    }

    pub fn to_bigint(self) -> BigInt {
        BigInt::from(self.to_biguint())
    }

    pub fn to_hex(self) -> String {
        format!("{:#x}", self.0)
    }
}

impl From<U256> for Uint256 {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl From<Uint256> for U256 {
    fn from(value: Uint256) -> Self {
        value.0
    }
}

impl From<u128> for Uint256 {
    fn from(value: u128) -> Self {
        Self(U256::from(value))
    }
}

impl TryFrom<&BigInt> for Uint256 {
    type Error = PrimitiveError;

    fn try_from(value: &BigInt) -> Result<Self, Self::Error> {
        if value.sign() == Sign::Minus || value.bits() > 256 {
            return Err(PrimitiveError::range(format!("{value} is out of range for u256")));
        }

        let (_, bytes) = value.to_bytes_be();
        Ok(Self(U256::from_be_slice(&bytes)))
    }
}

impl FromStr for Uint256 {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(&parse_integer(s)?)
    }
}

impl fmt::Display for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
