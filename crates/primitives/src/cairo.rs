use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

use crate::error::PrimitiveError;
use crate::felt::{Felt252, FELT_BYTES};

/// The maximum number of characters a short string can hold.
pub const SHORT_STRING_MAX_LEN: usize = 31;

/// A Cairo short string.
///
/// This is a stack-allocated string type that can hold up to 31 ASCII bytes,
/// which is the maximum number of bytes that fit in a single felt.
///
/// It supports const construction via [`ShortString::from_ascii`]. Converting from a felt is
/// strict (see [`TryFrom<Felt252>`](#impl-TryFrom<Felt252>-for-ShortString)); the lenient
/// decoding used for calldata lives in [`decode_short_string`].
#[derive(Clone, PartialEq, Eq, Hash, Default, Copy)]
pub struct ShortString {
    data: [u8; SHORT_STRING_MAX_LEN],
    len: u8,
}

impl ShortString {
    pub const fn new() -> Self {
        Self { data: [0; SHORT_STRING_MAX_LEN], len: 0 }
    }

    /// Creates a new short string from an ASCII string literal at compile time.
    ///
    /// # Panics
    ///
    /// Panics at compile time if the string is longer than 31 bytes or contains
    /// non-ASCII characters.
    ///
    /// ```
    /// use cairo_abi_primitives::cairo::ShortString;
    ///
    /// const NAME: ShortString = ShortString::from_ascii("ERC20");
    /// assert_eq!(NAME.as_str(), "ERC20");
    /// ```
    pub const fn from_ascii(s: &str) -> Self {
        let bytes = s.as_bytes();
        let len = bytes.len();

        assert!(len <= SHORT_STRING_MAX_LEN, "string is too long to be a Cairo short string");

        let mut data = [0u8; SHORT_STRING_MAX_LEN];
        let mut i = 0;
        while i < len {
            let b = bytes[i];
            assert!(b.is_ascii(), "invalid ASCII character in string");
            data[i] = b;
            i += 1;
        }

        Self { data, len: len as u8 }
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(self.as_bytes()).expect("qed; only ASCII bytes are stored")
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    pub const fn len(&self) -> usize {
        self.len as usize
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Packs the string into a felt, one byte per character, big-endian.
    pub fn to_felt(&self) -> Felt252 {
        Felt252::from_bytes_be_slice(self.as_bytes()).expect("qed; at most 31 bytes")
    }

    fn push(&mut self, byte: u8) -> Result<(), ShortStringError> {
        if !byte.is_ascii() {
            return Err(ShortStringError::InvalidAscii);
        }
        if self.len() >= SHORT_STRING_MAX_LEN {
            return Err(ShortStringError::ExceedsCapacity);
        }

        self.data[self.len as usize] = byte;
        self.len += 1;
        Ok(())
    }
}

/// Error returned when constructing a [`ShortString`] fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ShortStringError {
    #[error("string is longer than 31 characters")]
    ExceedsCapacity,

    #[error("invalid ASCII character")]
    InvalidAscii,

    #[error("unexpected null terminator")]
    UnexpectedNullTerminator,
}

impl From<ShortStringError> for PrimitiveError {
    fn from(error: ShortStringError) -> Self {
        match error {
            ShortStringError::ExceedsCapacity => Self::Range(error.to_string()),
            ShortStringError::InvalidAscii | ShortStringError::UnexpectedNullTerminator => {
                Self::Parse(error.to_string())
            }
        }
    }
}

impl core::ops::Deref for ShortString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl AsRef<str> for ShortString {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<Felt252> for ShortString {
    fn eq(&self, other: &Felt252) -> bool {
        self.to_felt() == *other
    }
}

impl core::fmt::Debug for ShortString {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("ShortString").field(&self.as_str()).finish()
    }
}

impl core::fmt::Display for ShortString {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for ShortString {
    type Err = ShortStringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.is_ascii() {
            return Err(ShortStringError::InvalidAscii);
        }
        if s.len() > SHORT_STRING_MAX_LEN {
            return Err(ShortStringError::ExceedsCapacity);
        }

        let mut string = Self::new();
        for byte in s.bytes() {
            string.push(byte).expect("qed; length and charset already checked");
        }
        Ok(string)
    }
}

impl From<ShortString> for String {
    fn from(string: ShortString) -> Self {
        string.as_str().to_string()
    }
}

impl From<ShortString> for Felt252 {
    fn from(string: ShortString) -> Self {
        string.to_felt()
    }
}

impl From<&ShortString> for Felt252 {
    fn from(string: &ShortString) -> Self {
        string.to_felt()
    }
}

impl TryFrom<Felt252> for ShortString {
    type Error = ShortStringError;

    /// Strict conversion: a zero byte after the first character is rejected instead of
    /// skipped.
    fn try_from(value: Felt252) -> Result<Self, Self::Error> {
        let bytes = value.to_bytes_be();

        // Only the low 31 bytes can carry characters.
        if bytes[0] > 0 {
            return Err(ShortStringError::ExceedsCapacity);
        }

        let mut string = ShortString::new();
        for byte in bytes {
            if byte == 0 {
                if !string.is_empty() {
                    return Err(ShortStringError::UnexpectedNullTerminator);
                }
            } else {
                string.push(byte)?;
            }
        }

        Ok(string)
    }
}

impl TryFrom<&Felt252> for ShortString {
    type Error = ShortStringError;

    fn try_from(value: &Felt252) -> Result<Self, Self::Error> {
        Self::try_from(*value)
    }
}

impl serde::Serialize for ShortString {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for ShortString {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ShortStringVisitor;

        impl serde::de::Visitor<'_> for ShortStringVisitor {
            type Value = ShortString;

            fn expecting(&self, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                formatter.write_str("a string up to 31 ASCII characters")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_str(ShortStringVisitor)
    }
}

/// Packs an ASCII string of at most 31 characters into a felt. The empty string packs to zero.
pub fn encode_short_string(s: &str) -> Result<Felt252, ShortStringError> {
    s.parse::<ShortString>().map(|string| string.to_felt())
}

/// Unpacks a felt into a string, low byte last.
///
/// Zero bytes are skipped wherever they appear, so a string with an embedded NUL does not
/// round-trip through [`encode_short_string`]. Bytes above `0x7f` map to the matching
/// Latin-1 code point rather than failing.
pub fn decode_short_string(felt: &Felt252) -> String {
    decode_short_string_bytes(&felt.to_bytes_be())
}

/// [`decode_short_string`] over an arbitrary non-negative integer.
pub fn decode_short_string_biguint(value: &BigUint) -> String {
    let mut remaining = value.clone();
    let mut chars = Vec::new();
    let mask = BigUint::from(0xffu8);

    while !remaining.is_zero() {
        let byte = (&remaining & &mask).to_u8().expect("qed; masked to a single byte");
        if byte != 0 {
            chars.push(char::from(byte));
        }
        remaining >>= 8u32;
    }

    chars.iter().rev().collect()
}

/// [`decode_short_string`] over a hex literal.
pub fn decode_short_string_hex(s: &str) -> Result<String, PrimitiveError> {
    Felt252::from_hex(s).map(|felt| decode_short_string(&felt))
}

fn decode_short_string_bytes(bytes: &[u8; FELT_BYTES]) -> String {
    bytes.iter().filter(|b| **b != 0).map(|b| char::from(*b)).collect()
}
