use cairo_abi_primitives::{ContractAddress, Felt252};
use indexmap::IndexMap;
use num_bigint::BigInt;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// A dynamically typed Cairo value: the input of encoding and the output of decoding.
///
/// Integers of every width, felts and addresses are all [`CairoValue::Int`]. `Option::None`
/// decodes to [`CairoValue::Null`]; any other value stands for `Some`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CairoValue {
    Int(BigInt),
    Bool(bool),
    /// A `ByteArray` or short string. Also accepted wherever an integer literal is expected.
    String(String),
    /// Arrays, spans and tuples.
    Array(Vec<CairoValue>),
    /// Struct members by name, in declaration order when decoded.
    Struct(IndexMap<String, CairoValue>),
    Enum { variant: String, value: Box<CairoValue> },
    Null,
}

impl CairoValue {
    pub fn variant(variant: impl Into<String>, value: impl Into<CairoValue>) -> Self {
        Self::Enum { variant: variant.into(), value: Box::new(value.into()) }
    }

    /// A unit enum variant.
    pub fn unit_variant(variant: impl Into<String>) -> Self {
        Self::Enum { variant: variant.into(), value: Box::new(Self::Null) }
    }

    pub fn structure<K, V, I>(members: I) -> Self
    where
        K: Into<String>,
        V: Into<CairoValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Struct(members.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            Self::Int(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[CairoValue]> {
        match self {
            Self::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn get(&self, member: &str) -> Option<&CairoValue> {
        match self {
            Self::Struct(members) => members.get(member),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short description of the value's shape, for error messages.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer",
            Self::Bool(_) => "bool",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Struct(_) => "struct",
            Self::Enum { .. } => "enum",
            Self::Null => "null",
        }
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for CairoValue {
                fn from(value: $ty) -> Self {
                    Self::Int(BigInt::from(value))
                }
            }
        )*
    };
}

impl_from_int!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128);

impl From<BigInt> for CairoValue {
    fn from(value: BigInt) -> Self {
        Self::Int(value)
    }
}

impl From<Felt252> for CairoValue {
    fn from(value: Felt252) -> Self {
        Self::Int(value.to_bigint())
    }
}

impl From<ContractAddress> for CairoValue {
    fn from(value: ContractAddress) -> Self {
        Self::Int(value.felt().to_bigint())
    }
}

impl From<bool> for CairoValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for CairoValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for CairoValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T: Into<CairoValue>> From<Vec<T>> for CairoValue {
    fn from(values: Vec<T>) -> Self {
        Self::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<CairoValue>> From<Option<T>> for CairoValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// JSON form: integers as decimal strings so no precision is lost.
impl Serialize for CairoValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Int(value) => serializer.serialize_str(&value.to_string()),
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::String(value) => serializer.serialize_str(value),
            Self::Null => serializer.serialize_none(),
            Self::Array(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
            Self::Struct(members) => {
                let mut map = serializer.serialize_map(Some(members.len()))?;
                for (name, value) in members {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
            Self::Enum { variant, value } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("variant", variant)?;
                map.serialize_entry("value", value)?;
                map.end()
            }
        }
    }
}
