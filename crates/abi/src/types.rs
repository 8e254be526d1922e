//! Cairo type expressions.

use std::fmt;

use crate::error::{AbiError, AbiResult};

/// A builtin type with a fixed encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Felt252,
    Bool,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    U256,
    I8,
    I16,
    I32,
    I64,
    I128,
    ContractAddress,
    ClassHash,
    StorageAddress,
    EthAddress,
    Bytes31,
    ByteArray,
    ShortString,
}

impl Primitive {
    /// Resolves a type name. Paths are only accepted under `core::`, so a user type that happens
    /// to be called `u256` in another module is not mistaken for the builtin.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.contains('<') {
            return None;
        }

        let bare = match name.rsplit_once("::") {
            Some((path, bare)) if path == "core" || path.starts_with("core::") => bare,
            Some(_) => return None,
            None => name,
        };

        let primitive = match bare {
            "felt252" | "felt" => Self::Felt252,
            "bool" => Self::Bool,
            "u8" => Self::U8,
            "u16" => Self::U16,
            "u32" => Self::U32,
            "u64" => Self::U64,
            "u128" => Self::U128,
            "usize" => Self::Usize,
            "u256" | "Uint256" => Self::U256,
            "i8" => Self::I8,
            "i16" => Self::I16,
            "i32" => Self::I32,
            "i64" => Self::I64,
            "i128" => Self::I128,
            "ContractAddress" => Self::ContractAddress,
            "ClassHash" => Self::ClassHash,
            "StorageAddress" => Self::StorageAddress,
            "EthAddress" => Self::EthAddress,
            "bytes31" => Self::Bytes31,
            "ByteArray" => Self::ByteArray,
            "shortstring" => Self::ShortString,
            _ => return None,
        };
        Some(primitive)
    }

    /// Bit width for the fixed-width integer types.
    pub const fn int_bits(&self) -> Option<(u32, bool)> {
        match self {
            Self::U8 => Some((8, false)),
            Self::U16 => Some((16, false)),
            Self::U32 | Self::Usize => Some((32, false)),
            Self::U64 => Some((64, false)),
            Self::U128 => Some((128, false)),
            Self::I8 => Some((8, true)),
            Self::I16 => Some((16, true)),
            Self::I32 => Some((32, true)),
            Self::I64 => Some((64, true)),
            Self::I128 => Some((128, true)),
            _ => None,
        }
    }
}

/// A parsed Cairo type expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParsedType {
    Primitive(Primitive),
    Array(Box<ParsedType>),
    Span(Box<ParsedType>),
    /// Positional members. The unit type `()` is the empty tuple.
    Tuple(Vec<ParsedType>),
    /// A struct declared in the ABI, by full name.
    Struct(String),
    Option(Box<ParsedType>),
    /// An enum declared in the ABI, by full name.
    Enum(String),
}

impl ParsedType {
    pub const UNIT: Self = Self::Tuple(Vec::new());

    pub fn is_unit(&self) -> bool {
        matches!(self, Self::Tuple(members) if members.is_empty())
    }
}

impl fmt::Display for ParsedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => write!(f, "{p:?}"),
            Self::Array(inner) => write!(f, "Array<{inner}>"),
            Self::Span(inner) => write!(f, "Span<{inner}>"),
            Self::Option(inner) => write!(f, "Option<{inner}>"),
            Self::Struct(name) | Self::Enum(name) => f.write_str(name),
            Self::Tuple(members) => {
                f.write_str("(")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{member}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// The user-defined type names a type expression may refer to.
pub trait TypeNames {
    fn is_struct(&self, name: &str) -> bool;
    fn is_enum(&self, name: &str) -> bool;
}

/// Parses a type string such as `core::array::Array::<(core::felt252, my::Point)>`.
///
/// Resolution order: tuples, the generic wrappers (`Array`, `Span`, `Option`, `NonZero`),
/// builtin primitives, then structs and enums declared in the ABI. Snapshots (`@T`) parse as
/// `T`. Anything else is [`INVALID_ABI`](crate::ErrorCode::InvalidAbi).
pub fn parse_type(input: &str, names: &impl TypeNames) -> AbiResult<ParsedType> {
    let s = input.trim();
    let s = s.strip_prefix('@').map(str::trim).unwrap_or(s);

    if s.is_empty() {
        return Err(AbiError::invalid_abi("empty type name"));
    }

    if let Some(body) = s.strip_prefix('(') {
        let body = body
            .strip_suffix(')')
            .ok_or_else(|| AbiError::invalid_abi(format!("unbalanced tuple type `{input}`")))?;
        let members = split_top_level(body)?
            .into_iter()
            .map(|member| parse_type(member, names))
            .collect::<AbiResult<Vec<_>>>()?;
        return Ok(ParsedType::Tuple(members));
    }

    // Builtin wrappers need no declaration; any other generic instantiation must be declared.
    if let Some((base, arg)) = split_generic(s)? {
        match base.rsplit("::").next().unwrap_or(base) {
            "Array" => return Ok(ParsedType::Array(Box::new(parse_type(arg, names)?))),
            "Span" => return Ok(ParsedType::Span(Box::new(parse_type(arg, names)?))),
            "Option" => return Ok(ParsedType::Option(Box::new(parse_type(arg, names)?))),
            "NonZero" => return parse_type(arg, names),
            _ => {}
        }
    }

    if let Some(primitive) = Primitive::from_name(s) {
        return Ok(ParsedType::Primitive(primitive));
    }
    if names.is_struct(s) {
        return Ok(ParsedType::Struct(s.to_string()));
    }
    if names.is_enum(s) {
        return Ok(ParsedType::Enum(s.to_string()));
    }

    Err(AbiError::invalid_abi(format!("unknown type `{s}`")))
}

/// Splits `Base::<Arg>` into its parts. Returns `None` if the name is not generic.
fn split_generic(s: &str) -> AbiResult<Option<(&str, &str)>> {
    let Some(open) = s.find('<') else {
        return Ok(None);
    };
    let arg = s[open + 1..]
        .strip_suffix('>')
        .ok_or_else(|| AbiError::invalid_abi(format!("unbalanced generic type `{s}`")))?;
    let base = s[..open].trim_end_matches("::");
    Ok(Some((base, arg)))
}

/// Splits on commas that are not nested inside `()` or `<>`.
fn split_top_level(s: &str) -> AbiResult<Vec<&str>> {
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match c {
            '(' | '<' => depth += 1,
            ')' | '>' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
        if depth < 0 {
            return Err(AbiError::invalid_abi(format!("unbalanced type list `{s}`")));
        }
    }

    if depth != 0 {
        return Err(AbiError::invalid_abi(format!("unbalanced type list `{s}`")));
    }

    let last = s[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    Ok(parts)
}
