//! Type-directed encoding of [`CairoValue`]s into felts and back.
//!
//! Decoding is the exact structural inverse of encoding: for a given [`ParsedType`], decoding the
//! output of [`encode_value`] consumes exactly the felts that were produced.

use cairo_abi_primitives::cairo::{decode_short_string, encode_short_string};
use cairo_abi_primitives::codec::{deserialize_byte_array, serialize_byte_array};
use cairo_abi_primitives::int::{
    decode_signed, decode_unsigned, encode_signed, encode_unsigned, parse_integer, Uint256,
};
use cairo_abi_primitives::{ClassHash, ContractAddress, EthAddress, Felt252, StorageKey};
use indexmap::IndexMap;
use num_bigint::BigInt;
use num_traits::{One, Zero};
use tracing::trace;

use crate::error::{AbiError, AbiResult, PrimitiveResultExt};
use crate::parser::{FunctionDef, Member, ParsedAbi};
use crate::types::{ParsedType, Primitive};
use crate::value::CairoValue;

/// Bit width of a `bytes31` value.
const BYTES31_BITS: u32 = 248;

/// Function arguments, either in declaration order or by parameter name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Args {
    Positional(Vec<CairoValue>),
    Named(IndexMap<String, CairoValue>),
}

impl From<Vec<CairoValue>> for Args {
    fn from(args: Vec<CairoValue>) -> Self {
        Self::Positional(args)
    }
}

impl From<IndexMap<String, CairoValue>> for Args {
    fn from(args: IndexMap<String, CairoValue>) -> Self {
        Self::Named(args)
    }
}

impl<K: Into<String>, V: Into<CairoValue>, const N: usize> From<[(K, V); N]> for Args {
    fn from(args: [(K, V); N]) -> Self {
        Self::Named(args.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A forward-only cursor over a felt sequence.
#[derive(Debug, Clone)]
pub struct DecodeContext<'a> {
    felts: &'a [Felt252],
    offset: usize,
}

impl<'a> DecodeContext<'a> {
    pub fn new(felts: &'a [Felt252]) -> Self {
        Self { felts, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.felts.len() - self.offset
    }

    pub fn is_finished(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_felt(&mut self) -> AbiResult<Felt252> {
        Ok(self.take(1)?[0])
    }

    pub fn take(&mut self, count: usize) -> AbiResult<&'a [Felt252]> {
        if count > self.remaining() {
            return Err(AbiError::decode(format!(
                "unexpected end of data: needed {count} felt(s) at offset {}, only {} available",
                self.offset,
                self.remaining()
            )));
        }
        let slice = &self.felts[self.offset..self.offset + count];
        self.offset += count;
        Ok(slice)
    }

    /// The unread felts, without advancing.
    pub(crate) fn rest(&self) -> &'a [Felt252] {
        &self.felts[self.offset..]
    }

    fn advance(&mut self, count: usize) {
        self.offset += count;
    }

    /// Reads an array length. Cairo lengths are `u32`.
    fn next_len(&mut self) -> AbiResult<usize> {
        let felt = self.read_felt()?;
        felt.to_u64()
            .and_then(|len| u32::try_from(len).ok())
            .map(|len| len as usize)
            .ok_or_else(|| {
                AbiError::decode(format!(
                    "length {} at offset {} is not a u32",
                    felt.to_hex_stripped(),
                    self.offset - 1
                ))
            })
    }
}

/// Encodes a single value of the given type.
pub fn encode_value(value: &CairoValue, ty: &ParsedType, abi: &ParsedAbi) -> AbiResult<Vec<Felt252>> {
    let mut out = Vec::new();
    encode_into(&mut out, value, ty, abi)?;
    Ok(out)
}

/// Decodes a single value of the given type at the cursor.
pub fn decode_value(
    ctx: &mut DecodeContext<'_>,
    ty: &ParsedType,
    abi: &ParsedAbi,
) -> AbiResult<CairoValue> {
    match ty {
        ParsedType::Primitive(primitive) => decode_primitive(ctx, *primitive),

        ParsedType::Array(inner) | ParsedType::Span(inner) => {
            let len = ctx.next_len()?;
            // Every element takes at least one felt unless the element type is empty.
            if len > ctx.remaining() && fixed_width(inner, abi) != Some(0) {
                return Err(AbiError::decode(format!(
                    "length {len} at offset {} exceeds the {} remaining felt(s)",
                    ctx.offset() - 1,
                    ctx.remaining()
                )));
            }
            let mut items = Vec::with_capacity(len.min(ctx.remaining()));
            for index in 0..len {
                items.push(decode_value(ctx, inner, abi).map_err(|e| e.at(&format!("[{index}]")))?);
            }
            Ok(CairoValue::Array(items))
        }

        ParsedType::Tuple(members) => {
            let mut items = Vec::with_capacity(members.len());
            for (index, member) in members.iter().enumerate() {
                items.push(decode_value(ctx, member, abi).map_err(|e| e.at(&format!(".{index}")))?);
            }
            Ok(CairoValue::Array(items))
        }

        ParsedType::Struct(name) => {
            let def = abi
                .struct_def(name)
                .ok_or_else(|| AbiError::invalid_abi(format!("struct `{name}` is not declared")))?;
            let mut members = IndexMap::with_capacity(def.members.len());
            for member in &def.members {
                let value = decode_value(ctx, &member.ty, abi).map_err(|e| e.at(&member.name))?;
                members.insert(member.name.clone(), value);
            }
            Ok(CairoValue::Struct(members))
        }

        ParsedType::Option(inner) => {
            let tag = ctx.read_felt()?;
            if tag.is_zero() {
                // `Some(None)` needs the explicit variant so it stays distinct from `None`.
                match decode_value(ctx, inner, abi)? {
                    CairoValue::Null => Ok(CairoValue::variant("Some", CairoValue::Null)),
                    value => Ok(value),
                }
            } else if tag == Felt252::ONE {
                Ok(CairoValue::Null)
            } else {
                Err(AbiError::decode(format!("invalid Option tag {}", tag.to_hex_stripped())))
            }
        }

        ParsedType::Enum(name) => {
            let def = abi
                .enum_def(name)
                .ok_or_else(|| AbiError::invalid_abi(format!("enum `{name}` is not declared")))?;
            let tag = ctx.read_felt()?;
            let variant = tag
                .to_u64()
                .and_then(|index| def.variants.get(usize::try_from(index).ok()?))
                .ok_or_else(|| {
                    AbiError::decode(format!(
                        "variant index {} is out of range for enum `{name}` with {} variant(s)",
                        tag.to_hex_stripped(),
                        def.variants.len()
                    ))
                })?;

            let value = if variant.ty.is_unit() {
                CairoValue::Null
            } else {
                decode_value(ctx, &variant.ty, abi).map_err(|e| e.at(&variant.name))?
            };
            Ok(CairoValue::variant(variant.name.clone(), value))
        }
    }
}

/// Encodes the arguments of a function, constructor or l1 handler.
pub fn encode_calldata(abi: &ParsedAbi, function: &str, args: &Args) -> AbiResult<Vec<Felt252>> {
    let def = resolve_function(abi, function)?;
    let values = bind_args(def, args)?;

    let mut out = Vec::new();
    for (input, value) in def.inputs.iter().zip(values) {
        encode_into(&mut out, value, &input.ty, abi).map_err(|e| e.at(&param_path(def, input)))?;
    }

    trace!(target: "abi", function, felts = out.len(), "Encoded calldata.");
    Ok(out)
}

/// Decodes calldata back into the function's arguments, in declaration order.
pub fn decode_calldata(abi: &ParsedAbi, function: &str, felts: &[Felt252]) -> AbiResult<Vec<CairoValue>> {
    let def = resolve_function(abi, function)?;
    let mut ctx = DecodeContext::new(felts);

    let mut values = Vec::with_capacity(def.inputs.len());
    for input in &def.inputs {
        values.push(decode_value(&mut ctx, &input.ty, abi).map_err(|e| e.at(&param_path(def, input)))?);
    }

    ensure_consumed(&ctx, function)?;
    trace!(target: "abi", function, felts = felts.len(), "Decoded calldata.");
    Ok(values)
}

/// Decodes the return data of a function call.
pub fn decode_output(abi: &ParsedAbi, function: &str, felts: &[Felt252]) -> AbiResult<Vec<CairoValue>> {
    let def = resolve_function(abi, function)?;
    let mut ctx = DecodeContext::new(felts);

    let mut values = Vec::with_capacity(def.outputs.len());
    for (index, output) in def.outputs.iter().enumerate() {
        let value = decode_value(&mut ctx, output, abi)
            .map_err(|e| e.at(&format!("{}.output[{index}]", def.name)))?;
        values.push(value);
    }

    ensure_consumed(&ctx, function)?;
    trace!(target: "abi", function, felts = felts.len(), "Decoded output.");
    Ok(values)
}

fn resolve_function<'a>(abi: &'a ParsedAbi, name: &str) -> AbiResult<&'a FunctionDef> {
    abi.function(name).ok_or_else(|| AbiError::function_not_found(name))
}

fn param_path(def: &FunctionDef, input: &Member) -> String {
    format!("{}.{}", def.name, input.name)
}

fn ensure_consumed(ctx: &DecodeContext<'_>, function: &str) -> AbiResult<()> {
    if ctx.is_finished() {
        return Ok(());
    }
    Err(AbiError::decode(format!(
        "{function}: {} trailing felt(s) after offset {}",
        ctx.remaining(),
        ctx.offset()
    )))
}

/// Orders the arguments by the function's declared inputs.
fn bind_args<'a>(def: &FunctionDef, args: &'a Args) -> AbiResult<Vec<&'a CairoValue>> {
    match args {
        Args::Positional(values) => {
            if values.len() != def.inputs.len() {
                return Err(AbiError::invalid_args(format!(
                    "{} expects {} argument(s), got {}",
                    def.name,
                    def.inputs.len(),
                    values.len()
                )));
            }
            Ok(values.iter().collect())
        }

        Args::Named(values) => {
            if let Some(unknown) = values.keys().find(|k| !def.inputs.iter().any(|i| &i.name == *k)) {
                return Err(AbiError::invalid_args(format!(
                    "{} has no parameter named `{unknown}`",
                    def.name
                )));
            }
            def.inputs
                .iter()
                .map(|input| {
                    values.get(&input.name).ok_or_else(|| {
                        AbiError::invalid_args(format!(
                            "{} is missing argument `{}`",
                            def.name, input.name
                        ))
                    })
                })
                .collect()
        }
    }
}

fn encode_into(
    out: &mut Vec<Felt252>,
    value: &CairoValue,
    ty: &ParsedType,
    abi: &ParsedAbi,
) -> AbiResult<()> {
    match ty {
        ParsedType::Primitive(primitive) => encode_primitive(out, value, *primitive),

        ParsedType::Array(inner) | ParsedType::Span(inner) => {
            let items = expect_array(value, ty)?;
            out.push(Felt252::from(items.len()));
            for (index, item) in items.iter().enumerate() {
                encode_into(out, item, inner, abi).map_err(|e| e.at(&format!("[{index}]")))?;
            }
            Ok(())
        }

        ParsedType::Tuple(members) if members.is_empty() => match value {
            CairoValue::Null => Ok(()),
            CairoValue::Array(items) if items.is_empty() => Ok(()),
            other => Err(mismatch(other, ty)),
        },

        ParsedType::Tuple(members) => {
            let items = expect_array(value, ty)?;
            if items.len() != members.len() {
                return Err(AbiError::encode(format!(
                    "expected a tuple of {} element(s), got {}",
                    members.len(),
                    items.len()
                )));
            }
            for (index, (item, member)) in items.iter().zip(members).enumerate() {
                encode_into(out, item, member, abi).map_err(|e| e.at(&format!(".{index}")))?;
            }
            Ok(())
        }

        ParsedType::Struct(name) => {
            let def = abi
                .struct_def(name)
                .ok_or_else(|| AbiError::invalid_abi(format!("struct `{name}` is not declared")))?;
            let CairoValue::Struct(members) = value else {
                return Err(mismatch(value, ty));
            };

            if let Some(unknown) = members.keys().find(|k| !def.members.iter().any(|m| &m.name == *k)) {
                return Err(AbiError::encode(format!("struct `{name}` has no member `{unknown}`")));
            }
            for member in &def.members {
                let value = members.get(&member.name).ok_or_else(|| {
                    AbiError::encode(format!("missing member `{}` of struct `{name}`", member.name))
                })?;
                encode_into(out, value, &member.ty, abi).map_err(|e| e.at(&member.name))?;
            }
            Ok(())
        }

        // Cairo declares `Option` as `enum { Some, None }`, so `Some` is variant 0.
        // The explicit `Some`/`None` variants are accepted too, for nested options.
        ParsedType::Option(inner) => match value {
            CairoValue::Null => {
                out.push(Felt252::ONE);
                Ok(())
            }
            CairoValue::Enum { variant, .. } if variant == "None" => {
                out.push(Felt252::ONE);
                Ok(())
            }
            CairoValue::Enum { variant, value } if variant == "Some" => {
                out.push(Felt252::ZERO);
                encode_into(out, value, inner, abi)
            }
            some => {
                out.push(Felt252::ZERO);
                encode_into(out, some, inner, abi)
            }
        },

        ParsedType::Enum(name) => {
            let def = abi
                .enum_def(name)
                .ok_or_else(|| AbiError::invalid_abi(format!("enum `{name}` is not declared")))?;

            // A bare variant name selects a unit variant.
            let (variant_name, payload) = match value {
                CairoValue::Enum { variant, value } => (variant.as_str(), value.as_ref()),
                CairoValue::String(variant) => (variant.as_str(), &CairoValue::Null),
                other => return Err(mismatch(other, ty)),
            };

            let (index, variant) = def.variant(variant_name).ok_or_else(|| {
                AbiError::encode(format!("enum `{name}` has no variant `{variant_name}`"))
            })?;

            out.push(Felt252::from(index));
            if variant.ty.is_unit() {
                return match payload {
                    CairoValue::Null => Ok(()),
                    CairoValue::Array(items) if items.is_empty() => Ok(()),
                    other => Err(AbiError::encode(format!(
                        "unit variant `{variant_name}` takes no value, got {}",
                        other.kind()
                    ))),
                };
            }
            encode_into(out, payload, &variant.ty, abi).map_err(|e| e.at(variant_name))
        }
    }
}

fn encode_primitive(out: &mut Vec<Felt252>, value: &CairoValue, primitive: Primitive) -> AbiResult<()> {
    if let Some((bits, signed)) = primitive.int_bits() {
        let int = expect_int(value)?;
        let felt = if signed { encode_signed(&int, bits) } else { encode_unsigned(&int, bits) };
        out.push(felt.or_encode()?);
        return Ok(());
    }

    match primitive {
        Primitive::Felt252 => out.push(encode_felt(value)?),

        Primitive::Bool => out.push(match value {
            CairoValue::Bool(b) => Felt252::from(*b),
            CairoValue::Int(i) if i.is_zero() => Felt252::ZERO,
            CairoValue::Int(i) if i.is_one() => Felt252::ONE,
            other => return Err(AbiError::encode(format!("expected a bool, got {}", describe(other)))),
        }),

        Primitive::U256 => match value {
            CairoValue::Struct(limbs) => {
                let limb = |name: &str| -> AbiResult<Felt252> {
                    let value = limbs
                        .get(name)
                        .ok_or_else(|| AbiError::encode(format!("u256 is missing its `{name}` limb")))?;
                    encode_unsigned(&expect_int(value)?, 128).or_encode().map_err(|e| e.at(name))
                };
                out.extend([limb("low")?, limb("high")?]);
            }
            other => {
                let int = expect_int(other)?;
                let value = Uint256::try_from(&int).or_encode()?;
                out.extend(value.to_felts());
            }
        },

        Primitive::ContractAddress => {
            out.push(ContractAddress::new(encode_felt(value)?).or_encode()?.felt());
        }
        Primitive::ClassHash => out.push(ClassHash::new(encode_felt(value)?).or_encode()?.felt()),
        Primitive::StorageAddress => {
            out.push(StorageKey::new(encode_felt(value)?).or_encode()?.felt());
        }
        Primitive::EthAddress => out.push(EthAddress::new(encode_felt(value)?).or_encode()?.felt()),

        Primitive::Bytes31 => {
            let felt = match value {
                CairoValue::String(s) if !looks_numeric(s) => encode_short_string(s).or_encode()?,
                other => encode_unsigned(&expect_int(other)?, BYTES31_BITS).or_encode()?,
            };
            out.push(felt);
        }

        Primitive::ByteArray => match value {
            CairoValue::String(s) => out.extend(serialize_byte_array(s.as_bytes())),
            other => {
                return Err(AbiError::encode(format!("expected a string, got {}", describe(other))))
            }
        },

        Primitive::ShortString => {
            let felt = match value {
                CairoValue::String(s) => encode_short_string(s).or_encode()?,
                other => encode_felt(other)?,
            };
            out.push(felt);
        }

        _ => unreachable!("integer types are handled above"),
    }
    Ok(())
}

fn decode_primitive(ctx: &mut DecodeContext<'_>, primitive: Primitive) -> AbiResult<CairoValue> {
    if let Some((bits, signed)) = primitive.int_bits() {
        let felt = ctx.read_felt()?;
        let value = if signed {
            decode_signed(&felt, bits).or_decode()?
        } else {
            BigInt::from(decode_unsigned(&felt, bits).or_decode()?)
        };
        return Ok(CairoValue::Int(value));
    }

    let value = match primitive {
        Primitive::Felt252 => CairoValue::from(ctx.read_felt()?),

        Primitive::Bool => {
            let felt = ctx.read_felt()?;
            if felt.is_zero() {
                CairoValue::Bool(false)
            } else if felt == Felt252::ONE {
                CairoValue::Bool(true)
            } else {
                return Err(AbiError::decode(format!("{} is not a bool", felt.to_hex_stripped())));
            }
        }

        Primitive::U256 => {
            let limbs = ctx.take(2)?;
            let value = Uint256::from_felts(&[limbs[0], limbs[1]]).or_decode()?;
            CairoValue::Int(value.to_bigint())
        }

        Primitive::ContractAddress => CairoValue::from(ContractAddress::new(ctx.read_felt()?).or_decode()?),
        Primitive::ClassHash => CairoValue::from(ClassHash::new(ctx.read_felt()?).or_decode()?.felt()),
        Primitive::StorageAddress => CairoValue::from(StorageKey::new(ctx.read_felt()?).or_decode()?.felt()),
        Primitive::EthAddress => CairoValue::from(EthAddress::new(ctx.read_felt()?).or_decode()?.felt()),

        Primitive::Bytes31 => {
            CairoValue::Int(BigInt::from(decode_unsigned(&ctx.read_felt()?, BYTES31_BITS).or_decode()?))
        }

        Primitive::ByteArray => {
            let decoded = deserialize_byte_array(ctx.rest(), 0).or_decode()?;
            ctx.advance(decoded.next_offset);
            CairoValue::String(String::from_utf8_lossy(&decoded.value).into_owned())
        }

        Primitive::ShortString => CairoValue::String(decode_short_string(&ctx.read_felt()?)),

        _ => unreachable!("integer types are handled above"),
    };
    Ok(value)
}

/// A felt from an integer, a numeric string, or any other string as a short string.
fn encode_felt(value: &CairoValue) -> AbiResult<Felt252> {
    match value {
        CairoValue::String(s) if !looks_numeric(s) => encode_short_string(s).or_encode(),
        other => Felt252::from_bigint(&expect_int(other)?).or_encode(),
    }
}

fn expect_int(value: &CairoValue) -> AbiResult<BigInt> {
    match value {
        CairoValue::Int(i) => Ok(i.clone()),
        CairoValue::String(s) => parse_integer(s).or_encode(),
        other => Err(AbiError::encode(format!("expected an integer, got {}", describe(other)))),
    }
}

fn expect_array<'a>(value: &'a CairoValue, ty: &ParsedType) -> AbiResult<&'a [CairoValue]> {
    value.as_array().ok_or_else(|| mismatch(value, ty))
}

fn looks_numeric(s: &str) -> bool {
    let s = s.trim();
    let s = s.strip_prefix('-').unwrap_or(s);
    s.starts_with("0x") || s.starts_with("0X") || (!s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
}

fn mismatch(value: &CairoValue, ty: &ParsedType) -> AbiError {
    AbiError::encode(format!("cannot encode {} as `{ty}`", describe(value)))
}

fn describe(value: &CairoValue) -> String {
    match value {
        CairoValue::Int(i) => format!("integer {i}"),
        CairoValue::String(s) => format!("string {s:?}"),
        other => other.kind().to_string(),
    }
}

/// The number of felts a value of this type occupies, if it is the same for every value.
pub(crate) fn fixed_width(ty: &ParsedType, abi: &ParsedAbi) -> Option<usize> {
    match ty {
        ParsedType::Primitive(Primitive::U256) => Some(2),
        ParsedType::Primitive(Primitive::ByteArray) => None,
        ParsedType::Primitive(_) => Some(1),
        ParsedType::Array(_) | ParsedType::Span(_) | ParsedType::Option(_) => None,
        ParsedType::Tuple(members) => members.iter().map(|m| fixed_width(m, abi)).sum(),
        ParsedType::Struct(name) => {
            abi.struct_def(name)?.members.iter().map(|m| fixed_width(&m.ty, abi)).sum()
        }
        ParsedType::Enum(name) => {
            let def = abi.enum_def(name)?;
            let mut widths = def.variants.iter().map(|v| fixed_width(&v.ty, abi));
            let first = widths.next()??;
            widths.all(|w| w == Some(first)).then_some(1 + first)
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use cairo_abi_primitives::felt;
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::error::ErrorCode;
    use crate::parser::parse_abi;

    fn abi() -> ParsedAbi {
        parse_abi(&json!([
            {
                "type": "struct",
                "name": "demo::Point",
                "members": [
                    { "name": "x", "type": "core::integer::i32" },
                    { "name": "y", "type": "core::integer::i32" }
                ]
            },
            {
                "type": "enum",
                "name": "demo::Shape",
                "variants": [
                    { "name": "Empty", "type": "()" },
                    { "name": "Dot", "type": "demo::Point" },
                    { "name": "Label", "type": "core::byte_array::ByteArray" }
                ]
            },
            {
                "type": "function",
                "name": "draw",
                "inputs": [
                    { "name": "shape", "type": "demo::Shape" },
                    { "name": "tags", "type": "core::array::Span::<core::felt252>" },
                    { "name": "scale", "type": "core::option::Option::<core::integer::u8>" }
                ],
                "outputs": [{ "type": "(core::bool, core::integer::u256)" }],
                "state_mutability": "external"
            }
        ]))
        .unwrap()
    }

    fn ty(abi: &ParsedAbi, name: &str) -> ParsedType {
        crate::types::parse_type(name, abi).unwrap()
    }

    fn roundtrip(abi: &ParsedAbi, value: &CairoValue, ty: &ParsedType) -> CairoValue {
        let felts = encode_value(value, ty, abi).unwrap();
        let mut ctx = DecodeContext::new(&felts);
        let decoded = decode_value(&mut ctx, ty, abi).unwrap();
        assert!(ctx.is_finished(), "decode left {} felt(s)", ctx.remaining());
        decoded
    }

    #[test]
    fn signed_integers_use_field_encoding() {
        let abi = abi();
        let felts = encode_value(&CairoValue::from(-1i32), &ty(&abi, "core::integer::i32"), &abi).unwrap();
        assert_eq!(felts, vec![Felt252::MAX]);
    }

    #[test]
    fn struct_members_follow_declaration_order() {
        let abi = abi();
        let point = CairoValue::structure([("y", 2i32), ("x", -3i32)]);
        let felts = encode_value(&point, &ty(&abi, "demo::Point"), &abi).unwrap();
        assert_eq!(felts[1], Felt252::from(2u8));

        similar_asserts::assert_eq!(
            roundtrip(&abi, &point, &ty(&abi, "demo::Point")),
            CairoValue::structure([("x", -3i32), ("y", 2i32)])
        );
    }

    #[test]
    fn missing_and_unknown_struct_members() {
        let abi = abi();
        let point_ty = ty(&abi, "demo::Point");

        let err = encode_value(&CairoValue::structure([("x", 1i32)]), &point_ty, &abi).unwrap_err();
        assert_eq!(err.code, ErrorCode::EncodeError);
        assert!(err.message.contains("missing member `y`"), "{}", err.message);

        let extra = CairoValue::structure([("x", 1i32), ("y", 1i32), ("z", 1i32)]);
        assert_eq!(encode_value(&extra, &point_ty, &abi).unwrap_err().code, ErrorCode::EncodeError);
    }

    #[test]
    fn enum_variants() {
        let abi = abi();
        let shape = ty(&abi, "demo::Shape");

        assert_eq!(encode_value(&CairoValue::unit_variant("Empty"), &shape, &abi).unwrap(), vec![Felt252::ZERO]);
        assert_eq!(encode_value(&CairoValue::from("Empty"), &shape, &abi).unwrap(), vec![Felt252::ZERO]);

        let dot = CairoValue::variant("Dot", CairoValue::structure([("x", 1i32), ("y", 2i32)]));
        assert_eq!(
            encode_value(&dot, &shape, &abi).unwrap(),
            vec![Felt252::ONE, Felt252::from(1u8), Felt252::from(2u8)]
        );
        assert_eq!(roundtrip(&abi, &dot, &shape), dot);
        assert_eq!(roundtrip(&abi, &CairoValue::unit_variant("Empty"), &shape), CairoValue::unit_variant("Empty"));

        let err = encode_value(&CairoValue::unit_variant("Circle"), &shape, &abi).unwrap_err();
        assert_eq!(err.code, ErrorCode::EncodeError);

        let felts = [felt!("0x3")];
        let mut ctx = DecodeContext::new(&felts);
        assert_eq!(decode_value(&mut ctx, &shape, &abi).unwrap_err().code, ErrorCode::DecodeError);
    }

    /// `Option` is `enum { Some, None }` in Cairo: `Some` carries tag 0, `None` tag 1.
    #[test]
    fn option_tags() {
        let abi = abi();
        let opt = ty(&abi, "core::option::Option::<core::integer::u8>");

        assert_eq!(encode_value(&CairoValue::Null, &opt, &abi).unwrap(), vec![Felt252::ONE]);
        assert_eq!(
            encode_value(&CairoValue::from(7u8), &opt, &abi).unwrap(),
            vec![Felt252::ZERO, Felt252::from(7u8)]
        );
        assert_eq!(roundtrip(&abi, &CairoValue::Null, &opt), CairoValue::Null);
        assert_eq!(roundtrip(&abi, &CairoValue::from(7u8), &opt), CairoValue::from(7u8));
    }

    #[test]
    fn nested_options_keep_some_none() {
        let abi = abi();
        let opt = ty(&abi, "core::option::Option::<core::option::Option::<core::integer::u8>>");

        let felts = [Felt252::ZERO, Felt252::ONE];
        let mut ctx = DecodeContext::new(&felts);
        let decoded = decode_value(&mut ctx, &opt, &abi).unwrap();
        assert_matches!(&decoded, CairoValue::Enum { variant, value } if variant == "Some" && **value == CairoValue::Null);
        assert_eq!(encode_value(&decoded, &opt, &abi).unwrap(), felts.to_vec());

        assert_eq!(encode_value(&CairoValue::Null, &opt, &abi).unwrap(), vec![Felt252::ONE]);
        assert_eq!(roundtrip(&abi, &CairoValue::from(7u8), &opt), CairoValue::from(7u8));
        assert_eq!(
            encode_value(&CairoValue::variant("Some", 7u8), &opt, &abi).unwrap(),
            vec![Felt252::ZERO, Felt252::ZERO, Felt252::from(7u8)]
        );
    }

    #[test]
    fn arrays_of_empty_elements() {
        let abi = abi();
        let units = ty(&abi, "core::array::Array::<()>");
        let value = CairoValue::from(vec![CairoValue::Array(vec![]), CairoValue::Array(vec![])]);

        assert_eq!(encode_value(&value, &units, &abi).unwrap(), vec![Felt252::from(2u8)]);
        assert_eq!(roundtrip(&abi, &value, &units), value);

        let felts = [Felt252::from(u64::from(u32::MAX) + 1)];
        let mut ctx = DecodeContext::new(&felts);
        assert_eq!(decode_value(&mut ctx, &units, &abi).unwrap_err().code, ErrorCode::DecodeError);
    }

    #[rstest]
    #[case("core::felt252", CairoValue::from("0x1234"))]
    #[case("core::integer::u256", CairoValue::from("340282366920938463463374607431768211456"))]
    #[case("core::byte_array::ByteArray", CairoValue::from("a string longer than thirty-one bytes, for sure"))]
    #[case("core::array::Array::<core::integer::u16>", CairoValue::from(vec![1u16, 2, 65535]))]
    #[case("(core::bool, core::integer::i128)", CairoValue::from(vec![CairoValue::from(true), CairoValue::from(i128::MIN)]))]
    fn decodes_what_it_encodes(#[case] type_name: &str, #[case] value: CairoValue) {
        let abi = abi();
        let ty = ty(&abi, type_name);
        let felts = encode_value(&value, &ty, &abi).unwrap();
        let decoded = roundtrip(&abi, &value, &ty);
        assert_eq!(encode_value(&decoded, &ty, &abi).unwrap(), felts);
    }

    #[test]
    fn felt_accepts_short_strings() {
        let abi = abi();
        let felts = encode_value(&CairoValue::from("hello"), &ty(&abi, "core::felt252"), &abi).unwrap();
        assert_eq!(felts, vec![Felt252::from(448378203247u64)]);
    }

    #[test]
    fn u256_accepts_limbs() {
        let abi = abi();
        let value = CairoValue::structure([("low", 456u32), ("high", 123u32)]);
        let felts = encode_value(&value, &ty(&abi, "core::integer::u256"), &abi).unwrap();
        assert_eq!(felts, vec![Felt252::from(456u32), Felt252::from(123u32)]);
    }

    #[rstest]
    #[case("core::integer::u8", CairoValue::from(256u32))]
    #[case("core::integer::i8", CairoValue::from(-129i32))]
    #[case("core::felt252", CairoValue::Int(BigInt::from(Felt252::modulus())))]
    #[case("core::felt252", CairoValue::from(-1i8))]
    #[case("core::starknet::contract_address::ContractAddress", CairoValue::from(Felt252::MAX))]
    #[case("core::bool", CairoValue::from(2u8))]
    #[case("core::integer::usize", CairoValue::from(1u64 << 32))]
    #[case("core::array::Array::<core::felt252>", CairoValue::from(1u8))]
    fn rejects_out_of_range_or_mistyped(#[case] type_name: &str, #[case] value: CairoValue) {
        let abi = abi();
        let err = encode_value(&value, &ty(&abi, type_name), &abi).unwrap_err();
        assert_eq!(err.code, ErrorCode::EncodeError);
    }

    #[test]
    fn calldata_positional_and_named() {
        let abi = abi();
        let positional = Args::Positional(vec![
            CairoValue::unit_variant("Empty"),
            CairoValue::from(vec![CairoValue::from("0x1"), CairoValue::from("gm")]),
            CairoValue::Null,
        ]);
        let named = Args::from([
            ("scale", CairoValue::Null),
            ("shape", CairoValue::unit_variant("Empty")),
            ("tags", CairoValue::from(vec![CairoValue::from(1u8), CairoValue::from("gm")])),
        ]);

        let felts = encode_calldata(&abi, "draw", &positional).unwrap();
        assert_eq!(felts, encode_calldata(&abi, "draw", &named).unwrap());

        let decoded = decode_calldata(&abi, "draw", &felts).unwrap();
        assert_eq!(decoded[0], CairoValue::unit_variant("Empty"));
        assert_eq!(decoded[2], CairoValue::Null);
    }

    #[test]
    fn calldata_errors() {
        let abi = abi();

        let err = encode_calldata(&abi, "erase", &Args::Positional(vec![])).unwrap_err();
        assert_eq!(err.code, ErrorCode::FunctionNotFound);

        let err = encode_calldata(&abi, "draw", &Args::Positional(vec![CairoValue::Null])).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArgs);

        let err = encode_calldata(&abi, "draw", &Args::from([("shape", "Empty")])).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArgs);

        let err = encode_calldata(&abi, "draw", &Args::from([("colour", "red")])).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArgs);
    }

    #[test]
    fn output_decoding() {
        let abi = abi();
        let felts = [Felt252::ONE, Felt252::from(5u8), Felt252::ZERO];
        let out = decode_output(&abi, "draw", &felts).unwrap();
        assert_eq!(out, vec![CairoValue::from(vec![CairoValue::from(true), CairoValue::from(5u8)])]);

        let err = decode_output(&abi, "draw", &felts[..2]).unwrap_err();
        assert_eq!(err.code, ErrorCode::DecodeError);
        assert!(err.message.contains("unexpected end of data"), "{}", err.message);

        let mut trailing = felts.to_vec();
        trailing.push(Felt252::ZERO);
        assert_eq!(decode_output(&abi, "draw", &trailing).unwrap_err().code, ErrorCode::DecodeError);
    }

    #[test]
    fn array_length_beyond_data_is_rejected() {
        let abi = abi();
        let felts = [Felt252::from(1000u32), Felt252::ONE];
        let mut ctx = DecodeContext::new(&felts);
        let err = decode_value(&mut ctx, &ty(&abi, "core::array::Array::<core::felt252>"), &abi).unwrap_err();
        assert_eq!(err.code, ErrorCode::DecodeError);
    }

    #[test]
    fn widths() {
        let abi = abi();
        assert_eq!(fixed_width(&ty(&abi, "core::integer::u256"), &abi), Some(2));
        assert_eq!(fixed_width(&ty(&abi, "demo::Point"), &abi), Some(2));
        assert_eq!(fixed_width(&ty(&abi, "()"), &abi), Some(0));
        assert_eq!(fixed_width(&ty(&abi, "demo::Shape"), &abi), None);
        assert_eq!(fixed_width(&ty(&abi, "core::byte_array::ByteArray"), &abi), None);
    }
}
