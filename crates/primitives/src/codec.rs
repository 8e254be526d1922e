//! Cairo serde for the composite wire shapes: `u256`, arrays, and `ByteArray`.

use alloy_primitives::U256;

use crate::error::PrimitiveError;
use crate::felt::Felt252;

/// The number of bytes packed into each full `ByteArray` word.
pub const BYTES_PER_WORD: usize = 31;

/// A value read from a felt slice together with the offset just past it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded<T> {
    pub value: T,
    pub next_offset: usize,
}

/// Splits a `u256` into its calldata representation `[low, high]`.
pub fn serialize_u256(value: U256) -> [Felt252; 2] {
    let low: u128 = (value & U256::from(u128::MAX)).to();
    let high: u128 = (value >> 128usize).to();
    [Felt252::from(low), Felt252::from(high)]
}

/// Joins `[low, high]` back into a `u256`. Each limb must fit in 128 bits.
pub fn deserialize_u256(felts: &[Felt252; 2]) -> Result<U256, PrimitiveError> {
    let [low, high] = felts;
    let low = low
        .to_u128()
        .ok_or_else(|| PrimitiveError::range(format!("u256 low limb {} exceeds 128 bits", low.to_hex_stripped())))?;
    let high = high
        .to_u128()
        .ok_or_else(|| PrimitiveError::range(format!("u256 high limb {} exceeds 128 bits", high.to_hex_stripped())))?;
    Ok((U256::from(high) << 128usize) | U256::from(low))
}

/// Prefixes the items with their length.
pub fn serialize_array(items: &[Felt252]) -> Vec<Felt252> {
    let mut felts = Vec::with_capacity(items.len() + 1);
    felts.push(Felt252::from(items.len()));
    felts.extend_from_slice(items);
    felts
}

/// Reads a length-prefixed array starting at `offset`.
pub fn deserialize_array(
    felts: &[Felt252],
    offset: usize,
) -> Result<Decoded<Vec<Felt252>>, PrimitiveError> {
    let len = read_len(felts, offset)?;
    let start = offset + 1;
    let items = read_slice(felts, start, len)?;
    Ok(Decoded { value: items.to_vec(), next_offset: start + len })
}

/// Packs raw bytes into Cairo's `ByteArray` layout:
/// `[num_full_words, ...full_words, pending_word, pending_word_len]`.
pub fn serialize_byte_array(bytes: &[u8]) -> Vec<Felt252> {
    let chunks = bytes.chunks_exact(BYTES_PER_WORD);
    let pending = chunks.remainder();
    let full_words = bytes.len() / BYTES_PER_WORD;

    let mut felts = Vec::with_capacity(full_words + 3);
    felts.push(Felt252::from(full_words));
    felts.extend(chunks.map(pack_word));
    felts.push(pack_word(pending));
    felts.push(Felt252::from(pending.len()));
    felts
}

/// Unpacks a `ByteArray` starting at `offset`.
pub fn deserialize_byte_array(
    felts: &[Felt252],
    offset: usize,
) -> Result<Decoded<Vec<u8>>, PrimitiveError> {
    let full_words = read_len(felts, offset)?;
    let words = read_slice(felts, offset + 1, full_words)?;
    let tail = read_slice(felts, offset + 1 + full_words, 2)?;

    let mut bytes = Vec::with_capacity(full_words * BYTES_PER_WORD + BYTES_PER_WORD);
    for word in words {
        bytes.extend_from_slice(&unpack_word(word, BYTES_PER_WORD)?);
    }

    let pending_len = tail[1]
        .to_u64()
        .and_then(|len| usize::try_from(len).ok())
        .filter(|len| *len < BYTES_PER_WORD)
        .ok_or_else(|| {
            PrimitiveError::range(format!(
                "pending word length {} must be less than {BYTES_PER_WORD}",
                tail[1].to_hex_stripped()
            ))
        })?;
    bytes.extend_from_slice(&unpack_word(&tail[0], pending_len)?);

    Ok(Decoded { value: bytes, next_offset: offset + full_words + 3 })
}

fn pack_word(chunk: &[u8]) -> Felt252 {
    Felt252::from_bytes_be_slice(chunk).expect("qed; chunks are at most 31 bytes")
}

fn unpack_word(word: &Felt252, len: usize) -> Result<Vec<u8>, PrimitiveError> {
    let bytes = word.as_bytes();
    let start = bytes.len() - len;
    if bytes[..start].iter().any(|b| *b != 0) {
        return Err(PrimitiveError::range(format!(
            "byte array word {} does not fit in {len} bytes",
            word.to_hex_stripped()
        )));
    }
    Ok(bytes[start..].to_vec())
}

fn read_len(felts: &[Felt252], offset: usize) -> Result<usize, PrimitiveError> {
    let felt = read_slice(felts, offset, 1)?[0];
    felt.to_u64().and_then(|len| usize::try_from(len).ok()).ok_or_else(|| {
        PrimitiveError::range(format!("length prefix {} is too large", felt.to_hex_stripped()))
    })
}

/// Borrows `needed` felts starting at `offset`, failing if the slice is too short.
pub fn read_slice(
    felts: &[Felt252],
    offset: usize,
    needed: usize,
) -> Result<&[Felt252], PrimitiveError> {
    offset
        .checked_add(needed)
        .and_then(|end| felts.get(offset..end))
        .ok_or(PrimitiveError::OutOfBounds { offset, needed, len: felts.len() })
}
