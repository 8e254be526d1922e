//! Hash primitives: Poseidon and Starknet Keccak.
//!
//! The codec only folds values in a fixed order; the permutations themselves come from an
//! implementation of [`StarkHasher`]. [`StarknetCrypto`] is the default and is backed by
//! `starknet-crypto` and `sha3`.

use sha3::{Digest, Keccak256};
use starknet_crypto::PoseidonHasher;
use starknet_types_core::felt::Felt;

use crate::felt::Felt252;

/// `poseidon_hash_many([])`.
pub const POSEIDON_HASH_EMPTY: Felt252 = Felt252::from_raw([
    0x02, 0x27, 0x2b, 0xe0, 0xf5, 0x80, 0xfd, 0x15, 0x68, 0x23, 0x30, 0x48, 0x00, 0x91, 0x95, 0x30,
    0xea, 0xa9, 0x74, 0x30, 0xe9, 0x72, 0xd7, 0x21, 0x3e, 0xe1, 0x3f, 0x4f, 0xbf, 0x7a, 0x5d, 0xbc,
]);

/// The hash primitives the class hash and selector code depend on.
pub trait StarkHasher {
    /// Poseidon over a non-empty sequence. Use [`poseidon_hash_array`] for possibly empty input.
    fn poseidon_hash_many(&self, felts: &[Felt252]) -> Felt252;

    /// Keccak-256 of the data with the result masked to 250 bits.
    fn sn_keccak(&self, data: &[u8]) -> Felt252;
}

/// The default [`StarkHasher`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StarknetCrypto;

impl StarkHasher for StarknetCrypto {
    fn poseidon_hash_many(&self, felts: &[Felt252]) -> Felt252 {
        let mut hasher = PoseidonHasher::new();
        for felt in felts {
            hasher.update(Felt::from(felt));
        }
        hasher.finalize().into()
    }

    fn sn_keccak(&self, data: &[u8]) -> Felt252 {
        starknet_keccak(data)
    }
}

/// Poseidon over a sequence that may be empty.
pub fn poseidon_hash_array<H: StarkHasher + ?Sized>(hasher: &H, felts: &[Felt252]) -> Felt252 {
    if felts.is_empty() {
        POSEIDON_HASH_EMPTY
    } else {
        hasher.poseidon_hash_many(felts)
    }
}

/// Keccak-256 with the top 6 bits cleared, so the result always fits in a felt.
pub fn starknet_keccak(data: &[u8]) -> Felt252 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let mut hash: [u8; 32] = hasher.finalize().into();

    // Keep only the low 250 bits.
    hash[0] &= 0x03;
    Felt252::from_bytes_be(&hash).expect("qed; 250-bit value is below the prime")
}

const DEFAULT_ENTRY_POINT_NAME: &str = "__default__";
const DEFAULT_L1_ENTRY_POINT_NAME: &str = "__l1_default__";

/// `sn_keccak(name)`.
pub fn compute_selector(name: &str) -> Felt252 {
    starknet_keccak(name.as_bytes())
}

/// The entry point selector for a function, constructor or l1 handler name. The default entry
/// points select as zero.
pub fn get_selector_from_name(name: &str) -> Felt252 {
    if name == DEFAULT_ENTRY_POINT_NAME || name == DEFAULT_L1_ENTRY_POINT_NAME {
        Felt252::ZERO
    } else {
        compute_selector(name)
    }
}

/// Events are selected by their bare name, so `my::module::Transfer` selects like `Transfer`.
pub fn get_event_selector(name: &str) -> Felt252 {
    compute_selector(name.rsplit("::").next().unwrap_or(name))
}
