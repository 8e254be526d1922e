use crate::felt::Felt252;
use crate::macros::bounded_felt;

/// 2^251, the exclusive upper bound of contract addresses and storage keys.
pub const ADDRESS_BOUND: Felt252 = Felt252::from_raw([
    0x08, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
]);

bounded_felt! {
    /// The address of a contract on Starknet.
    ContractAddress, bound = ADDRESS_BOUND, display = "contract address"
}

bounded_felt! {
    /// A key into a contract's storage.
    StorageKey, bound = ADDRESS_BOUND, display = "storage key"
}
