#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod cairo;
pub mod class;
pub mod codec;
pub mod contract;
pub mod error;
pub mod eth;
pub mod felt;
pub mod hash;
pub mod int;

mod macros;

pub use alloy_primitives::U256;
pub use cairo_abi_primitives_macro::{address, felt};
pub use class::{ClassHash, CompiledClassHash};
pub use contract::{ContractAddress, StorageKey};
pub use error::PrimitiveError;
pub use eth::EthAddress;
pub use felt::Felt252;
pub use hash::{compute_selector, get_event_selector, get_selector_from_name, starknet_keccak};
