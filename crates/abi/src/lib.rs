#![cfg_attr(not(test), warn(unused_crate_dependencies))]

//! Starknet contract ABIs: parsing, calldata and output encoding, and event decoding.
//!
//! ```
//! use cairo_abi::{encode_calldata, parse_abi, Args, CairoValue};
//! use serde_json::json;
//!
//! let abi = parse_abi(&json!([{
//!     "type": "function",
//!     "name": "set",
//!     "inputs": [{ "name": "value", "type": "core::integer::u256" }],
//!     "outputs": []
//! }]))
//! .unwrap();
//!
//! let calldata = encode_calldata(&abi, "set", &Args::Positional(vec![CairoValue::from(7u8)])).unwrap();
//! assert_eq!(calldata.len(), 2);
//! ```

pub mod abi;
pub mod cache;
pub mod codec;
pub mod error;
pub mod event;
pub mod parser;
pub mod types;
pub mod value;

pub use cache::{AbiCache, AbiCacheConfig};
pub use cairo_abi_primitives::hash::{
    compute_selector, get_event_selector, get_selector_from_name as get_function_selector,
};
pub use codec::{decode_calldata, decode_output, decode_value, encode_calldata, encode_value, Args, DecodeContext};
pub use error::{AbiError, AbiResult, ErrorCode};
pub use event::{
    compile_event_filter, decode_event, decode_events, decode_events_strict, ArgFilter,
    CompiledEventFilter, DecodedEvent, EventFilter, Receipt, RawEvent,
};
pub use parser::{parse_abi, parse_abi_str, ParsedAbi};
pub use types::{parse_type, ParsedType, Primitive};
pub use value::CairoValue;
