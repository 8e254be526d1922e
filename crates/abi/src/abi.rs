//! The Starknet ABI JSON format, as emitted by the Cairo compiler.
//!
//! Entries are tagged by their `type` field. Both Cairo 1 ABIs and the older shapes (Cairo 0
//! `keys`/`data` events, pre-2.0 `inputs` events, camel-cased `stateMutability`) are accepted.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AbiEntry {
    Function(AbiFunction),
    Constructor(AbiFunction),
    L1Handler(AbiFunction),
    Event(AbiEvent),
    Struct(AbiStruct),
    Enum(AbiEnum),
    Interface(AbiInterface),
    Impl(AbiImpl),
}

impl AbiEntry {
    /// The `type` tags this model understands. Entries with any other tag are skipped.
    pub const KNOWN_TYPES: [&'static str; 8] =
        ["function", "constructor", "l1_handler", "event", "struct", "enum", "interface", "impl"];
}

/// A named, typed parameter. Also used for struct members and enum variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParam {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

/// A function output. Cairo 1 outputs are unnamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateMutability {
    External,
    View,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiFunction {
    pub name: String,
    pub inputs: Vec<AbiParam>,
    #[serde(default)]
    pub outputs: Vec<AbiOutput>,
    #[serde(
        default,
        alias = "stateMutability",
        skip_serializing_if = "Option::is_none"
    )]
    pub state_mutability: Option<StateMutability>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiStruct {
    pub name: String,
    pub members: Vec<AbiParam>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiEnum {
    pub name: String,
    pub variants: Vec<AbiParam>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbiEventKind {
    Struct,
    Enum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbiEventFieldKind {
    Key,
    Data,
    Nested,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiEventField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub kind: AbiEventFieldKind,
}

/// An event entry in any of its historical shapes.
///
/// Cairo 1 events carry `kind` with `members` (struct) or `variants` (enum). Older ABIs
/// carry either `inputs` (every field in data) or explicit `keys` and `data` lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiEvent {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<AbiEventKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<AbiEventField>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variants: Option<Vec<AbiEventField>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Vec<AbiParam>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<AbiParam>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<AbiParam>>,
}

/// A group of functions; its items are indexed as if they were top-level entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiInterface {
    pub name: String,
    pub items: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiImpl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn function_entry() {
        let entry: AbiEntry = serde_json::from_value(json!({
            "type": "function",
            "name": "transfer",
            "inputs": [
                { "name": "recipient", "type": "core::starknet::contract_address::ContractAddress" },
                { "name": "amount", "type": "core::integer::u256" }
            ],
            "outputs": [{ "type": "core::bool" }],
            "state_mutability": "external"
        }))
        .unwrap();

        assert_matches!(entry, AbiEntry::Function(AbiFunction { name, inputs, outputs, state_mutability }) => {
            assert_eq!(name, "transfer");
            assert_eq!(inputs.len(), 2);
            assert_eq!(outputs[0].ty, "core::bool");
            assert_eq!(state_mutability, Some(StateMutability::External));
        });
    }

    #[test]
    fn legacy_function_uses_camel_case_mutability() {
        let entry: AbiEntry = serde_json::from_value(json!({
            "type": "function",
            "name": "balanceOf",
            "inputs": [{ "name": "account", "type": "felt" }],
            "outputs": [{ "name": "balance", "type": "Uint256" }],
            "stateMutability": "view"
        }))
        .unwrap();

        assert_matches!(entry, AbiEntry::Function(f) => {
            assert_eq!(f.state_mutability, Some(StateMutability::View));
            assert_eq!(f.outputs[0].name.as_deref(), Some("balance"));
        });
    }

    #[test]
    fn function_without_inputs_is_rejected() {
        let result = serde_json::from_value::<AbiEntry>(json!({ "type": "function", "name": "f" }));
        assert!(result.is_err());
    }

    #[test]
    fn event_shapes() {
        let entry: AbiEntry = serde_json::from_value(json!({
            "type": "event",
            "name": "erc20::Transfer",
            "kind": "struct",
            "members": [{ "name": "from", "type": "core::felt252", "kind": "key" }]
        }))
        .unwrap();
        assert_matches!(entry, AbiEntry::Event(e) => {
            assert_eq!(e.kind, Some(AbiEventKind::Struct));
            assert_eq!(e.members.unwrap()[0].kind, AbiEventFieldKind::Key);
        });

        let entry: AbiEntry = serde_json::from_value(json!({
            "type": "event",
            "name": "Transfer",
            "keys": [],
            "data": [{ "name": "from_", "type": "felt" }]
        }))
        .unwrap();
        assert_matches!(entry, AbiEntry::Event(e) => {
            assert_eq!(e.kind, None);
            assert_eq!(e.data.unwrap().len(), 1);
        });
    }
}
