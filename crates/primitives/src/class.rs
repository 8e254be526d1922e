use serde::{Deserialize, Serialize};
use serde_json_pythonic::to_string_pythonic;
use starknet_types_core::felt::Felt;

use crate::cairo::{encode_short_string, ShortStringError};
use crate::contract::ADDRESS_BOUND;
use crate::error::PrimitiveError;
use crate::felt::Felt252;
use crate::hash::{poseidon_hash_array, StarkHasher, StarknetCrypto};
use crate::macros::bounded_felt;

bounded_felt! {
    /// The canonical hash of a contract class. This is the identifier of a class.
    ClassHash, bound = ADDRESS_BOUND, display = "class hash"
}

bounded_felt! {
    /// The hash of a compiled (CASM) contract class.
    CompiledClassHash, bound = ADDRESS_BOUND, display = "compiled class hash"
}

const SIERRA_VERSION_PREFIX: &str = "CONTRACT_CLASS_V";
const DEFAULT_SIERRA_VERSION: &str = "0.1.0";
const COMPILED_CLASS_VERSION: &str = "COMPILED_CLASS_V1";

#[derive(Debug, thiserror::Error)]
pub enum ClassHashError {
    #[error(transparent)]
    AbiConversion(#[from] serde_json_pythonic::Error),

    #[error("invalid contract class version `{version}`: {source}")]
    Version { version: String, source: ShortStringError },

    #[error("invalid builtin name `{name}`: {source}")]
    Builtin { name: String, source: ShortStringError },

    #[error("bytecode segment lengths cover {expected} felts but the bytecode has {actual}")]
    BytecodeLength { expected: usize, actual: usize },

    #[error(transparent)]
    Primitive(#[from] PrimitiveError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SierraEntryPoint {
    pub selector: Felt252,
    pub function_idx: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SierraEntryPoints {
    #[serde(rename = "EXTERNAL", default)]
    pub external: Vec<SierraEntryPoint>,
    #[serde(rename = "L1_HANDLER", default)]
    pub l1_handler: Vec<SierraEntryPoint>,
    #[serde(rename = "CONSTRUCTOR", default)]
    pub constructor: Vec<SierraEntryPoint>,
}

/// The ABI of a Sierra class as it appears in an artifact.
///
/// Compiler artifacts carry the ABI as a JSON array, RPC responses as a string. A string that
/// does not parse as a JSON array is kept and hashed verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SierraAbi {
    String(String),
    Json(serde_json::Value),
}

impl SierraAbi {
    /// The exact string that goes into the class hash.
    pub fn to_hashable_string(&self) -> Result<String, ClassHashError> {
        match self {
            Self::Json(value) => Ok(to_string_pythonic(value)?),
            Self::String(raw) => match serde_json::from_str::<serde_json::Value>(raw) {
                Ok(value @ serde_json::Value::Array(_)) => Ok(to_string_pythonic(&value)?),
                _ => Ok(raw.clone()),
            },
        }
    }
}

/// A Sierra contract class, as produced by the compiler or returned by `getClass`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SierraClass {
    pub sierra_program: Vec<Felt252>,
    #[serde(default = "default_sierra_version")]
    pub contract_class_version: String,
    pub entry_points_by_type: SierraEntryPoints,
    #[serde(default)]
    pub abi: Option<SierraAbi>,
}

fn default_sierra_version() -> String {
    DEFAULT_SIERRA_VERSION.to_string()
}

impl SierraClass {
    pub fn hash(&self) -> Result<ClassHash, ClassHashError> {
        class_hash_from_sierra(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasmEntryPoint {
    pub selector: Felt252,
    pub offset: u64,
    #[serde(default)]
    pub builtins: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasmEntryPoints {
    #[serde(rename = "EXTERNAL", default)]
    pub external: Vec<CasmEntryPoint>,
    #[serde(rename = "L1_HANDLER", default)]
    pub l1_handler: Vec<CasmEntryPoint>,
    #[serde(rename = "CONSTRUCTOR", default)]
    pub constructor: Vec<CasmEntryPoint>,
}

/// Lengths of the bytecode segments, nested the way the compiler groups functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NestedIntList {
    Leaf(usize),
    Node(Vec<NestedIntList>),
}

/// The compiled (CASM) form of a Sierra class. Fields irrelevant to hashing are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasmClass {
    pub bytecode: Vec<Felt252>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytecode_segment_lengths: Option<NestedIntList>,
    pub entry_points_by_type: CasmEntryPoints,
}

impl CasmClass {
    pub fn hash(&self) -> Result<CompiledClassHash, ClassHashError> {
        compiled_class_hash_from_casm(self)
    }
}

/// Computes the class hash of a Sierra class.
///
/// `poseidon(version, external, l1_handler, constructor, sn_keccak(abi), poseidon(program))`
/// where each entry point group hashes as `poseidon(selector_0, idx_0, selector_1, ...)`.
pub fn class_hash_from_sierra(class: &SierraClass) -> Result<ClassHash, ClassHashError> {
    class_hash_from_sierra_with(&StarknetCrypto, class)
}

pub fn class_hash_from_sierra_with<H: StarkHasher + ?Sized>(
    hasher: &H,
    class: &SierraClass,
) -> Result<ClassHash, ClassHashError> {
    let version = format!("{SIERRA_VERSION_PREFIX}{}", class.contract_class_version);
    let version_felt = encode_short_string(&version)
        .map_err(|source| ClassHashError::Version { version: version.clone(), source })?;

    let abi = match &class.abi {
        Some(abi) => abi.to_hashable_string()?,
        None => String::new(),
    };

    let entry_points = &class.entry_points_by_type;
    let components = [
        version_felt,
        sierra_entry_points_hash(hasher, &entry_points.external),
        sierra_entry_points_hash(hasher, &entry_points.l1_handler),
        sierra_entry_points_hash(hasher, &entry_points.constructor),
        hasher.sn_keccak(abi.as_bytes()),
        poseidon_hash_array(hasher, &class.sierra_program),
    ];

    let hash = hasher.poseidon_hash_many(&components);
    tracing::trace!(target: "class_hash", %version, hash = %hash.to_hex_stripped(), "Computed Sierra class hash.");

    Ok(ClassHash::new(hash)?)
}

/// Computes the compiled class hash of a CASM class.
///
/// `poseidon("COMPILED_CLASS_V1", external, l1_handler, constructor, bytecode)` where each entry
/// point hashes as `(selector, offset, poseidon(builtins))`.
pub fn compiled_class_hash_from_casm(
    class: &CasmClass,
) -> Result<CompiledClassHash, ClassHashError> {
    compiled_class_hash_from_casm_with(&StarknetCrypto, class)
}

pub fn compiled_class_hash_from_casm_with<H: StarkHasher + ?Sized>(
    hasher: &H,
    class: &CasmClass,
) -> Result<CompiledClassHash, ClassHashError> {
    let entry_points = &class.entry_points_by_type;
    let bytecode_hash = match &class.bytecode_segment_lengths {
        Some(lengths) => segmented_bytecode_hash(hasher, &class.bytecode, lengths)?,
        None => poseidon_hash_array(hasher, &class.bytecode),
    };

    let components = [
        encode_short_string(COMPILED_CLASS_VERSION).expect("qed; valid short string"),
        casm_entry_points_hash(hasher, &entry_points.external)?,
        casm_entry_points_hash(hasher, &entry_points.l1_handler)?,
        casm_entry_points_hash(hasher, &entry_points.constructor)?,
        bytecode_hash,
    ];

    let hash = hasher.poseidon_hash_many(&components);
    tracing::trace!(
        target: "class_hash",
        segmented = class.bytecode_segment_lengths.is_some(),
        hash = %hash.to_hex_stripped(),
        "Computed compiled class hash."
    );

    Ok(CompiledClassHash::new(hash)?)
}

fn sierra_entry_points_hash<H: StarkHasher + ?Sized>(
    hasher: &H,
    entry_points: &[SierraEntryPoint],
) -> Felt252 {
    let flat: Vec<Felt252> = entry_points
        .iter()
        .flat_map(|entry| [entry.selector, Felt252::from(entry.function_idx)])
        .collect();
    poseidon_hash_array(hasher, &flat)
}

fn casm_entry_points_hash<H: StarkHasher + ?Sized>(
    hasher: &H,
    entry_points: &[CasmEntryPoint],
) -> Result<Felt252, ClassHashError> {
    let mut flat = Vec::with_capacity(entry_points.len() * 3);

    for entry in entry_points {
        let builtins = entry
            .builtins
            .iter()
            .map(|name| {
                encode_short_string(name)
                    .map_err(|source| ClassHashError::Builtin { name: name.clone(), source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        flat.push(entry.selector);
        flat.push(Felt252::from(entry.offset));
        flat.push(poseidon_hash_array(hasher, &builtins));
    }

    Ok(poseidon_hash_array(hasher, &flat))
}

fn segmented_bytecode_hash<H: StarkHasher + ?Sized>(
    hasher: &H,
    bytecode: &[Felt252],
    lengths: &NestedIntList,
) -> Result<Felt252, ClassHashError> {
    let mut cursor = 0;
    let (_, hash) = bytecode_node_hash(hasher, bytecode, &mut cursor, lengths)?;

    if cursor != bytecode.len() {
        return Err(ClassHashError::BytecodeLength { expected: cursor, actual: bytecode.len() });
    }
    Ok(hash)
}

/// Returns the number of felts covered by the node and its hash. Inner nodes hash as
/// `1 + poseidon(len_0, hash_0, len_1, hash_1, ...)`.
fn bytecode_node_hash<H: StarkHasher + ?Sized>(
    hasher: &H,
    bytecode: &[Felt252],
    cursor: &mut usize,
    node: &NestedIntList,
) -> Result<(usize, Felt252), ClassHashError> {
    match node {
        NestedIntList::Leaf(len) => {
            let start = *cursor;
            let end = start + len;
            let segment = bytecode
                .get(start..end)
                .ok_or(ClassHashError::BytecodeLength { expected: end, actual: bytecode.len() })?;
            *cursor = end;
            Ok((*len, poseidon_hash_array(hasher, segment)))
        }

        NestedIntList::Node(children) => {
            let mut total = 0;
            let mut flat = Vec::with_capacity(children.len() * 2);

            for child in children {
                let (len, hash) = bytecode_node_hash(hasher, bytecode, cursor, child)?;
                total += len;
                flat.push(Felt252::from(len));
                flat.push(hash);
            }

            let hash = Felt::from(poseidon_hash_array(hasher, &flat)) + Felt::ONE;
            Ok((total, hash.into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::hash::{get_selector_from_name, starknet_keccak};

    const CASM_WITHOUT_SEGMENTATION: &str = r#"{
        "prime": "0x800000000000011000000000000000000000000000000000000000000000001",
        "compiler_version": "",
        "bytecode": ["0x1", "0x2", "0x3", "0x4", "0x5", "0x6", "0x7", "0x8", "0x9", "0xa"],
        "hints": [],
        "entry_points_by_type": {
            "EXTERNAL": [{ "selector": "0x1", "offset": 1, "builtins": ["237"] }],
            "L1_HANDLER": [],
            "CONSTRUCTOR": [{ "selector": "0x5", "offset": 0, "builtins": [] }]
        }
    }"#;

    const CASM_WITH_SEGMENTATION: &str = r#"{
        "prime": "0x800000000000011000000000000000000000000000000000000000000000001",
        "compiler_version": "",
        "bytecode": ["0x1", "0x2", "0x3", "0x4", "0x5", "0x6", "0x7", "0x8", "0x9", "0xa"],
        "bytecode_segment_lengths": [3, [1, 1, [1]], 4],
        "hints": [],
        "entry_points_by_type": {
            "EXTERNAL": [{ "selector": "0x1", "offset": 1, "builtins": ["237"] }],
            "L1_HANDLER": [],
            "CONSTRUCTOR": [{ "selector": "0x5", "offset": 0, "builtins": [] }]
        }
    }"#;

    #[rstest]
    #[case::without_segmentation(
        CASM_WITHOUT_SEGMENTATION,
        "0xb268995dd0ee80debfb8718852750b5fd22082d0c729121c48a0487a4d2f64"
    )]
    #[case::with_segmentation(
        CASM_WITH_SEGMENTATION,
        "0x5517ad8471c9aa4d1add31837240dead9dc6653854169e489a813db4376be9c"
    )]
    fn compiled_class_hash(#[case] artifact: &str, #[case] expected: &str) {
        let class: CasmClass = serde_json::from_str(artifact).unwrap();
        let hash = compiled_class_hash_from_casm(&class).unwrap();
        assert_eq!(hash, CompiledClassHash::from_hex(expected).unwrap());
    }

    #[test]
    fn segment_lengths_must_cover_bytecode() {
        let mut class: CasmClass = serde_json::from_str(CASM_WITH_SEGMENTATION).unwrap();

        class.bytecode_segment_lengths = Some(NestedIntList::Node(vec![NestedIntList::Leaf(4)]));
        assert_matches!(
            compiled_class_hash_from_casm(&class),
            Err(ClassHashError::BytecodeLength { expected: 4, actual: 10 })
        );

        class.bytecode_segment_lengths = Some(NestedIntList::Node(vec![NestedIntList::Leaf(11)]));
        assert_matches!(
            compiled_class_hash_from_casm(&class),
            Err(ClassHashError::BytecodeLength { expected: 11, actual: 10 })
        );
    }

    fn sierra_class(abi: Option<SierraAbi>) -> SierraClass {
        SierraClass {
            sierra_program: vec![Felt252::from(1u8), Felt252::from(2u8), Felt252::from(3u8)],
            contract_class_version: "0.1.0".to_string(),
            entry_points_by_type: SierraEntryPoints {
                external: vec![SierraEntryPoint {
                    selector: get_selector_from_name("transfer"),
                    function_idx: 0,
                }],
                l1_handler: vec![],
                constructor: vec![SierraEntryPoint {
                    selector: get_selector_from_name("constructor"),
                    function_idx: 1,
                }],
            },
            abi,
        }
    }

    #[test]
    fn sierra_hash_folds_components_in_order() {
        let abi = json!([{ "type": "function", "name": "transfer", "inputs": [], "outputs": [] }]);
        let class = sierra_class(Some(SierraAbi::Json(abi)));

        let h = StarknetCrypto;
        let external = h.poseidon_hash_many(&[get_selector_from_name("transfer"), Felt252::ZERO]);
        let constructor =
            h.poseidon_hash_many(&[get_selector_from_name("constructor"), Felt252::ONE]);
        let abi_hash = starknet_keccak(
            br#"[{"type": "function", "name": "transfer", "inputs": [], "outputs": []}]"#,
        );
        let program = h.poseidon_hash_many(&class.sierra_program);

        let expected = h.poseidon_hash_many(&[
            encode_short_string("CONTRACT_CLASS_V0.1.0").unwrap(),
            external,
            poseidon_hash_array(&h, &[]),
            constructor,
            abi_hash,
            program,
        ]);

        assert_eq!(class_hash_from_sierra(&class).unwrap().felt(), expected);
    }

    #[test]
    fn sierra_hash_matches_starknet_rs() {
        use starknet::core::types::contract::SierraClass as StarknetRsSierraClass;

        let artifact = json!({
            "sierra_program": ["0x1", "0x2", "0x3"],
            "sierra_program_debug_info": null,
            "contract_class_version": "0.1.0",
            "entry_points_by_type": {
                "EXTERNAL": [{ "selector": get_selector_from_name("transfer").to_hex(), "function_idx": 0 }],
                "L1_HANDLER": [],
                "CONSTRUCTOR": [{ "selector": get_selector_from_name("constructor").to_hex(), "function_idx": 1 }]
            },
            "abi": [{
                "type": "function",
                "name": "transfer",
                "inputs": [{ "name": "amount", "type": "core::felt252" }],
                "outputs": [],
                "state_mutability": "external"
            }]
        });

        let class: SierraClass = serde_json::from_value(artifact.clone()).unwrap();
        let actual = class_hash_from_sierra(&class).unwrap();

        // Compare it against the hash computed using `starknet-rs` types
        let class = serde_json::from_value::<StarknetRsSierraClass>(artifact).unwrap();
        let expected = Felt252::from(class.class_hash().unwrap());

        assert_eq!(actual.felt(), expected);
    }

    #[test]
    fn abi_string_is_normalized_when_it_parses() {
        let array = sierra_class(Some(SierraAbi::Json(json!([{ "type": "impl", "name": "A" }]))));
        let string =
            sierra_class(Some(SierraAbi::String(r#"[{"type":"impl",  "name":"A"}]"#.to_string())));

        assert_eq!(array.hash().unwrap(), string.hash().unwrap());
        assert_eq!(
            SierraAbi::String(r#"[{"type":"impl","name":"a, b: c"}]"#.to_string())
                .to_hashable_string()
                .unwrap(),
            r#"[{"type": "impl", "name": "a, b: c"}]"#
        );
    }

    #[test]
    fn unparseable_abi_string_is_hashed_verbatim() {
        let raw = "not json, at all";
        assert_eq!(SierraAbi::String(raw.to_string()).to_hashable_string().unwrap(), raw);

        let missing = sierra_class(None);
        let empty = sierra_class(Some(SierraAbi::String(String::new())));
        assert_eq!(missing.hash().unwrap(), empty.hash().unwrap());
    }

    #[test]
    fn sierra_class_deserializes_from_artifact_json() {
        let artifact = json!({
            "sierra_program": ["0x1", "0x2", "0x3"],
            "contract_class_version": "0.1.0",
            "entry_points_by_type": {
                "EXTERNAL": [{ "selector": get_selector_from_name("transfer").to_hex(), "function_idx": 0 }],
                "L1_HANDLER": [],
                "CONSTRUCTOR": [{ "selector": get_selector_from_name("constructor").to_hex(), "function_idx": 1 }]
            },
            "abi": "[]"
        });

        let class: SierraClass = serde_json::from_value(artifact).unwrap();
        assert_eq!(class, sierra_class(Some(SierraAbi::String("[]".to_string()))));
    }
}
