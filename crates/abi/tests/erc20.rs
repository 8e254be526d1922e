use std::sync::Arc;

use assert_matches::assert_matches;
use cairo_abi::{
    decode_calldata, decode_event, decode_events, decode_events_strict, decode_output,
    encode_calldata, get_event_selector, parse_abi_str, AbiCache, Args, CairoValue, ErrorCode,
    EventFilter, ParsedAbi, RawEvent, Receipt,
};
use cairo_abi_primitives::codec::serialize_byte_array;
use cairo_abi_primitives::{address, felt, ContractAddress, Felt252};
use num_bigint::BigInt;
use rstest::{fixture, rstest};

const ERC20_ABI: &str = include_str!("fixtures/erc20_abi.json");

const TOKEN: ContractAddress = address!("0x49d36570d4e46f48e99674bd3fcc84644ddd6b96f7c741b1562b82f9e004dc7");
const OTHER: ContractAddress = address!("0x53c91253bc9682c04929ca02ed00b3e423f6710d2ee7e0d5ebb06f3ecf368a8");

#[fixture]
fn abi() -> ParsedAbi {
    parse_abi_str(ERC20_ABI).unwrap()
}

fn transfer_event(from: u64, to: u64, amount: u64) -> RawEvent {
    RawEvent {
        from_address: Some(TOKEN),
        keys: vec![get_event_selector("Transfer"), Felt252::from(from), Felt252::from(to)],
        data: vec![Felt252::from(amount), Felt252::ZERO],
    }
}

#[rstest]
fn transfer_calldata(abi: ParsedAbi) {
    let recipient = felt!("0x1234");
    let amount = BigInt::from(1_000_000_000_000_000_000u64);

    let args = Args::Positional(vec![CairoValue::from(recipient), CairoValue::Int(amount.clone())]);
    let calldata = encode_calldata(&abi, "transfer", &args).unwrap();
    assert_eq!(calldata, vec![recipient, Felt252::from(1_000_000_000_000_000_000u64), Felt252::ZERO]);

    let decoded = decode_calldata(&abi, "transfer", &calldata).unwrap();
    assert_eq!(decoded, vec![CairoValue::from(recipient), CairoValue::Int(amount)]);
}

#[rstest]
fn transfer_calldata_round_trips_any_u256(abi: ParsedAbi) {
    let max = (BigInt::from(1) << 256) - 1;
    for amount in [BigInt::from(0), BigInt::from(1) << 128, max] {
        let args = Args::from([("amount", CairoValue::Int(amount.clone())), ("recipient", CairoValue::from(1u8))]);
        let calldata = encode_calldata(&abi, "transfer", &args).unwrap();
        let decoded = decode_calldata(&abi, "transfer", &calldata).unwrap();
        assert_eq!(decoded[1], CairoValue::Int(amount));
    }
}

#[rstest]
fn functions_inside_interfaces_are_indexed(abi: ParsedAbi) {
    for name in ["total_supply", "balance_of", "transfer", "name", "constructor"] {
        assert!(abi.function(name).is_some(), "{name} missing");
    }
}

#[rstest]
fn constructor_calldata(abi: ParsedAbi) {
    let args = Args::from([
        ("name", CairoValue::from("Ether")),
        ("symbol", CairoValue::from("ETH")),
        ("initial_supply", CairoValue::from("0x3635c9adc5dea00000")),
        ("recipient", CairoValue::from(TOKEN)),
    ]);

    let calldata = encode_calldata(&abi, "constructor", &args).unwrap();

    let mut expected = serialize_byte_array(b"Ether");
    expected.extend(serialize_byte_array(b"ETH"));
    expected.extend([felt!("0x3635c9adc5dea00000"), Felt252::ZERO, TOKEN.felt()]);
    similar_asserts::assert_eq!(calldata, expected);
}

#[rstest]
fn outputs(abi: ParsedAbi) {
    let out = decode_output(&abi, "transfer", &[Felt252::ONE]).unwrap();
    assert_eq!(out, vec![CairoValue::Bool(true)]);

    let out = decode_output(&abi, "name", &serialize_byte_array(b"Starknet Token")).unwrap();
    assert_eq!(out, vec![CairoValue::from("Starknet Token")]);
}

#[rstest]
#[case::unknown_function("approve", Args::Positional(vec![]), ErrorCode::FunctionNotFound)]
#[case::wrong_arity("transfer", Args::Positional(vec![CairoValue::from(1u8)]), ErrorCode::InvalidArgs)]
#[case::unknown_name("balance_of", Args::from([("owner", 1u8)]), ErrorCode::InvalidArgs)]
#[case::felt_overflow(
    "balance_of",
    Args::Positional(vec![CairoValue::Int(BigInt::from(Felt252::modulus()))]),
    ErrorCode::EncodeError
)]
#[case::u256_overflow(
    "transfer",
    Args::Positional(vec![CairoValue::from(1u8), CairoValue::Int(BigInt::from(1) << 256)]),
    ErrorCode::EncodeError
)]
fn calldata_error_codes(abi: ParsedAbi, #[case] function: &str, #[case] args: Args, #[case] code: ErrorCode) {
    assert_matches!(encode_calldata(&abi, function, &args), Err(e) if e.code == code);
}

#[rstest]
fn transfer_event_splits_keys_and_data(abi: ParsedAbi) {
    let event = transfer_event(0x111, 0x222, 1000);

    let decoded = decode_event(&abi, "Transfer", &event).unwrap();
    assert_eq!(decoded.name, "openzeppelin::token::erc20::erc20::ERC20Component::Transfer");
    similar_asserts::assert_eq!(
        serde_json::to_value(&decoded.args).unwrap(),
        serde_json::json!({ "from": "273", "to": "546", "value": "1000" })
    );

    let by_selector = decode_event(&abi, &get_event_selector("Transfer").to_hex(), &event).unwrap();
    assert_eq!(by_selector, decoded);
}

#[test_log::test(rstest)]
fn receipt_decoding_skips_unknown_events(abi: ParsedAbi) {
    let unknown = RawEvent { from_address: Some(OTHER), keys: vec![felt!("0xdead")], data: vec![] };
    let receipt = Receipt { events: vec![transfer_event(1, 2, 3), unknown, transfer_event(2, 3, 4)] };

    let decoded = decode_events(&receipt, &abi, None).unwrap();
    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded[1].args["value"], CairoValue::from(4u8));

    let err = decode_events_strict(&receipt, &abi, None).unwrap_err();
    assert_eq!(err.code, ErrorCode::EventNotFound);
}

#[rstest]
fn receipt_filtering(abi: ParsedAbi) {
    let mut foreign = transfer_event(1, 5, 9);
    foreign.from_address = Some(OTHER);
    let receipt = Receipt {
        events: vec![transfer_event(1, 2, 3), transfer_event(7, 2, 4), transfer_event(8, 2, 5), foreign],
    };

    let filter = EventFilter::new().from_address(TOKEN).event("Transfer").arg_any_of("from", [1u8, 8u8]);
    let decoded = decode_events(&receipt, &abi, Some(&filter)).unwrap();
    let values: Vec<_> = decoded.iter().map(|e| e.args["value"].clone()).collect();
    assert_eq!(values, vec![CairoValue::from(3u8), CairoValue::from(5u8)]);

    let filter = EventFilter::new().event("Transfer").arg("to", 5u8);
    let decoded = decode_events(&receipt, &abi, Some(&filter)).unwrap();
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].from_address, Some(OTHER));
}

#[rstest]
fn or_filters_on_multi_felt_keys_are_rejected() {
    let abi = cairo_abi::parse_abi(&serde_json::json!([{
        "type": "event",
        "name": "nft::Minted",
        "kind": "struct",
        "members": [{ "name": "token_id", "type": "core::integer::u256", "kind": "key" }]
    }]))
    .unwrap();

    let filter = EventFilter::new().event("Minted").arg_any_of("token_id", [1u8, 2u8]);
    let err = cairo_abi::compile_event_filter(&abi, &filter).unwrap_err();
    assert_eq!(err.code, ErrorCode::EncodeError);
    assert!(err.message.contains("OR arrays not supported"), "{}", err.message);

    let filter = EventFilter::new().event("Minted").arg("token_id", 1u8);
    let compiled = cairo_abi::compile_event_filter(&abi, &filter).unwrap();
    assert_eq!(compiled.keys, vec![vec![get_event_selector("Minted")], vec![Felt252::ONE], vec![Felt252::ZERO]]);
}

#[test]
fn cached_parse_is_shared() {
    let cache = AbiCache::default();
    let source = Arc::new(serde_json::from_str::<serde_json::Value>(ERC20_ABI).unwrap());

    let first = cache.get_or_parse(&source).unwrap();
    let second = cache.get_or_parse(&Arc::clone(&source)).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(first.function("transfer").is_some());
}
