//! Event decoding and key filters.
//!
//! A Cairo event is emitted as two felt streams: `keys`, which starts with the event selector and
//! carries the members annotated as keys, and `data`, which carries everything else. Decoding
//! reads each member from its own stream with an independent cursor.

use cairo_abi_primitives::{ContractAddress, Felt252};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::codec::{decode_value, encode_value, fixed_width, DecodeContext};
use crate::error::{AbiError, AbiResult};
use crate::parser::{EventDef, EventFieldKind, EventLayout, ParsedAbi};
use crate::value::CairoValue;

/// An event as found in a transaction receipt.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_address: Option<ContractAddress>,
    pub keys: Vec<Felt252>,
    pub data: Vec<Felt252>,
}

impl RawEvent {
    /// The event selector, carried as the first key.
    pub fn selector(&self) -> Option<&Felt252> {
        self.keys.first()
    }
}

/// The part of a transaction receipt that carries events. Other receipt fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Receipt {
    #[serde(default)]
    pub events: Vec<RawEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedEvent {
    /// Full name of the event as declared in the ABI.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_address: Option<ContractAddress>,
    pub args: IndexMap<String, CairoValue>,
}

/// Decodes an event, resolving its definition by name or by `0x` selector.
pub fn decode_event(abi: &ParsedAbi, name_or_selector: &str, event: &RawEvent) -> AbiResult<DecodedEvent> {
    let def = abi
        .find_event(name_or_selector)
        .ok_or_else(|| AbiError::event_not_found(name_or_selector))?;
    decode_with(abi, def, event)
}

/// Decodes every event of a receipt that passes the filter.
///
/// Events whose selector is not in the ABI are skipped, so a receipt holding events from several
/// contracts can be decoded against any one of their ABIs.
pub fn decode_events(
    receipt: &Receipt,
    abi: &ParsedAbi,
    filter: Option<&EventFilter>,
) -> AbiResult<Vec<DecodedEvent>> {
    decode_receipt(receipt, abi, filter, false)
}

/// Like [`decode_events`], but fails on the first event that is not in the ABI.
pub fn decode_events_strict(
    receipt: &Receipt,
    abi: &ParsedAbi,
    filter: Option<&EventFilter>,
) -> AbiResult<Vec<DecodedEvent>> {
    decode_receipt(receipt, abi, filter, true)
}

fn decode_receipt(
    receipt: &Receipt,
    abi: &ParsedAbi,
    filter: Option<&EventFilter>,
    strict: bool,
) -> AbiResult<Vec<DecodedEvent>> {
    let filter = filter.map(|f| compile_event_filter(abi, f)).transpose()?;

    let mut decoded = Vec::new();
    for (index, event) in receipt.events.iter().enumerate() {
        if filter.as_ref().is_some_and(|f| !f.matches(event)) {
            continue;
        }

        let def = event.selector().and_then(|selector| abi.event_by_selector(selector));
        let Some(def) = def else {
            let selector = event.selector().map(Felt252::to_hex_stripped).unwrap_or_default();
            if strict {
                return Err(AbiError::event_not_found(&selector));
            }
            debug!(target: "abi::events", index, %selector, "Skipping event not in ABI.");
            continue;
        };

        decoded.push(decode_with(abi, def, event).map_err(|e| e.at(&format!("events[{index}]")))?);
    }

    trace!(target: "abi::events", total = receipt.events.len(), decoded = decoded.len(), "Decoded receipt events.");
    Ok(decoded)
}

fn decode_with(abi: &ParsedAbi, def: &EventDef, event: &RawEvent) -> AbiResult<DecodedEvent> {
    let keys = event
        .keys
        .get(1..)
        .ok_or_else(|| AbiError::decode(format!("event `{}` has no selector key", def.name)))?;

    let args = match &def.layout {
        EventLayout::Struct(fields) => {
            let mut key_ctx = DecodeContext::new(keys);
            let mut data_ctx = DecodeContext::new(&event.data);

            let mut args = IndexMap::with_capacity(fields.len());
            for field in fields {
                let ctx = match field.kind {
                    EventFieldKind::Key => &mut key_ctx,
                    EventFieldKind::Data | EventFieldKind::Nested | EventFieldKind::Flat => {
                        &mut data_ctx
                    }
                };
                let value = decode_value(ctx, &field.member.ty, abi)
                    .map_err(|e| e.at(&format!("{}.{}", def.name, field.member.name)))?;
                args.insert(field.member.name.clone(), value);
            }
            args
        }

        // Dispatch enums are read positionally.
        EventLayout::Enum(_) => {
            let keys = keys.iter().enumerate().map(|(i, k)| (format!("key_{i}"), CairoValue::from(*k)));
            let data = event.data.iter().enumerate().map(|(i, d)| (format!("data_{i}"), CairoValue::from(*d)));
            keys.chain(data).collect()
        }
    };

    Ok(DecodedEvent { name: def.name.clone(), from_address: event.from_address, args })
}

/// The accepted values of one indexed event member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgFilter {
    Eq(CairoValue),
    /// Matches any of the values. Only supported for members encoded as a single felt.
    AnyOf(Vec<CairoValue>),
}

/// Selects events by emitter, by event, and by the values of indexed members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub from_address: Option<ContractAddress>,
    /// Event name or `0x` selector.
    pub event: Option<String>,
    pub args: IndexMap<String, ArgFilter>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_address(mut self, address: ContractAddress) -> Self {
        self.from_address = Some(address);
        self
    }

    pub fn event(mut self, name_or_selector: impl Into<String>) -> Self {
        self.event = Some(name_or_selector.into());
        self
    }

    pub fn arg(mut self, name: impl Into<String>, value: impl Into<CairoValue>) -> Self {
        self.args.insert(name.into(), ArgFilter::Eq(value.into()));
        self
    }

    pub fn arg_any_of<V: Into<CairoValue>>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.args.insert(name.into(), ArgFilter::AnyOf(values));
        self
    }
}

/// An [`EventFilter`] lowered to a positional key pattern.
///
/// `keys[i]` lists the accepted values of the `i`-th key, with an empty list matching anything.
/// Position 0 is the selector. This is the same shape as the `keys` field of a Starknet RPC
/// event filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompiledEventFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_address: Option<ContractAddress>,
    pub keys: Vec<Vec<Felt252>>,
}

impl CompiledEventFilter {
    pub fn selector(&self) -> Option<&Felt252> {
        match self.keys.first() {
            Some(selector) if selector.len() == 1 => selector.first(),
            _ => None,
        }
    }

    pub fn matches(&self, event: &RawEvent) -> bool {
        if let Some(address) = &self.from_address {
            if event.from_address.as_ref() != Some(address) {
                return false;
            }
        }

        self.keys.iter().enumerate().all(|(position, accepted)| {
            accepted.is_empty() || event.keys.get(position).is_some_and(|key| accepted.contains(key))
        })
    }
}

pub fn compile_event_filter(abi: &ParsedAbi, filter: &EventFilter) -> AbiResult<CompiledEventFilter> {
    let mut compiled = CompiledEventFilter { from_address: filter.from_address, keys: Vec::new() };

    let Some(name) = &filter.event else {
        if let Some(arg) = filter.args.keys().next() {
            return Err(AbiError::invalid_args(format!(
                "cannot filter on `{arg}` without selecting an event"
            )));
        }
        return Ok(compiled);
    };

    let def = abi.find_event(name).ok_or_else(|| AbiError::event_not_found(name))?;
    compiled.keys.push(vec![def.selector]);

    if filter.args.is_empty() {
        return Ok(compiled);
    }

    let EventLayout::Struct(fields) = &def.layout else {
        return Err(AbiError::invalid_args(format!(
            "event `{}` is an enum and has no indexed members to filter on",
            def.name
        )));
    };

    for arg in filter.args.keys() {
        match fields.iter().find(|f| &f.member.name == arg) {
            None => {
                return Err(AbiError::invalid_args(format!(
                    "event `{}` has no member `{arg}`",
                    def.name
                )))
            }
            Some(field) if field.kind != EventFieldKind::Key => {
                return Err(AbiError::invalid_args(format!(
                    "`{arg}` is not an indexed key of event `{}`",
                    def.name
                )))
            }
            Some(_) => {}
        }
    }

    // Name of the first key whose width depends on its value; no later position is known.
    let mut variable: Option<&str> = None;

    for field in fields.iter().filter(|f| f.kind == EventFieldKind::Key) {
        let name = field.member.name.as_str();
        let width = fixed_width(&field.member.ty, abi);

        let Some(arg) = filter.args.get(name) else {
            match width {
                Some(width) if variable.is_none() => {
                    compiled.keys.extend(std::iter::repeat_with(Vec::new).take(width))
                }
                Some(_) => {}
                None => variable = variable.or(Some(name)),
            }
            continue;
        };

        if let Some(previous) = variable {
            return Err(AbiError::encode(format!(
                "cannot filter on `{name}` after variable-length key `{previous}`"
            )));
        }

        match arg {
            // The exact encoding is known, so even a variable-length key fixes the positions.
            ArgFilter::Eq(value) => {
                let felts = encode_value(value, &field.member.ty, abi).map_err(|e| e.at(name))?;
                compiled.keys.extend(felts.into_iter().map(|felt| vec![felt]));
            }
            ArgFilter::AnyOf(values) => {
                if width != Some(1) {
                    return Err(AbiError::encode(format!(
                        "{name}: OR arrays not supported for multi-felt indexed keys"
                    )));
                }
                let mut accepted = Vec::with_capacity(values.len());
                for (i, value) in values.iter().enumerate() {
                    let felts = encode_value(value, &field.member.ty, abi)
                        .map_err(|e| e.at(&format!("{name}[{i}]")))?;
                    accepted.extend(felts);
                }
                compiled.keys.push(accepted);
            }
        }
    }

    while compiled.keys.last().is_some_and(Vec::is_empty) {
        compiled.keys.pop();
    }

    trace!(target: "abi::events", event = %def.name, positions = compiled.keys.len(), "Compiled event filter.");
    Ok(compiled)
}
