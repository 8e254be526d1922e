use std::collections::{HashMap, HashSet};

use cairo_abi_primitives::hash::{get_event_selector, get_selector_from_name};
use cairo_abi_primitives::Felt252;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, trace};

use crate::abi::{
    AbiEntry, AbiEnum, AbiEvent, AbiEventField, AbiEventFieldKind, AbiEventKind, AbiFunction,
    AbiParam, AbiStruct, StateMutability,
};
use crate::error::{AbiError, AbiResult};
use crate::types::{parse_type, ParsedType, TypeNames};

/// A named, typed slot: a function input, a struct member or an enum variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    /// The type as written in the ABI.
    pub type_name: String,
    pub ty: ParsedType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Function,
    Constructor,
    L1Handler,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    pub name: String,
    pub kind: FunctionKind,
    pub selector: Felt252,
    pub inputs: Vec<Member>,
    pub outputs: Vec<ParsedType>,
    pub state_mutability: Option<StateMutability>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDef {
    pub name: String,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDef {
    pub name: String,
    /// Variants in declaration order; the position is the variant index on the wire.
    pub variants: Vec<Member>,
}

impl EnumDef {
    pub fn variant(&self, name: &str) -> Option<(usize, &Member)> {
        self.variants.iter().enumerate().find(|(_, variant)| variant.name == name)
    }
}

/// Where an event member is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventFieldKind {
    Key,
    Data,
    Nested,
    Flat,
}

impl From<AbiEventFieldKind> for EventFieldKind {
    fn from(kind: AbiEventFieldKind) -> Self {
        match kind {
            AbiEventFieldKind::Key => Self::Key,
            AbiEventFieldKind::Data => Self::Data,
            AbiEventFieldKind::Nested => Self::Nested,
            AbiEventFieldKind::Flat => Self::Flat,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventField {
    pub member: Member,
    pub kind: EventFieldKind,
}

/// A variant of an enum event. Its type names another event of the ABI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventVariant {
    pub name: String,
    pub event: String,
    pub kind: EventFieldKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventLayout {
    /// Members split between the `keys` and `data` streams.
    Struct(Vec<EventField>),
    /// A dispatch enum over other events.
    Enum(Vec<EventVariant>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDef {
    pub name: String,
    pub selector: Felt252,
    pub layout: EventLayout,
}

/// The indexed view of an ABI.
///
/// Functions (including constructors and l1 handlers), events, structs and enums are indexed by
/// name; functions and events also by selector. Every type reference has been parsed and
/// resolved, so encoding against a `ParsedAbi` never has to re-read type strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedAbi {
    functions: IndexMap<String, FunctionDef>,
    function_selectors: HashMap<Felt252, String>,
    events: IndexMap<String, EventDef>,
    event_selectors: HashMap<Felt252, String>,
    structs: IndexMap<String, StructDef>,
    enums: IndexMap<String, EnumDef>,
}

impl ParsedAbi {
    pub fn function(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name)
    }

    pub fn function_by_selector(&self, selector: &Felt252) -> Option<&FunctionDef> {
        self.function_selectors.get(selector).and_then(|name| self.functions.get(name))
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionDef> {
        self.functions.values()
    }

    pub fn event(&self, name: &str) -> Option<&EventDef> {
        self.events.get(name)
    }

    pub fn event_by_selector(&self, selector: &Felt252) -> Option<&EventDef> {
        self.event_selectors.get(selector).and_then(|name| self.events.get(name))
    }

    /// Resolves an event by full name, by `0x` selector (any case), or by bare name.
    pub fn find_event(&self, name_or_selector: &str) -> Option<&EventDef> {
        let needle = name_or_selector.trim();
        if needle.starts_with("0x") || needle.starts_with("0X") {
            return Felt252::from_hex(needle).ok().and_then(|s| self.event_by_selector(&s));
        }
        self.event(needle).or_else(|| self.event_by_selector(&get_event_selector(needle)))
    }

    pub fn events(&self) -> impl Iterator<Item = &EventDef> {
        self.events.values()
    }

    pub fn struct_def(&self, name: &str) -> Option<&StructDef> {
        self.structs.get(name)
    }

    pub fn enum_def(&self, name: &str) -> Option<&EnumDef> {
        self.enums.get(name)
    }
}

impl TypeNames for ParsedAbi {
    fn is_struct(&self, name: &str) -> bool {
        self.structs.contains_key(name)
    }

    fn is_enum(&self, name: &str) -> bool {
        self.enums.contains_key(name)
    }
}

/// Parses a raw ABI: a JSON array of entries, or a string holding one.
pub fn parse_abi(abi: &Value) -> AbiResult<ParsedAbi> {
    match abi {
        Value::String(raw) => parse_abi_str(raw),
        Value::Array(entries) => parse_entries(entries),
        other => Err(AbiError::invalid_abi(format!("expected an array of entries, got {other}"))),
    }
}

pub fn parse_abi_str(raw: &str) -> AbiResult<ParsedAbi> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| AbiError::invalid_abi(format!("ABI is not valid JSON: {e}")))?;
    match value {
        Value::Array(entries) => parse_entries(&entries),
        _ => Err(AbiError::invalid_abi("expected an array of entries")),
    }
}

fn parse_entries(raw: &[Value]) -> AbiResult<ParsedAbi> {
    let mut entries = Vec::with_capacity(raw.len());
    collect_entries(raw, &mut entries)?;

    // Types can be referenced before they're declared, so register every name first.
    let names = DeclaredNames {
        structs: entries
            .iter()
            .filter_map(|e| match e {
                AbiEntry::Struct(s) => Some(s.name.clone()),
                _ => None,
            })
            .collect(),
        enums: entries
            .iter()
            .filter_map(|e| match e {
                AbiEntry::Enum(e) => Some(e.name.clone()),
                _ => None,
            })
            .collect(),
        events: entries
            .iter()
            .filter_map(|e| match e {
                AbiEntry::Event(e) => Some(e.name.clone()),
                _ => None,
            })
            .collect(),
    };

    let mut abi = ParsedAbi::default();
    for entry in entries {
        match entry {
            AbiEntry::Function(f) => abi.add_function(f, FunctionKind::Function, &names)?,
            AbiEntry::Constructor(f) => abi.add_function(f, FunctionKind::Constructor, &names)?,
            AbiEntry::L1Handler(f) => abi.add_function(f, FunctionKind::L1Handler, &names)?,
            AbiEntry::Event(e) => abi.add_event(e, &names)?,
            AbiEntry::Struct(s) => abi.add_struct(s, &names)?,
            AbiEntry::Enum(e) => abi.add_enum(e, &names)?,
            AbiEntry::Interface(_) | AbiEntry::Impl(_) => {}
        }
    }

    debug!(
        target: "abi",
        functions = abi.functions.len(),
        events = abi.events.len(),
        structs = abi.structs.len(),
        enums = abi.enums.len(),
        "Parsed ABI."
    );

    Ok(abi)
}

/// Deserializes the known entries, flattening interfaces and skipping unknown entry types.
fn collect_entries(raw: &[Value], out: &mut Vec<AbiEntry>) -> AbiResult<()> {
    for (index, value) in raw.iter().enumerate() {
        let ty = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| AbiError::invalid_abi(format!("entry {index} has no `type` field")))?;

        if !AbiEntry::KNOWN_TYPES.contains(&ty) {
            trace!(target: "abi", %ty, index, "Skipping unknown ABI entry.");
            continue;
        }

        let entry: AbiEntry = serde_json::from_value(value.clone())
            .map_err(|e| AbiError::invalid_abi(format!("malformed `{ty}` entry {index}: {e}")))?;

        match entry {
            AbiEntry::Interface(interface) => collect_entries(&interface.items, out)?,
            entry => out.push(entry),
        }
    }
    Ok(())
}

struct DeclaredNames {
    structs: HashSet<String>,
    enums: HashSet<String>,
    events: HashSet<String>,
}

impl TypeNames for DeclaredNames {
    fn is_struct(&self, name: &str) -> bool {
        self.structs.contains(name)
    }

    fn is_enum(&self, name: &str) -> bool {
        self.enums.contains(name)
    }
}

fn parse_members(params: &[AbiParam], names: &DeclaredNames) -> AbiResult<Vec<Member>> {
    params
        .iter()
        .map(|param| {
            Ok(Member {
                name: param.name.clone(),
                type_name: param.ty.clone(),
                ty: parse_type(&param.ty, names)?,
            })
        })
        .collect()
}

fn parse_event_fields(fields: &[AbiEventField], names: &DeclaredNames) -> AbiResult<Vec<EventField>> {
    fields
        .iter()
        .map(|field| {
            Ok(EventField {
                member: Member {
                    name: field.name.clone(),
                    type_name: field.ty.clone(),
                    ty: parse_type(&field.ty, names)?,
                },
                kind: field.kind.into(),
            })
        })
        .collect()
}

fn parse_event_variants(
    variants: &[AbiEventField],
    names: &DeclaredNames,
) -> AbiResult<Vec<EventVariant>> {
    variants
        .iter()
        .map(|variant| {
            if !names.events.contains(&variant.ty) {
                return Err(AbiError::invalid_abi(format!(
                    "variant `{}` refers to unknown event `{}`",
                    variant.name, variant.ty
                )));
            }
            Ok(EventVariant {
                name: variant.name.clone(),
                event: variant.ty.clone(),
                kind: variant.kind.into(),
            })
        })
        .collect()
}

fn with_kind(members: Vec<Member>, kind: EventFieldKind) -> impl Iterator<Item = EventField> {
    members.into_iter().map(move |member| EventField { member, kind })
}

impl ParsedAbi {
    fn add_function(
        &mut self,
        function: AbiFunction,
        kind: FunctionKind,
        names: &DeclaredNames,
    ) -> AbiResult<()> {
        let inputs = parse_members(&function.inputs, names)
            .map_err(|e| e.at(&function.name))?;
        let outputs = function
            .outputs
            .iter()
            .map(|output| parse_type(&output.ty, names))
            .collect::<AbiResult<Vec<_>>>()
            .map_err(|e| e.at(&function.name))?;

        let selector = get_selector_from_name(&function.name);
        let def = FunctionDef {
            name: function.name.clone(),
            kind,
            selector,
            inputs,
            outputs,
            state_mutability: function.state_mutability,
        };

        self.function_selectors.entry(selector).or_insert_with(|| function.name.clone());
        if self.functions.insert(function.name.clone(), def).is_some() {
            debug!(target: "abi", name = %function.name, "Duplicate function in ABI, keeping the last.");
        }
        Ok(())
    }

    fn add_event(&mut self, event: AbiEvent, names: &DeclaredNames) -> AbiResult<()> {
        let name = event.name.clone();
        let layout = match event.kind {
            Some(AbiEventKind::Struct) => {
                let members = event.members.ok_or_else(|| {
                    AbiError::invalid_abi(format!("struct event `{name}` has no `members`"))
                })?;
                EventLayout::Struct(parse_event_fields(&members, names).map_err(|e| e.at(&name))?)
            }
            Some(AbiEventKind::Enum) => {
                let variants = event.variants.ok_or_else(|| {
                    AbiError::invalid_abi(format!("enum event `{name}` has no `variants`"))
                })?;
                EventLayout::Enum(parse_event_variants(&variants, names).map_err(|e| e.at(&name))?)
            }
            None if event.keys.is_some() || event.data.is_some() => {
                let keys = parse_members(event.keys.as_deref().unwrap_or_default(), names);
                let data = parse_members(event.data.as_deref().unwrap_or_default(), names);
                let fields = with_kind(keys.map_err(|e| e.at(&name))?, EventFieldKind::Key)
                    .chain(with_kind(data.map_err(|e| e.at(&name))?, EventFieldKind::Data))
                    .collect();
                EventLayout::Struct(fields)
            }
            None => {
                let inputs = event.inputs.ok_or_else(|| {
                    AbiError::invalid_abi(format!("event `{name}` has neither `kind` nor `inputs`"))
                })?;
                let data = parse_members(&inputs, names).map_err(|e| e.at(&name))?;
                EventLayout::Struct(with_kind(data, EventFieldKind::Data).collect())
            }
        };

        let selector = get_event_selector(&name);
        if let Some(existing) = self.event_selectors.get(&selector) {
            debug!(target: "abi", %name, %existing, "Event selector already taken, indexing by name only.");
        } else {
            self.event_selectors.insert(selector, name.clone());
        }

        self.events.insert(name.clone(), EventDef { name, selector, layout });
        Ok(())
    }

    fn add_struct(&mut self, def: AbiStruct, names: &DeclaredNames) -> AbiResult<()> {
        let members = parse_members(&def.members, names).map_err(|e| e.at(&def.name))?;
        self.structs.insert(def.name.clone(), StructDef { name: def.name, members });
        Ok(())
    }

    fn add_enum(&mut self, def: AbiEnum, names: &DeclaredNames) -> AbiResult<()> {
        let variants = parse_members(&def.variants, names).map_err(|e| e.at(&def.name))?;
        self.enums.insert(def.name.clone(), EnumDef { name: def.name, variants });
        Ok(())
    }
}
