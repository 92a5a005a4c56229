//! Header schemas: the per-version field tables.
//!
//! A [`HeaderSchema`] is immutable once built and is shared by every record
//! that declares its version. Lookup goes through [`HeaderSchema::classify`],
//! which resolves a name once into a [`FieldClass`]; callers then match on
//! the variant instead of probing table after table.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::debug;

use crate::error::{FieldsError, Result};
use crate::header::RawHeader;
use crate::time::LeapSecondTable;
use crate::types::FieldKind;
use crate::virtual_fields::{VirtualField, VirtualRegistry};

/// Schema-wide sentinel for unset numeric, enumerated and logical slots.
pub const DEFAULT_UNDEFINED: f64 = -12345.0;

/// Sentinel text of an unset string field, space-padded to the field width.
pub const DEFAULT_UNDEFINED_TEXT: &str = "-12345";

/// Where a stored field lives in the raw header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSlot {
    Numeric(usize),
    Enum(usize),
    Logical(usize),
    /// Inclusive byte range of the character area.
    Text(RangeInclusive<usize>),
}

impl FieldSlot {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldSlot::Numeric(_) => FieldKind::Numeric,
            FieldSlot::Enum(_) => FieldKind::Enum,
            FieldSlot::Logical(_) => FieldKind::Logical,
            FieldSlot::Text(_) => FieldKind::Text,
        }
    }

    fn slot_index(&self) -> Option<usize> {
        match self {
            FieldSlot::Numeric(i) | FieldSlot::Enum(i) | FieldSlot::Logical(i) => Some(*i),
            FieldSlot::Text(_) => None,
        }
    }
}

/// Result of classifying a name against one schema.
#[derive(Clone, Copy)]
pub enum FieldClass<'a> {
    Stored(&'a FieldSlot),
    Virtual(&'a dyn VirtualField),
}

impl FieldClass<'_> {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldClass::Stored(slot) => slot.kind(),
            FieldClass::Virtual(field) => field.kind(),
        }
    }
}

impl std::fmt::Debug for FieldClass<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldClass::Stored(slot) => f.debug_tuple("Stored").field(slot).finish(),
            FieldClass::Virtual(field) => f.debug_tuple("Virtual").field(&field.name()).finish(),
        }
    }
}

/// Ordered enumeration identifiers; `ids[0]` has code `min_code`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnumTable {
    pub min_code: i64,
    pub ids: Vec<String>,
}

impl EnumTable {
    pub fn new<I, S>(min_code: i64, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            min_code,
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn max_code(&self) -> i64 {
        self.min_code + self.ids.len() as i64 - 1
    }

    pub fn lookup(&self, code: i64) -> Option<&str> {
        let offset = usize::try_from(code.checked_sub(self.min_code)?).ok()?;
        self.ids.get(offset).map(String::as_str)
    }

    pub fn code_of(&self, id: &str) -> Option<i64> {
        let id = id.to_lowercase();
        self.ids
            .iter()
            .position(|candidate| *candidate == id)
            .map(|offset| self.min_code + offset as i64)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// The two codes a logical slot may hold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogicalCodes {
    pub true_code: f64,
    pub false_code: f64,
}

impl Default for LogicalCodes {
    fn default() -> Self {
        Self {
            true_code: 1.0,
            false_code: 0.0,
        }
    }
}

/// Field tables for one header version.
pub struct HeaderSchema {
    version: i32,
    slot_count: usize,
    text_len: usize,
    undefined: f64,
    undefined_text: String,
    logical: LogicalCodes,
    enum_table: EnumTable,
    fields: BTreeMap<String, FieldSlot>,
    virtuals: VirtualRegistry,
    groups: BTreeMap<String, Vec<String>>,
    time_fields: BTreeSet<String>,
    reference_slots: Option<[usize; 6]>,
    leap_seconds: Arc<LeapSecondTable>,
}

impl std::fmt::Debug for HeaderSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeaderSchema")
            .field("version", &self.version)
            .field("slot_count", &self.slot_count)
            .field("text_len", &self.text_len)
            .field("fields", &self.fields.len())
            .field("virtuals", &self.virtuals)
            .field("groups", &self.groups.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl HeaderSchema {
    /// Start a schema for `version` with `slot_count` numeric slots and a
    /// `text_len`-byte character area.
    pub fn builder(version: i32, slot_count: usize, text_len: usize) -> HeaderSchemaBuilder {
        HeaderSchemaBuilder::new(version, slot_count, text_len)
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn text_len(&self) -> usize {
        self.text_len
    }

    pub fn undefined(&self) -> f64 {
        self.undefined
    }

    pub fn is_undefined(&self, value: f64) -> bool {
        value == self.undefined
    }

    /// The string sentinel padded with spaces (or cut) to `width` bytes.
    pub fn undefined_text_bytes(&self, width: usize) -> Vec<u8> {
        let mut bytes = self.undefined_text.as_bytes().to_vec();
        bytes.resize(width, b' ');
        bytes
    }

    pub fn undefined_text(&self) -> &str {
        &self.undefined_text
    }

    pub fn logical_codes(&self) -> LogicalCodes {
        self.logical
    }

    pub fn enum_table(&self) -> &EnumTable {
        &self.enum_table
    }

    pub fn leap_seconds(&self) -> &LeapSecondTable {
        &self.leap_seconds
    }

    /// Slots of `[year, day-of-year, hour, minute, second, millisecond]`.
    pub fn reference_slots(&self) -> Option<[usize; 6]> {
        self.reference_slots
    }

    /// Case-insensitive classification of a bare field name.
    pub fn classify(&self, name: &str) -> Option<FieldClass<'_>> {
        let name = name.to_lowercase();
        if let Some(field) = self.virtuals.get(&name) {
            return Some(FieldClass::Virtual(field));
        }
        self.fields.get(&name).map(FieldClass::Stored)
    }

    /// A stored (non-virtual) field.
    pub fn field(&self, name: &str) -> Option<&FieldSlot> {
        self.fields.get(&name.to_lowercase())
    }

    pub fn stored_fields(&self) -> impl Iterator<Item = (&str, &FieldSlot)> {
        self.fields.iter().map(|(name, slot)| (name.as_str(), slot))
    }

    pub fn virtual_names(&self) -> impl Iterator<Item = &str> {
        self.virtuals.names()
    }

    /// Every name a glob may match: stored fields and virtual fields.
    pub fn candidate_names(&self) -> BTreeSet<&str> {
        self.fields
            .keys()
            .map(String::as_str)
            .chain(self.virtuals.names())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classify(name).is_some()
    }

    pub fn group(&self, name: &str) -> Option<&[String]> {
        self.groups.get(&name.to_lowercase()).map(Vec::as_slice)
    }

    pub fn groups(&self) -> &BTreeMap<String, Vec<String>> {
        &self.groups
    }

    /// Numeric fields holding offsets from the reference time.
    pub fn time_fields(&self) -> &BTreeSet<String> {
        &self.time_fields
    }

    /// Whether a header has the shape this schema describes.
    pub fn fits(&self, header: &RawHeader) -> bool {
        header.slots().len() == self.slot_count && header.text().len() == self.text_len
    }
}

/// Builder for [`HeaderSchema`]. All validation happens in [`build`](Self::build).
pub struct HeaderSchemaBuilder {
    version: i32,
    slot_count: usize,
    text_len: usize,
    undefined: f64,
    undefined_text: String,
    logical: LogicalCodes,
    enum_table: EnumTable,
    fields: Vec<(String, FieldSlot)>,
    virtuals: Vec<Arc<dyn VirtualField>>,
    groups: Vec<(String, Vec<String>)>,
    time_fields: Vec<String>,
    reference: Option<[String; 6]>,
    leap_seconds: Option<Arc<LeapSecondTable>>,
}

impl HeaderSchemaBuilder {
    fn new(version: i32, slot_count: usize, text_len: usize) -> Self {
        Self {
            version,
            slot_count,
            text_len,
            undefined: DEFAULT_UNDEFINED,
            undefined_text: DEFAULT_UNDEFINED_TEXT.to_string(),
            logical: LogicalCodes::default(),
            enum_table: EnumTable::default(),
            fields: Vec::new(),
            virtuals: Vec::new(),
            groups: Vec::new(),
            time_fields: Vec::new(),
            reference: None,
            leap_seconds: None,
        }
    }

    pub fn undefined(mut self, value: f64) -> Self {
        self.undefined = value;
        self
    }

    pub fn undefined_text(mut self, text: impl Into<String>) -> Self {
        self.undefined_text = text.into();
        self
    }

    pub fn logical_codes(mut self, true_code: f64, false_code: f64) -> Self {
        self.logical = LogicalCodes {
            true_code,
            false_code,
        };
        self
    }

    pub fn enum_table(mut self, table: EnumTable) -> Self {
        self.enum_table = table;
        self
    }

    pub fn numeric(self, name: impl Into<String>, slot: usize) -> Self {
        self.field(name, FieldSlot::Numeric(slot))
    }

    pub fn enumerated(self, name: impl Into<String>, slot: usize) -> Self {
        self.field(name, FieldSlot::Enum(slot))
    }

    pub fn logical(self, name: impl Into<String>, slot: usize) -> Self {
        self.field(name, FieldSlot::Logical(slot))
    }

    pub fn text(self, name: impl Into<String>, range: RangeInclusive<usize>) -> Self {
        self.field(name, FieldSlot::Text(range))
    }

    pub fn field(mut self, name: impl Into<String>, slot: FieldSlot) -> Self {
        self.fields.push((name.into().to_lowercase(), slot));
        self
    }

    pub fn virtual_field(mut self, field: Arc<dyn VirtualField>) -> Self {
        self.virtuals.push(field);
        self
    }

    /// Register the built-in reference-time virtual fields.
    pub fn builtin_virtuals(mut self) -> Self {
        self.virtuals.extend(crate::virtual_fields::builtin());
        self
    }

    pub fn group<I, S>(mut self, name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let members = members
            .into_iter()
            .map(|m| m.into().to_lowercase())
            .collect();
        self.groups.push((name.into().to_lowercase(), members));
        self
    }

    pub fn time_fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.time_fields
            .extend(names.into_iter().map(|n| n.into().to_lowercase()));
        self
    }

    /// Name the six numeric fields holding
    /// `[year, day-of-year, hour, minute, second, millisecond]`.
    pub fn reference_fields(mut self, names: [&str; 6]) -> Self {
        self.reference = Some(names.map(str::to_lowercase));
        self
    }

    pub fn leap_seconds(mut self, table: Arc<LeapSecondTable>) -> Self {
        self.leap_seconds = Some(table);
        self
    }

    pub fn build(self) -> Result<HeaderSchema> {
        if self.logical.true_code == self.logical.false_code
            || self.logical.true_code == self.undefined
            || self.logical.false_code == self.undefined
        {
            return Err(FieldsError::InvalidLogicalCodes);
        }

        let mut fields: BTreeMap<String, FieldSlot> = BTreeMap::new();
        let mut slot_owner: BTreeMap<usize, String> = BTreeMap::new();
        let mut ranges: Vec<(RangeInclusive<usize>, String)> = Vec::new();

        for (name, slot) in self.fields {
            if fields.contains_key(&name) {
                return Err(FieldsError::DuplicateField { name });
            }
            if let Some(index) = slot.slot_index() {
                if index >= self.slot_count {
                    return Err(FieldsError::SlotOutOfBounds {
                        name,
                        slot: index,
                        slot_count: self.slot_count,
                    });
                }
                if let Some(other) = slot_owner.insert(index, name.clone()) {
                    return Err(FieldsError::SlotOverlap {
                        name,
                        other,
                        slot: index,
                    });
                }
            }
            if let FieldSlot::Text(range) = &slot {
                if range.is_empty() || *range.end() >= self.text_len {
                    return Err(FieldsError::RangeOutOfBounds {
                        name,
                        start: *range.start(),
                        end: *range.end(),
                        text_len: self.text_len,
                    });
                }
                ranges.push((range.clone(), name.clone()));
            }
            if matches!(slot, FieldSlot::Enum(_)) && self.enum_table.is_empty() {
                return Err(FieldsError::EmptyEnumTable);
            }
            fields.insert(name, slot);
        }

        ranges.sort_by_key(|(range, _)| *range.start());
        if let Some(pair) = ranges.windows(2).find(|w| w[1].0.start() <= w[0].0.end()) {
            return Err(FieldsError::RangeOverlap {
                name: pair[1].1.clone(),
                other: pair[0].1.clone(),
            });
        }

        let mut virtuals = VirtualRegistry::default();
        for field in self.virtuals {
            let name = field.name().to_lowercase();
            if fields.contains_key(&name) {
                return Err(FieldsError::DuplicateField { name });
            }
            virtuals.insert(field)?;
        }

        let mut groups = BTreeMap::new();
        for (name, members) in self.groups {
            if fields.contains_key(&name) || virtuals.get(&name).is_some() || groups.contains_key(&name) {
                return Err(FieldsError::DuplicateField { name });
            }
            if let Some(member) = members
                .iter()
                .find(|m| !fields.contains_key(*m) && virtuals.get(m).is_none())
            {
                return Err(FieldsError::UnknownGroupMember {
                    group: name,
                    member: member.clone(),
                });
            }
            groups.insert(name, members);
        }

        let time_fields: BTreeSet<String> = self.time_fields.into_iter().collect();
        if let Some(name) = time_fields
            .iter()
            .find(|n| !matches!(fields.get(*n), Some(FieldSlot::Numeric(_))))
        {
            return Err(FieldsError::InvalidTimeField { name: name.clone() });
        }

        let reference_slots = match self.reference {
            Some(names) => {
                let mut slots = [0usize; 6];
                for (slot, name) in slots.iter_mut().zip(names) {
                    match fields.get(&name) {
                        Some(FieldSlot::Numeric(index)) => *slot = *index,
                        _ => return Err(FieldsError::InvalidReferenceSlots { name }),
                    }
                }
                Some(slots)
            }
            None => None,
        };

        debug!(
            version = self.version,
            fields = fields.len(),
            virtuals = virtuals.len(),
            groups = groups.len(),
            "header schema built"
        );

        Ok(HeaderSchema {
            version: self.version,
            slot_count: self.slot_count,
            text_len: self.text_len,
            undefined: self.undefined,
            undefined_text: self.undefined_text,
            logical: self.logical,
            enum_table: self.enum_table,
            fields,
            virtuals,
            groups,
            time_fields,
            reference_slots,
            leap_seconds: self
                .leap_seconds
                .unwrap_or_else(|| Arc::new(LeapSecondTable::builtin())),
        })
    }
}
