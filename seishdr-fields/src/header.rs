//! The raw header buffer of one record.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::error::{FieldsError, Result};
use crate::schema::{FieldSlot, HeaderSchema};
use crate::types::FieldKind;

/// Numeric slots plus the fixed-width character area of one record header.
///
/// The resolver only reads headers. The setters here exist for the record
/// layer and for building fixtures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHeader {
    slots: Vec<f64>,
    text: Vec<u8>,
}

impl RawHeader {
    pub fn new(slots: Vec<f64>, text: Vec<u8>) -> Self {
        Self { slots, text }
    }

    /// A header sized for `schema` with every field unset.
    pub fn undefined(schema: &HeaderSchema) -> Self {
        let mut text = vec![b' '; schema.text_len()];
        for (_, slot) in schema.stored_fields() {
            if let FieldSlot::Text(range) = slot {
                let pattern = schema.undefined_text_bytes(range_len(range));
                text[range.clone()].copy_from_slice(&pattern);
            }
        }
        Self {
            slots: vec![schema.undefined(); schema.slot_count()],
            text,
        }
    }

    pub fn slots(&self) -> &[f64] {
        &self.slots
    }

    pub fn text(&self) -> &[u8] {
        &self.text
    }

    pub fn slot(&self, index: usize) -> Option<f64> {
        self.slots.get(index).copied()
    }

    pub fn bytes(&self, range: &RangeInclusive<usize>) -> Option<&[u8]> {
        self.text.get(range.clone())
    }

    /// Store a numeric, enumerated or logical slot by field name.
    pub fn set_number(&mut self, schema: &HeaderSchema, name: &str, value: f64) -> Result<()> {
        let index = match lookup(schema, name)? {
            FieldSlot::Numeric(i) | FieldSlot::Enum(i) | FieldSlot::Logical(i) => *i,
            FieldSlot::Text(_) => {
                return Err(FieldsError::FieldKindMismatch {
                    name: name.to_string(),
                    expected: FieldKind::Numeric,
                    actual: FieldKind::Text,
                })
            }
        };
        let slot = self
            .slots
            .get_mut(index)
            .ok_or_else(|| FieldsError::SlotOutOfBounds {
                name: name.to_string(),
                slot: index,
                slot_count: schema.slot_count(),
            })?;
        *slot = value;
        Ok(())
    }

    /// Store an enumerated field by identifier (`"itime"`).
    pub fn set_enum(&mut self, schema: &HeaderSchema, name: &str, id: &str) -> Result<()> {
        match lookup(schema, name)? {
            FieldSlot::Enum(_) => {}
            other => {
                return Err(FieldsError::FieldKindMismatch {
                    name: name.to_string(),
                    expected: FieldKind::Enum,
                    actual: other.kind(),
                })
            }
        }
        let code = schema
            .enum_table()
            .code_of(id)
            .ok_or_else(|| FieldsError::UnknownEnumId { id: id.to_string() })?;
        self.set_number(schema, name, code as f64)
    }

    /// Store a string field, space-padded or cut to the field width.
    pub fn set_text(&mut self, schema: &HeaderSchema, name: &str, value: &str) -> Result<()> {
        let range = match lookup(schema, name)? {
            FieldSlot::Text(range) => range.clone(),
            other => {
                return Err(FieldsError::FieldKindMismatch {
                    name: name.to_string(),
                    expected: FieldKind::Text,
                    actual: other.kind(),
                })
            }
        };
        let width = range_len(&range);
        let target = self
            .text
            .get_mut(range.clone())
            .ok_or_else(|| FieldsError::RangeOutOfBounds {
                name: name.to_string(),
                start: *range.start(),
                end: *range.end(),
                text_len: schema.text_len(),
            })?;
        let mut padded = value.as_bytes().to_vec();
        padded.resize(width, b' ');
        target.copy_from_slice(&padded);
        Ok(())
    }
}

fn lookup<'a>(schema: &'a HeaderSchema, name: &str) -> Result<&'a FieldSlot> {
    schema
        .field(name)
        .ok_or_else(|| FieldsError::FieldNotFound {
            name: name.to_string(),
        })
}

pub(crate) fn range_len(range: &RangeInclusive<usize>) -> usize {
    range.end() - range.start() + 1
}
