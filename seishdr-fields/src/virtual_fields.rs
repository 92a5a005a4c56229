//! Computed fields derived from stored header slots.
//!
//! Every built-in virtual field reads the record's reference time, so they
//! share one evaluation step ([`evaluate_reference`]) and differ only in how
//! they present it.

use chrono::Datelike;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{FieldsError, Result};
use crate::header::RawHeader;
use crate::schema::HeaderSchema;
use crate::time::{month_abbreviation, ReferenceTime};
use crate::types::{FieldKind, Resolution, TimeForm, TimeScale, TimeStamp, Value};

/// A field computed from the header rather than read from one slot.
///
/// Evaluation must not fail on any header content: bad input becomes an
/// undefined or missing-reference outcome.
pub trait VirtualField: Send + Sync {
    /// Lower-case field name.
    fn name(&self) -> &str;

    fn kind(&self) -> FieldKind;

    fn evaluate(&self, schema: &HeaderSchema, header: &RawHeader) -> Resolution;
}

/// Virtual fields of one schema, keyed by name.
#[derive(Default, Clone)]
pub struct VirtualRegistry {
    fields: BTreeMap<String, Arc<dyn VirtualField>>,
}

impl VirtualRegistry {
    pub fn insert(&mut self, field: Arc<dyn VirtualField>) -> Result<()> {
        let name = field.name().to_lowercase();
        if self.fields.contains_key(&name) {
            return Err(FieldsError::DuplicateField { name });
        }
        self.fields.insert(name, field);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn VirtualField> {
        self.fields.get(name).map(|field| field.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl std::fmt::Debug for VirtualRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.fields.keys()).finish()
    }
}

/// The reference time of one record as the virtual fields see it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceEvaluation {
    /// `[year, doy, hour, minute, seconds]`, or all sentinels.
    pub vector: [f64; 5],
    /// The six stored slots, or all sentinels.
    pub slots: [f64; 6],
    pub good: bool,
    pub time: Option<ReferenceTime>,
}

/// Read and validate the six reference slots of `header`.
pub fn evaluate_reference(schema: &HeaderSchema, header: &RawHeader) -> ReferenceEvaluation {
    let undefined = schema.undefined();
    let time = schema.reference_slots().and_then(|indices| {
        let raw = indices.map(|i| header.slot(i).unwrap_or(f64::NAN));
        ReferenceTime::from_slots(raw, undefined)
    });
    match time {
        Some(time) => ReferenceEvaluation {
            vector: time.to_vector(),
            slots: time.to_slots(),
            good: true,
            time: Some(time),
        },
        None => ReferenceEvaluation {
            vector: [undefined; 5],
            slots: [undefined; 6],
            good: false,
            time: None,
        },
    }
}

/// The record's reference time, if valid.
pub fn reference_time(schema: &HeaderSchema, header: &RawHeader) -> Option<ReferenceTime> {
    evaluate_reference(schema, header).time
}

/// The reference time itself, as the `z` field.
#[derive(Debug, Default)]
pub struct ReferenceTimeField;

impl VirtualField for ReferenceTimeField {
    fn name(&self) -> &str {
        "z"
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Numeric
    }

    fn evaluate(&self, schema: &HeaderSchema, header: &RawHeader) -> Resolution {
        let reference = evaluate_reference(schema, header);
        let vector = Value::Vector(reference.vector.to_vec());
        if reference.good {
            Resolution::defined(vector)
        } else {
            Resolution::undefined(vector)
        }
    }
}

/// The six stored reference slots, as the `z6` field.
#[derive(Debug, Default)]
pub struct ReferenceSlotsField;

impl VirtualField for ReferenceSlotsField {
    fn name(&self) -> &str {
        "z6"
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Numeric
    }

    fn evaluate(&self, schema: &HeaderSchema, header: &RawHeader) -> Resolution {
        let reference = evaluate_reference(schema, header);
        let slots = Value::Vector(reference.slots.to_vec());
        if reference.good {
            Resolution::defined(slots)
        } else {
            Resolution::undefined(slots)
        }
    }
}

type Derive = fn(&HeaderSchema, &ReferenceTime) -> Value;

/// A virtual field computed from a valid reference time.
///
/// Records without one resolve to undefined, except absolute-time fields,
/// which report a missing reference time.
pub struct DerivedField {
    name: &'static str,
    kind: FieldKind,
    derive: Derive,
}

impl DerivedField {
    pub const fn new(name: &'static str, kind: FieldKind, derive: Derive) -> Self {
        Self { name, kind, derive }
    }

    fn unavailable(&self, schema: &HeaderSchema) -> Resolution {
        match self.kind {
            FieldKind::AbsoluteTime => Resolution::MissingReferenceTime {
                raw: Value::Number(0.0),
            },
            FieldKind::Text => {
                Resolution::undefined(Value::Text(schema.undefined_text().to_string()))
            }
            _ => Resolution::undefined(Value::Number(schema.undefined())),
        }
    }
}

impl std::fmt::Debug for DerivedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedField")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

impl VirtualField for DerivedField {
    fn name(&self) -> &str {
        self.name
    }

    fn kind(&self) -> FieldKind {
        self.kind
    }

    fn evaluate(&self, schema: &HeaderSchema, header: &RawHeader) -> Resolution {
        match reference_time(schema, header) {
            Some(time) => match (self.derive)(schema, &time) {
                Value::Number(n) if !n.is_finite() => self.unavailable(schema),
                value => Resolution::defined(value),
            },
            None => self.unavailable(schema),
        }
    }
}

fn reference_month(_: &HeaderSchema, time: &ReferenceTime) -> Value {
    Value::Number(time.date().map_or(f64::NAN, |d| f64::from(d.month())))
}

fn reference_day(_: &HeaderSchema, time: &ReferenceTime) -> Value {
    Value::Number(time.date().map_or(f64::NAN, |d| f64::from(d.day())))
}

// "FEB 14 (045), 2009"
fn reference_date_text(_: &HeaderSchema, time: &ReferenceTime) -> Value {
    let text = time
        .date()
        .and_then(|date| {
            let month = month_abbreviation(date.month())?;
            Some(format!(
                "{month} {:02} ({:03}), {:04}",
                date.day(),
                date.ordinal(),
                date.year()
            ))
        })
        .unwrap_or_default();
    Value::Text(text)
}

fn reference_clock_text(_: &HeaderSchema, time: &ReferenceTime) -> Value {
    Value::Text(format!(
        "{:02}:{:02}:{:02}.{:03}",
        time.hour, time.minute, time.second, time.millisecond
    ))
}

fn reference_instant(_: &HeaderSchema, time: &ReferenceTime) -> Value {
    match time.instant() {
        Ok(instant) => Value::Time(TimeStamp {
            time: instant,
            scale: TimeScale::Utc,
            form: TimeForm::DayOfYear,
        }),
        Err(_) => Value::Number(f64::NAN),
    }
}

/// The virtual fields every built-in schema carries.
pub fn builtin() -> Vec<Arc<dyn VirtualField>> {
    vec![
        Arc::new(ReferenceTimeField),
        Arc::new(ReferenceSlotsField),
        Arc::new(DerivedField::new("nzmonth", FieldKind::Numeric, reference_month)),
        Arc::new(DerivedField::new("nzcday", FieldKind::Numeric, reference_day)),
        Arc::new(DerivedField::new("kzdate", FieldKind::Text, reference_date_text)),
        Arc::new(DerivedField::new("kztime", FieldKind::Text, reference_clock_text)),
        Arc::new(DerivedField::new("zutc", FieldKind::AbsoluteTime, reference_instant)),
    ]
}
