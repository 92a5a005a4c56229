//! Field kinds, values and per-field resolution outcomes.
//!
//! Everything a resolution produces is a value of these types, including the
//! "not a field", undefined and invalid outcomes, so one bad field never
//! aborts a batch.

use serde::{Deserialize, Serialize};

use crate::time::AbsoluteTime;

/// How a field's value is stored and rendered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    Numeric,
    Enum,
    Logical,
    Text,
    AbsoluteTime,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldKind::Numeric => "numeric",
            FieldKind::Enum => "enum",
            FieldKind::Logical => "logical",
            FieldKind::Text => "text",
            FieldKind::AbsoluteTime => "absolute-time",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TimeScale {
    Utc,
    Tai,
}

/// Component layout of an absolute-time value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TimeForm {
    /// `[year, day-of-year, hour, minute, seconds]`
    DayOfYear,
    /// `[year, month, day, hour, minute, seconds]`
    Calendar,
}

/// An absolute time together with the scale and layout it was requested in.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TimeStamp {
    pub time: AbsoluteTime,
    pub scale: TimeScale,
    pub form: TimeForm,
}

impl TimeStamp {
    pub fn components(&self) -> Vec<f64> {
        match self.form {
            TimeForm::DayOfYear => self.time.day_of_year_vector().to_vec(),
            TimeForm::Calendar => self.time.calendar_vector().to_vec(),
        }
    }

    pub fn display(&self) -> String {
        match self.form {
            TimeForm::DayOfYear => self.time.format_day_of_year(),
            TimeForm::Calendar => self.time.format_calendar(),
        }
    }
}

/// A typed field value, or the raw value behind a non-defined outcome.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum Value {
    Number(f64),
    Vector(Vec<f64>),
    Enum { code: i64, id: String },
    Logical(bool),
    Text(String),
    Time(TimeStamp),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Enum { id, .. } => Some(id),
            _ => None,
        }
    }
}

/// Why a stored value is outside its kind's domain.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "reason", content = "detail", rename_all = "kebab-case")]
pub enum InvalidReason {
    /// Logical slot holding neither code, or an offset the calendar cannot reach.
    OutOfDomain,
    /// Enumerated slot outside the enumeration's code range.
    UnknownCode,
    /// Qualifier that does not apply to this field.
    Qualifier(String),
}

/// Outcome of resolving one concrete field name.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum Resolution {
    Defined { value: Value },
    Undefined { raw: Value },
    Invalid { raw: Value, reason: InvalidReason },
    MissingReferenceTime { raw: Value },
    UnknownField,
    SchemaMismatch { version: i32 },
}

impl Resolution {
    pub fn defined(value: Value) -> Self {
        Resolution::Defined { value }
    }

    pub fn undefined(raw: Value) -> Self {
        Resolution::Undefined { raw }
    }

    pub fn invalid(raw: Value, reason: InvalidReason) -> Self {
        Resolution::Invalid { raw, reason }
    }

    pub fn state(&self) -> FieldState {
        match self {
            Resolution::Defined { .. } => FieldState::Defined,
            Resolution::Undefined { .. } => FieldState::Undefined,
            Resolution::Invalid { .. } => FieldState::Invalid,
            Resolution::MissingReferenceTime { .. } => FieldState::MissingReferenceTime,
            Resolution::UnknownField => FieldState::UnknownField,
            Resolution::SchemaMismatch { .. } => FieldState::SchemaMismatch,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Resolution::Defined { value } => Some(value),
            _ => None,
        }
    }
}

/// Tag of a [`Resolution`], for logging and quick matching.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum FieldState {
    Defined,
    Undefined,
    Invalid,
    MissingReferenceTime,
    UnknownField,
    SchemaMismatch,
}

impl std::fmt::Display for FieldState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldState::Defined => "defined",
            FieldState::Undefined => "undefined",
            FieldState::Invalid => "invalid",
            FieldState::MissingReferenceTime => "missing-reference-time",
            FieldState::UnknownField => "unknown-field",
            FieldState::SchemaMismatch => "schema-mismatch",
        };
        f.write_str(name)
    }
}

/// One concrete field as handed to the presentation layer.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResolvedField {
    /// Concrete, lower-cased name including any qualifier (`"t3 utc"`).
    pub name: String,
    /// `None` when the name is not a field of the schema.
    pub kind: Option<FieldKind>,
    pub resolution: Resolution,
    /// Rendered string, already fitted to the display width.
    pub display: String,
}

impl ResolvedField {
    pub fn state(&self) -> FieldState {
        self.resolution.state()
    }

    pub fn value(&self) -> Option<&Value> {
        self.resolution.value()
    }

    pub fn is_defined(&self) -> bool {
        self.state() == FieldState::Defined
    }
}
