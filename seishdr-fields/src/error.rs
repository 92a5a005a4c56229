//! Error types for the header field registry
//!
//! These are the fatal, construction-time failures. Per-field outcomes such
//! as undefined or invalid values are [`crate::Resolution`] values, never errors.

use seishdr_common::{ErrorSeverity, Severity};
use seishdr_config::ConfigError;
use thiserror::Error;

use crate::types::FieldKind;

/// Result type for fields operations
pub type Result<T> = std::result::Result<T, FieldsError>;

/// Errors that can occur while building schemas or editing headers
#[derive(Debug, Error)]
pub enum FieldsError {
    /// Field not found by name
    #[error("field not found: {name}")]
    FieldNotFound { name: String },

    /// Field exists but is stored as a different kind
    #[error("field '{name}' is {actual:?}, expected {expected:?}")]
    FieldKindMismatch {
        name: String,
        expected: FieldKind,
        actual: FieldKind,
    },

    /// Name declared twice across the field tables, virtual fields or groups
    #[error("duplicate field name: {name}")]
    DuplicateField { name: String },

    /// Numeric slot past the end of the header
    #[error("field '{name}' uses slot {slot} but the header has {slot_count} slots")]
    SlotOutOfBounds {
        name: String,
        slot: usize,
        slot_count: usize,
    },

    /// Two fields share one numeric slot
    #[error("fields '{name}' and '{other}' both use slot {slot}")]
    SlotOverlap {
        name: String,
        other: String,
        slot: usize,
    },

    /// String range empty or past the end of the character area
    #[error("field '{name}' uses bytes {start}..={end} but the character area has {text_len} bytes")]
    RangeOutOfBounds {
        name: String,
        start: usize,
        end: usize,
        text_len: usize,
    },

    /// Two string fields share bytes
    #[error("string fields '{name}' and '{other}' overlap")]
    RangeOverlap { name: String, other: String },

    /// Enumerated fields declared without identifiers
    #[error("schema declares enumerated fields but the enumeration table is empty")]
    EmptyEnumTable,

    /// Enumeration identifier not in the table
    #[error("unknown enumeration identifier: {id}")]
    UnknownEnumId { id: String },

    /// Group lists a member that is not a field
    #[error("group '{group}' lists unknown field '{member}'")]
    UnknownGroupMember { group: String, member: String },

    /// True and false codes coincide or equal the sentinel
    #[error("logical true/false codes must differ from each other and from the sentinel")]
    InvalidLogicalCodes,

    /// Time-offset field that is not a plain numeric field
    #[error("time field '{name}' is not a numeric field")]
    InvalidTimeField { name: String },

    /// Reference-time component that is not a plain numeric field
    #[error("reference-time component '{name}' is not a numeric field")]
    InvalidReferenceSlots { name: String },

    /// Two schemas registered under one version
    #[error("header version {version} is already registered")]
    DuplicateVersion { version: i32 },

    /// Leap-second table empty or unordered
    #[error("invalid leap-second table: {message}")]
    InvalidLeapSecondTable { message: String },

    /// Schema definition file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be turned into resolver settings
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// YAML schema definition error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl Severity for FieldsError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            // A schema that fails validation cannot resolve any record
            FieldsError::DuplicateField { .. }
            | FieldsError::SlotOutOfBounds { .. }
            | FieldsError::SlotOverlap { .. }
            | FieldsError::RangeOutOfBounds { .. }
            | FieldsError::RangeOverlap { .. }
            | FieldsError::EmptyEnumTable
            | FieldsError::UnknownGroupMember { .. }
            | FieldsError::InvalidLogicalCodes
            | FieldsError::InvalidTimeField { .. }
            | FieldsError::InvalidReferenceSlots { .. }
            | FieldsError::DuplicateVersion { .. }
            | FieldsError::InvalidLeapSecondTable { .. }
            | FieldsError::Yaml(_) => ErrorSeverity::Critical,

            FieldsError::FieldNotFound { .. }
            | FieldsError::FieldKindMismatch { .. }
            | FieldsError::UnknownEnumId { .. }
            | FieldsError::Io(_)
            | FieldsError::Config(_) => ErrorSeverity::Error,
        }
    }
}
