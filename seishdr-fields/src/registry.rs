//! SchemaRegistry: every known header version, keyed by version tag.
//!
//! The registry is immutable once handed to a resolver. Additional versions
//! may be declared as YAML ([`SchemaDef`]) and go through the same builder
//! validation as the built-in ones.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::error::{FieldsError, Result};
use crate::expand::expand_across;
use crate::schema::{
    EnumTable, HeaderSchema, LogicalCodes, DEFAULT_UNDEFINED, DEFAULT_UNDEFINED_TEXT,
};
use crate::time::LeapSecondTable;
use crate::versions;

/// One stored field of a [`SchemaDef`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FieldDef {
    Numeric { name: String, slot: usize },
    Enum { name: String, slot: usize },
    Logical { name: String, slot: usize },
    /// Inclusive byte range `start..=end` of the character area.
    Text { name: String, start: usize, end: usize },
}

fn default_undefined() -> f64 {
    DEFAULT_UNDEFINED
}

fn default_undefined_text() -> String {
    DEFAULT_UNDEFINED_TEXT.to_string()
}

fn default_true() -> bool {
    true
}

/// A header version declared as data.
///
/// ```yaml
/// version: 101
/// slot_count: 4
/// text_len: 8
/// enum_table: { min_code: 0, ids: [itime, ixy] }
/// fields:
///   - { kind: numeric, name: b, slot: 0 }
///   - { kind: enum, name: iftype, slot: 1 }
///   - { kind: text, name: kstnm, start: 0, end: 7 }
/// time_fields: [b]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDef {
    pub version: i32,
    pub slot_count: usize,
    #[serde(default)]
    pub text_len: usize,
    #[serde(default = "default_undefined")]
    pub undefined: f64,
    #[serde(default = "default_undefined_text")]
    pub undefined_text: String,
    #[serde(default)]
    pub logical_codes: LogicalCodes,
    #[serde(default)]
    pub enum_table: EnumTable,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub time_fields: Vec<String>,
    /// `[year, day-of-year, hour, minute, second, millisecond]` fields.
    #[serde(default)]
    pub reference_fields: Option<[String; 6]>,
    /// Register `z`, `kzdate` and the other reference-time fields.
    #[serde(default = "default_true")]
    pub builtin_virtuals: bool,
}

impl SchemaDef {
    pub fn build(self, leap: Arc<LeapSecondTable>) -> Result<HeaderSchema> {
        let mut builder = HeaderSchema::builder(self.version, self.slot_count, self.text_len)
            .undefined(self.undefined)
            .undefined_text(self.undefined_text)
            .logical_codes(self.logical_codes.true_code, self.logical_codes.false_code)
            .enum_table(self.enum_table)
            .leap_seconds(leap);

        for field in self.fields {
            builder = match field {
                FieldDef::Numeric { name, slot } => builder.numeric(name, slot),
                FieldDef::Enum { name, slot } => builder.enumerated(name, slot),
                FieldDef::Logical { name, slot } => builder.logical(name, slot),
                FieldDef::Text { name, start, end } => builder.text(name, start..=end),
            };
        }
        for (name, members) in self.groups {
            builder = builder.group(name, members);
        }
        builder = builder.time_fields(self.time_fields);
        if let Some(names) = &self.reference_fields {
            builder = builder.reference_fields(names.each_ref().map(String::as_str));
        }
        if self.builtin_virtuals {
            builder = builder.builtin_virtuals();
        }
        builder.build()
    }
}

/// Header schemas by version.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<i32, Arc<HeaderSchema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Versions 6 and 7 sharing one leap-second table.
    pub fn builtin(leap: Arc<LeapSecondTable>) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(versions::version_6(Arc::clone(&leap))?)?;
        registry.register(versions::version_7(leap)?)?;
        Ok(registry)
    }

    pub fn register(&mut self, schema: HeaderSchema) -> Result<()> {
        let version = schema.version();
        if self.schemas.contains_key(&version) {
            return Err(FieldsError::DuplicateVersion { version });
        }
        debug!(
            version,
            slots = schema.slot_count(),
            groups = schema.groups().len(),
            "registered header schema"
        );
        self.schemas.insert(version, Arc::new(schema));
        Ok(())
    }

    /// Parse a [`SchemaDef`] and register it. Returns the new version.
    pub fn load_yaml(&mut self, yaml: &str, leap: Arc<LeapSecondTable>) -> Result<i32> {
        let def: SchemaDef = serde_yaml_ng::from_str(yaml)?;
        let schema = def.build(leap)?;
        let version = schema.version();
        self.register(schema)?;
        Ok(version)
    }

    /// Register every `*.yaml` schema definition in `dir`, in file-name
    /// order. Any invalid definition fails the whole load.
    pub fn load_dir(&mut self, dir: &Path, leap: Arc<LeapSecondTable>) -> Result<Vec<i32>> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("yaml") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut loaded = Vec::with_capacity(paths.len());
        for path in paths {
            let content = std::fs::read_to_string(&path)?;
            let version = self.load_yaml(&content, Arc::clone(&leap))?;
            debug!(?path, version, "loaded schema definition");
            loaded.push(version);
        }
        Ok(loaded)
    }

    pub fn get(&self, version: i32) -> Option<&Arc<HeaderSchema>> {
        self.schemas.get(&version)
    }

    pub fn versions(&self) -> impl Iterator<Item = i32> + '_ {
        self.schemas.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Versions whose schema knows the bare field `name`.
    pub fn versions_with_field(&self, name: &str) -> Vec<i32> {
        self.schemas
            .iter()
            .filter(|(_, schema)| schema.contains(name))
            .map(|(version, _)| *version)
            .collect()
    }

    /// `request` expanded against every registered version.
    pub fn expand_all(&self, request: &str) -> Vec<String> {
        let schemas: Vec<&HeaderSchema> = self.schemas.values().map(Arc::as_ref).collect();
        expand_across(&schemas, request)
    }
}
