//! Field resolution: from a requested name to typed values and display
//! strings.
//!
//! Every concrete field is resolved on its own. Undefined, invalid and
//! unknown fields come back as [`Resolution`] values next to the good ones,
//! so a request never fails as a whole.

use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use seishdr_common::Pretty;
use seishdr_config::{OversizePolicy, ResolverConfig};

use crate::error::Result;
use crate::expand::expand;
use crate::format::{fit, render};
use crate::header::{range_len, RawHeader};
use crate::name::{FieldName, Qualifier};
use crate::registry::SchemaRegistry;
use crate::schema::{FieldClass, FieldSlot, HeaderSchema};
use crate::time::{tai_offset, utc_offset, LeapSecondTable};
use crate::types::{
    FieldKind, InvalidReason, Resolution, ResolvedField, TimeScale, TimeStamp, Value,
};
use crate::virtual_fields::reference_time;

/// Presentation settings applied to every resolved field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    pub display_width: Option<usize>,
    pub oversize: OversizePolicy,
    pub oversize_marker: String,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self::from_config(&ResolverConfig::default())
    }
}

impl ResolveOptions {
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self {
            display_width: config.display_width,
            oversize: config.oversize,
            oversize_marker: config.oversize_marker.clone(),
        }
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.display_width = Some(width);
        self
    }

    pub fn with_oversize(mut self, policy: OversizePolicy, marker: impl Into<String>) -> Self {
        self.oversize = policy;
        self.oversize_marker = marker.into();
        self
    }

    fn finish(&self, name: String, kind: Option<FieldKind>, resolution: Resolution) -> ResolvedField {
        let display = fit(
            &render(&resolution),
            self.display_width,
            self.oversize,
            &self.oversize_marker,
        );
        trace!(field = %name, state = %resolution.state(), "resolved field");
        ResolvedField {
            name,
            kind,
            resolution,
            display,
        }
    }
}

fn invalid_qualifier(qualifier: &str) -> Resolution {
    Resolution::invalid(
        Value::Text(qualifier.to_string()),
        InvalidReason::Qualifier(qualifier.to_string()),
    )
}

fn numeric(schema: &HeaderSchema, raw: f64) -> Resolution {
    if schema.is_undefined(raw) {
        Resolution::undefined(Value::Number(raw))
    } else if !raw.is_finite() {
        Resolution::invalid(Value::Number(raw), InvalidReason::OutOfDomain)
    } else {
        Resolution::defined(Value::Number(raw))
    }
}

fn enumerated(schema: &HeaderSchema, raw: f64) -> Resolution {
    if schema.is_undefined(raw) {
        return Resolution::undefined(Value::Number(raw));
    }
    let table = schema.enum_table();
    let id = (raw.is_finite() && raw.fract() == 0.0)
        .then(|| table.lookup(raw as i64))
        .flatten();
    match id {
        Some(id) => Resolution::defined(Value::Enum {
            code: raw as i64,
            id: id.to_string(),
        }),
        None => Resolution::invalid(Value::Number(raw), InvalidReason::UnknownCode),
    }
}

fn logical(schema: &HeaderSchema, raw: f64) -> Resolution {
    let codes = schema.logical_codes();
    if raw == codes.true_code {
        Resolution::defined(Value::Logical(true))
    } else if raw == codes.false_code {
        Resolution::defined(Value::Logical(false))
    } else if schema.is_undefined(raw) {
        Resolution::undefined(Value::Number(raw))
    } else {
        Resolution::invalid(Value::Number(raw), InvalidReason::OutOfDomain)
    }
}

fn text(schema: &HeaderSchema, bytes: &[u8]) -> Resolution {
    let value = String::from_utf8_lossy(bytes)
        .trim_end_matches([' ', '\0'])
        .to_string();
    if bytes == schema.undefined_text_bytes(bytes.len()).as_slice() {
        Resolution::undefined(Value::Text(value))
    } else {
        Resolution::defined(Value::Text(value))
    }
}

/// Reinterpret a stored offset as an absolute time.
fn absolute_time(
    schema: &HeaderSchema,
    header: &RawHeader,
    raw: f64,
    qualifier: Qualifier,
    leap: &LeapSecondTable,
) -> Resolution {
    if schema.is_undefined(raw) || !raw.is_finite() {
        return Resolution::undefined(Value::Number(raw));
    }
    let Some(reference) = reference_time(schema, header) else {
        return Resolution::MissingReferenceTime {
            raw: Value::Number(raw),
        };
    };
    let time = match qualifier.scale() {
        TimeScale::Utc => utc_offset(&reference, raw),
        TimeScale::Tai => tai_offset(&reference, raw, leap),
    };
    match time {
        Ok(time) => Resolution::defined(Value::Time(TimeStamp {
            time,
            scale: qualifier.scale(),
            form: qualifier.form(),
        })),
        Err(_) => Resolution::invalid(Value::Number(raw), InvalidReason::OutOfDomain),
    }
}

fn resolve_stored(
    schema: &HeaderSchema,
    header: &RawHeader,
    name: &FieldName,
    slot: &FieldSlot,
) -> (FieldKind, Resolution) {
    let raw = |index: usize| header.slot(index).unwrap_or(f64::NAN);
    match (slot, name.qualifier.as_deref()) {
        (FieldSlot::Numeric(index), None) => (FieldKind::Numeric, numeric(schema, raw(*index))),
        (FieldSlot::Numeric(index), Some(qualifier)) => {
            match name.time_qualifier() {
                Some(time) => (
                    FieldKind::AbsoluteTime,
                    absolute_time(schema, header, raw(*index), time, schema.leap_seconds()),
                ),
                None => (FieldKind::Numeric, invalid_qualifier(qualifier)),
            }
        }
        (other, Some(qualifier)) => (other.kind(), invalid_qualifier(qualifier)),
        (FieldSlot::Enum(index), None) => (FieldKind::Enum, enumerated(schema, raw(*index))),
        (FieldSlot::Logical(index), None) => (FieldKind::Logical, logical(schema, raw(*index))),
        (FieldSlot::Text(range), None) => {
            let resolution = match header.bytes(range) {
                Some(bytes) if bytes.len() == range_len(range) => text(schema, bytes),
                _ => Resolution::SchemaMismatch {
                    version: schema.version(),
                },
            };
            (FieldKind::Text, resolution)
        }
    }
}

/// Resolve one concrete (already expanded) name against one record.
pub fn resolve_field(
    schema: &HeaderSchema,
    header: &RawHeader,
    request: &str,
    options: &ResolveOptions,
) -> ResolvedField {
    let Some(name) = FieldName::parse(request) else {
        return options.finish(String::new(), None, Resolution::UnknownField);
    };
    let class = schema.classify(&name.token);
    let kind = class.map(|c| c.kind());

    if !schema.fits(header) {
        let resolution = Resolution::SchemaMismatch {
            version: schema.version(),
        };
        return options.finish(name.to_string(), kind, resolution);
    }

    let (kind, resolution) = match class {
        None => (None, Resolution::UnknownField),
        Some(FieldClass::Virtual(field)) => {
            let resolution = match &name.qualifier {
                Some(qualifier) => invalid_qualifier(qualifier),
                None => field.evaluate(schema, header),
            };
            (Some(field.kind()), resolution)
        }
        Some(FieldClass::Stored(slot)) => {
            let (kind, resolution) = resolve_stored(schema, header, &name, slot);
            (Some(kind), resolution)
        }
    };
    options.finish(name.to_string(), kind, resolution)
}

/// Resolves requests against records of any registered header version.
#[derive(Debug, Clone)]
pub struct FieldResolver {
    registry: Arc<SchemaRegistry>,
    options: ResolveOptions,
}

impl FieldResolver {
    pub fn new(registry: Arc<SchemaRegistry>, options: ResolveOptions) -> Self {
        Self { registry, options }
    }

    /// Built-in versions with the configured leap seconds and display
    /// settings.
    pub fn from_config(config: &ResolverConfig) -> Result<Self> {
        config.validate()?;
        debug!("resolver config: {}", Pretty(config));
        let leap = Arc::new(LeapSecondTable::from_config(config)?);
        let registry = SchemaRegistry::builtin(leap)?;
        Ok(Self::new(
            Arc::new(registry),
            ResolveOptions::from_config(config),
        ))
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Expand `request` and resolve every concrete name against `header`.
    ///
    /// A blank request resolves to nothing. A request that expands to
    /// nothing resolves to a single unknown field.
    pub fn resolve(&self, version: i32, header: &RawHeader, request: &str) -> Vec<ResolvedField> {
        let Some(name) = FieldName::parse(request) else {
            return Vec::new();
        };
        let Some(schema) = self.registry.get(version) else {
            warn!(version, request = %name, "no schema registered for header version");
            let resolution = Resolution::SchemaMismatch { version };
            return vec![self.options.finish(name.to_string(), None, resolution)];
        };

        let names = expand(schema, request);
        if names.is_empty() {
            return vec![self
                .options
                .finish(name.to_string(), None, Resolution::UnknownField)];
        }

        names
            .iter()
            .map(|concrete| self.resolve_concrete(schema, header, concrete))
            .collect()
    }

    fn resolve_concrete(
        &self,
        schema: &HeaderSchema,
        header: &RawHeader,
        concrete: &str,
    ) -> ResolvedField {
        let field = resolve_field(schema, header, concrete, &self.options);
        if !matches!(field.resolution, Resolution::UnknownField) {
            return field;
        }

        let token = concrete.split_whitespace().next().unwrap_or_default();
        let elsewhere = self.registry.versions_with_field(token);
        if elsewhere.is_empty() {
            return field;
        }
        warn!(
            version = schema.version(),
            field = %field.name,
            known_in = ?elsewhere,
            "field is not part of this header version"
        );
        let resolution = Resolution::SchemaMismatch {
            version: schema.version(),
        };
        self.options.finish(field.name, None, resolution)
    }

    /// Resolve one request across many records in parallel. The result for
    /// each record equals what [`resolve`](Self::resolve) returns for it.
    pub fn resolve_batch(
        &self,
        records: &[(i32, RawHeader)],
        request: &str,
    ) -> Vec<Vec<ResolvedField>> {
        records
            .par_iter()
            .map(|(version, header)| self.resolve(*version, header, request))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EnumTable;
    use crate::types::FieldState;

    fn schema() -> HeaderSchema {
        HeaderSchema::builder(1, 10, 8)
            .numeric("b", 0)
            .numeric("stla", 1)
            .enum_table(EnumTable::new(0, ["itime", "ixy"]))
            .enumerated("iftype", 2)
            .logical("leven", 3)
            .numeric("nzyear", 4)
            .numeric("nzjday", 5)
            .numeric("nzhour", 6)
            .numeric("nzmin", 7)
            .numeric("nzsec", 8)
            .numeric("nzmsec", 9)
            .text("kstnm", 0..=7)
            .time_fields(["b"])
            .reference_fields(["nzyear", "nzjday", "nzhour", "nzmin", "nzsec", "nzmsec"])
            .builtin_virtuals()
            .build()
            .unwrap()
    }

    fn header(schema: &HeaderSchema) -> RawHeader {
        let mut header = RawHeader::undefined(schema);
        for (name, value) in [
            ("nzyear", 2009.0),
            ("nzjday", 45.0),
            ("nzhour", 3.0),
            ("nzmin", 15.0),
            ("nzsec", 30.0),
            ("nzmsec", 500.0),
        ] {
            header.set_number(schema, name, value).unwrap();
        }
        header
    }

    fn resolve(schema: &HeaderSchema, header: &RawHeader, name: &str) -> ResolvedField {
        resolve_field(schema, header, name, &ResolveOptions::default())
    }

    #[test]
    fn sentinel_numeric_is_undefined() {
        let schema = schema();
        let field = resolve(&schema, &header(&schema), "STLA");
        assert_eq!(field.name, "stla");
        assert_eq!(field.state(), FieldState::Undefined);
        assert_eq!(field.display, "UNDEFINED (-12345)");
    }

    #[test]
    fn enum_codes() {
        let schema = schema();
        let mut header = header(&schema);
        header.set_number(&schema, "iftype", 1.0).unwrap();
        assert_eq!(resolve(&schema, &header, "iftype").display, "ixy");

        header.set_number(&schema, "iftype", 99.0).unwrap();
        let field = resolve(&schema, &header, "iftype");
        assert_eq!(field.state(), FieldState::Invalid);
        assert_eq!(field.display, "UNKNOWN (99)");

        header.set_number(&schema, "iftype", 0.5).unwrap();
        assert_eq!(resolve(&schema, &header, "iftype").display, "UNKNOWN (0.5)");
    }

    #[test]
    fn logical_values() {
        let schema = schema();
        let mut header = header(&schema);
        assert_eq!(resolve(&schema, &header, "leven").display, "UNDEFINED (-12345)");
        header.set_number(&schema, "leven", 1.0).unwrap();
        assert_eq!(resolve(&schema, &header, "leven").display, "TRUE");
        header.set_number(&schema, "leven", 0.0).unwrap();
        assert_eq!(resolve(&schema, &header, "leven").display, "FALSE");
        header.set_number(&schema, "leven", 7.0).unwrap();
        let field = resolve(&schema, &header, "leven");
        assert_eq!(field.state(), FieldState::Invalid);
        assert_eq!(field.display, "INVALID (7)");
    }

    #[test]
    fn text_values() {
        let schema = schema();
        let mut header = header(&schema);
        let field = resolve(&schema, &header, "kstnm");
        assert_eq!(field.state(), FieldState::Undefined);
        assert_eq!(field.display, "UNDEFINED (-12345)");

        header.set_text(&schema, "kstnm", "ANMO").unwrap();
        let field = resolve(&schema, &header, "kstnm");
        assert_eq!(field.value(), Some(&Value::Text("ANMO".into())));
    }

    #[test]
    fn time_qualifiers() {
        let schema = schema();
        let mut header = header(&schema);
        assert_eq!(resolve(&schema, &header, "b utc").display, "UNDEFINED (-12345)");

        header.set_number(&schema, "b", 3661.25).unwrap();
        let field = resolve(&schema, &header, "b utc");
        assert_eq!(field.kind, Some(FieldKind::AbsoluteTime));
        assert_eq!(field.display, "2009-02-14 (045) 04:16:31.750");

        let field = resolve(&schema, &header, "b 6utc");
        assert_eq!(field.display, "2009-02-14 04:16:31.750");
        match field.value() {
            Some(Value::Time(stamp)) => {
                assert_eq!(stamp.components(), [2009.0, 2.0, 14.0, 4.0, 16.0, 31.75])
            }
            other => panic!("unexpected {other:?}"),
        }

        let field = resolve(&schema, &header, "b tai");
        assert_eq!(field.display, "2009-02-14 (045) 04:17:05.750");
    }

    #[test]
    fn any_numeric_field_takes_a_time_qualifier() {
        let schema = schema();
        let mut header = header(&schema);
        header.set_number(&schema, "stla", 3661.25).unwrap();
        let field = resolve(&schema, &header, "stla utc");
        assert_eq!(field.kind, Some(FieldKind::AbsoluteTime));
        assert_eq!(field.display, "2009-02-14 (045) 04:16:31.750");
        assert_eq!(resolve(&schema, &header, "stla 6tai").display, "2009-02-14 04:17:05.750");
    }

    #[test]
    fn non_finite_offsets_are_undefined() {
        let schema = schema();
        let mut header = header(&schema);
        header.set_number(&schema, "b", f64::NAN).unwrap();
        let field = resolve(&schema, &header, "b utc");
        assert_eq!(field.state(), FieldState::Undefined);
        assert_eq!(field.display, "UNDEFINED (NaN)");

        header.set_number(&schema, "nzhour", 24.0).unwrap();
        assert_eq!(resolve(&schema, &header, "b utc").display, "UNDEFINED (NaN)");
        header.set_number(&schema, "b", 1.5).unwrap();
        assert_eq!(resolve(&schema, &header, "b utc").display, "NO REFTIME (1.5)");
    }

    #[test]
    fn missing_reference_time() {
        let schema = schema();
        let mut header = header(&schema);
        header.set_number(&schema, "b", 12.5).unwrap();
        header.set_number(&schema, "nzhour", 24.0).unwrap();
        let field = resolve(&schema, &header, "b utc");
        assert_eq!(field.state(), FieldState::MissingReferenceTime);
        assert_eq!(field.display, "NO REFTIME (12.5)");
        assert_eq!(resolve(&schema, &header, "b").display, "12.5");
    }

    #[test]
    fn bad_qualifiers() {
        let schema = schema();
        let header = header(&schema);
        assert_eq!(resolve(&schema, &header, "b gmt").display, "INVALID QUALIFIER (gmt)");
        assert_eq!(resolve(&schema, &header, "kzdate utc").display, "INVALID QUALIFIER (utc)");
        assert_eq!(resolve(&schema, &header, "leven tai").display, "INVALID QUALIFIER (tai)");
    }

    #[test]
    fn unknown_and_mismatched() {
        let schema = schema();
        let header = header(&schema);
        let field = resolve(&schema, &header, "nosuch");
        assert_eq!(field.kind, None);
        assert_eq!(field.display, "NOT A FIELD");

        let short = RawHeader::new(vec![0.0; 3], vec![b' '; 8]);
        let field = resolve(&schema, &short, "b");
        assert_eq!(field.display, "SCHEMA MISMATCH (v1)");
    }

    #[test]
    fn width_is_applied() {
        let schema = schema();
        let header = header(&schema);
        let options = ResolveOptions::default().with_width(10);
        assert_eq!(resolve_field(&schema, &header, "nzyear", &options).display, "      2009");
        assert_eq!(resolve_field(&schema, &header, "stla", &options).display, "UNDEFINED ");

        let options = options.with_oversize(OversizePolicy::Marker, "***");
        assert_eq!(resolve_field(&schema, &header, "stla", &options).display, "       ***");
    }
}
