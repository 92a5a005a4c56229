//! End-to-end resolution against the built-in header versions.

use std::sync::Arc;

use rstest::{fixture, rstest};
use seishdr_config::{LeapSecondEntry, OversizePolicy, ResolverConfig};
use seishdr_fields::{
    FieldKind, FieldResolver, FieldState, FieldsError, RawHeader, Resolution, ResolveOptions,
    SchemaRegistry, Value,
};

#[fixture]
fn resolver() -> FieldResolver {
    FieldResolver::from_config(&ResolverConfig::default()).unwrap()
}

/// A version 6 header with a reference time of 2009-045 03:15:30.500.
fn header(resolver: &FieldResolver, version: i32) -> RawHeader {
    let schema = resolver.registry().get(version).unwrap();
    let mut header = RawHeader::undefined(schema);
    for (name, value) in [
        ("nzyear", 2009.0),
        ("nzjday", 45.0),
        ("nzhour", 3.0),
        ("nzmin", 15.0),
        ("nzsec", 30.0),
        ("nzmsec", 500.0),
        ("nvhdr", f64::from(version)),
    ] {
        header.set_number(schema, name, value).unwrap();
    }
    header
}

fn displays(fields: &[seishdr_fields::ResolvedField]) -> Vec<(&str, &str)> {
    fields
        .iter()
        .map(|f| (f.name.as_str(), f.display.as_str()))
        .collect()
}

#[rstest]
#[case(6)]
#[case(7)]
#[test_log::test]
fn sentinel_is_reported_undefined(resolver: FieldResolver, #[case] version: i32) {
    let header = header(&resolver, version);
    let fields = resolver.resolve(version, &header, "stla");
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].state(), FieldState::Undefined);
    assert_eq!(fields[0].display, "UNDEFINED (-12345)");
}

#[rstest]
#[case(1.0, "TRUE", FieldState::Defined)]
#[case(0.0, "FALSE", FieldState::Defined)]
#[case(-12345.0, "UNDEFINED (-12345)", FieldState::Undefined)]
#[case(2.0, "INVALID (2)", FieldState::Invalid)]
#[test_log::test]
fn logical_fields(
    resolver: FieldResolver,
    #[case] raw: f64,
    #[case] display: &str,
    #[case] state: FieldState,
) {
    let schema = Arc::clone(resolver.registry().get(6).unwrap());
    let mut header = header(&resolver, 6);
    header.set_number(&schema, "leven", raw).unwrap();
    let fields = resolver.resolve(6, &header, "LEVEN");
    assert_eq!(fields[0].display, display);
    assert_eq!(fields[0].state(), state);
    assert_eq!(fields[0].kind, Some(FieldKind::Logical));
}

#[rstest]
#[case(1.0, "itime")]
#[case(4.0, "ixy")]
#[case(97.0, "iodor")]
#[case(99.0, "UNKNOWN (99)")]
#[case(0.0, "UNKNOWN (0)")]
#[case(-12345.0, "UNDEFINED (-12345)")]
#[test_log::test]
fn builtin_enumeration(resolver: FieldResolver, #[case] raw: f64, #[case] display: &str) {
    let schema = Arc::clone(resolver.registry().get(6).unwrap());
    let mut header = header(&resolver, 6);
    header.set_number(&schema, "iftype", raw).unwrap();
    assert_eq!(resolver.resolve(6, &header, "iftype")[0].display, display);
}

const TWO_CODE_SCHEMA: &str = r#"
version: 50
slot_count: 2
enum_table: { min_code: 0, ids: [itime, ixy] }
fields:
  - { kind: numeric, name: b, slot: 0 }
  - { kind: enum, name: iftype, slot: 1 }
builtin_virtuals: false
"#;

#[test_log::test]
fn yaml_schema_with_zero_based_codes() {
    let leap = Arc::new(seishdr_fields::LeapSecondTable::builtin());
    let mut registry = SchemaRegistry::new();
    registry.load_yaml(TWO_CODE_SCHEMA, leap).unwrap();
    let resolver = FieldResolver::new(Arc::new(registry), ResolveOptions::default());

    let header = RawHeader::new(vec![0.0, 1.0], Vec::new());
    let fields = resolver.resolve(50, &header, "iftype");
    assert_eq!(fields[0].display, "ixy");
    assert_eq!(
        fields[0].value(),
        Some(&Value::Enum {
            code: 1,
            id: "ixy".into()
        })
    );

    let header = RawHeader::new(vec![0.0, 99.0], Vec::new());
    assert_eq!(resolver.resolve(50, &header, "iftype")[0].display, "UNKNOWN (99)");
}

#[rstest]
#[case(6)]
#[case(7)]
#[test_log::test]
fn offset_becomes_absolute_time(resolver: FieldResolver, #[case] version: i32) {
    let schema = Arc::clone(resolver.registry().get(version).unwrap());
    let mut header = header(&resolver, version);
    header.set_number(&schema, "t3", 3661.25).unwrap();

    let fields = resolver.resolve(version, &header, "T3 UTC");
    assert_eq!(fields[0].name, "t3 utc");
    assert_eq!(fields[0].display, "2009-02-14 (045) 04:16:31.750");
    match fields[0].value() {
        Some(Value::Time(stamp)) => {
            assert_eq!(stamp.components(), [2009.0, 45.0, 4.0, 16.0, 31.75])
        }
        other => panic!("unexpected {other:?}"),
    }

    let fields = resolver.resolve(version, &header, "t3 6tai");
    assert_eq!(fields[0].display, "2009-02-14 04:17:05.750");
}

#[rstest]
#[case("user0 utc", "2009-02-14 (045) 04:16:31.750")]
#[case("user0 6tai", "2009-02-14 04:17:05.750")]
#[case("USER0 6UTC", "2009-02-14 04:16:31.750")]
#[test_log::test]
fn plain_numeric_fields_read_as_offsets(
    resolver: FieldResolver,
    #[case] request: &str,
    #[case] display: &str,
) {
    let schema = Arc::clone(resolver.registry().get(6).unwrap());
    let mut header = header(&resolver, 6);
    header.set_number(&schema, "user0", 3661.25).unwrap();
    let fields = resolver.resolve(6, &header, request);
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].kind, Some(FieldKind::AbsoluteTime));
    assert_eq!(fields[0].display, display);
}

#[rstest]
#[test_log::test]
fn non_finite_offset_is_undefined_before_reference_checks(resolver: FieldResolver) {
    let schema = Arc::clone(resolver.registry().get(6).unwrap());
    let mut header = header(&resolver, 6);
    header.set_number(&schema, "b", f64::NAN).unwrap();
    header.set_number(&schema, "e", f64::INFINITY).unwrap();
    let fields = resolver.resolve(6, &header, "b utc");
    assert_eq!(fields[0].state(), FieldState::Undefined);
    assert_eq!(fields[0].display, "UNDEFINED (NaN)");

    header.set_number(&schema, "nzjday", 0.0).unwrap();
    let fields = resolver.resolve(6, &header, "b utc");
    assert_eq!(fields[0].state(), FieldState::Undefined);
    assert_eq!(fields[0].display, "UNDEFINED (NaN)");
    let fields = resolver.resolve(6, &header, "e tai");
    assert_eq!(fields[0].state(), FieldState::Undefined);
}

#[rstest]
#[test_log::test]
fn offsets_carry_across_year_end(resolver: FieldResolver) {
    let schema = Arc::clone(resolver.registry().get(6).unwrap());
    let mut header = header(&resolver, 6);
    header.set_number(&schema, "nzjday", 1.0).unwrap();
    header.set_number(&schema, "b", -(3.0 * 3600.0 + 15.0 * 60.0 + 31.0)).unwrap();
    let fields = resolver.resolve(6, &header, "b utc");
    assert_eq!(fields[0].display, "2008-12-31 (366) 23:59:59.500");
}

#[rstest]
#[test_log::test]
fn missing_reference_time(resolver: FieldResolver) {
    let schema = Arc::clone(resolver.registry().get(6).unwrap());
    let mut header = header(&resolver, 6);
    header.set_number(&schema, "a", 10.0).unwrap();
    header.set_number(&schema, "nzmin", 60.0).unwrap();

    let fields = resolver.resolve(6, &header, "a utc");
    assert_eq!(fields[0].state(), FieldState::MissingReferenceTime);
    assert_eq!(fields[0].display, "NO REFTIME (10)");

    // Sentinel offsets stay undefined even without a reference time.
    let fields = resolver.resolve(6, &header, "o utc");
    assert_eq!(fields[0].display, "UNDEFINED (-12345)");

    let fields = resolver.resolve(6, &header, "z");
    assert_eq!(
        fields[0].display,
        "UNDEFINED ([-12345, -12345, -12345, -12345, -12345])"
    );
}

#[rstest]
#[test_log::test]
fn group_matches_individual_resolution(resolver: FieldResolver) {
    let schema = Arc::clone(resolver.registry().get(6).unwrap());
    let mut header = header(&resolver, 6);
    for (i, value) in [1.5, 2.5, 3.5].into_iter().enumerate() {
        header.set_number(&schema, &format!("t{i}"), value).unwrap();
    }

    let grouped = resolver.resolve(6, &header, "t utc");
    assert_eq!(grouped.len(), 10);

    let members = seishdr_fields::expand(&schema, "t utc");
    let individual: Vec<_> = members
        .iter()
        .flat_map(|name| resolver.resolve(6, &header, name))
        .collect();
    assert_eq!(grouped, individual);
    assert_eq!(grouped[1].display, "2009-02-14 (045) 03:15:33.000");
    assert_eq!(grouped[9].display, "UNDEFINED (-12345)");
}

#[rstest]
#[test_log::test]
fn wildcards_expand_in_sorted_order(resolver: FieldResolver) {
    let header = header(&resolver, 6);
    let fields = resolver.resolve(6, &header, "kuser*");
    let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["kuser0", "kuser1", "kuser2"]);

    let fields = resolver.resolve(6, &header, "nz*");
    let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        ["nzcday", "nzhour", "nzjday", "nzmin", "nzmonth", "nzmsec", "nzsec", "nzyear"]
    );
}

#[rstest]
#[test_log::test]
fn virtual_fields(resolver: FieldResolver) {
    let header = header(&resolver, 6);
    let fields = resolver.resolve(6, &header, "kz*");
    assert_eq!(
        displays(&fields),
        [("kzdate", "FEB 14 (045), 2009"), ("kztime", "03:15:30.500")]
    );
    let fields = resolver.resolve(6, &header, "z");
    assert_eq!(fields[0].display, "[2009, 45, 3, 15, 30.5]");
    assert_eq!(fields[0].kind, Some(FieldKind::Numeric));
    let fields = resolver.resolve(6, &header, "zutc");
    assert_eq!(fields[0].display, "2009-02-14 (045) 03:15:30.500");
}

#[rstest]
#[test_log::test]
fn unknown_names_and_blank_requests(resolver: FieldResolver) {
    let header = header(&resolver, 6);
    let fields = resolver.resolve(6, &header, "nosuch");
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].resolution, Resolution::UnknownField);
    assert_eq!(fields[0].display, "NOT A FIELD");

    let fields = resolver.resolve(6, &header, "q*z");
    assert_eq!(displays(&fields), [("q*z", "NOT A FIELD")]);

    assert!(resolver.resolve(6, &header, "   ").is_empty());
}

#[rstest]
#[test_log::test]
fn schema_mismatches(resolver: FieldResolver) {
    let header = header(&resolver, 6);
    let fields = resolver.resolve(9, &header, "stla");
    assert_eq!(fields[0].state(), FieldState::SchemaMismatch);
    assert_eq!(fields[0].display, "SCHEMA MISMATCH (v9)");

    // A version 6 header handed over as version 7 is too short.
    let fields = resolver.resolve(7, &header, "stla");
    assert_eq!(fields[0].display, "SCHEMA MISMATCH (v7)");
}

#[test_log::test]
fn names_known_only_to_other_versions_are_mismatches() {
    let leap = Arc::new(seishdr_fields::LeapSecondTable::builtin());
    let mut registry = SchemaRegistry::builtin(Arc::clone(&leap)).unwrap();
    registry.load_yaml(TWO_CODE_SCHEMA, leap).unwrap();
    let resolver = FieldResolver::new(Arc::new(registry), ResolveOptions::default());

    let header = RawHeader::new(vec![0.0, 1.0], Vec::new());
    let fields = resolver.resolve(50, &header, "stla");
    assert_eq!(fields[0].display, "SCHEMA MISMATCH (v50)");
    let fields = resolver.resolve(50, &header, "nosuch");
    assert_eq!(fields[0].display, "NOT A FIELD");
}

#[rstest]
#[test_log::test]
fn one_bad_field_does_not_abort_the_request(resolver: FieldResolver) {
    let schema = Arc::clone(resolver.registry().get(6).unwrap());
    let mut header = header(&resolver, 6);
    header.set_number(&schema, "stla", 34.9459).unwrap();
    header.set_number(&schema, "stel", f64::NAN).unwrap();
    let fields = resolver.resolve(6, &header, "st");
    assert_eq!(
        displays(&fields),
        [
            ("stdp", "UNDEFINED (-12345)"),
            ("stel", "INVALID (NaN)"),
            ("stla", "34.9459"),
            ("stlo", "UNDEFINED (-12345)"),
        ]
    );
}

#[rstest]
#[test_log::test]
fn batch_matches_sequential(resolver: FieldResolver) {
    let schema = Arc::clone(resolver.registry().get(6).unwrap());
    let records: Vec<(i32, RawHeader)> = (0..64)
        .map(|i| {
            let version = if i % 3 == 0 { 7 } else { 6 };
            let mut header = header(&resolver, version);
            if version == 6 {
                header.set_number(&schema, "b", f64::from(i) * 0.25).unwrap();
                header.set_number(&schema, "nzjday", f64::from(1 + i % 365)).unwrap();
            }
            (version, header)
        })
        .collect();

    let batch = resolver.resolve_batch(&records, "b*");
    assert_eq!(batch.len(), records.len());
    for ((version, header), fields) in records.iter().zip(&batch) {
        assert_eq!(fields, &resolver.resolve(*version, header, "b*"));
    }

    let batch = resolver.resolve_batch(&records, "t utc");
    for ((version, header), fields) in records.iter().zip(&batch) {
        assert_eq!(fields, &resolver.resolve(*version, header, "t utc"));
    }
}

#[test_log::test]
fn display_width_and_oversize_marker() {
    let config = ResolverConfig {
        display_width: Some(8),
        oversize: OversizePolicy::Marker,
        oversize_marker: "<oversized>".into(),
        ..ResolverConfig::default()
    };
    let resolver = FieldResolver::from_config(&config).unwrap();
    let header = header(&resolver, 6);

    let fields = resolver.resolve(6, &header, "nzyear");
    assert_eq!(fields[0].display, "    2009");
    let fields = resolver.resolve(6, &header, "stla");
    assert_eq!(fields[0].display, "<oversiz");

    let resolver = FieldResolver::new(
        Arc::new(resolver.registry().clone()),
        ResolveOptions::default().with_width(8),
    );
    let fields = resolver.resolve(6, &header, "stla");
    assert_eq!(fields[0].display, "UNDEFINE");
}

#[test_log::test]
fn configured_leap_seconds_drive_tai() {
    let config = ResolverConfig {
        leap_seconds: vec![LeapSecondEntry::new("1972-01-01", 10)],
        ..ResolverConfig::default()
    };
    let resolver = FieldResolver::from_config(&config).unwrap();
    let schema = Arc::clone(resolver.registry().get(6).unwrap());
    let mut header = header(&resolver, 6);
    header.set_number(&schema, "b", 0.0).unwrap();
    let fields = resolver.resolve(6, &header, "b tai");
    assert_eq!(fields[0].display, "2009-02-14 (045) 03:15:40.500");
}

#[test]
fn invalid_configuration_is_fatal() {
    let config = ResolverConfig {
        leap_seconds: vec![
            LeapSecondEntry::new("2017-01-01", 37),
            LeapSecondEntry::new("2009-01-01", 34),
        ],
        ..ResolverConfig::default()
    };
    assert!(matches!(
        FieldResolver::from_config(&config),
        Err(FieldsError::Config(_))
    ));
}
