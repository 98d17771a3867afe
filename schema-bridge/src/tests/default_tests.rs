//! Default synthesis and record construction tests

use super::fixtures::{bridge, time_period};
use crate::{
    BridgeBuilder, BuildError, ErrorCode, NativeValue, RawField, RawType, StaticOracle, TypeSpec,
    WireValue,
};

#[test]
fn test_map_default_synthesized() {
    let bridge = bridge();
    let record = bridge.new_record("DefaultMap").unwrap();
    assert_eq!(
        record.get("mappings"),
        Some(&NativeValue::map([
            (NativeValue::text("cats"), NativeValue::Int(3)),
            (NativeValue::text("dogs"), NativeValue::Int(4)),
        ]))
    );

    let wire = bridge.struct_to_wire("DefaultMap", &record).unwrap();
    assert_eq!(
        wire,
        WireValue::tuple(
            "DefaultMap",
            vec![WireValue::map([
                (WireValue::string("cats"), WireValue::Int(3)),
                (WireValue::string("dogs"), WireValue::Int(4)),
            ])]
        )
    );
}

#[test]
fn test_fields_without_default_are_unset() {
    let bridge = bridge();
    let record = bridge.new_record("Person").unwrap();
    assert!(record.get("name").unwrap().is_unset());
    assert!(record.get("pets").unwrap().is_unset());
    assert_eq!(record.get("nickname"), Some(&NativeValue::text("anon")));
    assert_eq!(record.len(), 3);
}

#[test]
fn test_struct_typed_default_is_dropped() {
    let bridge = bridge();
    let record = bridge.new_record("Schedule").unwrap();
    assert!(record.get("owner").unwrap().is_unset());
}

#[test]
fn test_record_overrides_some_fields() {
    let bridge = bridge();
    let record = bridge
        .record("Person", [("name", NativeValue::text("Ann"))])
        .unwrap();
    assert_eq!(record.get("name"), Some(&NativeValue::text("Ann")));
    assert_eq!(record.get("nickname"), Some(&NativeValue::text("anon")));

    let wire = bridge.struct_to_wire("Person", &record).unwrap();
    assert_eq!(
        wire,
        WireValue::tuple(
            "Person",
            vec![WireValue::string("Ann"), WireValue::Unset, WireValue::string("anon")]
        )
    );
}

#[test]
fn test_records_do_not_share_state() {
    let bridge = bridge();
    let mut first = bridge.new_record("DefaultMap").unwrap();
    first.set("mappings", NativeValue::Map(Default::default()));
    let second = bridge.new_record("DefaultMap").unwrap();
    assert_ne!(first.get("mappings"), second.get("mappings"));
}

#[test]
fn test_record_errors() {
    let bridge = bridge();
    let err = bridge
        .record("Person", [("age", NativeValue::Int(3))])
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::UnknownField);

    let err = bridge.new_record("Nope").unwrap_err();
    assert_eq!(err.code(), ErrorCode::UnknownStruct);
}

#[test]
fn test_default_uses_overridden_type() {
    let oracle = StaticOracle::new().with_struct(
        "Report",
        vec![RawField::new(1, "period", RawType::name("i32")).with_default(WireValue::Int(2))],
    );
    let bridge = BridgeBuilder::new(&oracle)
        .root_struct("Report")
        .enumeration(time_period())
        .struct_override("Report", "period", TypeSpec::enum_ref("TimePeriod"))
        .build()
        .unwrap();

    let record = bridge.new_record("Report").unwrap();
    let period = record.get("period").and_then(NativeValue::as_enum).unwrap();
    assert_eq!(period.symbol(), Some("week"));
}

#[test]
fn test_invalid_default_fails_build() {
    let oracle = StaticOracle::new().with_struct(
        "Broken",
        vec![RawField::new(1, "count", RawType::name("i32")).with_default(WireValue::string("x"))],
    );
    let err = BridgeBuilder::new(&oracle)
        .root_struct("Broken")
        .build()
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidDefault);
    match err {
        BuildError::Default { struct_name, field, .. } => {
            assert_eq!(struct_name, "Broken");
            assert_eq!(field, "count");
        }
        other => panic!("expected default error, got {other:?}"),
    }
}
