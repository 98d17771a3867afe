//! Type override tests

use super::fixtures::{bridge, builder, oracle, time_period};
use crate::{
    BridgeBuilder, BuildError, ErrorCode, NativeValue, OverrideResolver, OverrideSpec, RawField,
    RawFunction, RawType, StaticOracle, TypeSpec, WireValue,
};

fn period() -> TypeSpec {
    TypeSpec::enum_ref("TimePeriod")
}

fn assert_conflict(result: Result<crate::Bridge, BuildError>, target: &str) {
    match result {
        Err(BuildError::OverrideConflict { target: actual, .. }) => assert_eq!(actual, target),
        Err(other) => panic!("expected override conflict, got {other:?}"),
        Ok(_) => panic!("expected override conflict, build succeeded"),
    }
}

// =============================================================================
// Precedence
// =============================================================================

#[test]
fn test_override_wins_over_schema_type() {
    let bridge = bridge();
    assert_eq!(bridge.field_spec("NeedsFixup", "time"), Some(&period()));
    assert_eq!(bridge.field_spec("NeedsFixup", "name"), Some(&TypeSpec::string()));
    assert_eq!(bridge.arg_spec("lookup", 0), Some(&TypeSpec::i64()));
    assert_eq!(bridge.arg_spec("lookup", 1), Some(&period()));
}

#[test]
fn test_return_override() {
    let oracle = StaticOracle::new().with_function(
        "current",
        RawFunction::new(vec![], RawType::name("i32")),
    );
    let bridge = BridgeBuilder::new(&oracle)
        .root_function("current")
        .enumeration(time_period())
        .function_override("current", OverrideSpec::new().returns(period()))
        .build()
        .unwrap();

    let reply = bridge.reply_to_native("current", &WireValue::Int(3)).unwrap();
    assert_eq!(reply.as_enum().and_then(|v| v.symbol()), Some("month"));
}

#[test]
fn test_resolver_fallback_is_any() {
    let resolver = OverrideResolver::new();
    assert_eq!(resolver.resolve_arg("f", 0, None), TypeSpec::Any);
    assert_eq!(resolver.resolve_return("f", None), TypeSpec::Any);
}

#[test]
fn test_from_positions() {
    let spec = OverrideSpec::from_positions([None, Some(period()), None]);
    assert_eq!(spec, OverrideSpec::new().arg(1, period()));
}

#[test]
fn test_split_function_overrides_merge() {
    let oracle = StaticOracle::new().with_function(
        "pair",
        RawFunction::new(
            vec![
                RawField::new(1, "a", RawType::name("i32")),
                RawField::new(2, "b", RawType::name("i32")),
            ],
            RawType::name("void"),
        ),
    );
    let bridge = BridgeBuilder::new(&oracle)
        .root_function("pair")
        .enumeration(time_period())
        .function_override("pair", OverrideSpec::new().arg(0, period()))
        .function_override("pair", OverrideSpec::new().arg(1, period()))
        .build()
        .unwrap();
    assert_eq!(bridge.arg_spec("pair", 0), Some(&period()));
    assert_eq!(bridge.arg_spec("pair", 1), Some(&period()));
}

// =============================================================================
// Conflicts
// =============================================================================

#[test]
fn test_unknown_struct_conflict() {
    let oracle = oracle();
    let result = builder(&oracle)
        .struct_override("Ghost", "time", period())
        .build();
    assert_conflict(result, "Ghost.time");
}

#[test]
fn test_unknown_field_conflict() {
    let oracle = oracle();
    let result = builder(&oracle)
        .struct_override("NeedsFixup", "when", period())
        .build();
    assert_conflict(result, "NeedsFixup.when");
}

#[test]
fn test_unknown_function_conflict() {
    let oracle = oracle();
    let result = builder(&oracle)
        .function_override("search", OverrideSpec::new().arg(0, period()))
        .build();
    assert_conflict(result, "search");
}

#[test]
fn test_argument_position_out_of_range() {
    let oracle = oracle();
    let result = builder(&oracle)
        .function_override("lookup", OverrideSpec::new().arg(2, period()))
        .build();
    assert_conflict(result, "lookup[2]");
}

#[test]
fn test_duplicate_field_override() {
    let oracle = oracle();
    let result = builder(&oracle)
        .struct_override("NeedsFixup", "time", TypeSpec::i64())
        .build();
    assert_conflict(result, "NeedsFixup.time");
}

#[test]
fn test_duplicate_argument_override() {
    let oracle = oracle();
    let result = builder(&oracle)
        .function_override("lookup", OverrideSpec::new().arg(1, TypeSpec::i32()))
        .build();
    assert_conflict(result, "lookup[1]");
}

#[test]
fn test_duplicate_return_override() {
    let mut resolver = OverrideResolver::new();
    resolver
        .add_function("f", OverrideSpec::new().returns(TypeSpec::i32()))
        .unwrap();
    let err = resolver
        .add_function("f", OverrideSpec::new().returns(TypeSpec::i64()))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::OverrideConflict);
}

#[test]
fn test_unregistered_enum_in_override() {
    let oracle = oracle();
    let err = builder(&oracle)
        .struct_override("NeedsFixup", "name", TypeSpec::enum_ref("Weekday"))
        .build()
        .unwrap_err();
    assert_eq!(err, BuildError::lookup("enum", "Weekday", "override"));
}

// =============================================================================
// Override-only structs
// =============================================================================

#[test]
fn test_struct_named_only_by_override_is_extracted() {
    let oracle = StaticOracle::new()
        .with_struct(
            "Envelope",
            vec![RawField::new(1, "payload", RawType::name("binary"))],
        )
        .with_struct("Inner", vec![RawField::new(1, "n", RawType::name("i32"))]);
    let bridge = BridgeBuilder::new(&oracle)
        .root_struct("Envelope")
        .struct_override("Envelope", "payload", TypeSpec::struct_ref("Inner"))
        .build()
        .unwrap();
    assert!(bridge.struct_names().contains(&"Inner"));

    let wire = WireValue::tuple(
        "Envelope",
        vec![WireValue::tuple("Inner", vec![WireValue::Int(5)])],
    );
    let native = bridge.struct_to_native("Envelope", &wire).unwrap();
    let payload = native.as_record().and_then(|r| r.get("payload")).unwrap();
    assert_eq!(
        payload.as_record().and_then(|r| r.get("n")),
        Some(&NativeValue::Int(5))
    );
}
