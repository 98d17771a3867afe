//! Conversion engine tests: generic dispatch, per-struct conversion, error
//! paths and the function adapters.

use super::fixtures::{bridge, ints, needs_fixup, period};
use crate::{ConversionError, ErrorCode, NativeRecord, NativeValue, TypeSpec, WireValue};

fn time_period() -> TypeSpec {
    TypeSpec::enum_ref("TimePeriod")
}

// =============================================================================
// Containers and enums
// =============================================================================

#[test]
fn test_deep_nested_enum_lists() {
    let bridge = bridge();
    let spec = TypeSpec::list(TypeSpec::list(time_period()));
    let wire = WireValue::List(vec![ints(&[1, 2]), ints(&[3])]);

    let native = bridge.to_native(&wire, &spec).unwrap();
    let expected = NativeValue::List(vec![
        NativeValue::List(vec![period(&bridge, "day"), period(&bridge, "week")]),
        NativeValue::List(vec![period(&bridge, "month")]),
    ]);
    assert_eq!(native, expected);

    assert_eq!(bridge.to_wire(&native, &spec).unwrap(), wire);
}

#[test]
fn test_enum_as_map_key() {
    let bridge = bridge();
    let spec = TypeSpec::map(time_period(), TypeSpec::string());
    let wire = WireValue::map([(WireValue::Int(2), WireValue::string("week"))]);

    let native = bridge.to_native(&wire, &spec).unwrap();
    assert_eq!(
        native,
        NativeValue::map([(period(&bridge, "week"), NativeValue::text("week"))])
    );

    let back = bridge.to_wire(&native, &spec).unwrap();
    assert_eq!(back, wire);
    match back {
        WireValue::Map(map) => assert_eq!(map.get(&WireValue::Int(2)), Some(&WireValue::string("week"))),
        other => panic!("expected wire map, got {other:?}"),
    }
}

#[test]
fn test_set_elements_convert_and_collapse() {
    let bridge = bridge();
    let spec = TypeSpec::set(TypeSpec::string());
    let wire = WireValue::set([WireValue::string("a"), WireValue::string("b")]);

    let native = bridge.to_native(&wire, &spec).unwrap();
    assert_eq!(native, NativeValue::set([NativeValue::text("b"), NativeValue::text("a")]));
    assert_eq!(bridge.to_wire(&native, &spec).unwrap(), wire);
}

#[test]
fn test_unresolved_enum_passes_through() {
    let bridge = bridge();
    let native = bridge.to_native(&WireValue::Int(42), &time_period()).unwrap();
    let value = native.as_enum().expect("enum value");
    assert!(!value.is_resolved());
    assert_eq!(value.value(), 42);
    assert_eq!(bridge.to_wire(&native, &time_period()).unwrap(), WireValue::Int(42));
}

#[test]
fn test_enum_to_wire_accepts_codes_and_symbols() {
    let bridge = bridge();
    assert_eq!(
        bridge.to_wire(&NativeValue::Int(3), &time_period()).unwrap(),
        WireValue::Int(3)
    );
    assert_eq!(
        bridge.to_wire(&NativeValue::text("week"), &time_period()).unwrap(),
        WireValue::Int(2)
    );

    let err = bridge
        .to_wire(&NativeValue::text("year"), &time_period())
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::UnknownEnumSymbol);
}

#[test]
fn test_enum_of_other_enum_is_rejected() {
    let bridge = bridge();
    let red = bridge.enums().by_symbol("Color", "red").unwrap();
    let err = bridge
        .to_wire(&NativeValue::Enum(red), &time_period())
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValueMismatch);
}

#[test]
fn test_unregistered_enum_is_call_time_error() {
    let bridge = bridge();
    let err = bridge
        .to_native(&WireValue::Int(1), &TypeSpec::enum_ref("Missing"))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::UnknownEnum);
}

#[test]
fn test_unset_passes_through_every_spec() {
    let bridge = bridge();
    for spec in [
        TypeSpec::string(),
        time_period(),
        TypeSpec::list(TypeSpec::i32()),
        TypeSpec::struct_ref("NeedsFixup"),
        TypeSpec::Any,
    ] {
        assert_eq!(bridge.to_native(&WireValue::Unset, &spec).unwrap(), NativeValue::Unset);
        assert_eq!(bridge.to_wire(&NativeValue::Unset, &spec).unwrap(), WireValue::Unset);
    }
}

#[test]
fn test_invalid_utf8_string() {
    let bridge = bridge();
    let wire = WireValue::tuple("NeedsFixup", vec![WireValue::Binary(vec![0xff, 0xfe]), WireValue::Int(1)]);

    let err = bridge.struct_to_native("NeedsFixup", &wire).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidUtf8);
    assert_eq!(err.path().unwrap().to_string(), "NeedsFixup.name");
}

#[test]
fn test_binary_stays_bytes() {
    let bridge = bridge();
    let spec = TypeSpec::Primitive(crate::PrimitiveKind::Binary);
    let wire = WireValue::Binary(vec![0, 159, 146, 150]);
    let native = bridge.to_native(&wire, &spec).unwrap();
    assert_eq!(native, NativeValue::Bytes(vec![0, 159, 146, 150]));
    assert_eq!(bridge.to_wire(&native, &spec).unwrap(), wire);
}

// =============================================================================
// Structs
// =============================================================================

#[test]
fn test_struct_tag_conversion() {
    let bridge = bridge();
    let wire = needs_fixup("Foo", 2);

    let native = bridge.struct_to_native("NeedsFixup", &wire).unwrap();
    let expected = NativeRecord::new("NeedsFixup")
        .with("name", "Foo")
        .with("time", period(&bridge, "week"));
    assert_eq!(native, NativeValue::Record(expected.clone()));

    assert_eq!(bridge.struct_to_wire("NeedsFixup", &expected).unwrap(), wire);
}

#[test]
fn test_record_fields_keep_declaration_order() {
    let bridge = bridge();
    let native = bridge.struct_to_native("NeedsFixup", &needs_fixup("Foo", 1)).unwrap();
    let names: Vec<&str> = native.as_record().unwrap().field_names().collect();
    assert_eq!(names, vec!["name", "time"]);
}

#[test]
fn test_record_round_trip_ignores_insertion_order() {
    let bridge = bridge();
    let record = NativeRecord::new("NeedsFixup")
        .with("time", period(&bridge, "week"))
        .with("name", "Foo");

    let wire = bridge.struct_to_wire("NeedsFixup", &record).unwrap();
    assert_eq!(wire, needs_fixup("Foo", 2));

    let back = bridge.struct_to_native("NeedsFixup", &wire).unwrap();
    assert_eq!(back, NativeValue::Record(record));
}

#[test]
fn test_record_equality_is_name_keyed() {
    let forward = NativeRecord::new("S").with("a", 1).with("b", 2);
    let reverse = NativeRecord::new("S").with("b", 2).with("a", 1);
    assert_eq!(forward, reverse);
    assert_eq!(forward.cmp(&reverse), std::cmp::Ordering::Equal);

    let set = NativeValue::set([
        NativeValue::Record(forward.clone()),
        NativeValue::Record(reverse),
    ]);
    let NativeValue::Set(elements) = set else {
        panic!("expected a set");
    };
    assert_eq!(elements.len(), 1);

    // An unset field is the same as an absent one
    let partial = NativeRecord::new("S").with("a", 1).with("b", NativeValue::Unset);
    assert_eq!(partial, NativeRecord::new("S").with("a", 1));
    assert_ne!(forward, NativeRecord::new("S").with("a", 1).with("b", 3));
}

#[test]
fn test_missing_field_round_trips_as_unset() {
    let bridge = bridge();
    let record = NativeRecord::new("NeedsFixup").with("name", "Foo");
    let wire = bridge.struct_to_wire("NeedsFixup", &record).unwrap();
    let back = bridge.struct_to_native("NeedsFixup", &wire).unwrap();
    assert_eq!(back, NativeValue::Record(record));
}

#[test]
fn test_tag_mismatch() {
    let bridge = bridge();
    let wire = WireValue::tuple("DefaultMap", vec![WireValue::Unset]);

    let err = bridge.struct_to_native("NeedsFixup", &wire).unwrap_err();
    match err {
        ConversionError::TagMismatch { expected, found, .. } => {
            assert_eq!(expected, "NeedsFixup");
            assert_eq!(found, "DefaultMap");
        }
        other => panic!("expected tag mismatch, got {other:?}"),
    }

    let err = bridge
        .to_native(&wire, &TypeSpec::struct_ref("NeedsFixup"))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::TagMismatch);
}

#[test]
fn test_arity_mismatch() {
    let bridge = bridge();
    let wire = WireValue::tuple("NeedsFixup", vec![WireValue::string("Foo")]);
    let err = bridge.struct_to_native("NeedsFixup", &wire).unwrap_err();
    match err {
        ConversionError::ArityMismatch { expected, found, .. } => {
            assert_eq!(expected, 2);
            assert_eq!(found, 1);
        }
        other => panic!("expected arity mismatch, got {other:?}"),
    }
}

#[test]
fn test_value_mismatch_reports_nested_path() {
    let bridge = bridge();
    let wire = WireValue::tuple(
        "Schedule",
        vec![
            WireValue::List(vec![WireValue::List(vec![WireValue::Int(1), WireValue::string("x")])]),
            WireValue::Unset,
            WireValue::Unset,
            WireValue::Unset,
        ],
    );

    let err = bridge.struct_to_native("Schedule", &wire).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValueMismatch);
    assert_eq!(err.path().unwrap().to_string(), "Schedule.periods[0][1]");
}

#[test]
fn test_shape_mismatch_names_expected_type() {
    let bridge = bridge();
    let wire = WireValue::tuple(
        "Schedule",
        vec![WireValue::Int(5), WireValue::Unset, WireValue::Unset, WireValue::Unset],
    );
    match bridge.struct_to_native("Schedule", &wire).unwrap_err() {
        ConversionError::ValueMismatch { expected, found, .. } => {
            assert_eq!(expected, "list<list<enum TimePeriod>>");
            assert_eq!(found, "integer");
        }
        other => panic!("expected value mismatch, got {other:?}"),
    }
}

#[test]
fn test_missing_record_field_is_unset() {
    let bridge = bridge();
    let record = NativeRecord::new("NeedsFixup").with("name", "Foo");
    let wire = bridge.struct_to_wire("NeedsFixup", &record).unwrap();
    assert_eq!(
        wire,
        WireValue::tuple("NeedsFixup", vec![WireValue::string("Foo"), WireValue::Unset])
    );
}

#[test]
fn test_unknown_record_field() {
    let bridge = bridge();
    let record = NativeRecord::new("NeedsFixup").with("bogus", 1i64);
    let err = bridge.struct_to_wire("NeedsFixup", &record).unwrap_err();
    assert_eq!(err.code(), ErrorCode::UnknownField);
}

#[test]
fn test_unknown_struct() {
    let bridge = bridge();
    let err = bridge
        .to_native(&WireValue::tuple("Nope", vec![]), &TypeSpec::struct_ref("Nope"))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::UnknownStruct);
}

#[test]
fn test_mutually_recursive_structs_round_trip() {
    let bridge = bridge();
    let pet = WireValue::tuple("Pet", vec![WireValue::string("Rex"), WireValue::Unset]);
    let person = WireValue::tuple(
        "Person",
        vec![WireValue::string("Ann"), WireValue::List(vec![pet]), WireValue::string("A")],
    );

    let native = bridge.struct_to_native("Person", &person).unwrap();
    let record = native.as_record().unwrap();
    let pets = match record.get("pets") {
        Some(NativeValue::List(pets)) => pets,
        other => panic!("expected pet list, got {other:?}"),
    };
    assert_eq!(pets[0].as_record().unwrap().get("name"), Some(&NativeValue::text("Rex")));

    assert_eq!(bridge.struct_to_wire("Person", record).unwrap(), person);
}

#[test]
fn test_schedule_round_trip() {
    let bridge = bridge();
    let wire = WireValue::tuple(
        "Schedule",
        vec![
            WireValue::List(vec![ints(&[1]), ints(&[2, 9])]),
            WireValue::map([
                (WireValue::Int(1), WireValue::string("daily")),
                (WireValue::Int(7), WireValue::string("future")),
            ]),
            WireValue::set([WireValue::string("x"), WireValue::string("y")]),
            WireValue::Unset,
        ],
    );
    let native = bridge.struct_to_native("Schedule", &wire).unwrap();
    let record = native.as_record().unwrap();
    assert_eq!(bridge.struct_to_wire("Schedule", record).unwrap(), wire);
}

// =============================================================================
// Untyped values
// =============================================================================

#[test]
fn test_any_converts_known_struct() {
    let bridge = bridge();
    let native = bridge.to_native(&needs_fixup("Foo", 3), &TypeSpec::Any).unwrap();
    let record = native.as_record().expect("known tag converts to a record");
    assert_eq!(record.get("time"), Some(&period(&bridge, "month")));
}

#[test]
fn test_any_keeps_unknown_struct_opaque() {
    let bridge = bridge();
    let wire = WireValue::tuple("Elsewhere", vec![WireValue::Int(1)]);
    let native = bridge.to_native(&wire, &TypeSpec::Any).unwrap();
    assert_eq!(native, NativeValue::Opaque(wire.clone()));
    assert_eq!(bridge.to_wire(&native, &TypeSpec::Any).unwrap(), wire);
}

#[test]
fn test_any_scalars_and_containers() {
    let bridge = bridge();
    let wire = WireValue::List(vec![
        WireValue::Bool(true),
        WireValue::Double(1.5),
        WireValue::string("hi"),
    ]);
    let native = bridge.to_native(&wire, &TypeSpec::Any).unwrap();
    assert_eq!(
        native,
        NativeValue::List(vec![
            NativeValue::Bool(true),
            NativeValue::Double(1.5),
            NativeValue::Bytes(b"hi".to_vec()),
        ])
    );
    assert_eq!(bridge.to_wire(&native, &TypeSpec::Any).unwrap(), wire);
}

// =============================================================================
// Function adapters
// =============================================================================

#[test]
fn test_function_specs() {
    let bridge = bridge();
    assert_eq!(bridge.arg_spec("lookup", 0), Some(&TypeSpec::i64()));
    assert_eq!(bridge.arg_spec("lookup", 1), Some(&time_period()));
    assert_eq!(bridge.arg_spec("lookup", 2), None);
    assert_eq!(bridge.reply_spec("lookup"), Some(&TypeSpec::struct_ref("NeedsFixup")));
}

#[test]
fn test_server_side_adapters() {
    let bridge = bridge();
    let args = bridge
        .args_to_native("lookup", &[WireValue::Int(7), WireValue::Int(3)])
        .unwrap();
    assert_eq!(args, vec![NativeValue::Int(7), period(&bridge, "month")]);

    let reply = NativeRecord::new("NeedsFixup")
        .with("name", "Foo")
        .with("time", period(&bridge, "day"));
    assert_eq!(
        bridge.reply_to_wire("lookup", &NativeValue::Record(reply)).unwrap(),
        needs_fixup("Foo", 1)
    );
}

#[test]
fn test_client_side_adapters() {
    let bridge = bridge();
    let args = bridge
        .args_to_wire("lookup", &[NativeValue::Int(7), NativeValue::text("week")])
        .unwrap();
    assert_eq!(args, vec![WireValue::Int(7), WireValue::Int(2)]);

    let reply = bridge.reply_to_native("lookup", &needs_fixup("Bar", 2)).unwrap();
    assert_eq!(reply.as_record().unwrap().get("name"), Some(&NativeValue::text("Bar")));
}

#[test]
fn test_adapter_errors() {
    let bridge = bridge();
    let err = bridge.args_to_native("lookup", &[WireValue::Int(7)]).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ArityMismatch);

    let err = bridge.args_to_native("missing", &[]).unwrap_err();
    assert_eq!(err.code(), ErrorCode::UnknownFunction);

    let err = bridge
        .args_to_native("lookup", &[WireValue::Int(7), WireValue::string("x")])
        .unwrap_err();
    assert_eq!(err.path().unwrap().to_string(), "lookup(period)");
}
