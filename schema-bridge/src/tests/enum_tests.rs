//! Enum registry tests

use super::fixtures::{builder, oracle, time_period};
use crate::{BuildError, EnumDescriptor, EnumRegistry, EnumSymbol, ErrorCode};

fn registry() -> EnumRegistry {
    let mut registry = EnumRegistry::new();
    registry.register(time_period()).unwrap();
    registry
}

#[test]
fn test_symbol_and_value_lookups_agree() {
    let registry = registry();
    for (symbol, value) in [("day", 1), ("week", 2), ("month", 3)] {
        let forward = registry.by_symbol("TimePeriod", symbol).unwrap();
        assert_eq!(forward.value(), value);

        let reverse = registry.by_value("TimePeriod", value).unwrap();
        assert_eq!(reverse.symbol(), Some(symbol));
        assert_eq!(forward, reverse);
    }
}

#[test]
fn test_undeclared_value_is_unresolved() {
    let registry = registry();
    for value in [0, 4, -1, i64::MIN, i64::MAX] {
        let resolved = registry.by_value("TimePeriod", value).unwrap();
        assert_eq!(resolved.value(), value);
        assert_eq!(resolved.enum_symbol(), &EnumSymbol::Unresolved);
        assert!(!resolved.is_resolved());
    }
}

#[test]
fn test_unknown_symbol_fails() {
    let registry = registry();
    let err = registry.by_symbol("TimePeriod", "year").unwrap_err();
    assert_eq!(
        err,
        BuildError::UnknownEnumSymbol {
            enum_name: "TimePeriod".to_string(),
            symbol: "year".to_string()
        }
    );
}

#[test]
fn test_unknown_enum_is_lookup_error() {
    let registry = registry();
    assert_eq!(
        registry.by_value("Nope", 1).unwrap_err().code(),
        ErrorCode::SchemaLookup
    );
    assert_eq!(
        registry.by_symbol("Nope", "x").unwrap_err().code(),
        ErrorCode::SchemaLookup
    );
}

#[test]
fn test_duplicate_symbol_rejected() {
    let mut registry = EnumRegistry::new();
    let err = registry
        .register(EnumDescriptor::new("Dup").value("a", 1).value("a", 2))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::DuplicateEnumSymbol);
}

#[test]
fn test_aliased_value_resolves_to_first_symbol() {
    let mut registry = EnumRegistry::new();
    registry
        .register(EnumDescriptor::new("Level").value("warn", 2).value("warning", 2))
        .unwrap();
    assert_eq!(registry.by_value("Level", 2).unwrap().symbol(), Some("warn"));
    assert_eq!(registry.by_symbol("Level", "warning").unwrap().value(), 2);
}

#[test]
fn test_alias_symbol_is_canonicalized() {
    let mut registry = EnumRegistry::new();
    registry
        .register(EnumDescriptor::new("Level").value("warn", 2).value("warning", 2))
        .unwrap();
    let alias = registry.by_symbol("Level", "warning").unwrap();
    assert_eq!(alias.symbol(), Some("warn"));
    assert_eq!(alias, registry.by_value("Level", 2).unwrap());
    assert_eq!(alias, registry.by_symbol("Level", "warn").unwrap());
}

#[test]
fn test_declaration_order_accessors() {
    let registry = registry();
    assert_eq!(registry.ordinals("TimePeriod"), Some(vec!["day", "week", "month"]));
    assert_eq!(registry.values("TimePeriod"), Some(vec![1, 2, 3]));
    assert_eq!(
        registry.mappings("TimePeriod"),
        Some(vec![("day", 1), ("week", 2), ("month", 3)])
    );
    assert_eq!(registry.ordinals("Nope"), None);
}

#[test]
fn test_namespace_fallback() {
    let mut registry = EnumRegistry::with_namespace(Some("models".to_string()));
    let mut descriptor = time_period();
    descriptor.name = "models.TimePeriod".to_string();
    registry.register(descriptor).unwrap();

    assert!(registry.contains("TimePeriod"));
    assert!(registry.contains("models.TimePeriod"));
    let value = registry.by_symbol("TimePeriod", "week").unwrap();
    assert_eq!(value.enum_name(), "models.TimePeriod");
}

#[test]
fn test_display() {
    let registry = registry();
    assert_eq!(registry.by_value("TimePeriod", 1).unwrap().to_string(), "TimePeriod::day");
    assert_eq!(
        registry.by_value("TimePeriod", 9).unwrap().to_string(),
        "TimePeriod::<unresolved 9>"
    );
}

#[test]
fn test_bridge_rejects_unregistered_schema_enum() {
    let oracle = oracle();
    // Schedule references TimePeriod in its field types.
    let err = crate::BridgeBuilder::new(&oracle)
        .root_struct("Schedule")
        .build()
        .unwrap_err();
    assert_eq!(err, BuildError::lookup("enum", "TimePeriod", "schema"));

    assert!(builder(&oracle).build().is_ok());
}
