//! Shared schema used across the unit tests.
//!
//! - `NeedsFixup { name: string, time: i32 }`, with `time` overridden to `TimePeriod`
//! - `DefaultMap { mappings: map<string, i32> = {"cats": 3, "dogs": 4} }`
//! - `Schedule` with nested enum lists, an enum-keyed map, a set and a struct field
//! - `Person` / `Pet`, which reference each other
//! - function `lookup(id: i64, period: i32) -> NeedsFixup`, `period` overridden

use crate::{
    Bridge, BridgeBuilder, EnumDescriptor, NativeValue, OverrideSpec, RawField, RawFunction,
    RawType, StaticOracle, TypeSpec, WireValue,
};

pub fn time_period() -> EnumDescriptor {
    EnumDescriptor::new("TimePeriod")
        .value("day", 1)
        .value("week", 2)
        .value("month", 3)
}

pub fn color() -> EnumDescriptor {
    EnumDescriptor::new("Color").value("red", 1).value("green", 2)
}

pub fn oracle() -> StaticOracle {
    StaticOracle::new()
        .with_struct(
            "NeedsFixup",
            vec![
                RawField::new(1, "name", RawType::name("string")),
                RawField::new(2, "time", RawType::name("i32")),
            ],
        )
        .with_struct(
            "DefaultMap",
            vec![RawField::new(
                1,
                "mappings",
                RawType::map(RawType::name("string"), RawType::name("i32")),
            )
            .with_default(WireValue::map([
                (WireValue::string("cats"), WireValue::Int(3)),
                (WireValue::string("dogs"), WireValue::Int(4)),
            ]))],
        )
        .with_struct(
            "Schedule",
            vec![
                RawField::new(
                    1,
                    "periods",
                    RawType::list(RawType::list(RawType::enum_ref("TimePeriod"))),
                ),
                RawField::new(
                    2,
                    "labels",
                    RawType::map(RawType::enum_ref("TimePeriod"), RawType::name("string")),
                ),
                RawField::new(3, "tags", RawType::set(RawType::name("string"))),
                RawField::new(4, "owner", RawType::struct_ref("Person")).with_default(
                    WireValue::tuple("Person", vec![WireValue::string("x"), WireValue::Unset, WireValue::Unset]),
                ),
            ],
        )
        .with_struct(
            "Person",
            vec![
                RawField::new(1, "name", RawType::name("string")).required(),
                RawField::new(2, "pets", RawType::list(RawType::struct_ref("Pet"))),
                RawField::new(3, "nickname", RawType::name("string"))
                    .with_default(WireValue::string("anon")),
            ],
        )
        .with_struct(
            "Pet",
            vec![
                RawField::new(1, "name", RawType::name("string")),
                RawField::new(2, "owner", RawType::struct_ref("Person")),
            ],
        )
        .with_function(
            "lookup",
            RawFunction::new(
                vec![
                    RawField::new(1, "id", RawType::name("i64")),
                    RawField::new(2, "period", RawType::name("i32")),
                ],
                RawType::struct_ref("NeedsFixup"),
            ),
        )
}

pub fn builder(oracle: &StaticOracle) -> BridgeBuilder<'_> {
    BridgeBuilder::new(oracle)
        .root_struct("NeedsFixup")
        .root_struct("DefaultMap")
        .root_struct("Schedule")
        .root_function("lookup")
        .enumeration(time_period())
        .enumeration(color())
        .struct_override("NeedsFixup", "time", TypeSpec::enum_ref("TimePeriod"))
        .function_override("lookup", OverrideSpec::new().arg(1, TypeSpec::enum_ref("TimePeriod")))
}

pub fn bridge() -> Bridge {
    builder(&oracle()).build().expect("fixture bridge builds")
}

pub fn period(bridge: &Bridge, symbol: &str) -> NativeValue {
    NativeValue::Enum(
        bridge
            .enums()
            .by_symbol("TimePeriod", symbol)
            .expect("declared symbol"),
    )
}

pub fn ints(values: &[i64]) -> WireValue {
    WireValue::List(values.iter().copied().map(WireValue::Int).collect())
}

pub fn needs_fixup(name: &str, time: i64) -> WireValue {
    WireValue::tuple("NeedsFixup", vec![WireValue::string(name), WireValue::Int(time)])
}
