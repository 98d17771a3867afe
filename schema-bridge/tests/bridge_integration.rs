//! End-to-end tests: schema document in, shared bridge out.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use schema_bridge::prelude::*;
use schema_bridge::{CallbackRegistry, ErrorCode};

const DOCUMENT: &str = r#"{
  "namespace": "models",
  "structs": {
    "NeedsFixup": {
      "fields": [
        {"id": 1, "name": "name", "type": "string"},
        {"id": 2, "name": "time", "type": "i32"}
      ]
    },
    "Calendar": {
      "fields": [
        {"id": 1, "name": "entries", "type": {"list": {"struct": "NeedsFixup"}}},
        {"id": 2, "name": "busy", "type": {"set": "i32"}, "default": [1]}
      ]
    }
  },
  "functions": {
    "lookup": {
      "params": [{"id": 1, "name": "period", "type": "i32"}],
      "reply": {"struct": "NeedsFixup"}
    }
  },
  "enums": {
    "TimePeriod": [["day", 1], ["week", 2], ["month", 3]]
  },
  "overrides": {
    "fields": [
      {"struct": "NeedsFixup", "field": "time", "type": {"enum": "TimePeriod"}},
      {"struct": "Calendar", "field": "busy", "type": {"set": {"enum": "TimePeriod"}}}
    ],
    "functions": [{"function": "lookup", "args": {"0": {"enum": "TimePeriod"}}}]
  }
}"#;

fn build(callbacks: CallbackRegistry) -> Bridge {
    let document = SchemaDocument::from_json_str(DOCUMENT).unwrap();
    document.builder().callbacks(callbacks).build().unwrap()
}

fn needs_fixup(name: &str, time: i64) -> WireValue {
    WireValue::tuple("models.NeedsFixup", vec![name.into(), time.into()])
}

#[test]
fn test_bridge_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Bridge>();
    assert_send_sync::<Arc<Bridge>>();
}

#[test]
fn test_document_end_to_end() {
    let bridge = build(CallbackRegistry::new());

    let calendar = WireValue::tuple(
        "models.Calendar",
        vec![
            WireValue::List(vec![needs_fixup("a", 1), needs_fixup("b", 7)]),
            WireValue::set([2.into(), 3.into()]),
        ],
    );
    let native = bridge.struct_to_native("Calendar", &calendar).unwrap();
    let record = native.as_record().unwrap();
    assert_eq!(record.type_name, "Calendar");

    let NativeValue::List(entries) = record.get("entries").unwrap() else {
        panic!("entries should be a list");
    };
    let first = entries[0].as_record().unwrap().get("time").unwrap().as_enum().unwrap();
    assert_eq!(first.symbol(), Some("day"));
    let second = entries[1].as_record().unwrap().get("time").unwrap().as_enum().unwrap();
    assert!(!second.is_resolved());
    assert_eq!(second.value(), 7);

    let back = bridge.struct_to_wire("Calendar", record).unwrap();
    assert_eq!(back, calendar);
}

#[test]
fn test_document_defaults_use_overridden_types() {
    let bridge = build(CallbackRegistry::new());
    let record = bridge.new_record("Calendar").unwrap();

    let NativeValue::Set(busy) = record.get("busy").unwrap() else {
        panic!("busy should be a set");
    };
    let day = bridge.enums().by_value("models.TimePeriod", 1).unwrap();
    assert!(busy.contains(&NativeValue::Enum(day)));
    assert!(record.get("entries").unwrap().is_unset());
}

#[test]
fn test_function_adapters_from_document() {
    let bridge = build(CallbackRegistry::new());

    let args = bridge.args_to_native("lookup", &[2.into()]).unwrap();
    assert_eq!(args[0].as_enum().unwrap().symbol(), Some("week"));

    let reply = bridge.reply_to_native("lookup", &needs_fixup("x", 3)).unwrap();
    let wire = bridge.reply_to_wire("lookup", &reply).unwrap();
    assert_eq!(wire, needs_fixup("x", 3));

    let err = bridge.args_to_native("lookup", &[]).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ArityMismatch);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_bridge_across_tasks() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let callbacks = CallbackRegistry::new().on_to_native("NeedsFixup", Guard::always(), move |value| {
        counter.fetch_add(1, Ordering::SeqCst);
        value
    });
    let bridge = Arc::new(build(callbacks));

    let mut handles = Vec::new();
    for i in 0..16i64 {
        let bridge = Arc::clone(&bridge);
        handles.push(tokio::spawn(async move {
            let wire = needs_fixup(&format!("task-{i}"), i % 4);
            let native = bridge.struct_to_native("NeedsFixup", &wire).unwrap();
            let record = native.as_record().unwrap();
            bridge.struct_to_wire("NeedsFixup", record).unwrap() == wire
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 16);
}
