//! Property tests over arbitrary key paths and scalar values: reads reflect
//! the latest write, defaults never clobber data, and the path algebra
//! behaves.

use model_bind_core::{parse_path, EventContext, MemoryModel, ModelStore, Path};
use proptest::prelude::*;
use serde_json::Value;

fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,5}"
}

fn keys_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(key_strategy(), 1..4)
}

fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::from),
    ]
}

fn to_path(keys: &[String]) -> Path {
    let mut path = Path::new();
    for key in keys {
        path = path.child_key(key.clone());
    }
    path
}

fn ctx() -> EventContext {
    EventContext::new(70_000)
}

proptest! {
    #[test]
    fn set_then_read_round_trips(keys in keys_strategy(), value in scalar_strategy()) {
        let model = MemoryModel::new();
        let path = to_path(&keys);
        model.set(&path, value.clone(), ctx()).unwrap();
        prop_assert_eq!(model.read(&path), Some(value));
    }

    #[test]
    fn read_reflects_the_latest_write(
        keys in keys_strategy(),
        values in prop::collection::vec(scalar_strategy(), 1..6),
    ) {
        let model = MemoryModel::new();
        let path = to_path(&keys);
        for value in &values {
            model.set(&path, value.clone(), ctx()).unwrap();
        }
        let latest = model.read(&path);
        prop_assert_eq!(latest.as_ref(), values.last());
    }

    #[test]
    fn set_if_missing_never_overwrites(
        keys in keys_strategy(),
        existing in scalar_strategy(),
        fallback in scalar_strategy(),
    ) {
        let model = MemoryModel::new();
        let path = to_path(&keys);
        model.set(&path, existing.clone(), ctx()).unwrap();

        let written = model.set_if_missing(&path, fallback, ctx()).unwrap();

        prop_assert!(!written, "a present value must never be replaced");
        prop_assert_eq!(model.read(&path), Some(existing));
    }

    #[test]
    fn sibling_writes_stay_isolated(
        keys in keys_strategy(),
        left in scalar_strategy(),
        right in scalar_strategy(),
    ) {
        let model = MemoryModel::new();
        let base = to_path(&keys);
        let left_path = base.child_key("left");
        let right_path = base.child_key("right");

        model.set(&left_path, left.clone(), ctx()).unwrap();
        model.set(&right_path, right.clone(), ctx()).unwrap();

        prop_assert_eq!(model.read(&left_path), Some(left));
        prop_assert_eq!(model.read(&right_path), Some(right));
    }

    #[test]
    fn display_parse_round_trips(keys in prop::collection::vec(key_strategy(), 1..5)) {
        let path = to_path(&keys);
        let reparsed = parse_path(&path.to_string()).unwrap();
        prop_assert_eq!(reparsed, path);
    }

    #[test]
    fn prefix_relation_covers_descendants(keys in keys_strategy(), extra in key_strategy()) {
        let path = to_path(&keys);
        let child = path.child_key(extra);

        prop_assert!(path.is_prefix_of(&child));
        prop_assert!(path.prefix_related(&child));
        prop_assert!(child.prefix_related(&path), "relation is symmetric");
        prop_assert!(Path::new().is_prefix_of(&path), "root prefixes everything");
        prop_assert!(!child.is_prefix_of(&path));
    }
}
