//! Property tests for masked comparison.

use proptest::prelude::*;
use report_conformance::compare::{compare_streams, compare_values};
use report_conformance::mask::MaskTable;
use serde_json::{Value, json};

/// Initialize test logging for proptest
fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z0-9-]{0,12}".prop_map(Value::from),
    ]
}

fn json_value() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn envelope(id: &Value, body: &Value) -> Value {
    json!({"testRunStarted": {"id": id, "timestamp": {"seconds": 0}}, "body": body})
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 100,
        ..Default::default()
    })]

    /// Property: every document equals itself with no mask
    #[test]
    fn comparison_is_reflexive(doc in json_value()) {
        init_test_logging();
        prop_assert!(compare_values(&doc, &doc, &MaskTable::new()).is_ok());
    }

    /// Property: any value at a masked path leaves the result unchanged
    #[test]
    fn masked_value_is_absorbed(
        expected_id in leaf(),
        actual_id in json_value(),
        body in json_value(),
    ) {
        init_test_logging();
        let expected = envelope(&expected_id, &body);
        let actual = envelope(&actual_id, &body);
        prop_assert!(compare_values(&actual, &expected, &MaskTable::standard()).is_ok());
    }

    /// Property: removing a masked field leaves the result unchanged
    #[test]
    fn masked_removal_is_absorbed(id in json_value(), body in json_value()) {
        init_test_logging();
        let expected = envelope(&id, &body);
        let mut actual = expected.clone();
        actual["testRunStarted"]
            .as_object_mut()
            .expect("object")
            .remove("id");
        prop_assert!(compare_values(&actual, &expected, &MaskTable::standard()).is_ok());
    }

    /// Property: masking a field never hides a difference elsewhere
    #[test]
    fn mask_does_not_leak(body in json_value(), other in json_value()) {
        init_test_logging();
        prop_assume!(body != other);
        let expected = envelope(&json!("run-1"), &body);
        let actual = envelope(&json!("run-2"), &other);
        prop_assert!(compare_values(&actual, &expected, &MaskTable::standard()).is_err());
    }

    /// Property: swapping two distinct lines of a stream is a mismatch
    #[test]
    fn streams_are_order_sensitive(
        lines in prop::collection::vec(json_value(), 2..6),
        i in any::<prop::sample::Index>(),
        j in any::<prop::sample::Index>(),
    ) {
        init_test_logging();
        let (i, j) = (i.index(lines.len()), j.index(lines.len()));
        prop_assume!(lines[i] != lines[j]);
        let mut swapped = lines.clone();
        swapped.swap(i, j);
        prop_assert!(compare_streams(&swapped, &lines, &MaskTable::new()).is_err());
    }

    /// Property: a stream missing or gaining a line is a mismatch
    #[test]
    fn streams_are_length_strict(
        lines in prop::collection::vec(json_value(), 1..6),
        extra in json_value(),
    ) {
        init_test_logging();
        let shorter = &lines[..lines.len() - 1];
        prop_assert!(compare_streams(shorter, &lines, &MaskTable::standard()).is_err());

        let mut longer = lines.clone();
        longer.push(extra);
        prop_assert!(compare_streams(&longer, &lines, &MaskTable::standard()).is_err());
    }
}
