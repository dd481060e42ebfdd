//! Normalisation properties of captured values.

use formprobe_schema::{FieldValue, Template};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_list_equality_ignores_order(mut items in proptest::collection::vec("[a-z]{1,8}", 0..6)) {
        let a = FieldValue::List(items.clone());
        items.reverse();
        let b = FieldValue::List(items);
        prop_assert!(a.normalized_eq(&b));
    }

    #[test]
    fn prop_text_equality_ignores_surrounding_whitespace(s in "[A-Za-z0-9 ]{0,20}", pad in " {0,3}") {
        let padded = FieldValue::text(format!("{pad}{s}{pad}"));
        prop_assert!(padded.normalized_eq(&FieldValue::text(s)));
    }

    #[test]
    fn prop_integral_numbers_match_text(n in -10_000i64..10_000) {
        #[allow(clippy::cast_precision_loss)]
        let number = FieldValue::Number(n as f64);
        prop_assert!(number.normalized_eq(&FieldValue::text(n.to_string())));
    }
}

#[test]
fn json_round_trip_keeps_no_value_marker() {
    let values = vec![
        FieldValue::NoValue,
        FieldValue::text(""),
        FieldValue::Bool(true),
        FieldValue::List(vec!["Biology".into()]),
    ];
    let json = serde_json::to_string(&values).unwrap();
    assert_eq!(json, r#"["no-value","",true,["Biology"]]"#);
    let back: Vec<FieldValue> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, values);
}

#[test]
fn template_from_missing_file_is_io_error() {
    let err = Template::from_path("/definitely/not/here.json").unwrap_err();
    assert!(matches!(err, formprobe_schema::TemplateError::Io { .. }));
}
