//! Read-back comparison

use formprobe_schema::FieldValue;

/// Compare an expected scalar with what the control reports
///
/// Numbers compare numerically, everything else trimmed and
/// case-insensitively.
#[must_use]
pub fn scalar_matches(expected: &str, actual: &str) -> bool {
    let expected = expected.trim();
    let actual = actual.trim();
    if expected == actual {
        return true;
    }
    match (expected.parse::<f64>(), actual.parse::<f64>()) {
        (Ok(e), Ok(a)) => (e - a).abs() < f64::EPSILON,
        _ => expected.eq_ignore_ascii_case(actual),
    }
}

/// Whether a read-back value satisfies the expected rendering
///
/// For lists, the expected label only has to be among the selected items.
#[must_use]
pub fn value_matches(expected: &str, actual: &FieldValue) -> bool {
    match actual {
        FieldValue::List(items) => items.iter().any(|i| scalar_matches(expected, i)),
        FieldValue::NoValue => false,
        other => other
            .as_scalar_text()
            .is_some_and(|text| scalar_matches(expected, &text)),
    }
}

/// Rendering of a read-back value for error messages
#[must_use]
pub fn describe(actual: &FieldValue) -> String {
    match actual {
        FieldValue::List(items) => items.join(", "),
        other => other.as_scalar_text().unwrap_or_else(|| other.to_json_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_case_insensitive() {
        assert!(scalar_matches("2", " 2.0 "));
        assert!(scalar_matches("Yes", "yes"));
        assert!(!scalar_matches("10", "11"));
    }

    #[test]
    fn list_membership() {
        let v = FieldValue::List(vec!["Lab".into(), "Seminar".into()]);
        assert!(value_matches("Seminar", &v));
        assert!(!value_matches("Lecture", &v));
        assert!(!value_matches("", &FieldValue::NoValue));
        assert_eq!(describe(&v), "Lab, Seminar");
    }
}
