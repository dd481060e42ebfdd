//! Properties of the difference classifier

use formprobe_engine::{classify, DiffInputs, DiffStatus, FieldSnapshot};
use formprobe_policy::SkipRegistry;
use formprobe_schema::FieldValue;
use indexmap::IndexSet;
use proptest::prelude::*;
use std::collections::HashSet;

const KEYS: [&str; 6] = ["title", "code", "seats", "isActive", "tags", "sisId"];

#[derive(Debug, Clone)]
struct Case {
    before: Vec<(usize, String)>,
    after: Vec<(usize, String)>,
    hidden: Vec<usize>,
    disabled: Vec<usize>,
    skipped: Vec<usize>,
}

fn case() -> impl Strategy<Value = Case> {
    let entries = || proptest::collection::vec((0..KEYS.len(), "[a-c]{0,2}"), 0..8);
    let picks = || proptest::collection::vec(0..KEYS.len(), 0..3);
    (entries(), entries(), picks(), picks(), picks()).prop_map(
        |(before, after, hidden, disabled, skipped)| Case {
            before,
            after,
            hidden,
            disabled,
            skipped,
        },
    )
}

fn snapshot(entries: &[(usize, String)], hidden: &[usize]) -> FieldSnapshot {
    let mut snap = FieldSnapshot::new();
    for (k, v) in entries {
        snap.insert(KEYS[*k], KEYS[*k], KEYS[*k], FieldValue::text(v.clone()));
    }
    for k in hidden {
        snap.mark_hidden(KEYS[*k]);
    }
    snap
}

proptest! {
    #[test]
    fn rows_are_unique_and_never_hidden(c in case()) {
        let before = snapshot(&c.before, &c.hidden);
        let after = snapshot(&c.after, &[]);
        let disabled: IndexSet<String> = c.disabled.iter().map(|k| KEYS[*k].to_string()).collect();
        let mut skips = SkipRegistry::new();
        for k in &c.skipped {
            skips.record(KEYS[*k], "protected");
        }

        let rows = classify(&DiffInputs::new(&before, &after, &skips, &disabled));

        let mut seen = HashSet::new();
        for row in &rows {
            prop_assert!(seen.insert(row.qid.clone()), "duplicate row {}", row.qid);
            prop_assert!(!before.is_hidden(&row.qid));
            prop_assert!(before.get(&row.qid).is_some() || after.get(&row.qid).is_some());
            if disabled.contains(&row.qid) {
                prop_assert_eq!(row.status, DiffStatus::Disabled);
            } else if skips.contains(&row.qid) {
                prop_assert_eq!(row.status, DiffStatus::Skipped);
            }
        }
    }

    #[test]
    fn classification_is_pure(c in case()) {
        let before = snapshot(&c.before, &c.hidden);
        let after = snapshot(&c.after, &c.hidden);
        let disabled: IndexSet<String> = c.disabled.iter().map(|k| KEYS[*k].to_string()).collect();
        let skips = SkipRegistry::new();
        let inputs = DiffInputs::new(&before, &after, &skips, &disabled);
        prop_assert_eq!(classify(&inputs), classify(&inputs));
    }

    #[test]
    fn identical_snapshots_never_report_updates(c in case()) {
        let before = snapshot(&c.before, &[]);
        let rows = classify(&DiffInputs::new(&before, &before, &SkipRegistry::new(), &IndexSet::new()));
        prop_assert!(rows.iter().all(|r| r.status == DiffStatus::Unable));
        prop_assert_eq!(rows.len(), before.len());
    }
}
