//! Command support functions against files on disk

use formprobe_cli::{classify_files, inspect, policy_skips, render_page};
use formprobe_engine::{DiffStatus, EngineConfig, FieldSnapshot, FormProbe};
use formprobe_policy::{ActionContext, ActionKind, SkipPolicy};
use formprobe_schema::FieldValue;
use formprobe_test_utils::course_template;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};

fn write_snapshot(dir: &Path, name: &str, snap: &FieldSnapshot) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, snap.to_json_pretty().unwrap()).unwrap();
    path
}

fn before() -> FieldSnapshot {
    let mut snap = FieldSnapshot::new();
    snap.insert("title", "title", "Title", FieldValue::text("Intro to Biology"));
    snap.insert("sisId", "sisId", "SIS ID", FieldValue::text("SIS-1001"));
    snap.insert("status", "status", "Status", FieldValue::text("Active"));
    snap.insert("department", "department", "Department", FieldValue::text("Biology"));
    snap.insert("internalNotes", "internalNotes", "Internal Notes", FieldValue::NoValue);
    snap.mark_hidden("internalNotes");
    snap
}

fn after() -> FieldSnapshot {
    let mut snap = before();
    snap.insert("title", "title", "Title", FieldValue::text("Intro to Biol-CDtest"));
    snap.mark_disabled("status");
    snap
}

#[test]
fn classifies_snapshot_files_with_template_skips() {
    let dir = tempfile::tempdir().unwrap();
    let before = write_snapshot(dir.path(), "before.json", &before());
    let after = write_snapshot(dir.path(), "after.json", &after());
    let skips = policy_skips(
        &course_template(),
        &ActionContext::for_kind(ActionKind::Update),
        &SkipPolicy::new(),
    );

    let report = classify_files(&before, &after, &skips, None, "course", ActionKind::Update).unwrap();

    let fates: Vec<(&str, DiffStatus)> = report
        .rows
        .iter()
        .map(|r| (r.qid.as_str(), r.status))
        .collect();
    assert_eq!(
        fates,
        vec![
            ("title", DiffStatus::Updated),
            ("sisId", DiffStatus::Skipped),
            ("status", DiffStatus::Disabled),
            ("department", DiffStatus::Unable),
        ]
    );
    assert_eq!(report.entity, "course");
    assert_eq!(report.counts.total(), 4);
}

#[test]
fn allow_list_narrows_file_classification() {
    let dir = tempfile::tempdir().unwrap();
    let before = write_snapshot(dir.path(), "before.json", &before());
    let after = write_snapshot(dir.path(), "after.json", &after());
    let only = vec!["department".to_string()];

    let report = classify_files(
        &before,
        &after,
        &formprobe_policy::SkipRegistry::new(),
        Some(only.as_slice()),
        "course",
        ActionKind::Update,
    )
    .unwrap();

    let qids: Vec<&str> = report.rows.iter().map(|r| r.qid.as_str()).collect();
    assert_eq!(qids, vec!["status", "department"]);
}

#[test]
fn malformed_snapshot_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_snapshot(dir.path(), "before.json", &before());
    let bad = dir.path().join("after.json");
    std::fs::write(&bad, "{ not json").unwrap();

    let err = classify_files(
        &good,
        &bad,
        &formprobe_policy::SkipRegistry::new(),
        None,
        "course",
        ActionKind::Update,
    )
    .unwrap_err();
    assert!(err.to_string().contains("after.json"), "error: {err}");
}

#[test]
fn inspect_course_template_for_inactivate() {
    let lines = inspect(
        &course_template(),
        &ActionContext::for_kind(ActionKind::Inactivate),
        &SkipPolicy::new(),
    );

    let decision = |qid: &str| {
        lines
            .iter()
            .find(|l| l.qid == qid)
            .map(|l| l.decision.clone())
            .unwrap()
    };
    assert_eq!(decision("status"), "process");
    assert!(decision("title").starts_with("skip: "));
    assert_eq!(decision("internalNotes"), "hidden");
    let credit = lines.iter().find(|l| l.qid == "creditHours").unwrap();
    assert_eq!(credit.leaves, vec!["creditHours.min", "creditHours.max"]);
}

#[tokio::test]
async fn rendered_page_snapshots_every_visible_question() {
    let template = course_template();
    let probe = FormProbe::new(render_page(&template), EngineConfig::default());

    let snap = probe.snapshot(&template).await.unwrap();

    assert!(snap.is_hidden("internalNotes"));
    assert!(!snap.is_hidden("title"));
    assert!(snap.get("creditHours.min").is_some());
    assert_eq!(
        snap.get("isActive").and_then(FieldValue::as_scalar_text),
        Some(String::new())
    );
}
