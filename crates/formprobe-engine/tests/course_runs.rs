//! End-to-end runs against the in-memory course form

use async_trait::async_trait;
use formprobe_driver::{DriverError, MemoryPage, UiDriver};
use formprobe_engine::{
    Diagnostic, DiffStatus, EngineConfig, FormProbe, FormSaver, RunContext, RunReport,
};
use formprobe_policy::{ActionContext, ActionKind, CanonicalSuffix};
use formprobe_schema::{Question, QuestionType, Template};
use formprobe_test_utils::{course_page, course_template, fixed_today, CoursePage};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn config() -> EngineConfig {
    EngineConfig::default()
        .with_rng_seed(7)
        .with_settle_delay(Duration::from_millis(1))
        .with_interaction_timeout(Duration::from_millis(500))
}

fn probe(course: &CoursePage, config: EngineConfig) -> FormProbe {
    FormProbe::new(course.page.clone(), config).with_today(fixed_today())
}

async fn run_update(course: &CoursePage, config: EngineConfig) -> RunReport {
    probe(course, config)
        .run(&course_template(), ActionContext::for_kind(ActionKind::Update))
        .await
        .unwrap()
}

fn status(run: &RunReport, qid: &str) -> DiffStatus {
    run.report
        .row(qid)
        .unwrap_or_else(|| panic!("no row for {qid}"))
        .status
}

#[tokio::test]
async fn title_is_clamped_to_max_length_with_suffix() {
    let course = course_page();
    let run = run_update(&course, config()).await;

    let title = course.page.value(course.title).unwrap();
    assert_eq!(title, "Intro to Biol-CDtest");
    assert_eq!(title.chars().count(), 20);
    assert_eq!(status(&run, "title"), DiffStatus::Updated);
    assert_eq!(run.report.row("title").unwrap().after, "\"Intro to Biol-CDtest\"");
}

#[tokio::test]
async fn empty_credit_hours_become_one_and_two() {
    let course = course_page();
    let run = run_update(&course, config()).await;

    assert_eq!(course.page.value(course.credit_min).unwrap(), "1");
    assert_eq!(course.page.value(course.credit_max).unwrap(), "2");
    assert_eq!(status(&run, "creditHours.min"), DiffStatus::Updated);
    assert_eq!(status(&run, "creditHours.max"), DiffStatus::Updated);
    assert_eq!(status(&run, "creditHours"), DiffStatus::Updated);
}

#[tokio::test]
async fn yes_no_flips_from_no_to_yes() {
    let course = course_page();
    let run = run_update(&course, config()).await;

    assert_eq!(course.page.active_toggle(course.is_active).as_deref(), Some("Yes"));
    let row = run.report.row("isActive").unwrap();
    assert_eq!(row.status, DiffStatus::Updated);
    assert_eq!(row.before, "\"No\"");
    assert_eq!(row.after, "\"Yes\"");
}

#[tokio::test]
async fn empty_remote_choice_is_unable_with_empty_mapping() {
    let course = course_page();
    let run = run_update(&course, config()).await;

    let row = run.report.row("tags").unwrap();
    assert_eq!(row.status, DiffStatus::Unable);
    assert!(row.comment.contains("empty mapping"), "comment: {}", row.comment);
    assert_eq!(course.page.filter_history(course.tags).len(), 8);
}

#[tokio::test]
async fn sis_id_is_skipped_under_update() {
    let course = course_page();
    let run = run_update(&course, config()).await;

    let row = run.report.row("sisId").unwrap();
    assert_eq!(row.status, DiffStatus::Skipped);
    assert!(row.comment.contains("protected-field policy"));
    assert_eq!(course.page.value(course.sis_id).unwrap(), "SIS-1001");
    assert!(run.diagnostics.contains(&Diagnostic::SkipField {
        qid: "sisId".into(),
        reason: "protected by the update action's protected-field policy".into(),
    }));
}

#[tokio::test]
async fn every_field_fate_is_classified() {
    let course = course_page();
    let run = run_update(&course, config()).await;

    assert_eq!(status(&run, "department"), DiffStatus::Updated);
    assert_eq!(status(&run, "description"), DiffStatus::Updated);
    assert_eq!(status(&run, "startDate"), DiffStatus::Updated);
    assert_eq!(status(&run, "status"), DiffStatus::Disabled);
    assert_eq!(status(&run, "syllabus"), DiffStatus::Skipped);
    assert!(run.report.row("internalNotes").is_none());

    assert_eq!(course.page.value(course.start_date).unwrap(), "March 5, 2024");
    assert_ne!(course.page.selection(course.department), vec!["Biology".to_string()]);
    assert_eq!(
        course.page.value(course.description).unwrap(),
        "Cells and organisms-CDtest"
    );
    assert_eq!(course.page.value(course.status).unwrap(), "Active");
    assert_eq!(run.report.counts.total(), run.report.rows.len());
}

#[tokio::test]
async fn second_run_keeps_a_single_suffix() {
    let course = course_page();
    run_update(&course, config()).await;
    let second = run_update(&course, config()).await;

    let title = course.page.value(course.title).unwrap();
    assert_eq!(CanonicalSuffix::default().occurrences(&title), 1);
    let row = second.report.row("title").unwrap();
    assert_eq!(row.status, DiffStatus::Unable);
    assert_eq!(row.comment, "value unchanged");
}

#[tokio::test]
async fn frozen_date_reports_verification_failure() {
    let course = course_page();
    course.page.freeze(course.start_date);
    let run = run_update(&course, config()).await;

    let row = run.report.row("startDate").unwrap();
    assert_eq!(row.status, DiffStatus::Unable);
    assert!(row.comment.starts_with("verification failed"), "comment: {}", row.comment);
}

#[tokio::test]
async fn prompt_appearing_mid_run_is_dismissed() {
    let course = course_page();
    course.page.interstitial_after_clicks(2);
    let run = run_update(&course, config()).await;

    assert!(!course.page.interstitial_shown());
    assert_eq!(status(&run, "isActive"), DiffStatus::Updated);
    assert_eq!(status(&run, "startDate"), DiffStatus::Updated);
}

#[tokio::test]
async fn missing_control_is_reported_as_not_found() {
    let course = course_page();
    course.page.detach(course.start_date);
    let run = run_update(&course, config()).await;

    let row = run.report.row("startDate").unwrap();
    assert_eq!(row.status, DiffStatus::Unable);
    assert_eq!(row.comment, "could not find field");
    assert!(run.diagnostics.contains(&Diagnostic::FieldNotFound {
        qid: "startDate".into(),
        label: "Start Date".into(),
    }));
}

#[tokio::test]
async fn allow_list_keeps_disabled_and_skipped_rows() {
    let course = course_page();
    let run = run_update(&course, config().with_allow_list(["title"])).await;

    let qids: Vec<&str> = run.report.rows.iter().map(|r| r.qid.as_str()).collect();
    assert_eq!(qids, vec!["title", "sisId", "status", "syllabus"]);
}

#[derive(Debug, Default)]
struct CountingSaver {
    saves: AtomicUsize,
}

#[async_trait]
impl FormSaver for CountingSaver {
    async fn save(&self, _driver: &dyn UiDriver) -> Result<(), DriverError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn saver_runs_once_between_snapshots() {
    let course = course_page();
    let saver = Arc::new(CountingSaver::default());
    let run = probe(&course, config())
        .with_saver(saver.clone())
        .run(&course_template(), ActionContext::for_kind(ActionKind::Update))
        .await
        .unwrap();

    assert_eq!(saver.saves.load(Ordering::SeqCst), 1);
    assert_eq!(run.after.get("isActive").and_then(|v| v.as_scalar_text()).as_deref(), Some("Yes"));
}

#[tokio::test]
async fn inactivate_only_touches_its_overrides() {
    let course = course_page();
    let run = probe(&course, config())
        .run(&course_template(), ActionContext::for_kind(ActionKind::Inactivate))
        .await
        .unwrap();

    assert_eq!(status(&run, "title"), DiffStatus::Skipped);
    assert_eq!(course.page.value(course.title).unwrap(), "Intro to Biology");
}

fn credit_with_hidden_note() -> (Arc<MemoryPage>, Template) {
    let page = Arc::new(MemoryPage::new());
    let credit = page.add_wrapper("creditHours", None);
    page.named_number(credit, "min", "");
    let note = page.add_wrapper("creditHours.note", Some(credit));
    page.mark_hidden(note);

    let template = Template::new(
        "course",
        vec![Question::new("creditHours", "Credit Hours", QuestionType::Composite)
            .with_subfield("min", Question::new("", "Minimum", QuestionType::Number))
            .with_subfield("note", Question::new("", "Note", QuestionType::Text))],
    );
    (page, template)
}

#[tokio::test]
async fn hidden_composite_leaf_is_never_touched() {
    let (page, template) = credit_with_hidden_note();
    let probe = FormProbe::new(page, config()).with_today(fixed_today());

    let before = probe.snapshot(&template).await.unwrap();
    assert!(before.is_hidden("creditHours.note"));

    let mut ctx = RunContext::new(ActionContext::for_kind(ActionKind::Update), Some(7));
    probe.fill(&template, &mut ctx, &before).await.unwrap();
    assert!(!ctx.is_processed("creditHours.note"));
    assert!(ctx.diagnostics().is_empty());
    assert!(!ctx.unable_reasons().contains_key("creditHours.note"));
}

#[tokio::test]
async fn hidden_composite_leaf_has_no_row_or_diagnostic() {
    let (page, template) = credit_with_hidden_note();
    let run = FormProbe::new(page, config())
        .with_today(fixed_today())
        .run(&template, ActionContext::for_kind(ActionKind::Update))
        .await
        .unwrap();

    assert!(run.report.row("creditHours.note").is_none());
    assert_eq!(status(&run, "creditHours.min"), DiffStatus::Updated);
    assert!(run.diagnostics.is_empty(), "diagnostics: {:?}", run.diagnostics);
}
