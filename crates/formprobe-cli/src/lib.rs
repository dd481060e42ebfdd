//! FormProbe command-line support
//!
//! The binary is a thin shell over these functions so they can be tested
//! without spawning a process.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

use anyhow::{Context, Result};
use formprobe_driver::MemoryPage;
use formprobe_engine::{
    classify, DiffInputs, DiffReport, EngineConfig, FieldSnapshot, FormProbe, RunId, RunReport,
};
use formprobe_policy::{ActionContext, ActionKind, SkipDecision, SkipPolicy, SkipRegistry};
use formprobe_schema::{FieldPath, Question, QuestionType, Template};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

/// Option labels rendered for every choice control in a dry run
pub const DRY_RUN_OPTIONS: [&str; 3] = ["Option A", "Option B", "Option C"];

/// What a run would do with one top-level question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectLine {
    /// Top-level qid
    pub qid: String,
    /// Declared type
    pub question_type: String,
    /// `process`, `hidden`, or `skip: <reason>`
    pub decision: String,
    /// Composite leaf paths
    pub leaves: Vec<String>,
}

/// Decide every top-level question for an action
#[must_use]
pub fn inspect(template: &Template, action: &ActionContext, policy: &SkipPolicy) -> Vec<InspectLine> {
    template
        .questions()
        .map(|q| {
            let decision = if q.is_schema_hidden() {
                "hidden".to_string()
            } else {
                match policy.evaluate(q, action) {
                    SkipDecision::Process => "process".to_string(),
                    SkipDecision::Skip(reason) => format!("skip: {reason}"),
                }
            };
            InspectLine {
                qid: q.qid.clone(),
                question_type: q.question_type.to_string(),
                decision,
                leaves: formprobe_schema::leaf_paths(&FieldPath::top_level(q.qid.clone()), q)
                    .iter()
                    .map(FieldPath::dotted)
                    .collect(),
            }
        })
        .collect()
}

/// Plain-text rendering of [`inspect`] output
#[must_use]
pub fn render_inspect(lines: &[InspectLine]) -> String {
    let mut out = String::new();
    for line in lines {
        let _ = writeln!(out, "{:<24} {:<14} {}", line.qid, line.question_type, line.decision);
        for leaf in &line.leaves {
            let _ = writeln!(out, "  {leaf}");
        }
    }
    out
}

/// Skip registry a run would build from policy alone
#[must_use]
pub fn policy_skips(template: &Template, action: &ActionContext, policy: &SkipPolicy) -> SkipRegistry {
    let mut skips = SkipRegistry::new();
    for q in template.questions().filter(|q| !q.is_schema_hidden()) {
        if let SkipDecision::Skip(reason) = policy.evaluate(q, action) {
            skips.record(q.qid.clone(), reason);
        }
    }
    skips
}

/// Classify two snapshot files
///
/// # Errors
/// Unreadable or malformed snapshot files
pub fn classify_files(
    before: &Path,
    after: &Path,
    skips: &SkipRegistry,
    allow_list: Option<&[String]>,
    entity: &str,
    action: ActionKind,
) -> Result<DiffReport> {
    let before = FieldSnapshot::from_path(before)
        .with_context(|| format!("reading snapshot {}", before.display()))?;
    let after = FieldSnapshot::from_path(after)
        .with_context(|| format!("reading snapshot {}", after.display()))?;

    let mut disabled = before.disabled().clone();
    disabled.extend(after.disabled().iter().cloned());
    let mut inputs = DiffInputs::new(&before, &after, skips, &disabled);
    if let Some(allow) = allow_list {
        inputs = inputs.with_allow_list(allow);
    }
    Ok(DiffReport::new(RunId::new(), entity, action, classify(&inputs)))
}

/// Render a template onto an in-memory page with empty controls
#[must_use]
pub fn render_page(template: &Template) -> Arc<MemoryPage> {
    let page = Arc::new(MemoryPage::new());
    for q in template.questions().filter(|q| !q.is_schema_hidden()) {
        render_question(&page, q);
    }
    page
}

fn render_question(page: &MemoryPage, q: &Question) {
    let qid = q.qid.as_str();
    if q.is_composite() {
        let wrapper = page.add_wrapper(qid, None);
        for (key, sub) in q.subfields() {
            if sub.question_type == QuestionType::Number {
                page.named_number(wrapper, key, "");
            } else {
                page.add_input(Some(wrapper), None, Some(key), "");
            }
        }
        return;
    }
    let control = match &q.question_type {
        QuestionType::LongText => page.long_text_field(qid, ""),
        QuestionType::RichText => page.rich_text_field(qid, ""),
        QuestionType::Number => page.number_field(qid, ""),
        QuestionType::SingleChoice => page.choice_field(qid, &DRY_RUN_OPTIONS, false),
        QuestionType::MultiChoice => page.choice_field(qid, &DRY_RUN_OPTIONS, true),
        QuestionType::YesNo => page.yes_no_field(qid, None),
        QuestionType::Text | QuestionType::Date | QuestionType::Other(_) | QuestionType::Composite => {
            page.text_field(qid, "")
        }
    };
    if let Some(max) = q.max_length() {
        page.set_max_length(control, max);
    }
}

/// Run the engine against a rendered in-memory page
///
/// # Errors
/// Engine failures
pub async fn dry_run(template: &Template, action: ActionContext, config: EngineConfig) -> Result<RunReport> {
    let page = render_page(template);
    let probe = FormProbe::new(page, config);
    let run = probe.run(template, action).await.context("dry run failed")?;
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> Template {
        Template::new(
            "course",
            vec![
                Question::new("title", "Title", QuestionType::Text),
                Question::new("sisId", "SIS ID", QuestionType::Text),
                Question::new("creditHours", "Credit Hours", QuestionType::Composite)
                    .with_subfield("min", Question::new("", "Min", QuestionType::Number))
                    .with_subfield("max", Question::new("", "Max", QuestionType::Number)),
                Question::new("notes", "Notes", QuestionType::LongText).hidden(),
            ],
        )
    }

    #[test]
    fn inspect_reports_decisions_and_leaves() {
        let lines = inspect(
            &template(),
            &ActionContext::for_kind(ActionKind::Update),
            &SkipPolicy::new(),
        );
        assert_eq!(lines[0].decision, "process");
        assert!(lines[1].decision.starts_with("skip: protected"));
        assert_eq!(lines[2].leaves, vec!["creditHours.min", "creditHours.max"]);
        assert_eq!(lines[3].decision, "hidden");

        let text = render_inspect(&lines);
        assert!(text.contains("  creditHours.min"));
    }

    #[test]
    fn policy_skips_ignore_hidden_questions() {
        let t = Template::new(
            "course",
            vec![Question::new("sisId", "SIS ID", QuestionType::Text).hidden()],
        );
        let skips = policy_skips(&t, &ActionContext::for_kind(ActionKind::Update), &SkipPolicy::new());
        assert!(skips.is_empty());
    }

    #[tokio::test]
    async fn dry_run_updates_rendered_fields() {
        let run = dry_run(
            &template(),
            ActionContext::for_kind(ActionKind::Update),
            EngineConfig::default()
                .with_rng_seed(3)
                .with_settle_delay(std::time::Duration::from_millis(1)),
        )
        .await
        .unwrap();
        assert_eq!(
            run.report.row("title").map(|r| r.status),
            Some(formprobe_engine::DiffStatus::Updated)
        );
        assert_eq!(
            run.report.row("sisId").map(|r| r.status),
            Some(formprobe_engine::DiffStatus::Skipped)
        );
        assert!(run.report.row("notes").is_none());
    }
}
