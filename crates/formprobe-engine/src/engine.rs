//! Run orchestration
//!
//! A run takes a before snapshot, fills every eligible field in template
//! order, hands the form to the save collaborator, takes an after snapshot,
//! and classifies the difference. Per-field failures become report rows;
//! only a streak of infrastructure failures aborts the run.

use crate::config::EngineConfig;
use crate::context::RunContext;
use crate::diagnostics::Diagnostic;
use crate::diff::{classify, DiffInputs};
use crate::error::EngineError;
use crate::fill::{record_outcome, FieldFiller};
use crate::interstitial::dismiss_interstitial;
use crate::report::DiffReport;
use crate::resolver::FieldResolver;
use crate::snapshot::{FieldSnapshot, SnapshotReader};
use crate::surface::Surface;
use chrono::NaiveDate;
use formprobe_driver::{DriverError, UiDriver};
use formprobe_policy::{ActionContext, GeneratorContext, SkipDecision, SkipPolicy, ValueGenerator};
use formprobe_schema::Template;
use std::sync::Arc;

/// Persists the filled form
///
/// Implement this trait to submit the form between filling and the after
/// snapshot.
#[async_trait::async_trait]
pub trait FormSaver: Send + Sync {
    /// Save the current form state
    async fn save(&self, driver: &dyn UiDriver) -> Result<(), DriverError>;
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Classified rows
    pub report: DiffReport,
    /// Snapshot before filling
    pub before: FieldSnapshot,
    /// Snapshot after saving
    pub after: FieldSnapshot,
    /// Diagnostics in emission order
    pub diagnostics: Vec<Diagnostic>,
}

/// Template-driven form exerciser
pub struct FormProbe {
    surface: Surface,
    config: EngineConfig,
    resolver: FieldResolver,
    skip_policy: SkipPolicy,
    saver: Option<Arc<dyn FormSaver>>,
    today: NaiveDate,
}

impl std::fmt::Debug for FormProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormProbe")
            .field("surface", &self.surface)
            .field("config", &self.config)
            .field("resolver", &self.resolver)
            .field("skip_policy", &self.skip_policy)
            .field("today", &self.today)
            .finish_non_exhaustive()
    }
}

impl FormProbe {
    /// Create an engine over a driver
    #[must_use]
    pub fn new(driver: Arc<dyn UiDriver>, config: EngineConfig) -> Self {
        Self {
            surface: Surface::new(driver, config.interaction_timeout()),
            config,
            resolver: FieldResolver::with_defaults(),
            skip_policy: SkipPolicy::new(),
            saver: None,
            today: chrono::Local::now().date_naive(),
        }
    }

    /// With a save collaborator
    #[inline]
    #[must_use]
    pub fn with_saver(mut self, saver: Arc<dyn FormSaver>) -> Self {
        self.saver = Some(saver);
        self
    }

    /// With a custom resolver chain
    #[inline]
    #[must_use]
    pub fn with_resolver(mut self, resolver: FieldResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// With a custom skip policy
    #[inline]
    #[must_use]
    pub fn with_skip_policy(mut self, policy: SkipPolicy) -> Self {
        self.skip_policy = policy;
        self
    }

    /// With a fixed "today" for generated dates
    #[inline]
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn generator(&self) -> ValueGenerator {
        ValueGenerator::new(
            GeneratorContext::new(self.today)
                .with_suffix(self.config.canonical_suffix())
                .with_date_format(self.config.date_format.clone()),
        )
    }

    /// Capture every declared field
    ///
    /// # Errors
    /// Infrastructure failure while reading
    pub async fn snapshot(&self, template: &Template) -> Result<FieldSnapshot, EngineError> {
        let snap = SnapshotReader::new(&self.surface, &self.resolver)
            .snapshot(template)
            .await?;
        Ok(snap)
    }

    /// Fill every eligible top-level question, in template order
    ///
    /// Fields hidden or disabled in `before` are not touched.
    ///
    /// # Errors
    /// `InfrastructureAbort` once the consecutive failure budget is spent
    pub async fn fill(
        &self,
        template: &Template,
        ctx: &mut RunContext,
        before: &FieldSnapshot,
    ) -> Result<(), EngineError> {
        let generator = self.generator();
        let filler = FieldFiller::new(&self.surface, &self.resolver, &generator, &self.config)
            .with_before(before);

        for question in template.questions() {
            let qid = question.qid.as_str();
            if question.is_schema_hidden() || before.is_hidden(qid) {
                tracing::trace!(qid, "hidden, not filled");
                continue;
            }
            if ctx.is_processed(qid) {
                continue;
            }
            ctx.mark_processed(qid);

            if let SkipDecision::Skip(reason) = self.skip_policy.evaluate(question, ctx.action()) {
                ctx.record_skip(qid, reason);
                continue;
            }
            if before.is_disabled(qid) {
                ctx.record_disabled(qid);
                continue;
            }

            let result = filler.fill_question(ctx, question).await;
            match record_outcome(ctx, qid, qid, question.display_label(), result) {
                Ok(()) => ctx.note_field_completed(),
                Err(e) => {
                    ctx.record_unable(qid, &e);
                    let failures = ctx.note_infra_failure();
                    tracing::error!(qid, failures, error = %e, "infrastructure failure");
                    if failures >= self.config.max_consecutive_infra_failures {
                        return Err(EngineError::InfrastructureAbort { failures, last: e });
                    }
                }
            }
        }
        Ok(())
    }

    /// Execute a full run
    ///
    /// # Errors
    /// Infrastructure failures and save failures
    pub async fn run(
        &self,
        template: &Template,
        action: ActionContext,
    ) -> Result<RunReport, EngineError> {
        let mut ctx = RunContext::new(action, self.config.rng_seed);
        tracing::info!(
            run_id = %ctx.run_id(),
            entity = template.entity(),
            action = %ctx.action().kind,
            fields = template.len(),
            "run started"
        );

        let before = self.snapshot(template).await?;
        self.fill(template, &mut ctx, &before).await?;

        if let Some(saver) = &self.saver {
            saver
                .save(self.surface.driver())
                .await
                .map_err(|e| EngineError::Save(e.to_string()))?;
        }
        match dismiss_interstitial(&self.surface, self.config.interstitial_wait()).await {
            Ok(_) => {}
            Err(e) if e.is_infrastructure() => return Err(e.into()),
            Err(e) => tracing::debug!(error = %e, "could not dismiss prompt after save"),
        }

        let after = self.snapshot(template).await?;
        let outcome = ctx.finish();

        let mut disabled = outcome.disabled.clone();
        disabled.extend(before.disabled().iter().cloned());
        let mut inputs = DiffInputs::new(&before, &after, &outcome.skips, &disabled)
            .with_unable(&outcome.unable);
        if let Some(allow) = self.config.allow_list.as_deref() {
            inputs = inputs.with_allow_list(allow);
        }
        let rows = classify(&inputs);
        let report = DiffReport::new(outcome.run_id, template.entity(), outcome.action.kind, rows);

        tracing::info!(
            run_id = %report.run_id,
            updated = report.counts.updated,
            skipped = report.counts.skipped,
            disabled = report.counts.disabled,
            unable = report.counts.unable,
            "run finished"
        );
        Ok(RunReport {
            report,
            before,
            after,
            diagnostics: outcome.diagnostics,
        })
    }
}
