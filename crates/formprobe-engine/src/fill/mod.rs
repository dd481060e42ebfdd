//! Type dispatch and per-field mutation
//!
//! [`FieldFiller`] resolves a question, asks the generator for a
//! replacement, routes it to the routine for the control's shape, and reads
//! the value back. A mismatch gets exactly one alternate value. Composite
//! questions recurse into their declared subfields with shared sibling
//! state so paired bounds stay consistent.

pub mod choice;
pub mod composite;
pub mod date;
pub mod number;
pub mod text;
pub mod toggle;
pub mod verify;

use crate::config::EngineConfig;
use crate::context::RunContext;
use crate::error::{DriverResultExt, FieldError};
use crate::interstitial::dismiss_interstitial;
use crate::resolver::{FieldResolver, ResolveTarget, Resolved};
use crate::snapshot::{read_field_value, FieldSnapshot};
use crate::surface::Surface;
use formprobe_driver::ElementKind;
use formprobe_policy::{GeneratedValue, SemanticRole, SiblingState, SkipReason, ToggleSide, ValueGenerator};
use formprobe_schema::{FieldPath, FieldValue, Question};
use std::future::Future;
use std::pin::Pin;

type FillFuture<'f> = Pin<Box<dyn Future<Output = Result<FillOutcome, FieldError>> + Send + 'f>>;

/// How a field attempt ended, short of an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillOutcome {
    /// Mutated and, where verifiable, read back
    Updated,
    /// Present but not interactive
    Disabled,
    /// Present but not visible
    Hidden,
    /// Gave up with a skip reason
    Skipped(String),
}

/// Mutates fields through a surface
#[derive(Debug, Clone, Copy)]
pub struct FieldFiller<'a> {
    surface: &'a Surface,
    resolver: &'a FieldResolver,
    generator: &'a ValueGenerator,
    config: &'a EngineConfig,
    before: Option<&'a FieldSnapshot>,
}

impl<'a> FieldFiller<'a> {
    /// Create a filler
    #[must_use]
    pub fn new(
        surface: &'a Surface,
        resolver: &'a FieldResolver,
        generator: &'a ValueGenerator,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            surface,
            resolver,
            generator,
            config,
            before: None,
        }
    }

    /// With the snapshot taken before filling
    ///
    /// Composite leaves it marks hidden are left alone.
    #[inline]
    #[must_use]
    pub fn with_before(mut self, before: &'a FieldSnapshot) -> Self {
        self.before = Some(before);
        self
    }

    fn hidden_before(&self, key: &str) -> bool {
        self.before.is_some_and(|b| b.is_hidden(key))
    }

    /// Fill a top-level question
    ///
    /// Composite leaves record their own fate in `ctx`; the returned outcome
    /// describes the top-level field only.
    ///
    /// # Errors
    /// The field could not be updated
    pub async fn fill_question(
        &self,
        ctx: &mut RunContext,
        question: &Question,
    ) -> Result<FillOutcome, FieldError> {
        let path = FieldPath::top_level(question.qid.clone());
        let mut siblings = SiblingState::new();
        self.fill_at(ctx, &path, question, None, &mut siblings).await
    }

    fn fill_at<'f>(
        &'f self,
        ctx: &'f mut RunContext,
        path: &'f FieldPath,
        question: &'f Question,
        parent: Option<&'f Question>,
        siblings: &'f mut SiblingState,
    ) -> FillFuture<'f> {
        Box::pin(async move {
            if question.is_composite() {
                return self.fill_composite(ctx, path, question).await;
            }

            let key = path.dotted();
            let mut retried = false;
            loop {
                self.clear_interstitial(&key).await?;
                match self.attempt(ctx, path, question, parent, siblings).await {
                    Err(e) if e.is_blocking() => {
                        if retried {
                            let reason = SkipReason::Blocked(e.to_string());
                            tracing::warn!(key = %key, %reason, "control still blocked");
                            return Ok(FillOutcome::Skipped(reason.to_string()));
                        }
                        retried = true;
                        tracing::debug!(key = %key, error = %e, "control blocked, settling");
                        self.surface.settle(self.config.settle_delay()).await;
                    }
                    other => return other,
                }
            }
        })
    }

    async fn fill_composite(
        &self,
        ctx: &mut RunContext,
        path: &FieldPath,
        question: &Question,
    ) -> Result<FillOutcome, FieldError> {
        let mut siblings = SiblingState::new();
        for (sub_key, sub) in composite::ordered_subfields(question) {
            if sub.is_schema_hidden() {
                continue;
            }
            let sub_path = path.child(sub_key);
            let dotted = sub_path.dotted();
            if self.hidden_before(&dotted) {
                tracing::trace!(key = %dotted, "hidden, not filled");
                continue;
            }
            if !ctx.mark_processed(dotted.clone()) {
                continue;
            }
            let result = self
                .fill_at(ctx, &sub_path, sub, Some(question), &mut siblings)
                .await;
            record_outcome(ctx, &dotted, path.top(), sub.display_label(), result)?;
        }
        Ok(FillOutcome::Updated)
    }

    async fn clear_interstitial(&self, key: &str) -> Result<(), FieldError> {
        match dismiss_interstitial(self.surface, self.config.interstitial_wait()).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_infrastructure() => Err(FieldError::driver(key, e)),
            Err(e) => {
                tracing::debug!(key, error = %e, "could not dismiss prompt");
                Ok(())
            }
        }
    }

    async fn attempt(
        &self,
        ctx: &mut RunContext,
        path: &FieldPath,
        question: &Question,
        parent: Option<&Question>,
        siblings: &mut SiblingState,
    ) -> Result<FillOutcome, FieldError> {
        let key = path.dotted();
        let target = ResolveTarget {
            path,
            question,
            parent,
        };
        let Some(resolved) = self
            .resolver
            .resolve(self.surface, &target)
            .await
            .for_field(&key)?
        else {
            return self.unresolved(&target, &key).await;
        };

        let existing = match read_field_value(self.surface, &resolved, question).await {
            Ok(value) => value,
            Err(e) if e.is_infrastructure() => return Err(FieldError::driver(&key, e)),
            Err(_) => FieldValue::NoValue,
        };

        let primary = self
            .generator
            .generate_with_siblings(question, &existing, siblings);
        note_sibling(question, &primary, siblings);
        tracing::debug!(key = %key, strategy = resolved.strategy, value = ?primary, "filling");

        let Some(expected) = self
            .apply(ctx, &resolved, &primary, false, &key)
            .await?
        else {
            return Ok(FillOutcome::Updated);
        };
        let Some(actual) = self.mismatch(&resolved, question, &expected, &key).await? else {
            return Ok(FillOutcome::Updated);
        };

        let applied = match primary {
            GeneratedValue::Toggle(side) => {
                GeneratedValue::Toggle(ToggleSide::from_label(&expected).unwrap_or(side))
            }
            other => other,
        };
        let Some(alternate) = self.generator.alternate(&applied) else {
            return Err(FieldError::VerificationFailed {
                qid: key,
                expected,
                actual,
            });
        };
        tracing::debug!(key = %key, expected = %expected, actual = %actual, "read-back mismatch, trying alternate");
        note_sibling(question, &alternate, siblings);

        let Some(expected) = self
            .apply(ctx, &resolved, &alternate, true, &key)
            .await?
        else {
            return Ok(FillOutcome::Updated);
        };
        match self.mismatch(&resolved, question, &expected, &key).await? {
            None => Ok(FillOutcome::Updated),
            Some(actual) => Err(FieldError::VerificationFailed {
                qid: key,
                expected,
                actual,
            }),
        }
    }

    async fn unresolved(
        &self,
        target: &ResolveTarget<'_>,
        key: &str,
    ) -> Result<FillOutcome, FieldError> {
        match self
            .resolver
            .probe(self.surface, target)
            .await
            .for_field(key)?
        {
            Some(found) if !found.info.visible => Ok(FillOutcome::Hidden),
            Some(found) if !found.info.enabled => Ok(FillOutcome::Disabled),
            _ => Err(FieldError::NotFound {
                qid: key.to_string(),
            }),
        }
    }

    /// Write a value; returns the rendering to verify, if any
    async fn apply(
        &self,
        ctx: &mut RunContext,
        resolved: &Resolved,
        value: &GeneratedValue,
        retry: bool,
        key: &str,
    ) -> Result<Option<String>, FieldError> {
        let element = resolved.element;
        match value {
            GeneratedValue::Text(s) => {
                if resolved.info.kind == ElementKind::RichText {
                    text::fill_rich_text(self.surface, element, s, key).await?;
                } else {
                    text::fill_text(self.surface, element, s, key).await?;
                }
                Ok(None)
            }
            GeneratedValue::Number(n) => {
                let rendered = n.to_string();
                number::fill_number(self.surface, element, &rendered, key).await?;
                Ok(Some(rendered))
            }
            GeneratedValue::Date(d) => {
                date::fill_date(self.surface, element, d, key).await?;
                Ok(Some(d.clone()))
            }
            GeneratedValue::Toggle(side) => {
                let clicked = if retry {
                    toggle::press(self.surface, &resolved.locator, *side, key).await?;
                    *side
                } else {
                    toggle::flip(self.surface, &resolved.locator, key).await?
                };
                Ok(Some(clicked.label().to_string()))
            }
            GeneratedValue::PickOption {
                multi,
                deterministic,
            } => {
                let label = choice::pick_option(
                    self.surface,
                    element,
                    key,
                    *multi,
                    *deterministic,
                    ctx.rng(),
                    self.config,
                )
                .await?;
                Ok(Some(label))
            }
            GeneratedValue::Composite => Ok(None),
        }
    }

    /// Read back; `None` when the control holds the expected value
    async fn mismatch(
        &self,
        resolved: &Resolved,
        question: &Question,
        expected: &str,
        key: &str,
    ) -> Result<Option<String>, FieldError> {
        let actual = read_field_value(self.surface, resolved, question)
            .await
            .for_field(key)?;
        if verify::value_matches(expected, &actual) {
            Ok(None)
        } else {
            Ok(Some(verify::describe(&actual)))
        }
    }
}

fn note_sibling(question: &Question, value: &GeneratedValue, siblings: &mut SiblingState) {
    if let GeneratedValue::Number(n) = value {
        siblings.record(SemanticRole::infer(question), *n);
    }
}

/// Fold a field result into the run context
///
/// # Errors
/// Infrastructure failures, which must abort rather than become rows
pub(crate) fn record_outcome(
    ctx: &mut RunContext,
    key: &str,
    top: &str,
    label: &str,
    result: Result<FillOutcome, FieldError>,
) -> Result<(), FieldError> {
    match result {
        Ok(FillOutcome::Updated | FillOutcome::Hidden) => Ok(()),
        Ok(FillOutcome::Disabled) => {
            ctx.record_disabled(key);
            Ok(())
        }
        Ok(FillOutcome::Skipped(reason)) => {
            ctx.record_skip(top, reason);
            Ok(())
        }
        Err(e) if e.is_infrastructure() => Err(e),
        Err(FieldError::NotFound { .. }) => {
            ctx.record_not_found(key, label);
            Ok(())
        }
        Err(e) => {
            ctx.record_unable(key, &e);
            Ok(())
        }
    }
}
