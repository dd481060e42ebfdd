//! Replacement value generation
//!
//! [`ValueGenerator::generate`] is a pure function of the question, the
//! value currently on the form, and the injected [`GeneratorContext`].
//! It never draws random numbers; choice-option identity is decided by the
//! fill strategy, which receives a [`GeneratedValue::PickOption`] sentinel.

use crate::roles::SemanticRole;
use crate::suffix::CanonicalSuffix;
use chrono::{Days, NaiveDate};
use formprobe_schema::{FieldValue, Question, QuestionType};
use indexmap::IndexMap;
use std::fmt;

/// Default date rendering (`October 19, 2026`)
pub const DEFAULT_DATE_FORMAT: &str = "%B %-d, %Y";

/// Canonical value for generic numeric fields
pub const GENERIC_NUMBER: i64 = 10;

/// Canonical value for duration-like numeric fields
pub const DURATION_NUMBER: i64 = 15;

/// Lower bound used when a nested minimum has no current value
pub const DEFAULT_MIN: i64 = 1;

/// Side of a Yes/No toggle pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToggleSide {
    /// Affirmative side
    Yes,
    /// Negative side
    No,
}

impl ToggleSide {
    /// Opposite side
    #[inline]
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Yes => Self::No,
            Self::No => Self::Yes,
        }
    }

    /// Button label
    #[inline]
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }

    /// Parse a button label (`Yes`/`No`, `True`/`False`, `On`/`Off`)
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "yes" | "true" | "on" | "y" => Some(Self::Yes),
            "no" | "false" | "off" | "n" => Some(Self::No),
            _ => None,
        }
    }
}

impl fmt::Display for ToggleSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Replacement value produced for one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedValue {
    /// Text for plain, long, or rich text controls
    Text(String),
    /// Integral numeric value
    Number(i64),
    /// Date rendered in the configured format
    Date(String),
    /// Canonical toggle target; the transition depends on current state
    Toggle(ToggleSide),
    /// Delegate to option selection on the live control
    PickOption {
        /// Add to the selection instead of replacing it
        multi: bool,
        /// Pick the first selectable option instead of a random one
        deterministic: bool,
    },
    /// Recurse into declared subfields
    Composite,
}

impl GeneratedValue {
    /// Value as it is expected to read back, for verifiable scalars
    #[must_use]
    pub fn expected_text(&self) -> Option<String> {
        match self {
            Self::Text(s) | Self::Date(s) => Some(s.clone()),
            Self::Number(n) => Some(n.to_string()),
            Self::Toggle(side) => Some(side.label().to_string()),
            Self::PickOption { .. } | Self::Composite => None,
        }
    }
}

/// Inputs the generator depends on besides the question itself
#[derive(Debug, Clone)]
pub struct GeneratorContext {
    /// Marker appended to mutated text
    pub suffix: CanonicalSuffix,
    /// Date used for date fields
    pub today: NaiveDate,
    /// `chrono` format string for dates
    pub date_format: String,
}

impl GeneratorContext {
    /// Create a context for the given day with default suffix and format
    #[must_use]
    pub fn new(today: NaiveDate) -> Self {
        Self {
            suffix: CanonicalSuffix::default(),
            today,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }

    /// With a custom suffix marker
    #[must_use]
    pub fn with_suffix(mut self, suffix: CanonicalSuffix) -> Self {
        self.suffix = suffix;
        self
    }

    /// With a custom date format
    #[must_use]
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Format a date with the configured format
    #[must_use]
    pub fn format_date(&self, date: NaiveDate) -> String {
        date.format(&self.date_format).to_string()
    }
}

/// Numeric values already generated under one composite parent
///
/// Threaded through composite recursion so a `max` sibling can be derived
/// from the `min` generated before it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiblingState {
    numbers: IndexMap<SemanticRole, i64>,
}

impl SiblingState {
    /// Create empty state
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a generated number for a role
    #[inline]
    pub fn record(&mut self, role: SemanticRole, value: i64) {
        self.numbers.insert(role, value);
    }

    /// Number generated for a role, if any
    #[inline]
    #[must_use]
    pub fn get(&self, role: SemanticRole) -> Option<i64> {
        self.numbers.get(&role).copied()
    }
}

/// Pure replacement-value policy
#[derive(Debug, Clone)]
pub struct ValueGenerator {
    ctx: GeneratorContext,
}

impl ValueGenerator {
    /// Create generator with context
    #[inline]
    #[must_use]
    pub fn new(ctx: GeneratorContext) -> Self {
        Self { ctx }
    }

    /// Generator context
    #[inline]
    #[must_use]
    pub fn context(&self) -> &GeneratorContext {
        &self.ctx
    }

    /// Generate the replacement value for a top-level question
    #[must_use]
    pub fn generate(&self, question: &Question, existing: &FieldValue) -> GeneratedValue {
        self.generate_with_siblings(question, existing, &SiblingState::new())
    }

    /// Generate a replacement value given numbers already generated for
    /// siblings under the same composite parent
    #[must_use]
    pub fn generate_with_siblings(
        &self,
        question: &Question,
        existing: &FieldValue,
        siblings: &SiblingState,
    ) -> GeneratedValue {
        if question.is_composite() {
            return GeneratedValue::Composite;
        }

        match &question.question_type {
            QuestionType::Text
            | QuestionType::LongText
            | QuestionType::RichText
            | QuestionType::Other(_) => GeneratedValue::Text(self.text(question, existing)),
            QuestionType::Number => GeneratedValue::Number(self.number(question, existing, siblings)),
            QuestionType::Date => GeneratedValue::Date(self.ctx.format_date(self.ctx.today)),
            QuestionType::YesNo => GeneratedValue::Toggle(ToggleSide::Yes),
            QuestionType::SingleChoice => GeneratedValue::PickOption {
                multi: false,
                deterministic: false,
            },
            QuestionType::MultiChoice => GeneratedValue::PickOption {
                multi: true,
                deterministic: false,
            },
            QuestionType::Composite => GeneratedValue::Composite,
        }
    }

    /// The single deterministic retry value after a verification mismatch
    ///
    /// Free text is never verified, so it has no alternate.
    #[must_use]
    pub fn alternate(&self, primary: &GeneratedValue) -> Option<GeneratedValue> {
        match primary {
            GeneratedValue::Number(n) => n
                .checked_add(1)
                .or_else(|| n.checked_sub(1))
                .map(GeneratedValue::Number),
            GeneratedValue::Date(_) => {
                let next = self.ctx.today.checked_add_days(Days::new(1))?;
                Some(GeneratedValue::Date(self.ctx.format_date(next)))
            }
            GeneratedValue::Toggle(side) => Some(GeneratedValue::Toggle(*side)),
            GeneratedValue::PickOption { multi, .. } => Some(GeneratedValue::PickOption {
                multi: *multi,
                deterministic: true,
            }),
            GeneratedValue::Text(_) | GeneratedValue::Composite => None,
        }
    }

    fn text(&self, question: &Question, existing: &FieldValue) -> String {
        let max = question.max_length();
        let current = existing
            .as_scalar_text()
            .filter(|s| !s.trim().is_empty());

        if let Some(current) = current {
            return self.ctx.suffix.apply_clamped(&current, max);
        }

        let role = SemanticRole::infer(question);
        let default = default_text(role, question);
        if role.is_format_sensitive() {
            clamp_chars(&default, max)
        } else {
            self.ctx.suffix.apply_clamped(&default, max)
        }
    }

    fn number(&self, question: &Question, existing: &FieldValue, siblings: &SiblingState) -> i64 {
        let current = existing_number(existing);
        match SemanticRole::infer(question) {
            // Capped one below i64::MAX so the paired max always fits above it.
            SemanticRole::Min => {
                current.map_or(DEFAULT_MIN, |n| n.saturating_add(1).min(i64::MAX - 1))
            }
            SemanticRole::Max => {
                let min = siblings
                    .get(SemanticRole::Min)
                    .unwrap_or(DEFAULT_MIN);
                min.saturating_add(1)
            }
            SemanticRole::Duration => bump_if_equal(DURATION_NUMBER, current),
            _ => bump_if_equal(GENERIC_NUMBER, current),
        }
    }
}

fn default_text(role: SemanticRole, question: &Question) -> String {
    match role {
        SemanticRole::Email => "qa.automation@example.com".to_string(),
        SemanticRole::Url => "https://example.com/qa".to_string(),
        SemanticRole::Phone => "5555550100".to_string(),
        SemanticRole::Code => "QA101".to_string(),
        SemanticRole::Description => format!("Automated {} text", question.display_label()),
        SemanticRole::Title
        | SemanticRole::Generic
        | SemanticRole::Min
        | SemanticRole::Max
        | SemanticRole::Duration => format!("Automated {}", question.display_label()),
    }
}

fn clamp_chars(value: &str, max: Option<usize>) -> String {
    match max {
        Some(max) => value.chars().take(max).collect(),
        None => value.to_string(),
    }
}

fn existing_number(existing: &FieldValue) -> Option<i64> {
    let n = match existing {
        FieldValue::Number(n) => *n,
        FieldValue::Text(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !n.is_finite() {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let whole = n.trunc() as i64;
    Some(whole)
}

/// Use the canonical value unless the field already holds it
fn bump_if_equal(canonical: i64, current: Option<i64>) -> i64 {
    if current == Some(canonical) {
        canonical.saturating_add(1)
    } else {
        canonical
    }
}
