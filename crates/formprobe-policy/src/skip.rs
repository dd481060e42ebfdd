//! Per-action skip policy
//!
//! Each action kind carries a table of fields that must never be mutated
//! (`always_protected`) and fields that stay editable despite a broader
//! restriction (`allowed_overrides`). The policy turns a question plus the
//! action context into a [`SkipDecision`].

use formprobe_schema::{Question, QuestionType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Kind of action the form run is exercising
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// New entity
    Create,
    /// Edit in place
    Update,
    /// Deactivate an entity
    Inactivate,
    /// New revision of an existing entity
    Revise,
}

impl ActionKind {
    /// Lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Inactivate => "inactivate",
            Self::Revise => "revise",
        }
    }

    /// All action kinds
    #[must_use]
    pub fn all() -> [Self; 4] {
        [Self::Create, Self::Update, Self::Inactivate, Self::Revise]
    }

    /// Fields protected by default for this action
    #[must_use]
    pub fn default_protected(self) -> &'static [&'static str] {
        match self {
            Self::Create => &[],
            Self::Update | Self::Revise => &["sisId", "externalId"],
            Self::Inactivate => &["sisId", "externalId", "code"],
        }
    }

    /// Fields editable by default despite the action's restrictions
    #[must_use]
    pub fn default_overrides(self) -> &'static [&'static str] {
        match self {
            Self::Inactivate => &["status", "effectiveEndDate", "inactiveReason"],
            Self::Create | Self::Update | Self::Revise => &[],
        }
    }

    /// Whether only override fields may be edited
    #[inline]
    #[must_use]
    pub fn restricts_to_overrides(self) -> bool {
        matches!(self, Self::Inactivate)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "update" | "edit" => Ok(Self::Update),
            "inactivate" | "deactivate" => Ok(Self::Inactivate),
            "revise" | "revision" => Ok(Self::Revise),
            other => Err(format!("unknown action kind: {other}")),
        }
    }
}

/// Action kind plus its protection tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionContext {
    /// Action being exercised
    pub kind: ActionKind,
    /// Top-level qids never mutated under this action
    #[serde(default)]
    pub always_protected: BTreeSet<String>,
    /// Top-level qids exempt from the action's restrictions
    #[serde(default)]
    pub allowed_overrides: BTreeSet<String>,
}

impl ActionContext {
    /// Context with the action's default tables
    #[must_use]
    pub fn for_kind(kind: ActionKind) -> Self {
        Self {
            kind,
            always_protected: kind.default_protected().iter().map(ToString::to_string).collect(),
            allowed_overrides: kind.default_overrides().iter().map(ToString::to_string).collect(),
        }
    }

    /// Add a protected qid
    #[must_use]
    pub fn with_protected(mut self, qid: impl Into<String>) -> Self {
        self.always_protected.insert(qid.into());
        self
    }

    /// Add an override qid
    #[must_use]
    pub fn with_override(mut self, qid: impl Into<String>) -> Self {
        self.allowed_overrides.insert(qid.into());
        self
    }

    /// Check if a top-level qid is protected and not overridden
    #[must_use]
    pub fn is_protected(&self, qid: &str) -> bool {
        self.always_protected.contains(qid) && !self.allowed_overrides.contains(qid)
    }
}

/// Why a field is skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// Protected by the action's protected-field policy
    Protected(ActionKind),
    /// Not in the action's editable override set
    NotEditable(ActionKind),
    /// Control type the engine does not mutate
    UnsupportedType(String),
    /// Control stayed obscured after a settle-and-retry
    Blocked(String),
    /// Any other recorded cause
    Other(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protected(kind) => {
                write!(f, "protected by the {kind} action's protected-field policy")
            }
            Self::NotEditable(kind) => write!(f, "not editable during {kind}"),
            Self::UnsupportedType(t) => write!(f, "unsupported field type '{t}'"),
            Self::Blocked(detail) => write!(f, "control blocked: {detail}"),
            Self::Other(detail) => f.write_str(detail),
        }
    }
}

/// Outcome of evaluating the skip policy for one question
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipDecision {
    /// Mutate the field
    Process,
    /// Leave the field untouched
    Skip(SkipReason),
}

impl SkipDecision {
    /// Check for a skip
    #[inline]
    #[must_use]
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip(_))
    }
}

/// Skip policy over action contexts
#[derive(Debug, Clone)]
pub struct SkipPolicy {
    unsupported_types: BTreeSet<String>,
}

impl Default for SkipPolicy {
    fn default() -> Self {
        Self {
            unsupported_types: [
                "file",
                "fileupload",
                "attachment",
                "signature",
                "calculated",
                "readonly",
                "label",
                "section",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
        }
    }
}

impl SkipPolicy {
    /// Create policy with the default unsupported-type table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat an additional type name as unsupported
    #[must_use]
    pub fn with_unsupported_type(mut self, name: &str) -> Self {
        self.unsupported_types.insert(normalize_type_name(name));
        self
    }

    /// Evaluate a top-level question
    ///
    /// Protection is checked first and applies regardless of how the
    /// schema declares the field.
    #[must_use]
    pub fn evaluate(&self, question: &Question, ctx: &ActionContext) -> SkipDecision {
        let qid = question.qid.as_str();

        if ctx.is_protected(qid) {
            return SkipDecision::Skip(SkipReason::Protected(ctx.kind));
        }

        if ctx.kind.restricts_to_overrides() && !ctx.allowed_overrides.contains(qid) {
            return SkipDecision::Skip(SkipReason::NotEditable(ctx.kind));
        }

        if let QuestionType::Other(name) = &question.question_type {
            if self.unsupported_types.contains(&normalize_type_name(name)) {
                return SkipDecision::Skip(SkipReason::UnsupportedType(name.clone()));
            }
        }

        SkipDecision::Process
    }
}

fn normalize_type_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}
