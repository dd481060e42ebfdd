//! Question model
//!
//! A [`Question`] describes one declared field: identity, control type,
//! visibility flags, and constraints. Composite questions carry their
//! subfields in `config.fields`, each of which is itself a `Question`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Control type of a question
///
/// Parsed case-insensitively from the template's `questionType` string.
/// Unknown names are kept verbatim in [`QuestionType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuestionType {
    /// Single-line text input
    Text,
    /// Multi-line plain text
    LongText,
    /// Rich-text editor region
    RichText,
    /// Numeric input
    Number,
    /// Date picker
    Date,
    /// Searchable single-choice list
    SingleChoice,
    /// Searchable multi-choice list
    MultiChoice,
    /// Paired Yes/No toggle buttons
    YesNo,
    /// Structured field with named subfields
    Composite,
    /// Any other declared type
    Other(String),
}

impl QuestionType {
    /// Canonical name used when serialising
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::LongText => "longText",
            Self::RichText => "richText",
            Self::Number => "number",
            Self::Date => "date",
            Self::SingleChoice => "singleChoice",
            Self::MultiChoice => "multiChoice",
            Self::YesNo => "yesNo",
            Self::Composite => "composite",
            Self::Other(name) => name,
        }
    }

    /// Free-text types are exempt from read-back verification
    #[inline]
    #[must_use]
    pub fn is_free_text(&self) -> bool {
        matches!(self, Self::Text | Self::LongText | Self::RichText)
    }

    /// Searchable choice types
    #[inline]
    #[must_use]
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::SingleChoice | Self::MultiChoice)
    }
}

impl From<String> for QuestionType {
    fn from(raw: String) -> Self {
        let key: String = raw
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "text" | "input" | "shorttext" | "string" | "email" | "url" | "phone" => Self::Text,
            "longtext" | "textarea" | "paragraph" | "multilinetext" => Self::LongText,
            "richtext" | "editor" | "html" | "wysiwyg" => Self::RichText,
            "number" | "numeric" | "integer" | "decimal" | "duration" => Self::Number,
            "date" | "datepicker" => Self::Date,
            "select" | "dropdown" | "singlechoice" | "singleselect" | "lookup" | "autocomplete" => {
                Self::SingleChoice
            }
            "multiselect" | "multichoice" | "multidropdown" | "tags" => Self::MultiChoice,
            "yesno" | "boolean" | "bool" | "toggle" => Self::YesNo,
            "composite" | "group" | "object" | "range" | "numberrange" => Self::Composite,
            _ => Self::Other(raw),
        }
    }
}

impl From<QuestionType> for String {
    fn from(kind: QuestionType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level validation constraints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validations {
    /// Maximum character length for text-like values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

/// Optional question configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionConfig {
    /// Composite subfields, in declaration order
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, Question>,

    /// Validation constraints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validations: Option<Validations>,
}

/// Schema entry describing one field
///
/// Subfields share this shape; their `qid` is filled in as `parent.sub`
/// by the template loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Unique dot-delimited identifier
    #[serde(default)]
    pub qid: String,

    /// Human label
    #[serde(default)]
    pub label: String,

    /// Control type
    #[serde(alias = "type")]
    pub question_type: QuestionType,

    /// Whether the form requires a value
    #[serde(default)]
    pub required: bool,

    /// Intentionally hidden by the schema
    #[serde(default)]
    pub hidden: bool,

    /// Whether the form renders this question at all
    #[serde(default = "default_true")]
    pub is_visible_in_form: bool,

    /// Backing data key, if different from the qid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_key: Option<String>,

    /// Subfields and validations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<QuestionConfig>,
}

fn default_true() -> bool {
    true
}

impl Question {
    /// Create a visible question with no config
    #[must_use]
    pub fn new(
        qid: impl Into<String>,
        label: impl Into<String>,
        question_type: QuestionType,
    ) -> Self {
        Self {
            qid: qid.into(),
            label: label.into(),
            question_type,
            required: false,
            hidden: false,
            is_visible_in_form: true,
            data_key: None,
            config: None,
        }
    }

    /// With a maximum length validation
    #[must_use]
    pub fn with_max_length(mut self, max: usize) -> Self {
        let config = self.config.get_or_insert_with(QuestionConfig::default);
        config.validations = Some(Validations {
            max_length: Some(max),
        });
        self
    }

    /// With an additional subfield
    ///
    /// The subfield's qid is rewritten to `self.qid.key`.
    #[must_use]
    pub fn with_subfield(mut self, key: impl Into<String>, mut sub: Question) -> Self {
        let key = key.into();
        sub.qid = format!("{}.{key}", self.qid);
        let config = self.config.get_or_insert_with(QuestionConfig::default);
        config.fields.insert(key, sub);
        self
    }

    /// Mark as hidden by the schema
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Human label, falling back to the qid
    #[must_use]
    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.qid
        } else {
            &self.label
        }
    }

    /// Hidden by the schema: `hidden` or not rendered in the form
    #[inline]
    #[must_use]
    pub fn is_schema_hidden(&self) -> bool {
        self.hidden || !self.is_visible_in_form
    }

    /// Declared subfields, in order
    pub fn subfields(&self) -> impl Iterator<Item = (&str, &Question)> {
        self.config
            .iter()
            .flat_map(|c| c.fields.iter())
            .map(|(k, q)| (k.as_str(), q))
    }

    /// Composite if declared so, or if it carries subfields
    #[must_use]
    pub fn is_composite(&self) -> bool {
        self.question_type == QuestionType::Composite || self.subfields().next().is_some()
    }

    /// Declared maximum length, if any
    #[must_use]
    pub fn max_length(&self) -> Option<usize> {
        self.config
            .as_ref()
            .and_then(|c| c.validations.as_ref())
            .and_then(|v| v.max_length)
    }
}
