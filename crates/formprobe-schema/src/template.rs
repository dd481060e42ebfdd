//! Template loader
//!
//! Parses the versioned template document
//! `{ "<entity>Template": { "questions": { "<qid>": Question } } }`
//! into a [`Template`], preserving declaration order and filling in
//! subfield qids as `parent.sub`.

use crate::error::TemplateError;
use crate::path::{validate_key, FieldPath};
use crate::question::Question;
use crate::walk::leaves;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

/// Suffix marking the template root key
pub const TEMPLATE_KEY_SUFFIX: &str = "Template";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateBody {
    #[serde(default, alias = "schemaVersion")]
    version: Option<serde_json::Value>,
    #[serde(default)]
    questions: IndexMap<String, Question>,
}

/// Loaded field schema for one entity
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    entity: String,
    version: Option<String>,
    questions: IndexMap<String, Question>,
}

impl Template {
    /// Build a template from already-normalised questions
    #[must_use]
    pub fn new(entity: impl Into<String>, questions: Vec<Question>) -> Self {
        let questions = questions
            .into_iter()
            .map(|mut q| {
                let qid = q.qid.clone();
                normalize_subfields(&qid, &mut q);
                (qid, q)
            })
            .collect();
        Self {
            entity: entity.into(),
            version: None,
            questions,
        }
    }

    /// Parse a template document
    ///
    /// # Errors
    /// - `TemplateError::Json` on malformed JSON
    /// - `TemplateError::MissingRoot` if no `<entity>Template` key exists
    /// - `TemplateError::InvalidQid` on empty or whitespace keys
    pub fn from_json_str(content: &str) -> Result<Self, TemplateError> {
        let root: IndexMap<String, serde_json::Value> = serde_json::from_str(content)?;

        let (key, body) = root
            .into_iter()
            .find(|(k, _)| k.ends_with(TEMPLATE_KEY_SUFFIX))
            .ok_or(TemplateError::MissingRoot)?;

        let entity = key
            .strip_suffix(TEMPLATE_KEY_SUFFIX)
            .unwrap_or(&key)
            .to_string();
        let body: TemplateBody = serde_json::from_value(body)?;

        let version = body.version.map(|v| match v {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });

        let mut questions = IndexMap::with_capacity(body.questions.len());
        for (qid, mut question) in body.questions {
            validate_key(&qid).map_err(|source| TemplateError::InvalidQid {
                qid: qid.clone(),
                source,
            })?;
            if !question.qid.is_empty() && question.qid != qid {
                tracing::warn!(
                    key = %qid,
                    declared = %question.qid,
                    "question qid differs from its key; using key"
                );
            }
            question.qid.clone_from(&qid);
            validate_subfield_keys(&qid, &question)?;
            normalize_subfields(&qid, &mut question);
            questions.insert(qid, question);
        }

        tracing::debug!(
            entity = %entity,
            questions = questions.len(),
            "template loaded"
        );

        Ok(Self {
            entity,
            version,
            questions,
        })
    }

    /// Read and parse a template file
    ///
    /// # Errors
    /// `TemplateError::Io` if the file cannot be read, plus any parse error.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|source| TemplateError::io_error(path, source))?;
        Self::from_json_str(&content)
    }

    /// Entity name (root key without the `Template` suffix)
    #[inline]
    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Declared schema version
    #[inline]
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Top-level questions in declaration order
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.questions.values()
    }

    /// Look up a top-level question
    #[inline]
    #[must_use]
    pub fn get(&self, qid: &str) -> Option<&Question> {
        self.questions.get(qid)
    }

    /// Resolve a path to its (possibly nested) question
    #[must_use]
    pub fn get_path(&self, path: &FieldPath) -> Option<&Question> {
        let mut current = self.questions.get(path.top())?;
        for key in path.subs() {
            current = current.config.as_ref()?.fields.get(key)?;
        }
        Some(current)
    }

    /// Every composite leaf path, in declaration order
    #[must_use]
    pub fn leaf_paths(&self) -> Vec<FieldPath> {
        self.questions
            .values()
            .flat_map(|q| {
                leaves(&FieldPath::top_level(q.qid.clone()), q)
                    .into_iter()
                    .map(|(p, _)| p)
            })
            .collect()
    }

    /// Number of top-level questions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Check if the template declares no questions
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

fn validate_subfield_keys(parent: &str, question: &Question) -> Result<(), TemplateError> {
    for (key, sub) in question.subfields() {
        let path = format!("{parent}.{key}");
        validate_key(key).map_err(|source| TemplateError::InvalidQid {
            qid: path.clone(),
            source,
        })?;
        validate_subfield_keys(&path, sub)?;
    }
    Ok(())
}

fn normalize_subfields(parent: &str, question: &mut Question) {
    if let Some(config) = question.config.as_mut() {
        for (key, sub) in &mut config.fields {
            sub.qid = format!("{parent}.{key}");
            let child_qid = sub.qid.clone();
            normalize_subfields(&child_qid, sub);
        }
    }
}
