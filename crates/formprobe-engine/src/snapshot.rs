//! Snapshot reader
//!
//! Captures every declared field's value, visibility, and enablement at one
//! point in time. Reading never mutates the surface, so taking a snapshot
//! twice yields the same result.

use crate::fill::toggle;
use crate::resolver::{FieldResolver, Resolved, ResolveTarget};
use crate::surface::Surface;
use formprobe_driver::{DriverError, ElementKind, Locator};
use formprobe_schema::{FieldPath, FieldValue, Question, QuestionType, Template};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One captured field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    /// Owning top-level qid
    pub top_qid: String,
    /// Human label
    pub label: String,
    /// Captured value
    pub value: FieldValue,
}

/// Field values plus hidden and disabled sets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSnapshot {
    entries: IndexMap<String, SnapshotEntry>,
    #[serde(default)]
    hidden: IndexSet<String>,
    #[serde(default)]
    disabled: IndexSet<String>,
}

impl FieldSnapshot {
    /// Create empty snapshot
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value; the first insert fixes the key's position
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        top_qid: impl Into<String>,
        label: impl Into<String>,
        value: FieldValue,
    ) {
        self.entries.insert(
            key.into(),
            SnapshotEntry {
                top_qid: top_qid.into(),
                label: label.into(),
                value,
            },
        );
    }

    /// Mark a key hidden
    pub fn mark_hidden(&mut self, key: impl Into<String>) {
        self.hidden.insert(key.into());
    }

    /// Mark a key disabled
    pub fn mark_disabled(&mut self, key: impl Into<String>) {
        self.disabled.insert(key.into());
    }

    /// Value for a key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.get(key).map(|e| &e.value)
    }

    /// Entry for a key
    #[must_use]
    pub fn entry(&self, key: &str) -> Option<&SnapshotEntry> {
        self.entries.get(key)
    }

    /// Entries in encounter order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &SnapshotEntry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    /// Check if a key is hidden
    #[inline]
    #[must_use]
    pub fn is_hidden(&self, key: &str) -> bool {
        self.hidden.contains(key)
    }

    /// Check if a key is disabled
    #[inline]
    #[must_use]
    pub fn is_disabled(&self, key: &str) -> bool {
        self.disabled.contains(key)
    }

    /// Hidden keys
    #[inline]
    #[must_use]
    pub fn hidden(&self) -> &IndexSet<String> {
        &self.hidden
    }

    /// Disabled keys
    #[inline]
    #[must_use]
    pub fn disabled(&self) -> &IndexSet<String> {
        &self.disabled
    }

    /// Number of captured values
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing was captured
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse from JSON
    ///
    /// # Errors
    /// Malformed JSON
    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Load from a JSON file
    ///
    /// # Errors
    /// Unreadable file or malformed JSON
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content).map_err(std::io::Error::other)
    }

    /// Pretty JSON rendering
    ///
    /// # Errors
    /// Serialisation failure
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Read a resolved control with the accessor its type needs
///
/// # Errors
/// Driver failures
pub async fn read_field_value(
    surface: &Surface,
    resolved: &Resolved,
    question: &Question,
) -> Result<FieldValue, DriverError> {
    if question.question_type == QuestionType::YesNo {
        let side = toggle::read_active(surface, &resolved.locator).await?;
        return Ok(FieldValue::text(side.map_or("", |s| s.label())));
    }

    match resolved.info.kind {
        ElementKind::Choice => {
            let selection = surface.read_selection(resolved.element).await?;
            if question.question_type == QuestionType::MultiChoice {
                Ok(FieldValue::List(selection))
            } else {
                Ok(FieldValue::Text(selection.join(", ")))
            }
        }
        _ => {
            let raw = surface.read_value(resolved.element).await?;
            if question.question_type == QuestionType::Number {
                if let Ok(n) = raw.trim().parse::<f64>() {
                    return Ok(FieldValue::Number(n));
                }
            }
            Ok(FieldValue::Text(raw))
        }
    }
}

enum Presence {
    Hidden,
    Absent,
    Present { resolved: Resolved, disabled: bool },
}

/// Reads [`FieldSnapshot`]s through a resolver
#[derive(Debug, Clone, Copy)]
pub struct SnapshotReader<'a> {
    surface: &'a Surface,
    resolver: &'a FieldResolver,
}

impl<'a> SnapshotReader<'a> {
    /// Create a reader
    #[must_use]
    pub fn new(surface: &'a Surface, resolver: &'a FieldResolver) -> Self {
        Self { surface, resolver }
    }

    /// Capture every declared question and composite leaf
    ///
    /// # Errors
    /// Only infrastructure failures; other read failures become
    /// [`FieldValue::NoValue`]
    pub async fn snapshot(&self, template: &Template) -> Result<FieldSnapshot, DriverError> {
        let mut snap = FieldSnapshot::new();
        for question in template.questions() {
            let path = FieldPath::top_level(question.qid.clone());
            self.read_into(&mut snap, &path, question, None).await?;
        }
        tracing::debug!(
            entries = snap.len(),
            hidden = snap.hidden().len(),
            disabled = snap.disabled().len(),
            "snapshot captured"
        );
        Ok(snap)
    }

    fn read_into<'f>(
        &'f self,
        snap: &'f mut FieldSnapshot,
        path: &'f FieldPath,
        question: &'f Question,
        parent: Option<&'f Question>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), DriverError>> + Send + 'f>>
    {
        Box::pin(async move {
            let key = path.dotted();
            if question.is_schema_hidden() {
                mark_subtree_hidden(snap, path, question);
                return Ok(());
            }

            if question.is_composite() {
                let mut rendered = Vec::new();
                for (sub_key, sub) in question.subfields() {
                    let sub_path = path.child(sub_key);
                    self.read_into(snap, &sub_path, sub, Some(question)).await?;
                    let sub_dotted = sub_path.dotted();
                    if snap.is_hidden(&sub_dotted) {
                        continue;
                    }
                    if let Some(value) = snap.get(&sub_dotted) {
                        rendered.push(format!("{sub_key}={}", render_leaf(value)));
                    }
                }
                let target = self.target(path, question, parent);
                match self.presence(&target).await? {
                    Presence::Hidden => {
                        mark_subtree_hidden(snap, path, question);
                        return Ok(());
                    }
                    Presence::Present { disabled: true, .. } => snap.mark_disabled(key.clone()),
                    Presence::Present { .. } | Presence::Absent => {}
                }
                snap.insert(key, path.top(), question.display_label(), FieldValue::List(rendered));
                return Ok(());
            }

            let target = self.target(path, question, parent);
            let value = match self.presence(&target).await? {
                Presence::Hidden => {
                    snap.mark_hidden(key);
                    return Ok(());
                }
                Presence::Absent => FieldValue::NoValue,
                Presence::Present { resolved, disabled } => {
                    if disabled {
                        snap.mark_disabled(key.clone());
                    }
                    match read_field_value(self.surface, &resolved, question).await {
                        Ok(value) => value,
                        Err(e) if e.is_infrastructure() => return Err(e),
                        Err(e) => {
                            tracing::debug!(key = %key, error = %e, "unreadable field");
                            FieldValue::NoValue
                        }
                    }
                }
            };
            snap.insert(key, path.top(), question.display_label(), value);
            Ok(())
        })
    }

    fn target<'t>(
        &self,
        path: &'t FieldPath,
        question: &'t Question,
        parent: Option<&'t Question>,
    ) -> ResolveTarget<'t> {
        ResolveTarget {
            path,
            question,
            parent,
        }
    }

    async fn presence(&self, target: &ResolveTarget<'_>) -> Result<Presence, DriverError> {
        if let Some(resolved) = self.resolver.probe(self.surface, target).await? {
            if !resolved.info.visible {
                return Ok(Presence::Hidden);
            }
            let disabled = !resolved.info.enabled;
            return Ok(Presence::Present { resolved, disabled });
        }

        // An absent control counts as hidden only when its wrapper says so.
        let wrapper = Locator::wrapper(target.key());
        match self.surface.query(&wrapper).await {
            Ok(Some(handle)) => match self.surface.inspect(handle).await {
                Ok(info) if info.hidden_marked || !info.visible => Ok(Presence::Hidden),
                Ok(_) => Ok(Presence::Absent),
                Err(e) if e.is_infrastructure() => Err(e),
                Err(_) => Ok(Presence::Absent),
            },
            Ok(None) => Ok(Presence::Absent),
            Err(e) if e.is_infrastructure() => Err(e),
            Err(_) => Ok(Presence::Absent),
        }
    }
}

fn mark_subtree_hidden(snap: &mut FieldSnapshot, path: &FieldPath, question: &Question) {
    snap.mark_hidden(path.dotted());
    formprobe_schema::walk(path, question, &mut |p, _, _| snap.mark_hidden(p.dotted()));
}

fn render_leaf(value: &FieldValue) -> String {
    match value {
        FieldValue::List(items) => {
            let mut items = items.clone();
            items.sort();
            items.join("|")
        }
        other => other
            .as_scalar_text()
            .map_or_else(|| other.to_json_string(), |s| s.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formprobe_driver::MemoryPage;
    use std::sync::Arc;
    use std::time::Duration;

    fn fixture() -> (Arc<MemoryPage>, Template) {
        let page = Arc::new(MemoryPage::new());
        page.text_field("title", "Intro to Biology");
        page.yes_no_field("isActive", Some("No"));
        let status = page.text_field("status", "Active");
        page.set_enabled(status, false);
        let legacy = page.add_wrapper("legacy", None);
        page.add_input(Some(legacy), Some("legacy"), None, "secret");
        page.mark_hidden(legacy);

        let template = Template::new(
            "course",
            vec![
                Question::new("title", "Title", QuestionType::Text),
                Question::new("isActive", "Active", QuestionType::YesNo),
                Question::new("status", "Status", QuestionType::Text),
                Question::new("legacy", "Legacy", QuestionType::Text),
                Question::new("missing", "Missing", QuestionType::Text),
                Question::new("internal", "Internal", QuestionType::Text).hidden(),
            ],
        );
        (page, template)
    }

    #[tokio::test]
    async fn classifies_and_reads() {
        let (page, template) = fixture();
        let surface = Surface::new(page, Duration::from_millis(200));
        let resolver = FieldResolver::with_defaults();
        let snap = SnapshotReader::new(&surface, &resolver)
            .snapshot(&template)
            .await
            .unwrap();

        assert_eq!(snap.get("title"), Some(&FieldValue::text("Intro to Biology")));
        assert_eq!(snap.get("isActive"), Some(&FieldValue::text("No")));
        assert!(snap.is_disabled("status"));
        assert_eq!(snap.get("status"), Some(&FieldValue::text("Active")));
        assert!(snap.is_hidden("legacy"));
        assert!(snap.get("legacy").is_none());
        assert_eq!(snap.get("missing"), Some(&FieldValue::NoValue));
        assert!(snap.is_hidden("internal"));
    }

    #[tokio::test]
    async fn snapshot_is_idempotent() {
        let (page, template) = fixture();
        let surface = Surface::new(page, Duration::from_millis(200));
        let resolver = FieldResolver::with_defaults();
        let reader = SnapshotReader::new(&surface, &resolver);
        let first = reader.snapshot(&template).await.unwrap();
        let second = reader.snapshot(&template).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn composite_reads_leaves() {
        let page = Arc::new(MemoryPage::new());
        let wrapper = page.add_wrapper("creditHours", None);
        page.named_number(wrapper, "min", "3");
        page.named_number(wrapper, "max", "4");
        let template = Template::new(
            "course",
            vec![Question::new("creditHours", "Credit Hours", QuestionType::Composite)
                .with_subfield("min", Question::new("", "Min", QuestionType::Number))
                .with_subfield("max", Question::new("", "Max", QuestionType::Number))],
        );
        let surface = Surface::new(page, Duration::from_millis(200));
        let resolver = FieldResolver::with_defaults();
        let snap = SnapshotReader::new(&surface, &resolver)
            .snapshot(&template)
            .await
            .unwrap();

        assert_eq!(snap.get("creditHours.min"), Some(&FieldValue::Number(3.0)));
        assert_eq!(
            snap.get("creditHours"),
            Some(&FieldValue::List(vec!["min=3".into(), "max=4".into()]))
        );
        let keys: Vec<&str> = snap.entries().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["creditHours.min", "creditHours.max", "creditHours"]);
    }

    #[test]
    fn json_round_trip_keeps_order() {
        let mut snap = FieldSnapshot::new();
        snap.insert("b", "b", "B", FieldValue::text("x"));
        snap.insert("a", "a", "A", FieldValue::NoValue);
        snap.mark_hidden("c");
        let json = snap.to_json_pretty().unwrap();
        let back = FieldSnapshot::from_json_str(&json).unwrap();
        let keys: Vec<&str> = back.entries().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert!(back.is_hidden("c"));
    }
}
