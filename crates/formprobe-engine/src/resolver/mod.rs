//! Field resolution
//!
//! Maps a question to a live control through an ordered chain of
//! [`LocatorStrategy`] values. The first candidate that is present, visible,
//! and enabled wins. Resolution only queries and inspects; it never changes
//! the surface.

pub mod strategies;

use crate::surface::Surface;
use formprobe_driver::{DriverError, ElementHandle, ElementInfo, Locator};
use formprobe_schema::{FieldPath, Question};
pub use strategies::{
    CompositePath, ExplicitId, NestedChoice, NestedInput, RichTextRegion, WrapperItself,
};

/// What is being resolved
#[derive(Debug, Clone, Copy)]
pub struct ResolveTarget<'a> {
    /// Field path
    pub path: &'a FieldPath,
    /// Question at that path
    pub question: &'a Question,
    /// Owning composite question, for leaves
    pub parent: Option<&'a Question>,
}

impl<'a> ResolveTarget<'a> {
    /// Top-level question
    #[must_use]
    pub fn top(path: &'a FieldPath, question: &'a Question) -> Self {
        Self {
            path,
            question,
            parent: None,
        }
    }

    /// Composite leaf
    #[must_use]
    pub fn leaf(path: &'a FieldPath, question: &'a Question, parent: &'a Question) -> Self {
        Self {
            path,
            question,
            parent: Some(parent),
        }
    }

    /// Field key used for wrappers and identifiers
    #[must_use]
    pub fn key(&self) -> String {
        self.path.dotted()
    }
}

/// Candidate locator source
pub trait LocatorStrategy: Send + Sync + std::fmt::Debug {
    /// Strategy name (for diagnostics)
    fn name(&self) -> &'static str;

    /// Whether this strategy applies to the target
    fn applies(&self, target: &ResolveTarget<'_>) -> bool;

    /// Candidate locators, most specific first
    fn candidates(&self, target: &ResolveTarget<'_>) -> Vec<Locator>;
}

/// A control the resolver settled on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Element handle
    pub element: ElementHandle,
    /// Locator that matched
    pub locator: Locator,
    /// Strategy that produced the locator
    pub strategy: &'static str,
    /// Element state at resolution time
    pub info: ElementInfo,
}

/// Ordered strategy chain
#[derive(Debug)]
pub struct FieldResolver {
    strategies: Vec<Box<dyn LocatorStrategy>>,
}

impl Default for FieldResolver {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl FieldResolver {
    /// Create resolver with no strategies
    #[must_use]
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Create resolver with the built-in chain
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::empty()
            .with_strategy(CompositePath)
            .with_strategy(ExplicitId)
            .with_strategy(RichTextRegion)
            .with_strategy(NestedInput)
            .with_strategy(NestedChoice)
            .with_strategy(WrapperItself)
    }

    /// Append a strategy to the chain
    #[must_use]
    pub fn with_strategy(mut self, strategy: impl LocatorStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Names of the strategies, in chain order
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Candidate locators for a target, in evaluation order
    #[must_use]
    pub fn candidates(&self, target: &ResolveTarget<'_>) -> Vec<(&'static str, Locator)> {
        let mut out: Vec<(&'static str, Locator)> = Vec::new();
        for strategy in self.strategies.iter().filter(|s| s.applies(target)) {
            for locator in strategy.candidates(target) {
                if !out.iter().any(|(_, l)| *l == locator) {
                    out.push((strategy.name(), locator));
                }
            }
        }
        out
    }

    /// First present, visible, and enabled candidate
    ///
    /// # Errors
    /// Only infrastructure failures; a timed-out or stale candidate counts
    /// as absent
    pub async fn resolve(
        &self,
        surface: &Surface,
        target: &ResolveTarget<'_>,
    ) -> Result<Option<Resolved>, DriverError> {
        self.first_match(surface, target, true).await
    }

    /// First present candidate regardless of visibility or enablement
    ///
    /// # Errors
    /// Only infrastructure failures
    pub async fn probe(
        &self,
        surface: &Surface,
        target: &ResolveTarget<'_>,
    ) -> Result<Option<Resolved>, DriverError> {
        self.first_match(surface, target, false).await
    }

    async fn first_match(
        &self,
        surface: &Surface,
        target: &ResolveTarget<'_>,
        interactive_only: bool,
    ) -> Result<Option<Resolved>, DriverError> {
        for (strategy, locator) in self.candidates(target) {
            let element = match surface.query(&locator).await {
                Ok(Some(element)) => element,
                Ok(None) => continue,
                Err(e) if e.is_infrastructure() => return Err(e),
                Err(e) => {
                    tracing::debug!(%locator, error = %e, "candidate treated as absent");
                    continue;
                }
            };
            let info = match surface.inspect(element).await {
                Ok(info) => info,
                Err(e) if e.is_infrastructure() => return Err(e),
                Err(_) => continue,
            };
            if interactive_only && !info.is_interactive() {
                continue;
            }
            tracing::trace!(key = %target.key(), strategy, %locator, "resolved");
            return Ok(Some(Resolved {
                element,
                locator,
                strategy,
                info,
            }));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formprobe_driver::{MemoryPage, UiDriver};
    use formprobe_schema::QuestionType;
    use std::sync::Arc;
    use std::time::Duration;

    fn surface(page: &Arc<MemoryPage>) -> Surface {
        Surface::new(page.clone(), Duration::from_millis(500))
    }

    #[test]
    fn chain_order_is_type_hinted() {
        let resolver = FieldResolver::with_defaults();
        let q = Question::new("bio", "Bio", QuestionType::RichText);
        let path = FieldPath::top_level("bio");
        let names: Vec<_> = resolver
            .candidates(&ResolveTarget::top(&path, &q))
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["explicit_id", "rich_text_region"]);

        let toggle = Question::new("isActive", "Active", QuestionType::YesNo);
        let path = FieldPath::top_level("isActive");
        let names: Vec<_> = resolver
            .candidates(&ResolveTarget::top(&path, &toggle))
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["explicit_id", "wrapper"]);
    }

    #[tokio::test]
    async fn resolves_through_wrapper_when_id_missing() {
        let page = Arc::new(MemoryPage::new());
        let region = page.rich_text_field("bio", "<p>hi</p>");
        let q = Question::new("bio", "Bio", QuestionType::RichText);
        let path = FieldPath::top_level("bio");

        let resolved = FieldResolver::with_defaults()
            .resolve(&surface(&page), &ResolveTarget::top(&path, &q))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.element, region);
        assert_eq!(resolved.strategy, "rich_text_region");
    }

    #[tokio::test]
    async fn disabled_control_resolves_only_by_probe() {
        let page = Arc::new(MemoryPage::new());
        let input = page.text_field("status", "Active");
        page.set_enabled(input, false);
        let q = Question::new("status", "Status", QuestionType::Text);
        let path = FieldPath::top_level("status");
        let target = ResolveTarget::top(&path, &q);
        let resolver = FieldResolver::with_defaults();

        assert!(resolver.resolve(&surface(&page), &target).await.unwrap().is_none());
        let probed = resolver.probe(&surface(&page), &target).await.unwrap().unwrap();
        assert!(!probed.info.enabled);
    }

    #[tokio::test]
    async fn composite_leaf_by_parent_type_name() {
        let page = Arc::new(MemoryPage::new());
        let wrapper = page.add_wrapper("creditHours", None);
        let max = page.named_number(wrapper, "composite-max", "");

        let parent = Question::new("creditHours", "Credit Hours", QuestionType::Composite);
        let leaf = Question::new("creditHours.max", "Max", QuestionType::Number);
        let path = FieldPath::new("creditHours", vec!["max".to_string()]);

        let resolved = FieldResolver::with_defaults()
            .resolve(&surface(&page), &ResolveTarget::leaf(&path, &leaf, &parent))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.element, max);
        assert_eq!(resolved.strategy, "composite_path");
    }

    #[tokio::test]
    async fn infrastructure_failure_propagates() {
        let page = Arc::new(MemoryPage::new());
        page.text_field("title", "x");
        page.disconnect();
        let q = Question::new("title", "Title", QuestionType::Text);
        let path = FieldPath::top_level("title");
        let err = FieldResolver::with_defaults()
            .resolve(&surface(&page), &ResolveTarget::top(&path, &q))
            .await
            .unwrap_err();
        assert!(err.is_infrastructure());
        assert!(page.query(&Locator::id("title")).await.is_err());
    }
}
