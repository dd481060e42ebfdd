//! Built-in locator strategies
//!
//! Each strategy turns a [`ResolveTarget`] into zero or more candidate
//! locators. None of them touch the surface.

use super::{LocatorStrategy, ResolveTarget};
use formprobe_driver::{Locator, Target};
use formprobe_schema::QuestionType;

/// Explicit identifier: the qid, then the data key
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitId;

impl LocatorStrategy for ExplicitId {
    fn name(&self) -> &'static str {
        "explicit_id"
    }

    fn applies(&self, target: &ResolveTarget<'_>) -> bool {
        target.path.is_top_level()
    }

    fn candidates(&self, target: &ResolveTarget<'_>) -> Vec<Locator> {
        let mut out = vec![Locator::id(target.key())];
        if let Some(data_key) = target.question.data_key.as_deref() {
            if data_key != target.key() && !data_key.is_empty() {
                out.push(Locator::id(data_key));
            }
        }
        out
    }
}

/// Composite leaf addressed through its parent
///
/// Tries `parent.sub` and `parent-sub` identifiers, then named elements
/// inside the parent wrapper, including the `parentType-sub` naming some
/// composite widgets use.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositePath;

impl LocatorStrategy for CompositePath {
    fn name(&self) -> &'static str {
        "composite_path"
    }

    fn applies(&self, target: &ResolveTarget<'_>) -> bool {
        !target.path.is_top_level()
    }

    fn candidates(&self, target: &ResolveTarget<'_>) -> Vec<Locator> {
        let Some(parent) = target.path.parent() else {
            return Vec::new();
        };
        let parent_key = parent.dotted();
        let sub = target.path.last_key();

        let mut out = vec![
            Locator::id(format!("{parent_key}.{sub}")),
            Locator::id(format!("{parent_key}-{sub}")),
            Locator::wrapper(parent_key.clone()).within(Target::Named(sub.to_string())),
        ];
        if let Some(parent_question) = target.parent {
            out.push(
                Locator::wrapper(parent_key)
                    .within(Target::Named(format!("{}-{sub}", parent_question.question_type))),
            );
        }
        out
    }
}

/// Text-entry element nested inside the field wrapper
#[derive(Debug, Clone, Copy, Default)]
pub struct NestedInput;

impl LocatorStrategy for NestedInput {
    fn name(&self) -> &'static str {
        "nested_input"
    }

    fn applies(&self, target: &ResolveTarget<'_>) -> bool {
        matches!(
            target.question.question_type,
            QuestionType::Text
                | QuestionType::LongText
                | QuestionType::Number
                | QuestionType::Date
                | QuestionType::Other(_)
        )
    }

    fn candidates(&self, target: &ResolveTarget<'_>) -> Vec<Locator> {
        vec![Locator::wrapper(target.key()).within(Target::Input)]
    }
}

/// Content region of a rich-text editor
#[derive(Debug, Clone, Copy, Default)]
pub struct RichTextRegion;

impl LocatorStrategy for RichTextRegion {
    fn name(&self) -> &'static str {
        "rich_text_region"
    }

    fn applies(&self, target: &ResolveTarget<'_>) -> bool {
        matches!(
            target.question.question_type,
            QuestionType::RichText | QuestionType::LongText
        )
    }

    fn candidates(&self, target: &ResolveTarget<'_>) -> Vec<Locator> {
        vec![Locator::wrapper(target.key()).within(Target::RichText)]
    }
}

/// Searchable choice control inside the field wrapper
#[derive(Debug, Clone, Copy, Default)]
pub struct NestedChoice;

impl LocatorStrategy for NestedChoice {
    fn name(&self) -> &'static str {
        "nested_choice"
    }

    fn applies(&self, target: &ResolveTarget<'_>) -> bool {
        target.question.question_type.is_choice()
    }

    fn candidates(&self, target: &ResolveTarget<'_>) -> Vec<Locator> {
        vec![Locator::wrapper(target.key()).within(Target::Choice)]
    }
}

/// The field wrapper itself, for toggle pairs and composites
#[derive(Debug, Clone, Copy, Default)]
pub struct WrapperItself;

impl LocatorStrategy for WrapperItself {
    fn name(&self) -> &'static str {
        "wrapper"
    }

    fn applies(&self, target: &ResolveTarget<'_>) -> bool {
        target.question.question_type == QuestionType::YesNo || target.question.is_composite()
    }

    fn candidates(&self, target: &ResolveTarget<'_>) -> Vec<Locator> {
        vec![Locator::wrapper(target.key())]
    }
}
