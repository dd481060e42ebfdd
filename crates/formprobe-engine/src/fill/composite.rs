//! Composite subfield ordering

use formprobe_policy::SemanticRole;
use formprobe_schema::Question;

/// Declared subfields with lower bounds first and upper bounds last
///
/// A `max` value is derived from the `min` generated before it, so the
/// order matters even when the template declares `max` first.
#[must_use]
pub fn ordered_subfields(question: &Question) -> Vec<(&str, &Question)> {
    let mut subs: Vec<(&str, &Question)> = question.subfields().collect();
    subs.sort_by_key(|(_, q)| match SemanticRole::infer(q) {
        SemanticRole::Min => 0u8,
        SemanticRole::Max => 2,
        _ => 1,
    });
    subs
}
