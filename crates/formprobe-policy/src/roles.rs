//! Semantic role inference
//!
//! Canonical values depend on what a field means, not only its control
//! type. The role is inferred from the last key of the qid and the label.

use formprobe_schema::Question;

/// Meaning of a field for value generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticRole {
    /// Lower bound of a numeric pair
    Min,
    /// Upper bound of a numeric pair
    Max,
    /// Duration or length in time units
    Duration,
    /// Email address
    Email,
    /// Web address
    Url,
    /// Phone number
    Phone,
    /// Short identifying code
    Code,
    /// Name or title
    Title,
    /// Description or notes
    Description,
    /// Anything else
    Generic,
}

impl SemanticRole {
    /// Infer the role of a question
    #[must_use]
    pub fn infer(question: &Question) -> Self {
        let key = question
            .qid
            .rsplit('.')
            .next()
            .unwrap_or(&question.qid)
            .to_lowercase();
        let label = question.label.to_lowercase();

        if matches!(key.as_str(), "min" | "minimum" | "from" | "low") {
            return Self::Min;
        }
        if matches!(key.as_str(), "max" | "maximum" | "to" | "high") {
            return Self::Max;
        }

        let mentions = |needle: &str| key.contains(needle) || label.contains(needle);

        if mentions("email") {
            Self::Email
        } else if mentions("url") || mentions("website") || mentions("link") {
            Self::Url
        } else if mentions("phone") {
            Self::Phone
        } else if mentions("duration") || mentions("minutes") || mentions("length") {
            Self::Duration
        } else if mentions("description") || mentions("notes") || mentions("summary") {
            Self::Description
        } else if mentions("code") || key.ends_with("number") {
            Self::Code
        } else if mentions("title") || mentions("name") {
            Self::Title
        } else {
            Self::Generic
        }
    }

    /// Roles whose default text must not carry the canonical suffix
    #[inline]
    #[must_use]
    pub fn is_format_sensitive(self) -> bool {
        matches!(self, Self::Email | Self::Url | Self::Phone)
    }
}
