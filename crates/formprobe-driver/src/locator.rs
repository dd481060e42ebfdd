//! Structured locators
//!
//! Locators are data, not selector strings; a driver translates them into
//! whatever its surface understands. [`Display`](std::fmt::Display) renders
//! a CSS-like form for diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of element searched for inside a container
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Target {
    /// Text-entry element (`input`, `textarea`)
    Input,
    /// Editable rich-text content region
    RichText,
    /// Searchable choice control
    Choice,
    /// Button with the given label
    Button(String),
    /// Element with the given `name` attribute
    Named(String),
}

/// Address of an element on the surface
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Locator {
    /// Element with an explicit identifier
    Id {
        /// Identifier
        id: String,
    },
    /// Field wrapper carrying the qid
    Wrapper {
        /// Top-level or leaf qid
        qid: String,
    },
    /// Target nested inside a container
    Within {
        /// Container locator
        container: Box<Locator>,
        /// Nested element
        target: Target,
    },
    /// Option rows of the currently open choice panel
    OpenOptions,
    /// Unsaved-changes prompt
    Interstitial,
    /// Button that dismisses the unsaved-changes prompt
    InterstitialDismiss,
}

impl Locator {
    /// Element by identifier
    #[inline]
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id { id: id.into() }
    }

    /// Field wrapper by qid
    #[inline]
    #[must_use]
    pub fn wrapper(qid: impl Into<String>) -> Self {
        Self::Wrapper { qid: qid.into() }
    }

    /// Target nested in this locator
    #[inline]
    #[must_use]
    pub fn within(self, target: Target) -> Self {
        Self::Within {
            container: Box::new(self),
            target,
        }
    }
}

fn escape_ident(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for c in id.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input, textarea"),
            Self::RichText => f.write_str("[contenteditable=\"true\"]"),
            Self::Choice => f.write_str("[role=\"combobox\"]"),
            Self::Button(label) => write!(f, "button[aria-label=\"{label}\"]"),
            Self::Named(name) => write!(f, "[name=\"{name}\"]"),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id { id } => write!(f, "#{}", escape_ident(id)),
            Self::Wrapper { qid } => write!(f, "[data-qid=\"{qid}\"]"),
            Self::Within { container, target } => write!(f, "{container} {target}"),
            Self::OpenOptions => f.write_str("[role=\"listbox\"] [role=\"option\"]"),
            Self::Interstitial => f.write_str("[role=\"alertdialog\"]"),
            Self::InterstitialDismiss => {
                f.write_str("[role=\"alertdialog\"] button[data-action=\"discard\"]")
            }
        }
    }
}
