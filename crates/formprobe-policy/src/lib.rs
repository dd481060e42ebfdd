//! FormProbe Policy
//!
//! Pure decision tables for a form run:
//! - [`ValueGenerator`]: the replacement value for each field
//! - [`CanonicalSuffix`]: idempotent marker handling for mutated text
//! - [`SkipPolicy`] / [`ActionContext`]: which fields an action may touch
//! - [`SkipRegistry`]: first-reason-wins record of skipped fields
//!
//! Nothing here talks to the UI surface.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod generator;
pub mod registry;
pub mod roles;
pub mod skip;
pub mod suffix;

pub use generator::{
    GeneratedValue, GeneratorContext, SiblingState, ToggleSide, ValueGenerator,
    DEFAULT_DATE_FORMAT,
};
pub use registry::SkipRegistry;
pub use roles::SemanticRole;
pub use skip::{ActionContext, ActionKind, SkipDecision, SkipPolicy, SkipReason};
pub use suffix::{CanonicalSuffix, DEFAULT_SUFFIX};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
