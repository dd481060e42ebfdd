//! FormProbe Schema
//!
//! The versioned field schema a form run is driven by:
//! - [`Template`]: the loaded `<entity>Template` document
//! - [`Question`]: one declared field, recursively nested for composites
//! - [`FieldPath`]: addressing of top-level fields and composite leaves
//! - [`FieldValue`]: what a snapshot records for one field
//!
//! # Example
//!
//! ```rust,ignore
//! use formprobe_schema::Template;
//!
//! let template = Template::from_path("course-template.json")?;
//! for leaf in template.leaf_paths() {
//!     println!("{leaf}");
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod path;
pub mod question;
pub mod template;
pub mod value;
pub mod walk;

pub use error::TemplateError;
pub use path::{FieldPath, PathError};
pub use question::{Question, QuestionConfig, QuestionType, Validations};
pub use template::Template;
pub use value::{FieldValue, Normalized, NO_VALUE};
pub use walk::{leaf_paths, leaves, walk, CompositeNode};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
