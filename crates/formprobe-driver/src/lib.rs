//! FormProbe Driver
//!
//! The port through which the engine reaches a live form:
//! - [`UiDriver`]: async surface operations (query, inspect, read, write, click)
//! - [`Locator`]: structured element addresses
//! - [`DriverError`]: surface failures, classified for retry and abort
//! - [`MemoryPage`]: in-memory reference surface for tests and dry runs
//!
//! # Example
//!
//! ```rust,ignore
//! use formprobe_driver::{Locator, MemoryPage, UiDriver};
//!
//! let page = MemoryPage::new();
//! let input = page.text_field("title", "Intro to Biology");
//! assert_eq!(page.query(&Locator::id("title")).await?, Some(input));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod locator;
pub mod memory;
pub mod port;

pub use error::DriverError;
pub use locator::{Locator, Target};
pub use memory::{MemoryPage, NO_RESULTS_LABEL};
pub use port::{ElementHandle, ElementInfo, ElementKind, Key, UiDriver, WaitState};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
