//! FormProbe Engine
//!
//! Template-driven field resolution, mutation, and difference engine:
//! - [`FieldResolver`]: maps a question to a live control through ordered
//!   locator strategies
//! - [`FieldFiller`]: type dispatch, value generation, and read-back
//! - [`SnapshotReader`]: point-in-time capture of every declared field
//! - [`classify`]: before/after comparison into report rows
//! - [`FormProbe`]: the run orchestrator tying these together
//!
//! # Example
//!
//! ```rust,ignore
//! use formprobe_engine::{EngineConfig, FormProbe};
//! use formprobe_policy::{ActionContext, ActionKind};
//! use formprobe_schema::Template;
//!
//! # async fn example(driver: std::sync::Arc<dyn formprobe_driver::UiDriver>) -> Result<(), Box<dyn std::error::Error>> {
//! let template = Template::from_path("course-template.json")?;
//! let probe = FormProbe::new(driver, EngineConfig::from_path("formprobe.toml")?);
//!
//! let run = probe.run(&template, ActionContext::for_kind(ActionKind::Update)).await?;
//! println!("{}", run.report.to_json_pretty()?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod context;
pub mod diagnostics;
pub mod diff;
pub mod engine;
pub mod error;
pub mod fill;
pub mod interstitial;
pub mod report;
pub mod resolver;
pub mod snapshot;
pub mod surface;

pub use config::EngineConfig;
pub use context::{RunContext, RunId, RunOutcome};
pub use diagnostics::Diagnostic;
pub use diff::{classify, DiffInputs, DiffRow, DiffStatus};
pub use engine::{FormProbe, FormSaver, RunReport};
pub use error::{DriverResultExt, EngineError, FieldError};
pub use fill::{FieldFiller, FillOutcome};
pub use report::{DiffReport, StatusCounts};
pub use resolver::{FieldResolver, LocatorStrategy, ResolveTarget, Resolved};
pub use snapshot::{read_field_value, FieldSnapshot, SnapshotEntry, SnapshotReader};
pub use surface::Surface;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
