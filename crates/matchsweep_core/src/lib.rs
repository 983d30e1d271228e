//! Parameter-sweep planning for the patient/provider matching experiments
//!
//! This crate turns a sweep plan into an ordered list of submissions, one per
//! simulation run, and renders each into the shell line a session executes.
//! It also reads back the JSON result files those runs produce:
//! - Deterministic enumeration (same plan, same commands, same order)
//! - Result-file naming and parameter matching
//! - Mean/std aggregation of metrics across seeds, optionally normalized
//!   against a baseline policy
//!
//! Nothing here spawns processes or touches the filesystem.
//!
//! ```ignore
//! use matchsweep_core::{SweepPlan, enumerate, render_command};
//!
//! let plan = SweepPlan::default();
//! for submission in enumerate(&plan) {
//!     println!("{} {}", submission.context, render_command(&plan.launcher, &submission.config));
//! }
//! ```

#![warn(clippy::all)]

pub mod command;
pub mod enumerate;
pub mod error;
pub mod model;
pub mod results;

#[cfg(test)]
mod tests;

pub use command::render_command;
pub use enumerate::{SubSweep, Submission, enumerate};
pub use error::{PlanError, ResultError};
pub use model::{
    ContextKey, ExperimentConfig, FixedParameters, LauncherSettings, SessionIndex, SweepPlan,
};
pub use results::{MetricSummary, ResultRecord, RunStamp};
