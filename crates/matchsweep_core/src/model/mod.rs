//! Type definitions for the sweep
//!
//! This module contains the data types that describe a sweep:
//! - `ids` - Session indices and execution-context keys
//! - `experiment` - The per-run configuration record
//! - `plan` - The enumeration policy and launcher settings

mod experiment;
mod ids;
mod plan;

pub use experiment::ExperimentConfig;
pub use ids::{ContextKey, DEFAULT_CONTEXT_PREFIX, SessionIndex};
pub use plan::{FixedParameters, LauncherSettings, SweepPlan};
