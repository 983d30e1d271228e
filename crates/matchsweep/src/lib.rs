//! Batch dispatcher for the patient/provider matching experiments
//!
//! Expands the sweep plan from `matchsweep_core`, opens one tmux session per
//! sweep session and types one simulation command per configuration into it.
//! Dispatch is fire-and-forget: nothing waits for a simulation to finish.
//! Result files can be inspected afterwards with the `results` helpers.

pub mod config;
pub mod dispatch;
pub mod logging;
pub mod manifest;
pub mod mux;
pub mod results;
pub mod util;

pub use config::{ConfigError, PlanSource, load_plan};
pub use dispatch::{DispatchReport, dispatch};
pub use logging::init_logging;
pub use mux::{Multiplexer, MuxError, RecordingMultiplexer, SessionState, Tmux};
