//! Execution contexts: named, persistent shells that run typed commands in
//! order.
//!
//! `Tmux` drives real sessions; `RecordingMultiplexer` keeps everything in
//! memory for dry runs and tests.

mod recording;
mod tmux;

use std::fmt;

use matchsweep_core::ContextKey;

pub use recording::{MuxEvent, RecordingMultiplexer};
pub use tmux::Tmux;

/// Outcome of acquiring a context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    /// The session already existed and is reused as is
    Existing,
}

/// A pool of named execution contexts.
///
/// `send_line` returns once the text is queued in the context; it never waits
/// for the command to run.
pub trait Multiplexer {
    /// Create the context unless it already exists.
    fn ensure_session(&mut self, key: &ContextKey) -> Result<SessionState, MuxError>;

    /// Type `line` into the context and press Enter.
    fn send_line(&mut self, key: &ContextKey, line: &str) -> Result<(), MuxError>;
}

/// Failures talking to the multiplexer itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MuxError {
    /// The multiplexer binary could not be started
    Spawn { program: String, message: String },
    /// The multiplexer ran but refused the request
    Rejected {
        action: &'static str,
        key: String,
        stderr: String,
    },
}

impl fmt::Display for MuxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MuxError::Spawn { program, message } => {
                write!(f, "failed to run {program}: {message}")
            }
            MuxError::Rejected { action, key, stderr } => {
                write!(f, "{action} failed for session {key}: {stderr}")
            }
        }
    }
}

impl std::error::Error for MuxError {}
