//! Identifiers for sessions and execution contexts
//!
//! A session index is the small integer driving the outer sweep loop; the
//! context key is the name under which the terminal multiplexer knows the
//! session (`match_1`, `match_2`, ...).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default prefix for execution-context names
pub const DEFAULT_CONTEXT_PREFIX: &str = "match_";

/// Index of one sweep session (1-based in the default plan)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionIndex(pub u32);

impl fmt::Display for SessionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of a persistent execution context
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContextKey(String);

impl ContextKey {
    /// Build the key for a session, e.g. `match_2`
    pub fn for_session(prefix: &str, session: SessionIndex) -> Self {
        Self(format!("{prefix}{session}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContextKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
