use std::collections::BTreeSet;

use matchsweep_core::ContextKey;

use super::{Multiplexer, MuxError, SessionState};

/// What happened to a recorded context, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MuxEvent {
    Created(ContextKey),
    Reused(ContextKey),
    Sent { key: ContextKey, line: String },
}

/// In-memory multiplexer used for dry runs and tests
#[derive(Debug, Default)]
pub struct RecordingMultiplexer {
    sessions: BTreeSet<ContextKey>,
    events: Vec<MuxEvent>,
}

impl RecordingMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with some sessions already open
    pub fn with_existing(keys: impl IntoIterator<Item = ContextKey>) -> Self {
        Self {
            sessions: keys.into_iter().collect(),
            events: Vec::new(),
        }
    }

    pub fn events(&self) -> &[MuxEvent] {
        &self.events
    }

    /// Lines typed into one context, in order
    pub fn transcript(&self, key: &ContextKey) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                MuxEvent::Sent { key: k, line } if k == key => Some(line.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn sessions(&self) -> impl Iterator<Item = &ContextKey> {
        self.sessions.iter()
    }
}

impl Multiplexer for RecordingMultiplexer {
    fn ensure_session(&mut self, key: &ContextKey) -> Result<SessionState, MuxError> {
        if self.sessions.insert(key.clone()) {
            self.events.push(MuxEvent::Created(key.clone()));
            Ok(SessionState::Created)
        } else {
            self.events.push(MuxEvent::Reused(key.clone()));
            Ok(SessionState::Existing)
        }
    }

    fn send_line(&mut self, key: &ContextKey, line: &str) -> Result<(), MuxError> {
        // tmux refuses keys for a session that does not exist; mirror that
        if !self.sessions.contains(key) {
            return Err(MuxError::Rejected {
                action: "send-keys",
                key: key.to_string(),
                stderr: format!("can't find session: {key}"),
            });
        }
        self.events.push(MuxEvent::Sent {
            key: key.clone(),
            line: line.to_string(),
        });
        Ok(())
    }
}
