//! The sweep dispatcher
//!
//! Walks the submissions in order, acquiring each execution context the first
//! time it is referenced and typing one command line per submission into it.
//! Nothing is awaited: a command is considered dispatched once the
//! multiplexer has accepted the keystrokes.
//!
//! Multiplexer failures are logged and recorded in the report, then dispatch
//! moves on. A failed acquisition does not skip the context's commands; the
//! send is still attempted (and will usually fail the same way).

use serde::Serialize;

use matchsweep_core::{ContextKey, LauncherSettings, Submission, render_command};

use crate::mux::{Multiplexer, MuxError, SessionState};

/// One command handed to a context
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchedCommand {
    pub context: ContextKey,
    pub command: String,
    /// Whether the multiplexer accepted the keystrokes
    pub delivered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DispatchStage {
    Acquire,
    Send,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchFailure {
    pub context: ContextKey,
    pub stage: DispatchStage,
    pub error: MuxError,
}

/// What a dispatch run did, in order
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Each referenced context and how it was acquired (`None` on failure)
    pub contexts: Vec<(ContextKey, Option<SessionState>)>,
    pub commands: Vec<DispatchedCommand>,
    pub failures: Vec<DispatchFailure>,
}

impl DispatchReport {
    pub fn delivered(&self) -> usize {
        self.commands.iter().filter(|c| c.delivered).count()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Submit every command, in order, without waiting on any of them.
pub fn dispatch<M: Multiplexer + ?Sized>(
    mux: &mut M,
    launcher: &LauncherSettings,
    submissions: &[Submission],
) -> DispatchReport {
    let mut report = DispatchReport::default();

    for submission in submissions {
        let context = &submission.context;

        if !report.contexts.iter().any(|(key, _)| key == context) {
            let state = match mux.ensure_session(context) {
                Ok(state) => {
                    tracing::info!(context = %context, state = ?state, "Execution context acquired");
                    Some(state)
                }
                Err(error) => {
                    tracing::warn!(context = %context, error = %error, "Could not acquire execution context");
                    report.failures.push(DispatchFailure {
                        context: context.clone(),
                        stage: DispatchStage::Acquire,
                        error,
                    });
                    None
                }
            };
            report.contexts.push((context.clone(), state));
        }

        let command = render_command(launcher, &submission.config);
        let delivered = match mux.send_line(context, &command) {
            Ok(()) => {
                tracing::debug!(
                    context = %context,
                    seed = submission.config.seed,
                    n_patients = submission.config.n_patients,
                    n_providers = submission.config.n_providers,
                    "Command submitted"
                );
                true
            }
            Err(error) => {
                tracing::warn!(context = %context, error = %error, "Command not submitted");
                report.failures.push(DispatchFailure {
                    context: context.clone(),
                    stage: DispatchStage::Send,
                    error,
                });
                false
            }
        };

        report.commands.push(DispatchedCommand {
            context: context.clone(),
            command,
            delivered,
        });
    }

    tracing::info!(
        contexts = report.contexts.len(),
        delivered = report.delivered(),
        failures = report.failures.len(),
        "Dispatch finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mux::{MuxEvent, RecordingMultiplexer};
    use matchsweep_core::{SessionIndex, SweepPlan, enumerate};

    fn key(n: u32) -> ContextKey {
        ContextKey::for_session("match_", SessionIndex(n))
    }

    /// Refuses to create sessions and to accept keys for one context
    struct BrokenMultiplexer {
        refuse_sends_to: ContextKey,
        sent: Vec<ContextKey>,
    }

    impl Multiplexer for BrokenMultiplexer {
        fn ensure_session(&mut self, key: &ContextKey) -> Result<SessionState, MuxError> {
            Err(MuxError::Rejected {
                action: "new-session",
                key: key.to_string(),
                stderr: "no server".to_string(),
            })
        }

        fn send_line(&mut self, key: &ContextKey, _line: &str) -> Result<(), MuxError> {
            if *key == self.refuse_sends_to {
                return Err(MuxError::Spawn {
                    program: "tmux".to_string(),
                    message: "not found".to_string(),
                });
            }
            self.sent.push(key.clone());
            Ok(())
        }
    }

    #[test]
    fn test_dispatch_default_plan() {
        let plan = SweepPlan::default();
        let submissions = enumerate(&plan);
        let mut mux = RecordingMultiplexer::new();

        let report = dispatch(&mut mux, &plan.launcher, &submissions);

        assert!(report.is_clean());
        assert_eq!(report.delivered(), 120);
        assert_eq!(
            report.contexts,
            vec![
                (key(1), Some(SessionState::Created)),
                (key(2), Some(SessionState::Created)),
                (key(3), Some(SessionState::Created)),
            ]
        );
        for n in 1..=3 {
            assert_eq!(mux.transcript(&key(n)).len(), 40);
        }
    }

    #[test]
    fn test_each_context_acquired_once_before_its_commands() {
        let plan = SweepPlan::default();
        let submissions = enumerate(&plan);
        let mut mux = RecordingMultiplexer::new();

        dispatch(&mut mux, &plan.launcher, &submissions);

        let events = mux.events();
        assert_eq!(events.len(), 123);
        assert_eq!(events[0], MuxEvent::Created(key(1)));
        assert_eq!(events[41], MuxEvent::Created(key(2)));
        assert_eq!(events[82], MuxEvent::Created(key(3)));
    }

    #[test]
    fn test_commands_follow_enumeration_order() {
        let plan = SweepPlan::default();
        let submissions = enumerate(&plan);
        let mut mux = RecordingMultiplexer::new();

        let report = dispatch(&mut mux, &plan.launcher, &submissions);

        let expected: Vec<String> = submissions
            .iter()
            .map(|s| render_command(&plan.launcher, &s.config))
            .collect();
        let sent: Vec<String> = report.commands.iter().map(|c| c.command.clone()).collect();
        assert_eq!(sent, expected);

        let match_2: Vec<String> = mux
            .transcript(&key(2))
            .into_iter()
            .map(str::to_string)
            .collect();
        assert_eq!(match_2, expected[40..80].to_vec());
    }

    #[test]
    fn test_existing_sessions_are_reused() {
        let plan = SweepPlan::default();
        let submissions = enumerate(&plan);
        let mut mux = RecordingMultiplexer::with_existing([key(2)]);

        let report = dispatch(&mut mux, &plan.launcher, &submissions);

        assert!(report.is_clean());
        assert_eq!(report.contexts[1], (key(2), Some(SessionState::Existing)));
        assert_eq!(mux.events()[41], MuxEvent::Reused(key(2)));
    }

    #[test]
    fn test_failures_do_not_stop_dispatch() {
        let plan = SweepPlan::default();
        let submissions = enumerate(&plan);
        let mut mux = BrokenMultiplexer {
            refuse_sends_to: key(2),
            sent: Vec::new(),
        };

        let report = dispatch(&mut mux, &plan.launcher, &submissions);

        assert_eq!(report.commands.len(), 120);
        assert_eq!(report.delivered(), 80);
        assert_eq!(mux.sent.len(), 80);
        assert!(report.contexts.iter().all(|(_, state)| state.is_none()));

        let acquire_failures = report
            .failures
            .iter()
            .filter(|f| f.stage == DispatchStage::Acquire)
            .count();
        let send_failures = report
            .failures
            .iter()
            .filter(|f| f.stage == DispatchStage::Send)
            .count();
        assert_eq!(acquire_failures, 3);
        assert_eq!(send_failures, 40);
        assert!(
            report
                .commands
                .iter()
                .filter(|c| !c.delivered)
                .all(|c| c.context == key(2))
        );
    }
}
