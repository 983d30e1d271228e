use std::ffi::OsString;
use std::process::{Command, Output, Stdio};

use matchsweep_core::ContextKey;

use super::{Multiplexer, MuxError, SessionState};

/// Sessions managed through the `tmux` command line
#[derive(Debug, Clone)]
pub struct Tmux {
    program: OsString,
    /// Arguments placed before every subcommand, e.g. `-L <socket>`
    leading_args: Vec<OsString>,
}

impl Default for Tmux {
    fn default() -> Self {
        Self::new()
    }
}

impl Tmux {
    pub fn new() -> Self {
        Self::with_program("tmux")
    }

    /// Use a specific tmux binary (or a stand-in with the same CLI)
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Talk to a dedicated tmux server (`tmux -L <socket>`)
    pub fn on_socket(mut self, socket: impl Into<OsString>) -> Self {
        self.leading_args.push("-L".into());
        self.leading_args.push(socket.into());
        self
    }

    /// Prepend an argument to every invocation
    pub fn with_leading_arg(mut self, arg: impl Into<OsString>) -> Self {
        self.leading_args.push(arg.into());
        self
    }

    fn run(&self, args: &[&str]) -> Result<Output, MuxError> {
        Command::new(&self.program)
            .args(&self.leading_args)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| MuxError::Spawn {
                program: self.program.to_string_lossy().into_owned(),
                message: e.to_string(),
            })
    }

    fn has_session(&self, key: &ContextKey) -> Result<bool, MuxError> {
        // `=` forces an exact match so match_1 never resolves to match_10
        let target = format!("={key}");
        Ok(self.run(&["has-session", "-t", &target])?.status.success())
    }
}

impl Multiplexer for Tmux {
    fn ensure_session(&mut self, key: &ContextKey) -> Result<SessionState, MuxError> {
        if self.has_session(key)? {
            return Ok(SessionState::Existing);
        }

        let output = self.run(&["new-session", "-d", "-s", key.as_str()])?;
        if !output.status.success() {
            return Err(MuxError::Rejected {
                action: "new-session",
                key: key.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(SessionState::Created)
    }

    fn send_line(&mut self, key: &ContextKey, line: &str) -> Result<(), MuxError> {
        // Exact session, its current window; a bare key would prefix-match
        let target = format!("={key}:");
        let output = self.run(&["send-keys", "-t", &target, line, "Enter"])?;
        if !output.status.success() {
            return Err(MuxError::Rejected {
                action: "send-keys",
                key: key.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchsweep_core::SessionIndex;

    fn key(n: u32) -> ContextKey {
        ContextKey::for_session("match_", SessionIndex(n))
    }

    #[test]
    fn test_missing_binary_is_spawn_error() {
        let mut tmux = Tmux::with_program("/nonexistent/definitely-not-tmux");

        let err = tmux.ensure_session(&key(1)).unwrap_err();
        assert!(matches!(err, MuxError::Spawn { .. }));

        let err = tmux.send_line(&key(1), "echo hi").unwrap_err();
        assert!(matches!(err, MuxError::Spawn { .. }));
    }

    #[cfg(unix)]
    mod fake_tmux {
        use super::*;
        use std::fs;
        use std::path::{Path, PathBuf};
        use tempfile::TempDir;

        /// Stand-in tmux run through `sh`: logs its arguments one call per
        /// line, and reports `has-session` as missing unless `exists` is set.
        fn fake_tmux(dir: &Path, exists: bool) -> (Tmux, PathBuf) {
            let log = dir.join("calls.log");
            let script = dir.join("tmux.sh");
            let has_status = if exists { 0 } else { 1 };
            fs::write(
                &script,
                format!(
                    "echo \"$@\" >> '{}'\nif [ \"$1\" = has-session ]; then exit {}; fi\nexit 0\n",
                    log.display(),
                    has_status
                ),
            )
            .unwrap();
            (Tmux::with_program("sh").with_leading_arg(script), log)
        }

        #[test]
        fn test_creates_missing_session() {
            let dir = TempDir::new().unwrap();
            let (mut tmux, log) = fake_tmux(dir.path(), false);

            assert_eq!(tmux.ensure_session(&key(2)).unwrap(), SessionState::Created);

            let calls = fs::read_to_string(log).unwrap();
            assert_eq!(calls, "has-session -t =match_2\nnew-session -d -s match_2\n");
        }

        #[test]
        fn test_reuses_existing_session() {
            let dir = TempDir::new().unwrap();
            let (mut tmux, log) = fake_tmux(dir.path(), true);

            assert_eq!(tmux.ensure_session(&key(1)).unwrap(), SessionState::Existing);
            assert_eq!(fs::read_to_string(log).unwrap(), "has-session -t =match_1\n");
        }

        #[test]
        fn test_send_line_types_command_then_enter() {
            let dir = TempDir::new().unwrap();
            let (mut tmux, log) = fake_tmux(dir.path(), true);

            tmux.send_line(&key(3), "python all_policies.py --seed 45").unwrap();

            assert_eq!(
                fs::read_to_string(log).unwrap(),
                "send-keys -t =match_3: python all_policies.py --seed 45 Enter\n"
            );
        }

        #[test]
        fn test_send_line_never_prefix_matches_other_sessions() {
            let dir = TempDir::new().unwrap();
            let (mut tmux, log) = fake_tmux(dir.path(), false);

            // Sending after a failed acquisition must still target match_1 exactly
            tmux.send_line(&key(1), "echo hi").unwrap();

            let calls = fs::read_to_string(log).unwrap();
            let args: Vec<&str> = calls.trim_end().split(' ').collect();
            assert_eq!(&args[..3], &["send-keys", "-t", "=match_1:"]);
        }
    }
}
