//! Record of a dispatch run
//!
//! Written to `{data_dir}/runs/run_<stamp>.yaml` after a real dispatch, so
//! the exact command lines typed into each session survive after the tmux
//! scrollback is gone.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use matchsweep_core::{RunStamp, SweepPlan};

use crate::dispatch::{DispatchReport, DispatchedCommand};
use crate::util::io::atomic_write;

/// Stamp for a run happening now
pub fn new_stamp() -> RunStamp {
    let now = jiff::Zoned::now();
    RunStamp::new(now.datetime(), rand::random::<u16>())
}

#[derive(Debug)]
pub enum ManifestError {
    Io(String),
    Serialize(String),
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestError::Io(msg) => write!(f, "IO error: {msg}"),
            ManifestError::Serialize(msg) => write!(f, "Serialization error: {msg}"),
        }
    }
}

impl std::error::Error for ManifestError {}

#[derive(Debug, Serialize)]
pub struct RunManifest<'a> {
    pub started_at: jiff::Timestamp,
    pub plan_source: String,
    pub plan: &'a SweepPlan,
    pub delivered: usize,
    pub failures: usize,
    pub commands: &'a [DispatchedCommand],
}

impl<'a> RunManifest<'a> {
    pub fn new(
        started_at: jiff::Timestamp,
        plan_source: String,
        plan: &'a SweepPlan,
        report: &'a DispatchReport,
    ) -> Self {
        Self {
            started_at,
            plan_source,
            plan,
            delivered: report.delivered(),
            failures: report.failures.len(),
            commands: &report.commands,
        }
    }

    /// Write under `{data_dir}/runs/` and return the file path.
    pub fn save(&self, data_dir: &Path, stamp: &RunStamp) -> Result<PathBuf, ManifestError> {
        let runs_dir = data_dir.join("runs");
        fs::create_dir_all(&runs_dir).map_err(|e| {
            ManifestError::Io(format!("Failed to create {}: {}", runs_dir.display(), e))
        })?;

        let yaml = serde_saphyr::to_string(self)
            .map_err(|e| ManifestError::Serialize(format!("Failed to serialize manifest: {e}")))?;

        let path = runs_dir.join(format!("run_{}.yaml", stamp.suffix()));
        atomic_write(&path, &yaml)
            .map_err(|e| ManifestError::Io(format!("Failed to write {}: {}", path.display(), e)))?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::dispatch;
    use crate::mux::RecordingMultiplexer;
    use matchsweep_core::enumerate;
    use tempfile::TempDir;

    #[test]
    fn test_manifest_written_under_runs() {
        let dir = TempDir::new().unwrap();
        let plan = SweepPlan::default();
        let submissions = enumerate(&plan);
        let mut mux = RecordingMultiplexer::new();
        let report = dispatch(&mut mux, &plan.launcher, &submissions);

        let stamp = RunStamp::new(jiff::civil::date(2026, 10, 19).at(9, 5, 0, 0), 0x1a2b);
        let manifest = RunManifest::new(
            jiff::Timestamp::UNIX_EPOCH,
            "built-in plan".to_string(),
            &plan,
            &report,
        );
        let path = manifest.save(dir.path(), &stamp).unwrap();

        assert_eq!(
            path,
            dir.path()
                .join("runs")
                .join("run_October_19_2026_09_05_AM_1a2b.yaml")
        );
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("delivered: 120"));
        assert!(text.contains("match_3"));
        assert!(text.contains("--utility_function uniform"));
    }

    #[test]
    fn test_new_stamp_suffix_shape() {
        let suffix = new_stamp().suffix();
        let token = suffix.rsplit('_').next().unwrap();

        assert_eq!(token.len(), 4);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(suffix.contains("_AM_") || suffix.contains("_PM_"));
    }
}
