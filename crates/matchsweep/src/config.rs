//! Loading the sweep plan from YAML
//!
//! Lookup order:
//! 1. `--config <path>` (must exist)
//! 2. `{data_dir}/sweep.yaml` when present
//! 3. the built-in plan
//!
//! Every field is optional in the file; anything left out keeps its built-in
//! value, so a file containing only `launcher: {environment: py311}` is
//! valid.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use matchsweep_core::{PlanError, SweepPlan};

/// Name of the plan file looked up in the data directory
pub const PLAN_FILE_NAME: &str = "sweep.yaml";

/// Error types for loading the plan
#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Invalid(PlanError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "IO error: {msg}"),
            ConfigError::Parse(msg) => write!(f, "Parse error: {msg}"),
            ConfigError::Invalid(e) => write!(f, "Invalid sweep plan: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Invalid(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PlanError> for ConfigError {
    fn from(err: PlanError) -> Self {
        ConfigError::Invalid(err)
    }
}

/// Where the active plan came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanSource {
    BuiltIn,
    File(PathBuf),
}

impl fmt::Display for PlanSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanSource::BuiltIn => write!(f, "built-in plan"),
            PlanSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Resolve, parse and validate the plan.
pub fn load_plan(
    explicit: Option<&Path>,
    data_dir: &Path,
) -> Result<(SweepPlan, PlanSource), ConfigError> {
    let (plan, source) = match explicit {
        Some(path) => (read_plan_file(path)?, PlanSource::File(path.to_path_buf())),
        None => {
            let default_path = data_dir.join(PLAN_FILE_NAME);
            if default_path.exists() {
                (read_plan_file(&default_path)?, PlanSource::File(default_path))
            } else {
                (SweepPlan::default(), PlanSource::BuiltIn)
            }
        }
    };

    plan.validate()?;
    tracing::debug!(source = %source, submissions = plan.total_submissions(), "Sweep plan loaded");
    Ok((plan, source))
}

fn read_plan_file(path: &Path) -> Result<SweepPlan, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(format!("Failed to read {}: {}", path.display(), e))
    })?;
    parse_plan(&content)
        .map_err(|e| ConfigError::Parse(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Parse plan YAML; an empty document yields the built-in plan.
pub fn parse_plan(content: &str) -> Result<SweepPlan, serde_saphyr::Error> {
    if content.trim().is_empty() {
        return Ok(SweepPlan::default());
    }
    serde_saphyr::from_str(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_plan_without_file() {
        let dir = TempDir::new().unwrap();
        let (plan, source) = load_plan(None, dir.path()).unwrap();

        assert_eq!(source, PlanSource::BuiltIn);
        assert_eq!(plan, SweepPlan::default());
    }

    #[test]
    fn test_partial_file_in_data_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(PLAN_FILE_NAME);
        fs::write(
            &path,
            "sessions: [1, 2]\nlauncher:\n  environment: patient-gpu\nfixed:\n  n_trials: 10\n",
        )
        .unwrap();

        let (plan, source) = load_plan(None, dir.path()).unwrap();

        assert_eq!(source, PlanSource::File(path));
        assert_eq!(plan.sessions, vec![1, 2]);
        assert_eq!(plan.launcher.environment, "patient-gpu");
        assert_eq!(plan.launcher.script, "all_policies.py");
        assert_eq!(plan.fixed.n_trials, 10);
        assert_eq!(plan.fixed.out_folder, "small");
        assert_eq!(plan.start_seeds, vec![42, 45, 48, 51, 54]);
        assert_eq!(plan.total_submissions(), 80);
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.yaml");

        let err = load_plan(Some(&missing), dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_invalid_plan_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yaml");
        fs::write(&path, "choice_prob: 2.0\n").unwrap();

        let err = load_plan(Some(&path), dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(PlanError::ProbabilityOutOfRange { .. })));
    }

    #[test]
    fn test_malformed_yaml_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "sessions: [1, 2\n").unwrap();

        let err = load_plan(Some(&path), dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_empty_file_is_builtin_plan() {
        assert_eq!(parse_plan("  \n").unwrap(), SweepPlan::default());
    }

    #[test]
    fn test_default_plan_round_trips_through_yaml() {
        let yaml = serde_saphyr::to_string(&SweepPlan::default()).unwrap();
        assert_eq!(parse_plan(&yaml).unwrap(), SweepPlan::default());
    }
}
