//! The enumeration policy as data
//!
//! `SweepPlan::default()` reproduces the historical batch exactly: three
//! sessions, five seed offsets, a provider sub-sweep and a patient sub-sweep.
//! A YAML file can override any field; missing fields keep their defaults.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::ids::{ContextKey, DEFAULT_CONTEXT_PREFIX, SessionIndex};
use crate::error::PlanError;

/// Parameters that never vary across the sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedParameters {
    pub provider_capacity: u32,
    pub choice_model: String,
    pub exit_option: f64,
    pub out_folder: String,
    pub context_dim: u32,
    pub n_trials: u32,
}

impl Default for FixedParameters {
    fn default() -> Self {
        Self {
            provider_capacity: 1,
            choice_model: "uniform_choice".to_string(),
            exit_option: 0.5,
            out_folder: "small".to_string(),
            context_dim: 5,
            n_trials: 100,
        }
    }
}

/// How a configuration is turned into a shell line inside a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherSettings {
    /// Name of the isolated runtime environment
    pub environment: String,
    /// Command that activates `environment` (the name is appended)
    pub activate: String,
    pub interpreter: String,
    pub script: String,
    /// Directory to `cd` into before activating, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            environment: "patient".to_string(),
            activate: "conda activate".to_string(),
            interpreter: "python".to_string(),
            script: "all_policies.py".to_string(),
            working_dir: None,
        }
    }
}

/// Complete description of one sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepPlan {
    /// Outer loop; each session gets its own execution context
    pub sessions: Vec<u32>,
    /// Seed offsets; `seed = session + start_seed`
    pub start_seeds: Vec<u64>,
    /// Patient count held fixed during the provider sub-sweep
    pub base_patients: u32,
    /// Provider count held fixed during the patient sub-sweep
    pub base_providers: u32,
    pub provider_sweep: Vec<u32>,
    pub patient_sweep: Vec<u32>,
    /// Feeds both `top_choice_prob` and `true_top_choice_prob`
    pub choice_prob: f64,
    pub utility_function: String,
    pub fixed: FixedParameters,
    pub context_prefix: String,
    pub launcher: LauncherSettings,
}

impl Default for SweepPlan {
    fn default() -> Self {
        Self {
            sessions: vec![1, 2, 3],
            start_seeds: vec![42, 45, 48, 51, 54],
            base_patients: 2,
            base_providers: 2,
            provider_sweep: vec![2, 3, 4, 5],
            patient_sweep: vec![2, 3, 4, 5],
            choice_prob: 0.5,
            utility_function: "uniform".to_string(),
            fixed: FixedParameters::default(),
            context_prefix: DEFAULT_CONTEXT_PREFIX.to_string(),
            launcher: LauncherSettings::default(),
        }
    }
}

impl SweepPlan {
    /// Number of submissions the plan produces, duplicates included
    pub fn total_submissions(&self) -> usize {
        self.sessions.len()
            * self.start_seeds.len()
            * (self.provider_sweep.len() + self.patient_sweep.len())
    }

    /// Context key for a session under this plan's prefix
    pub fn context_key(&self, session: SessionIndex) -> ContextKey {
        ContextKey::for_session(&self.context_prefix, session)
    }

    /// Context keys in session order
    pub fn context_keys(&self) -> Vec<ContextKey> {
        self.sessions
            .iter()
            .map(|&s| self.context_key(SessionIndex(s)))
            .collect()
    }

    /// Check the plan before anything is enumerated or sent to a shell.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.sessions.is_empty() {
            return Err(PlanError::EmptyAxis("sessions"));
        }
        if self.start_seeds.is_empty() {
            return Err(PlanError::EmptyAxis("start_seeds"));
        }
        if self.provider_sweep.is_empty() && self.patient_sweep.is_empty() {
            return Err(PlanError::EmptyAxis("provider_sweep/patient_sweep"));
        }

        let mut seen = HashSet::new();
        for &session in &self.sessions {
            if !seen.insert(session) {
                return Err(PlanError::DuplicateSession(session));
            }
            for &start_seed in &self.start_seeds {
                if start_seed.checked_add(u64::from(session)).is_none() {
                    return Err(PlanError::SeedOverflow {
                        session,
                        start_seed,
                    });
                }
            }
        }

        check_positive("base_patients", self.base_patients)?;
        check_positive("base_providers", self.base_providers)?;
        for &n in &self.provider_sweep {
            check_positive("provider_sweep", n)?;
        }
        for &n in &self.patient_sweep {
            check_positive("patient_sweep", n)?;
        }
        check_positive("fixed.provider_capacity", self.fixed.provider_capacity)?;
        check_positive("fixed.context_dim", self.fixed.context_dim)?;
        check_positive("fixed.n_trials", self.fixed.n_trials)?;

        check_probability("choice_prob", self.choice_prob)?;
        check_probability("fixed.exit_option", self.fixed.exit_option)?;

        check_token("utility_function", &self.utility_function)?;
        check_token("fixed.choice_model", &self.fixed.choice_model)?;
        check_token("fixed.out_folder", &self.fixed.out_folder)?;
        check_token("context_prefix", &self.context_prefix)?;
        check_token("launcher.environment", &self.launcher.environment)?;
        check_token("launcher.interpreter", &self.launcher.interpreter)?;
        check_token("launcher.script", &self.launcher.script)?;
        check_words("launcher.activate", &self.launcher.activate)?;
        if let Some(dir) = &self.launcher.working_dir {
            check_token("launcher.working_dir", dir)?;
        }

        Ok(())
    }
}

fn check_positive(field: &'static str, value: u32) -> Result<(), PlanError> {
    if value == 0 {
        return Err(PlanError::ZeroCount { field });
    }
    Ok(())
}

fn check_probability(field: &'static str, value: f64) -> Result<(), PlanError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(PlanError::ProbabilityOutOfRange { field, value });
    }
    Ok(())
}

/// Characters that pass through `sh` unquoted without changing meaning
fn is_shell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '=' | '+' | ',' | '@' | '%' | '~')
}

fn check_token(field: &'static str, value: &str) -> Result<(), PlanError> {
    if value.is_empty() || !value.chars().all(is_shell_safe) {
        return Err(PlanError::UnsafeToken {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Like `check_token`, but single spaces between words are allowed
fn check_words(field: &'static str, value: &str) -> Result<(), PlanError> {
    if value.trim().is_empty() || value.split(' ').any(|w| w.is_empty() || !w.chars().all(is_shell_safe)) {
        return Err(PlanError::UnsafeToken {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}
