//! Deterministic expansion of a `SweepPlan` into submissions
//!
//! Order is session-major, then seed offset, then the provider sub-sweep
//! followed by the patient sub-sweep. The patient sub-sweep starts from the
//! reset provider count, so with the default plan its first configuration
//! repeats the first configuration of the provider sub-sweep. The repeat is
//! kept: downstream tooling has always seen it.

use serde::{Deserialize, Serialize};

use crate::model::{ContextKey, ExperimentConfig, SessionIndex, SweepPlan};

/// Which inner loop produced a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubSweep {
    /// `n_providers` varies, `n_patients` held at the base value
    Providers,
    /// `n_patients` varies, `n_providers` reset to the base value
    Patients,
}

/// One unit of work for the dispatcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub context: ContextKey,
    pub session: SessionIndex,
    pub start_seed: u64,
    pub sub_sweep: SubSweep,
    pub config: ExperimentConfig,
}

/// Expand the plan into submissions in dispatch order.
///
/// The plan is not validated here; callers that take plans from outside
/// should run `SweepPlan::validate` first.
pub fn enumerate(plan: &SweepPlan) -> Vec<Submission> {
    let mut submissions = Vec::with_capacity(plan.total_submissions());

    for &session in &plan.sessions {
        let session = SessionIndex(session);
        let context = plan.context_key(session);

        for &start_seed in &plan.start_seeds {
            let seed = u64::from(session.0).saturating_add(start_seed);

            for &n_providers in &plan.provider_sweep {
                submissions.push(Submission {
                    context: context.clone(),
                    session,
                    start_seed,
                    sub_sweep: SubSweep::Providers,
                    config: configuration(plan, seed, plan.base_patients, n_providers),
                });
            }

            for &n_patients in &plan.patient_sweep {
                submissions.push(Submission {
                    context: context.clone(),
                    session,
                    start_seed,
                    sub_sweep: SubSweep::Patients,
                    config: configuration(plan, seed, n_patients, plan.base_providers),
                });
            }
        }
    }

    submissions
}

fn configuration(plan: &SweepPlan, seed: u64, n_patients: u32, n_providers: u32) -> ExperimentConfig {
    let fixed = &plan.fixed;
    ExperimentConfig {
        seed,
        n_patients,
        n_providers,
        provider_capacity: fixed.provider_capacity,
        top_choice_prob: plan.choice_prob,
        true_top_choice_prob: plan.choice_prob,
        choice_model: fixed.choice_model.clone(),
        exit_option: fixed.exit_option,
        out_folder: fixed.out_folder.clone(),
        context_dim: fixed.context_dim,
        n_trials: fixed.n_trials,
        utility_function: plan.utility_function.clone(),
    }
}

/// Distinct configurations in first-seen order, each with the context that
/// first received it
pub fn distinct_configurations(submissions: &[Submission]) -> Vec<&Submission> {
    let mut distinct: Vec<&Submission> = Vec::new();
    for submission in submissions {
        if !distinct.iter().any(|d| d.config == submission.config) {
            distinct.push(submission);
        }
    }
    distinct
}

/// Number of submissions that repeat an earlier configuration
pub fn duplicate_count(submissions: &[Submission]) -> usize {
    submissions.len() - distinct_configurations(submissions).len()
}

/// Context keys in the order they are first referenced
pub fn referenced_contexts(submissions: &[Submission]) -> Vec<ContextKey> {
    let mut keys: Vec<ContextKey> = Vec::new();
    for submission in submissions {
        if !keys.contains(&submission.context) {
            keys.push(submission.context.clone());
        }
    }
    keys
}
