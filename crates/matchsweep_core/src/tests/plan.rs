//! Tests for plan validation

use crate::error::PlanError;
use crate::model::SweepPlan;

#[test]
fn test_default_plan_is_valid() {
    assert_eq!(SweepPlan::default().validate(), Ok(()));
}

#[test]
fn test_context_keys() {
    let keys: Vec<String> = SweepPlan::default()
        .context_keys()
        .iter()
        .map(|k| k.to_string())
        .collect();
    assert_eq!(keys, vec!["match_1", "match_2", "match_3"]);
}

#[test]
fn test_empty_sessions_rejected() {
    let plan = SweepPlan {
        sessions: vec![],
        ..SweepPlan::default()
    };
    assert_eq!(plan.validate(), Err(PlanError::EmptyAxis("sessions")));
}

#[test]
fn test_one_empty_sub_sweep_is_allowed() {
    let plan = SweepPlan {
        patient_sweep: vec![],
        ..SweepPlan::default()
    };
    assert!(plan.validate().is_ok());
    assert_eq!(plan.total_submissions(), 60);

    let plan = SweepPlan {
        patient_sweep: vec![],
        provider_sweep: vec![],
        ..SweepPlan::default()
    };
    assert!(matches!(plan.validate(), Err(PlanError::EmptyAxis(_))));
}

#[test]
fn test_duplicate_session_rejected() {
    let plan = SweepPlan {
        sessions: vec![1, 2, 1],
        ..SweepPlan::default()
    };
    assert_eq!(plan.validate(), Err(PlanError::DuplicateSession(1)));
}

#[test]
fn test_zero_counts_rejected() {
    let plan = SweepPlan {
        provider_sweep: vec![2, 0],
        ..SweepPlan::default()
    };
    assert_eq!(
        plan.validate(),
        Err(PlanError::ZeroCount {
            field: "provider_sweep"
        })
    );
}

#[test]
fn test_probability_out_of_range_rejected() {
    let plan = SweepPlan {
        choice_prob: 1.5,
        ..SweepPlan::default()
    };
    assert!(matches!(
        plan.validate(),
        Err(PlanError::ProbabilityOutOfRange {
            field: "choice_prob",
            ..
        })
    ));
}

#[test]
fn test_shell_metacharacters_rejected() {
    let mut plan = SweepPlan::default();
    plan.fixed.out_folder = "small; rm -rf /".to_string();
    assert!(matches!(
        plan.validate(),
        Err(PlanError::UnsafeToken {
            field: "fixed.out_folder",
            ..
        })
    ));

    let mut plan = SweepPlan::default();
    plan.launcher.activate = "conda  activate".to_string();
    assert!(matches!(plan.validate(), Err(PlanError::UnsafeToken { .. })));

    let mut plan = SweepPlan::default();
    plan.launcher.environment = "$(whoami)".to_string();
    assert!(matches!(plan.validate(), Err(PlanError::UnsafeToken { .. })));
}

#[test]
fn test_seed_overflow_rejected() {
    let plan = SweepPlan {
        start_seeds: vec![u64::MAX],
        ..SweepPlan::default()
    };
    assert!(matches!(plan.validate(), Err(PlanError::SeedOverflow { session: 1, .. })));
}
