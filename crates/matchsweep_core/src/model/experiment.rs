//! The configuration record handed to one simulation run

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Parameters for one invocation of the simulation script.
///
/// Built once per sweep iteration and never mutated afterwards. Field names
/// double as the command-line flag names (`--seed`, `--n_patients`, ...) and
/// as the keys of the `parameters` object the script writes into its result
/// file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub seed: u64,
    pub n_patients: u32,
    pub n_providers: u32,
    pub provider_capacity: u32,
    pub top_choice_prob: f64,
    pub true_top_choice_prob: f64,
    pub choice_model: String,
    pub exit_option: f64,
    pub out_folder: String,
    pub context_dim: u32,
    pub n_trials: u32,
    pub utility_function: String,
}

impl ExperimentConfig {
    /// Flag/value pairs in the order they appear on the command line
    pub fn flags(&self) -> Vec<(&'static str, String)> {
        vec![
            ("seed", self.seed.to_string()),
            ("n_patients", self.n_patients.to_string()),
            ("n_providers", self.n_providers.to_string()),
            ("provider_capacity", self.provider_capacity.to_string()),
            ("top_choice_prob", self.top_choice_prob.to_string()),
            ("true_top_choice_prob", self.true_top_choice_prob.to_string()),
            ("choice_model", self.choice_model.clone()),
            ("exit_option", self.exit_option.to_string()),
            ("out_folder", self.out_folder.clone()),
            ("context_dim", self.context_dim.to_string()),
            ("n_trials", self.n_trials.to_string()),
            ("utility_function", self.utility_function.clone()),
        ]
    }

    /// `--flag value` tokens, ready to append to an interpreter invocation
    pub fn to_args(&self) -> Vec<String> {
        self.flags()
            .into_iter()
            .flat_map(|(flag, value)| [format!("--{flag}"), value])
            .collect()
    }

    /// Parameter filter identifying this configuration's result file
    pub fn parameters(&self) -> Map<String, Value> {
        let value = json!({
            "seed": self.seed,
            "n_patients": self.n_patients,
            "n_providers": self.n_providers,
            "provider_capacity": self.provider_capacity,
            "top_choice_prob": self.top_choice_prob,
            "true_top_choice_prob": self.true_top_choice_prob,
            "choice_model": self.choice_model,
            "exit_option": self.exit_option,
            "out_folder": self.out_folder,
            "context_dim": self.context_dim,
            "n_trials": self.n_trials,
            "utility_function": self.utility_function,
        });
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    /// Short human label, e.g. `seed=43 patients=2 providers=4`
    pub fn label(&self) -> String {
        format!(
            "seed={} patients={} providers={}",
            self.seed, self.n_patients, self.n_providers
        )
    }
}
