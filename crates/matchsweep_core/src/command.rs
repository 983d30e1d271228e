//! Rendering configurations into shell lines

use crate::model::{ExperimentConfig, LauncherSettings};

/// Build the single line typed into a session for one configuration.
///
/// The environment is activated on the same line so every job starts from a
/// known interpreter even if an earlier job changed it. Tokens are emitted
/// unquoted; `SweepPlan::validate` guarantees they need no quoting.
pub fn render_command(launcher: &LauncherSettings, config: &ExperimentConfig) -> String {
    let mut line = String::new();

    if let Some(dir) = &launcher.working_dir {
        line.push_str("cd ");
        line.push_str(dir);
        line.push_str("; ");
    }

    line.push_str(&launcher.activate);
    line.push(' ');
    line.push_str(&launcher.environment);
    line.push_str("; ");
    line.push_str(&launcher.interpreter);
    line.push(' ');
    line.push_str(&launcher.script);

    for arg in config.to_args() {
        line.push(' ');
        line.push_str(&arg);
    }

    line
}
