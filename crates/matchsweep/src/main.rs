use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::eyre;
use serde_json::{Map, Value};

use matchsweep::manifest::{RunManifest, new_stamp};
use matchsweep::results::{aggregate_matching, prune, status};
use matchsweep::{RecordingMultiplexer, Tmux, dispatch, init_logging, load_plan};
use matchsweep_core::enumerate::{duplicate_count, referenced_contexts};
use matchsweep_core::results::parse_filter_pair;
use matchsweep_core::{SweepPlan, enumerate, render_command};

#[derive(Parser, Debug)]
#[command(name = "matchsweep")]
#[command(about = "Dispatch the patient/provider matching sweep into tmux sessions")]
struct Cli {
    /// Sweep plan YAML (default: <data-dir>/sweep.yaml, else the built-in plan)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory for logs and run manifests (default: ~/.matchsweep/)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit every configuration to its session (the default)
    Dispatch {
        /// Print the commands instead of sending them
        #[arg(long)]
        dry_run: bool,

        /// Use a dedicated tmux server socket (`tmux -L <name>`)
        #[arg(long)]
        tmux_socket: Option<String>,
    },
    /// Print the enumerated submissions without sending anything
    Plan {
        #[arg(long, value_enum, default_value_t = PlanFormat::Commands)]
        format: PlanFormat,
    },
    /// Report which configurations already have result files
    Status {
        #[command(flatten)]
        results: ResultsArgs,
    },
    /// Mean and standard deviation of result metrics
    Aggregate {
        #[command(flatten)]
        results: ResultsArgs,

        /// Parameter filter, repeatable (e.g. --param n_providers=3)
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, Value)>,

        /// Divide per-element metrics by this policy's (e.g. --baseline greedy)
        #[arg(long)]
        baseline: Option<String>,
    },
    /// Delete older result files that repeat a parameter set
    Prune {
        #[command(flatten)]
        results: ResultsArgs,

        /// List what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Args, Debug)]
struct ResultsArgs {
    /// Root of the results tree; `out_folder` is resolved under it
    #[arg(long, default_value = "results")]
    results_dir: PathBuf,

    /// File name prefix of result files
    #[arg(long, default_value = "all_policies")]
    result_name: String,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PlanFormat {
    /// `<context>\t<command>` per line
    Commands,
    /// Full submissions as YAML
    Yaml,
}

fn parse_param(arg: &str) -> Result<(String, Value), String> {
    parse_filter_pair(arg).ok_or_else(|| format!("expected key=value, got '{arg}'"))
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".matchsweep")
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);

    init_logging(&data_dir, &cli.log_level)?;

    let (plan, source) = load_plan(cli.config.as_deref(), &data_dir)?;
    tracing::info!(source = %source, "Using sweep plan");

    let command = cli.command.unwrap_or(Command::Dispatch {
        dry_run: false,
        tmux_socket: None,
    });

    match command {
        Command::Dispatch {
            dry_run,
            tmux_socket,
        } => run_dispatch(&plan, &source.to_string(), &data_dir, dry_run, tmux_socket)?,
        Command::Plan { format } => print_plan(&plan, format)?,
        Command::Status { results } => print_status(&plan, &results)?,
        Command::Aggregate {
            results,
            params,
            baseline,
        } => print_aggregate(&plan, &results, params, baseline.as_deref())?,
        Command::Prune { results, dry_run } => run_prune(&plan, &results, dry_run)?,
    }

    Ok(())
}

fn run_dispatch(
    plan: &SweepPlan,
    source: &str,
    data_dir: &Path,
    dry_run: bool,
    tmux_socket: Option<String>,
) -> color_eyre::Result<()> {
    let submissions = enumerate(plan);
    let started_at = jiff::Timestamp::now();

    if dry_run {
        let mut mux = RecordingMultiplexer::new();
        let report = dispatch(&mut mux, &plan.launcher, &submissions);
        for command in &report.commands {
            println!("{}\t{}", command.context, command.command);
        }
        println!(
            "dry run: {} commands for {} sessions, nothing sent",
            report.commands.len(),
            report.contexts.len()
        );
        return Ok(());
    }

    let mut mux = match tmux_socket {
        Some(socket) => Tmux::new().on_socket(socket),
        None => Tmux::new(),
    };
    let report = dispatch(&mut mux, &plan.launcher, &submissions);

    let sessions: Vec<String> = report.contexts.iter().map(|(key, _)| key.to_string()).collect();
    println!(
        "Submitted {} of {} commands to {} sessions ({})",
        report.delivered(),
        report.commands.len(),
        sessions.len(),
        sessions.join(", ")
    );
    for failure in &report.failures {
        eprintln!("warning: {}: {}", failure.context, failure.error);
    }

    // The sweep is already running; a lost manifest is not worth failing over
    let stamp = new_stamp();
    match RunManifest::new(started_at, source.to_string(), plan, &report).save(data_dir, &stamp) {
        Ok(path) => println!("Run manifest: {}", path.display()),
        Err(e) => tracing::warn!(error = %e, "Could not write run manifest"),
    }

    Ok(())
}

fn print_plan(plan: &SweepPlan, format: PlanFormat) -> color_eyre::Result<()> {
    let submissions = enumerate(plan);

    match format {
        PlanFormat::Commands => {
            for submission in &submissions {
                println!(
                    "{}\t{}",
                    submission.context,
                    render_command(&plan.launcher, &submission.config)
                );
            }
        }
        PlanFormat::Yaml => {
            let yaml = serde_saphyr::to_string(&submissions)
                .map_err(|e| eyre!("Failed to serialize plan: {e}"))?;
            print!("{yaml}");
        }
    }

    tracing::info!(
        submissions = submissions.len(),
        duplicates = duplicate_count(&submissions),
        contexts = referenced_contexts(&submissions).len(),
        "Plan printed"
    );
    Ok(())
}

fn print_status(plan: &SweepPlan, args: &ResultsArgs) -> color_eyre::Result<()> {
    let submissions = enumerate(plan);
    let report = status(&submissions, &args.results_dir, &args.result_name)?;

    println!(
        "{} of {} configurations have results",
        report.found(),
        report.entries.len()
    );
    for entry in report.missing() {
        println!(
            "missing\t{}\t{}\t{}",
            entry.submission.context,
            entry.submission.config.label(),
            entry.expected.display()
        );
    }
    Ok(())
}

fn print_aggregate(
    plan: &SweepPlan,
    args: &ResultsArgs,
    params: Vec<(String, Value)>,
    baseline: Option<&str>,
) -> color_eyre::Result<()> {
    let folder = args.results_dir.join(&plan.fixed.out_folder);
    let filter: Map<String, Value> = params.into_iter().collect();
    let (count, summary) = aggregate_matching(&folder, &args.result_name, &filter, baseline)?;

    println!("{count} matching result files in {}", folder.display());
    if let Some(baseline) = baseline {
        println!("normalized by {baseline}");
    }
    for (metric, stats) in &summary {
        println!("{metric}\tmean={:.6}\tstd={:.6}\tn={}", stats.mean, stats.std, stats.count);
    }
    Ok(())
}

fn run_prune(plan: &SweepPlan, args: &ResultsArgs, dry_run: bool) -> color_eyre::Result<()> {
    let folder = args.results_dir.join(&plan.fixed.out_folder);
    let report = prune(&folder, &args.result_name, dry_run)?;

    let verb = if dry_run { "would remove" } else { "removed" };
    for path in &report.removed {
        println!("{verb}\t{}", path.display());
    }
    println!(
        "{} parameter sets kept, {} files {verb}",
        report.kept.len(),
        report.removed.len()
    );
    Ok(())
}
