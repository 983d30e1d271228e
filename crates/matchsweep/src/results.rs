//! Reading result folders after a sweep
//!
//! Simulation runs write `<results_dir>/<out_folder>/<result_name>*.json`.
//! Dispatch never looks at them; these helpers answer "which runs are
//! done?", "what did they measure?" and clean up re-runs that left several
//! files for the same parameters.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde_json::{Map, Value};

use matchsweep_core::enumerate::distinct_configurations;
use matchsweep_core::results::{aggregate, aggregate_normalized, is_result_file, save_path};
use matchsweep_core::{MetricSummary, ResultRecord, Submission};

#[derive(Debug)]
pub enum ResultsError {
    Io(String),
}

impl fmt::Display for ResultsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultsError::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ResultsError {}

/// A parsed result file
#[derive(Debug, Clone)]
pub struct ResultFile {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub record: ResultRecord,
}

/// Parse every `<result_name>*.json` in `folder`.
///
/// A missing folder yields no files. Files that cannot be read or parsed
/// are logged and skipped.
pub fn scan(folder: &Path, result_name: &str) -> Result<Vec<ResultFile>, ResultsError> {
    if !folder.exists() {
        tracing::debug!(folder = %folder.display(), "Results folder does not exist yet");
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(folder)
        .map_err(|e| ResultsError::Io(format!("Failed to list {}: {}", folder.display(), e)))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| ResultsError::Io(format!("Failed to list {}: {}", folder.display(), e)))?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !is_result_file(name, result_name) || !path.is_file() {
            continue;
        }

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not read result file");
                continue;
            }
        };
        let record = match ResultRecord::from_json(&text) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping unparsable result file");
                continue;
            }
        };
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);

        files.push(ResultFile {
            path,
            modified,
            record,
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// Result coverage of one distinct configuration
#[derive(Debug)]
pub struct StatusEntry<'a> {
    pub submission: &'a Submission,
    /// Number of result files whose parameters match
    pub matches: usize,
    /// Where an unstamped result for this seed would be written
    pub expected: PathBuf,
}

#[derive(Debug, Default)]
pub struct StatusReport<'a> {
    pub entries: Vec<StatusEntry<'a>>,
}

impl<'a> StatusReport<'a> {
    pub fn found(&self) -> usize {
        self.entries.iter().filter(|e| e.matches > 0).count()
    }

    pub fn missing(&self) -> impl Iterator<Item = &StatusEntry<'a>> {
        self.entries.iter().filter(|e| e.matches == 0)
    }
}

/// Check every distinct configuration for a matching result file.
pub fn status<'a>(
    submissions: &'a [Submission],
    results_dir: &Path,
    result_name: &str,
) -> Result<StatusReport<'a>, ResultsError> {
    let mut by_folder: HashMap<&str, Vec<ResultFile>> = HashMap::new();
    let mut report = StatusReport::default();

    for submission in distinct_configurations(submissions) {
        let config = &submission.config;
        let out_folder = config.out_folder.as_str();
        if !by_folder.contains_key(out_folder) {
            let files = scan(&results_dir.join(out_folder), result_name)?;
            by_folder.insert(out_folder, files);
        }
        let files = by_folder.get(out_folder).map(Vec::as_slice).unwrap_or_default();

        let filter = config.parameters();
        let matches = files.iter().filter(|f| f.record.matches(&filter)).count();

        report.entries.push(StatusEntry {
            submission,
            matches,
            expected: results_dir.join(save_path(out_folder, result_name, config.seed, None)),
        });
    }

    tracing::info!(
        configurations = report.entries.len(),
        found = report.found(),
        "Result status computed"
    );
    Ok(report)
}

/// Mean/std of every metric over the files in `folder` matching `filter`.
///
/// With a `baseline` policy, per-element metrics are first divided by that
/// policy's. Returns the number of matching files alongside the summaries.
pub fn aggregate_matching(
    folder: &Path,
    result_name: &str,
    filter: &Map<String, Value>,
    baseline: Option<&str>,
) -> Result<(usize, BTreeMap<String, MetricSummary>), ResultsError> {
    let records: Vec<ResultRecord> = scan(folder, result_name)?
        .into_iter()
        .filter(|f| f.record.matches(filter))
        .map(|f| f.record)
        .collect();
    let summary = match baseline {
        Some(baseline) => aggregate_normalized(&records, baseline),
        None => aggregate(&records),
    };
    Ok((records.len(), summary))
}

#[derive(Debug, Default)]
pub struct PruneReport {
    pub kept: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

/// Keep only the newest result file for each distinct parameter set.
///
/// With `dry_run` nothing is deleted; `removed` lists what would go.
pub fn prune(folder: &Path, result_name: &str, dry_run: bool) -> Result<PruneReport, ResultsError> {
    // serde_json maps are ordered, so the serialized form is a stable key
    let mut groups: BTreeMap<String, Vec<ResultFile>> = BTreeMap::new();
    for file in scan(folder, result_name)? {
        let parameters = Value::Object(file.record.parameters.clone());
        let key = numbers_as_floats(&parameters).to_string();
        groups.entry(key).or_default().push(file);
    }

    let mut report = PruneReport::default();
    for (_, mut files) in groups {
        files.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.path.cmp(&a.path)));
        let mut files = files.into_iter();
        if let Some(newest) = files.next() {
            report.kept.push(newest.path);
        }
        for stale in files {
            if !dry_run {
                fs::remove_file(&stale.path).map_err(|e| {
                    ResultsError::Io(format!("Failed to delete {}: {}", stale.path.display(), e))
                })?;
                tracing::info!(path = %stale.path.display(), "Removed duplicate result file");
            }
            report.removed.push(stale.path);
        }
    }

    Ok(report)
}

/// Rewrite every number as a float so `2` and `2.0` serialize alike
fn numbers_as_floats(value: &Value) -> Value {
    match value {
        Value::Number(n) => n
            .as_f64()
            .and_then(serde_json::Number::from_f64)
            .map_or_else(|| value.clone(), Value::Number),
        Value::Array(items) => Value::Array(items.iter().map(numbers_as_floats).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), numbers_as_floats(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}
