//! Result files written by the simulation
//!
//! Each run leaves one JSON document shaped like
//! `{"parameters": {...}, "<metric>": ..., ...}` under
//! `<results>/<out_folder>/<result_name>_<seed>[_<stamp>].json`.
//! This module knows the naming convention, how to match a document against
//! a parameter filter, and how to summarise metrics across seeds.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ResultError;

/// Timestamp plus short random token distinguishing repeated runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStamp {
    pub at: jiff::civil::DateTime,
    pub token: u16,
}

impl RunStamp {
    pub fn new(at: jiff::civil::DateTime, token: u16) -> Self {
        Self { at, token }
    }

    /// e.g. `October_19_2026_03_45_PM_a1b2`
    pub fn suffix(&self) -> String {
        format!("{}_{:04x}", self.at.strftime("%B_%d_%Y_%I_%M_%p"), self.token)
    }
}

/// Relative path of the result file for one seed.
pub fn save_path(out_folder: &str, result_name: &str, seed: u64, stamp: Option<&RunStamp>) -> PathBuf {
    let mut file_name = format!("{result_name}_{seed}");
    if let Some(stamp) = stamp {
        file_name.push('_');
        file_name.push_str(&stamp.suffix());
    }
    file_name.push_str(".json");
    Path::new(out_folder).join(file_name)
}

/// Whether a file name follows the `<result_name>*.json` convention
pub fn is_result_file(file_name: &str, result_name: &str) -> bool {
    file_name.starts_with(result_name) && file_name.ends_with(".json")
}

/// One parsed result document
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub parameters: Map<String, Value>,
    /// Every top-level field except `parameters`
    pub metrics: Map<String, Value>,
}

impl ResultRecord {
    pub fn from_json(text: &str) -> Result<Self, ResultError> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(mut fields) = value else {
            return Err(ResultError::MissingParameters);
        };
        let Some(Value::Object(parameters)) = fields.remove("parameters") else {
            return Err(ResultError::MissingParameters);
        };
        Ok(Self {
            parameters,
            metrics: fields,
        })
    }

    /// True when every key in `filter` is present with an equal value.
    pub fn matches(&self, filter: &Map<String, Value>) -> bool {
        filter.iter().all(|(key, expected)| {
            self.parameters
                .get(key)
                .is_some_and(|actual| values_equal(actual, expected))
        })
    }
}

/// JSON equality where `2` and `2.0` are the same number
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

/// Parse a `key=value` filter argument. The value is read as JSON when it
/// parses (numbers, booleans), otherwise kept as a string.
pub fn parse_filter_pair(arg: &str) -> Option<(String, Value)> {
    let (key, raw) = arg.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let raw = raw.trim();
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Some((key.to_string(), value))
}

/// Mean and population standard deviation of one metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSummary {
    pub mean: f64,
    pub std: f64,
    pub count: usize,
}

impl MetricSummary {
    fn from_samples(samples: &[f64]) -> Self {
        let count = samples.len();
        if count == 0 {
            return Self {
                mean: 0.0,
                std: 0.0,
                count,
            };
        }
        let n = count as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            std: variance.sqrt(),
            count,
        }
    }
}

/// Summarise every numeric metric across records.
///
/// Sample collection per field:
/// - a number contributes itself
/// - a list whose first element is a number contributes that element
/// - a list whose first element is a list contributes every number in it
///
/// Anything else is skipped.
pub fn aggregate(records: &[ResultRecord]) -> BTreeMap<String, MetricSummary> {
    let mut samples: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for record in records {
        for (key, value) in &record.metrics {
            let collected = collect_samples(value);
            if !collected.is_empty() {
                samples.entry(key.clone()).or_default().extend(collected);
            }
        }
    }

    samples
        .into_iter()
        .map(|(key, values)| (key, MetricSummary::from_samples(&values)))
        .collect()
}

/// Like [`aggregate`], after dividing each record's per-element metrics by
/// those of a baseline policy.
///
/// Keys are `<policy>_<type>`. For every list-of-lists metric whose type has
/// a `<baseline>_<type>` entry in the same record, elements are divided
/// pairwise and positions where the baseline is zero are dropped. Scalars,
/// metrics with no baseline of their type, and lists of a different length
/// than the baseline pass through unchanged.
pub fn aggregate_normalized(records: &[ResultRecord], baseline: &str) -> BTreeMap<String, MetricSummary> {
    let normalized: Vec<ResultRecord> = records
        .iter()
        .map(|record| normalize_record(record, baseline))
        .collect();
    aggregate(&normalized)
}

fn normalize_record(record: &ResultRecord, baseline: &str) -> ResultRecord {
    let mut divisors: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for (key, value) in &record.metrics {
        let Some(elements) = per_element(value) else {
            continue;
        };
        let kind = metric_type(key);
        if key.strip_suffix(kind).and_then(|p| p.strip_suffix('_')) == Some(baseline) {
            divisors.entry(kind).or_insert(elements);
        }
    }

    let mut metrics = record.metrics.clone();
    for (key, value) in metrics.iter_mut() {
        let Some(divisor) = divisors.get(metric_type(key)) else {
            continue;
        };
        let Some(elements) = per_element(value) else {
            continue;
        };
        if elements.len() != divisor.len() {
            continue;
        }
        let ratios: Vec<Value> = elements
            .iter()
            .zip(divisor)
            .filter(|(_, d)| **d != 0.0)
            .filter_map(|(x, d)| serde_json::Number::from_f64(x / d).map(Value::Number))
            .collect();
        *value = Value::Array(vec![Value::Array(ratios)]);
    }

    ResultRecord {
        parameters: record.parameters.clone(),
        metrics,
    }
}

/// Text after the last `_`, or the whole key
fn metric_type(key: &str) -> &str {
    key.rsplit_once('_').map_or(key, |(_, kind)| kind)
}

/// The inner list of a list-of-lists metric
fn per_element(value: &Value) -> Option<Vec<f64>> {
    let Value::Array(items) = value else {
        return None;
    };
    let Some(Value::Array(inner)) = items.first() else {
        return None;
    };
    Some(inner.iter().filter_map(Value::as_f64).collect())
}

fn collect_samples(value: &Value) -> Vec<f64> {
    match value {
        Value::Number(n) => n.as_f64().into_iter().collect(),
        Value::Array(items) => match items.first() {
            Some(Value::Number(n)) => n.as_f64().into_iter().collect(),
            Some(Value::Array(inner)) => inner.iter().filter_map(Value::as_f64).collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}
