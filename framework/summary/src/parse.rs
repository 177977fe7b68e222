use itertools::Itertools;

use crate::model::{MetricValue, ResultSummary};

/// Rename table from raw scylla-bench report labels to normalized metric names.
///
/// Report labels missing from this table are logged and dropped; the report format is allowed
/// to evolve with the tool.
const STATS_MAPPING: &[(&str, &str)] = &[
    ("Mode", "Mode"),
    ("Workload", "Workload"),
    ("Timeout", "Timeout"),
    ("Consistency level", "Consistency level"),
    ("Partition count", "Partition count"),
    ("Clustering rows", "Clustering rows"),
    ("Page size", "Page size"),
    ("Concurrency", "Concurrency"),
    ("Connections", "Connections"),
    ("Maximum rate", "Maximum rate"),
    ("Client compression", "Client compression"),
    ("Clustering row size", "Clustering row size"),
    ("Rows per request", "Rows per request"),
    ("Total rows", "Total rows"),
    ("max", "latency max"),
    ("99.9th", "latency 99.9th percentile"),
    ("99th", "latency 99th percentile"),
    ("95th", "latency 95th percentile"),
    ("90th", "90th"),
    ("median", "latency median"),
    ("Operations/s", "op rate"),
    ("Rows/s", "row rate"),
    ("Total ops", "Total partitions"),
    ("Total errors", "Total errors"),
    ("Time (avg)", "Total operation time"),
];

/// Parse the benchmark's final colon-delimited report into a [ResultSummary].
///
/// Pure and infallible: a malformed or empty report yields a summary with only default keys.
/// Everything after a `c-o fixed latency` marker is an unrelated latency breakdown and is
/// ignored so its similarly labelled percentiles cannot clobber the real ones.
pub fn parse_report<'a>(lines: impl IntoIterator<Item = &'a str>) -> ResultSummary {
    let mut summary = ResultSummary::default();

    for line in lines {
        let line = line.trim();
        if line.starts_with("Results") {
            continue;
        }
        if line.contains("c-o fixed latency") {
            break;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.split_whitespace().join(" ");

        let Some(target_key) = STATS_MAPPING
            .iter()
            .find(|(raw, _)| *raw == key)
            .map(|(_, target)| *target)
        else {
            log::debug!("unknown result key found: `{key}` with value `{value}`");
            continue;
        };

        summary.set(target_key, normalize_value(&value));
    }

    // scylla-bench writes one row per partition for this workload shape, so the rates coincide.
    if let Some(row_rate) = summary.get("row rate").cloned() {
        summary.set("partition rate", row_rate);
    }

    summary
}

fn normalize_value(value: &str) -> MetricValue {
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(count) = value.parse::<i64>() {
            return MetricValue::Count(count);
        }
    }
    match convert_metric_to_ms(value) {
        Some(millis) => MetricValue::Millis(millis),
        None => MetricValue::Text(value.to_string()),
    }
}

/// Normalize a metric value with a duration unit to milliseconds.
///
/// Accepts bare numbers (already in milliseconds) and Go duration strings as printed by
/// scylla-bench, including multi-segment ones such as `1m40s`.
pub fn convert_metric_to_ms(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(number) = value.parse::<f64>() {
        return Some(number);
    }

    let mut rest = value;
    let mut total_ms = 0.0;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .filter(|len| *len > 0)?;
        let number: f64 = rest[..number_len].parse().ok()?;
        let with_unit = &rest[number_len..];

        let (ms, unit_len) = if with_unit.starts_with("ns") {
            (number / 1_000_000.0, 2)
        } else if with_unit.starts_with("µs") {
            (number / 1_000.0, "µs".len())
        } else if with_unit.starts_with("us") {
            (number / 1_000.0, 2)
        } else if with_unit.starts_with("ms") {
            (number, 2)
        } else if with_unit.starts_with('s') {
            (number * 1_000.0, 1)
        } else if with_unit.starts_with('m') {
            (number * 60_000.0, 1)
        } else if with_unit.starts_with('h') {
            (number * 3_600_000.0, 1)
        } else {
            return None;
        };

        total_ms += ms;
        rest = &with_unit[unit_len..];
    }

    Some(total_ms)
}
