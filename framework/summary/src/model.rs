use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single parsed statistic.
///
/// Counts stay integral, durations are normalized to milliseconds and configuration echoes from
/// the report header (mode, consistency level, ...) are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(i64),
    Millis(f64),
    Text(String),
}

impl MetricValue {
    pub fn as_count(&self) -> Option<i64> {
        match self {
            MetricValue::Count(count) => Some(*count),
            _ => None,
        }
    }

    pub fn as_millis(&self) -> Option<f64> {
        match self {
            MetricValue::Millis(millis) => Some(*millis),
            _ => None,
        }
    }
}

/// Normalized per-run summary of the benchmark's final report.
///
/// Always carries the full default key set, so downstream consumers can rely on key presence
/// even when a run emitted partial data; a key a run did not report maps to `None`. Produced
/// once per successful run and not mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    metrics: BTreeMap<String, Option<MetricValue>>,
}

/// Keys that are always present, even when the run emitted no matching statistic.
const DEFAULT_KEYS: &[&str] = &[
    "keyspace_idx",
    "stdev gc time(ms)",
    "Total errors",
    "total gc count",
    "loader_idx",
    "total gc time (s)",
    "cpu_idx",
    "avg gc time(ms)",
    "latency mean",
];

impl Default for ResultSummary {
    fn default() -> Self {
        let mut metrics: BTreeMap<_, _> = DEFAULT_KEYS
            .iter()
            .map(|key| (key.to_string(), None))
            .collect();
        metrics.insert("total gc mb".to_string(), Some(MetricValue::Count(0)));
        Self { metrics }
    }
}

impl ResultSummary {
    pub fn get(&self, key: &str) -> Option<&MetricValue> {
        self.metrics.get(key).and_then(|value| value.as_ref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.metrics.contains_key(key)
    }

    pub(crate) fn set(&mut self, key: &str, value: MetricValue) {
        self.metrics.insert(key.to_string(), Some(value));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&MetricValue>)> {
        self.metrics
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_summary_has_the_full_key_set() {
        let summary = ResultSummary::default();

        for key in DEFAULT_KEYS {
            assert!(summary.contains_key(key), "missing default key `{key}`");
            assert_eq!(summary.get(key), None, "default key `{key}` should be unset");
        }
        assert_eq!(summary.get("total gc mb"), Some(&MetricValue::Count(0)));
    }

    #[test]
    fn summary_serializes_metrics_by_name() {
        let mut summary = ResultSummary::default();
        summary.set("op rate", MetricValue::Count(100));
        summary.set("latency max", MetricValue::Millis(5.25));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["metrics"]["op rate"], 100);
        assert_eq!(json["metrics"]["latency max"], 5.25);
        assert_eq!(json["metrics"]["latency mean"], serde_json::Value::Null);
    }
}
