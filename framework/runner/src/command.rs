use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

/// Token a timeseries write command carries where its own start timestamp must be inserted.
pub const SET_WRITE_TIMESTAMP: &str = "SET_WRITE_TIMESTAMP";
/// Token a timeseries read command carries where the write run's timestamp must be inserted.
pub const GET_WRITE_TIMESTAMP: &str = "GET_WRITE_TIMESTAMP";

static MODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-mode=(\S+)").expect("mode marker regex must compile"));
static WORKLOAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-workload=(\S+)").expect("workload marker regex must compile"));
static RETRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-retry-number[= ]+(\d+)").expect("retry regex must compile"));

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("no -mode=<value> option found in command `{0}`")]
    MissingMode(String),
    #[error("no -workload=<value> option found in command `{0}`")]
    MissingWorkload(String),
    #[error("unknown mode `{0}`")]
    UnknownMode(String),
    #[error("unknown workload `{0}`")]
    UnknownWorkload(String),
}

/// The operation pattern of a run, from the command's `-mode=` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Write,
    Read,
    CounterUpdate,
    CounterRead,
    Scan,
}

impl FromStr for Mode {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "write" => Ok(Mode::Write),
            "read" => Ok(Mode::Read),
            "counter_update" => Ok(Mode::CounterUpdate),
            "counter_read" => Ok(Mode::CounterRead),
            "scan" => Ok(Mode::Scan),
            other => Err(CommandError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Write => "write",
            Mode::Read => "read",
            Mode::CounterUpdate => "counter_update",
            Mode::CounterRead => "counter_read",
            Mode::Scan => "scan",
        };
        write!(f, "{s}")
    }
}

/// The access pattern of a run, from the command's `-workload=` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workload {
    Uniform,
    Timeseries,
    Sequential,
}

impl FromStr for Workload {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uniform" => Ok(Workload::Uniform),
            "timeseries" => Ok(Workload::Timeseries),
            "sequential" => Ok(Workload::Sequential),
            other => Err(CommandError::UnknownWorkload(other.to_string())),
        }
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Workload::Uniform => "uniform",
            Workload::Timeseries => "timeseries",
            Workload::Sequential => "sequential",
        };
        write!(f, "{s}")
    }
}

/// A validated scylla-bench command.
///
/// Mode and workload are resolved once, at construction, so a run can never start with
/// ambiguous semantics. Construction also injects credentials and the row-level error limit the
/// command must always carry.
#[derive(Debug, Clone)]
pub struct BenchCommand {
    text: String,
    mode: Mode,
    workload: Workload,
}

impl BenchCommand {
    pub fn new(
        template: &str,
        credentials: Option<(&str, &str)>,
    ) -> Result<Self, CommandError> {
        let mut text = template.trim().to_string();

        if let Some((username, password)) = credentials {
            if !text.contains("username=") {
                text.push_str(&format!(" -username {username} -password {password}"));
            }
        }

        if !text.contains("-error-at-row-limit") && !text.contains("-error-limit") {
            let retries = RETRY_RE
                .captures(&text)
                .and_then(|captures| captures[1].parse::<u32>().ok());
            if !matches!(retries, Some(n) if n > 1) {
                // Make the run fail once this many row-level errors accumulate.
                text.push_str(" -error-at-row-limit 1000");
            }
        }

        let mode = MODE_RE
            .captures(&text)
            .ok_or_else(|| CommandError::MissingMode(text.clone()))?[1]
            .parse()?;
        let workload = WORKLOAD_RE
            .captures(&text)
            .ok_or_else(|| CommandError::MissingWorkload(text.clone()))?[1]
            .parse()?;

        Ok(Self {
            text,
            mode,
            workload,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn workload(&self) -> Workload {
        self.workload
    }
}

/// Insert the target node addresses, or the secure connection bundle path, into a command.
///
/// This is the last templating step before execution.
pub fn finalize_command(text: &str, nodes: &[String], bundle_path: Option<&str>) -> String {
    match bundle_path {
        Some(path) => format!("{} -cloud-config-path={}", text.trim(), path),
        None => format!("{} -nodes {}", text.trim(), nodes.join(",")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BASE: &str = "scylla-bench -workload=sequential -mode=write -partition-count=100";

    #[test]
    fn error_limit_is_injected_by_default() {
        let command = BenchCommand::new(BASE, None).unwrap();
        assert!(command.text().ends_with("-error-at-row-limit 1000"));
    }

    #[test]
    fn explicit_error_limit_is_left_alone() {
        for preset in ["-error-at-row-limit 5", "-error-limit 5"] {
            let command = BenchCommand::new(&format!("{BASE} {preset}"), None).unwrap();
            assert!(!command.text().contains("-error-at-row-limit 1000"));
        }
    }

    #[test]
    fn enough_retries_suppress_the_error_limit() {
        let command = BenchCommand::new(&format!("{BASE} -retry-number=3"), None).unwrap();
        assert!(!command.text().contains("-error-at-row-limit"));
    }

    #[test]
    fn a_single_retry_still_gets_the_error_limit() {
        let command = BenchCommand::new(&format!("{BASE} -retry-number=1"), None).unwrap();
        assert!(command.text().contains("-error-at-row-limit 1000"));
    }

    #[test]
    fn mode_and_workload_are_resolved_at_construction() {
        let command = BenchCommand::new(BASE, None).unwrap();
        assert_eq!(command.mode(), Mode::Write);
        assert_eq!(command.workload(), Workload::Sequential);
    }

    #[test]
    fn every_known_mode_and_workload_parses() {
        for (raw, mode) in [
            ("write", Mode::Write),
            ("read", Mode::Read),
            ("counter_update", Mode::CounterUpdate),
            ("counter_read", Mode::CounterRead),
            ("scan", Mode::Scan),
        ] {
            assert_eq!(raw.parse::<Mode>().unwrap(), mode);
        }
        for (raw, workload) in [
            ("uniform", Workload::Uniform),
            ("timeseries", Workload::Timeseries),
            ("sequential", Workload::Sequential),
        ] {
            assert_eq!(raw.parse::<Workload>().unwrap(), workload);
        }
    }

    #[test]
    fn out_of_set_values_fail_construction() {
        let err = BenchCommand::new("scylla-bench -workload=uniform -mode=upsert", None)
            .err()
            .unwrap();
        assert!(matches!(err, CommandError::UnknownMode(m) if m == "upsert"));

        let err = BenchCommand::new("scylla-bench -workload=zipfian -mode=read", None)
            .err()
            .unwrap();
        assert!(matches!(err, CommandError::UnknownWorkload(w) if w == "zipfian"));
    }

    #[test]
    fn missing_markers_fail_construction() {
        assert!(matches!(
            BenchCommand::new("scylla-bench -workload=uniform", None),
            Err(CommandError::MissingMode(_))
        ));
        assert!(matches!(
            BenchCommand::new("scylla-bench -mode=read", None),
            Err(CommandError::MissingWorkload(_))
        ));
    }

    #[test]
    fn credentials_are_appended_when_absent() {
        let command = BenchCommand::new(BASE, Some(("cassandra", "secret"))).unwrap();
        assert!(command.text().contains("-username cassandra -password secret"));

        let with_creds = format!("{BASE} -username=admin");
        let command = BenchCommand::new(&with_creds, Some(("cassandra", "secret"))).unwrap();
        assert!(!command.text().contains("-password secret"));
    }

    #[test]
    fn finalization_inserts_nodes_or_bundle() {
        let nodes = vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()];
        assert_eq!(
            finalize_command("scylla-bench -mode=read", &nodes, None),
            "scylla-bench -mode=read -nodes 10.0.0.1,10.0.0.2"
        );
        assert_eq!(
            finalize_command("scylla-bench -mode=read", &nodes, Some("/tmp/bundle.yaml")),
            "scylla-bench -mode=read -cloud-config-path=/tmp/bundle.yaml"
        );
    }
}
