use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use squall_events::prelude::{
    new_event_id, EventSink, ExecutionEvent, PatternMatcher, Severity,
};
use squall_summary::prelude::{aggregate_results, ResultSummary};

use crate::command::{
    finalize_command, BenchCommand, Mode, Workload, GET_WRITE_TIMESTAMP, SET_WRITE_TIMESTAMP,
};
use crate::handoff::{WriteTimestamp, HANDOFF_STEP, HANDOFF_TIMEOUT};
use crate::monitor::LiveLogMonitor;
use crate::target::{ConnectionBundle, ExecutionTarget, RunOutput};
use crate::types::SquallResult;

/// A server-side RPC timeout is transient: it is reported but never escalated to critical,
/// whatever the stop-on-failure policy says.
pub const REMOTE_TIMEOUT_SIGNATURE: &str = "truncate: seastar::rpc::timeout_error";

/// Immutable description of one benchmark execution.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub command: BenchCommand,
    pub loader_idx: usize,
    /// Reserved for targets that pin the benchmark to a CPU set.
    pub cpu_idx: usize,
    pub timeout: Duration,
    pub nodes: Vec<String>,
    pub connection_bundle: Option<ConnectionBundle>,
    pub log_dir: PathBuf,
    /// Escalate an execution failure to critical so the wider test stops.
    pub stop_on_failure: bool,
}

/// What one supervised run produced. `output` is `None` when the execution failed; the failure
/// itself was already published as an execution event.
#[derive(Debug)]
pub struct RunOutcome {
    pub node: String,
    pub output: Option<RunOutput>,
}

/// Supervises one benchmark execution from command resolution to outcome classification.
///
/// The timeseries handoff, the live log monitor and the execution events are all sequenced
/// here: the monitor starts strictly before the command and stops strictly after it, and
/// exactly one begin/end event pair is published per run whatever the outcome.
pub struct RunSupervisor {
    request: RunRequest,
    write_timestamp: Arc<WriteTimestamp>,
    matcher: Arc<PatternMatcher>,
    sink: Arc<dyn EventSink>,
    handoff_step: Duration,
    handoff_timeout: Duration,
}

impl RunSupervisor {
    pub fn new(
        request: RunRequest,
        write_timestamp: Arc<WriteTimestamp>,
        matcher: Arc<PatternMatcher>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            request,
            write_timestamp,
            matcher,
            sink,
            handoff_step: HANDOFF_STEP,
            handoff_timeout: HANDOFF_TIMEOUT,
        }
    }

    /// Override the timeseries handoff budget. Mostly useful in tests, where the default
    /// 30 second wait is far too slow.
    pub fn with_handoff_budget(mut self, step: Duration, timeout: Duration) -> Self {
        self.handoff_step = step;
        self.handoff_timeout = timeout;
        self
    }

    /// Execute the run against `target`.
    ///
    /// Coordination failures (the timeseries handoff timing out) propagate as errors before
    /// the benchmark process is ever invoked. Execution failures do not: they are classified,
    /// published on the end event and reflected as an outcome with no output, so a batch of
    /// parallel runs completes independently of one another's failures.
    pub fn run(&self, target: &dyn ExecutionTarget) -> SquallResult<RunOutcome> {
        log::debug!(
            "Supervising {} {} run for loader {}",
            self.request.command.mode(),
            self.request.command.workload(),
            self.request.loader_idx,
        );

        let resolved = self.resolve_handoff()?;

        if let Some(bundle) = &self.request.connection_bundle {
            target
                .send_file(&bundle.local, &bundle.remote)
                .context("Failed to upload connection bundle")?;
        }

        let final_cmd = finalize_command(
            &resolved,
            &self.request.nodes,
            self.request
                .connection_bundle
                .as_ref()
                .map(|bundle| bundle.remote.as_str()),
        );

        std::fs::create_dir_all(&self.request.log_dir).with_context(|| {
            format!("Failed to create log dir {}", self.request.log_dir.display())
        })?;
        let log_file = self.request.log_dir.join(format!(
            "scylla-bench-l{}-{}.log",
            self.request.loader_idx,
            nanoid::nanoid!()
        ));

        let node = target.node_name();
        let begin = ExecutionEvent::begin(new_event_id(), &node, &final_cmd, log_file.clone());
        self.sink.publish_execution(begin.clone());

        let monitor = LiveLogMonitor::start(
            log_file.clone(),
            node.clone(),
            Some(begin.event_id.clone()),
            self.matcher.clone(),
            self.sink.clone(),
        )?;

        let result = target.run(&final_cmd, self.request.timeout, &log_file);

        monitor.stop();
        monitor.join();

        let (severity, errors, output) = match result {
            Ok(output) => (Severity::Normal, Vec::new(), Some(output)),
            Err(e) => {
                let errors_str = format!("{e:#}");
                let severity = if errors_str.contains(REMOTE_TIMEOUT_SIGNATURE) {
                    Severity::Error
                } else if self.request.stop_on_failure {
                    Severity::Critical
                } else {
                    Severity::Error
                };
                log::error!("Run on node {node} failed: {errors_str}");
                (severity, vec![errors_str], None)
            }
        };

        self.sink
            .publish_execution(ExecutionEvent::end(&begin, severity, errors));

        Ok(RunOutcome { node, output })
    }

    /// Resolve the timeseries cross-run timestamp handoff, yielding the command text to
    /// finalize. Commands outside the timeseries write/read pair pass through untouched.
    fn resolve_handoff(&self) -> SquallResult<String> {
        let command = &self.request.command;
        match (command.mode(), command.workload()) {
            (Mode::Write, Workload::Timeseries) => {
                let nanos = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .expect("System clock is before the Unix epoch")
                    .as_nanos() as u64;
                self.write_timestamp.publish(nanos);
                log::debug!("Set start-time: {nanos}");
                Ok(command.text().replace(SET_WRITE_TIMESTAMP, &nanos.to_string()))
            }
            (Mode::Read, Workload::Timeseries) => {
                let nanos = self
                    .write_timestamp
                    .wait(self.handoff_step, self.handoff_timeout)?;
                log::debug!("Found write timestamp {nanos}");
                Ok(command.text().replace(GET_WRITE_TIMESTAMP, &nanos.to_string()))
            }
            _ => Ok(command.text().to_string()),
        }
    }
}

/// Aggregate the summaries of a batch of supervised runs. See
/// [squall_summary::prelude::aggregate_results] for the skipping rules.
pub fn verify_results(outcomes: &[RunOutcome]) -> (Vec<ResultSummary>, Vec<String>) {
    let outputs: Vec<Option<String>> = outcomes
        .iter()
        .map(|outcome| outcome.output.as_ref().map(RunOutput::combined))
        .collect();
    aggregate_results(outputs.iter().map(Option::as_deref))
}
