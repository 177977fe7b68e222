use std::path::PathBuf;

use serde::Serialize;

use crate::signatures::FaultKind;

/// Correlation id shared between a run's execution events and the fault events matched in its
/// log file.
pub type EventId = String;

pub fn new_event_id() -> EventId {
    nanoid::nanoid!()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// Nothing went wrong.
    Normal,
    /// The run failed but the wider test can carry on.
    Error,
    /// The run failed and the whole test should stop.
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExecutionPhase {
    Begin,
    End,
}

/// Marks the start or end of one supervised benchmark execution.
///
/// Exactly one `Begin` and one `End` event is emitted per run, whatever the outcome. The `End`
/// event carries the final severity and any captured error text.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionEvent {
    pub event_id: EventId,
    pub node: String,
    pub stress_cmd: String,
    pub log_file: PathBuf,
    pub phase: ExecutionPhase,
    pub severity: Severity,
    pub errors: Vec<String>,
}

impl ExecutionEvent {
    pub fn begin(
        event_id: EventId,
        node: impl Into<String>,
        stress_cmd: impl Into<String>,
        log_file: PathBuf,
    ) -> Self {
        Self {
            event_id,
            node: node.into(),
            stress_cmd: stress_cmd.into(),
            log_file,
            phase: ExecutionPhase::Begin,
            severity: Severity::Normal,
            errors: Vec::new(),
        }
    }

    pub fn end(begin: &ExecutionEvent, severity: Severity, errors: Vec<String>) -> Self {
        Self {
            phase: ExecutionPhase::End,
            severity,
            errors,
            ..begin.clone()
        }
    }
}

/// A line in a run's live log that matched a known fault signature.
///
/// `line_number` is 0-based within the tailed file. `event_id` joins the fault to the
/// [ExecutionEvent] of the run that produced the line, when the monitor was given one.
#[derive(Debug, Clone, Serialize)]
pub struct FaultEvent {
    pub kind: FaultKind,
    pub node: String,
    pub line: String,
    pub line_number: usize,
    pub event_id: Option<EventId>,
}
