use parking_lot::Mutex;

use crate::event::{ExecutionEvent, FaultEvent, Severity};

/// Receives the events produced while supervising runs.
///
/// Implementations must tolerate being called from the supervising thread and from log monitor
/// threads at the same time.
pub trait EventSink: Send + Sync {
    fn publish_execution(&self, event: ExecutionEvent);
    fn publish_fault(&self, event: FaultEvent);
}

/// Default sink that forwards events to the log.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn publish_execution(&self, event: ExecutionEvent) {
        let message = format!(
            "{:?} execution event [{}] on node {}: cmd `{}`, log file {}",
            event.phase,
            event.event_id,
            event.node,
            event.stress_cmd,
            event.log_file.display(),
        );
        match event.severity {
            Severity::Normal => log::info!("{message}"),
            Severity::Error => log::error!("{message}; errors: {:?}", event.errors),
            Severity::Critical => log::error!("CRITICAL {message}; errors: {:?}", event.errors),
        }
    }

    fn publish_fault(&self, event: FaultEvent) {
        log::error!(
            "{:?} on node {} at line {}: {}",
            event.kind,
            event.node,
            event.line_number,
            event.line,
        );
    }
}

/// Keeps every published event in memory. Useful in tests and while developing a harness.
#[derive(Debug, Default)]
pub struct InMemoryEventSink {
    executions: Mutex<Vec<ExecutionEvent>>,
    faults: Mutex<Vec<FaultEvent>>,
}

impl InMemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn executions(&self) -> Vec<ExecutionEvent> {
        self.executions.lock().clone()
    }

    pub fn faults(&self) -> Vec<FaultEvent> {
        self.faults.lock().clone()
    }
}

impl EventSink for InMemoryEventSink {
    fn publish_execution(&self, event: ExecutionEvent) {
        self.executions.lock().push(event);
    }

    fn publish_fault(&self, event: FaultEvent) {
        self.faults.lock().push(event);
    }
}
