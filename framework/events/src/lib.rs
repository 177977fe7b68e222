mod event;
mod signatures;
mod sink;

pub mod prelude {
    pub use crate::event::{
        new_event_id, EventId, ExecutionEvent, ExecutionPhase, FaultEvent, Severity,
    };
    pub use crate::signatures::{
        default_fault_signatures, FaultKind, FaultSignature, PatternMatcher,
    };
    pub use crate::sink::{EventSink, InMemoryEventSink, LogEventSink};
}
