mod command;
mod handoff;
mod monitor;
mod supervisor;
mod target;
mod types;

pub mod prelude {
    pub use crate::command::{
        finalize_command, BenchCommand, CommandError, Mode, Workload, GET_WRITE_TIMESTAMP,
        SET_WRITE_TIMESTAMP,
    };
    pub use crate::handoff::{WriteTimestamp, HANDOFF_STEP, HANDOFF_TIMEOUT};
    pub use crate::monitor::LiveLogMonitor;
    pub use crate::supervisor::{
        verify_results, RunOutcome, RunRequest, RunSupervisor, REMOTE_TIMEOUT_SIGNATURE,
    };
    pub use crate::target::{ConnectionBundle, ExecutionTarget, LocalTarget, RunOutput};
    pub use crate::types::SquallResult;
}
