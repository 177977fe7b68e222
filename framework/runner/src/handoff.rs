use std::time::Duration;

use parking_lot::Mutex;
use squall_core::prelude::{wait_for, WaitTimeout};

/// How often a timeseries read run re-checks for the write run's timestamp.
pub const HANDOFF_STEP: Duration = Duration::from_secs(5);
/// How long a timeseries read run waits for the write run's timestamp before giving up.
pub const HANDOFF_TIMEOUT: Duration = Duration::from_secs(30);

/// The origin instant shared between the timeseries runs of one loader cluster.
///
/// The write run publishes its wall-clock start time in nanoseconds; concurrently started read
/// runs poll for it and align their own command to the same instant. Single-assignment: the
/// first publish wins and later ones are ignored.
#[derive(Debug, Default)]
pub struct WriteTimestamp {
    slot: Mutex<Option<u64>>,
}

impl WriteTimestamp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the write run's start timestamp. Returns false when a value was already
    /// published, in which case the existing value is kept.
    pub fn publish(&self, nanos: u64) -> bool {
        let mut slot = self.slot.lock();
        if let Some(existing) = *slot {
            log::warn!(
                "Write timestamp already published as {existing}, ignoring later value {nanos}"
            );
            return false;
        }
        *slot = Some(nanos);
        true
    }

    pub fn get(&self) -> Option<u64> {
        *self.slot.lock()
    }

    /// Poll until a timestamp is published or the budget runs out.
    pub fn wait(&self, step: Duration, timeout: Duration) -> Result<u64, WaitTimeout> {
        wait_for(
            || self.get(),
            step,
            timeout,
            "\"scylla-bench -workload=timeseries -mode=write\" to start and publish its timestamp",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn first_writer_wins() {
        let timestamp = WriteTimestamp::new();
        assert!(timestamp.publish(100));
        assert!(!timestamp.publish(200));
        assert_eq!(timestamp.get(), Some(100));
    }

    #[test]
    fn waiting_reader_gets_the_published_value() {
        let timestamp = Arc::new(WriteTimestamp::new());

        let writer = {
            let timestamp = timestamp.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(20));
                timestamp.publish(1_700_000_000_000_000_000);
            })
        };

        let value = timestamp
            .wait(Duration::from_millis(5), Duration::from_secs(1))
            .unwrap();
        assert_eq!(value, 1_700_000_000_000_000_000);
        writer.join().unwrap();
    }

    #[test]
    fn reader_times_out_when_nothing_is_published() {
        let timestamp = WriteTimestamp::new();
        let err = timestamp
            .wait(Duration::from_millis(1), Duration::from_millis(10))
            .unwrap_err();
        assert!(err.to_string().contains("timeseries"));
    }
}
