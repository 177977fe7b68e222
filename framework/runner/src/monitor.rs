use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::Context;
use squall_core::prelude::{StopHandle, StopListener};
use squall_events::prelude::{EventId, EventSink, FaultEvent, PatternMatcher};

/// How long to sleep while the log file does not exist yet.
const MISSING_FILE_POLL: Duration = Duration::from_millis(500);
/// How long to sleep at EOF before looking for newly appended lines.
const IDLE_POLL: Duration = Duration::from_millis(100);

/// Tails the growing log file of a supervised run and publishes a [FaultEvent] for every line
/// that matches a registered fault signature.
///
/// Runs on its own thread. The supervisor starts it before invoking the benchmark command and
/// stops it after the command returns, so no fault line written during the run window is
/// missed. A stop signal takes effect at the next poll or read boundary; lines appended after
/// that are not guaranteed to be observed.
pub struct LiveLogMonitor {
    stop: StopHandle,
    thread: Option<JoinHandle<()>>,
}

impl LiveLogMonitor {
    pub fn start(
        log_file: PathBuf,
        node: String,
        event_id: Option<EventId>,
        matcher: Arc<PatternMatcher>,
        sink: Arc<dyn EventSink>,
    ) -> anyhow::Result<Self> {
        let stop = StopHandle::new();
        let mut listener = stop.listener();
        let thread = std::thread::Builder::new()
            .name("log-monitor".to_string())
            .spawn(move || follow(&log_file, &node, event_id, &matcher, sink.as_ref(), &mut listener))
            .context("Failed to start log monitor thread")?;

        Ok(Self {
            stop,
            thread: Some(thread),
        })
    }

    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Wait for the monitor thread to wind down. Call after [LiveLogMonitor::stop].
    pub fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Log monitor thread panicked");
            }
        }
    }
}

fn follow(
    log_file: &Path,
    node: &str,
    event_id: Option<EventId>,
    matcher: &PatternMatcher,
    sink: &dyn EventSink,
    listener: &mut StopListener,
) {
    // The benchmark process is spawned concurrently, so the file may not exist yet.
    loop {
        if listener.should_stop() {
            return;
        }
        if log_file.exists() {
            break;
        }
        std::thread::sleep(MISSING_FILE_POLL);
    }

    let file = match File::open(log_file) {
        Ok(file) => file,
        Err(e) => {
            log::error!("Failed to open log file {}: {e}", log_file.display());
            return;
        }
    };
    let mut reader = BufReader::new(file);
    let mut line_number = 0usize;
    let mut buf = String::new();

    loop {
        if listener.should_stop() {
            return;
        }

        buf.clear();
        match reader.read_line(&mut buf) {
            Ok(0) => std::thread::sleep(IDLE_POLL),
            Ok(read) if !buf.ends_with('\n') => {
                // The writer is mid-line. Rewind and retry once the line is terminated.
                if let Err(e) = reader.seek(SeekFrom::Current(-(read as i64))) {
                    log::error!("Failed to rewind log file {}: {e}", log_file.display());
                    return;
                }
                std::thread::sleep(IDLE_POLL);
            }
            Ok(_) => {
                let line = buf.trim_end_matches(['\n', '\r']);
                for signature in matcher.matches(line) {
                    sink.publish_fault(FaultEvent {
                        kind: signature.kind,
                        node: node.to_string(),
                        line: line.to_string(),
                        line_number,
                        event_id: event_id.clone(),
                    });
                }
                line_number += 1;
            }
            Err(e) => {
                log::error!("Failed to read log file {}: {e}", log_file.display());
                return;
            }
        }
    }
}
