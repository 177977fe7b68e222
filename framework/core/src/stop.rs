use tokio::sync::broadcast::{error::TryRecvError, Receiver, Sender};

/// Stop signal for background workers such as the live log monitor.
///
/// Cloning the handle shares the same signal, so any clone can stop every listener that was
/// created from any other clone.
#[derive(Debug, Clone)]
pub struct StopHandle {
    sender: Sender<()>,
}

impl Default for StopHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl StopHandle {
    pub fn new() -> Self {
        Self {
            sender: tokio::sync::broadcast::channel(1).0,
        }
    }

    /// Signal every listener to stop.
    pub fn stop(&self) {
        if let Err(e) = self.sender.send(()) {
            // Will fail if nobody is listening for the stop signal, in which case the log message
            // can be ignored.
            log::debug!("Failed to send stop signal: {e:?}");
        }
    }

    pub fn listener(&self) -> StopListener {
        StopListener {
            receiver: self.sender.subscribe(),
        }
    }
}

/// The receiving side of a [StopHandle].
///
/// Intended to be polled from a worker loop. Checking does not require an async runtime, so a
/// listener can be moved onto a plain thread.
#[derive(Debug)]
pub struct StopListener {
    receiver: Receiver<()>,
}

impl StopListener {
    /// Point in time check whether the stop signal has been received.
    ///
    /// Once this returns true the worker should wind down; the signal is not re-armed.
    pub fn should_stop(&mut self) -> bool {
        match self.receiver.try_recv() {
            Ok(_) => true,
            // All senders dropped, nobody is left to ask us to keep running.
            Err(TryRecvError::Closed) => true,
            Err(_) => false,
        }
    }

    /// Wait until the stop signal is received.
    ///
    /// The async form of [StopListener::should_stop], safe to race against other futures so the
    /// signal can cancel work in progress. Resolves immediately if every handle was dropped.
    pub async fn wait_for_stop(&mut self) {
        match self.receiver.recv().await {
            Ok(_) => {}
            Err(e) => {
                log::debug!("Stop channel closed while waiting: {e:?}");
            }
        }
    }
}
