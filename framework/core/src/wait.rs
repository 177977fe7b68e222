use std::time::{Duration, Instant};

/// A bounded polling wait ran out of budget before the probe produced a value.
#[derive(derive_more::Error, derive_more::Display, Debug)]
#[display("Timed out after {timeout:?} waiting for: {text}")]
pub struct WaitTimeout {
    pub text: String,
    pub timeout: Duration,
}

/// Poll `probe` every `step` until it yields a value or `timeout` elapses.
///
/// The probe is always tried at least once, even with a zero timeout. `text` describes what is
/// being waited for and is carried in the timeout error.
pub fn wait_for<T>(
    mut probe: impl FnMut() -> Option<T>,
    step: Duration,
    timeout: Duration,
    text: &str,
) -> Result<T, WaitTimeout> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(value) = probe() {
            return Ok(value);
        }

        let now = Instant::now();
        if now >= deadline {
            log::debug!("Wait for `{text}` timed out after {timeout:?}");
            return Err(WaitTimeout {
                text: text.to_string(),
                timeout,
            });
        }

        std::thread::sleep(step.min(deadline - now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immediate_value_needs_no_budget() {
        let result = wait_for(
            || Some(42),
            Duration::from_millis(1),
            Duration::ZERO,
            "a value that is already there",
        );
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn value_appearing_later_is_picked_up() {
        let mut attempts = 0;
        let result = wait_for(
            || {
                attempts += 1;
                (attempts > 3).then_some("ready")
            },
            Duration::from_millis(1),
            Duration::from_secs(1),
            "a slow probe",
        );
        assert_eq!(result.unwrap(), "ready");
        assert!(attempts > 3);
    }

    #[test]
    fn exhausted_budget_reports_what_was_waited_for() {
        let result = wait_for(
            || None::<()>,
            Duration::from_millis(1),
            Duration::from_millis(10),
            "something that never happens",
        );
        let err = result.unwrap_err();
        assert!(err.to_string().contains("something that never happens"));
    }
}
