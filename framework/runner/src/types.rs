/// Recommended error type for harness code that drives supervised runs. Typed errors from this
/// crate can still be recovered from it with `downcast_ref`.
pub type SquallResult<T> = anyhow::Result<T>;
