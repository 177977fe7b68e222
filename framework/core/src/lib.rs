mod stop;
mod wait;

pub mod prelude {
    pub use crate::stop::{StopHandle, StopListener};
    pub use crate::wait::{wait_for, WaitTimeout};
}
