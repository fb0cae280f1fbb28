//! Output synchronization toward the host
//!
//! [`Debouncer`] is the cancellable delayed-task primitive; the
//! [`OutputSynchronizer`] batches named output values so one user action
//! reaches the host as one event.

mod debounce;
mod output;

pub use debounce::Debouncer;
pub use output::OutputSynchronizer;
