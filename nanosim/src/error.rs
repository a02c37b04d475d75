use thiserror::Error;

/// Errors that can occur during kernel operations.
///
/// Only recoverable conditions are represented here. Contract violations
/// (negative delays, scheduling after destroy, suspending a non-running
/// timer) abort with a panic instead, because they indicate a bug in the
/// caller rather than a runtime condition to recover from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// The simulator behind a handle has been dropped or destroyed.
    #[error("Simulator has been shut down")]
    SimulatorShutdown,
}

/// A type alias for `Result<T, SimError>`.
pub type SimResult<T> = Result<T, SimError>;
