use thiserror::Error;

/// Domain failures of the shell. File and parse errors travel as
/// `anyhow::Error` with context instead.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ShellError {
    #[error("bootstrap has already been started")]
    AlreadyStarted,

    #[error("configuration store dropped its readiness signal")]
    StoreUnavailable,

    #[error("invalid restart transition: from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("observer unavailable: {0}")]
    ObserverUnavailable(String),
}
