use std::fmt;

use es_core::EsErr;

/// The coordinator module's result type.
pub type Result<T> = std::result::Result<T, CoordinatorError>;

/// All errors that can occur in the coordinator.
#[derive(Debug)]
pub enum CoordinatorError {
    /// Invalid configuration, caught before connecting.
    InvalidConfig(String),
    /// Failed to connect to a worker.
    ConnectionFailed {
        addr: String,
        source: std::io::Error,
    },
    /// A worker failed to complete a round.
    RolloutFailure { worker_id: usize, msg: String },
    /// The optimizer rejected the collected results.
    Es(EsErr),
    /// An underlying I/O error not covered by the above variants.
    Io(std::io::Error),
}

impl fmt::Display for CoordinatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::ConnectionFailed { addr, source } => {
                write!(f, "connection failed to {addr}: {source}")
            }
            Self::RolloutFailure { worker_id, msg } => {
                write!(f, "worker {worker_id} failed its rollouts: {msg}")
            }
            Self::Es(e) => write!(f, "{e}"),
            Self::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl std::error::Error for CoordinatorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ConnectionFailed { source, .. } => Some(source),
            Self::Es(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CoordinatorError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<EsErr> for CoordinatorError {
    fn from(e: EsErr) -> Self {
        match e {
            EsErr::Config(msg) => Self::InvalidConfig(msg),
            other => Self::Es(other),
        }
    }
}
