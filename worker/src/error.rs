use std::{error::Error, fmt, io};

use es_core::EsErr;

/// The worker module's result type.
pub type Result<T> = std::result::Result<T, WorkerErr>;

/// Worker runtime failures.
#[derive(Debug)]
pub enum WorkerErr {
    Io(io::Error),
    UnexpectedMessage { round: u64, got: &'static str },
    Es(EsErr),
}

impl fmt::Display for WorkerErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerErr::Io(e) => write!(f, "io error: {e}"),
            WorkerErr::UnexpectedMessage { round, got } => {
                write!(f, "unexpected message at round {round}: got {got}")
            }
            WorkerErr::Es(e) => write!(f, "{e}"),
        }
    }
}

impl Error for WorkerErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WorkerErr::Io(e) => Some(e),
            WorkerErr::Es(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for WorkerErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<EsErr> for WorkerErr {
    fn from(value: EsErr) -> Self {
        Self::Es(value)
    }
}

/// Boundary conversion for binaries / I/O APIs.
impl From<WorkerErr> for io::Error {
    fn from(value: WorkerErr) -> Self {
        match value {
            WorkerErr::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
