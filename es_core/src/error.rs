use std::{
    error::Error,
    fmt::{self, Display},
};

/// The result type used in the entire evolution strategies module.
pub type Result<T> = std::result::Result<T, EsErr>;

/// The evolution strategies module's error type.
#[derive(Debug)]
pub enum EsErr {
    /// An invalid option, found while validating the run configuration.
    Config(String),
    /// A noise window that doesn't fit in the table.
    Bounds {
        index: usize,
        len: usize,
        table: usize,
    },
    /// The environment or the policy failed during an episode.
    Rollout { reason: String },
    /// Two quantities that must agree don't, a protocol or shape bug.
    Consistency {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    /// A checkpoint couldn't be written or read back.
    Checkpoint(String),
}

impl EsErr {
    /// Shorthand for a rollout failure.
    pub fn rollout(reason: impl Into<String>) -> Self {
        Self::Rollout {
            reason: reason.into(),
        }
    }

    /// Shorthand for a configuration error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config(reason.into())
    }

    /// Checks that `got == expected`.
    pub fn check(what: &'static str, got: usize, expected: usize) -> Result<()> {
        if got != expected {
            return Err(Self::Consistency {
                what,
                got,
                expected,
            });
        }

        Ok(())
    }
}

impl Display for EsErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EsErr::Config(reason) => write!(f, "invalid configuration: {reason}"),
            EsErr::Bounds { index, len, table } => write!(
                f,
                "noise window [{index}, {index} + {len}) is out of bounds for a table of {table}"
            ),
            EsErr::Rollout { reason } => write!(f, "rollout failed: {reason}"),
            EsErr::Consistency {
                what,
                got,
                expected,
            } => write!(f, "inconsistent {what}: got {got}, expected {expected}"),
            EsErr::Checkpoint(reason) => write!(f, "checkpoint error: {reason}"),
        }
    }
}

impl Error for EsErr {}
