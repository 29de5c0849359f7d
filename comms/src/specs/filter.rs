use serde::{Deserialize, Serialize};

/// The kind of observation filter a worker applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// Observations pass through untouched.
    NoFilter,
    /// Observations are normalized with running mean and standard deviation.
    #[default]
    MeanStd,
}

/// Count, mean and sum of squared deviations of a stream of observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningStatState {
    pub count: u64,
    pub mean: Vec<f64>,
    pub m2: Vec<f64>,
}

impl RunningStatState {
    /// An empty accumulator for observations of `dim` elements.
    pub fn empty(dim: usize) -> Self {
        Self {
            count: 0,
            mean: vec![0.; dim],
            m2: vec![0.; dim],
        }
    }
}

/// The serializable form of an observation filter.
///
/// `running` holds everything the filter has absorbed, `buffer` only what it
/// saw since its last flush.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    pub kind: FilterKind,
    pub running: RunningStatState,
    pub buffer: RunningStatState,
}
