//! Observation filters shared between workers.
//!
//! Each worker normalizes its observations with running statistics and
//! keeps a buffer of what it saw since its last flush. The coordinator
//! merges every buffer into its canonical filter and pushes it back.

pub use comms::specs::filter::{FilterKind, FilterState, RunningStatState};

use crate::{EsErr, Result};

/// Normalized observations are clipped to `[-CLIP, CLIP]`.
const CLIP: f32 = 10.;

/// Welford accumulator of a stream of vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct RunningStat {
    count: u64,
    mean: Vec<f64>,
    m2: Vec<f64>,
}

impl RunningStat {
    pub fn new(dim: usize) -> Self {
        Self {
            count: 0,
            mean: vec![0.; dim],
            m2: vec![0.; dim],
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Absorbs one observation.
    pub fn push(&mut self, x: &[f32]) {
        self.count += 1;
        let n = self.count as f64;

        for ((mean, m2), &x) in self.mean.iter_mut().zip(&mut self.m2).zip(x) {
            let x = x as f64;
            let delta = x - *mean;
            *mean += delta / n;
            *m2 += delta * (x - *mean);
        }
    }

    /// Absorbs another accumulator, as if its observations were pushed here.
    pub fn merge(&mut self, other: &RunningStat) {
        if other.count == 0 {
            return;
        }

        let n1 = self.count as f64;
        let n2 = other.count as f64;
        let n = n1 + n2;

        for (i, (mean, m2)) in self.mean.iter_mut().zip(&mut self.m2).enumerate() {
            let delta = other.mean[i] - *mean;
            *mean += delta * n2 / n;
            *m2 += other.m2[i] + delta * delta * n1 * n2 / n;
        }

        self.count += other.count;
    }

    /// The sample standard deviation, `1` until there are two observations.
    pub fn std(&self) -> Vec<f64> {
        if self.count < 2 {
            return vec![1.; self.mean.len()];
        }

        let n = (self.count - 1) as f64;
        self.m2.iter().map(|m2| (m2 / n).sqrt()).collect()
    }

    fn to_state(&self) -> RunningStatState {
        RunningStatState {
            count: self.count,
            mean: self.mean.clone(),
            m2: self.m2.clone(),
        }
    }

    fn from_state(state: &RunningStatState, dim: usize) -> Result<Self> {
        EsErr::check("filter mean length", state.mean.len(), dim)?;
        EsErr::check("filter m2 length", state.m2.len(), dim)?;

        Ok(Self {
            count: state.count,
            mean: state.mean.clone(),
            m2: state.m2.clone(),
        })
    }
}

/// Normalizes observations with a running mean and standard deviation.
#[derive(Debug, Clone)]
pub struct ObservationFilter {
    kind: FilterKind,
    running: RunningStat,
    buffer: RunningStat,
}

impl ObservationFilter {
    /// Creates a new empty `ObservationFilter` for observations of `dim` elements.
    pub fn new(kind: FilterKind, dim: usize) -> Self {
        Self {
            kind,
            running: RunningStat::new(dim),
            buffer: RunningStat::new(dim),
        }
    }

    /// Builds a filter straight from its serialized form.
    pub fn from_state(state: &FilterState) -> Result<Self> {
        let dim = state.running.mean.len();

        Ok(Self {
            kind: state.kind,
            running: RunningStat::from_state(&state.running, dim)?,
            buffer: RunningStat::from_state(&state.buffer, dim)?,
        })
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn running(&self) -> &RunningStat {
        &self.running
    }

    /// Filters an observation.
    ///
    /// # Arguments
    /// * `obs` - The raw observation.
    /// * `update` - Whether `obs` should be absorbed into the statistics first.
    ///
    /// # Returns
    /// The normalized observation, or `obs` itself when the kind is `NoFilter`.
    pub fn filter(&mut self, obs: &[f32], update: bool) -> Vec<f32> {
        if self.kind == FilterKind::NoFilter {
            return obs.to_vec();
        }

        if update {
            self.running.push(obs);
            self.buffer.push(obs);
        }

        obs.iter()
            .zip(self.running.mean())
            .zip(self.running.std())
            .map(|((&x, &mean), std)| {
                let z = (x as f64 - mean) / (std + 1e-8);
                (z as f32).clamp(-CLIP, CLIP)
            })
            .collect()
    }

    pub fn as_serializable(&self) -> FilterState {
        FilterState {
            kind: self.kind,
            running: self.running.to_state(),
            buffer: self.buffer.to_state(),
        }
    }

    /// Returns the serialized filter and clears the buffer.
    pub fn flush(&mut self) -> FilterState {
        let state = self.as_serializable();
        self.reset_buffer();
        state
    }

    /// Merges the observations `other` buffered since its last flush.
    ///
    /// # Returns
    /// A `Consistency` error if `other` filters observations of another length.
    pub fn apply_changes(&mut self, other: &FilterState) -> Result<()> {
        let buffer = RunningStat::from_state(&other.buffer, self.running.mean.len())?;
        self.running.merge(&buffer);
        Ok(())
    }

    /// Replaces the running statistics with `other`'s and clears the buffer.
    pub fn sync(&mut self, other: &FilterState) -> Result<()> {
        self.running = RunningStat::from_state(&other.running, self.running.mean.len())?;
        self.reset_buffer();
        Ok(())
    }

    pub fn reset_buffer(&mut self) {
        self.buffer = RunningStat::new(self.running.mean.len());
    }
}
