//! Evolution strategies: a gradient free optimizer that estimates an ascent
//! direction from the returns of many mirrored parameter perturbations.
//!
//! Everything here is synchronous. The `worker` and `coordinator` crates
//! drive these pieces over the network.

pub mod aggregate;
pub mod checkpoint;
pub mod config;
pub mod env;
mod error;
pub mod filter;
pub mod learner;
pub mod noise;
pub mod optimization;
pub mod perturbation;
pub mod policy;
pub mod ranks;
pub mod report;
pub mod rollout;
pub mod worker;

pub use checkpoint::Checkpoint;
pub use config::{EsConfig, EvaluationConfig, OptimizerSpec};
pub use error::{EsErr, Result};
pub use learner::{Collected, EsLearner};
pub use noise::{DEFAULT_NOISE_SEED, NoiseTable};
pub use report::{IterationReport, ReportInfo};
pub use worker::RolloutWorker;
