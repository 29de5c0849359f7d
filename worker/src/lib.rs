pub mod builder;
pub mod error;
pub mod metrics;
pub mod worker;

pub use builder::WorkerBuilder;
pub use error::{Result, WorkerErr};
pub use metrics::WorkerMetrics;
pub use worker::Worker;
