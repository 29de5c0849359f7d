//! The worker pools the coordinator broadcasts rounds to.

mod local;
mod remote;

use std::sync::Arc;

use comms::specs::{filter::FilterState, rollout::ResultBundle};

use crate::Result;

pub use local::LocalPool;
pub use remote::{NetRx, NetTx, RemotePool};

/// A fixed set of rollout workers driven in lockstep rounds.
pub trait RolloutPool {
    /// The amount of workers in the pool.
    fn num_workers(&self) -> usize;

    /// Broadcasts `params` and waits until every worker returned its bundle.
    ///
    /// # Arguments
    /// * `params` - The current parameters, shared by every worker.
    ///
    /// # Returns
    /// One bundle per worker, or the first failure of any of them.
    async fn run_round(&mut self, params: Arc<[f32]>) -> Result<Vec<ResultBundle>>;

    /// Collects every worker's observation filter, optionally clearing their buffers.
    async fn get_filters(&mut self, flush: bool) -> Result<Vec<FilterState>>;

    /// Replaces every worker's observation filter with `state`.
    async fn sync_filters(&mut self, state: &FilterState) -> Result<()>;

    /// Stops every worker.
    async fn shutdown(self) -> Result<()>;
}
