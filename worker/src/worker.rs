use std::{
    borrow::Cow,
    io,
    time::{Duration, Instant},
};

use comms::{
    OnoReceiver, OnoSender,
    msg::{Command, Msg, Payload},
    specs::rollout::ResultBundle,
};
use es_core::RolloutWorker;
use log::{debug, info, warn};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    task,
};

use crate::{Result, WorkerErr, metrics::WorkerMetrics};

/// Infrastructure worker runtime.
///
/// Serves rollout rounds and filter requests from the coordinator until it
/// disconnects.
pub struct Worker {
    rollouts: RolloutWorker,
    params: Vec<f32>,
    metrics: WorkerMetrics,
}

impl Worker {
    /// Creates a new `Worker`.
    ///
    /// # Args
    /// * `rollouts` - The already built batch loop.
    ///
    /// # Returns
    /// A new worker instance.
    pub fn new(rollouts: RolloutWorker) -> Self {
        Self {
            params: Vec::with_capacity(rollouts.num_params()),
            rollouts,
            metrics: WorkerMetrics::default(),
        }
    }

    pub fn worker_id(&self) -> usize {
        self.rollouts.worker_id()
    }

    /// Serves the coordinator until it sends `Disconnect`.
    ///
    /// # Args
    /// * `rx` - Receiving end of the coordinator channel.
    /// * `tx` - Sending end of the coordinator channel.
    ///
    /// # Returns
    /// The metrics gathered over the whole session.
    ///
    /// # Errors
    /// Returns `WorkerErr` on I/O failures or protocol violations. Rollout
    /// failures are reported to the coordinator and don't end the session.
    pub async fn run<R, W>(self, mut rx: OnoReceiver<R>, mut tx: OnoSender<W>) -> Result<WorkerMetrics>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        let Self {
            mut rollouts,
            mut params,
            mut metrics,
        } = self;

        let worker_id = rollouts.worker_id();
        let mut round = 0;

        loop {
            match rx.recv().await? {
                Msg::Data(Payload::Params(received)) => {
                    round += 1;
                    debug!(worker_id = worker_id, round = round; "received parameters");

                    params.clear();
                    params.extend_from_slice(received);

                    let (rollouts_back, params_back, res, elapsed) =
                        rollout_round(rollouts, params).await?;
                    rollouts = rollouts_back;
                    params = params_back;

                    let reply = match res {
                        Ok(bundle) => {
                            metrics.add_bundle(&bundle, elapsed);
                            Msg::Control(Command::Results(bundle))
                        }
                        Err(e) => {
                            warn!(worker_id = worker_id, round = round; "rollouts failed: {e}");
                            metrics.bump_failed();
                            Msg::Err(Cow::Owned(e.to_string()))
                        }
                    };

                    tx.send(&reply).await?;
                }
                Msg::Control(Command::GetFilter { flush }) => {
                    let state = rollouts.get_filter(flush);
                    tx.send(&Msg::Control(Command::Filter(state))).await?;
                }
                Msg::Control(Command::SyncFilter(state)) => {
                    if let Err(e) = rollouts.sync_filter(&state) {
                        warn!(worker_id = worker_id; "filter sync failed: {e}");
                        tx.send(&Msg::Err(Cow::Owned(e.to_string()))).await?;
                    }
                }
                Msg::Control(Command::Disconnect) => {
                    info!(worker_id = worker_id, rounds = round; "disconnect received");
                    tx.send(&Msg::Control(Command::Disconnect)).await?;
                    break;
                }
                other => {
                    warn!(
                        worker_id = worker_id,
                        round = round,
                        got = other.kind();
                        "unexpected message from coordinator"
                    );

                    return Err(WorkerErr::UnexpectedMessage {
                        round,
                        got: other.kind(),
                    });
                }
            }
        }

        Ok(metrics)
    }
}

/// Runs one round on tokio's blocking pool.
///
/// The batch loop and the parameter buffer are moved into the task and
/// handed back with the outcome.
async fn rollout_round(
    mut rollouts: RolloutWorker,
    params: Vec<f32>,
) -> Result<(
    RolloutWorker,
    Vec<f32>,
    es_core::Result<ResultBundle>,
    Duration,
)> {
    let out = task::spawn_blocking(move || {
        let start = Instant::now();
        let res = rollouts.do_rollouts(&params, None);
        (rollouts, params, res, start.elapsed())
    })
    .await
    .map_err(|e| io::Error::other(format!("rollout join error: {e}")))?;

    Ok(out)
}
