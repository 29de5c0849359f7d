use comms::{
    OnoReceiver, OnoSender,
    msg::{Command, Msg},
};
use es_core::{NoiseTable, RolloutWorker};
use log::info;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::{Result, Worker, WorkerErr};

pub struct WorkerBuilder;

impl WorkerBuilder {
    /// Performs the bootstrap handshake and builds a `Worker`.
    ///
    /// Waits for the `CreateWorker` specification, receives the noise table
    /// and answers with `Ready` once the local policy is built.
    ///
    /// # Args
    /// * `rx` - Receiving end of the coordinator channel.
    /// * `tx` - Sending end of the coordinator channel.
    ///
    /// # Returns
    /// A fully initialized `Worker` instance.
    ///
    /// # Errors
    /// Returns `WorkerErr` on I/O failures, protocol violations or if the
    /// noise table can't hold the policy's parameters.
    pub async fn bootstrap<R, W>(rx: &mut OnoReceiver<R>, tx: &mut OnoSender<W>) -> Result<Worker>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let spec = match rx.recv().await? {
            Msg::Control(Command::CreateWorker(spec)) => spec,
            other => {
                return Err(WorkerErr::UnexpectedMessage {
                    round: 0,
                    got: other.kind(),
                });
            }
        };

        let noise = NoiseTable::from_vec(comms::recv_noise(rx).await?);
        let rollouts = RolloutWorker::new(&spec, noise)?;

        info!(
            worker_id = spec.worker_id,
            num_params = rollouts.num_params();
            "worker ready"
        );

        let msg = Msg::Control(Command::Ready {
            worker_id: spec.worker_id,
            num_params: rollouts.num_params(),
        });
        tx.send(&msg).await?;

        Ok(Worker::new(rollouts))
    }
}
