use std::{io, sync::Arc};

use comms::{
    OnoReceiver, OnoSender,
    msg::{Command, Msg, Payload},
    specs::{filter::FilterState, rollout::ResultBundle},
};
use es_core::{EsConfig, EsErr, NoiseTable};
use futures::future::{join_all, try_join_all};
use log::{debug, info, warn};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
};

use crate::{CoordinatorError, Result, pool::RolloutPool};

pub type NetRx = OnoReceiver<OwnedReadHalf>;
pub type NetTx = OnoSender<OwnedWriteHalf>;

/// One remote worker's end of the connection.
struct Connection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    worker_id: usize,
    rx: OnoReceiver<R>,
    tx: OnoSender<W>,
}

/// Rollout workers living in other processes, reached through comms channels.
pub struct RemotePool<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    connections: Vec<Connection<R, W>>,
}

impl RemotePool<OwnedReadHalf, OwnedWriteHalf> {
    /// Connects to every address and bootstraps a worker on each of them.
    ///
    /// The worker at `addrs[i]` gets id `i`.
    ///
    /// # Arguments
    /// * `addrs` - The worker nodes' addresses.
    /// * `config` - The run configuration.
    /// * `noise` - The noise table every worker receives a copy of.
    /// * `num_params` - The parameter count every worker must report.
    ///
    /// # Returns
    /// The connected pool or the first connection or bootstrap failure.
    pub async fn connect(
        addrs: &[String],
        config: &EsConfig,
        noise: &NoiseTable,
        num_params: usize,
    ) -> Result<Self> {
        let mut channels = Vec::with_capacity(addrs.len());

        for addr in addrs {
            channels.push(open_channel(addr).await?);
        }

        Self::bootstrap(channels, config, noise, num_params).await
    }
}

impl<R, W> RemotePool<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Bootstraps a worker on each already open channel.
    ///
    /// Sends the worker specification followed by the noise table and waits
    /// for the worker to report `Ready` with the expected parameter count.
    ///
    /// # Arguments
    /// * `channels` - One channel per worker, the position being its id.
    /// * `config` - The run configuration.
    /// * `noise` - The noise table every worker receives a copy of.
    /// * `num_params` - The parameter count every worker must report.
    ///
    /// # Returns
    /// The bootstrapped pool, or the first failure of any worker.
    pub async fn bootstrap(
        channels: Vec<(OnoReceiver<R>, OnoSender<W>)>,
        config: &EsConfig,
        noise: &NoiseTable,
        num_params: usize,
    ) -> Result<Self> {
        let mut connections: Vec<_> = channels
            .into_iter()
            .enumerate()
            .map(|(worker_id, (rx, tx))| Connection { worker_id, rx, tx })
            .collect();

        try_join_all(
            connections
                .iter_mut()
                .map(|conn| conn.bootstrap(config, noise, num_params)),
        )
        .await?;

        info!(workers = connections.len(); "remote workers ready");
        Ok(Self { connections })
    }
}

impl<R, W> RolloutPool for RemotePool<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    fn num_workers(&self) -> usize {
        self.connections.len()
    }

    async fn run_round(&mut self, params: Arc<[f32]>) -> Result<Vec<ResultBundle>> {
        let replies = join_all(self.connections.iter_mut().map(|conn| conn.round(&params))).await;
        let bundles = first_failure(replies)?;

        debug!(bundles = bundles.len(); "remote round finished");
        Ok(bundles)
    }

    async fn get_filters(&mut self, flush: bool) -> Result<Vec<FilterState>> {
        let replies = join_all(
            self.connections
                .iter_mut()
                .map(|conn| conn.get_filter(flush)),
        )
        .await;

        first_failure(replies)
    }

    async fn sync_filters(&mut self, state: &FilterState) -> Result<()> {
        let sent = join_all(self.connections.iter_mut().map(|conn| conn.sync_filter(state))).await;
        first_failure(sent)?;
        Ok(())
    }

    async fn shutdown(mut self) -> Result<()> {
        let acks = join_all(self.connections.iter_mut().map(Connection::disconnect)).await;
        first_failure(acks)?;

        info!(workers = self.connections.len(); "remote workers disconnected");
        Ok(())
    }
}

/// Returns the first failure among every worker's outcome.
///
/// Every connection is awaited before this is called, so a failed worker
/// never leaves another worker's reply unread on its channel.
fn first_failure<T>(outcomes: Vec<Result<T>>) -> Result<Vec<T>> {
    outcomes.into_iter().collect()
}

impl<R, W> Connection<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn bootstrap(
        &mut self,
        config: &EsConfig,
        noise: &NoiseTable,
        num_params: usize,
    ) -> Result<()> {
        let spec = config.worker_spec(self.worker_id);
        self.tx.send(&Msg::Control(Command::CreateWorker(spec))).await?;
        comms::send_noise(noise.as_slice(), comms::DEFAULT_NOISE_CHUNK, &mut self.tx).await?;

        match self.rx.recv().await? {
            Msg::Control(Command::Ready {
                worker_id,
                num_params: reported,
            }) => {
                EsErr::check("worker id", worker_id, self.worker_id)?;
                EsErr::check("worker parameters", reported, num_params)?;
                debug!(worker_id = worker_id; "worker bootstrapped");
                Ok(())
            }
            Msg::Err(msg) => Err(failure(self.worker_id, msg.into_owned())),
            other => Err(unexpected(self.worker_id, other.kind())),
        }
    }

    async fn round(&mut self, params: &[f32]) -> Result<ResultBundle> {
        self.tx.send(&Msg::Data(Payload::Params(params))).await?;

        match self.rx.recv().await? {
            Msg::Control(Command::Results(bundle)) => Ok(bundle),
            Msg::Err(msg) => Err(failure(self.worker_id, msg.into_owned())),
            other => Err(unexpected(self.worker_id, other.kind())),
        }
    }

    async fn get_filter(&mut self, flush: bool) -> Result<FilterState> {
        self.tx
            .send(&Msg::Control(Command::GetFilter { flush }))
            .await?;

        match self.rx.recv().await? {
            Msg::Control(Command::Filter(state)) => Ok(state),
            Msg::Err(msg) => Err(failure(self.worker_id, msg.into_owned())),
            other => Err(unexpected(self.worker_id, other.kind())),
        }
    }

    async fn sync_filter(&mut self, state: &FilterState) -> Result<()> {
        let msg = Msg::Control(Command::SyncFilter(state.clone()));
        self.tx.send(&msg).await?;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.tx.send(&Msg::Control(Command::Disconnect)).await?;

        loop {
            match self.rx.recv().await? {
                Msg::Control(Command::Disconnect) => return Ok(()),
                other => warn!(
                    worker_id = self.worker_id,
                    got = other.kind();
                    "ignored message while disconnecting"
                ),
            }
        }
    }
}

fn failure(worker_id: usize, msg: String) -> CoordinatorError {
    warn!(worker_id = worker_id; "worker reported: {msg}");
    CoordinatorError::RolloutFailure { worker_id, msg }
}

fn unexpected(worker_id: usize, got: &'static str) -> CoordinatorError {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("unexpected message from worker {worker_id}: {got}"),
    )
    .into()
}

/// Opens a comms channel to `addr`.
async fn open_channel(addr: &str) -> Result<(NetRx, NetTx)> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|source| CoordinatorError::ConnectionFailed {
            addr: addr.to_string(),
            source,
        })?;

    let (rx, tx) = stream.into_split();
    Ok(comms::channel(rx, tx))
}
