use std::{env, io};

use log::info;
use tokio::{net::TcpListener, signal};

use worker::WorkerBuilder;

const DEFAULT_HOST: &str = "127.0.0.1";

#[tokio::main]
async fn main() -> io::Result<()> {
    env_logger::init();

    let addr = format!(
        "{}:{}",
        env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
        env::var("PORT").map_err(io::Error::other)?,
    );

    let list = TcpListener::bind(&addr).await?;
    info!("listening at {addr}");

    let (stream, addr) = list.accept().await?;
    let (rx, tx) = stream.into_split();
    let (mut rx, mut tx) = comms::channel(rx, tx);
    info!("coordinator connected from {addr}");

    let worker = WorkerBuilder::bootstrap(&mut rx, &mut tx).await?;

    tokio::select! {
        ret = worker.run(rx, tx) => {
            let metrics = ret?;
            info!(
                rounds = metrics.rounds,
                pairs = metrics.pairs,
                timesteps = metrics.timesteps,
                compute_secs = metrics.compute_time.as_secs_f64();
                "wrapping up"
            );
        }
        _ = signal::ctrl_c() => {
            info!("received SIGTERM");
        }
    }

    Ok(())
}
