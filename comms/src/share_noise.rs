//! One-time transfer of the shared noise table to a worker node.

use std::io;

use log::debug;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::{
    OnoReceiver, OnoSender,
    msg::{Command, Msg, Payload},
};

/// Floats per noise chunk frame, 16 MiB worth of `f32`.
pub const DEFAULT_NOISE_CHUNK: usize = 1 << 22;

/// Sends the whole noise table, announcing its length first.
///
/// # Arguments
/// * `noise` - The noise table.
/// * `chunk` - The maximum amount of floats per frame.
/// * `sender` - The sending end towards the worker.
///
/// # Returns
/// An io error if the transfer fails.
pub async fn send_noise<W>(noise: &[f32], chunk: usize, sender: &mut OnoSender<W>) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let msg = Msg::Control(Command::NoiseTable { len: noise.len() });
    sender.send(&msg).await?;

    for piece in noise.chunks(chunk.max(1)) {
        let msg = Msg::Data(Payload::NoiseChunk(piece));
        sender.send(&msg).await?;
    }

    debug!(len = noise.len(); "noise table sent");
    Ok(())
}

/// Receives a noise table sent with `send_noise`.
///
/// # Arguments
/// * `receiver` - The receiving end from the coordinator.
///
/// # Returns
/// The noise table or an io error if the stream is malformed.
pub async fn recv_noise<R>(receiver: &mut OnoReceiver<R>) -> io::Result<Vec<f32>>
where
    R: AsyncRead + Unpin,
{
    let len = match receiver.recv().await? {
        Msg::Control(Command::NoiseTable { len }) => len,
        msg => return Err(unexpected(&msg)),
    };

    let mut noise = Vec::with_capacity(len);

    while noise.len() < len {
        match receiver.recv().await? {
            Msg::Data(Payload::NoiseChunk(chunk)) => {
                if noise.len() + chunk.len() > len {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("noise table overflows its announced length {len}"),
                    ));
                }

                noise.extend_from_slice(chunk);
            }
            msg => return Err(unexpected(&msg)),
        }
    }

    debug!(len = len; "noise table received");
    Ok(noise)
}

fn unexpected(msg: &Msg<'_>) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("expected a noise table message, got: {}", msg.kind()),
    )
}

#[cfg(test)]
mod tests {
    use rand::Rng;
    use tokio::io::{self, duplex};

    use super::*;
    use crate::channel;

    #[tokio::test]
    async fn noise_table_arrives_whole() {
        let (one, two) = duplex(256);
        let (rx, _) = io::split(one);
        let (_, tx) = io::split(two);
        let (mut receiver, mut sender) = channel(rx, tx);

        let noise: Vec<f32> = (0..1023).map(|_| rand::rng().random()).collect();

        let send = send_noise(&noise, 100, &mut sender);
        let recv = recv_noise(&mut receiver);

        let (sent, received) = tokio::join!(send, recv);
        sent.unwrap();
        assert_eq!(received.unwrap(), noise);
    }

    #[tokio::test]
    async fn rejects_other_messages() {
        let (one, two) = duplex(256);
        let (rx, _) = io::split(one);
        let (_, tx) = io::split(two);
        let (mut receiver, mut sender) = channel(rx, tx);

        sender.send(&Msg::Control(Command::Disconnect)).await.unwrap();
        assert!(recv_noise(&mut receiver).await.is_err());
    }
}
