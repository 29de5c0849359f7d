pub mod msg;
mod receiver;
mod sender;
mod serialization;
mod share_noise;
pub mod specs;

use tokio::io::{AsyncRead, AsyncWrite};

pub use receiver::OnoReceiver;
pub use sender::OnoSender;
pub use serialization::{Deserialize, Serialize};
pub use share_noise::{DEFAULT_NOISE_CHUNK, recv_noise, send_noise};

type LenType = u64;
const LEN_TYPE_SIZE: usize = size_of::<LenType>();

/// Creates both `OnoReceiver` and `OnoSender` network channel parts.
///
/// Given a reader and a writer creates and returns both ends of the communication.
///
/// # Arguments
/// * `rx` - An async readable.
/// * `tx` - An async writable.
///
/// # Returns
/// A communication stream in the form of an ono receiver and sender.
pub fn channel<R, W>(rx: R, tx: W) -> (OnoReceiver<R>, OnoSender<W>)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    (OnoReceiver::new(rx), OnoSender::new(tx))
}
