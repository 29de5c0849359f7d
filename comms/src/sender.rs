//! The sending end of the framing protocol.

use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::{LenType, Serialize};

/// The sending end handle of the communication.
pub struct OnoSender<W>
where
    W: AsyncWrite + Unpin,
{
    tx: W,
    body: Vec<u8>,
}

impl<W: AsyncWrite + Unpin> OnoSender<W> {
    /// Creates a new `OnoSender` instance.
    ///
    /// # Arguments
    /// * `tx` - The underlying writer.
    pub(super) fn new(tx: W) -> Self {
        Self {
            tx,
            body: Vec::new(),
        }
    }

    /// Sends `msg` as a single length-prefixed frame.
    ///
    /// The encoded head of the body is staged in a buffer reused across
    /// calls. A borrowed payload, if any, is written straight from `msg`
    /// after it, so large parameter vectors are never copied.
    ///
    /// # Arguments
    /// * `msg` - A serializable object.
    ///
    /// # Returns
    /// A result object that returns `io::Error` on failure.
    pub async fn send<'a, T: Serialize<'a>>(&mut self, msg: &'a T) -> io::Result<()> {
        self.body.clear();
        let payload = msg.serialize(&mut self.body).unwrap_or_default();

        let frame_len = (self.body.len() + payload.len()) as LenType;
        self.tx.write_all(&frame_len.to_be_bytes()).await?;
        self.tx.write_all(&self.body).await?;
        self.tx.write_all(payload).await?;

        self.tx.flush().await
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{self, AsyncReadExt};

    use super::*;
    use crate::{LEN_TYPE_SIZE, msg::Msg};

    #[tokio::test]
    async fn prefixes_the_body_length() {
        let (one, mut two) = io::duplex(256);
        let mut sender = OnoSender::new(one);

        sender.send(&Msg::Err("worker lost".into())).await.unwrap();
        drop(sender);

        let mut frame = Vec::new();
        two.read_to_end(&mut frame).await.unwrap();

        let (prefix, body) = frame.split_at(LEN_TYPE_SIZE);
        let len = LenType::from_be_bytes(prefix.try_into().unwrap()) as usize;

        assert_eq!(len, body.len());
        assert_eq!(&body[body.len() - "worker lost".len()..], b"worker lost");
    }
}
