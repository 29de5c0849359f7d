//! The receiving end of the framing protocol.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{Deserialize, LEN_TYPE_SIZE, LenType};

/// The receiving end handle of the communication.
pub struct OnoReceiver<R: AsyncRead + Unpin> {
    rx: R,
    buf: Vec<u32>,
}

impl<R: AsyncRead + Unpin> OnoReceiver<R> {
    /// Creates a new `OnoReceiver` instance.
    ///
    /// # Arguments
    /// * `rx` - The underlying reader.
    pub(super) fn new(rx: R) -> Self {
        Self { rx, buf: Vec::new() }
    }

    /// Waits to receive a new message, deserializing it from an internal buffer.
    ///
    /// The returned value borrows from the receiver, so it must be consumed (or
    /// turned into owned data) before the next call.
    ///
    /// # Returns
    /// A result object that returns `T` on success or `io::Error` on failure.
    pub async fn recv<'s, T>(&'s mut self) -> io::Result<T>
    where
        T: Deserialize<'s>,
    {
        let Self { rx, buf } = self;
        Self::read_frame(rx, buf).await
    }

    /// Reads one frame into `buf`, whose `u32` elements keep the body aligned
    /// for the `f32` payloads.
    async fn read_frame<'buf, T>(rx: &mut R, buf: &'buf mut Vec<u32>) -> io::Result<T>
    where
        T: Deserialize<'buf>,
    {
        let mut size_buf = [0; LEN_TYPE_SIZE];
        rx.read_exact(&mut size_buf).await?;
        let len = LenType::from_be_bytes(size_buf) as usize;

        let needed = len.div_ceil(size_of::<u32>());
        buf.clear();
        buf.resize(needed, 0);

        let view: &mut [u8] = bytemuck::cast_slice_mut(buf.as_mut_slice());
        let body = &mut view[..len];
        rx.read_exact(body).await?;

        T::deserialize(body)
    }
}
