use std::{borrow::Cow, io};

use crate::{
    Deserialize, Serialize,
    specs::{filter::FilterState, rollout::ResultBundle, worker::WorkerSpec},
};

type Header = u32;
const HEADER_SIZE: usize = size_of::<Header>();

const ERR: Header = 0;
const CONTROL: Header = 1;
const PARAMS: Header = 2;
const NOISE_CHUNK: Header = 3;

/// The payload data for the `Data` variant of the `Msg` enum.
///
/// Both variants are raw `f32` slices written without any copy or encoding.
#[derive(Debug)]
pub enum Payload<'a> {
    /// The current parameter vector, broadcast at the start of every round.
    Params(&'a [f32]),
    /// A contiguous piece of the shared noise table.
    NoiseChunk(&'a [f32]),
}

/// The command for the `Control` variant of the `Msg` enum.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Bootstraps a worker node.
    CreateWorker(WorkerSpec),
    /// Announces the noise table transfer, `len` floats follow in chunks.
    NoiseTable { len: usize },
    /// Sent by a worker once it holds the noise table and built its policy.
    Ready { worker_id: usize, num_params: usize },
    /// One worker's results for the current round.
    Results(ResultBundle),
    /// Asks a worker for its observation filter.
    GetFilter { flush: bool },
    /// A worker's observation filter.
    Filter(FilterState),
    /// Replaces a worker's observation filter with the canonical one.
    SyncFilter(FilterState),
    Disconnect,
}

/// The application layer message for the entire system.
#[derive(Debug)]
pub enum Msg<'a> {
    Control(Command),
    Data(Payload<'a>),
    Err(Cow<'a, str>),
}

impl Msg<'_> {
    fn buf_is_too_small<T>(size: usize) -> io::Result<T> {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("The given buffer is too small {size}, must at least be {HEADER_SIZE} bytes"),
        ))
    }

    fn invalid_kind<T>(kind: Header) -> io::Result<T> {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Received an invalid message kind {kind}"),
        ))
    }

    /// A short name for the message kind, used in logs and protocol errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Msg::Control(Command::CreateWorker(_)) => "control/create_worker",
            Msg::Control(Command::NoiseTable { .. }) => "control/noise_table",
            Msg::Control(Command::Ready { .. }) => "control/ready",
            Msg::Control(Command::Results(_)) => "control/results",
            Msg::Control(Command::GetFilter { .. }) => "control/get_filter",
            Msg::Control(Command::Filter(_)) => "control/filter",
            Msg::Control(Command::SyncFilter(_)) => "control/sync_filter",
            Msg::Control(Command::Disconnect) => "control/disconnect",
            Msg::Data(Payload::Params(_)) => "data/params",
            Msg::Data(Payload::NoiseChunk(_)) => "data/noise_chunk",
            Msg::Err(_) => "err",
        }
    }
}

impl<'a> Serialize<'a> for Msg<'a> {
    fn serialize(&'a self, buf: &mut Vec<u8>) -> Option<&'a [u8]> {
        match self {
            Msg::Err(e) => {
                buf.extend_from_slice(&ERR.to_be_bytes());
                Some(e.as_bytes())
            }
            Msg::Control(cmd) => {
                buf.extend_from_slice(&CONTROL.to_be_bytes());

                // SAFETY: `Command` derives `Serialize` and holds no maps with
                //         non-string keys, so writing JSON into a vec can't fail.
                serde_json::to_writer(buf, cmd).unwrap();
                None
            }
            Msg::Data(payload) => {
                let (kind, nums) = match payload {
                    Payload::Params(params) => (PARAMS, *params),
                    Payload::NoiseChunk(chunk) => (NOISE_CHUNK, *chunk),
                };

                buf.extend_from_slice(&kind.to_be_bytes());
                Some(bytemuck::cast_slice(nums))
            }
        }
    }
}

impl<'a> Deserialize<'a> for Msg<'a> {
    fn deserialize(buf: &'a mut [u8]) -> io::Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Self::buf_is_too_small(buf.len());
        }

        let (kind_buf, rest) = buf.split_at_mut(HEADER_SIZE);

        // SAFETY: We splitted the buffer to be of size `HEADER_SIZE` just above.
        let kind = Header::from_be_bytes(kind_buf.try_into().unwrap());

        match kind {
            ERR => {
                let text = str::from_utf8(rest)
                    .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

                Ok(Self::Err(Cow::Borrowed(text)))
            }
            CONTROL => {
                let cmd = serde_json::from_slice(rest)?;
                Ok(Self::Control(cmd))
            }
            PARAMS | NOISE_CHUNK => {
                let nums = bytemuck::try_cast_slice_mut::<u8, f32>(rest).map_err(|err| {
                    io::Error::new(io::ErrorKind::InvalidData, format!("{err:?}"))
                })?;
                let nums: &[f32] = nums;

                let payload = match kind {
                    PARAMS => Payload::Params(nums),
                    _ => Payload::NoiseChunk(nums),
                };

                Ok(Self::Data(payload))
            }
            other => Self::invalid_kind(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip_bytes(msg: &Msg<'_>) -> Vec<u32> {
        let mut buf = Vec::new();
        let tail = msg.serialize(&mut buf);
        if let Some(tail) = tail {
            buf.extend_from_slice(tail);
        }

        let mut words = vec![0u32; buf.len().div_ceil(4)];
        bytemuck::cast_slice_mut::<u32, u8>(&mut words)[..buf.len()].copy_from_slice(&buf);
        words.truncate(buf.len() / 4);
        words
    }

    #[test]
    fn params_are_read_back_as_floats() {
        let params = [0.5_f32, -1.0, 2.25];
        let mut words = roundtrip_bytes(&Msg::Data(Payload::Params(&params)));
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut words);

        match Msg::deserialize(bytes).unwrap() {
            Msg::Data(Payload::Params(got)) => assert_eq!(got, params),
            other => panic!("unexpected msg: {other:?}"),
        }
    }

    #[test]
    fn misaligned_float_payload_is_rejected() {
        let mut bytes = PARAMS.to_be_bytes().to_vec();
        bytes.extend_from_slice(&[1, 2, 3]);

        let mut words = vec![0u32; 2];
        let view: &mut [u8] = bytemuck::cast_slice_mut(&mut words);
        view[..bytes.len()].copy_from_slice(&bytes);

        assert!(Msg::deserialize(&mut view[..bytes.len()]).is_err());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let mut bytes = 42u32.to_be_bytes();
        assert!(Msg::deserialize(&mut bytes).is_err());
    }

    #[test]
    fn kind_names_control_commands() {
        let msg = Msg::Control(Command::GetFilter { flush: true });
        assert_eq!(msg.kind(), "control/get_filter");
    }
}
