//! "PS" wire framing shared by the control and data channels
//!
//! Every protocol message is a fixed 8-byte header (magic + msgid +
//! body length, all big-endian) followed by the body. Several frames may
//! be concatenated inside a single datagram.

use bytes::{BufMut, Bytes, BytesMut};

use crate::constants::{FRAME_HEADER_LEN, FRAME_MAGIC};
use crate::error::FrameError;

/// One decoded protocol frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub msgid: u16,
    pub body: Bytes,
}

impl Frame {
    pub fn new(msgid: u16, body: impl Into<Bytes>) -> Self {
        Self {
            msgid,
            body: body.into(),
        }
    }
}

/// Encode a single frame
///
/// The only validation is that the body length fits the 32-bit length
/// field; the msgid is written as given.
pub fn encode(msgid: u16, body: &[u8]) -> Result<Bytes, FrameError> {
    if body.len() > u32::MAX as usize {
        return Err(FrameError::BodyTooLarge(body.len()));
    }
    let mut buf = BytesMut::with_capacity(FRAME_HEADER_LEN + body.len());
    buf.put_slice(&FRAME_MAGIC);
    buf.put_u16(msgid);
    buf.put_u32(body.len() as u32);
    buf.put_slice(body);
    Ok(buf.freeze())
}

/// Decode every frame packed into `buf`
///
/// Walks the buffer header by header until it is exhausted. If the
/// remainder is non-empty but too short for a header, the magic is wrong,
/// or the declared body length overruns the buffer, decoding stops and
/// the error is returned alongside the frames already decoded — the
/// caller keeps the good frames and logs the bad tail.
pub fn decode_all(buf: &[u8]) -> (Vec<Frame>, Option<FrameError>) {
    let mut frames = Vec::new();
    let mut rest = buf;

    while !rest.is_empty() {
        if rest.len() < FRAME_HEADER_LEN {
            return (
                frames,
                Some(FrameError::Truncated {
                    needed: FRAME_HEADER_LEN - rest.len(),
                    available: rest.len(),
                }),
            );
        }
        if rest[..2] != FRAME_MAGIC {
            return (frames, Some(FrameError::BadMagic([rest[0], rest[1]])));
        }
        let msgid = u16::from_be_bytes([rest[2], rest[3]]);
        let body_len = u32::from_be_bytes([rest[4], rest[5], rest[6], rest[7]]) as usize;
        rest = &rest[FRAME_HEADER_LEN..];

        if rest.len() < body_len {
            return (
                frames,
                Some(FrameError::Truncated {
                    needed: body_len - rest.len(),
                    available: rest.len(),
                }),
            );
        }
        frames.push(Frame::new(msgid, Bytes::copy_from_slice(&rest[..body_len])));
        rest = &rest[body_len..];
    }

    (frames, None)
}
