//! Control-message catalogue
//!
//! Classifies decoded frames into the closed set of messages the device
//! understands. Everything outside the set lands in [`ControlMessage::Unknown`]
//! so the dispatch in [`crate::control`] is total.

use crate::codec::Frame;
use crate::constants::{MSG_ACK_FLAG, MSG_READBACK, MSG_REG_WRITE};

/// A single register write request: 4-byte address, 4-byte value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterWrite {
    pub address: u32,
    pub value: u32,
}

impl RegisterWrite {
    /// Decode from the first 8 bytes of a control-write body
    pub fn decode(body: &[u8]) -> Option<Self> {
        if body.len() < 8 {
            return None;
        }
        Some(Self {
            address: u32::from_be_bytes([body[0], body[1], body[2], body[3]]),
            value: u32::from_be_bytes([body[4], body[5], body[6], body[7]]),
        })
    }

    /// Encode as a control-write body
    pub fn encode(&self) -> [u8; 8] {
        let mut body = [0u8; 8];
        body[..4].copy_from_slice(&self.address.to_be_bytes());
        body[4..].copy_from_slice(&self.value.to_be_bytes());
        body
    }
}

/// Inbound control messages, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    /// Valid register write; the original body is echoed in the ack
    Write(RegisterWrite),
    /// Register write whose body is shorter than address + value
    MalformedWrite,
    /// Status readback request (body of exactly four zero bytes)
    Readback,
    /// Anything else is ignored without a reply
    Unknown,
}

impl ControlMessage {
    pub fn classify(frame: &Frame) -> Self {
        match frame.msgid {
            MSG_REG_WRITE => match RegisterWrite::decode(&frame.body) {
                Some(write) => Self::Write(write),
                None => Self::MalformedWrite,
            },
            MSG_READBACK if frame.body.as_ref() == [0u8; 4] => Self::Readback,
            _ => Self::Unknown,
        }
    }
}

/// The msgid carried by the acknowledgement of a write
pub fn ack_msgid(msgid: u16) -> u16 {
    msgid | MSG_ACK_FLAG
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn register_write_roundtrip() {
        let w = RegisterWrite {
            address: 20,
            value: 25,
        };
        assert_eq!(RegisterWrite::decode(&w.encode()), Some(w));
    }

    #[test]
    fn write_body_may_carry_trailing_bytes() {
        let mut body = RegisterWrite {
            address: 11,
            value: 1,
        }
        .encode()
        .to_vec();
        body.push(0xee);
        let frame = Frame::new(MSG_REG_WRITE, body);
        assert!(matches!(
            ControlMessage::classify(&frame),
            ControlMessage::Write(RegisterWrite {
                address: 11,
                value: 1
            })
        ));
    }

    #[test]
    fn short_write_is_malformed() {
        let frame = Frame::new(MSG_REG_WRITE, vec![0u8; 7]);
        assert_eq!(
            ControlMessage::classify(&frame),
            ControlMessage::MalformedWrite
        );
    }

    #[test]
    fn readback_requires_zero_body() {
        let good = Frame::new(MSG_READBACK, vec![0u8; 4]);
        assert_eq!(ControlMessage::classify(&good), ControlMessage::Readback);

        let bad = Frame::new(MSG_READBACK, vec![0, 0, 0, 1]);
        assert_eq!(ControlMessage::classify(&bad), ControlMessage::Unknown);
    }

    #[test]
    fn unknown_msgid() {
        let frame = Frame::new(12345, Bytes::new());
        assert_eq!(ControlMessage::classify(&frame), ControlMessage::Unknown);
    }

    #[test]
    fn ack_sets_high_bit() {
        assert_eq!(ack_msgid(MSG_REG_WRITE), 16951 | 0x8000);
    }
}
