//! Control-channel message processing
//!
//! Pure with respect to the network: takes the raw datagram payload,
//! mutates [`DeviceState`], and hands back the encoded replies for the
//! caller to send. Keeps the channel trivially unit-testable.

use bytes::Bytes;
use tracing::{debug, warn};

use crate::codec::{self, Frame};
use crate::constants::{MSG_READBACK, READBACK_REPLY_LEN};
use crate::device::DeviceState;
use crate::protocol::{ack_msgid, ControlMessage};

/// Process one control datagram, returning replies in wire order
///
/// A malformed tail aborts only the remainder of this datagram; frames
/// decoded before the error are still dispatched. A frame that fails to
/// process is logged and skipped without affecting the frames after it.
pub fn process_datagram(device: &mut DeviceState, payload: &[u8]) -> Vec<Bytes> {
    let (frames, err) = codec::decode_all(payload);
    if let Some(err) = err {
        warn!("malformed control datagram: {err}");
    }

    let mut replies = Vec::new();
    for frame in &frames {
        if let Some(reply) = handle_frame(device, frame) {
            replies.push(reply);
        }
    }
    replies
}

fn handle_frame(device: &mut DeviceState, frame: &Frame) -> Option<Bytes> {
    match ControlMessage::classify(frame) {
        ControlMessage::Write(write) => {
            // Applied, no-op and rejected writes are all acknowledged the
            // same way: echo the body with the ack bit set on the msgid.
            let _ = device.apply_write(write);
            encode_reply(ack_msgid(frame.msgid), &frame.body)
        }
        ControlMessage::Readback => {
            // Placeholder telemetry; real status fields are a future
            // hardware extension.
            encode_reply(MSG_READBACK, &[0u8; READBACK_REPLY_LEN])
        }
        ControlMessage::MalformedWrite => {
            warn!(
                "error processing msgid={:#06x}: write body too short ({} bytes)",
                frame.msgid,
                frame.body.len()
            );
            None
        }
        ControlMessage::Unknown => {
            debug!("ignore unimplemented msgid={:#06x}", frame.msgid);
            None
        }
    }
}

fn encode_reply(msgid: u16, body: &[u8]) -> Option<Bytes> {
    match codec::encode(msgid, body) {
        Ok(buf) => Some(buf),
        Err(err) => {
            warn!("failed to encode reply msgid={msgid:#06x}: {err}");
            None
        }
    }
}
