//! Telemetry frame packing
//!
//! Slices a [`SampleBatch`] into `MSG_STREAM` frames: a 24-byte stream
//! header followed by 24-bit signed big-endian samples, channel-interleaved
//! per row. Row count per frame is fixed at the full 32-channel budget
//! (15 rows) even when fewer channels are enabled, so a frame never
//! exceeds the 1464-byte payload bound; sparse masks simply produce
//! shorter frames. The decode helpers exist for the protocol's clients —
//! exercising client software is what the simulator is for.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::{BufMut, Bytes, BytesMut};

use crate::codec;
use crate::constants::{MAX_STREAM_PAYLOAD, MSG_STREAM, ROWS_PER_FRAME, SAMPLE_BYTES, STREAM_HEADER_LEN};
use crate::device::DeviceState;
use crate::error::Result;
use crate::signal::generator::SampleBatch;

/// Fixed header opening every telemetry frame body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader {
    /// Reserved, always zero
    pub status: u32,
    pub channel_mask: u32,
    pub sequence: u64,
    /// Wall-clock seconds of the frame's first sample
    pub sec: u32,
    /// Nanoseconds within `sec`
    pub nsec: u32,
}

impl StreamHeader {
    fn encode_into(&self, buf: &mut BytesMut) {
        buf.put_u32(self.status);
        buf.put_u32(self.channel_mask);
        buf.put_u64(self.sequence);
        buf.put_u32(self.sec);
        buf.put_u32(self.nsec);
    }

    /// Split a stream frame body into header and packed sample bytes
    pub fn decode(body: &[u8]) -> Option<(Self, &[u8])> {
        if body.len() < STREAM_HEADER_LEN {
            return None;
        }
        let u32_at = |i: usize| u32::from_be_bytes(body[i..i + 4].try_into().unwrap());
        let header = Self {
            status: u32_at(0),
            channel_mask: u32_at(4),
            sequence: u64::from_be_bytes(body[8..16].try_into().unwrap()),
            sec: u32_at(16),
            nsec: u32_at(20),
        };
        Some((header, &body[STREAM_HEADER_LEN..]))
    }
}

/// Unpack 24-bit signed big-endian samples
pub fn unpack_samples(data: &[u8]) -> Vec<i32> {
    data.chunks_exact(SAMPLE_BYTES)
        .map(|c| {
            let raw = (i32::from(c[0]) << 16) | (i32::from(c[1]) << 8) | i32::from(c[2]);
            (raw << 8) >> 8 // sign extend from bit 23
        })
        .collect()
}

/// Slice one tick's batch into encoded stream frames
///
/// The sequence number advances by exactly one per frame produced. A
/// final slice shorter than 15 rows is emitted as-is, never padded.
/// `tick_start` is the wall-clock time of the batch's first row; each
/// frame is stamped with its own first row's time.
pub fn packetize(
    device: &mut DeviceState,
    batch: &SampleBatch,
    tick_start: SystemTime,
) -> Result<Vec<Bytes>> {
    let rate = device.rate();
    let epoch = tick_start
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO);

    let mut frames = Vec::with_capacity(batch.rows.div_ceil(ROWS_PER_FRAME));
    let mut row = 0;
    while row < batch.rows {
        let take = ROWS_PER_FRAME.min(batch.rows - row);
        let stamp = epoch + Duration::from_secs_f64(row as f64 / rate);

        let mut body =
            BytesMut::with_capacity(STREAM_HEADER_LEN + take * batch.channels * SAMPLE_BYTES);
        StreamHeader {
            status: 0,
            channel_mask: batch.channel_mask,
            sequence: device.next_sequence(),
            sec: stamp.as_secs() as u32,
            nsec: stamp.subsec_nanos(),
        }
        .encode_into(&mut body);

        for r in row..row + take {
            for &v in batch.row(r) {
                body.put_slice(&v.to_be_bytes()[1..]); // truncate to 3 bytes
            }
        }
        debug_assert!(body.len() <= MAX_STREAM_PAYLOAD);

        frames.push(codec::encode(MSG_STREAM, &body)?);
        row += take;
    }

    Ok(frames)
}
