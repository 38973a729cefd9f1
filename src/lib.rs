//! # PSC DAQ Front-End Simulator
//!
//! Simulates a network-attached data-acquisition front end speaking the
//! length-framed "PS" binary protocol over two UDP channels, so client and
//! control software can be exercised without real hardware.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        SIMULATOR                             │
//! │                                                              │
//! │  control UDP (54398)                 data UDP (54399)        │
//! │        │                                   │                 │
//! │        ▼                                   ▼                 │
//! │  ┌───────────┐                      ┌─────────────┐          │
//! │  │ codec     │                      │ subscriber  │          │
//! │  │ decode    │                      │ discovery + │          │
//! │  └─────┬─────┘                      │ liveness    │          │
//! │        ▼                            └──────┬──────┘          │
//! │  ┌───────────┐     ┌─────────────┐         │                 │
//! │  │ register  │────▶│ DeviceState │◀────────┘                 │
//! │  │ dispatch  │     └──────┬──────┘                           │
//! │  └─────┬─────┘            │ read by tick                     │
//! │        │ ack/readback     ▼                                  │
//! │        ▼            ┌───────────┐   ┌────────────┐           │
//! │  control UDP        │ waveform  │──▶│ packetizer │──▶ data   │
//! │                     │ generator │   │ (≤1464 B)  │    UDP    │
//! │                     └───────────┘   └────────────┘           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything above runs on a single tokio task: both receive paths, the
//! periodic tick, and the subscriber liveness deadline are multiplexed
//! with `select!`, so no locking is needed around [`device::DeviceState`].

pub mod codec;
pub mod config;
pub mod control;
pub mod device;
pub mod error;
pub mod network;
pub mod protocol;
pub mod signal;

pub use error::{Error, Result};

/// Application-wide constants
pub mod constants {
    /// Two-byte magic opening every protocol frame
    pub const FRAME_MAGIC: [u8; 2] = *b"PS";

    /// Frame header size: magic + msgid + body length
    pub const FRAME_HEADER_LEN: usize = 8;

    /// Register write request
    pub const MSG_REG_WRITE: u16 = 16951;

    /// Status readback request/reply
    pub const MSG_READBACK: u16 = 16952;

    /// Telemetry stream frame
    pub const MSG_STREAM: u16 = 20033;

    /// Set on the msgid of a write acknowledgement
    pub const MSG_ACK_FLAG: u16 = 0x8000;

    /// Size of the zero-filled status readback reply body
    pub const READBACK_REPLY_LEN: usize = 128;

    /// Number of simulated signal channels
    pub const NUM_CHANNELS: usize = 32;

    /// ADC sample rate before decimation, in samples/sec
    pub const BASE_SAMPLE_RATE: f64 = 250_000.0;

    /// Decimation factors the device accepts for register 20
    pub const ALLOWED_DECIMATIONS: [u32; 4] = [1, 5, 25, 250];

    /// Full-scale amplitude of a 24-bit signed sample
    pub const SAMPLE_FULL_SCALE: i32 = 0x7f_ffff;

    /// Bytes per packed sample on the wire
    pub const SAMPLE_BYTES: usize = 3;

    /// Stream frame header: status + mask + sequence + sec + nsec
    pub const STREAM_HEADER_LEN: usize = 24;

    /// Sample rows per stream frame, fixed at the full 32-channel budget
    pub const ROWS_PER_FRAME: usize = 15;

    /// Largest stream frame body the transport accepts
    pub const MAX_STREAM_PAYLOAD: usize = 1464;

    /// Default UDP port for the control channel
    pub const DEFAULT_CONTROL_PORT: u16 = 54398;

    /// Default UDP port for the data channel
    pub const DEFAULT_DATA_PORT: u16 = 54399;

    /// Default tick period in milliseconds
    pub const DEFAULT_TICK_PERIOD_MS: u64 = 100;

    /// Default subscriber liveness timeout in milliseconds
    pub const DEFAULT_STREAM_TIMEOUT_MS: u64 = 10_000;
}
