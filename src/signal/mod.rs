//! Synthetic waveform pipeline: per-tick sample synthesis and slicing
//! into size-bounded telemetry frames

pub mod generator;
pub mod packetizer;

pub use generator::{channel_frequency, channel_spread, generate, SampleBatch};
pub use packetizer::{packetize, unpack_samples, StreamHeader};
