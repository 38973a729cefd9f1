//! Sine-bank waveform synthesis
//!
//! Each tick produces a fresh time-by-channel matrix for the enabled
//! channels. The only state carried between ticks is the per-channel
//! phase accumulator in [`DeviceState`], advanced here so the waveform is
//! continuous across tick boundaries.

use std::f64::consts::PI;
use std::time::Duration;

use crate::constants::{NUM_CHANNELS, SAMPLE_FULL_SCALE};
use crate::device::DeviceState;

/// Simulated frequency of a channel, in Hz
///
/// Fixed plan: eight channels per decade, 100 Hz through 100 kHz.
pub fn channel_frequency(channel: usize) -> f64 {
    const BANK_HZ: [f64; 4] = [100.0, 1_000.0, 10_000.0, 100_000.0];
    BANK_HZ[channel / 8]
}

/// Fixed per-channel phase offset, spreading the 32 channels evenly over
/// `[0, 31π/16]` so they stay visually distinguishable
pub fn channel_spread(channel: usize) -> f64 {
    channel as f64 * PI / 16.0
}

/// One tick's worth of samples for the enabled channels
///
/// Row-major: `rows` rows of `channels` interleaved amplitudes. Never
/// retained across ticks.
#[derive(Debug, Clone)]
pub struct SampleBatch {
    pub channel_mask: u32,
    pub channels: usize,
    pub rows: usize,
    samples: Vec<i32>,
}

impl SampleBatch {
    pub fn row(&self, row: usize) -> &[i32] {
        &self.samples[row * self.channels..(row + 1) * self.channels]
    }

    pub fn samples(&self) -> &[i32] {
        &self.samples
    }
}

/// Generate the sample matrix for one tick of length `period`
///
/// Produces `round(rate × period)` rows covering `[0, period)`. Phase
/// accumulators advance for all 32 channels, enabled or not, so masking a
/// channel out and back in does not break its continuity.
pub fn generate(device: &mut DeviceState, period: Duration) -> SampleBatch {
    let rate = device.rate();
    let mask = device.channel_mask();
    let rows = (rate * period.as_secs_f64()).round() as usize;
    let channels = mask.count_ones() as usize;

    let mut samples = Vec::with_capacity(rows * channels);
    for n in 0..rows {
        let t = n as f64 / rate;
        for ch in 0..NUM_CHANNELS {
            if mask & (1 << ch) == 0 {
                continue;
            }
            let arg = device.phase(ch) + 2.0 * PI * channel_frequency(ch) * t + channel_spread(ch);
            // scale [-1.0, 1.0] onto the 24-bit signed range, truncating
            samples.push((arg.sin() * SAMPLE_FULL_SCALE as f64) as i32);
        }
    }

    for ch in 0..NUM_CHANNELS {
        device.advance_phase(ch, 2.0 * PI * channel_frequency(ch) * rows as f64 / rate);
    }

    SampleBatch {
        channel_mask: mask,
        channels,
        rows,
        samples,
    }
}
