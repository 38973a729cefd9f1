//! Simulated device configuration
//!
//! [`DeviceState`] is owned by the event loop and only ever touched from
//! that single task: the control path flips acquisition, mask and rate,
//! the tick path advances phase accumulators and the frame sequence.

use tracing::{info, warn};

use crate::constants::{ALLOWED_DECIMATIONS, BASE_SAMPLE_RATE, NUM_CHANNELS};
use crate::protocol::RegisterWrite;

/// Register addresses the device implements
///
/// Reboot, PPS alignment and filter selection exist on real hardware but
/// are accepted no-ops here.
pub mod registers {
    pub const REBOOT: u32 = 0;
    pub const PPS_ALIGN: u32 = 5;
    pub const ACQUIRE: u32 = 10;
    pub const CHANNEL_MASK: u32 = 11;
    pub const DECIMATION: u32 = 20;
    pub const FILTER: u32 = 21;
}

/// Outcome of a register write
///
/// All three outcomes are acknowledged identically on the wire; rejection
/// is visible only in the log (silent-reject policy).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// State changed
    Applied,
    /// Recognized register with no simulated effect
    Noop,
    /// Unknown register or out-of-range value; state unchanged
    Rejected,
}

/// Mutable configuration of the simulated front end
#[derive(Debug, Clone)]
pub struct DeviceState {
    acq_enabled: bool,
    channel_mask: u32,
    rate: f64,
    phase: [f64; NUM_CHANNELS],
    sequence: u64,
}

impl Default for DeviceState {
    /// Startup defaults: acquisition off, all channels enabled, base rate
    fn default() -> Self {
        Self {
            acq_enabled: false,
            channel_mask: 0xffff_ffff,
            rate: BASE_SAMPLE_RATE,
            phase: [0.0; NUM_CHANNELS],
            sequence: 0,
        }
    }
}

impl DeviceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acq_enabled(&self) -> bool {
        self.acq_enabled
    }

    pub fn channel_mask(&self) -> u32 {
        self.channel_mask
    }

    /// Effective sample rate in samples/sec
    ///
    /// Always `BASE_SAMPLE_RATE / f` for an accepted decimation factor `f`.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn phase(&self, channel: usize) -> f64 {
        self.phase[channel]
    }

    pub fn advance_phase(&mut self, channel: usize, delta: f64) {
        self.phase[channel] += delta;
    }

    /// Claim the next stream-frame sequence number, wrapping at 2^64
    pub fn next_sequence(&mut self) -> u64 {
        self.sequence = self.sequence.wrapping_add(1);
        self.sequence
    }

    /// Apply one register write, returning how it was handled
    pub fn apply_write(&mut self, write: RegisterWrite) -> WriteOutcome {
        match write.address {
            registers::REBOOT | registers::PPS_ALIGN | registers::FILTER => WriteOutcome::Noop,
            registers::ACQUIRE => {
                info!("set acquire {:#010x}", write.value);
                self.acq_enabled = write.value != 0;
                WriteOutcome::Applied
            }
            registers::CHANNEL_MASK => {
                info!("set channel mask {:#010x}", write.value);
                self.channel_mask = write.value;
                WriteOutcome::Applied
            }
            registers::DECIMATION => {
                if ALLOWED_DECIMATIONS.contains(&write.value) {
                    self.rate = BASE_SAMPLE_RATE / write.value as f64;
                    info!("set decimation {} ({} S/s)", write.value, self.rate);
                    WriteOutcome::Applied
                } else {
                    warn!("reject unsupported decimation factor {}", write.value);
                    WriteOutcome::Rejected
                }
            }
            other => {
                warn!(
                    "ignore write to unimplemented register {} = {}",
                    other, write.value
                );
                WriteOutcome::Rejected
            }
        }
    }
}
