//! Telemetry destination discovery and liveness
//!
//! Any datagram on the data port is a subscription request; its payload
//! is never inspected. At most one destination is live at a time, held as
//! an owned option together with its deadline — replacing the slot
//! replaces the deadline, so a stale timeout can never clear a newer
//! subscriber.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::time::Instant;

/// The currently subscribed telemetry destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamDestination {
    pub addr: SocketAddr,
    pub deadline: Instant,
}

/// What a data-channel datagram did to the slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Touch {
    /// First subscriber since startup or since the last timeout
    Subscribed,
    /// A different address took over the stream
    Switched { previous: SocketAddr },
    /// Existing subscriber re-armed its deadline
    Refreshed,
}

/// Holder of the zero-or-one live destination
#[derive(Debug)]
pub struct SubscriberSlot {
    timeout: Duration,
    current: Option<StreamDestination>,
}

impl SubscriberSlot {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            current: None,
        }
    }

    pub fn addr(&self) -> Option<SocketAddr> {
        self.current.map(|d| d.addr)
    }

    /// Deadline the event loop should wake at, if a destination is live
    pub fn deadline(&self) -> Option<Instant> {
        self.current.map(|d| d.deadline)
    }

    /// Record a datagram from `addr` arriving at `now`
    pub fn observe(&mut self, addr: SocketAddr, now: Instant) -> Touch {
        let deadline = now + self.timeout;
        match &mut self.current {
            Some(dest) if dest.addr == addr => {
                dest.deadline = deadline;
                Touch::Refreshed
            }
            Some(dest) => {
                let previous = dest.addr;
                *dest = StreamDestination { addr, deadline };
                Touch::Switched { previous }
            }
            None => {
                self.current = Some(StreamDestination { addr, deadline });
                Touch::Subscribed
            }
        }
    }

    /// Clear the destination if its deadline has passed
    ///
    /// Returns the address that timed out. Not an error: streaming simply
    /// stops until a new subscriber appears.
    pub fn expire(&mut self, now: Instant) -> Option<SocketAddr> {
        match self.current {
            Some(dest) if now >= dest.deadline => {
                self.current = None;
                Some(dest.addr)
            }
            _ => None,
        }
    }
}
