//! UDP transport: control/data sockets, subscriber lifecycle, event loop

pub mod server;
pub mod subscriber;

pub use server::Simulator;
pub use subscriber::{SubscriberSlot, Touch};
