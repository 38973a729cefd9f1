//! The simulator event loop
//!
//! Both receive paths, the periodic waveform tick and the subscriber
//! liveness deadline are multiplexed with `select!` on a single task, so
//! all state is plain owned data. A slow handler therefore delays the
//! tick; that matches the reference device and is accepted.

use std::net::SocketAddr;
use std::time::SystemTime;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::SimConfig;
use crate::control;
use crate::device::DeviceState;
use crate::error::Result;
use crate::network::subscriber::{SubscriberSlot, Touch};
use crate::signal::{generator, packetizer};

/// Large enough for the worst-case control burst in one datagram
const RECV_BUF_LEN: usize = 64 * 1024;

/// Send buffer on the data socket; a full-rate tick emits ~1700 frames
const DATA_SNDBUF: usize = 4 * 1024 * 1024;

pub struct Simulator {
    period: Duration,
    control_sock: UdpSocket,
    data_sock: UdpSocket,
    device: DeviceState,
    subscriber: SubscriberSlot,
}

impl Simulator {
    /// Bind both channels; the device starts idle (acquisition off)
    pub async fn bind(config: &SimConfig) -> Result<Self> {
        config.validate()?;

        let control_sock =
            UdpSocket::bind(SocketAddr::new(config.bind_address, config.control_port)).await?;
        let data_sock = data_socket(SocketAddr::new(config.bind_address, config.data_port))?;

        info!("control addr: {}", control_sock.local_addr()?);
        info!("data addr: {}", data_sock.local_addr()?);

        Ok(Self {
            period: config.tick_period(),
            control_sock,
            data_sock,
            device: DeviceState::new(),
            subscriber: SubscriberSlot::new(config.stream_timeout()),
        })
    }

    pub fn control_addr(&self) -> Result<SocketAddr> {
        Ok(self.control_sock.local_addr()?)
    }

    pub fn data_addr(&self) -> Result<SocketAddr> {
        Ok(self.data_sock.local_addr()?)
    }

    /// Run until the owning task is cancelled
    ///
    /// Dropping the returned future (e.g. when the binary's shutdown
    /// signal wins a `select!`) cancels the pending tick and liveness
    /// deadlines; UDP sends are fire-and-forget, nothing needs draining.
    pub async fn run(mut self) -> Result<()> {
        let mut ctrl_buf = vec![0u8; RECV_BUF_LEN];
        let mut data_buf = vec![0u8; RECV_BUF_LEN];
        let mut next_tick = Instant::now() + self.period;

        loop {
            let liveness = self.subscriber.deadline();

            tokio::select! {
                recv = self.control_sock.recv_from(&mut ctrl_buf) => match recv {
                    Ok((len, src)) => self.on_control(&ctrl_buf[..len], src).await,
                    Err(err) => warn!("control recv error: {err}"),
                },

                recv = self.data_sock.recv_from(&mut data_buf) => match recv {
                    // payload is ignored; any datagram is a subscription
                    Ok((_, src)) => match self.subscriber.observe(src, Instant::now()) {
                        Touch::Subscribed => info!("stream subscriber {src}"),
                        Touch::Switched { previous } => {
                            info!("switch stream {previous} -> {src}")
                        }
                        Touch::Refreshed => debug!("stream keepalive from {src}"),
                    },
                    Err(err) => warn!("data recv error: {err}"),
                },

                _ = sleep_until(next_tick) => {
                    // Reschedule from now, not from the previous deadline:
                    // tick cost accumulates as drift, like the reference
                    // device.
                    next_tick = Instant::now() + self.period;
                    self.tick().await;
                }

                _ = sleep_until(liveness.unwrap_or_else(Instant::now)), if liveness.is_some() => {
                    if let Some(addr) = self.subscriber.expire(Instant::now()) {
                        warn!("stream timeout {addr}");
                    }
                }
            }
        }
    }

    async fn on_control(&mut self, payload: &[u8], src: SocketAddr) {
        debug!("control datagram: {} bytes from {src}", payload.len());
        for reply in control::process_datagram(&mut self.device, payload) {
            if let Err(err) = self.control_sock.send_to(&reply, src).await {
                warn!("control reply to {src} failed: {err}");
            }
        }
    }

    /// One scheduler firing: synthesize, packetize, send
    async fn tick(&mut self) {
        let Some(dest) = self.subscriber.addr() else {
            return;
        };
        if !self.device.acq_enabled() {
            return;
        }

        let wall = SystemTime::now();
        let batch = generator::generate(&mut self.device, self.period);
        match packetizer::packetize(&mut self.device, &batch, wall) {
            Ok(frames) => {
                debug!("tick: {} rows in {} frames -> {dest}", batch.rows, frames.len());
                for frame in frames {
                    // best-effort, no retries
                    if let Err(err) = self.data_sock.send_to(&frame, dest).await {
                        warn!("stream send to {dest} failed: {err}");
                    }
                }
            }
            Err(err) => warn!("packetize failed: {err}"),
        }
    }
}

/// Build the data socket with a deep send buffer before handing it to
/// tokio
fn data_socket(bind: SocketAddr) -> Result<UdpSocket> {
    let socket = Socket::new(Domain::for_address(bind), Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_send_buffer_size(DATA_SNDBUF)?;
    socket.set_nonblocking(true)?;
    socket.bind(&bind.into())?;
    Ok(UdpSocket::from_std(socket.into())?)
}
