//! End-to-end scenarios over loopback UDP
//!
//! Each test binds a simulator on ephemeral ports, spawns its event loop,
//! and talks to it exactly as a client would: register writes on the
//! control port, an empty datagram on the data port to subscribe.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use pscsim::codec;
use pscsim::config::SimConfig;
use pscsim::constants::{MSG_READBACK, MSG_REG_WRITE, MSG_STREAM};
use pscsim::network::Simulator;
use pscsim::protocol::RegisterWrite;
use pscsim::signal::{unpack_samples, StreamHeader};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

struct Sim {
    handle: JoinHandle<()>,
    control: SocketAddr,
    data: SocketAddr,
}

impl Drop for Sim {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn start(tick_period_ms: u64, stream_timeout_ms: u64) -> Sim {
    let config = SimConfig {
        control_port: 0,
        data_port: 0,
        tick_period_ms,
        stream_timeout_ms,
        ..SimConfig::default()
    };
    let sim = Simulator::bind(&config).await.unwrap();
    let control = sim.control_addr().unwrap();
    let data = sim.data_addr().unwrap();
    let handle = tokio::spawn(async move {
        let _ = sim.run().await;
    });
    Sim {
        handle,
        control,
        data,
    }
}

async fn client() -> UdpSocket {
    UdpSocket::bind("127.0.0.1:0").await.unwrap()
}

/// Send a register write and wait for its acknowledgement
async fn write_register(sock: &UdpSocket, control: SocketAddr, address: u32, value: u32) {
    let body = RegisterWrite { address, value }.encode();
    let dgram = codec::encode(MSG_REG_WRITE, &body).unwrap();
    sock.send_to(&dgram, control).await.unwrap();

    let mut buf = [0u8; 256];
    let (len, _) = timeout(RECV_TIMEOUT, sock.recv_from(&mut buf))
        .await
        .expect("no ack within timeout")
        .unwrap();
    let (frames, err) = codec::decode_all(&buf[..len]);
    assert_eq!(err, None);
    assert_eq!(frames[0].msgid, MSG_REG_WRITE | 0x8000);
    assert_eq!(frames[0].body.as_ref(), body);
}

async fn recv_stream_frame(sock: &UdpSocket) -> (StreamHeader, Vec<i32>) {
    let mut buf = [0u8; 2048];
    let (len, _) = timeout(RECV_TIMEOUT, sock.recv_from(&mut buf))
        .await
        .expect("no stream frame within timeout")
        .unwrap();
    let (frames, err) = codec::decode_all(&buf[..len]);
    assert_eq!(err, None);
    assert_eq!(frames.len(), 1, "stream frames are sent one per datagram");
    assert_eq!(frames[0].msgid, MSG_STREAM);
    let (header, sample_bytes) = StreamHeader::decode(&frames[0].body).unwrap();
    (header, unpack_samples(sample_bytes))
}

/// True once `sock` has seen no datagrams for `window`
async fn goes_quiet(sock: &UdpSocket, window: Duration) -> bool {
    let mut buf = [0u8; 2048];
    for _ in 0..200 {
        if timeout(window, sock.recv_from(&mut buf)).await.is_err() {
            return true;
        }
    }
    false
}

#[tokio::test]
async fn single_channel_end_to_end() {
    let sim = start(20, 10_000).await;
    let ctrl = client().await;
    let subscriber = client().await;

    // decimate to 1 kS/s, enable only channel 0, start acquisition
    write_register(&ctrl, sim.control, 20, 250).await;
    write_register(&ctrl, sim.control, 11, 0x0000_0001).await;
    write_register(&ctrl, sim.control, 10, 1).await;

    subscriber.send_to(&[], sim.data).await.unwrap();

    let (header, samples) = recv_stream_frame(&subscriber).await;
    assert_eq!(header.status, 0);
    assert_eq!(header.channel_mask, 0x0000_0001);
    assert!(header.sec > 0);
    // one channel enabled: exactly one value per row, at most 15 rows
    assert!(!samples.is_empty());
    assert!(samples.len() <= 15);
}

#[tokio::test]
async fn sequence_increments_across_frames() {
    let sim = start(20, 10_000).await;
    let ctrl = client().await;
    let subscriber = client().await;

    write_register(&ctrl, sim.control, 20, 250).await;
    write_register(&ctrl, sim.control, 10, 1).await;
    subscriber.send_to(&[], sim.data).await.unwrap();

    let (first, _) = recv_stream_frame(&subscriber).await;
    let mut expected = first.sequence;
    for _ in 0..5 {
        let (header, _) = recv_stream_frame(&subscriber).await;
        expected = expected.wrapping_add(1);
        assert_eq!(header.sequence, expected);
    }
}

#[tokio::test]
async fn no_stream_without_acquisition() {
    let sim = start(20, 10_000).await;
    let ctrl = client().await;
    let subscriber = client().await;

    // subscribed, but acquisition never enabled
    write_register(&ctrl, sim.control, 20, 250).await;
    subscriber.send_to(&[], sim.data).await.unwrap();

    assert!(goes_quiet(&subscriber, Duration::from_millis(200)).await);
}

#[tokio::test]
async fn new_subscriber_takes_over_stream() {
    let sim = start(20, 10_000).await;
    let ctrl = client().await;
    let a = client().await;
    let b = client().await;

    write_register(&ctrl, sim.control, 20, 250).await;
    write_register(&ctrl, sim.control, 10, 1).await;

    a.send_to(&[], sim.data).await.unwrap();
    recv_stream_frame(&a).await;

    b.send_to(&[], sim.data).await.unwrap();
    recv_stream_frame(&b).await;

    // frames already in flight to A drain off; then A stays quiet
    assert!(goes_quiet(&a, Duration::from_millis(200)).await);
}

#[tokio::test]
async fn stream_stops_after_liveness_timeout() {
    let sim = start(20, 300).await;
    let ctrl = client().await;
    let subscriber = client().await;

    write_register(&ctrl, sim.control, 20, 250).await;
    write_register(&ctrl, sim.control, 10, 1).await;
    subscriber.send_to(&[], sim.data).await.unwrap();
    recv_stream_frame(&subscriber).await;

    // no keepalives: the destination expires and ticks emit nothing
    assert!(goes_quiet(&subscriber, Duration::from_millis(500)).await);

    // a fresh datagram re-subscribes and streaming resumes
    subscriber.send_to(&[], sim.data).await.unwrap();
    recv_stream_frame(&subscriber).await;
}

#[tokio::test]
async fn readback_replies_with_status_block() {
    let sim = start(1_000, 10_000).await;
    let ctrl = client().await;

    let dgram = codec::encode(MSG_READBACK, &[0u8; 4]).unwrap();
    ctrl.send_to(&dgram, sim.control).await.unwrap();

    let mut buf = [0u8; 256];
    let (len, _) = timeout(RECV_TIMEOUT, ctrl.recv_from(&mut buf))
        .await
        .expect("no readback reply")
        .unwrap();
    let (frames, err) = codec::decode_all(&buf[..len]);
    assert_eq!(err, None);
    assert_eq!(frames[0].msgid, MSG_READBACK);
    assert_eq!(frames[0].body.len(), 128);
    assert!(frames[0].body.iter().all(|&b| b == 0));
}

#[tokio::test]
async fn malformed_datagram_does_not_kill_the_loop() {
    let sim = start(1_000, 10_000).await;
    let ctrl = client().await;

    ctrl.send_to(b"garbage", sim.control).await.unwrap();
    ctrl.send_to(b"QS\x00\x01\x00\x00\x00\x00", sim.control)
        .await
        .unwrap();

    // the loop is still alive and answering
    write_register(&ctrl, sim.control, 11, 0xff).await;
}
