//! End-to-end tests against a loopback WebSocket producer.
//!
//! Each test runs a small `tungstenite` server on an ephemeral port that
//! plays the producer side: greeting, pose frames, silence or a close.
//!
//! # Running with tracing
//!
//! ```bash
//! RUST_LOG=armlink=trace cargo test --features tracing --test client_e2e -- --nocapture
//! ```

use std::net::{TcpListener, TcpStream};
use std::sync::Once;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use approx::assert_relative_eq;
use nalgebra::Vector3;
use serial_test::serial;
use tungstenite::protocol::frame::coding::CloseCode;
use tungstenite::{Message, WebSocket};

use armlink::net::Endpoint;
use armlink::pose::encode;
use armlink::{ClientConfig, ConnectionState, Limb, LimbPose, Point3, PoseClient, PoseMessage};

static INIT_TRACING: Once = Once::new();

fn init_test_tracing() {
    INIT_TRACING.call_once(|| {
        armlink::init_tracing();
    });
}

fn listen() -> (TcpListener, Endpoint) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral");
    let endpoint = Endpoint::from(listener.local_addr().expect("local addr"));
    (listener, endpoint)
}

fn accept(listener: &TcpListener) -> WebSocket<TcpStream> {
    let (stream, _) = listener.accept().expect("accept");
    tungstenite::accept(stream).expect("websocket handshake")
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock after epoch")
        .as_secs_f64()
}

/// Left arm pointing straight along +X, right arm absent.
fn left_arm_along_x() -> String {
    let msg = PoseMessage::new(now_secs()).with_limb(
        Limb::Left,
        LimbPose::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)),
    );
    encode(&msg).expect("encode pose")
}

fn send_text(ws: &mut WebSocket<TcpStream>, text: impl Into<String>) {
    ws.send(Message::Text(text.into())).expect("send text");
}

/// Blocks until the client closes, returning the close code it sent.
fn wait_for_close(ws: &mut WebSocket<TcpStream>) -> Option<CloseCode> {
    loop {
        match ws.read() {
            Ok(Message::Close(frame)) => return frame.map(|f| f.code),
            Ok(_) => {}
            Err(_) => return None,
        }
    }
}

fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}

fn config(endpoint: Endpoint) -> ClientConfig {
    ClientConfig::new(endpoint).with_reconnect_delay(Duration::from_millis(500))
}

#[test]
#[serial]
fn left_arm_pose_reaches_limb_direction() {
    init_test_tracing();
    let (listener, endpoint) = listen();
    let server = thread::spawn(move || {
        let mut ws = accept(&listener);
        send_text(&mut ws, r#"{"status":"connected"}"#);
        send_text(&mut ws, left_arm_along_x());
        wait_for_close(&mut ws)
    });

    let client = PoseClient::new(config(endpoint)).expect("valid config");
    client.start().expect("start");

    assert!(wait_until(Duration::from_secs(2), || client.stats().poses_applied == 1));
    assert_eq!(client.connection_state(), ConnectionState::Connected);
    assert_relative_eq!(
        client.limb_direction(Limb::Left).into_inner(),
        Vector3::new(1.0, 0.0, 0.0),
        epsilon = 1e-6
    );
    assert_eq!(client.limb_direction(Limb::Right), Vector3::z_axis());

    let latency = client.latency_ms().expect("latency after a pose");
    assert!((-1000.0..2000.0).contains(&latency), "latency {latency}ms");

    let stop_at = Instant::now();
    client.stop();
    assert!(stop_at.elapsed() < Duration::from_millis(500));
    assert_eq!(client.connection_state(), ConnectionState::Disconnected);
    assert_eq!(client.latency_ms(), None);
    assert_eq!(server.join().expect("server thread"), Some(CloseCode::Normal));
}

#[test]
#[serial]
fn malformed_frame_keeps_connection() {
    init_test_tracing();
    let (listener, endpoint) = listen();
    let server = thread::spawn(move || {
        let mut ws = accept(&listener);
        send_text(&mut ws, left_arm_along_x());
        send_text(&mut ws, "not json");
        send_text(&mut ws, r#"{"timestamp":"soon","left_arm":null,"right_arm":null}"#);
        wait_for_close(&mut ws)
    });

    let client = PoseClient::new(config(endpoint)).expect("valid config");
    client.start().expect("start");

    assert!(wait_until(Duration::from_secs(2), || client.stats().decode_errors == 2));
    assert_eq!(client.connection_state(), ConnectionState::Connected);
    assert_relative_eq!(
        client.limb_direction(Limb::Left).into_inner(),
        Vector3::new(1.0, 0.0, 0.0),
        epsilon = 1e-6
    );
    assert_eq!(client.stats().connections, 1);

    client.stop();
    assert_eq!(server.join().expect("server thread"), Some(CloseCode::Normal));
}

#[test]
#[serial]
fn server_close_reconnects_after_delay() {
    init_test_tracing();
    let (listener, endpoint) = listen();
    let (events, timeline) = mpsc::channel();
    thread::spawn(move || {
        let mut ws = accept(&listener);
        send_text(&mut ws, left_arm_along_x());
        thread::sleep(Duration::from_millis(100));
        let _ = events.send(Instant::now());
        let _ = ws.close(None);
        while ws.read().is_ok() {}

        let mut ws = accept(&listener);
        let _ = events.send(Instant::now());
        wait_for_close(&mut ws);
    });

    let delay = Duration::from_millis(500);
    let client = PoseClient::new(config(endpoint).with_reconnect_delay(delay)).expect("valid config");
    client.start().expect("start");

    let closed_at = timeline.recv_timeout(Duration::from_secs(2)).expect("server closed");
    assert!(wait_until(Duration::from_secs(1), || {
        client.connection_state() == ConnectionState::Disconnected
    }));

    let reconnected_at = timeline.recv_timeout(Duration::from_secs(3)).expect("client reconnected");
    let gap = reconnected_at.duration_since(closed_at);
    assert!(gap >= delay, "reconnected after {gap:?}");
    assert!(gap < delay + Duration::from_secs(1), "reconnected after {gap:?}");

    assert!(wait_until(Duration::from_secs(1), || {
        client.connection_state().is_connected()
    }));
    // Targets survive the reconnect.
    assert_relative_eq!(
        client.limb_direction(Limb::Left).into_inner(),
        Vector3::new(1.0, 0.0, 0.0),
        epsilon = 1e-6
    );
    assert_eq!(client.stats().connections, 2);
    client.stop();
}

#[test]
#[serial]
fn silent_producer_goes_stale() {
    init_test_tracing();
    let (listener, endpoint) = listen();
    let server = thread::spawn(move || {
        let mut ws = accept(&listener);
        send_text(&mut ws, left_arm_along_x());
        wait_for_close(&mut ws)
    });

    let client = PoseClient::new(config(endpoint).with_auto_reconnect(false)).expect("valid config");
    client.start().expect("start");

    assert!(wait_until(Duration::from_secs(2), || client.stats().poses_applied == 1));
    let last_pose = Instant::now();

    assert!(wait_until(Duration::from_secs(8), || {
        client.connection_state() == ConnectionState::Disconnected
    }));
    let silent = last_pose.elapsed();
    assert!(silent >= Duration::from_millis(4500), "stale after {silent:?}");
    assert!(silent < Duration::from_secs(6), "stale after {silent:?}");

    assert_eq!(server.join().expect("server thread"), Some(CloseCode::Normal));
    assert!(wait_until(Duration::from_secs(1), || !client.is_running()));
    client.stop();
}

#[test]
#[serial]
fn refused_endpoint_reports_error() {
    init_test_tracing();
    let (listener, endpoint) = listen();
    drop(listener);

    let client = PoseClient::new(
        config(endpoint)
            .with_auto_reconnect(false)
            .with_connect_timeout(Duration::from_millis(500)),
    )
    .expect("valid config");
    client.start().expect("start");

    assert!(wait_until(Duration::from_secs(2), || client.connection_state().is_error()));
    assert!(wait_until(Duration::from_secs(1), || !client.is_running()));
    assert_eq!(client.stats().connect_attempts, 1);
    assert_eq!(client.stats().connections, 0);

    // A halted client can be started again.
    client.start().expect("restart");
    assert!(wait_until(Duration::from_secs(2), || client.stats().connect_attempts == 2));
    client.stop();
}

#[test]
#[serial]
fn repeated_start_opens_one_connection() {
    init_test_tracing();
    let (listener, endpoint) = listen();
    let server = thread::spawn(move || {
        let mut ws = accept(&listener);
        listener.set_nonblocking(true).expect("nonblocking listener");
        send_text(&mut ws, left_arm_along_x());
        let code = wait_for_close(&mut ws);
        let extra = listener.accept().is_ok();
        (code, extra)
    });

    let client = PoseClient::new(config(endpoint)).expect("valid config");
    client.start().expect("start");
    client.start().expect("second start");
    assert!(wait_until(Duration::from_secs(2), || client.stats().poses_applied == 1));
    client.start().expect("start while connected");
    thread::sleep(Duration::from_millis(200));

    assert_eq!(client.stats().connect_attempts, 1);
    client.stop();
    client.stop();

    let (code, extra) = server.join().expect("server thread");
    assert_eq!(code, Some(CloseCode::Normal));
    assert!(!extra, "a second connection was opened");
}
