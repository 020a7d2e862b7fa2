//! Session thread: connect, receive, staleness watchdog, reconnect.
//!
//! One [`Session`] runs on one thread for the lifetime of a started client.
//! Reconnection loops inside that thread, so there is never more than one
//! connect attempt or receive loop in flight per client.
//!
//! ```text
//!            ┌──────────────────────── RetryAfter(delay) ───────────────────────┐
//!            v                                                                  │
//!  Disconnected ──> Connecting ──ok──> Connected ──close/stale──> Disconnected ─┤
//!                       │                  │                                    │
//!                       └──err──> Error <──┴──transport err                     │
//!                                   └───────────────────────────────────────────┘
//! ```
//!
//! Reads block for at most `poll_interval` (and never past the stale
//! deadline), so a stop request or a half-open connection is noticed without
//! help from the peer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use minstant::Instant;

use super::config::ClientConfig;
use super::policy::{self, Failure, FailureKind, ReconnectDecision};
use super::state::{Shared, StatsCounters};
use crate::net::{Frame, FrameSource, Transport};
use crate::pose::{Limb, PoseMessage, WireMessage, codec};
use crate::status::ConnectionState;
use crate::trace::{debug, info, trace, warn};
use crate::transform::transform;

/// Shortest read the watchdog will issue while waiting for the stale deadline.
const MIN_WAIT: Duration = Duration::from_millis(1);

pub(crate) struct Session<T: Transport> {
    config: Arc<ClientConfig>,
    transport: Arc<T>,
    shared: Arc<Shared>,
    shutdown: Arc<AtomicBool>,
}

impl<T: Transport> Session<T> {
    pub fn new(
        config: Arc<ClientConfig>,
        transport: Arc<T>,
        shared: Arc<Shared>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            config,
            transport,
            shared,
            shutdown,
        }
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Runs until stopped, or until the first failure when auto-reconnect is off.
    pub fn run(&mut self) {
        loop {
            let failure = self.connect_and_serve();
            self.shared.status.set_state(failure.state());

            match policy::decide(
                failure.kind,
                self.config.auto_reconnect,
                self.config.reconnect_delay,
            ) {
                ReconnectDecision::RetryAfter(delay) => {
                    info!(
                        reason = %failure.reason,
                        delay_ms = delay.as_millis() as u64,
                        "reconnect scheduled"
                    );
                    if !self.wait_unless_stopped(delay) {
                        break;
                    }
                }
                ReconnectDecision::Halt => {
                    info!(reason = %failure.reason, "session halted");
                    break;
                }
            }
        }

        // A stop during backoff would otherwise leave the last error visible.
        if self.shutdown_requested() {
            self.shared.status.set_state(ConnectionState::Disconnected);
        }
    }

    /// One connect attempt and, if it succeeds, the receive loop.
    fn connect_and_serve(&mut self) -> Failure {
        if self.shutdown_requested() {
            return Failure::new(FailureKind::Shutdown, "stop requested");
        }

        let endpoint = &self.config.endpoint;
        self.shared.status.set_state(ConnectionState::Connecting);
        StatsCounters::bump(&self.shared.stats.connect_attempts);
        debug!(%endpoint, "connecting");

        let mut conn = match self.transport.connect(endpoint, self.config.connect_timeout) {
            Ok(conn) => conn,
            Err(e) => {
                warn!(%endpoint, error = %e, "connect failed");
                return Failure::new(FailureKind::Connect, e.to_string());
            }
        };

        if self.shutdown_requested() {
            conn.close();
            return Failure::new(FailureKind::Shutdown, "stop requested");
        }

        self.shared.status.set_state(ConnectionState::Connected);
        StatsCounters::bump(&self.shared.stats.connections);
        info!(%endpoint, "connected");

        let failure = self.receive_loop(&mut conn);
        match failure.kind {
            FailureKind::Stale | FailureKind::Shutdown => conn.close(),
            FailureKind::Connect | FailureKind::Transport | FailureKind::Closed => {}
        }
        failure
    }

    fn receive_loop(&self, conn: &mut T::Connection) -> Failure {
        let stale_threshold = self.config.stale_threshold();
        // Connect time stands in for the first frame.
        let mut last_data = Instant::now();

        loop {
            if self.shutdown_requested() {
                return Failure::new(FailureKind::Shutdown, "stop requested");
            }

            let silent_for = last_data.elapsed();
            if silent_for > stale_threshold {
                warn!(
                    silent_ms = silent_for.as_millis() as u64,
                    "no data within stale threshold, dropping connection"
                );
                return Failure::new(
                    FailureKind::Stale,
                    format!("no data for {:.1}s", silent_for.as_secs_f64()),
                );
            }

            let until_stale = (stale_threshold - silent_for).max(MIN_WAIT);
            let timeout = self.config.poll_interval.min(until_stale);

            match conn.recv(timeout) {
                Ok(None) | Ok(Some(Frame::Other)) => {}
                Ok(Some(Frame::Text(text))) => {
                    last_data = Instant::now();
                    self.handle_text(&text);
                }
                Ok(Some(Frame::Close)) => {
                    info!("connection closed by peer");
                    return Failure::new(FailureKind::Closed, "closed by peer");
                }
                Err(e) => {
                    warn!(error = %e, "transport error");
                    return Failure::new(FailureKind::Transport, e.to_string());
                }
            }
        }
    }

    fn handle_text(&self, text: &str) {
        StatsCounters::bump(&self.shared.stats.frames_received);

        match codec::decode(text) {
            Ok(WireMessage::Pose(msg)) => self.apply_pose(&msg),
            Ok(WireMessage::Status(_status)) => {
                debug!(status = %_status.status, "producer status");
            }
            Err(_e) => {
                StatsCounters::bump(&self.shared.stats.decode_errors);
                debug!(error = %_e, len = text.len(), "dropping malformed frame");
            }
        }
    }

    /// Publishes new limb targets and latency for one decoded pose.
    ///
    /// Absent limbs and limbs with a near-zero direction keep their previous
    /// target.
    fn apply_pose(&self, msg: &PoseMessage) {
        let mut targets = self.shared.targets();
        let mut updated = false;

        for limb in Limb::ALL {
            let Some(pose) = msg.limb(limb) else {
                continue;
            };
            match transform(&pose.shoulder, &pose.wrist, &self.config.axis_policy) {
                Some(direction) => {
                    targets.set(limb, direction);
                    updated = true;
                }
                None => {
                    StatsCounters::bump(&self.shared.stats.limbs_discarded);
                    trace!(%limb, "near-zero limb direction discarded");
                }
            }
        }

        if updated {
            self.shared.publish_targets(targets);
            StatsCounters::bump(&self.shared.stats.poses_applied);
        }
        self.shared.status.set_latency(latency_ms(msg.timestamp));
    }

    /// Sleeps for `delay` in `poll_interval` slices.
    ///
    /// Returns `false` if a stop was requested meanwhile.
    fn wait_unless_stopped(&self, delay: Duration) -> bool {
        let deadline = Instant::now() + delay;
        loop {
            if self.shutdown_requested() {
                return false;
            }
            match deadline.checked_duration_since(Instant::now()) {
                Some(remaining) if !remaining.is_zero() => {
                    std::thread::sleep(remaining.min(self.config.poll_interval));
                }
                _ => return true,
            }
        }
    }
}

/// Milliseconds between the sender timestamp and now on our wall clock.
fn latency_ms(sent_at: f64) -> f64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |d| d.as_secs_f64());
    (now - sent_at) * 1000.0
}
