//! The pose client: one background session plus consumer-side smoothing.
//!
//! [`PoseClient::start`] spawns a named session thread that owns the
//! connection. The thread publishes status and limb targets into shared
//! snapshots; every accessor on the client reads those snapshots without
//! blocking the session.
//!
//! Dropping the client signals the session to stop but does not wait for it.
//! Use [`PoseClient::stop`] to stop and join.

pub mod config;
pub mod policy;
pub mod state;

mod session;

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;

pub use config::{ClientConfig, ConfigError, STALE_THRESHOLD};
pub use policy::{Failure, FailureKind, ReconnectDecision};
pub use state::{ClientStats, LimbTargets};

use self::session::Session;
use self::state::Shared;
use crate::net::{Transport, WsTransport};
use crate::pose::Limb;
use crate::smoother::OrientationSmoother;
use crate::status::{ConnectionState, StatusSnapshot};
use crate::trace::{debug, error, info};
use crate::transform::UnitVector3;

/// Error creating or starting a client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The OS refused to create the session thread.
    #[error("failed to spawn session thread: {0}")]
    Spawn(io::Error),
}

struct SessionHandle {
    shutdown: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl SessionHandle {
    fn join(self) {
        if self.handle.join().is_err() {
            error!("session thread panicked");
        }
    }
}

/// Streaming client for a pose producer.
///
/// All methods take `&self`; the client can be shared between a render loop
/// and a UI thread behind an `Arc`.
pub struct PoseClient<T: Transport = WsTransport> {
    config: Arc<ClientConfig>,
    transport: Arc<T>,
    shared: Arc<Shared>,
    smoother: Mutex<OrientationSmoother>,
    session: Mutex<Option<SessionHandle>>,
}

impl PoseClient<WsTransport> {
    /// Creates a stopped client that connects over WebSocket.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the configuration is invalid.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        Self::with_transport(config, WsTransport)
    }
}

impl<T: Transport> PoseClient<T> {
    /// Creates a stopped client on a custom transport.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the configuration is invalid.
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self, ClientError> {
        config.validate()?;
        let smoother = OrientationSmoother::new(config.smoothing, config.initial_direction);
        let shared = Shared::new(config.initial_direction);
        Ok(Self {
            config: Arc::new(config),
            transport: Arc::new(transport),
            shared: Arc::new(shared),
            smoother: Mutex::new(smoother),
            session: Mutex::new(None),
        })
    }

    /// Starts the session thread.
    ///
    /// Does nothing if a session is already running. A session that halted
    /// on its own (auto-reconnect off) is reaped and replaced.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Spawn`] if the thread cannot be created.
    pub fn start(&self) -> Result<(), ClientError> {
        let mut session = lock(&self.session);
        if let Some(running) = session.as_ref() {
            if !running.handle.is_finished() {
                debug!("start ignored, session already running");
                return Ok(());
            }
        }
        if let Some(finished) = session.take() {
            finished.join();
        }

        info!(
            endpoint = %self.config.endpoint,
            auto_reconnect = self.config.auto_reconnect,
            reconnect_delay_ms = self.config.reconnect_delay.as_millis() as u64,
            "client starting"
        );

        let shutdown = Arc::new(AtomicBool::new(false));
        let mut runner = Session::new(
            Arc::clone(&self.config),
            Arc::clone(&self.transport),
            Arc::clone(&self.shared),
            Arc::clone(&shutdown),
        );
        let handle = thread::Builder::new()
            .name("armlink-session".into())
            .spawn(move || {
                debug!("session thread started");
                runner.run();
                debug!("session thread exiting");
            })
            .map_err(ClientError::Spawn)?;

        *session = Some(SessionHandle { shutdown, handle });
        Ok(())
    }

    /// Stops the session and waits for its thread to exit.
    ///
    /// An open connection is closed with a normal close frame. Safe to call
    /// on a stopped client. The session slot stays locked until the thread
    /// has exited, so a concurrent [`start`](Self::start) waits for it.
    pub fn stop(&self) {
        let mut session = lock(&self.session);
        let Some(running) = session.take() else {
            return;
        };
        info!("client stopping");
        running.shutdown.store(true, Ordering::Release);
        running.join();
        info!(state = %self.shared.status.state(), "client stopped");
    }

    /// Whether a session thread is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        lock(&self.session)
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }

    #[must_use]
    pub fn status(&self) -> StatusSnapshot {
        self.shared.status.snapshot()
    }

    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.shared.status.state()
    }

    /// Latency of the last pose on the current connection, in milliseconds.
    #[must_use]
    pub fn latency_ms(&self) -> Option<f64> {
        self.shared.status.latency_ms()
    }

    /// Latest direction received for `limb`, unsmoothed.
    #[must_use]
    pub fn limb_direction(&self, limb: Limb) -> UnitVector3 {
        self.shared.targets().get(limb)
    }

    /// Latest directions for both limbs from the same update.
    #[must_use]
    pub fn limb_targets(&self) -> LimbTargets {
        self.shared.targets()
    }

    /// Advances the smoothed direction of `limb` by `elapsed` toward its
    /// latest target and returns it.
    ///
    /// Call once per render tick and limb.
    pub fn step(&self, limb: Limb, elapsed: Duration) -> UnitVector3 {
        let target = self.shared.targets().get(limb);
        let mut smoother = lock(&self.smoother);
        smoother.set_target(limb, target);
        smoother.step(limb, elapsed)
    }

    /// Smoothed direction of `limb` as of the last [`step`](Self::step).
    #[must_use]
    pub fn smoothed_direction(&self, limb: Limb) -> UnitVector3 {
        lock(&self.smoother).current(limb)
    }

    #[must_use]
    pub fn stats(&self) -> ClientStats {
        self.shared.stats.snapshot()
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl<T: Transport> Drop for PoseClient<T> {
    fn drop(&mut self) {
        // Signal only; the thread exits within one poll interval.
        let session = self.session.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(running) = session.as_ref() {
            running.shutdown.store(true, Ordering::Release);
        }
    }
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
