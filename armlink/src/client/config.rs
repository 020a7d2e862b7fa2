//! Client configuration.
//!
//! Everything here is fixed at construction. The defaults match the pose
//! producer's own: it serves on `ws://127.0.0.1:8765`, reports MediaPipe
//! world landmarks (Y down) and may pause for a few seconds while the camera
//! loses the body.

use std::time::Duration;

use nalgebra::Vector3;
use thiserror::Error;

use crate::net::Endpoint;
use crate::transform::{AxisPolicy, UnitVector3};

/// Silence after which an open connection is considered dead.
pub const STALE_THRESHOLD: Duration = Duration::from_secs(5);

/// Default wait between a failure and the next connect attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Default limit for TCP connect plus WebSocket handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default upper bound on a single blocking read.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default smoothing time constant.
pub const DEFAULT_SMOOTHING: Duration = Duration::from_millis(100);

/// Invalid configuration value.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("position scale must be finite and positive, got {0}")]
    InvalidScale(f32),
    #[error("poll interval must be non-zero")]
    ZeroPollInterval,
    #[error("poll interval {poll:?} must not exceed the stale threshold {stale:?}")]
    PollExceedsStale { poll: Duration, stale: Duration },
    #[error("connect timeout must be non-zero")]
    ZeroConnectTimeout,
}

/// Configuration for a [`PoseClient`](crate::PoseClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Producer address.
    pub endpoint: Endpoint,

    /// Reconnect after connect failures, transport errors, closes and stale
    /// connections. When `false` the client stops after the first failure
    /// until [`start`](crate::PoseClient::start) is called again.
    ///
    /// **Default**: `true`
    pub auto_reconnect: bool,

    /// Wait between a failure and the next connect attempt.
    ///
    /// **Default**: 5s
    pub reconnect_delay: Duration,

    /// Limit for TCP connect and, separately, for the WebSocket handshake.
    ///
    /// **Default**: 5s
    pub connect_timeout: Duration,

    /// Maximum time a single read may block. Bounds how quickly the session
    /// notices a stop request or a stale connection.
    ///
    /// **Default**: 100ms
    pub poll_interval: Duration,

    /// Producer-to-consumer axis mapping.
    ///
    /// **Default**: Y inverted, no swap, unit scale
    pub axis_policy: AxisPolicy,

    /// Time for [`PoseClient::step`](crate::PoseClient::step) to cover the
    /// full remaining angle to a target.
    ///
    /// **Default**: 100ms
    pub smoothing: Duration,

    /// Direction of both limbs before any pose arrives.
    ///
    /// **Default**: `(0, 0, 1)`
    pub initial_direction: UnitVector3,

    stale_threshold: Duration,
}

impl ClientConfig {
    /// Creates a configuration with defaults for everything but the endpoint.
    #[must_use]
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            auto_reconnect: true,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            axis_policy: AxisPolicy::default(),
            smoothing: DEFAULT_SMOOTHING,
            initial_direction: Vector3::z_axis(),
            stale_threshold: STALE_THRESHOLD,
        }
    }

    #[must_use]
    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_axis_policy(mut self, policy: AxisPolicy) -> Self {
        self.axis_policy = policy;
        self
    }

    #[must_use]
    pub fn with_smoothing(mut self, smoothing: Duration) -> Self {
        self.smoothing = smoothing;
        self
    }

    #[must_use]
    pub fn with_initial_direction(mut self, direction: UnitVector3) -> Self {
        self.initial_direction = direction;
        self
    }

    /// Overrides [`STALE_THRESHOLD`].
    ///
    /// The producer contract fixes the threshold at 5s; this exists for tests
    /// that cannot wait that long.
    #[doc(hidden)]
    #[must_use]
    pub fn with_stale_threshold(mut self, threshold: Duration) -> Self {
        self.stale_threshold = threshold;
        self
    }

    #[must_use]
    pub const fn stale_threshold(&self) -> Duration {
        self.stale_threshold
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scale = self.axis_policy.position_scale;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ConfigError::InvalidScale(scale));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.poll_interval > self.stale_threshold {
            return Err(ConfigError::PollExceedsStale {
                poll: self.poll_interval,
                stale: self.stale_threshold,
            });
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::ZeroConnectTimeout);
        }
        Ok(())
    }
}
