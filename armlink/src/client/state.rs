//! State shared between the session thread and the consumer.
//!
//! The session thread is the only writer. Limb targets and status are
//! published by swapping whole snapshots; counters are plain atomics.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;

use crate::pose::Limb;
use crate::status::StatusReporter;
use crate::transform::UnitVector3;

/// Latest valid direction of each limb.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimbTargets {
    directions: [UnitVector3; 2],
}

impl LimbTargets {
    /// Both limbs pointing along `initial`.
    #[must_use]
    pub const fn new(initial: UnitVector3) -> Self {
        Self {
            directions: [initial; 2],
        }
    }

    #[must_use]
    pub const fn get(&self, limb: Limb) -> UnitVector3 {
        self.directions[limb.index()]
    }

    pub(crate) fn set(&mut self, limb: Limb, direction: UnitVector3) {
        self.directions[limb.index()] = direction;
    }
}

/// Counters describing a client's lifetime activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientStats {
    /// Connect attempts, including the first.
    pub connect_attempts: u64,
    /// Connections that reached `Connected`.
    pub connections: u64,
    /// Text frames received.
    pub frames_received: u64,
    /// Pose frames that updated at least one limb target.
    pub poses_applied: u64,
    /// Limb samples dropped because shoulder and wrist nearly coincide.
    pub limbs_discarded: u64,
    /// Frames dropped as malformed.
    pub decode_errors: u64,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    pub connect_attempts: AtomicU64,
    pub connections: AtomicU64,
    pub frames_received: AtomicU64,
    pub poses_applied: AtomicU64,
    pub limbs_discarded: AtomicU64,
    pub decode_errors: AtomicU64,
}

impl StatsCounters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ClientStats {
        ClientStats {
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            connections: self.connections.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            poses_applied: self.poses_applied.load(Ordering::Relaxed),
            limbs_discarded: self.limbs_discarded.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
        }
    }
}

/// Everything the session publishes.
#[derive(Debug)]
pub(crate) struct Shared {
    pub status: StatusReporter,
    pub targets: ArcSwap<LimbTargets>,
    pub stats: StatsCounters,
}

impl Shared {
    pub fn new(initial: UnitVector3) -> Self {
        Self {
            status: StatusReporter::new(),
            targets: ArcSwap::from_pointee(LimbTargets::new(initial)),
            stats: StatsCounters::default(),
        }
    }

    pub fn targets(&self) -> LimbTargets {
        **self.targets.load()
    }

    pub fn publish_targets(&self, targets: LimbTargets) {
        self.targets.store(Arc::new(targets));
    }
}
