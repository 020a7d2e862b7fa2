//! Time-based orientation smoothing toward the latest limb targets.
//!
//! Each call to [`OrientationSmoother::step`] rotates the current direction
//! toward the target by a fraction `elapsed / smoothing` of the remaining
//! angle (clamped to 1). Repeated steps approach the target exponentially;
//! a single step never passes it.

use std::time::Duration;

use nalgebra::{Unit, UnitQuaternion, Vector3};

use crate::pose::Limb;
use crate::transform::UnitVector3;

/// Angles below this are treated as already aligned (radians).
const ALIGNED_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy)]
struct LimbState {
    current: UnitVector3,
    target: UnitVector3,
}

/// Per-limb current/target directions with slerp stepping.
#[derive(Debug, Clone)]
pub struct OrientationSmoother {
    smoothing: Duration,
    limbs: [LimbState; 2],
}

impl OrientationSmoother {
    /// Creates a smoother with both limbs resting at `initial`.
    ///
    /// A zero `smoothing` makes every non-zero step snap to the target.
    #[must_use]
    pub fn new(smoothing: Duration, initial: UnitVector3) -> Self {
        let rest = LimbState {
            current: initial,
            target: initial,
        };
        Self {
            smoothing,
            limbs: [rest; 2],
        }
    }

    #[must_use]
    pub const fn smoothing(&self) -> Duration {
        self.smoothing
    }

    pub fn set_target(&mut self, limb: Limb, direction: UnitVector3) {
        self.limbs[limb.index()].target = direction;
    }

    #[must_use]
    pub fn target(&self, limb: Limb) -> UnitVector3 {
        self.limbs[limb.index()].target
    }

    #[must_use]
    pub fn current(&self, limb: Limb) -> UnitVector3 {
        self.limbs[limb.index()].current
    }

    /// Advances `limb` by `elapsed` and returns its new direction.
    ///
    /// `elapsed == 0` leaves the state untouched.
    pub fn step(&mut self, limb: Limb, elapsed: Duration) -> UnitVector3 {
        let state = &mut self.limbs[limb.index()];
        if elapsed.is_zero() {
            return state.current;
        }

        let fraction = if self.smoothing.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f32() / self.smoothing.as_secs_f32()).min(1.0)
        };
        state.current = rotate_toward(&state.current, &state.target, fraction);
        state.current
    }
}

/// Rotates `from` by `fraction` of the angle to `to` about their common normal.
///
/// Opposite vectors have no unique normal; any perpendicular axis is used.
fn rotate_toward(from: &UnitVector3, to: &UnitVector3, fraction: f32) -> UnitVector3 {
    let angle = from.dot(&**to).clamp(-1.0, 1.0).acos();
    if angle < ALIGNED_EPSILON {
        return *to;
    }
    if fraction >= 1.0 {
        return *to;
    }

    let axis = Unit::try_new(from.cross(&**to), ALIGNED_EPSILON).unwrap_or_else(|| perpendicular(from));
    let rotation = UnitQuaternion::from_axis_angle(&axis, angle * fraction);
    Unit::new_normalize(rotation * from.into_inner())
}

fn perpendicular(v: &UnitVector3) -> UnitVector3 {
    let helper = if v.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    Unit::new_normalize(v.cross(&helper))
}
