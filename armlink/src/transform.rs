//! Coordinate transformer: producer landmarks to limb directions.
//!
//! The producer reports positions in its own camera/world frame (MediaPipe
//! world landmarks have +Y pointing down). [`AxisPolicy`] maps them into the
//! consumer's frame:
//!
//! 1. per-axis sign inversion on the raw components,
//! 2. optional Y/Z swap of the inverted components,
//! 3. `position_scale` multiply (after inversion, independent of it).
//!
//! A limb direction is `wrist - shoulder` in that frame. Directions shorter
//! than [`MIN_DIRECTION_NORM`] (measured before scaling) are noise and yield
//! `None`, so the caller keeps its previous target.

use nalgebra::{Unit, Vector3};

use crate::pose::Point3;

/// Unit-length direction vector.
pub type UnitVector3 = Unit<Vector3<f32>>;

/// Minimum shoulder→wrist distance, in producer units, for a valid direction.
pub const MIN_DIRECTION_NORM: f32 = 0.01;

/// Axis mapping from the producer frame to the consumer frame.
///
/// Set once at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisPolicy {
    pub invert_x: bool,
    pub invert_y: bool,
    pub invert_z: bool,
    /// Exchange Y and Z after inversion.
    pub swap_yz: bool,
    /// Multiplier for absolute positions.
    ///
    /// It cancels out of normalized directions but is still applied so
    /// [`transform_positions`] and [`transform`] share one pipeline.
    pub position_scale: f32,
}

impl AxisPolicy {
    /// No inversion, no swap, unit scale.
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            invert_x: false,
            invert_y: false,
            invert_z: false,
            swap_yz: false,
            position_scale: 1.0,
        }
    }

    #[must_use]
    pub const fn with_inversion(mut self, x: bool, y: bool, z: bool) -> Self {
        self.invert_x = x;
        self.invert_y = y;
        self.invert_z = z;
        self
    }

    #[must_use]
    pub const fn with_swap_yz(mut self, swap: bool) -> Self {
        self.swap_yz = swap;
        self
    }

    #[must_use]
    pub const fn with_position_scale(mut self, scale: f32) -> Self {
        self.position_scale = scale;
        self
    }

    /// Inverts and swaps a raw point. Scale is not applied.
    #[must_use]
    pub fn orient(&self, p: &Point3) -> Vector3<f32> {
        let flip = |invert: bool, v: f32| if invert { -v } else { v };
        let mut v = Vector3::new(
            flip(self.invert_x, p.x),
            flip(self.invert_y, p.y),
            flip(self.invert_z, p.z),
        );
        if self.swap_yz {
            v.swap_rows(1, 2);
        }
        v
    }

    /// Full position mapping: [`orient`](Self::orient) then scale.
    #[must_use]
    pub fn position(&self, p: &Point3) -> Vector3<f32> {
        self.orient(p) * self.position_scale
    }
}

/// Default policy: Y inverted (producer Y points down), unit scale.
impl Default for AxisPolicy {
    fn default() -> Self {
        Self::identity().with_inversion(false, true, false)
    }
}

/// Absolute shoulder and wrist positions in the consumer frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimbPositions {
    pub shoulder: Vector3<f32>,
    pub wrist: Vector3<f32>,
}

/// Maps both landmarks of a limb into the consumer frame, scale included.
#[must_use]
pub fn transform_positions(shoulder: &Point3, wrist: &Point3, policy: &AxisPolicy) -> LimbPositions {
    LimbPositions {
        shoulder: policy.position(shoulder),
        wrist: policy.position(wrist),
    }
}

/// Computes the unit shoulder→wrist direction under `policy`.
///
/// Only the axis mapping applies; `position_scale` does not affect the
/// direction, whatever its sign.
///
/// Returns `None` when the landmarks are closer than [`MIN_DIRECTION_NORM`]
/// or the positions are not finite.
#[must_use]
pub fn transform(shoulder: &Point3, wrist: &Point3, policy: &AxisPolicy) -> Option<UnitVector3> {
    let direction = policy.orient(wrist) - policy.orient(shoulder);
    // Negated comparison so NaN is rejected too.
    if !(direction.norm() >= MIN_DIRECTION_NORM) {
        return None;
    }
    if !direction.iter().all(|c| c.is_finite()) {
        return None;
    }
    Unit::try_new(direction, f32::EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f32, y: f32, z: f32) -> Point3 {
        Point3::new(x, y, z)
    }

    /// Deterministic spread of landmark pairs across a few metres.
    fn sample_pairs() -> Vec<(Point3, Point3)> {
        let mut seed: u32 = 0x2545_f491;
        let mut next = move || {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            (seed as f32 / u32::MAX as f32) * 4.0 - 2.0
        };
        (0..256)
            .map(|_| (p(next(), next(), next()), p(next(), next(), next())))
            .collect()
    }

    #[test]
    fn concrete_left_arm_direction() {
        let dir = transform(&p(0.0, 0.0, 0.0), &p(1.0, 0.0, 0.0), &AxisPolicy::identity()).unwrap();
        assert_relative_eq!(dir.into_inner(), Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-6);

        // Default policy only flips Y; a purely horizontal arm is unaffected.
        let dir = transform(&p(0.0, 0.0, 0.0), &p(1.0, 0.0, 0.0), &AxisPolicy::default()).unwrap();
        assert_relative_eq!(dir.into_inner(), Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn output_is_unit_length() {
        let policies = [
            AxisPolicy::identity(),
            AxisPolicy::default(),
            AxisPolicy::identity().with_inversion(true, true, true).with_swap_yz(true),
            AxisPolicy::default().with_position_scale(37.5),
        ];
        for policy in &policies {
            for (s, w) in sample_pairs() {
                if let Some(dir) = transform(&s, &w, policy) {
                    assert!((dir.norm() - 1.0).abs() < 1e-5, "norm {} for {s:?} {w:?}", dir.norm());
                }
            }
        }
    }

    #[test]
    fn coincident_points_yield_none() {
        let policy = AxisPolicy::default();
        assert!(transform(&p(0.3, 0.3, 0.3), &p(0.3, 0.3, 0.3), &policy).is_none());
        assert!(transform(&p(0.0, 0.0, 0.0), &p(0.005, 0.005, 0.0), &policy).is_none());
        assert!(transform(&p(0.0, 0.0, 0.0), &p(0.0, 0.0, 0.011), &policy).is_some());
    }

    #[test]
    fn threshold_is_measured_before_scaling() {
        let tiny = AxisPolicy::identity().with_position_scale(1000.0);
        assert!(transform(&p(0.0, 0.0, 0.0), &p(0.005, 0.0, 0.0), &tiny).is_none());

        let shrink = AxisPolicy::identity().with_position_scale(0.001);
        let dir = transform(&p(0.0, 0.0, 0.0), &p(0.0, 0.5, 0.0), &shrink).unwrap();
        assert_relative_eq!(dir.into_inner(), Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn inversion_negates_exactly_flagged_axes() {
        let base = AxisPolicy::identity();
        for (s, w) in sample_pairs() {
            let Some(reference) = transform(&s, &w, &base) else {
                continue;
            };
            for mask in 0..8u8 {
                let (ix, iy, iz) = (mask & 1 != 0, mask & 2 != 0, mask & 4 != 0);
                let policy = base.with_inversion(ix, iy, iz);
                let dir = transform(&s, &w, &policy).unwrap();
                let sign = |flag: bool| if flag { -1.0 } else { 1.0 };
                assert_relative_eq!(dir.x, sign(ix) * reference.x, epsilon = 1e-6);
                assert_relative_eq!(dir.y, sign(iy) * reference.y, epsilon = 1e-6);
                assert_relative_eq!(dir.z, sign(iz) * reference.z, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn inversion_is_self_inverse() {
        let policy = AxisPolicy::identity().with_inversion(true, false, true);
        let point = p(0.25, -0.5, 0.75);
        let once = policy.orient(&point);
        let twice = policy.orient(&Point3::new(once.x, once.y, once.z));
        assert_relative_eq!(twice, Vector3::new(0.25, -0.5, 0.75));
    }

    #[test]
    fn swap_exchanges_y_and_z_after_inversion() {
        let inverted = AxisPolicy::default();
        let swapped = inverted.with_swap_yz(true);
        for (s, w) in sample_pairs() {
            let Some(plain) = transform(&s, &w, &inverted) else {
                continue;
            };
            let dir = transform(&s, &w, &swapped).unwrap();
            assert_relative_eq!(dir.x, plain.x, epsilon = 1e-6);
            assert_relative_eq!(dir.y, plain.z, epsilon = 1e-6);
            assert_relative_eq!(dir.z, plain.y, epsilon = 1e-6);
        }
    }

    #[test]
    fn scale_does_not_change_direction() {
        let s = p(0.1, 0.2, 0.3);
        let w = p(-0.4, 0.9, 0.0);
        let unit = transform(&s, &w, &AxisPolicy::default()).unwrap();
        let scaled = transform(&s, &w, &AxisPolicy::default().with_position_scale(12.0)).unwrap();
        assert_relative_eq!(unit.into_inner(), scaled.into_inner(), epsilon = 1e-5);
    }

    #[test]
    fn negative_scale_does_not_flip_direction() {
        let (s, w) = (p(0.1, 0.2, 0.3), p(0.4, -0.1, 0.9));
        let policy = AxisPolicy::default();
        let unit = transform(&s, &w, &policy).unwrap();
        let flipped = transform(&s, &w, &policy.with_position_scale(-3.0)).unwrap();
        assert_relative_eq!(unit.into_inner(), flipped.into_inner(), epsilon = 1e-6);
    }

    #[test]
    fn positions_apply_scale_after_inversion() {
        let policy = AxisPolicy::default().with_swap_yz(true).with_position_scale(2.0);
        let out = transform_positions(&p(1.0, 2.0, 3.0), &p(-1.0, 0.5, 0.0), &policy);
        // (1, 2, 3) -> invert y (1, -2, 3) -> swap (1, 3, -2) -> scale (2, 6, -4)
        assert_relative_eq!(out.shoulder, Vector3::new(2.0, 6.0, -4.0));
        assert_relative_eq!(out.wrist, Vector3::new(-2.0, 0.0, -1.0));
    }
}
