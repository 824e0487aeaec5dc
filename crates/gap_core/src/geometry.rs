//! # Geometry Kernel
//!
//! Stateless vector and angle math shared by every analyzer.
//!
//! ## Conventions
//! - World units are replay units (the same frame as the zone tables).
//! - `yaw = 0°` looks down +X, yaw rotates counter-clockwise in the XY plane.
//! - Positive pitch looks down (`z = -sin(pitch)`).
//!
//! ## Occlusion
//! Smoke blocking is a sphere/segment approximation. There is no level
//! geometry: walls, boxes and doors never block a sightline here. This is a
//! known simplification, not a bug.

use crate::error::GeometryError;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// World-space vector (replay units).
pub type Vec3 = Vector3<f64>;

/// Pitch is clamped to this magnitude before conversion.
pub const MAX_PITCH_DEG: f64 = 89.0;

/// Slack for boundary-inclusive angle comparisons.
pub const ANGLE_EPSILON_DEG: f64 = 1e-9;

/// View angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ViewAngles {
    pub pitch: f64,
    pub yaw: f64,
}

impl ViewAngles {
    pub fn new(pitch: f64, yaw: f64) -> Self {
        Self { pitch, yaw }
    }
}

/// Time-bounded sphere that blocks sightlines while active (e.g. a smoke).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OcclusionVolume {
    pub center: Vec3,
    pub radius: f64,
    /// First tick the volume blocks (detonation)
    pub start_tick: i64,
    /// Last tick the volume blocks (inclusive)
    pub end_tick: i64,
}

impl OcclusionVolume {
    pub fn is_active(&self, tick: i64) -> bool {
        self.start_tick <= tick && tick <= self.end_tick
    }
}

/// Convert view angles to a unit direction vector.
pub fn to_direction(angles: ViewAngles) -> Vec3 {
    let pitch = angles.pitch.clamp(-MAX_PITCH_DEG, MAX_PITCH_DEG).to_radians();
    let yaw = angles.yaw.to_radians();

    Vec3::new(pitch.cos() * yaw.cos(), pitch.cos() * yaw.sin(), -pitch.sin())
}

/// Angle between two vectors in degrees.
///
/// The cosine is clamped to [-1, 1] so floating-point drift never yields NaN.
pub fn angle_between(a: &Vec3, b: &Vec3) -> Result<f64, GeometryError> {
    let a = a.try_normalize(f64::EPSILON).ok_or(GeometryError::DegenerateGeometry)?;
    let b = b.try_normalize(f64::EPSILON).ok_or(GeometryError::DegenerateGeometry)?;

    let cos = a.dot(&b).clamp(-1.0, 1.0);
    Ok(cos.acos().to_degrees())
}

/// Boundary-inclusive field-of-view test.
///
/// True iff the angle between `view_dir` and `target_dir` is at most half
/// of `fov_degrees`. A zero-length target direction is never in view.
pub fn is_within_fov(view_dir: &Vec3, target_dir: &Vec3, fov_degrees: f64) -> bool {
    match angle_between(view_dir, target_dir) {
        Ok(angle) => angle <= fov_degrees / 2.0 + ANGLE_EPSILON_DEG,
        Err(_) => false,
    }
}

/// How far the shooter's crosshair was from the target, in degrees.
///
/// 0° means the crosshair was already on the target. Fails with
/// `DegenerateGeometry` when shooter and target coincide.
pub fn aim_offset_angle(
    angles: ViewAngles,
    shooter_pos: &Vec3,
    target_pos: &Vec3,
) -> Result<f64, GeometryError> {
    let to_target = target_pos - shooter_pos;
    angle_between(&to_direction(angles), &to_target)
}

/// Shortest distance from `point` to the segment `start..end`.
pub fn segment_point_distance(start: &Vec3, end: &Vec3, point: &Vec3) -> f64 {
    let seg = end - start;
    let len_sq = seg.norm_squared();
    if len_sq <= f64::EPSILON {
        return (point - start).norm();
    }

    let t = ((point - start).dot(&seg) / len_sq).clamp(0.0, 1.0);
    let closest = start + seg * t;
    (point - closest).norm()
}

/// True when no occluder active at `tick` intersects the segment.
pub fn is_occlusion_clear(
    ray_start: &Vec3,
    ray_end: &Vec3,
    occluders: &[OcclusionVolume],
    tick: i64,
) -> bool {
    occluders
        .iter()
        .filter(|vol| vol.is_active(tick))
        .all(|vol| segment_point_distance(ray_start, ray_end, &vol.center) > vol.radius)
}

/// Euclidean distance in 3D.
#[inline]
pub fn distance(a: &Vec3, b: &Vec3) -> f64 {
    (a - b).norm()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_yaw_zero_is_forward_x() {
        let dir = to_direction(ViewAngles::new(0.0, 0.0));
        assert!(approx(dir.x, 1.0) && approx(dir.y, 0.0) && approx(dir.z, 0.0));

        let left = to_direction(ViewAngles::new(0.0, 90.0));
        assert!(approx(left.y, 1.0), "yaw 90 should look down +Y: {:?}", left);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let straight_down = to_direction(ViewAngles::new(120.0, 0.0));
        let clamped = to_direction(ViewAngles::new(89.0, 0.0));
        assert!(approx(straight_down.z, clamped.z));
        assert!(straight_down.x > 0.0, "clamped pitch keeps a horizontal component");
    }

    #[test]
    fn test_fov_boundary_inclusive() {
        let view = Vec3::new(1.0, 0.0, 0.0);
        let side = Vec3::new(0.0, 1.0, 0.0);
        assert!(is_within_fov(&view, &side, 180.0));
        assert!(!is_within_fov(&view, &side, 179.0));

        let diag = Vec3::new(1.0, 1.0, 0.0);
        assert!(is_within_fov(&view, &diag, 90.0));
    }

    #[test]
    fn test_fov_degenerate_target_not_visible() {
        let view = Vec3::new(1.0, 0.0, 0.0);
        assert!(!is_within_fov(&view, &Vec3::zeros(), 90.0));
    }

    #[test]
    fn test_aim_offset_facing_away() {
        let offset = aim_offset_angle(
            ViewAngles::new(0.0, 180.0),
            &Vec3::new(0.0, 0.0, 0.0),
            &Vec3::new(500.0, 0.0, 0.0),
        )
        .unwrap();
        assert!(approx(offset, 180.0), "offset = {}", offset);
    }

    #[test]
    fn test_aim_offset_coincident_is_degenerate() {
        let p = Vec3::new(10.0, 10.0, 0.0);
        let result = aim_offset_angle(ViewAngles::default(), &p, &p);
        assert_eq!(result, Err(GeometryError::DegenerateGeometry));
    }

    #[test]
    fn test_smoke_blocks_only_while_active() {
        let smoke = OcclusionVolume {
            center: Vec3::new(500.0, 100.0, 0.0),
            radius: 144.0,
            start_tick: 100,
            end_tick: 200,
        };
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(1000.0, 0.0, 0.0);

        assert!(!is_occlusion_clear(&a, &b, &[smoke], 150));
        assert!(is_occlusion_clear(&a, &b, &[smoke], 99));
        assert!(is_occlusion_clear(&a, &b, &[smoke], 201));
    }

    #[test]
    fn test_smoke_radius_boundary_blocks() {
        let smoke = OcclusionVolume {
            center: Vec3::new(500.0, 100.0, 0.0),
            radius: 100.0,
            start_tick: 0,
            end_tick: 10,
        };
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(1000.0, 0.0, 0.0);
        assert!(!is_occlusion_clear(&a, &b, &[smoke], 5), "distance == radius blocks");
    }

    #[test]
    fn test_smoke_behind_segment_end_does_not_block() {
        let smoke = OcclusionVolume {
            center: Vec3::new(1500.0, 0.0, 0.0),
            radius: 250.0,
            start_tick: 0,
            end_tick: 10,
        };
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(1000.0, 0.0, 0.0);
        assert!(is_occlusion_clear(&a, &b, &[smoke], 5));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn unit_vec() -> impl Strategy<Value = Vec3> {
            (-1.0f64..1.0, -1.0f64..1.0, -1.0f64..1.0)
                .prop_filter("non-zero", |(x, y, z)| x * x + y * y + z * z > 1e-3)
                .prop_map(|(x, y, z)| Vec3::new(x, y, z).normalize())
        }

        proptest! {
            /// Property: a vector against itself has zero offset
            #[test]
            fn prop_self_angle_is_zero(v in unit_vec()) {
                let angle = angle_between(&v, &v).unwrap();
                prop_assert!(angle < 1e-4, "angle = {}", angle);
            }

            /// Property: a vector against its negation is 180 degrees
            #[test]
            fn prop_opposite_angle_is_180(v in unit_vec()) {
                let angle = angle_between(&v, &-v).unwrap();
                prop_assert!((angle - 180.0).abs() < 1e-4, "angle = {}", angle);
            }

            /// Property: directions are unit length for any input angles
            #[test]
            fn prop_direction_is_unit(pitch in -180.0f64..180.0, yaw in -720.0f64..720.0) {
                let dir = to_direction(ViewAngles::new(pitch, yaw));
                prop_assert!((dir.norm() - 1.0).abs() < 1e-9);
            }

            /// Property: an inactive occluder never blocks
            #[test]
            fn prop_inactive_occluder_never_blocks(
                x in -2000.0f64..2000.0,
                y in -2000.0f64..2000.0,
                tick in 0i64..1000
            ) {
                let smoke = OcclusionVolume {
                    center: Vec3::new(x, y, 0.0),
                    radius: 250.0,
                    start_tick: 2000,
                    end_tick: 3000,
                };
                prop_assert!(is_occlusion_clear(&Vec3::zeros(), &Vec3::new(x, y, 0.0), &[smoke], tick));
            }
        }
    }
}
