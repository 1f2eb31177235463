use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// Tolerance for the rotation-matrix precondition check.
const ROTATION_TOL: f64 = 1e-6;

/// Rigid transform of a detected marker relative to the camera.
///
/// Produced per estimator invocation; never persisted across frames.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerPose {
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
}

/// Translation plus unit quaternion `(w, x, y, z)` form of a marker pose.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoseVec7 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub qw: f64,
    pub qx: f64,
    pub qy: f64,
    pub qz: f64,
}

impl PoseVec7 {
    /// Convert a rotation + translation pose into the 7-vector form.
    pub fn from_pose(pose: &MarkerPose) -> Result<Self, GeometryError> {
        let [qw, qx, qy, qz] = rotation_to_quaternion(&pose.rotation)?;
        Ok(Self {
            x: pose.translation.x,
            y: pose.translation.y,
            z: pose.translation.z,
            qw,
            qx,
            qy,
            qz,
        })
    }

    #[inline]
    pub fn translation(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Quaternion components in `(w, x, y, z)` order.
    #[inline]
    pub fn quaternion(&self) -> [f64; 4] {
        [self.qw, self.qx, self.qy, self.qz]
    }
}

#[inline]
fn sign(x: f64) -> f64 {
    if x >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Extract a unit quaternion `(w, x, y, z)` from an orthonormal rotation
/// matrix.
///
/// Uses the four-candidate magnitude formula: the squared magnitude of each
/// component is computed from the diagonal, negative values are clamped to
/// zero before the square root to guard floating-point underflow, and the
/// largest-magnitude component is chosen as the pivot. The pivot's sign is
/// fixed positive; the remaining signs follow from the off-diagonal
/// differences and sums. The result is L2-normalized.
///
/// The input must be a proper rotation (orthonormal, determinant +1);
/// anything else is rejected as [`GeometryError::NotARotation`]. The pivot
/// branches are exhaustive for a valid rotation, so falling through them is
/// reported as [`GeometryError::PivotSelection`] rather than silently
/// returning a default.
pub fn rotation_to_quaternion(r: &Matrix3<f64>) -> Result<[f64; 4], GeometryError> {
    let det = r.determinant();
    let orthonormality = (r * r.transpose() - Matrix3::identity()).norm();
    if (det - 1.0).abs() > ROTATION_TOL || orthonormality > ROTATION_TOL {
        return Err(GeometryError::NotARotation { det });
    }

    let (r11, r12, r13) = (r[(0, 0)], r[(0, 1)], r[(0, 2)]);
    let (r21, r22, r23) = (r[(1, 0)], r[(1, 1)], r[(1, 2)]);
    let (r31, r32, r33) = (r[(2, 0)], r[(2, 1)], r[(2, 2)]);

    let mut qw = ((r11 + r22 + r33 + 1.0) / 4.0).max(0.0).sqrt();
    let mut qx = ((r11 - r22 - r33 + 1.0) / 4.0).max(0.0).sqrt();
    let mut qy = ((-r11 + r22 - r33 + 1.0) / 4.0).max(0.0).sqrt();
    let mut qz = ((-r11 - r22 + r33 + 1.0) / 4.0).max(0.0).sqrt();

    if qw >= qx && qw >= qy && qw >= qz {
        qx *= sign(r32 - r23);
        qy *= sign(r13 - r31);
        qz *= sign(r21 - r12);
    } else if qx >= qw && qx >= qy && qx >= qz {
        qw *= sign(r32 - r23);
        qy *= sign(r21 + r12);
        qz *= sign(r13 + r31);
    } else if qy >= qw && qy >= qx && qy >= qz {
        qw *= sign(r13 - r31);
        qx *= sign(r21 + r12);
        qz *= sign(r32 + r23);
    } else if qz >= qw && qz >= qx && qz >= qy {
        qw *= sign(r21 - r12);
        qx *= sign(r31 + r13);
        qy *= sign(r32 + r23);
    } else {
        return Err(GeometryError::PivotSelection);
    }

    let norm = (qw * qw + qx * qx + qy * qy + qz * qz).sqrt();
    Ok([qw / norm, qx / norm, qy / norm, qz / norm])
}

/// Rebuild the rotation matrix from a unit quaternion `(w, x, y, z)`.
pub fn quaternion_to_rotation(q: &[f64; 4]) -> Matrix3<f64> {
    let [w, x, y, z] = *q;
    Matrix3::new(
        1.0 - 2.0 * (y * y + z * z),
        2.0 * (x * y - w * z),
        2.0 * (x * z + w * y),
        2.0 * (x * y + w * z),
        1.0 - 2.0 * (x * x + z * z),
        2.0 * (y * z - w * x),
        2.0 * (x * z - w * y),
        2.0 * (y * z + w * x),
        1.0 - 2.0 * (x * x + y * y),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Rotation3, Unit, Vector3};

    fn quaternion_norm(q: &[f64; 4]) -> f64 {
        q.iter().map(|c| c * c).sum::<f64>().sqrt()
    }

    #[test]
    fn identity_picks_the_scalar_pivot() {
        let q = rotation_to_quaternion(&Matrix3::identity()).expect("valid rotation");
        assert_relative_eq!(q[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(q[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(q[2], 0.0, epsilon = 1e-12);
        assert_relative_eq!(q[3], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn half_turns_exercise_the_vector_pivots() {
        // A 180 degree turn about each axis forces the corresponding vector
        // component to be the largest magnitude.
        for (axis, expect_idx) in [
            (Vector3::x_axis(), 1usize),
            (Vector3::y_axis(), 2),
            (Vector3::z_axis(), 3),
        ] {
            let rot = Rotation3::from_axis_angle(&axis, std::f64::consts::PI);
            let q = rotation_to_quaternion(rot.matrix()).expect("valid rotation");
            assert_relative_eq!(q[expect_idx].abs(), 1.0, epsilon = 1e-9);
            assert!(q[expect_idx] > 0.0, "pivot component must be positive");
        }
    }

    #[test]
    fn round_trips_general_rotations() {
        let axes = [
            Vector3::new(1.0, 0.4, -0.3),
            Vector3::new(-0.2, 1.0, 0.9),
            Vector3::new(0.5, -0.8, 1.0),
        ];
        let angles = [0.1, 1.2, 2.5, 3.0];
        for axis in axes {
            let axis = Unit::new_normalize(axis);
            for angle in angles {
                let rot = Rotation3::from_axis_angle(&axis, angle);
                let q = rotation_to_quaternion(rot.matrix()).expect("valid rotation");
                assert_relative_eq!(quaternion_norm(&q), 1.0, epsilon = 1e-12);
                let back = quaternion_to_rotation(&q);
                assert_relative_eq!(back, *rot.matrix(), epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn scaled_matrix_is_rejected() {
        let err = rotation_to_quaternion(&(Matrix3::identity() * 2.0)).unwrap_err();
        assert!(matches!(err, GeometryError::NotARotation { .. }));
    }

    #[test]
    fn reflection_is_rejected() {
        // Orthonormal but determinant -1.
        let mut m = Matrix3::identity();
        m[(2, 2)] = -1.0;
        let err = rotation_to_quaternion(&m).unwrap_err();
        assert!(matches!(err, GeometryError::NotARotation { .. }));
    }

    #[test]
    fn pose_vec7_carries_translation_through() {
        let pose = MarkerPose {
            rotation: Matrix3::identity(),
            translation: Vector3::new(0.0, 0.0, 1.0),
        };
        let vec7 = PoseVec7::from_pose(&pose).expect("valid pose");
        assert_eq!(vec7.translation(), [0.0, 0.0, 1.0]);
        assert_eq!(vec7.quaternion(), [1.0, 0.0, 0.0, 0.0]);
    }
}
