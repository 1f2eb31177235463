use nalgebra::{Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// Pinhole camera intrinsic matrix.
///
/// Derived once from the first calibration snapshot a pipeline observes and
/// held for the process lifetime; mid-run re-derivation is not supported.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    k: Matrix3<f64>,
}

impl CameraIntrinsics {
    /// Build from focal lengths and the principal point.
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        let mut k = Matrix3::zeros();
        k[(0, 0)] = fx;
        k[(0, 2)] = cx;
        k[(1, 1)] = fy;
        k[(1, 2)] = cy;
        k[(2, 2)] = 1.0;
        Self { k }
    }

    /// Build from the row-major 3x3 `K` of a calibration message.
    ///
    /// Only the pinhole entries are read; skew is ignored.
    pub fn from_k_row_major(k: &[f64; 9]) -> Self {
        Self::new(k[0], k[4], k[2], k[5])
    }

    #[inline]
    pub fn fx(&self) -> f64 {
        self.k[(0, 0)]
    }

    #[inline]
    pub fn fy(&self) -> f64 {
        self.k[(1, 1)]
    }

    #[inline]
    pub fn cx(&self) -> f64 {
        self.k[(0, 2)]
    }

    #[inline]
    pub fn cy(&self) -> f64 {
        self.k[(1, 2)]
    }

    /// The full 3x3 intrinsic matrix.
    #[inline]
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.k
    }

    /// Reproject a 3D point in camera coordinates (meters) to integer pixel
    /// coordinates.
    ///
    /// The point is scaled to millimeters before `UVW = K * XYZ`, then
    /// `u = round(U / W)`, `v = round(V / W)`. A point on the camera plane
    /// (`W == 0`) is rejected as [`GeometryError::DegenerateDepth`].
    pub fn reproject(&self, point: &Point3<f64>) -> Result<(i32, i32), GeometryError> {
        let xyz = Vector3::new(point.x * 1000.0, point.y * 1000.0, point.z * 1000.0);
        let uvw = self.k * xyz;
        if uvw.z == 0.0 {
            return Err(GeometryError::DegenerateDepth);
        }
        Ok(((uvw.x / uvw.z).round() as i32, (uvw.y / uvw.z).round() as i32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_point_at_unit_depth() {
        let intr = CameraIntrinsics::new(1000.0, 1000.0, 320.0, 240.0);
        let px = intr.reproject(&Point3::new(0.0, 0.0, 1.0)).expect("projects");
        assert_eq!(px, (320, 240));
    }

    #[test]
    fn off_axis_point() {
        let intr = CameraIntrinsics::new(1000.0, 1000.0, 320.0, 240.0);
        // 0.1 m to the right at 1 m depth: 100 px offset from the center.
        let px = intr.reproject(&Point3::new(0.1, 0.0, 1.0)).expect("projects");
        assert_eq!(px, (420, 240));
    }

    #[test]
    fn zero_depth_is_rejected() {
        let intr = CameraIntrinsics::new(1000.0, 1000.0, 320.0, 240.0);
        let err = intr.reproject(&Point3::new(0.2, 0.1, 0.0)).unwrap_err();
        assert_eq!(err, GeometryError::DegenerateDepth);
    }

    #[test]
    fn from_row_major_reads_pinhole_entries() {
        let k = [500.0, 0.0, 319.5, 0.0, 501.0, 239.5, 0.0, 0.0, 1.0];
        let intr = CameraIntrinsics::from_k_row_major(&k);
        assert_eq!(intr.fx(), 500.0);
        assert_eq!(intr.fy(), 501.0);
        assert_eq!(intr.cx(), 319.5);
        assert_eq!(intr.cy(), 239.5);
        assert_eq!(intr.matrix()[(2, 2)], 1.0);
    }
}
