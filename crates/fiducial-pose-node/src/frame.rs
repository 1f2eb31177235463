use image::RgbImage;

/// Time-stamped color image with the coordinate frame it was captured in.
///
/// Used both as the upstream camera message and as the node's latest-frame
/// slot. The pipeline clones the stored frame before annotating it, so the
/// slot contents are never mutated by a detection run.
#[derive(Clone, Debug)]
pub struct Frame {
    pub image: RgbImage,
    pub stamp_ns: u64,
    pub frame_id: String,
}

/// Calibration snapshot delivered alongside each image.
#[derive(Clone, Copy, Debug)]
pub struct CalibrationSnapshot {
    /// Row-major 3x3 intrinsic matrix.
    pub k: [f64; 9],
    pub stamp_ns: u64,
}
