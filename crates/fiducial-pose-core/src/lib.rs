//! Core geometry for fiducial pose pipelines.
//!
//! This crate is intentionally small and purely geometric. It knows nothing
//! about frame sources, estimators or publishing; it provides the numeric
//! pieces those layers share: the camera intrinsic matrix with pixel
//! reprojection, rotation-matrix to quaternion extraction, and the axis
//! overlay drawn onto annotated images.

mod error;
mod intrinsics;
mod logger;
mod pose;
mod render;

pub use error::GeometryError;
pub use intrinsics::CameraIntrinsics;
pub use pose::{quaternion_to_rotation, rotation_to_quaternion, MarkerPose, PoseVec7};
pub use render::render_axes;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
