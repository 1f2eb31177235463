use fiducial_pose_core::GeometryError;

use crate::estimator::EstimatorError;

/// Failures surfaced by the request/response detection path.
///
/// The event-driven path absorbs the same failures into logged no-ops; only
/// a request caller ever sees this type. A timeout is not fatal and may be
/// retried by the caller.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error("no synchronized frame arrived within {waited_ms} ms")]
    Timeout { waited_ms: u64 },
    #[error("detector not ready (no calibration observed or initialization failed)")]
    NotReady,
    #[error(transparent)]
    Estimator(#[from] EstimatorError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}
