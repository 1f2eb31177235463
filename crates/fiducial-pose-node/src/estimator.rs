//! The opaque pose-estimation capability consumed by the pipeline.

use std::collections::VecDeque;
use std::path::Path;

use image::RgbImage;

use fiducial_pose_core::{CameraIntrinsics, MarkerPose};

/// Errors reported by a [`PoseEstimator`] implementation.
#[derive(thiserror::Error, Debug)]
pub enum EstimatorError {
    #[error("estimator initialization failed: {0}")]
    Init(String),
    #[error("pose estimation failed: {0}")]
    Estimation(String),
}

/// External marker-recognition capability.
///
/// The recognition algorithm itself lives behind this trait: given an image
/// and the camera intrinsic matrix, produce zero or more marker poses.
///
/// `init` is called exactly once per process lifetime, gated on the first
/// calibration snapshot (the intrinsics are unknown before that). An init
/// failure is not retried; the hosting pipeline goes inert until restart.
pub trait PoseEstimator: Send {
    fn init(
        &mut self,
        intrinsics: &CameraIntrinsics,
        model_path: &Path,
    ) -> Result<(), EstimatorError>;

    /// Detect markers in `image`. An empty vector is a valid result, not an
    /// error.
    fn estimate(&mut self, image: &RgbImage) -> Result<Vec<MarkerPose>, EstimatorError>;
}

/// Scripted estimator for tests and offline runs.
///
/// Replays a fixed sequence of responses, one per `estimate` call; once the
/// script is exhausted every further call returns no detections. Can also be
/// built to fail initialization.
#[derive(Default)]
pub struct ScriptedEstimator {
    steps: VecDeque<Result<Vec<MarkerPose>, String>>,
    init_failure: Option<String>,
    initialized: bool,
}

impl ScriptedEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an estimator whose `init` fails with `reason`.
    pub fn failing_init(reason: &str) -> Self {
        Self {
            init_failure: Some(reason.to_owned()),
            ..Self::default()
        }
    }

    /// Append a successful response returning `poses`.
    pub fn then_poses(mut self, poses: Vec<MarkerPose>) -> Self {
        self.steps.push_back(Ok(poses));
        self
    }

    /// Append an internal-error response.
    pub fn then_failure(mut self, reason: &str) -> Self {
        self.steps.push_back(Err(reason.to_owned()));
        self
    }

    /// Whether `init` has been called (successfully or not).
    pub fn initialized(&self) -> bool {
        self.initialized
    }
}

impl PoseEstimator for ScriptedEstimator {
    fn init(
        &mut self,
        _intrinsics: &CameraIntrinsics,
        _model_path: &Path,
    ) -> Result<(), EstimatorError> {
        if self.initialized {
            return Err(EstimatorError::Init("init called twice".to_owned()));
        }
        self.initialized = true;
        match self.init_failure.take() {
            Some(reason) => Err(EstimatorError::Init(reason)),
            None => Ok(()),
        }
    }

    fn estimate(&mut self, _image: &RgbImage) -> Result<Vec<MarkerPose>, EstimatorError> {
        match self.steps.pop_front() {
            Some(Ok(poses)) => Ok(poses),
            Some(Err(reason)) => Err(EstimatorError::Estimation(reason)),
            None => Ok(Vec::new()),
        }
    }
}
