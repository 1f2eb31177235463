//! The detection node: synchronized frame intake, the detection pipeline and
//! publish fan-out.
//!
//! One mutex guards the whole mutable region: calibration lazy-init,
//! estimator init, the latest-frame slot, detection and publishing, and the
//! marker lifecycle count. Detection runs while holding that lock, so a new
//! frame can never overwrite the one being processed. Waiting requests are
//! signalled only after the producer releases the lock.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, Sender};
use log::{debug, error, info, warn};
use parking_lot::Mutex;

#[cfg(feature = "tracing")]
use tracing::instrument;

use fiducial_pose_core::{render_axes, CameraIntrinsics, PoseVec7};

use crate::config::{ConfigError, NodeConfig};
use crate::error::DetectError;
use crate::estimator::PoseEstimator;
use crate::frame::{CalibrationSnapshot, Frame};
use crate::markers::MarkerLifecycle;
use crate::publish::{Detection, PipelineSinks, StampedTransform};
use crate::source::{SubscriptionCounter, SubscriptionGuard};
use crate::sync::ApproxTimeSync;

/// Label attached to every published detection.
const DETECTION_LABEL: &str = "pi-tag";

/// Name of the detector reported on the detection list.
const DETECTOR_NAME: &str = "Fiducial_PI";

/// Bound on the request-path wait for a synchronized frame.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(5000);

/// Outcome of one pipeline run.
#[derive(Debug)]
pub enum Outcome {
    /// At least one marker was found.
    Detected(Vec<Detection>),
    /// The estimator ran and found nothing. A valid, non-failing result.
    Empty,
}

impl Outcome {
    pub fn detections(&self) -> &[Detection] {
        match self {
            Outcome::Detected(detections) => detections,
            Outcome::Empty => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Outcome::Empty)
    }
}

struct PipelineState {
    estimator: Box<dyn PoseEstimator>,
    /// Set once `init` succeeds; a failed init leaves this false for the
    /// process lifetime and every later frame is skipped.
    estimator_ready: bool,
    intrinsics: Option<CameraIntrinsics>,
    latest: Option<Frame>,
    markers: MarkerLifecycle,
    /// One-shot channels of requests blocked on the next frame.
    waiters: Vec<Sender<()>>,
    frames_received: u64,
}

/// Fiducial detection node.
///
/// Two call paths reach the pipeline: the event-driven path
/// ([`FiducialNode::handle_image`] / [`FiducialNode::handle_calibration`],
/// fed by the transport layer) and the request path
/// ([`FiducialNode::detect_once`]). The transport layer should route
/// requests here only when the configured mode includes the request path.
pub struct FiducialNode {
    config: NodeConfig,
    sinks: PipelineSinks,
    subscriptions: Arc<SubscriptionCounter>,
    sync: Mutex<ApproxTimeSync>,
    state: Mutex<PipelineState>,
}

impl FiducialNode {
    /// Set up the node. Fails fast on an invalid configuration.
    pub fn new(
        config: NodeConfig,
        estimator: Box<dyn PoseEstimator>,
        sinks: PipelineSinks,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            "mode: {:?}, model: {}",
            config.mode,
            config.model_path().display()
        );
        Ok(Self {
            config,
            sinks,
            subscriptions: SubscriptionCounter::new(),
            sync: Mutex::new(ApproxTimeSync::default()),
            state: Mutex::new(PipelineState {
                estimator,
                estimator_ready: false,
                intrinsics: None,
                latest: None,
                markers: MarkerLifecycle::new(),
                waiters: Vec::new(),
                frames_received: 0,
            }),
        })
    }

    /// Attach a downstream consumer; camera intake runs while at least one
    /// guard is alive.
    pub fn subscribe(&self) -> SubscriptionGuard {
        self.subscriptions.subscribe()
    }

    /// Number of currently attached consumers.
    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.active()
    }

    /// Total synchronized frames seen since startup.
    pub fn frames_received(&self) -> u64 {
        self.state.lock().frames_received
    }

    /// Feed an image message from the transport layer.
    ///
    /// Dropped without queueing while no consumer is attached.
    pub fn handle_image(&self, frame: Frame) {
        if self.subscriptions.active() == 0 {
            return;
        }
        let pair = self.sync.lock().push_image(frame);
        if let Some((frame, calibration)) = pair {
            self.on_synchronized_frame(frame, &calibration);
        }
    }

    /// Feed a calibration message from the transport layer.
    pub fn handle_calibration(&self, calibration: CalibrationSnapshot) {
        if self.subscriptions.active() == 0 {
            return;
        }
        let pair = self.sync.lock().push_calibration(calibration);
        if let Some((frame, calibration)) = pair {
            self.on_synchronized_frame(frame, &calibration);
        }
    }

    /// Event-driven entry: a synchronized image + calibration pair arrived.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, frame, calibration), fields(stamp_ns = frame.stamp_ns))
    )]
    pub fn on_synchronized_frame(&self, frame: Frame, calibration: &CalibrationSnapshot) {
        let mut state = self.state.lock();
        state.frames_received += 1;
        debug!("synchronized frame #{} received", state.frames_received);

        if state.intrinsics.is_none() {
            let intrinsics = CameraIntrinsics::from_k_row_major(&calibration.k);
            info!(
                "initializing estimator with camera matrix, model {}",
                self.config.model_path().display()
            );
            match state.estimator.init(&intrinsics, &self.config.model_path()) {
                Ok(()) => state.estimator_ready = true,
                Err(err) => error!("estimator initialization failed, pipeline inert: {err}"),
            }
            state.intrinsics = Some(intrinsics);
        }

        state.latest = Some(frame);

        if self.config.mode.event_driven() {
            if state.estimator_ready {
                match self.run_pipeline(&mut state) {
                    Ok(Outcome::Detected(detections)) => {
                        debug!("published {} detections", detections.len())
                    }
                    Ok(Outcome::Empty) => debug!("no detections in frame"),
                    Err(err) => warn!("detection failed: {err}"),
                }
            } else {
                debug!("skipping frame, estimator not ready");
            }
        }

        let waiters = std::mem::take(&mut state.waiters);
        drop(state);
        for waiter in waiters {
            let _ = waiter.try_send(());
        }
    }

    /// Request path: block until the next synchronized frame, then run the
    /// pipeline on it.
    ///
    /// Subscribes for the duration of the call; the subscription is released
    /// on every path, including timeout. A timeout is reported as
    /// [`DetectError::Timeout`] and never retried internally.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    pub fn detect_once(&self, timeout: Duration) -> Result<Outcome, DetectError> {
        debug!("detection request");
        let _subscription = self.subscribe();

        let (signal, signalled) = bounded::<()>(1);
        self.state.lock().waiters.push(signal);

        info!("waiting for a synchronized frame");
        if signalled.recv_timeout(timeout).is_err() {
            warn!(
                "no synchronized frame within {} ms",
                timeout.as_millis()
            );
            return Err(DetectError::Timeout {
                waited_ms: timeout.as_millis() as u64,
            });
        }

        let mut state = self.state.lock();
        if !state.estimator_ready {
            return Err(DetectError::NotReady);
        }
        let result = self.run_pipeline(&mut state);
        if let Err(err) = &result {
            warn!("detection request failed: {err}");
        }
        result
    }

    /// Run the estimator on the stored frame and fan the results out.
    ///
    /// The frame is cloned out of the slot first; annotation never touches
    /// the stored copy. The detection list is published on every run (empty
    /// included); image, transform and marker publication require at least
    /// one pose and their config toggles.
    fn run_pipeline(&self, state: &mut PipelineState) -> Result<Outcome, DetectError> {
        let Some(frame) = state.latest.clone() else {
            return Err(DetectError::NotReady);
        };
        let Some(intrinsics) = state.intrinsics.clone() else {
            return Err(DetectError::NotReady);
        };

        let poses = match state.estimator.estimate(&frame.image) {
            Ok(poses) => poses,
            Err(err) => {
                if let Some(sink) = &self.sinks.detections {
                    sink.publish(&[]);
                }
                return Err(err.into());
            }
        };

        let mut detections = Vec::with_capacity(poses.len());
        let mut pose_vecs = Vec::with_capacity(poses.len());
        for pose in &poses {
            let vec7 = PoseVec7::from_pose(pose)?;
            info!(
                "detected '{DETECTION_LABEL}' at x,y,z,qw,qx,qy,qz \
                 ({:.6}, {:.6}, {:.6}, {:.6}, {:.6}, {:.6}, {:.6})",
                vec7.x, vec7.y, vec7.z, vec7.qw, vec7.qx, vec7.qy, vec7.qz
            );
            detections.push(Detection {
                label: DETECTION_LABEL.to_owned(),
                detector: DETECTOR_NAME.to_owned(),
                score: 0.0,
                pose: vec7,
                stamp_ns: frame.stamp_ns,
                frame_id: frame.frame_id.clone(),
            });
            pose_vecs.push(vec7);
        }

        if let Some(sink) = &self.sinks.detections {
            sink.publish(&detections);
        }

        if poses.is_empty() {
            return Ok(Outcome::Empty);
        }

        if self.config.publish_image {
            if let Some(sink) = &self.sinks.image {
                let mut annotated = frame.image.clone();
                for pose in &poses {
                    render_axes(&mut annotated, pose, &intrinsics)?;
                }
                sink.publish(&annotated, frame.stamp_ns, &frame.frame_id);
            }
        }

        if self.config.publish_transforms {
            if let Some(sink) = &self.sinks.transforms {
                for (index, vec7) in pose_vecs.iter().enumerate() {
                    sink.send_transform(&StampedTransform {
                        parent_frame: frame.frame_id.clone(),
                        child_frame: format!("{DETECTION_LABEL}_{index}"),
                        translation: vec7.translation(),
                        rotation: vec7.quaternion(),
                        stamp_ns: frame.stamp_ns,
                    });
                }
            }
        }

        if self.config.publish_markers {
            if let Some(sink) = &self.sinks.markers {
                let records = state
                    .markers
                    .build(&pose_vecs, &frame.frame_id, frame.stamp_ns);
                sink.publish(&records);
            }
        }

        Ok(Outcome::Detected(detections))
    }
}
