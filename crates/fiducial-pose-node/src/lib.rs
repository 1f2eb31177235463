//! Fiducial detection pipeline.
//!
//! This crate hosts the detection-and-publish pipeline around an opaque
//! marker estimator:
//!
//! - [`sync`]: approximate-time pairing of image and calibration messages
//!   with bounded queues.
//! - [`source`]: reference-counted subscription to the camera channels;
//!   intake is free while nobody listens.
//! - [`estimator`]: the [`PoseEstimator`] capability trait plus a scripted
//!   fake for tests.
//! - [`node`]: the [`FiducialNode`] driving detection from the event path
//!   and the bounded-wait request path, fanning results out to the
//!   installed [`publish`] sinks.
//! - [`markers`]: the visualization marker lifecycle, including removal
//!   records when the detection count shrinks.
//!
//! Transport-layer message definitions and process bootstrapping stay
//! outside this crate; the embedding layer feeds messages in and implements
//! the sinks.

pub mod config;
pub mod error;
pub mod estimator;
pub mod frame;
pub mod markers;
pub mod node;
pub mod publish;
pub mod source;
pub mod sync;

pub use config::{ConfigError, NodeConfig, PipelineMode};
pub use error::DetectError;
pub use estimator::{EstimatorError, PoseEstimator, ScriptedEstimator};
pub use frame::{CalibrationSnapshot, Frame};
pub use markers::{ArrowMarker, Axis, MarkerLifecycle, MarkerRecord};
pub use node::{FiducialNode, Outcome, DEFAULT_REQUEST_TIMEOUT};
pub use publish::{
    Detection, DetectionListSink, ImageSink, MarkerSink, PipelineSinks, StampedTransform,
    TransformSink,
};
pub use source::{SubscriptionCounter, SubscriptionGuard};
pub use sync::ApproxTimeSync;
