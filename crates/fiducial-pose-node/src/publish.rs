//! Publish-side interfaces.
//!
//! Transport is supplied by the embedding layer; the pipeline fans out each
//! run to whichever sinks are installed and skips the rest.

use image::RgbImage;
use serde::{Deserialize, Serialize};

use fiducial_pose_core::PoseVec7;

use crate::markers::MarkerRecord;

/// One detected fiducial, as published on the detection list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Marker label, e.g. the tag family.
    pub label: String,
    /// Name of the detector that produced this entry.
    pub detector: String,
    pub score: f32,
    pub pose: PoseVec7,
    /// Capture stamp of the source frame, propagated unchanged.
    pub stamp_ns: u64,
    /// Coordinate frame of the source image, propagated unchanged.
    pub frame_id: String,
}

/// A named transform from the camera frame to a detected marker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StampedTransform {
    pub parent_frame: String,
    pub child_frame: String,
    pub translation: [f64; 3],
    /// Unit quaternion, `(w, x, y, z)`.
    pub rotation: [f64; 4],
    pub stamp_ns: u64,
}

pub trait DetectionListSink: Send + Sync {
    fn publish(&self, detections: &[Detection]);
}

pub trait TransformSink: Send + Sync {
    fn send_transform(&self, transform: &StampedTransform);
}

pub trait ImageSink: Send + Sync {
    fn publish(&self, image: &RgbImage, stamp_ns: u64, frame_id: &str);
}

pub trait MarkerSink: Send + Sync {
    fn publish(&self, markers: &[MarkerRecord]);
}

/// Sinks installed on the pipeline. Absent sinks are skipped.
#[derive(Default)]
pub struct PipelineSinks {
    pub detections: Option<Box<dyn DetectionListSink>>,
    pub transforms: Option<Box<dyn TransformSink>>,
    pub image: Option<Box<dyn ImageSink>>,
    pub markers: Option<Box<dyn MarkerSink>>,
}

impl PipelineSinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_detections(mut self, sink: Box<dyn DetectionListSink>) -> Self {
        self.detections = Some(sink);
        self
    }

    pub fn with_transforms(mut self, sink: Box<dyn TransformSink>) -> Self {
        self.transforms = Some(sink);
        self
    }

    pub fn with_image(mut self, sink: Box<dyn ImageSink>) -> Self {
        self.image = Some(sink);
        self
    }

    pub fn with_markers(mut self, sink: Box<dyn MarkerSink>) -> Self {
        self.markers = Some(sink);
        self
    }
}
