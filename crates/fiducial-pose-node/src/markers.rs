//! Visualization marker lifecycle.
//!
//! Every pipeline run publishes the full marker set: three axis arrows per
//! detected pose, plus removal records for entries a larger previous cycle
//! published. The removal records are what keep a shrinking detection count
//! from leaving ghost arrows on the display.

use serde::{Deserialize, Serialize};

use fiducial_pose_core::PoseVec7;

/// Base id for markers published by this pipeline; keeps ids disjoint from
/// other publishers drawing on the same display.
const MARKER_ID_BASE: u32 = 2351;

const MARKER_NAMESPACE: &str = "fiducials";

/// Length of each axis arrow in the marker's local frame.
pub const ARROW_LENGTH: f64 = 0.2;

const ARROW_SHAFT_DIAMETER: f64 = 0.01;
const ARROW_HEAD_DIAMETER: f64 = 0.015;

/// Markers expire on the display after this long even if updates stop.
const MARKER_LIFETIME_NS: u64 = 1_000_000_000;

/// Local axis rendered by one arrow of a coordinate triad.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// RGBA arrow color: full intensity on the matching channel.
    pub fn color(self) -> [f32; 4] {
        match self {
            Axis::X => [1.0, 0.0, 0.0, 0.85],
            Axis::Y => [0.0, 1.0, 0.0, 0.85],
            Axis::Z => [0.0, 0.0, 1.0, 0.85],
        }
    }

    /// Arrow tip in marker-local coordinates.
    pub fn tip(self) -> [f64; 3] {
        match self {
            Axis::X => [ARROW_LENGTH, 0.0, 0.0],
            Axis::Y => [0.0, ARROW_LENGTH, 0.0],
            Axis::Z => [0.0, 0.0, ARROW_LENGTH],
        }
    }
}

/// One renderable arrow of a pose's coordinate triad.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArrowMarker {
    pub id: u32,
    pub ns: String,
    pub frame_id: String,
    pub stamp_ns: u64,
    pub axis: Axis,
    /// Pose of the triad origin, i.e. the detected marker pose.
    pub pose: PoseVec7,
    /// Arrow endpoint in marker-local coordinates; the arrow starts at the
    /// origin.
    pub tip: [f64; 3],
    pub shaft_diameter: f64,
    pub head_diameter: f64,
    pub color: [f32; 4],
    pub lifetime_ns: u64,
}

/// Entry of the published marker set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MarkerRecord {
    /// Arrow to draw or refresh.
    Arrow(ArrowMarker),
    /// Entry left over from a larger previous cycle; the display must drop
    /// it instead of keeping its stale geometry.
    Remove { id: u32 },
}

impl MarkerRecord {
    pub fn id(&self) -> u32 {
        match self {
            MarkerRecord::Arrow(arrow) => arrow.id,
            MarkerRecord::Remove { id } => *id,
        }
    }
}

/// Keeps the published marker set consistent as the detection count changes
/// between frames.
#[derive(Debug, Default)]
pub struct MarkerLifecycle {
    prev_size: usize,
}

impl MarkerLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the full marker set for this cycle.
    ///
    /// Three arrows per pose, in pose order; when the previous cycle
    /// published more entries, the excess indices become
    /// [`MarkerRecord::Remove`] so the display drops them.
    pub fn build(
        &mut self,
        poses: &[PoseVec7],
        frame_id: &str,
        stamp_ns: u64,
    ) -> Vec<MarkerRecord> {
        let new_size = 3 * poses.len();
        let mut records = Vec::with_capacity(new_size.max(self.prev_size));

        for (pose_idx, pose) in poses.iter().enumerate() {
            for (axis_idx, axis) in Axis::ALL.into_iter().enumerate() {
                let idx = (3 * pose_idx + axis_idx) as u32;
                records.push(MarkerRecord::Arrow(ArrowMarker {
                    id: MARKER_ID_BASE + idx,
                    ns: MARKER_NAMESPACE.to_owned(),
                    frame_id: frame_id.to_owned(),
                    stamp_ns,
                    axis,
                    pose: *pose,
                    tip: axis.tip(),
                    shaft_diameter: ARROW_SHAFT_DIAMETER,
                    head_diameter: ARROW_HEAD_DIAMETER,
                    color: axis.color(),
                    lifetime_ns: MARKER_LIFETIME_NS,
                }));
            }
        }

        for idx in new_size..self.prev_size {
            records.push(MarkerRecord::Remove {
                id: MARKER_ID_BASE + idx as u32,
            });
        }

        self.prev_size = new_size;
        records
    }
}
