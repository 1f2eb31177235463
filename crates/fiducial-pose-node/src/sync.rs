//! Approximate-time pairing of image and calibration messages.

use std::collections::VecDeque;

use log::debug;

use crate::frame::{CalibrationSnapshot, Frame};

/// Default queue depth for unmatched messages on either side.
pub const DEFAULT_QUEUE_DEPTH: usize = 3;

/// Default pairing window: half a frame interval at 50 Hz.
pub const DEFAULT_SLOP_NS: u64 = 10_000_000;

/// Pairs image and calibration messages whose stamps fall within a bounded
/// window.
///
/// Messages wait in bounded queues; a message that cannot be matched within
/// the window is dropped once something newer supersedes it, and the oldest
/// entry is dropped when a queue overflows. The pairing never blocks.
pub struct ApproxTimeSync {
    images: VecDeque<Frame>,
    calibrations: VecDeque<CalibrationSnapshot>,
    queue_depth: usize,
    slop_ns: u64,
}

impl Default for ApproxTimeSync {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_DEPTH, DEFAULT_SLOP_NS)
    }
}

impl ApproxTimeSync {
    pub fn new(queue_depth: usize, slop_ns: u64) -> Self {
        Self {
            images: VecDeque::with_capacity(queue_depth),
            calibrations: VecDeque::with_capacity(queue_depth),
            queue_depth,
            slop_ns,
        }
    }

    /// Offer an image message; returns a synchronized pair if one completes.
    pub fn push_image(&mut self, frame: Frame) -> Option<(Frame, CalibrationSnapshot)> {
        if self.images.len() == self.queue_depth {
            debug!("image queue full, dropping oldest unmatched image");
            self.images.pop_front();
        }
        self.images.push_back(frame);
        self.try_match()
    }

    /// Offer a calibration message; returns a synchronized pair if one
    /// completes.
    pub fn push_calibration(
        &mut self,
        calibration: CalibrationSnapshot,
    ) -> Option<(Frame, CalibrationSnapshot)> {
        if self.calibrations.len() == self.queue_depth {
            debug!("calibration queue full, dropping oldest unmatched snapshot");
            self.calibrations.pop_front();
        }
        self.calibrations.push_back(calibration);
        self.try_match()
    }

    /// Number of queued, unmatched messages (images + calibrations).
    pub fn pending(&self) -> usize {
        self.images.len() + self.calibrations.len()
    }

    /// Match queue fronts. Stamps only grow within a queue, so a front that
    /// is older than the opposite front by more than the window can never
    /// pair again and is dropped.
    fn try_match(&mut self) -> Option<(Frame, CalibrationSnapshot)> {
        loop {
            let image_stamp = self.images.front()?.stamp_ns;
            let calibration_stamp = self.calibrations.front()?.stamp_ns;

            if image_stamp.abs_diff(calibration_stamp) <= self.slop_ns {
                let frame = self.images.pop_front()?;
                let calibration = self.calibrations.pop_front()?;
                return Some((frame, calibration));
            }

            if image_stamp < calibration_stamp {
                debug!("dropping image outside the pairing window");
                self.images.pop_front();
            } else {
                debug!("dropping calibration snapshot outside the pairing window");
                self.calibrations.pop_front();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn frame(stamp_ns: u64) -> Frame {
        Frame {
            image: RgbImage::new(4, 4),
            stamp_ns,
            frame_id: "camera".to_owned(),
        }
    }

    fn calibration(stamp_ns: u64) -> CalibrationSnapshot {
        CalibrationSnapshot {
            k: [1000.0, 0.0, 320.0, 0.0, 1000.0, 240.0, 0.0, 0.0, 1.0],
            stamp_ns,
        }
    }

    #[test]
    fn pairs_messages_within_the_window() {
        let mut sync = ApproxTimeSync::default();
        assert!(sync.push_image(frame(1_000_000)).is_none());
        let (f, c) = sync.push_calibration(calibration(1_500_000)).expect("pair");
        assert_eq!(f.stamp_ns, 1_000_000);
        assert_eq!(c.stamp_ns, 1_500_000);
        assert_eq!(sync.pending(), 0);
    }

    #[test]
    fn emits_one_pair_per_completion() {
        let mut sync = ApproxTimeSync::default();
        assert!(sync.push_image(frame(1_000)).is_none());
        assert!(sync.push_image(frame(2_000)).is_none());
        assert!(sync.push_calibration(calibration(1_000)).is_some());
        assert!(sync.push_calibration(calibration(2_000)).is_some());
        assert_eq!(sync.pending(), 0);
    }

    #[test]
    fn drops_messages_outside_the_window() {
        let mut sync = ApproxTimeSync::new(3, 1_000);
        assert!(sync.push_image(frame(0)).is_none());
        // Far newer calibration: the stale image can never pair again.
        assert!(sync.push_calibration(calibration(1_000_000)).is_none());
        assert_eq!(sync.pending(), 1);
        // A matching image pairs with the queued calibration.
        assert!(sync.push_image(frame(1_000_500)).is_some());
    }

    #[test]
    fn bounded_queue_drops_the_oldest() {
        let mut sync = ApproxTimeSync::new(3, 1_000);
        for stamp in [10_000, 20_000, 30_000, 40_000] {
            assert!(sync.push_image(frame(stamp)).is_none());
        }
        // The first image was pushed out by the depth bound.
        assert!(sync.push_calibration(calibration(10_000)).is_none());
        assert_eq!(sync.pending(), 3);
    }
}
