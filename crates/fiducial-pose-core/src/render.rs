use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use nalgebra::Point3;

use crate::error::GeometryError;
use crate::intrinsics::CameraIntrinsics;
use crate::pose::MarkerPose;

/// Offset of the drawn axis tips along each marker-local axis, in the same
/// units as the pose translation.
const AXIS_OFFSET: f64 = 0.1;

const X_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const Y_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const Z_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

/// Draw the coordinate triad of a detected marker onto `image`.
///
/// Projects the marker origin and three points 0.1 units along the local
/// axes into pixel coordinates, then draws the x axis in red, y in green and
/// z in blue. Pure side effect on the image buffer; nothing is retained.
///
/// Fails when any of the four points lands on the camera plane
/// ([`GeometryError::DegenerateDepth`]); the image is left partially drawn
/// in that case, so callers should drop the annotated copy on error.
pub fn render_axes(
    image: &mut RgbImage,
    pose: &MarkerPose,
    intrinsics: &CameraIntrinsics,
) -> Result<(), GeometryError> {
    let local = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(AXIS_OFFSET, 0.0, 0.0),
        Point3::new(0.0, AXIS_OFFSET, 0.0),
        Point3::new(0.0, 0.0, AXIS_OFFSET),
    ];

    let mut pixels = [(0i32, 0i32); 4];
    for (pixel, point) in pixels.iter_mut().zip(&local) {
        let camera = pose.rotation * point.coords + pose.translation;
        *pixel = intrinsics.reproject(&Point3::from(camera))?;
    }

    let origin = (pixels[0].0 as f32, pixels[0].1 as f32);
    for (tip, color) in pixels[1..].iter().zip([X_COLOR, Y_COLOR, Z_COLOR]) {
        draw_line_segment_mut(image, origin, (tip.0 as f32, tip.1 as f32), color);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Matrix3, Vector3};

    fn test_pose() -> MarkerPose {
        MarkerPose {
            rotation: Matrix3::identity(),
            translation: Vector3::new(0.0, 0.0, 1.0),
        }
    }

    #[test]
    fn draws_colored_axes_from_the_projected_origin() {
        let intr = CameraIntrinsics::new(1000.0, 1000.0, 320.0, 240.0);
        let mut image = RgbImage::new(640, 480);

        render_axes(&mut image, &test_pose(), &intr).expect("renders");

        // Identity pose at 1 m depth: origin projects to the principal point,
        // the x tip 100 px right, the y tip 100 px down.
        assert_eq!(*image.get_pixel(370, 240), Rgb([255, 0, 0]));
        assert_eq!(*image.get_pixel(320, 290), Rgb([0, 255, 0]));
        // The z tip projects back onto the origin pixel; blue wins as the
        // last segment drawn.
        assert_eq!(*image.get_pixel(320, 240), Rgb([0, 0, 255]));
    }

    #[test]
    fn degenerate_depth_fails_instead_of_drawing_garbage() {
        let intr = CameraIntrinsics::new(1000.0, 1000.0, 320.0, 240.0);
        let mut image = RgbImage::new(64, 64);
        let pose = MarkerPose {
            rotation: Matrix3::identity(),
            translation: Vector3::new(0.0, 0.0, 0.0),
        };
        assert_eq!(
            render_axes(&mut image, &pose, &intr).unwrap_err(),
            GeometryError::DegenerateDepth
        );
    }
}
