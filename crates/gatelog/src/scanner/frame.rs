//! The video frame boundary.
//!
//! Frames arrive from an external capture pipeline that owns its own
//! concurrency; this module only defines what a detection looks like, the
//! detector seam, and the visual outline annotation. QR decoding itself is
//! an integration concern and is never implemented here.

use image::Rgb;

/// An RGB frame delivered by the capture pipeline.
pub type Frame = image::RgbImage;

/// Outline color for detected regions.
const OUTLINE: Rgb<u8> = Rgb([0, 255, 0]);

/// The outline of a detected code region, in pixel coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundingBox {
    /// Polygon corner points; the outline closes back to the first point.
    pub points: Vec<(i32, i32)>,
}

impl BoundingBox {
    /// Create a bounding box from corner points.
    #[must_use]
    pub fn new(points: Vec<(i32, i32)>) -> Self {
        Self { points }
    }
}

/// The result of running a detector over one frame.
///
/// A region can be located without the payload decoding, so the two fields
/// are independent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Detection {
    /// The decoded payload, if decoding succeeded.
    pub payload: Option<String>,
    /// The detected region outline, if one was located.
    pub bounds: Option<BoundingBox>,
}

impl Detection {
    /// A frame in which nothing was detected.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// A successful decode.
    #[must_use]
    pub fn decoded(payload: impl Into<String>) -> Self {
        Self {
            payload: Some(payload.into()),
            bounds: None,
        }
    }

    /// Attach a region outline.
    #[must_use]
    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

/// A QR detector run over each incoming frame.
///
/// Implementations wrap whatever decoding library the deployment uses.
pub trait QrDetector {
    /// Attempt to locate and decode a code in the frame.
    fn detect(&self, frame: &Frame) -> Detection;
}

/// Draw a region outline onto the frame.
///
/// A purely visual side effect for the operator display; it has no data
/// consequence.
pub fn annotate(frame: &mut Frame, bounds: &BoundingBox) {
    let points = &bounds.points;
    if points.len() < 2 {
        return;
    }

    for i in 0..points.len() {
        let from = points[i];
        let to = points[(i + 1) % points.len()];
        draw_segment(frame, from, to);
    }
}

/// Run the detector and annotate any detected region in place.
///
/// This is the per-frame transform a capture integration calls: whenever a
/// region was located the frame gains its outline, whether or not the
/// payload decoded.
pub fn detect_and_annotate<D: QrDetector + ?Sized>(detector: &D, frame: &mut Frame) -> Detection {
    let detection = detector.detect(frame);
    if let Some(bounds) = &detection.bounds {
        annotate(frame, bounds);
    }
    detection
}

/// Draw one line segment with Bresenham's algorithm, clipping to the frame.
fn draw_segment(frame: &mut Frame, from: (i32, i32), to: (i32, i32)) {
    let (mut x, mut y) = (i64::from(from.0), i64::from(from.1));
    let (x1, y1) = (i64::from(to.0), i64::from(to.1));

    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        put_pixel(frame, x, y);
        if x == x1 && y == y1 {
            break;
        }
        let doubled = 2 * err;
        if doubled >= dy {
            err += dy;
            x += sx;
        }
        if doubled <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Set a pixel if it falls inside the frame.
fn put_pixel(frame: &mut Frame, x: i64, y: i64) {
    if let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) {
        if x < frame.width() && y < frame.height() {
            frame.put_pixel(x, y, OUTLINE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black_frame() -> Frame {
        Frame::new(10, 10)
    }

    #[test]
    fn test_detection_none() {
        let detection = Detection::none();
        assert!(detection.payload.is_none());
        assert!(detection.bounds.is_none());
    }

    #[test]
    fn test_detection_decoded_with_bounds() {
        let detection =
            Detection::decoded("GATE-1").with_bounds(BoundingBox::new(vec![(0, 0), (4, 4)]));
        assert_eq!(detection.payload.as_deref(), Some("GATE-1"));
        assert!(detection.bounds.is_some());
    }

    #[test]
    fn test_annotate_draws_closed_outline() {
        let mut frame = black_frame();
        let bounds = BoundingBox::new(vec![(1, 1), (8, 1), (8, 8), (1, 8)]);

        annotate(&mut frame, &bounds);

        // Corners and edge midpoints are on the outline.
        assert_eq!(*frame.get_pixel(1, 1), OUTLINE);
        assert_eq!(*frame.get_pixel(8, 1), OUTLINE);
        assert_eq!(*frame.get_pixel(8, 8), OUTLINE);
        assert_eq!(*frame.get_pixel(1, 8), OUTLINE);
        assert_eq!(*frame.get_pixel(4, 1), OUTLINE);
        // Closing edge back to the first corner.
        assert_eq!(*frame.get_pixel(1, 4), OUTLINE);
        // The interior is untouched.
        assert_eq!(*frame.get_pixel(4, 4), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_annotate_clips_out_of_bounds_points() {
        let mut frame = black_frame();
        let bounds = BoundingBox::new(vec![(-5, -5), (20, 20)]);

        // Must not panic; the in-frame part of the segment is drawn.
        annotate(&mut frame, &bounds);
        assert_eq!(*frame.get_pixel(5, 5), OUTLINE);
    }

    #[test]
    fn test_annotate_single_point_is_noop() {
        let mut frame = black_frame();
        annotate(&mut frame, &BoundingBox::new(vec![(3, 3)]));
        assert_eq!(*frame.get_pixel(3, 3), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_detect_and_annotate() {
        struct Fixed;
        impl QrDetector for Fixed {
            fn detect(&self, _frame: &Frame) -> Detection {
                Detection::decoded("X").with_bounds(BoundingBox::new(vec![(0, 0), (9, 0)]))
            }
        }

        let mut frame = black_frame();
        let detection = detect_and_annotate(&Fixed, &mut frame);

        assert_eq!(detection.payload.as_deref(), Some("X"));
        assert_eq!(*frame.get_pixel(5, 0), OUTLINE);
    }

    #[test]
    fn test_detect_and_annotate_without_bounds() {
        struct Bare;
        impl QrDetector for Bare {
            fn detect(&self, _frame: &Frame) -> Detection {
                Detection::decoded("X")
            }
        }

        let mut frame = black_frame();
        let detection = detect_and_annotate(&Bare, &mut frame);

        assert_eq!(detection.payload.as_deref(), Some("X"));
        // No bounds, no drawing.
        assert_eq!(*frame.get_pixel(5, 0), Rgb([0, 0, 0]));
    }
}
