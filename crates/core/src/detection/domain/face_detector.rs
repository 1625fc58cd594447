use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Domain interface for face detection.
///
/// Returns every candidate face in the frame, in no particular order.
/// `&mut self` leaves room for stateful detectors (inference sessions,
/// temporal filters).
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>>;
}
