use crate::shared::frame::Frame;

/// Receives annotated frames for a human to look at.
pub trait FrameDisplay: Send {
    fn show(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;
}
