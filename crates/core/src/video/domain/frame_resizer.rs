use crate::shared::frame::Frame;

/// Scales frames to the controller's processing resolution.
pub trait FrameResizer: Send {
    fn resize(
        &self,
        frame: &Frame,
        width: u32,
        height: u32,
    ) -> Result<Frame, Box<dyn std::error::Error>>;
}
