use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// A lazy, non-restartable stream of frames: a live camera feed or a
/// recorded file replayed in its place.
pub trait VideoSource: Send {
    /// Opens the source (a URL such as `udp://0.0.0.0:11111` or a path).
    fn open(&mut self, url: &str) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Frames in decode order. Each `next()` blocks until a frame is ready.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    /// Releases any resources held by the source.
    fn close(&mut self);
}
