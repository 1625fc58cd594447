/// Properties of an opened video source, as reported by the decoder.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    /// Nominal frame rate; 0 when the stream does not advertise one.
    pub fps: f64,
    pub codec: String,
    /// URL or path the source was opened from.
    pub source: String,
}

impl VideoMetadata {
    /// Target period between ticks implied by the stream rate, if known.
    pub fn frame_interval(&self) -> Option<std::time::Duration> {
        if self.fps > 0.0 && self.fps.is_finite() {
            Some(std::time::Duration::from_secs_f64(1.0 / self.fps))
        } else {
            None
        }
    }
}
