use image::imageops::{self, FilterType};

use crate::shared::frame::Frame;
use crate::video::domain::frame_resizer::FrameResizer;

/// Bilinear resize via the `image` crate.
pub struct ImageFrameResizer {
    filter: FilterType,
}

impl ImageFrameResizer {
    pub fn new() -> Self {
        Self {
            filter: FilterType::Triangle,
        }
    }
}

impl Default for ImageFrameResizer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameResizer for ImageFrameResizer {
    fn resize(
        &self,
        frame: &Frame,
        width: u32,
        height: u32,
    ) -> Result<Frame, Box<dyn std::error::Error>> {
        if frame.has_size(width, height) {
            return Ok(frame.clone());
        }
        if frame.channels() != 3 {
            return Err(format!("expected RGB frame, got {} channels", frame.channels()).into());
        }

        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("frame buffer does not match its dimensions")?;
        let scaled = imageops::resize(&img, width, height, self.filter);
        Ok(Frame::new(scaled.into_raw(), width, height, 3, frame.index()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Frame {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take((width * height * 3) as usize)
            .collect();
        Frame::new(data, width, height, 3, 9)
    }

    #[test]
    fn test_downscale_to_processing_size() {
        let frame = solid(960, 720, [10, 20, 30]);
        let out = ImageFrameResizer::new().resize(&frame, 360, 240).unwrap();
        assert!(out.has_size(360, 240));
        assert_eq!(out.index(), 9);
        assert_eq!(out.data().len(), 360 * 240 * 3);
        for (got, want) in out.data()[..3].iter().zip([10u8, 20, 30]) {
            assert!(got.abs_diff(want) <= 1);
        }
    }

    #[test]
    fn test_same_size_is_a_copy() {
        let frame = solid(360, 240, [1, 2, 3]);
        let out = ImageFrameResizer::new().resize(&frame, 360, 240).unwrap();
        assert_eq!(out.data(), frame.data());
    }

    #[test]
    fn test_rejects_non_rgb() {
        let frame = Frame::new(vec![0u8; 16], 4, 4, 1, 0);
        assert!(ImageFrameResizer::new().resize(&frame, 2, 2).is_err());
    }
}
