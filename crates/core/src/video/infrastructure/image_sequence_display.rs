use std::path::PathBuf;

use crate::shared::frame::Frame;
use crate::video::domain::frame_display::FrameDisplay;

/// Headless debug view: saves every `every`-th frame as a numbered PNG.
pub struct ImageSequenceDisplay {
    dir: PathBuf,
    every: usize,
    shown: usize,
}

impl ImageSequenceDisplay {
    pub fn new(dir: PathBuf, every: usize) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            every: every.max(1),
            shown: 0,
        })
    }

    fn path_for(&self, frame: &Frame) -> PathBuf {
        self.dir.join(format!("frame_{:06}.png", frame.index()))
    }
}

impl FrameDisplay for ImageSequenceDisplay {
    fn show(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let due = self.shown % self.every == 0;
        self.shown += 1;
        if !due {
            return Ok(());
        }
        if frame.channels() != 3 {
            return Err(format!("expected RGB frame, got {} channels", frame.channels()).into());
        }

        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("Failed to create image from frame data")?;
        img.save(self.path_for(frame))?;
        Ok(())
    }
}
