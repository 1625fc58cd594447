use std::time::Instant;

use crate::control::domain::rc_command::RcCommand;
use crate::control::domain::tracking_controller::{ControllerState, TrackingController};
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::target_selector::{select_target, Target};
use crate::shared::frame::Frame;
use crate::shared::region::Region;
use crate::video::domain::frame_resizer::FrameResizer;

/// Everything one tick produced.
#[derive(Debug)]
pub struct TickOutcome {
    /// The frame at processing resolution.
    pub frame: Frame,
    pub regions: Vec<Region>,
    pub target: Target,
    pub command: RcCommand,
    pub detect_ms: f64,
    pub control_ms: f64,
}

/// frame → resize → detect → select → control, with the controller state
/// carried between calls.
///
/// Does no I/O beyond what the detector itself does, so any driver
/// (flight loop, replay, test) can feed it frames.
pub struct FaceTracker {
    detector: Box<dyn FaceDetector>,
    resizer: Box<dyn FrameResizer>,
    controller: TrackingController,
    state: ControllerState,
}

impl FaceTracker {
    pub fn new(
        detector: Box<dyn FaceDetector>,
        resizer: Box<dyn FrameResizer>,
        controller: TrackingController,
    ) -> Self {
        Self {
            detector,
            resizer,
            controller,
            state: ControllerState::default(),
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Runs one tick. A detector failure counts as "no faces"; only a
    /// frame that cannot be brought to processing size is an error.
    pub fn step(&mut self, frame: &Frame) -> Result<TickOutcome, Box<dyn std::error::Error>> {
        let config = self.controller.config();
        let frame = self
            .resizer
            .resize(frame, config.frame_width, config.frame_height)?;

        let detect_start = Instant::now();
        let regions = self.detector.detect(&frame).unwrap_or_else(|e| {
            log::warn!("Face detection failed on frame {}: {e}", frame.index());
            Vec::new()
        });
        let detect_ms = detect_start.elapsed().as_secs_f64() * 1000.0;

        let control_start = Instant::now();
        let target = select_target(&regions);
        let (command, next) = self.controller.tick(self.state, &target);
        self.state = next;
        let control_ms = control_start.elapsed().as_secs_f64() * 1000.0;

        Ok(TickOutcome {
            frame,
            regions,
            target,
            command,
            detect_ms,
            control_ms,
        })
    }
}
