use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::detection::domain::target_annotator::TargetAnnotator;
use crate::drone::domain::drone_link::DroneLink;
use crate::pipeline::face_tracker::FaceTracker;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::video::domain::frame_display::FrameDisplay;
use crate::video::domain::video_source::VideoSource;

/// Knobs for one run of the loop.
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Polled once per tick; set it to stop after the current tick.
    pub cancelled: Arc<AtomicBool>,
    /// Stop after this many ticks.
    pub max_ticks: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    SourceEnded,
    TickLimit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackingReport {
    pub ticks: usize,
    pub stop: StopReason,
}

/// The closed loop: read → track → actuate → display, one frame at a time.
///
/// Landing is not this type's job; the caller's flight session handles it
/// however the loop ends.
pub struct TrackFaceUseCase {
    source: Box<dyn VideoSource>,
    tracker: FaceTracker,
    display: Option<Box<dyn FrameDisplay>>,
    annotator: TargetAnnotator,
    logger: Box<dyn PipelineLogger>,
}

impl TrackFaceUseCase {
    pub fn new(
        source: Box<dyn VideoSource>,
        tracker: FaceTracker,
        display: Option<Box<dyn FrameDisplay>>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            source,
            tracker,
            display,
            annotator: TargetAnnotator::default(),
            logger,
        }
    }

    /// Opens `url` and runs until cancelled, out of frames, or at the tick
    /// limit. A frame that fails to decode ends the run with that error.
    pub fn execute(
        &mut self,
        url: &str,
        link: &mut dyn DroneLink,
        options: &RunOptions,
    ) -> Result<TrackingReport, Box<dyn std::error::Error>> {
        let metadata = self.source.open(url)?;
        self.logger.info(&format!(
            "Tracking on {} ({}x{} {}, {:.1} fps)",
            metadata.source, metadata.width, metadata.height, metadata.codec, metadata.fps
        ));

        let result = self.run_loop(link, options);
        self.source.close();
        self.logger.summary();
        result
    }

    fn run_loop(
        &mut self,
        link: &mut dyn DroneLink,
        options: &RunOptions,
    ) -> Result<TrackingReport, Box<dyn std::error::Error>> {
        let mut ticks = 0;
        let mut frames = self.source.frames();

        let stop = loop {
            if options.cancelled.load(Ordering::Relaxed) {
                break StopReason::Cancelled;
            }
            if options.max_ticks.is_some_and(|max| ticks >= max) {
                break StopReason::TickLimit;
            }
            let Some(frame) = frames.next() else {
                break StopReason::SourceEnded;
            };
            let frame = frame?;

            let outcome = self.tracker.step(&frame)?;

            let actuate_start = Instant::now();
            if let Err(e) = link.send_rc(&outcome.command) {
                log::warn!("Failed to send {}: {e}", outcome.command);
            }
            let actuate_ms = actuate_start.elapsed().as_secs_f64() * 1000.0;

            if let Some(display) = self.display.as_mut() {
                let mut annotated = outcome.frame;
                self.annotator.annotate(&mut annotated, &outcome.regions);
                if let Err(e) = display.show(&annotated) {
                    log::warn!("Display failed: {e}");
                }
            }

            self.logger.timing("detect", outcome.detect_ms);
            self.logger.timing("control", outcome.control_ms);
            self.logger.timing("actuate", actuate_ms);
            self.logger.metric("faces", outcome.regions.len() as f64);
            self.logger.metric("yaw", outcome.command.yaw() as f64);
            self.logger
                .tick(ticks, outcome.regions.len(), &outcome.command);
            ticks += 1;
        };

        self.logger
            .info(&format!("Tracking stopped after {ticks} ticks: {stop:?}"));
        Ok(TrackingReport { ticks, stop })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::domain::rc_command::RcCommand;
    use crate::control::domain::tracking_config::TrackingConfig;
    use crate::control::domain::tracking_controller::TrackingController;
    use crate::detection::domain::face_detector::FaceDetector;
    use crate::drone::infrastructure::dry_run_link::{DryRunLink, LinkEvent};
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::shared::frame::Frame;
    use crate::shared::region::Region;
    use crate::shared::video_metadata::VideoMetadata;
    use crate::video::domain::frame_resizer::FrameResizer;
    use std::sync::Mutex;

    // --- Stubs ---

    struct StubSource {
        frames: Vec<Result<Frame, &'static str>>,
        opened: Arc<Mutex<Option<String>>>,
        closed: Arc<AtomicBool>,
    }

    impl VideoSource for StubSource {
        fn open(&mut self, url: &str) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            *self.opened.lock().unwrap() = Some(url.to_string());
            Ok(VideoMetadata {
                width: 360,
                height: 240,
                fps: 30.0,
                codec: "stub".to_string(),
                source: url.to_string(),
            })
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            Box::new(
                self.frames
                    .drain(..)
                    .map(|r| r.map_err(Box::<dyn std::error::Error>::from)),
            )
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::Relaxed);
        }
    }

    /// Returns `per_frame[i]` for the i-th call, empty once exhausted.
    struct StubDetector {
        per_frame: Vec<Vec<Region>>,
        calls: usize,
    }

    impl FaceDetector for StubDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
            let out = self.per_frame.get(self.calls).cloned().unwrap_or_default();
            self.calls += 1;
            Ok(out)
        }
    }

    struct IdentityResizer;

    impl FrameResizer for IdentityResizer {
        fn resize(
            &self,
            frame: &Frame,
            _width: u32,
            _height: u32,
        ) -> Result<Frame, Box<dyn std::error::Error>> {
            Ok(frame.clone())
        }
    }

    struct CountingDisplay {
        shown: Arc<Mutex<Vec<Frame>>>,
    }

    impl FrameDisplay for CountingDisplay {
        fn show(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            self.shown.lock().unwrap().push(frame.clone());
            Ok(())
        }
    }

    struct FailingLink;

    impl DroneLink for FailingLink {
        fn connect(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }
        fn stream_on(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }
        fn stream_off(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }
        fn takeoff(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }
        fn land(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }
        fn send_rc(&mut self, _command: &RcCommand) -> Result<(), Box<dyn std::error::Error>> {
            Err("link down".into())
        }
    }

    // --- Helpers ---

    struct Harness {
        use_case: TrackFaceUseCase,
        opened: Arc<Mutex<Option<String>>>,
        closed: Arc<AtomicBool>,
        shown: Arc<Mutex<Vec<Frame>>>,
    }

    fn harness(frames: Vec<Result<Frame, &'static str>>, faces: Vec<Vec<Region>>) -> Harness {
        let opened = Arc::new(Mutex::new(None));
        let closed = Arc::new(AtomicBool::new(false));
        let shown = Arc::new(Mutex::new(Vec::new()));
        let tracker = FaceTracker::new(
            Box::new(StubDetector {
                per_frame: faces,
                calls: 0,
            }),
            Box::new(IdentityResizer),
            TrackingController::new(TrackingConfig::default()),
        );
        let use_case = TrackFaceUseCase::new(
            Box::new(StubSource {
                frames,
                opened: opened.clone(),
                closed: closed.clone(),
            }),
            tracker,
            Some(Box::new(CountingDisplay {
                shown: shown.clone(),
            })),
            Box::new(NullPipelineLogger),
        );
        Harness {
            use_case,
            opened,
            closed,
            shown,
        }
    }

    fn frames(n: usize) -> Vec<Result<Frame, &'static str>> {
        (0..n).map(|i| Ok(Frame::blank(360, 240, i))).collect()
    }

    fn sent(link: &DryRunLink) -> Vec<RcCommand> {
        link.history()
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                LinkEvent::Rc(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    // --- Tests ---

    #[test]
    fn test_one_command_per_frame_until_source_ends() {
        let face = Region::new(160, 90, 80, 80);
        let mut h = harness(frames(3), vec![vec![face], vec![], vec![face]]);
        let mut link = DryRunLink::new();

        let report = h
            .use_case
            .execute("udp://0.0.0.0:11111", &mut link, &RunOptions::default())
            .unwrap();

        assert_eq!(
            report,
            TrackingReport {
                ticks: 3,
                stop: StopReason::SourceEnded
            }
        );
        assert_eq!(
            sent(&link),
            vec![
                RcCommand::new(0, 0, 0, 16),
                RcCommand::new(0, 20, 0, 0),
                // previous error reset to 0 by the lost tick
                RcCommand::new(0, 0, 0, 16),
            ]
        );
        assert_eq!(
            h.opened.lock().unwrap().as_deref(),
            Some("udp://0.0.0.0:11111")
        );
        assert!(h.closed.load(Ordering::Relaxed));
    }

    #[test]
    fn test_cancel_flag_stops_before_next_frame() {
        let mut h = harness(frames(5), vec![]);
        let mut link = DryRunLink::new();
        let options = RunOptions::default();
        options.cancelled.store(true, Ordering::Relaxed);

        let report = h.use_case.execute("stub", &mut link, &options).unwrap();
        assert_eq!(report.ticks, 0);
        assert_eq!(report.stop, StopReason::Cancelled);
        assert!(sent(&link).is_empty());
    }

    #[test]
    fn test_tick_limit() {
        let mut h = harness(frames(10), vec![]);
        let mut link = DryRunLink::new();
        let options = RunOptions {
            max_ticks: Some(4),
            ..RunOptions::default()
        };
        let report = h.use_case.execute("stub", &mut link, &options).unwrap();
        assert_eq!(report.stop, StopReason::TickLimit);
        assert_eq!(sent(&link).len(), 4);
    }

    #[test]
    fn test_decode_error_ends_run_and_closes_source() {
        let mut h = harness(
            vec![Ok(Frame::blank(360, 240, 0)), Err("stream lost")],
            vec![],
        );
        let mut link = DryRunLink::new();
        let result = h.use_case.execute("stub", &mut link, &RunOptions::default());
        assert!(result.is_err());
        assert_eq!(sent(&link).len(), 1);
        assert!(h.closed.load(Ordering::Relaxed));
    }

    #[test]
    fn test_actuation_failure_does_not_stop_loop() {
        let mut h = harness(frames(3), vec![]);
        let report = h
            .use_case
            .execute("stub", &mut FailingLink, &RunOptions::default())
            .unwrap();
        assert_eq!(report.ticks, 3);
    }

    #[test]
    fn test_display_receives_annotated_frames() {
        let mut h = harness(frames(2), vec![vec![Region::new(100, 50, 60, 60)]]);
        let mut link = DryRunLink::new();
        h.use_case
            .execute("stub", &mut link, &RunOptions::default())
            .unwrap();

        let shown = h.shown.lock().unwrap();
        assert_eq!(shown.len(), 2);
        assert!(shown[0].data().iter().any(|&b| b != 0));
        assert!(shown[1].data().iter().all(|&b| b == 0));
    }
}
