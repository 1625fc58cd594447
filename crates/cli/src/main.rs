use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::Ordering;
use std::time::Duration;

use clap::Parser;

use facetrack_core::control::domain::rc_command::RcCommand;
use facetrack_core::control::domain::tracking_config::{
    NoTargetPolicy, RoundingPolicy, TrackingConfig,
};
use facetrack_core::control::domain::tracking_controller::TrackingController;
use facetrack_core::detection::domain::face_detector::FaceDetector;
use facetrack_core::detection::infrastructure::model_resolver;
use facetrack_core::detection::infrastructure::onnx_face_detector::{
    OnnxFaceDetector, DEFAULT_CONFIDENCE,
};
use facetrack_core::drone::domain::drone_link::DroneLink;
use facetrack_core::drone::domain::flight_session::{FlightSession, LaunchPlan};
use facetrack_core::drone::infrastructure::dry_run_link::DryRunLink;
use facetrack_core::drone::infrastructure::tello_udp_link::TelloUdpLink;
use facetrack_core::pipeline::face_tracker::FaceTracker;
use facetrack_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facetrack_core::pipeline::track_face_use_case::{RunOptions, TrackFaceUseCase};
use facetrack_core::shared::constants::{
    DEFAULT_ASCENT_MS, DEFAULT_ASCENT_SPEED, FACE_MODEL_NAME, FACE_MODEL_URL, TELLO_COMMAND_ADDR,
    TELLO_VIDEO_URL, VIDEO_EXTENSIONS,
};
use facetrack_core::video::domain::frame_display::FrameDisplay;
use facetrack_core::video::infrastructure::ffmpeg_stream_reader::FfmpegStreamReader;
use facetrack_core::video::infrastructure::image_frame_resizer::ImageFrameResizer;
use facetrack_core::video::infrastructure::image_sequence_display::ImageSequenceDisplay;

/// Fly a Tello so the largest face in view stays centered and framed.
///
/// Press Ctrl-C to land.
#[derive(Parser)]
#[command(name = "facetrack")]
struct Cli {
    /// Video source: ffmpeg URL or a recorded file.
    #[arg(long, default_value = TELLO_VIDEO_URL)]
    source: String,

    /// Drone control address.
    #[arg(long, default_value = TELLO_COMMAND_ADDR)]
    tello_addr: String,

    /// Don't talk to a drone; log commands instead.
    #[arg(long)]
    dry_run: bool,

    /// JSON tracking config; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Processing frame width.
    #[arg(long)]
    frame_width: Option<u32>,

    /// Processing frame height.
    #[arg(long)]
    frame_height: Option<u32>,

    /// Face area below which the drone approaches.
    #[arg(long)]
    area_band_low: Option<i64>,

    /// Face area at or above which the drone backs away.
    #[arg(long)]
    area_band_high: Option<i64>,

    /// Proportional yaw gain.
    #[arg(long)]
    gain_p: Option<f64>,

    /// Derivative yaw gain.
    #[arg(long)]
    gain_d: Option<f64>,

    /// Forward/back speed outside the area band (0-100).
    #[arg(long)]
    approach_speed: Option<i32>,

    /// Forward/back behavior with no face: approach or hold.
    #[arg(long)]
    no_target_policy: Option<NoTargetPolicy>,

    /// Yaw integer conversion: truncate or nearest.
    #[arg(long)]
    rounding: Option<RoundingPolicy>,

    /// Face model path (skips the cache and download).
    #[arg(long)]
    model: Option<PathBuf>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f64,

    /// Save annotated frames to this directory.
    #[arg(long)]
    debug_dir: Option<PathBuf>,

    /// Save every Nth annotated frame.
    #[arg(long, default_value = "1")]
    debug_every: usize,

    /// Stop (and land) after this many frames.
    #[arg(long)]
    max_frames: Option<usize>,

    /// Climb speed right after takeoff (0-100).
    #[arg(long, default_value_t = DEFAULT_ASCENT_SPEED)]
    ascent_speed: i32,

    /// Climb duration after takeoff, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_ASCENT_MS)]
    ascent_ms: u64,

    /// Print the effective tracking config as JSON and exit.
    #[arg(long)]
    print_config: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = build_config(&cli)?;
    if cli.print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }
    log::info!("Tracking config: {config:?}");

    let detector = build_detector(&cli)?;
    let tracker = FaceTracker::new(
        detector,
        Box::new(ImageFrameResizer::new()),
        TrackingController::new(config),
    );
    let display: Option<Box<dyn FrameDisplay>> = match &cli.debug_dir {
        Some(dir) => Some(Box::new(ImageSequenceDisplay::new(
            dir.clone(),
            cli.debug_every,
        )?)),
        None => None,
    };
    let mut use_case = TrackFaceUseCase::new(
        Box::new(FfmpegStreamReader::new()),
        tracker,
        display,
        Box::new(StdoutPipelineLogger::default()),
    );

    let options = RunOptions {
        max_ticks: cli.max_frames,
        ..RunOptions::default()
    };
    let cancelled = options.cancelled.clone();
    ctrlc::set_handler(move || {
        log::info!("Interrupt received, landing...");
        cancelled.store(true, Ordering::Relaxed);
    })?;

    let link: Box<dyn DroneLink> = if cli.dry_run {
        log::info!("Dry run: no drone commands will be sent");
        Box::new(DryRunLink::new())
    } else {
        Box::new(TelloUdpLink::new(&cli.tello_addr)?)
    };
    let plan = LaunchPlan {
        ascent: RcCommand::new(0, 0, cli.ascent_speed, 0),
        ascent_duration: Duration::from_millis(cli.ascent_ms),
    };

    let mut session = FlightSession::start(link, &plan)?;
    let tracked = use_case.execute(&cli.source, session.link(), &options);
    let landed = session.finish();

    let report = tracked?;
    landed?;
    log::info!("Done: {} ticks ({:?})", report.ticks, report.stop);
    Ok(())
}

fn build_config(cli: &Cli) -> Result<TrackingConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => TrackingConfig::load(path)?,
        None => TrackingConfig::default(),
    };

    if let Some(v) = cli.frame_width {
        config.frame_width = v;
    }
    if let Some(v) = cli.frame_height {
        config.frame_height = v;
    }
    if let Some(v) = cli.area_band_low {
        config.area_band_low = v;
    }
    if let Some(v) = cli.area_band_high {
        config.area_band_high = v;
    }
    if let Some(v) = cli.gain_p {
        config.gain_p = v;
    }
    if let Some(v) = cli.gain_d {
        config.gain_d = v;
    }
    if let Some(v) = cli.approach_speed {
        config.approach_speed = v;
    }
    if let Some(v) = cli.no_target_policy {
        config.no_target_policy = v;
    }
    if let Some(v) = cli.rounding {
        config.rounding = v;
    }

    config.validate()?;
    Ok(config)
}

fn build_detector(cli: &Cli) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {FACE_MODEL_NAME}");
    let model_path = model_resolver::resolve(
        cli.model.as_deref(),
        FACE_MODEL_NAME,
        FACE_MODEL_URL,
        None,
        Some(Box::new(download_progress)),
    )?;
    Ok(Box::new(OnnxFaceDetector::new(&model_path, cli.confidence)?))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if cli.debug_every == 0 {
        return Err("--debug-every must be at least 1".into());
    }
    if !(0..=100).contains(&cli.ascent_speed) {
        return Err(format!(
            "Ascent speed must be between 0 and 100, got {}",
            cli.ascent_speed
        )
        .into());
    }
    if is_video_file(&cli.source) && !Path::new(&cli.source).exists() {
        return Err(format!("Video file not found: {}", cli.source).into());
    }
    if is_video_file(&cli.source) && !cli.dry_run {
        log::warn!("Flying a real drone from a recorded video; did you mean --dry-run?");
    }
    Ok(())
}

fn is_video_file(source: &str) -> bool {
    !source.contains("://")
        && Path::new(source)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false)
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
}
