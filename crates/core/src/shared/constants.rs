/// YOLO face model trained on WIDER FACE; rows are `[cx, cy, w, h, conf, ...]`.
pub const FACE_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const FACE_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

/// Directory name used under the platform cache/config roots.
pub const APP_DIR_NAME: &str = "FaceTrack";

/// Processing resolution the controller is tuned for.
pub const DEFAULT_FRAME_WIDTH: u32 = 360;
pub const DEFAULT_FRAME_HEIGHT: u32 = 240;

/// Face area (px²) band, at the processing resolution, that counts as
/// "framed": smaller means too far, larger means too close.
pub const DEFAULT_AREA_BAND: (i64, i64) = (6200, 6800);

pub const DEFAULT_GAIN_P: f64 = 0.4;
pub const DEFAULT_GAIN_D: f64 = 0.4;

/// Fixed forward/back speed used outside the area band.
pub const DEFAULT_APPROACH_SPEED: i32 = 20;

/// Tello SDK endpoints.
pub const TELLO_COMMAND_ADDR: &str = "192.168.10.1:8889";
pub const TELLO_VIDEO_URL: &str = "udp://0.0.0.0:11111";

/// Climb applied right after takeoff so the camera sits at face height.
pub const DEFAULT_ASCENT_SPEED: i32 = 20;
pub const DEFAULT_ASCENT_MS: u64 = 1500;

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "avi", "h264", "webm"];
