pub mod frame_display;
pub mod frame_resizer;
pub mod video_source;
