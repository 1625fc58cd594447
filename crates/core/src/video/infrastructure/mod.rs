pub mod ffmpeg_stream_reader;
pub mod image_frame_resizer;
pub mod image_sequence_display;
