use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_source::VideoSource;

/// Demuxer options for live UDP feeds: keep reading through buffer
/// overruns instead of aborting, and give the socket room to absorb bursts.
const UDP_OPTIONS: &[(&str, &str)] = &[("overrun_nonfatal", "1"), ("fifo_size", "50000000")];

/// Decodes a live stream or a video file via ffmpeg-next and yields RGB24
/// frames at the decoded resolution.
pub struct FfmpegStreamReader {
    input_ctx: Option<ffmpeg_next::format::context::Input>,
    decoder: Option<ffmpeg_next::decoder::Video>,
    video_stream_index: usize,
}

// Safety: the reader is owned and driven by a single thread at a time.
// The raw pointers inside ffmpeg types are never shared across threads.
unsafe impl Send for FfmpegStreamReader {}

impl FfmpegStreamReader {
    pub fn new() -> Self {
        Self {
            input_ctx: None,
            decoder: None,
            video_stream_index: 0,
        }
    }
}

impl Default for FfmpegStreamReader {
    fn default() -> Self {
        Self::new()
    }
}

fn is_udp_url(url: &str) -> bool {
    url.starts_with("udp://")
}

impl VideoSource for FfmpegStreamReader {
    fn open(&mut self, url: &str) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let mut options = ffmpeg_next::Dictionary::new();
        if is_udp_url(url) {
            for (k, v) in UDP_OPTIONS {
                options.set(k, v);
            }
        }
        log::info!("Opening video source {url}");
        let ictx = ffmpeg_next::format::input_with_dictionary(&url, options)?;

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;
        let video_stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        // live H.264 may report 0x0 until the first keyframe is decoded
        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            fps,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source: url.to_string(),
        };
        log::debug!("Video source metadata: {metadata:?}");

        self.video_stream_index = video_stream_index;
        self.decoder = Some(decoder);
        self.input_ctx = Some(ictx);
        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let (Some(ictx), Some(decoder)) = (self.input_ctx.as_mut(), self.decoder.as_mut()) else {
            return Box::new(std::iter::once(Err(
                "FfmpegStreamReader: not opened".into()
            )));
        };

        Box::new(StreamFrameIter {
            ictx,
            decoder,
            scaler: None,
            video_stream_index: self.video_stream_index,
            frame_index: 0,
            flushing: false,
            done: false,
        })
    }

    fn close(&mut self) {
        self.decoder = None;
        self.input_ctx = None;
    }
}

/// RGB converter keyed by the decoded geometry it was built for.
struct Scaler {
    context: scaling::Context,
    key: (Pixel, u32, u32),
}

struct StreamFrameIter<'a> {
    ictx: &'a mut ffmpeg_next::format::context::Input,
    decoder: &'a mut ffmpeg_next::decoder::Video,
    scaler: Option<Scaler>,
    video_stream_index: usize,
    frame_index: usize,
    flushing: bool,
    done: bool,
}

impl StreamFrameIter<'_> {
    fn try_receive(&mut self) -> Option<Result<Frame, Box<dyn std::error::Error>>> {
        let mut decoded = Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return None;
        }
        Some(self.convert(&decoded))
    }

    fn convert(&mut self, decoded: &Video) -> Result<Frame, Box<dyn std::error::Error>> {
        let key = (decoded.format(), decoded.width(), decoded.height());
        if self.scaler.as_ref().map(|s| s.key) != Some(key) {
            let context = scaling::Context::get(
                key.0,
                key.1,
                key.2,
                Pixel::RGB24,
                key.1,
                key.2,
                scaling::Flags::BILINEAR,
            )?;
            self.scaler = Some(Scaler { context, key });
        }
        let Some(scaler) = self.scaler.as_mut() else {
            return Err("RGB scaler unavailable".into());
        };

        let mut rgb = Video::empty();
        scaler.context.run(decoded, &mut rgb)?;
        let pixels = extract_rgb_pixels(&rgb, key.1, key.2);
        let frame = Frame::new(pixels, key.1, key.2, 3, self.frame_index);
        self.frame_index += 1;
        Ok(frame)
    }
}

impl Iterator for StreamFrameIter<'_> {
    type Item = Result<Frame, Box<dyn std::error::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if let Some(result) = self.try_receive() {
            return Some(result);
        }

        if self.flushing {
            self.done = true;
            return None;
        }

        loop {
            let Some((stream, packet)) = self.ictx.packets().next() else {
                let _ = self.decoder.send_eof();
                self.flushing = true;
                if let Some(result) = self.try_receive() {
                    return Some(result);
                }
                self.done = true;
                return None;
            };

            if stream.index() != self.video_stream_index {
                continue;
            }

            // corrupt packets are routine on a lossy radio link
            if let Err(e) = self.decoder.send_packet(&packet) {
                log::trace!("dropping undecodable packet: {e}");
                continue;
            }

            if let Some(result) = self.try_receive() {
                return Some(result);
            }
        }
    }
}

/// Copies an RGB24 ffmpeg frame into a tightly packed buffer, dropping
/// per-row stride padding.
fn extract_rgb_pixels(rgb_frame: &Video, width: u32, height: u32) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_bytes]);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_udp_detection() {
        assert!(is_udp_url("udp://0.0.0.0:11111"));
        assert!(!is_udp_url("/tmp/flight.mp4"));
        assert!(!is_udp_url("rtsp://camera/stream"));
    }

    #[test]
    fn test_frames_before_open_yields_error() {
        let mut reader = FfmpegStreamReader::new();
        let mut frames = reader.frames();
        assert!(frames.next().unwrap().is_err());
    }

    #[test]
    fn test_open_missing_file_fails() {
        let mut reader = FfmpegStreamReader::new();
        assert!(reader.open("/nonexistent/flight.mp4").is_err());
    }

    #[test]
    fn test_extract_rgb_pixels_strips_stride() {
        ffmpeg_next::init().unwrap();
        let mut rgb = Video::new(Pixel::RGB24, 3, 2);
        let stride = rgb.stride(0);
        {
            let data = rgb.data_mut(0);
            for row in 0..2 {
                for i in 0..9 {
                    data[row * stride + i] = (row * 10 + i) as u8;
                }
            }
        }
        let pixels = extract_rgb_pixels(&rgb, 3, 2);
        assert_eq!(pixels.len(), 18);
        assert_eq!(pixels[0], 0);
        assert_eq!(pixels[8], 8);
        assert_eq!(pixels[9], 10);
        assert_eq!(pixels[17], 18);
    }
}
