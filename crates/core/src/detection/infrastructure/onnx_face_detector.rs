/// YOLO face detector using ONNX Runtime via `ort`.
///
/// Letterboxes the frame to the model's square input, runs inference,
/// drops low-confidence rows and applies greedy NMS. Boxes are returned in
/// frame coordinates, clipped to the frame.
use std::path::Path;

use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Fallback input resolution when the model's input shape is dynamic.
const DEFAULT_INPUT_SIZE: u32 = 640;

pub const DEFAULT_CONFIDENCE: f64 = 0.5;

const NMS_IOU_THRESH: f64 = 0.45;

/// Letterbox padding value (YOLO convention).
const PAD_GRAY: f32 = 114.0 / 255.0;

pub struct OnnxFaceDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxFaceDetector {
    /// Loads a YOLO face model. Input size comes from the NCHW input shape
    /// when the model declares one.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                ort::value::ValueType::Tensor { ref shape, .. }
                    if shape.len() >= 4 && shape[2] > 0 =>
                {
                    Some(shape[2] as u32)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        log::info!(
            "Loaded face model {} (input {input_size}x{input_size}, confidence {confidence})",
            model_path.display()
        );

        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

impl FaceDetector for OnnxFaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
        let letterboxed = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(letterboxed.tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("face model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        if shape.len() != 3 {
            return Err(format!("unexpected face model output shape: {shape:?}").into());
        }
        let data = tensor.as_slice().ok_or("face model output is not contiguous")?;

        let candidates = parse_rows(
            data,
            &shape,
            self.confidence,
            &letterboxed,
            frame.width(),
            frame.height(),
        );
        let kept = nms(candidates, NMS_IOU_THRESH);
        log::debug!("frame {}: {} face(s)", frame.index(), kept.len());
        Ok(kept.into_iter().map(|c| c.region).collect())
    }
}

struct Letterboxed {
    tensor: ndarray::Array4<f32>,
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

/// Nearest-neighbor resize into a gray-padded `target × target` NCHW tensor.
fn letterbox(frame: &Frame, target_size: u32) -> Letterboxed {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let side = target_size as usize;
    let mut tensor = ndarray::Array4::<f32>::from_elem((1, 3, side, side), PAD_GRAY);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    Letterboxed {
        tensor,
        scale,
        pad_x,
        pad_y,
    }
}

#[derive(Clone, Debug)]
struct Candidate {
    region: Region,
    confidence: f64,
}

/// Decodes `[1, features, boxes]` or `[1, boxes, features]` output, where
/// each row starts `cx, cy, w, h, conf` in letterbox pixels.
fn parse_rows(
    data: &[f32],
    shape: &[usize],
    min_confidence: f64,
    lb: &Letterboxed,
    frame_w: u32,
    frame_h: u32,
) -> Vec<Candidate> {
    // features are always fewer than anchor boxes
    let transposed = shape[1] < shape[2];
    let (num_boxes, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if num_feats < 5 {
        return Vec::new();
    }

    let at = |row: usize, feat: usize| -> f64 {
        let idx = if transposed {
            feat * num_boxes + row
        } else {
            row * num_feats + feat
        };
        data.get(idx).copied().unwrap_or(0.0) as f64
    };

    let unmap_x = |v: f64| ((v - lb.pad_x as f64) / lb.scale).clamp(0.0, frame_w as f64);
    let unmap_y = |v: f64| ((v - lb.pad_y as f64) / lb.scale).clamp(0.0, frame_h as f64);

    (0..num_boxes)
        .filter_map(|i| {
            let confidence = at(i, 4);
            if confidence < min_confidence {
                return None;
            }
            let (cx, cy, w, h) = (at(i, 0), at(i, 1), at(i, 2), at(i, 3));
            let region = Region::from_corners(
                unmap_x(cx - w / 2.0),
                unmap_y(cy - h / 2.0),
                unmap_x(cx + w / 2.0),
                unmap_y(cy + h / 2.0),
            );
            Some(Candidate { region, confidence })
        })
        .collect()
}

/// Greedy NMS: highest confidence first, drop anything overlapping a kept box.
fn nms(mut candidates: Vec<Candidate>, iou_thresh: f64) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for c in candidates {
        if keep.iter().all(|k| k.region.iou(&c.region) <= iou_thresh) {
            keep.push(c);
        }
    }
    keep
}
