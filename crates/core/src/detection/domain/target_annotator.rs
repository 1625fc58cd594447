use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::detection::domain::target_selector::primary_index;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

pub const CANDIDATE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const PRIMARY_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
pub const CENTER_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Draws detection boxes and center dots onto a frame for the debug view.
///
/// Purely cosmetic; the control loop never reads the annotated pixels.
pub struct TargetAnnotator {
    thickness: i32,
    dot_radius: i32,
}

impl TargetAnnotator {
    pub fn new(thickness: i32, dot_radius: i32) -> Self {
        Self {
            thickness: thickness.max(1),
            dot_radius: dot_radius.max(0),
        }
    }

    /// Outlines every region, highlights the one the selector picks, and
    /// marks each center. Anything outside the frame is clipped.
    pub fn annotate(&self, frame: &mut Frame, regions: &[Region]) {
        if regions.is_empty() || frame.channels() != 3 {
            return;
        }
        let (width, height, index) = (frame.width(), frame.height(), frame.index());
        let Some(mut img) = RgbImage::from_raw(width, height, frame.data().to_vec()) else {
            return;
        };

        let primary = primary_index(regions);
        for (i, r) in regions.iter().enumerate() {
            let color = if Some(i) == primary {
                PRIMARY_COLOR
            } else {
                CANDIDATE_COLOR
            };
            self.outline(&mut img, r, color);
            let (cx, cy) = r.center();
            draw_filled_circle_mut(&mut img, (cx, cy), self.dot_radius, CENTER_COLOR);
        }

        *frame = Frame::new(img.into_raw(), width, height, 3, index);
    }

    /// Border grows inward from the region's edge, one ring per pixel.
    fn outline(&self, img: &mut RgbImage, r: &Region, color: Rgb<u8>) {
        for inset in 0..self.thickness {
            let w = r.width - 2 * inset;
            let h = r.height - 2 * inset;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(r.x + inset, r.y + inset).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(img, rect, color);
        }
    }
}

impl Default for TargetAnnotator {
    fn default() -> Self {
        Self::new(2, 5)
    }
}
