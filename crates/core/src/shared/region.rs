/// Axis-aligned face bounding box in frame pixel coordinates.
///
/// `(x, y)` is the top-left corner. Detectors may report boxes that poke
/// out of the frame; consumers should not assume they are clamped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a region from floating-point corner coordinates, rounding
    /// to the nearest pixel. Degenerate boxes collapse to zero size.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let x = x1.round() as i32;
        let y = y1.round() as i32;
        let width = (x2.round() as i32 - x).max(0);
        let height = (y2.round() as i32 - y).max(0);
        Self::new(x, y, width, height)
    }

    /// Center point using integer halving of the box size.
    pub fn center(&self) -> (i32, i32) {
        (
            self.x.saturating_add(self.width / 2),
            self.y.saturating_add(self.height / 2),
        )
    }

    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    pub fn iou(&self, other: &Region) -> f64 {
        let ix1 = self.x.max(other.x);
        let iy1 = self.y.max(other.y);
        let ix2 = (self.x + self.width).min(other.x + other.width);
        let iy2 = (self.y + self.height).min(other.y + other.height);

        let inter = (ix2 - ix1).max(0) as f64 * (iy2 - iy1).max(0) as f64;
        if inter == 0.0 {
            return 0.0;
        }

        let union = self.area() as f64 + other.area() as f64 - inter;
        inter / union
    }
}
