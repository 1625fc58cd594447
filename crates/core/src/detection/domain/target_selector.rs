use crate::shared::region::Region;

/// The face driving this tick, reduced to what the controller needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Target {
    pub center_x: i32,
    pub center_y: i32,
    pub area: i64,
}

impl Target {
    /// Sentinel for "no face this tick".
    pub const NONE: Target = Target {
        center_x: 0,
        center_y: 0,
        area: 0,
    };

    pub fn from_region(region: &Region) -> Self {
        let (center_x, center_y) = region.center();
        Self {
            center_x,
            center_y,
            area: region.area(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        *self == Self::NONE
    }
}

/// Index of the largest region; the first one wins a tie.
pub fn primary_index(regions: &[Region]) -> Option<usize> {
    let mut best: Option<(usize, i64)> = None;
    for (i, r) in regions.iter().enumerate() {
        let area = r.area();
        if best.map_or(true, |(_, a)| area > a) {
            best = Some((i, area));
        }
    }
    best.map(|(i, _)| i)
}

/// Picks the largest face, or [`Target::NONE`] when there are none.
pub fn select_target(regions: &[Region]) -> Target {
    primary_index(regions)
        .map(|i| Target::from_region(&regions[i]))
        .unwrap_or(Target::NONE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yields_sentinel() {
        let t = select_target(&[]);
        assert_eq!(t, Target::NONE);
        assert!(t.is_sentinel());
        assert_eq!(primary_index(&[]), None);
    }

    #[test]
    fn test_single_region() {
        let t = select_target(&[Region::new(160, 90, 80, 80)]);
        assert_eq!(
            t,
            Target {
                center_x: 200,
                center_y: 130,
                area: 6400
            }
        );
        assert!(!t.is_sentinel());
    }

    #[test]
    fn test_largest_wins_regardless_of_order() {
        let small = Region::new(10, 10, 20, 25); // 500
        let large = Region::new(200, 100, 90, 100); // 9000
        let expected = Target {
            center_x: 245,
            center_y: 150,
            area: 9000,
        };
        assert_eq!(select_target(&[small, large]), expected);
        assert_eq!(select_target(&[large, small]), expected);
    }

    #[test]
    fn test_tie_takes_first() {
        let a = Region::new(0, 0, 40, 40);
        let b = Region::new(100, 100, 40, 40);
        assert_eq!(primary_index(&[a, b]), Some(0));
        assert_eq!(select_target(&[b, a]).center_x, 120);
    }

    #[test]
    fn test_zero_sized_region_still_counts_as_detection() {
        let t = select_target(&[Region::new(50, 60, 0, 0)]);
        assert_eq!(t.center_x, 50);
        assert_eq!(t.area, 0);
    }
}
