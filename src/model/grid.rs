use super::axis::DateAxis;
use super::rows::RowLayout;

/// Pointer events closer than this to a create-affordance center target the
/// affordance itself, not the timeline background beneath it.
pub const AFFORDANCE_RADIUS: f32 = 15.0;

/// A (day, row) anchor point for annotation placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridIntersection {
    pub day: i64,
    pub row: usize,
}

/// Resolves pointer positions to the nearest grid intersection.
#[derive(Debug, Clone, Copy)]
pub struct GridIndex<'a> {
    pub axis: &'a DateAxis,
    pub rows: &'a RowLayout,
}

impl<'a> GridIndex<'a> {
    pub fn new(axis: &'a DateAxis, rows: &'a RowLayout) -> Self {
        Self { axis, rows }
    }

    /// The intersection nearest to a pointer position, using the left-closed
    /// day resolution horizontally and the gridline-nearest row resolver
    /// vertically.
    pub fn intersection_at(&self, x: f32, y: f32) -> GridIntersection {
        GridIntersection {
            day: self.axis.pixel_to_day(x),
            row: self.rows.annotation_row_from_y(y),
        }
    }

    /// Pixel center of an intersection's affordance marker: on the day's
    /// left gridline, in the middle of the row's annotation band.
    pub fn intersection_center(&self, at: GridIntersection) -> (f32, f32) {
        (
            self.axis.day_to_pixel(at.day),
            self.rows.annotation_center_y(at.row),
        )
    }

    /// Whether a pointer position falls inside the affordance exclusion
    /// zone around an intersection's visual center.
    pub fn within_affordance(&self, at: GridIntersection, x: f32, y: f32) -> bool {
        let (cx, cy) = self.intersection_center(at);
        let (dx, dy) = (x - cx, y - cy);
        dx * dx + dy * dy <= AFFORDANCE_RADIUS * AFFORDANCE_RADIUS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fixtures() -> (DateAxis, RowLayout) {
        (
            DateAxis::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 1.0),
            RowLayout {
                padding: 10.0,
                row_height: 40.0,
                annotation_band: 20.0,
            },
        )
    }

    #[test]
    fn combines_day_and_row_resolution() {
        let (axis, rows) = fixtures();
        let grid = GridIndex::new(&axis, &rows);
        let x = axis.day_to_pixel(3) + 2.0;
        let y = rows.row_top(1) + rows.row_height + 5.0; // inside row 1's band
        assert_eq!(
            grid.intersection_at(x, y),
            GridIntersection { day: 3, row: 1 }
        );
    }

    #[test]
    fn affordance_radius_is_respected() {
        let (axis, rows) = fixtures();
        let grid = GridIndex::new(&axis, &rows);
        let at = GridIntersection { day: 2, row: 0 };
        let (cx, cy) = grid.intersection_center(at);
        assert!(grid.within_affordance(at, cx + 14.0, cy));
        assert!(!grid.within_affordance(at, cx + 16.0, cy));
        assert!(grid.within_affordance(at, cx + 9.0, cy + 9.0));
    }
}
