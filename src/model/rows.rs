/// Vertical layout of timeline rows.
///
/// Each row is a `row_height` lane followed by a thin `annotation_band`
/// where milestones sit, so the pitch between row tops is the sum of both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowLayout {
    /// Empty space above row 0.
    pub padding: f32,
    pub row_height: f32,
    pub annotation_band: f32,
}

impl Default for RowLayout {
    fn default() -> Self {
        Self {
            padding: 8.0,
            row_height: 44.0,
            annotation_band: 18.0,
        }
    }
}

impl RowLayout {
    /// Vertical distance between the tops of adjacent rows.
    pub fn row_pitch(&self) -> f32 {
        self.row_height + self.annotation_band
    }

    /// Y coordinate of the top of `row`.
    pub fn row_top(&self, row: usize) -> f32 {
        self.padding + row as f32 * self.row_pitch()
    }

    /// The row whose lane contains `y`, clamped to row 0 above the track.
    pub fn row_from_y(&self, y: f32) -> usize {
        let rel = (y - self.padding) / self.row_pitch();
        rel.floor().max(0.0) as usize
    }

    /// Gridline-nearest resolver used only for annotation placement.
    ///
    /// Inside the trailing annotation band the answer is always that row;
    /// inside the leading lane it is whichever row boundary (the band above
    /// or the band below) is vertically closer, clamped at row 0.
    pub fn annotation_row_from_y(&self, y: f32) -> usize {
        let rel = (y - self.padding).max(0.0);
        let pitch = self.row_pitch();
        let row = (rel / pitch).floor() as usize;
        let offset = rel - row as f32 * pitch;
        if offset >= self.row_height {
            row
        } else if offset < self.row_height - offset {
            row.saturating_sub(1)
        } else {
            row
        }
    }

    /// Vertical center of the annotation band under `row`, where milestone
    /// markers are anchored.
    pub fn annotation_center_y(&self, row: usize) -> f32 {
        self.row_top(row) + self.row_height + self.annotation_band / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> RowLayout {
        RowLayout {
            padding: 10.0,
            row_height: 40.0,
            annotation_band: 20.0,
        }
    }

    #[test]
    fn row_top_and_row_from_y_agree() {
        let l = layout();
        for row in 0..5 {
            let top = l.row_top(row);
            assert_eq!(l.row_from_y(top), row);
            assert_eq!(l.row_from_y(top + l.row_pitch() - 0.5), row);
        }
    }

    #[test]
    fn row_from_y_clamps_above_track() {
        let l = layout();
        assert_eq!(l.row_from_y(-100.0), 0);
        assert_eq!(l.row_from_y(0.0), 0);
    }

    #[test]
    fn annotation_band_resolves_to_its_own_row() {
        let l = layout();
        // Band under row 1 spans y = 10 + 60 + 40 .. 10 + 120.
        let band_start = l.row_top(1) + l.row_height;
        assert_eq!(l.annotation_row_from_y(band_start + 1.0), 1);
        assert_eq!(l.annotation_row_from_y(band_start + 19.0), 1);
    }

    #[test]
    fn lane_resolves_to_nearest_boundary() {
        let l = layout();
        let top = l.row_top(2);
        // Upper half of the lane is closer to the band above (row 1).
        assert_eq!(l.annotation_row_from_y(top + 5.0), 1);
        // Lower half is closer to the band below (row 2).
        assert_eq!(l.annotation_row_from_y(top + 35.0), 2);
    }

    #[test]
    fn row_zero_upper_half_clamps_to_zero() {
        let l = layout();
        assert_eq!(l.annotation_row_from_y(l.padding + 2.0), 0);
    }
}
