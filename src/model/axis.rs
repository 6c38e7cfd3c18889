use chrono::{Datelike, NaiveDate};

/// Unzoomed width of a weekday column, in pixels.
pub const WEEKDAY_WIDTH: f32 = 36.0;
/// Unzoomed width of a weekend column. Narrower, so the day grid is
/// deliberately non-uniform and all conversions must walk actual columns.
pub const WEEKEND_WIDTH: f32 = 14.0;

/// Hard cap on the cumulative-width walk in [`DateAxis::pixel_to_day`].
/// Roughly a century of days; walking past it is an internal bug.
const MAX_DAY_WALK: i64 = 36_600;

/// Tolerance when comparing a pixel coordinate against a column boundary,
/// absorbing float error from the zoom multiply/divide round trip.
const GRID_EPSILON: f32 = 1e-2;

/// Bidirectional mapping between calendar dates, relative day offsets and
/// horizontal pixel coordinates.
///
/// Cheap to construct; the app rebuilds one each frame from the store's
/// persisted `start_date` and `zoom`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateAxis {
    /// Calendar date of relative day 0.
    pub start_date: NaiveDate,
    /// Uniform scale applied to all day widths.
    pub zoom: f32,
}

impl DateAxis {
    pub fn new(start_date: NaiveDate, zoom: f32) -> Self {
        Self { start_date, zoom }
    }

    fn base_day_width(&self, day: i64) -> f32 {
        let date = self.start_date + chrono::Duration::days(day);
        if date.weekday().num_days_from_monday() >= 5 {
            WEEKEND_WIDTH
        } else {
            WEEKDAY_WIDTH
        }
    }

    /// Zoomed width of a single day column.
    pub fn day_width(&self, day: i64) -> f32 {
        self.base_day_width(day) * self.zoom
    }

    /// Pixel coordinate of the left gridline of `day`: the cumulative width
    /// of all columns before it, scaled by zoom.
    pub fn day_to_pixel(&self, day: i64) -> f32 {
        let mut sum = 0.0;
        for d in 0..day.max(0) {
            sum += self.base_day_width(d);
        }
        sum * self.zoom
    }

    /// Pixel width of a span of `duration` columns starting at `start_day`.
    ///
    /// Sums the actual columns rather than multiplying by a single day
    /// width, so spans crossing weekends come out correct.
    pub fn day_span_width(&self, start_day: i64, duration: i64) -> f32 {
        let mut sum = 0.0;
        for d in start_day..start_day + duration.max(0) {
            sum += self.base_day_width(d);
        }
        sum * self.zoom
    }

    /// The day whose half-open pixel interval `[day_start, day_end)`
    /// contains `pixel`. A coordinate exactly on a boundary resolves to the
    /// day that starts there.
    ///
    /// Panics if the walk exceeds [`MAX_DAY_WALK`]; that is an internal
    /// invariant violation, never a user-facing condition.
    pub fn pixel_to_day(&self, pixel: f32) -> i64 {
        let target = pixel.max(0.0) / self.zoom;
        let mut cursor = 0.0;
        for day in 0..MAX_DAY_WALK {
            let width = self.base_day_width(day);
            if cursor + width > target + GRID_EPSILON {
                return day;
            }
            cursor += width;
        }
        panic!("pixel_to_day walked past {MAX_DAY_WALK} days for pixel {pixel}");
    }

    /// Day offset of `date` relative to the axis origin.
    pub fn relative_day_from_date(&self, date: NaiveDate) -> i64 {
        (date - self.start_date).num_days()
    }

    /// Calendar date of relative day `day`. Exact inverse of
    /// [`Self::relative_day_from_date`] for all integers.
    pub fn date_from_relative_day(&self, day: i64) -> NaiveDate {
        self.start_date + chrono::Duration::days(day)
    }

    /// Pixel coordinate of a calendar date's left gridline.
    pub fn date_to_pixel(&self, date: NaiveDate) -> f32 {
        self.day_to_pixel(self.relative_day_from_date(date))
    }

    /// Round `pixel` to the left gridline of its containing day.
    pub fn snap_to_grid(&self, pixel: f32) -> f32 {
        self.day_to_pixel(self.pixel_to_day(pixel))
    }

    /// Round `pixel` to the closer of the containing day's two gridlines,
    /// preferring the right one on an exact tie. Used for the trailing edge
    /// of created/resized spans so a mid-column drop grows the span.
    pub fn snap_prefer_right(&self, pixel: f32) -> f32 {
        let day = self.pixel_to_day(pixel);
        let left = self.day_to_pixel(day);
        let right = self.day_to_pixel(day + 1);
        if pixel - left < right - pixel {
            left
        } else {
            right
        }
    }
}
