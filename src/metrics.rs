//! Client-side derived metrics: threshold status classification and
//! moving-window trend summaries over fetched time series.
//!
//! Everything here is pure and recomputed on each fetch; nothing derived
//! is ever persisted.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// How many points from each end of the series feed the trend comparison.
const TREND_WINDOW: usize = 10;

/// Percent-change magnitude below which a trend counts as stable.
const STABLE_BAND_PCT: f64 = 1.0;

// ---------------------------------------------------------------------------
// Status classification
// ---------------------------------------------------------------------------

/// Severity of a reading relative to its threshold band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Normal,
    Warning,
    Critical,
}

/// Acceptable `[min, max]` range for one sensor. External configuration,
/// never computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ThresholdBand {
    pub min: f64,
    pub max: f64,
}

impl ThresholdBand {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Classify `value` against `band`.
///
/// Inside `[min, max]` is normal. Outside the band but within
/// `[0.8 * min, 1.2 * max]` is a warning; beyond that is critical.
/// A missing band always classifies as normal.
pub fn classify(value: f64, band: Option<&ThresholdBand>) -> Status {
    let Some(band) = band else {
        return Status::Normal;
    };

    if value >= band.min && value <= band.max {
        Status::Normal
    } else if value < band.min * 0.8 || value > band.max * 1.2 {
        Status::Critical
    } else {
        Status::Warning
    }
}

// ---------------------------------------------------------------------------
// Trend summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

impl Default for TrendDirection {
    fn default() -> Self {
        Self::Stable
    }
}

/// Window statistics plus the older-half vs recent-half comparison.
/// `Default` is the all-zero, stable summary returned when the series is
/// too short to compare.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct TrendSummary {
    pub average: f64,
    pub minimum: f64,
    pub maximum: f64,
    /// Absolute change between the older-half and recent-half averages.
    pub change: f64,
    /// Relative change in percent; 0 when the older average is zero.
    pub percent_change: f64,
    pub direction: TrendDirection,
}

/// Summarise a chronological series of readings.
///
/// The first `min(10, len)` points and the last `min(10, len)` points are
/// averaged and compared. Fewer than two points yields the default
/// (stable, zero-change) summary.
pub fn trend_summary(values: &[f64]) -> TrendSummary {
    if values.len() < 2 {
        return TrendSummary::default();
    }

    let n = TREND_WINDOW.min(values.len());
    let older_avg = mean(&values[..n]);
    let recent_avg = mean(&values[values.len() - n..]);

    let change = recent_avg - older_avg;
    let percent_change = if older_avg == 0.0 {
        0.0
    } else {
        change / older_avg * 100.0
    };

    let direction = if percent_change.abs() < STABLE_BAND_PCT {
        TrendDirection::Stable
    } else if percent_change > 0.0 {
        TrendDirection::Up
    } else {
        TrendDirection::Down
    };

    let minimum = values.iter().copied().fold(f64::INFINITY, f64::min);
    let maximum = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    TrendSummary {
        average: mean(values),
        minimum,
        maximum,
        change,
        percent_change,
        direction,
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn band(min: f64, max: f64) -> ThresholdBand {
        ThresholdBand::new(min, max)
    }

    // -----------------------------------------------------------------------
    // classify
    // -----------------------------------------------------------------------

    #[test]
    fn classify_without_band_is_normal() {
        assert_eq!(classify(9999.0, None), Status::Normal);
        assert_eq!(classify(-9999.0, None), Status::Normal);
    }

    #[test]
    fn classify_inside_band_is_normal() {
        let b = band(20.0, 30.0);
        assert_eq!(classify(25.0, Some(&b)), Status::Normal);
        // Band edges are still normal.
        assert_eq!(classify(20.0, Some(&b)), Status::Normal);
        assert_eq!(classify(30.0, Some(&b)), Status::Normal);
    }

    #[test]
    fn classify_slightly_outside_band_is_warning() {
        let b = band(20.0, 30.0);
        // 35 < 1.2 * 30 = 36
        assert_eq!(classify(35.0, Some(&b)), Status::Warning);
        // 17 > 0.8 * 20 = 16
        assert_eq!(classify(17.0, Some(&b)), Status::Warning);
        // Outer bounds are inclusive on the warning side.
        assert_eq!(classify(36.0, Some(&b)), Status::Warning);
        assert_eq!(classify(16.0, Some(&b)), Status::Warning);
    }

    #[test]
    fn classify_far_outside_band_is_critical() {
        let b = band(20.0, 30.0);
        assert_eq!(classify(37.0, Some(&b)), Status::Critical);
        assert_eq!(classify(15.0, Some(&b)), Status::Critical);
    }

    #[test]
    fn classify_is_monotonic_in_band_width() {
        // Widening the band must never raise the severity of a fixed value.
        fn rank(s: Status) -> u8 {
            match s {
                Status::Normal => 0,
                Status::Warning => 1,
                Status::Critical => 2,
            }
        }

        let value = 35.0;
        let mut prev = rank(classify(value, Some(&band(20.0, 25.0))));
        for max in [28.0, 30.0, 33.0, 35.0, 40.0] {
            let cur = rank(classify(value, Some(&band(20.0, max))));
            assert!(cur <= prev, "widening to max={max} raised severity");
            prev = cur;
        }
    }

    // -----------------------------------------------------------------------
    // trend_summary
    // -----------------------------------------------------------------------

    #[test]
    fn trend_empty_series_is_default() {
        let t = trend_summary(&[]);
        assert_eq!(t, TrendSummary::default());
        assert_eq!(t.direction, TrendDirection::Stable);
        assert_eq!(t.percent_change, 0.0);
    }

    #[test]
    fn trend_single_point_is_default() {
        assert_eq!(trend_summary(&[42.0]), TrendSummary::default());
    }

    #[test]
    fn trend_flat_series_is_stable() {
        let values = vec![50.0; 30];
        let t = trend_summary(&values);
        assert_eq!(t.direction, TrendDirection::Stable);
        assert_eq!(t.percent_change, 0.0);
        assert_eq!(t.average, 50.0);
        assert_eq!(t.minimum, 50.0);
        assert_eq!(t.maximum, 50.0);
    }

    #[test]
    fn trend_five_percent_rise_is_up() {
        // Older half averages 100, recent half averages 105.
        let mut values = vec![100.0; 10];
        values.extend(vec![105.0; 10]);
        let t = trend_summary(&values);
        assert!((t.percent_change - 5.0).abs() < 1e-9);
        assert!((t.change - 5.0).abs() < 1e-9);
        assert_eq!(t.direction, TrendDirection::Up);
    }

    #[test]
    fn trend_drop_is_down() {
        let mut values = vec![100.0; 10];
        values.extend(vec![90.0; 10]);
        let t = trend_summary(&values);
        assert!((t.percent_change + 10.0).abs() < 1e-9);
        assert_eq!(t.direction, TrendDirection::Down);
    }

    #[test]
    fn trend_sub_one_percent_change_is_stable() {
        let mut values = vec![1000.0; 10];
        values.extend(vec![1005.0; 10]); // +0.5 %
        let t = trend_summary(&values);
        assert_eq!(t.direction, TrendDirection::Stable);
        assert!((t.percent_change - 0.5).abs() < 1e-9);
    }

    #[test]
    fn trend_exactly_one_percent_is_up() {
        let mut values = vec![100.0; 10];
        values.extend(vec![101.0; 10]);
        let t = trend_summary(&values);
        assert_eq!(t.direction, TrendDirection::Up);
    }

    #[test]
    fn trend_short_series_uses_shrunk_window() {
        // Two points: the window shrinks to min(10, len) = 2, so both
        // halves cover the whole series and the comparison is flat.
        let t = trend_summary(&[10.0, 20.0]);
        assert_eq!(t.direction, TrendDirection::Stable);
        assert_eq!(t.average, 15.0);
        assert_eq!(t.minimum, 10.0);
        assert_eq!(t.maximum, 20.0);
    }

    #[test]
    fn trend_zero_older_average_does_not_divide_by_zero() {
        let mut values = vec![0.0; 10];
        values.extend(vec![5.0; 10]);
        let t = trend_summary(&values);
        assert_eq!(t.percent_change, 0.0);
        assert_eq!(t.direction, TrendDirection::Stable);
        assert!((t.change - 5.0).abs() < 1e-9);
    }

    #[test]
    fn trend_window_caps_at_ten_points() {
        // 40 points: only the first and last 10 matter for the comparison.
        let mut values = vec![100.0; 10];
        values.extend(vec![500.0; 20]); // middle noise
        values.truncate(30);
        values.extend(vec![110.0; 10]);
        let t = trend_summary(&values);
        assert!((t.percent_change - 10.0).abs() < 1e-9);
        assert_eq!(t.direction, TrendDirection::Up);
    }
}
