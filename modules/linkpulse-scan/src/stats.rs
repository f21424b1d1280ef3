//! Statistics over a date-bucketed series: summary stats, 2σ anomalies,
//! index-position least-squares trend, and the two pattern flags.
//!
//! The empty series is well-defined everywhere (`None` stats, empty
//! anomaly map, zero trend) and no NaN ever reaches a caller.

use std::collections::HashMap;

use linkpulse_common::{DateSeries, Patterns, SeriesAnalytics, SeriesStats, Trend};

/// Window length for the seasonality check.
pub const SEASONALITY_PERIOD: usize = 7;

/// Correlation above this between consecutive windows counts as seasonal.
const SEASONALITY_THRESHOLD: f64 = 0.7;

/// Adjacent-bucket growth ratio that counts as a rapid increase.
const RAPID_INCREASE_RATIO: f64 = 2.0;

/// Summary statistics over the series values. `None` for an empty series.
///
/// Median is `sorted[n/2]` (the lower median for even n) and the 95th
/// percentile is `sorted[floor(n * 0.95)]`, kept exactly as the legacy
/// analyzer computed them so historical numbers stay comparable.
pub fn series_stats(series: &DateSeries) -> Option<SeriesStats> {
    let values = series.values_in_order();
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.clone();
    sorted.sort_unstable();

    let n = sorted.len();
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n as f64;
    let variance = values
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / n as f64;

    Some(SeriesStats {
        min: sorted[0],
        max: sorted[n - 1],
        median: sorted[n / 2],
        mean,
        percentile95: sorted[((n as f64 * 0.95).floor() as usize).min(n - 1)],
        variance,
    })
}

/// Buckets whose count exceeds mean + 2 population standard deviations.
pub fn detect_anomalies(series: &DateSeries) -> HashMap<String, u32> {
    let Some(stats) = series_stats(series) else {
        return HashMap::new();
    };
    let threshold = stats.mean + 2.0 * stats.variance.sqrt();

    series
        .ordered()
        .into_iter()
        .filter(|&(_, value)| value as f64 > threshold)
        .map(|(label, value)| (label.to_string(), value))
        .collect()
}

/// Ordinary least squares over index positions 0..n-1: bucket order, not
/// real elapsed time. Degenerate inputs (empty, single point) fall back
/// to a flat trend instead of dividing by zero.
pub fn predict_trend(series: &DateSeries) -> Trend {
    let values = series.values_in_order();
    let n = values.len();
    if n == 0 {
        return Trend {
            slope: 0.0,
            intercept: 0.0,
        };
    }

    let nf = n as f64;
    let sum_x = (0..n).sum::<usize>() as f64;
    let sum_y = values.iter().map(|&v| v as f64).sum::<f64>();
    let sum_xy = values
        .iter()
        .enumerate()
        .map(|(i, &v)| i as f64 * v as f64)
        .sum::<f64>();
    let sum_xx = (0..n).map(|i| (i * i) as f64).sum::<f64>();

    let denominator = nf * sum_xx - sum_x * sum_x;
    if denominator == 0.0 {
        return Trend {
            slope: 0.0,
            intercept: sum_y / nf,
        };
    }

    let slope = (nf * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / nf;
    Trend { slope, intercept }
}

/// True when any bucket more than doubles its predecessor.
pub fn rapid_increase(values: &[u32]) -> bool {
    values
        .windows(2)
        .any(|w| w[1] as f64 / w[0] as f64 > RAPID_INCREASE_RATIO)
}

/// Seasonality via windowed autocorrelation: for every start position,
/// correlate the window `[i, i+p)` against `[i+p, i+2p)`. Seasonal when
/// any pair correlates above the threshold. Needs at least two full
/// periods of data; zero-variance windows contribute no signal.
pub fn seasonality(values: &[u32], period: usize) -> bool {
    if period == 0 || values.len() < period * 2 {
        return false;
    }

    for i in 0..=(values.len() - period * 2) {
        let first: Vec<f64> = values[i..i + period].iter().map(|&v| v as f64).collect();
        let second: Vec<f64> = values[i + period..i + period * 2]
            .iter()
            .map(|&v| v as f64)
            .collect();
        if let Some(corr) = pearson_correlation(&first, &second) {
            if corr > SEASONALITY_THRESHOLD {
                return true;
            }
        }
    }

    false
}

/// Pearson correlation of two equal-length samples. `None` when either
/// sample has zero variance (the correlation is undefined there).
fn pearson_correlation(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let var_a: f64 = a.iter().map(|v| (v - mean_a).powi(2)).sum();
    let var_b: f64 = b.iter().map(|v| (v - mean_b).powi(2)).sum();
    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }

    let covariance: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum();
    Some(covariance / (var_a * var_b).sqrt())
}

/// Moving average for report smoothing. The window starts half a window
/// behind each index and is clamped to the series bounds.
pub fn moving_average(values: &[u32], window: usize) -> Vec<f64> {
    if values.is_empty() || window == 0 {
        return Vec::new();
    }
    values
        .iter()
        .enumerate()
        .map(|(idx, _)| {
            let start = idx.saturating_sub(window / 2);
            let end = (start + window).min(values.len());
            let slice = &values[start..end];
            slice.iter().map(|&v| v as f64).sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// Running totals across the series.
pub fn cumulative(values: &[u32]) -> Vec<u32> {
    values
        .iter()
        .scan(0u32, |acc, &v| {
            *acc += v;
            Some(*acc)
        })
        .collect()
}

/// The full analytics bundle for one series.
pub fn analyze_series(series: &DateSeries) -> SeriesAnalytics {
    let values = series.values_in_order();
    SeriesAnalytics {
        stats: series_stats(series),
        anomalies: detect_anomalies(series),
        trend: predict_trend(series),
        patterns: Patterns {
            rapid_increase: rapid_increase(&values),
            seasonality: seasonality(&values, SEASONALITY_PERIOD),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(entries: &[(&str, u32)]) -> DateSeries {
        entries
            .iter()
            .map(|&(label, count)| (label.to_string(), count))
            .collect()
    }

    #[test]
    fn two_bucket_reference_values() {
        let s = series(&[("Jan 2023", 1), ("Feb 2023", 10)]);
        let stats = series_stats(&s).unwrap();

        assert_eq!(stats.min, 1);
        assert_eq!(stats.max, 10);
        assert!((stats.mean - 5.5).abs() < f64::EPSILON);
        assert!((stats.variance - 20.25).abs() < f64::EPSILON);
        // Lower-median of [1, 10] is index 1.
        assert_eq!(stats.median, 10);
        assert_eq!(stats.percentile95, 10);

        // Threshold = 5.5 + 2 * 4.5 = 14.5; 10 does not exceed it.
        assert!(detect_anomalies(&s).is_empty());

        // 10 / 1 = 10 > 2.
        assert!(rapid_increase(&s.values_in_order()));
    }

    #[test]
    fn empty_series_is_well_defined_everywhere() {
        let s = DateSeries::new();
        assert!(series_stats(&s).is_none());
        assert!(detect_anomalies(&s).is_empty());

        let trend = predict_trend(&s);
        assert_eq!(trend.slope, 0.0);
        assert_eq!(trend.intercept, 0.0);
        assert!(trend.slope.is_finite() && trend.intercept.is_finite());

        let analytics = analyze_series(&s);
        assert!(analytics.stats.is_none());
        assert!(!analytics.patterns.rapid_increase);
        assert!(!analytics.patterns.seasonality);
    }

    #[test]
    fn single_bucket_trend_is_flat_not_nan() {
        let s = series(&[("Jan 2023", 4)]);
        let trend = predict_trend(&s);
        assert_eq!(trend.slope, 0.0);
        assert!((trend.intercept - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn anomaly_detection_flags_spikes() {
        let s = series(&[
            ("Jan 2023", 2),
            ("Feb 2023", 2),
            ("Mar 2023", 2),
            ("Apr 2023", 2),
            ("May 2023", 2),
            ("Jun 2023", 2),
            ("Jul 2023", 2),
            ("Aug 2023", 2),
            ("Sep 2023", 40),
        ]);
        let anomalies = detect_anomalies(&s);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies.get("Sep 2023"), Some(&40));
    }

    #[test]
    fn trend_recovers_exact_line() {
        // Values 3, 5, 7, 9: slope 2, intercept 3.
        let s = series(&[
            ("Jan 2023", 3),
            ("Feb 2023", 5),
            ("Mar 2023", 7),
            ("Apr 2023", 9),
        ]);
        let trend = predict_trend(&s);
        assert!((trend.slope - 2.0).abs() < 1e-9);
        assert!((trend.intercept - 3.0).abs() < 1e-9);
        assert!((trend.predict(4.0) - 11.0).abs() < 1e-9);
    }

    #[test]
    fn trend_uses_date_order_not_insertion_order() {
        // Inserted out of calendar order; OLS must see 1, 2, 3.
        let s = series(&[("Mar 2023", 3), ("Jan 2023", 1), ("Feb 2023", 2)]);
        let trend = predict_trend(&s);
        assert!((trend.slope - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rapid_increase_edges() {
        assert!(!rapid_increase(&[]));
        assert!(!rapid_increase(&[5]));
        assert!(!rapid_increase(&[5, 10])); // exactly 2x is not a rapid increase
        assert!(rapid_increase(&[5, 11]));
        // A jump from zero reads as infinite growth.
        assert!(rapid_increase(&[0, 1]));
        // 0 → 0 is no growth at all.
        assert!(!rapid_increase(&[0, 0]));
    }

    #[test]
    fn seasonality_detects_repeating_week() {
        let week = [1u32, 2, 3, 8, 3, 2, 1];
        let mut values = Vec::new();
        values.extend_from_slice(&week);
        values.extend_from_slice(&week);
        assert!(seasonality(&values, SEASONALITY_PERIOD));
    }

    #[test]
    fn seasonality_needs_two_full_periods() {
        let values = [1u32, 2, 3, 8, 3, 2, 1, 1, 2, 3];
        assert!(!seasonality(&values, SEASONALITY_PERIOD));
    }

    #[test]
    fn flat_windows_are_not_seasonal() {
        // Zero variance in every window: correlation undefined, so no
        // seasonality signal rather than a crash.
        let values = [4u32; 14];
        assert!(!seasonality(&values, SEASONALITY_PERIOD));
    }

    #[test]
    fn uncorrelated_noise_is_not_seasonal() {
        let values = [9u32, 1, 5, 2, 8, 0, 4, 1, 9, 0, 3, 7, 2, 6];
        assert!(!seasonality(&values, SEASONALITY_PERIOD));
    }

    #[test]
    fn moving_average_clamps_edges() {
        let avg = moving_average(&[2, 4, 6, 8], 3);
        assert_eq!(avg.len(), 4);
        assert!((avg[0] - 4.0).abs() < f64::EPSILON); // (2+4+6)/3, start clamped
        assert!((avg[1] - 4.0).abs() < f64::EPSILON); // (2+4+6)/3
        assert!((avg[2] - 6.0).abs() < f64::EPSILON); // (4+6+8)/3
        assert!((avg[3] - 7.0).abs() < f64::EPSILON); // (6+8)/2, end clamped
    }

    #[test]
    fn cumulative_running_totals() {
        assert_eq!(cumulative(&[1, 2, 3]), vec![1, 3, 6]);
        assert!(cumulative(&[]).is_empty());
    }
}
