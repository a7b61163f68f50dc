//! Standard scores over a finite sample.
//!
//! ```text
//! z_i = (x_i - mean(x)) / std(x)
//! ```
//!
//! `std` is the **population** standard deviation (divide by `n`). Stored
//! z-scores depend on this convention, so it must not change between runs.
//! With `n` points no population z-score can exceed `sqrt(n - 1)` in
//! magnitude, which bounds how small a series can still produce outliers.

/// Result of scoring a sample.
#[derive(Debug, Clone, PartialEq)]
pub enum ZScores {
    /// No values.
    Empty,
    /// One value: the standard deviation is undefined.
    Single,
    /// All values identical: every score is 0 by convention.
    Degenerate { n: usize, mean: f64 },
    Scored {
        mean: f64,
        std_dev: f64,
        /// One score per input value, in input order.
        scores: Vec<f64>,
    },
}

/// Running mean; stays finite for any finite input of a single sign.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut mean = 0.0;
    for (i, v) in values.iter().enumerate() {
        mean += (v - mean) / (i + 1) as f64;
    }
    Some(mean)
}

/// Population standard deviation around a precomputed mean.
///
/// Deviations are scaled by the largest one before squaring, so values near
/// `f64::MAX` do not overflow the variance.
pub fn population_std_dev(values: &[f64], mean: f64) -> f64 {
    let scale = values
        .iter()
        .map(|v| (v - mean).abs())
        .fold(0.0_f64, f64::max);
    if values.is_empty() || scale == 0.0 || !scale.is_finite() {
        return scale;
    }
    let scaled_variance = values
        .iter()
        .map(|v| ((v - mean) / scale).powi(2))
        .sum::<f64>()
        / values.len() as f64;
    scale * scaled_variance.sqrt()
}

/// Score every value. Inputs are expected to be finite.
///
/// Returns `Degenerate` when the values are identical, or when their spread
/// exceeds the `f64` range.
pub fn z_scores(values: &[f64]) -> ZScores {
    let n = values.len();
    let Some(mean) = mean(values) else {
        return ZScores::Empty;
    };
    if n < 2 {
        return ZScores::Single;
    }

    // Identical values are checked directly: the rounded mean of e.g.
    // [0.1, 0.1, 0.1] differs from 0.1, which would give a tiny non-zero std.
    let first = values[0];
    if values.iter().all(|v| *v == first) {
        return ZScores::Degenerate { n, mean: first };
    }

    // A span wider than f64 can represent leaves the scores undefined.
    let std_dev = population_std_dev(values, mean);
    if std_dev == 0.0 || !mean.is_finite() || !std_dev.is_finite() {
        return ZScores::Degenerate { n, mean };
    }

    let scores = values.iter().map(|v| (v - mean) / std_dev).collect();
    ZScores::Scored {
        mean,
        std_dev,
        scores,
    }
}

/// Outlier rule: strictly greater than the threshold in absolute value.
pub fn is_outlier(z: f64, threshold: f64) -> bool {
    z.abs() > threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_match_hand_computed_values() {
        let ZScores::Scored {
            mean,
            std_dev,
            scores,
        } = z_scores(&[10.0, 10.0, 10.0, 1000.0])
        else {
            panic!("expected scored sample");
        };

        assert!((mean - 257.5).abs() < 1e-12);
        // sqrt(735075 / 4)
        assert!((std_dev - 428.6825).abs() < 1e-3, "std_dev={std_dev}");
        assert!((scores[3] - 3f64.sqrt()).abs() < 1e-12);
        assert!((scores[0] + 1.0 / 3f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn scores_sum_to_zero() {
        let ZScores::Scored { scores, .. } = z_scores(&[1.0, 4.0, 9.0, 16.0, 25.0]) else {
            panic!("expected scored sample");
        };
        assert!(scores.iter().sum::<f64>().abs() < 1e-9);
    }

    #[test]
    fn small_samples_are_not_scored() {
        assert_eq!(z_scores(&[]), ZScores::Empty);
        assert_eq!(z_scores(&[42.0]), ZScores::Single);
    }

    #[test]
    fn identical_values_are_degenerate() {
        assert_eq!(
            z_scores(&[5.0, 5.0, 5.0]),
            ZScores::Degenerate { n: 3, mean: 5.0 }
        );
        assert_eq!(
            z_scores(&[0.1, 0.1, 0.1]),
            ZScores::Degenerate { n: 3, mean: 0.1 }
        );
    }

    #[test]
    fn huge_values_do_not_overflow() {
        let ZScores::Scored {
            mean,
            std_dev,
            scores,
        } = z_scores(&[f64::MAX, f64::MAX / 2.0, 0.0])
        else {
            panic!("expected scored sample");
        };

        assert!(mean.is_finite() && std_dev.is_finite());
        assert!((scores[0] - 1.5f64.sqrt()).abs() < 1e-9, "scores={scores:?}");
        assert!(scores[1].abs() < 1e-9);
        assert!((scores[2] + 1.5f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn unrepresentable_spread_is_degenerate() {
        assert!(matches!(
            z_scores(&[f64::MAX, -f64::MAX]),
            ZScores::Degenerate { n: 2, .. }
        ));
    }

    #[test]
    fn outlier_rule_is_strict() {
        assert!(!is_outlier(3.0, 3.0));
        assert!(!is_outlier(-3.0, 3.0));
        assert!(is_outlier(-3.0001, 3.0));
        assert!(is_outlier(3.5, 3.0));
    }
}
