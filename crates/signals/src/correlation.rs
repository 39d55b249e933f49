//! Rolling lagged correlation between daily sentiment and daily returns.
//!
//! For every window of `W` consecutive returns, each lag in `0..=L` pairs the
//! return on day `d` with the mean polarity on calendar day `d - lag`. Days
//! missing on either side are dropped pairwise. The lag with the largest
//! absolute coefficient wins; ties go to the smaller lag.

use chrono::{Days, NaiveDate};
use sentitrade_core::{
    CorrelationConfig, CorrelationResult, DailyReturn, DailySentiment, PipelineError,
};
use std::collections::HashMap;

/// Calculates the Pearson correlation coefficient between two series.
///
/// Returns `None` when the series differ in length, have fewer than two
/// points, or either side has zero variance.
#[must_use]
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 || is_constant(x) || is_constant(y) {
        return None;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;

    for (xi, yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    // Separate roots keep small variances from underflowing the product.
    let denominator = var_x.sqrt() * var_y.sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return None;
    }

    Some((covariance / denominator).clamp(-1.0, 1.0))
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Best-lag search over rolling windows.
#[derive(Debug, Clone)]
pub struct CorrelationEngine {
    window: usize,
    max_lag: u32,
    min_pairs: usize,
}

impl CorrelationEngine {
    #[must_use]
    pub fn new(config: &CorrelationConfig) -> Self {
        Self {
            window: config.window.max(1),
            max_lag: config.max_lag,
            min_pairs: config.min_pairs,
        }
    }

    /// Computes one result per window end that has enough data.
    ///
    /// `sentiment` must belong to a single ticker; `returns` must be in
    /// ascending date order. Windows without `min_pairs` valid pairs on any
    /// lag are omitted.
    #[must_use]
    pub fn analyze(
        &self,
        sentiment: &[DailySentiment],
        returns: &[DailyReturn],
    ) -> Vec<CorrelationResult> {
        let by_date: HashMap<NaiveDate, f64> = sentiment
            .iter()
            .map(|s| (s.date, s.mean_polarity))
            .collect();

        if returns.len() < self.window {
            return Vec::new();
        }

        (self.window - 1..returns.len())
            .filter_map(|end| {
                let window = &returns[end + 1 - self.window..=end];
                match self.evaluate_window(&by_date, window) {
                    Ok(result) => Some(result),
                    Err(e) => {
                        tracing::debug!(error = %e, "correlation window omitted");
                        None
                    }
                }
            })
            .collect()
    }

    /// Evaluates a single window of returns against sentiment keyed by date.
    ///
    /// # Errors
    /// [`PipelineError::InsufficientCorrelationData`] if no lag has at least
    /// `min_pairs` pairs with a defined coefficient.
    pub fn evaluate_window(
        &self,
        sentiment_by_date: &HashMap<NaiveDate, f64>,
        window: &[DailyReturn],
    ) -> Result<CorrelationResult, PipelineError> {
        let (Some(first), Some(last)) = (window.first(), window.last()) else {
            return Err(PipelineError::InsufficientCorrelationData {
                window_end: NaiveDate::MIN,
                pairs: 0,
                required: self.min_pairs,
            });
        };

        let mut best: Option<CorrelationResult> = None;
        let mut most_pairs = 0;

        for lag in 0..=self.max_lag {
            let (xs, ys): (Vec<f64>, Vec<f64>) = window
                .iter()
                .filter_map(|r| {
                    let day = r.date.checked_sub_days(Days::new(u64::from(lag)))?;
                    sentiment_by_date.get(&day).map(|s| (*s, r.value))
                })
                .unzip();

            most_pairs = most_pairs.max(xs.len());
            if xs.len() < self.min_pairs {
                continue;
            }
            let Some(coefficient) = pearson_correlation(&xs, &ys) else {
                continue;
            };

            let improves = best
                .as_ref()
                .map_or(true, |b| coefficient.abs() > b.coefficient.abs());
            if improves {
                best = Some(CorrelationResult {
                    window_start: first.date,
                    window_end: last.date,
                    lag,
                    coefficient,
                    pair_count: xs.len(),
                });
            }
        }

        best.ok_or(PipelineError::InsufficientCorrelationData {
            window_end: last.date,
            pairs: most_pairs,
            required: self.min_pairs,
        })
    }
}
