//! Daily price bars and the return series derived from them.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// One trading day of OHLCV data for a single ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl PriceBar {
    /// Creates a bar where open, high, low and close are all `close`.
    #[must_use]
    pub fn flat(date: NaiveDate, close: Decimal) -> Self {
        Self {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: Decimal::ZERO,
        }
    }
}

/// Simple return for one trading day: `close_t / close_{t-1} - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyReturn {
    pub date: NaiveDate,
    pub value: f64,
}

/// Checks that bar dates are strictly increasing.
///
/// Calendar gaps between bars are allowed; weekends and holidays are not
/// missing data.
///
/// # Errors
/// Returns [`PipelineError::DataUnavailable`] naming the first out-of-order date.
pub fn ensure_strictly_increasing(ticker: &str, bars: &[PriceBar]) -> Result<(), PipelineError> {
    for pair in bars.windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(PipelineError::data_unavailable(
                ticker,
                format!(
                    "price dates not strictly increasing: {} follows {}",
                    pair[1].date, pair[0].date
                ),
            ));
        }
    }
    Ok(())
}

/// Computes daily returns from consecutive bars.
///
/// The first bar has no return. A bar whose previous close is zero is skipped
/// rather than producing an infinite value.
#[must_use]
pub fn daily_returns(bars: &[PriceBar]) -> Vec<DailyReturn> {
    bars.windows(2)
        .filter_map(|pair| {
            let prev = pair[0].close;
            if prev.is_zero() {
                return None;
            }
            let value = (pair[1].close / prev - Decimal::ONE).to_f64()?;
            Some(DailyReturn {
                date: pair[1].date,
                value,
            })
        })
        .collect()
}
