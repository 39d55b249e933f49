//! Moving-average crossover momentum.
//!
//! Tracks a short and a long simple moving average of the close and reports a
//! regime of +1 (bullish), -1 (bearish) or 0. The regime only changes on a
//! crossover and persists between them; it is 0 until the first cross.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sentitrade_core::PriceBar;
use std::collections::VecDeque;

/// Direction of a moving-average cross.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cross {
    Bullish,
    Bearish,
}

/// Moving averages and regime as of one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumReading {
    pub date: NaiveDate,
    /// Bars at or before `date`
    pub bars_seen: usize,
    /// `(short, long)` averages once both windows are full
    pub averages: Option<(Decimal, Decimal)>,
    /// Cross that happened on this bar, if any
    pub cross: Option<Cross>,
    /// Persisted regime: -1, 0 or +1
    pub regime: i8,
}

impl MomentumReading {
    #[must_use]
    pub fn momentum(&self) -> f64 {
        f64::from(self.regime)
    }
}

/// Short/long simple moving-average crossover over closing prices.
#[derive(Debug, Clone)]
pub struct MaCrossover {
    short_window: usize,
    long_window: usize,
}

impl MaCrossover {
    #[must_use]
    pub fn new(short_window: usize, long_window: usize) -> Self {
        Self {
            short_window: short_window.max(1),
            long_window: long_window.max(1),
        }
    }

    /// Bars needed before both averages exist.
    #[must_use]
    pub fn required_history(&self) -> usize {
        self.short_window.max(self.long_window)
    }

    fn calculate_ma(prices: &VecDeque<Decimal>) -> Decimal {
        let sum: Decimal = prices.iter().sum();
        sum / Decimal::from(prices.len())
    }

    /// Produces one reading per bar, in bar order.
    ///
    /// A bullish cross needs the previous short average at or below the
    /// previous long one and the current short strictly above the current
    /// long; bearish is symmetric.
    #[must_use]
    pub fn readings(&self, bars: &[PriceBar]) -> Vec<MomentumReading> {
        let mut short_prices = VecDeque::with_capacity(self.short_window + 1);
        let mut long_prices = VecDeque::with_capacity(self.long_window + 1);
        let mut previous: Option<(Decimal, Decimal)> = None;
        let mut regime = 0i8;

        bars.iter()
            .enumerate()
            .map(|(i, bar)| {
                short_prices.push_back(bar.close);
                long_prices.push_back(bar.close);
                if short_prices.len() > self.short_window {
                    short_prices.pop_front();
                }
                if long_prices.len() > self.long_window {
                    long_prices.pop_front();
                }

                let bars_seen = i + 1;
                let averages = (bars_seen >= self.required_history()).then(|| {
                    (
                        Self::calculate_ma(&short_prices),
                        Self::calculate_ma(&long_prices),
                    )
                });

                let cross = match (previous, averages) {
                    (Some((prev_short, prev_long)), Some((short, long))) => {
                        if prev_short <= prev_long && short > long {
                            Some(Cross::Bullish)
                        } else if prev_short >= prev_long && short < long {
                            Some(Cross::Bearish)
                        } else {
                            None
                        }
                    }
                    _ => None,
                };

                match cross {
                    Some(Cross::Bullish) => regime = 1,
                    Some(Cross::Bearish) => regime = -1,
                    None => {}
                }
                previous = averages;

                MomentumReading {
                    date: bar.date,
                    bars_seen,
                    averages,
                    cross,
                    regime,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;
    use rust_decimal_macros::dec;

    fn bars(closes: &[Decimal]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| PriceBar::flat(start.checked_add_days(Days::new(i as u64)).unwrap(), *c))
            .collect()
    }

    #[test]
    fn no_averages_before_long_window_fills() {
        let readings = MaCrossover::new(2, 4).readings(&bars(&[dec!(1), dec!(2), dec!(3), dec!(4)]));
        assert!(readings[..3].iter().all(|r| r.averages.is_none()));
        assert_eq!(readings[3].averages, Some((dec!(3.5), dec!(2.5))));
        // First full bar has nothing to cross from
        assert_eq!(readings[3].cross, None);
        assert_eq!(readings[3].regime, 0);
    }

    #[test]
    fn flat_then_rising_crosses_on_first_rise() {
        let mut closes = vec![dec!(100); 20];
        closes.extend((1..=5).map(|i| dec!(100) + Decimal::from(i)));
        let readings = MaCrossover::new(5, 20).readings(&bars(&closes));

        assert_eq!(readings[19].regime, 0);
        assert_eq!(readings[20].cross, Some(Cross::Bullish));
        assert_eq!(readings[20].regime, 1);
        // Regime persists without new crosses
        assert!(readings[21..].iter().all(|r| r.regime == 1 && r.cross.is_none()));
    }

    #[test]
    fn bearish_cross_flips_regime() {
        let closes = [
            dec!(10), dec!(10), dec!(10), dec!(12), dec!(14), dec!(9), dec!(5), dec!(4),
        ];
        let readings = MaCrossover::new(2, 3).readings(&bars(&closes));

        let crosses: Vec<_> = readings.iter().filter_map(|r| r.cross).collect();
        assert_eq!(crosses, vec![Cross::Bullish, Cross::Bearish]);
        assert_eq!(readings.last().unwrap().regime, -1);
    }

    #[test]
    fn touching_without_crossing_keeps_regime() {
        let closes = [dec!(10), dec!(10), dec!(10), dec!(13), dec!(7)];
        let readings = MaCrossover::new(2, 3).readings(&bars(&closes));
        assert_eq!(readings[3].cross, Some(Cross::Bullish));
        // Both averages are 10 on the last bar
        assert_eq!(readings[4].averages, Some((dec!(10), dec!(10))));
        assert_eq!(readings[4].cross, None);
        assert_eq!(readings[4].regime, 1);
    }
}
