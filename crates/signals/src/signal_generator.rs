//! Combines crossover momentum with daily sentiment into trading decisions.
//!
//! For each bar with enough history:
//!
//! ```text
//! combined = w_m * momentum + w_s * sentiment    (sentiment present)
//! combined = momentum                            (momentum-only mode)
//! ```
//!
//! Sentiment is the latest day at or before the decision date, scaled by its
//! confidence, and only if it is no older than the staleness window. The
//! latest correlation result is recorded in the rationale for audit only.

use chrono::NaiveDate;
use sentitrade_core::{
    Action, CorrelationResult, DailySentiment, PipelineError, PriceBar, ScoreComponents, Signal,
    SignalConfig,
};

use crate::crossover::{MaCrossover, MomentumReading};

/// Turns price, sentiment and correlation series into signals.
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    config: SignalConfig,
    crossover: MaCrossover,
}

impl SignalGenerator {
    #[must_use]
    pub fn new(config: &SignalConfig) -> Self {
        Self {
            config: config.clone(),
            crossover: MaCrossover::new(config.short_window, config.long_window),
        }
    }

    /// Generates signals in ascending date order.
    ///
    /// Dates without enough price history are skipped, never defaulted to HOLD.
    /// `sentiment` and `correlations` must be for `ticker` and sorted by date.
    #[must_use]
    pub fn generate(
        &self,
        ticker: &str,
        bars: &[PriceBar],
        sentiment: &[DailySentiment],
        correlations: &[CorrelationResult],
    ) -> Vec<Signal> {
        let readings = self.crossover.readings(bars);
        let mut skipped = 0usize;

        let signals: Vec<Signal> = readings
            .iter()
            .filter_map(|reading| {
                match self.decide(ticker, reading, sentiment, correlations) {
                    Ok(signal) => Some(signal),
                    Err(e) => {
                        skipped += 1;
                        tracing::debug!(
                            ticker = %ticker,
                            date = %reading.date,
                            error = %e,
                            "date skipped"
                        );
                        None
                    }
                }
            })
            .collect();

        if skipped > 0 {
            tracing::debug!(
                ticker = %ticker,
                skipped,
                required = self.crossover.required_history(),
                "dates skipped for insufficient price history"
            );
        }
        signals
    }

    /// Decides one date from its momentum reading.
    ///
    /// # Errors
    /// [`PipelineError::InsufficientPriceHistory`] if fewer than
    /// `max(short_window, long_window)` bars exist at or before the date.
    pub fn decide(
        &self,
        ticker: &str,
        reading: &MomentumReading,
        sentiment: &[DailySentiment],
        correlations: &[CorrelationResult],
    ) -> Result<Signal, PipelineError> {
        let Some((short_ma, long_ma)) = reading.averages else {
            return Err(PipelineError::InsufficientPriceHistory {
                date: reading.date,
                available: reading.bars_seen,
                required: self.crossover.required_history(),
            });
        };

        let momentum = reading.momentum();
        let current = self.current_sentiment(sentiment, reading.date);
        let sentiment_value = current.map(DailySentiment::weighted_polarity);

        let combined = match sentiment_value {
            Some(s) => self.config.momentum_weight * momentum + self.config.sentiment_weight * s,
            None => momentum,
        };
        let action = Action::from_score(combined, self.config.threshold);

        let mut rationale = format!(
            "momentum={momentum:+.0} (sma{}={} sma{}={})",
            self.config.short_window,
            short_ma.round_dp(4),
            self.config.long_window,
            long_ma.round_dp(4),
        );
        match current {
            Some(day) => rationale.push_str(&format!(
                "; sentiment={:+.4} (mean={:+.4} x confidence={:.2} from {})",
                day.weighted_polarity(),
                day.mean_polarity,
                day.confidence,
                day.date
            )),
            None => rationale.push_str("; sentiment=none (momentum-only)"),
        }
        rationale.push_str(&format!(
            "; combined={combined:+.4} vs threshold={:.2}",
            self.config.threshold
        ));
        if let Some(corr) = latest_correlation(correlations, reading.date) {
            rationale.push_str(&format!(
                "; correlation lag={} r={:+.3} n={}",
                corr.lag, corr.coefficient, corr.pair_count
            ));
        }

        Ok(Signal {
            date: reading.date,
            ticker: ticker.to_string(),
            action,
            score_components: ScoreComponents {
                momentum,
                sentiment: sentiment_value,
            },
            combined,
            rationale,
        })
    }

    /// Latest sentiment at or before `date` that is within the staleness window.
    #[must_use]
    pub fn current_sentiment<'a>(
        &self,
        sentiment: &'a [DailySentiment],
        date: NaiveDate,
    ) -> Option<&'a DailySentiment> {
        let idx = sentiment.partition_point(|s| s.date <= date);
        let latest = sentiment[..idx].last()?;
        let age = (date - latest.date).num_days();
        (age <= self.config.staleness_window_days).then_some(latest)
    }
}

fn latest_correlation(
    correlations: &[CorrelationResult],
    date: NaiveDate,
) -> Option<&CorrelationResult> {
    let idx = correlations.partition_point(|c| c.window_end <= date);
    correlations[..idx].last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn day(offset: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .checked_add_days(Days::new(offset))
            .unwrap()
    }

    fn flat_bars(n: u64) -> Vec<PriceBar> {
        (0..n).map(|i| PriceBar::flat(day(i), dec!(50))).collect()
    }

    fn flat_then_rising() -> Vec<PriceBar> {
        let mut bars = flat_bars(20);
        bars.extend((20..25).map(|i| PriceBar::flat(day(i), dec!(50) + Decimal::from(i - 19))));
        bars
    }

    fn daily(offset: u64, mean: f64, confidence: f64) -> DailySentiment {
        DailySentiment {
            date: day(offset),
            ticker: "AAPL".into(),
            mean_polarity: mean,
            post_count: 20,
            confidence,
        }
    }

    fn generator() -> SignalGenerator {
        SignalGenerator::new(&SignalConfig::default())
    }

    #[test]
    fn skips_dates_without_history() {
        let signals = generator().generate("AAPL", &flat_bars(25), &[], &[]);
        // First 19 bars have fewer than 20 bars of history
        assert_eq!(signals.len(), 6);
        assert_eq!(signals[0].date, day(19));
        assert!(signals.iter().all(|s| s.action == Action::Hold));
    }

    #[test]
    fn decide_reports_insufficient_history() {
        let signal_gen = generator();
        let readings = MaCrossover::new(5, 20).readings(&flat_bars(3));
        let err = signal_gen.decide("AAPL", &readings[2], &[], &[]).unwrap_err();
        assert_eq!(
            err,
            PipelineError::InsufficientPriceHistory {
                date: day(2),
                available: 3,
                required: 20,
            }
        );
    }

    #[test]
    fn momentum_only_buy_on_cross() {
        let signals = generator().generate("AAPL", &flat_then_rising(), &[], &[]);
        let on_cross = signals.iter().find(|s| s.date == day(20)).unwrap();

        assert_eq!(on_cross.action, Action::Buy);
        assert_eq!(on_cross.score_components.sentiment, None);
        assert!((on_cross.combined - 1.0).abs() < f64::EPSILON);
        assert!(on_cross.rationale.contains("momentum-only"));

        let before = signals.iter().find(|s| s.date == day(19)).unwrap();
        assert_eq!(before.action, Action::Hold);
    }

    #[test]
    fn sentiment_alone_can_trigger_buy() {
        let sentiment = vec![daily(22, 0.9, 1.0)];
        let signals = generator().generate("AAPL", &flat_bars(25), &sentiment, &[]);
        let signal = signals.iter().find(|s| s.date == day(22)).unwrap();

        assert!((signal.combined - 0.36).abs() < 1e-9);
        assert_eq!(signal.action, Action::Buy);
        assert_eq!(signal.score_components.momentum, 0.0);
        assert_eq!(signal.score_components.sentiment, Some(0.9));
    }

    #[test]
    fn low_confidence_sentiment_is_scaled_down() {
        // 0.9 * 0.5 * 0.4 = 0.18, below threshold
        let sentiment = vec![daily(22, 0.9, 0.5)];
        let signals = generator().generate("AAPL", &flat_bars(25), &sentiment, &[]);
        let signal = signals.iter().find(|s| s.date == day(22)).unwrap();
        assert_eq!(signal.action, Action::Hold);
    }

    #[test]
    fn stale_sentiment_is_ignored() {
        let signal_gen = generator();
        let sentiment = vec![daily(10, -0.9, 1.0)];

        assert!(signal_gen.current_sentiment(&sentiment, day(15)).is_some());
        assert!(signal_gen.current_sentiment(&sentiment, day(16)).is_none());
        // Future sentiment is never used
        assert!(signal_gen.current_sentiment(&sentiment, day(9)).is_none());

        let signals = signal_gen.generate("AAPL", &flat_bars(25), &sentiment, &[]);
        assert!(signals.iter().all(|s| s.score_components.sentiment.is_none()));
    }

    #[test]
    fn negative_sentiment_with_bearish_momentum_sells() {
        let mut bars = flat_bars(20);
        bars.extend((20..25).map(|i| PriceBar::flat(day(i), dec!(50) - Decimal::from(i - 19))));
        let sentiment = vec![daily(20, -0.5, 1.0)];

        let signals = generator().generate("AAPL", &bars, &sentiment, &[]);
        let signal = signals.iter().find(|s| s.date == day(20)).unwrap();
        // 0.6 * -1 + 0.4 * -0.5
        assert!((signal.combined + 0.8).abs() < 1e-9);
        assert_eq!(signal.action, Action::Sell);
    }

    #[test]
    fn rationale_records_latest_correlation() {
        let corr = CorrelationResult {
            window_start: day(5),
            window_end: day(18),
            lag: 1,
            coefficient: 0.4213,
            pair_count: 12,
        };
        let signals = generator().generate("AAPL", &flat_bars(21), &[], &[corr]);
        assert!(signals[0].rationale.contains("correlation lag=1 r=+0.421 n=12"));
    }

    #[test]
    fn output_is_deterministic() {
        let sentiment = vec![daily(18, 0.3, 0.7), daily(21, -0.2, 0.4)];
        let a = generator().generate("AAPL", &flat_then_rising(), &sentiment, &[]);
        let b = generator().generate("AAPL", &flat_then_rising(), &sentiment, &[]);
        assert_eq!(a, b);
        assert!(a.windows(2).all(|w| w[0].date < w[1].date));
    }
}
