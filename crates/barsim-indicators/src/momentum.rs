//! Momentum indicators.

use barsim_core::error::IndicatorError;
use barsim_core::traits::Indicator;

/// Relative Strength Index (RSI).
///
/// Measures the speed and magnitude of recent price changes to evaluate
/// overbought or oversold conditions. Gains and losses are smoothed with
/// Wilder's method and combined as `100 * gain / (gain + loss)`, which stays
/// within [0, 100] without clamping. A window with no movement at all reads 50.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    /// Create a new RSI indicator.
    ///
    /// Common periods are 14 (default) or 9.
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        if period == 0 {
            return Err(IndicatorError::InvalidParameter(
                "RSI period must be greater than 0".into(),
            ));
        }
        Ok(Self { period })
    }

    #[inline]
    fn ratio(avg_gain: f64, avg_loss: f64) -> f64 {
        let total = avg_gain + avg_loss;
        if total == 0.0 {
            50.0
        } else {
            // ratio first; g / (g + l) never rounds above 1
            100.0 * (avg_gain / total)
        }
    }
}

impl Indicator for Rsi {
    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        let mut result = vec![f64::NAN; data.len()];
        if data.len() <= self.period {
            return result;
        }

        let period_f64 = self.period as f64;
        let split = |i: usize| {
            let change = data[i] - data[i - 1];
            if change > 0.0 {
                (change, 0.0)
            } else {
                (0.0, -change)
            }
        };

        // Initial averages over the first `period` deltas
        let (mut avg_gain, mut avg_loss) = (1..=self.period)
            .map(split)
            .fold((0.0, 0.0), |(g, l), (dg, dl)| (g + dg, l + dl));
        avg_gain /= period_f64;
        avg_loss /= period_f64;
        result[self.period] = Self::ratio(avg_gain, avg_loss);

        // Wilder's smoothing: avg = (prev_avg * (period-1) + value) / period
        for i in (self.period + 1)..data.len() {
            let (gain, loss) = split(i);
            avg_gain = (avg_gain * (period_f64 - 1.0) + gain) / period_f64;
            avg_loss = (avg_loss * (period_f64 - 1.0) + loss) / period_f64;
            result[i] = Self::ratio(avg_gain, avg_loss);
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "RSI"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_rsi_basic() {
        let rsi = Rsi::new(14).unwrap();
        let data: Vec<f64> = (0..30)
            .map(|i| 100.0 + (i as f64 * 0.5).sin() * 5.0)
            .collect();

        let result = rsi.calculate(&data);
        assert_eq!(result.len(), data.len());
        assert!(result[13].is_nan());
        assert!(!result[14].is_nan());

        for value in &result[14..] {
            assert!(*value >= 0.0 && *value <= 100.0);
        }
    }

    #[test]
    fn test_rsi_all_gains() {
        let rsi = Rsi::new(5).unwrap();
        let result = rsi.calculate(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);

        assert_relative_eq!(result[5], 100.0);
        assert_relative_eq!(result[6], 100.0);
    }

    #[test]
    fn test_rsi_all_losses() {
        let rsi = Rsi::new(5).unwrap();
        let result = rsi.calculate(&[7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0]);

        assert!(result[5].abs() < 1e-10);
    }

    #[test]
    fn test_rsi_flat_series_is_centered() {
        let rsi = Rsi::new(14).unwrap();
        let result = rsi.calculate(&[42.0; 40]);

        for value in &result[14..] {
            assert_relative_eq!(*value, 50.0);
        }
    }

    #[test]
    fn test_rsi_needs_one_extra_delta() {
        let rsi = Rsi::new(3).unwrap();
        let result = rsi.calculate(&[1.0, 2.0, 3.0]);
        assert!(result.iter().all(|v| v.is_nan()));

        let result = rsi.calculate(&[1.0, 2.0, 3.0, 2.0]);
        // gains 1,1 losses 1 over 3 deltas
        assert_relative_eq!(result[3], 100.0 * (2.0 / 3.0) / 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rsi_wilder_smoothing() {
        let rsi = Rsi::new(2).unwrap();
        // deltas: +2, -1, +3
        let result = rsi.calculate(&[10.0, 12.0, 11.0, 14.0]);

        // seed: gain 1.0, loss 0.5 -> 66.67
        assert_relative_eq!(result[2], 100.0 * 1.0 / 1.5, epsilon = 1e-12);
        // gain (1*1+3)/2 = 2, loss (0.5*1+0)/2 = 0.25
        assert_relative_eq!(result[3], 100.0 * 2.0 / 2.25, epsilon = 1e-12);
    }

    #[test]
    fn test_rsi_all_gains_is_exactly_100() {
        let rsi = Rsi::new(1).unwrap();
        let result = rsi.calculate(&[37.15677957246521, 943.6656400914056]);
        assert_eq!(result[1], 100.0);

        for k in 1..2000 {
            let value = rsi.calculate(&[1.0, 1.0 + 0.37 * k as f64])[1];
            assert!(value <= 100.0, "RSI {} above 100 for step {}", value, k);
        }
    }

    proptest! {
        #[test]
        fn rsi_stays_within_bounds(
            prices in proptest::collection::vec(1.0..1000.0_f64, 2..300),
            period in 1usize..30,
        ) {
            let rsi = Rsi::new(period).unwrap();
            let result = rsi.calculate(&prices);
            prop_assert_eq!(result.len(), prices.len());

            for (i, value) in result.iter().enumerate() {
                if i < period {
                    prop_assert!(value.is_nan());
                } else {
                    prop_assert!((0.0..=100.0).contains(value));
                }
            }
        }
    }
}
