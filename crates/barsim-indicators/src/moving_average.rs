//! Moving average indicators.

use barsim_core::error::IndicatorError;
use barsim_core::traits::Indicator;

fn check_period(period: usize) -> Result<(), IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidParameter(
            "period must be greater than 0".into(),
        ));
    }
    Ok(())
}

/// Simple Moving Average (SMA).
///
/// Calculates the arithmetic mean of the last N values with a running sum.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    /// Create a new SMA with the specified period.
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period(period)?;
        Ok(Self { period })
    }
}

impl Indicator for Sma {
    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        let mut result = vec![f64::NAN; data.len()];
        if data.len() < self.period {
            return result;
        }

        let period_f64 = self.period as f64;

        // Initial sum
        let mut sum: f64 = data[..self.period].iter().sum();
        result[self.period - 1] = sum / period_f64;

        // Sliding window
        for i in self.period..data.len() {
            sum += data[i] - data[i - self.period];
            result[i] = sum / period_f64;
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn name(&self) -> &str {
        "SMA"
    }
}

/// Exponential Moving Average (EMA).
///
/// Seeded with the SMA of the first window, then decays with
/// `2 / (period + 1)`.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    multiplier: f64,
}

impl Ema {
    /// Create a new EMA with the specified period.
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period(period)?;
        let multiplier = 2.0 / (period as f64 + 1.0);
        Ok(Self { period, multiplier })
    }
}

impl Indicator for Ema {
    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        let mut result = vec![f64::NAN; data.len()];
        if data.len() < self.period {
            return result;
        }

        let mut ema: f64 = data[..self.period].iter().sum::<f64>() / self.period as f64;
        result[self.period - 1] = ema;

        let one_minus_mult = 1.0 - self.multiplier;
        for i in self.period..data.len() {
            ema = data[i] * self.multiplier + ema * one_minus_mult;
            result[i] = ema;
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn name(&self) -> &str {
        "EMA"
    }
}
