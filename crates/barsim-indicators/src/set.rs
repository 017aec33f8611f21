//! Precomputed indicator series for a whole run.

use std::collections::HashSet;

use barsim_core::error::IndicatorError;
use barsim_core::traits::{Indicator, IndicatorKind, IndicatorSpec, IndicatorValues};

use crate::{Ema, Rsi, Sma};

/// Build the indicator implementation for a spec.
pub fn build_indicator(spec: &IndicatorSpec) -> Result<Box<dyn Indicator>, IndicatorError> {
    Ok(match spec.kind {
        IndicatorKind::Sma => Box::new(Sma::new(spec.period)?),
        IndicatorKind::Ema => Box::new(Ema::new(spec.period)?),
        IndicatorKind::Rsi => Box::new(Rsi::new(spec.period)?),
    })
}

/// A named indicator output aligned 1:1 with the bar sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    spec: IndicatorSpec,
    values: Vec<f64>,
}

impl IndicatorSeries {
    /// Compute `spec` over `data`.
    pub fn compute(spec: &IndicatorSpec, data: &[f64]) -> Result<Self, IndicatorError> {
        let indicator = build_indicator(spec)?;
        Ok(Self {
            spec: spec.clone(),
            values: indicator.calculate(data),
        })
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn spec(&self) -> &IndicatorSpec {
        &self.spec
    }

    /// Raw value at `index`; `NaN` during warm-up.
    pub fn value(&self, index: usize) -> f64 {
        self.values.get(index).copied().unwrap_or(f64::NAN)
    }

    /// Defined value at `index`.
    pub fn get(&self, index: usize) -> Option<f64> {
        Some(self.value(index)).filter(|v| !v.is_nan())
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Every indicator a strategy declared, computed once before the loop.
#[derive(Debug, Clone, Default)]
pub struct IndicatorSet {
    series: Vec<IndicatorSeries>,
    len: usize,
}

impl IndicatorSet {
    /// Compute all `specs` over `closes`. Names must be unique.
    pub fn compute(specs: &[IndicatorSpec], closes: &[f64]) -> Result<Self, IndicatorError> {
        let mut seen = HashSet::new();
        let mut series = Vec::with_capacity(specs.len());

        for spec in specs {
            if !seen.insert(spec.name.as_str()) {
                return Err(IndicatorError::DuplicateName(spec.name.clone()));
            }
            series.push(IndicatorSeries::compute(spec, closes)?);
        }

        Ok(Self {
            series,
            len: closes.len(),
        })
    }

    /// Readings of every indicator at `index`.
    pub fn values_at(&self, index: usize) -> IndicatorValues {
        self.series
            .iter()
            .map(|s| (s.name(), s.value(index)))
            .collect()
    }

    /// True once every indicator is past its warm-up at `index`.
    pub fn all_defined_at(&self, index: usize) -> bool {
        index < self.len && self.series.iter().all(|s| s.get(index).is_some())
    }

    /// First index where every indicator is defined, if any.
    pub fn first_defined_index(&self) -> Option<usize> {
        (0..self.len).find(|&i| self.all_defined_at(i))
    }

    pub fn get(&self, name: &str) -> Option<&IndicatorSeries> {
        self.series.iter().find(|s| s.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndicatorSeries> {
        self.series.iter()
    }

    /// Number of bars the set is aligned to.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
