//! Regression error metrics
//!
//! Each metric compares observed targets with predictions of equal length.
//! `MetricReport` keeps metrics in the order they were requested and
//! serializes as a flat `name -> value` map.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from metric computation
#[derive(Debug, Error, PartialEq)]
pub enum MetricError {
    #[error("Length mismatch: {actual} observations vs {predicted} predictions")]
    LengthMismatch { actual: usize, predicted: usize },

    #[error("No observations to score")]
    Empty,

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),
}

/// Supported regression metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "MAE")]
    Mae,
    #[serde(rename = "MSE")]
    Mse,
    #[serde(rename = "RMSE")]
    Rmse,
    #[serde(rename = "R2")]
    R2,
    #[serde(rename = "RMSLE")]
    Rmsle,
    #[serde(rename = "MAPE")]
    Mape,
}

impl Metric {
    /// Every metric, in reporting order
    pub const ALL: [Metric; 6] = [
        Metric::Mae,
        Metric::Mse,
        Metric::Rmse,
        Metric::R2,
        Metric::Rmsle,
        Metric::Mape,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Mae => "MAE",
            Metric::Mse => "MSE",
            Metric::Rmse => "RMSE",
            Metric::R2 => "R2",
            Metric::Rmsle => "RMSLE",
            Metric::Mape => "MAPE",
        }
    }

    /// Compute this metric
    pub fn compute(&self, actual: &[f64], predicted: &[f64]) -> Result<f64, MetricError> {
        if actual.len() != predicted.len() {
            return Err(MetricError::LengthMismatch {
                actual: actual.len(),
                predicted: predicted.len(),
            });
        }
        if actual.is_empty() {
            return Err(MetricError::Empty);
        }

        let value = match self {
            Metric::Mae => mean_by(actual, predicted, |y, p| (y - p).abs()),
            Metric::Mse => mean_by(actual, predicted, |y, p| (y - p).powi(2)),
            Metric::Rmse => mean_by(actual, predicted, |y, p| (y - p).powi(2)).sqrt(),
            Metric::R2 => r2(actual, predicted),
            Metric::Rmsle => mean_by(actual, predicted, |y, p| {
                (y.abs().ln_1p() - p.abs().ln_1p()).powi(2)
            })
            .sqrt(),
            Metric::Mape => mape(actual, predicted),
        };
        Ok(value)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = MetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .iter()
            .copied()
            .find(|m| m.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| MetricError::UnknownMetric(s.to_string()))
    }
}

fn mean_by(actual: &[f64], predicted: &[f64], f: impl Fn(f64, f64) -> f64) -> f64 {
    let total: f64 = actual.iter().zip(predicted).map(|(&y, &p)| f(y, p)).sum();
    total / actual.len() as f64
}

/// Mean absolute percentage error over the rows with a non-zero target
///
/// NaN when every target is zero.
fn mape(actual: &[f64], predicted: &[f64]) -> f64 {
    let errors: Vec<f64> = actual
        .iter()
        .zip(predicted)
        .filter(|(y, _)| **y != 0.0)
        .map(|(y, p)| ((y - p) / y).abs())
        .collect();
    if errors.is_empty() {
        return f64::NAN;
    }
    errors.iter().sum::<f64>() / errors.len() as f64
}

/// Coefficient of determination
///
/// Constant targets score 1.0 when predicted exactly and 0.0 otherwise.
fn r2(actual: &[f64], predicted: &[f64]) -> f64 {
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(y, p)| (y - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|y| (y - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    }
}

/// Round to two decimals, as metrics are reported
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Ordered set of metric values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricReport {
    entries: Vec<(Metric, f64)>,
}

impl MetricReport {
    /// Compute every metric in `metrics`, rounded to two decimals
    pub fn evaluate(
        actual: &[f64],
        predicted: &[f64],
        metrics: &[Metric],
    ) -> Result<Self, MetricError> {
        let mut report = Self::default();
        for metric in metrics {
            report.insert(*metric, round2(metric.compute(actual, predicted)?));
        }
        Ok(report)
    }

    /// Set a metric value, replacing an earlier one
    pub fn insert(&mut self, metric: Metric, value: f64) {
        match self.entries.iter_mut().find(|(m, _)| *m == metric) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((metric, value)),
        }
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.entries
            .iter()
            .find(|(m, _)| *m == metric)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for MetricReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (metric, value) in &self.entries {
            map.serialize_entry(metric.name(), value)?;
        }
        map.end()
    }
}

impl fmt::Display for MetricReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .entries
            .iter()
            .map(|(m, v)| format!("{}: {}", m, v))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}
