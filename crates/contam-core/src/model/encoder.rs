//! Table to design-matrix encoding
//!
//! Numeric features are optionally standardized with training statistics;
//! categorical features are one-hot encoded over the training levels.
//! Missing numeric values encode as the training mean, and missing or
//! unseen categories encode as all zeros.

use std::collections::HashMap;

use contam_io::Table;
use contam_stats::SummaryStats;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::model::SessionOptions;

/// Scaling parameters of one numeric feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericFeature {
    pub name: String,
    pub mean: f64,
    pub scale: f64,
}

/// Levels of one categorical feature, in column order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalFeature {
    pub name: String,
    pub levels: Vec<String>,
}

/// Learned encoding from a table to model inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    pub numeric: Vec<NumericFeature>,
    pub categorical: Vec<CategoricalFeature>,
    pub normalize: bool,
}

impl FeatureEncoder {
    /// Learn scaling and levels from `data`
    ///
    /// Levels named in `dropped_levels` act as reference categories and
    /// get no column of their own.
    pub fn fit(
        data: &Table,
        options: &SessionOptions,
        dropped_levels: &[String],
        normalize: bool,
    ) -> Result<Self, ModelError> {
        let mut numeric = Vec::with_capacity(options.numeric_features.len());
        for name in &options.numeric_features {
            let values = numeric_column(data, name)?;
            let stats = SummaryStats::from_nullable(&values);
            let mean = if stats.mean.is_finite() { stats.mean } else { 0.0 };
            let scale = if stats.std_dev.is_finite() && stats.std_dev > 0.0 {
                stats.std_dev
            } else {
                1.0
            };
            numeric.push(NumericFeature {
                name: name.clone(),
                mean,
                scale,
            });
        }

        let mut categorical = Vec::with_capacity(options.categorical_features.len());
        for name in &options.categorical_features {
            let values = string_column(data, name)?;
            let mut levels: Vec<String> = values
                .iter()
                .flatten()
                .filter(|level| !dropped_levels.contains(level))
                .cloned()
                .collect();
            levels.sort();
            levels.dedup();
            categorical.push(CategoricalFeature {
                name: name.clone(),
                levels,
            });
        }

        Ok(Self {
            numeric,
            categorical,
            normalize,
        })
    }

    /// Number of encoded columns
    pub fn width(&self) -> usize {
        self.numeric.len() + self.categorical.iter().map(|c| c.levels.len()).sum::<usize>()
    }

    /// Encoded column names (`feature` or `feature=level`)
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.numeric.iter().map(|f| f.name.clone()).collect();
        for feature in &self.categorical {
            for level in &feature.levels {
                names.push(format!("{}={}", feature.name, level));
            }
        }
        names
    }

    /// Encode every row of `data`
    pub fn encode(&self, data: &Table) -> Result<DMatrix<f64>, ModelError> {
        let rows = data.num_rows();
        let mut matrix = DMatrix::zeros(rows, self.width());
        let mut col = 0;

        for feature in &self.numeric {
            let values = numeric_column(data, &feature.name)?;
            for (row, value) in values.iter().enumerate() {
                let x = value.unwrap_or(feature.mean);
                matrix[(row, col)] = if self.normalize {
                    (x - feature.mean) / feature.scale
                } else {
                    x
                };
            }
            col += 1;
        }

        for feature in &self.categorical {
            let values = string_column(data, &feature.name)?;
            let index: HashMap<&str, usize> = feature
                .levels
                .iter()
                .enumerate()
                .map(|(i, level)| (level.as_str(), i))
                .collect();
            for (row, value) in values.iter().enumerate() {
                if let Some(offset) = value.as_deref().and_then(|v| index.get(v)) {
                    matrix[(row, col + offset)] = 1.0;
                }
            }
            col += feature.levels.len();
        }

        Ok(matrix)
    }
}

fn numeric_column(data: &Table, name: &str) -> Result<Vec<Option<f64>>, ModelError> {
    let column = data.require_column(name)?;
    column.to_f64().ok_or_else(|| ModelError::FeatureType {
        feature: name.to_string(),
        expected: "numeric".to_string(),
        actual: column.dtype().to_string(),
    })
}

fn string_column<'a>(data: &'a Table, name: &str) -> Result<&'a [Option<String>], ModelError> {
    let column = data.require_column(name)?;
    column.as_strings().ok_or_else(|| ModelError::FeatureType {
        feature: name.to_string(),
        expected: "string".to_string(),
        actual: column.dtype().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contam_io::DataColumn;

    fn table() -> Table {
        Table::from_columns([
            ("idade_V1", DataColumn::Float64(vec![Some(20.0), Some(40.0), None])),
            (
                "sexo_V1",
                DataColumn::from_strs([Some("f__V1"), Some("m__V1"), Some("f__V1")]),
            ),
            ("prob_V1_V2", DataColumn::Float64(vec![Some(0.1), Some(0.2), Some(0.3)])),
        ])
        .unwrap()
    }

    #[test]
    fn test_fit_and_encode() {
        let data = table();
        let options = SessionOptions::infer(&data, "prob_V1_V2", 16);
        let encoder = FeatureEncoder::fit(&data, &options, &[], true).unwrap();

        assert_eq!(encoder.width(), 3);
        assert_eq!(
            encoder.feature_names(),
            vec!["idade_V1", "sexo_V1=f__V1", "sexo_V1=m__V1"]
        );

        let x = encoder.encode(&data).unwrap();
        assert_eq!(x[(0, 0)], -1.0);
        assert_eq!(x[(1, 0)], 1.0);
        // missing encodes as the mean
        assert_eq!(x[(2, 0)], 0.0);
        assert_eq!(x[(1, 2)], 1.0);
        assert_eq!(x[(1, 1)], 0.0);
    }

    #[test]
    fn test_dropped_and_unseen_levels() {
        let data = table();
        let options = SessionOptions::infer(&data, "prob_V1_V2", 16);
        let encoder =
            FeatureEncoder::fit(&data, &options, &["m__V1".to_string()], false).unwrap();
        assert_eq!(encoder.categorical[0].levels, vec!["f__V1"]);

        let unseen = Table::from_columns([
            ("idade_V1", DataColumn::Int64(vec![Some(33)])),
            ("sexo_V1", DataColumn::from_strs([Some("x__V1")])),
        ])
        .unwrap();
        let x = encoder.encode(&unseen).unwrap();
        assert_eq!(x[(0, 0)], 33.0);
        assert_eq!(x[(0, 1)], 0.0);
    }

    #[test]
    fn test_type_mismatch() {
        let data = table();
        let options = SessionOptions::infer(&data, "prob_V1_V2", 16);
        let encoder = FeatureEncoder::fit(&data, &options, &[], true).unwrap();

        let wrong = Table::from_columns([
            ("idade_V1", DataColumn::from_strs([Some("20")])),
            ("sexo_V1", DataColumn::from_strs([Some("f__V1")])),
        ])
        .unwrap();
        assert!(matches!(
            encoder.encode(&wrong),
            Err(ModelError::FeatureType { .. })
        ));
    }
}
