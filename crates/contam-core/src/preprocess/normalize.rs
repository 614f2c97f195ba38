//! Missing-value imputation and category relabelling
//!
//! Every function copies its input table and returns the transformed copy.

use contam_io::{DataColumn, Table, Value};
use contam_stats::median;
use serde::{Deserialize, Serialize};

use crate::error::PreprocessError;

/// How missing values are filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillStrategy {
    /// Most frequent value (any column type)
    Mode,
    /// Median (numeric columns only)
    Median,
}

/// Name of the recoded column replacing `variable`
pub fn status_column(variable: &str) -> String {
    format!("{}_status", variable)
}

/// Fill missing entries of `columns` using `strategy`
///
/// Median filling promotes the column to floating point.
pub fn fill_missing<S: AsRef<str>>(
    table: &Table,
    columns: &[S],
    strategy: FillStrategy,
) -> Result<Table, PreprocessError> {
    let mut data = table.clone();

    for name in columns {
        let name = name.as_ref();
        let column = data
            .column(name)
            .ok_or_else(|| PreprocessError::ColumnNotFound(name.to_string()))?;

        let filled = match strategy {
            FillStrategy::Mode => {
                let mode = column
                    .mode()
                    .ok_or_else(|| PreprocessError::NoObservedValues(name.to_string()))?;
                column.fill_null(&mode)?
            }
            FillStrategy::Median => {
                let values = column.cast_to_float().ok_or_else(|| {
                    PreprocessError::NonNumericColumn {
                        column: name.to_string(),
                        dtype: column.dtype().to_string(),
                    }
                })?;
                let observed: Vec<f64> = values
                    .to_f64()
                    .unwrap_or_default()
                    .into_iter()
                    .flatten()
                    .collect();
                let center = median(&observed)
                    .ok_or_else(|| PreprocessError::NoObservedValues(name.to_string()))?;
                values.fill_null(&Value::Float64(center))?
            }
        };

        tracing::debug!(
            "Filled {} missing values in '{}' ({:?})",
            column.null_count(),
            name,
            strategy
        );
        data.insert_column(name, filled)?;
    }

    Ok(data)
}

/// Replace 0/1 variables with descriptive labels
///
/// Each variable `v` becomes a string column `v_status` holding `no_v` for
/// 0, `v` for 1 and `sem_info_v` for anything else, including missing
/// values. The numeric source column is dropped.
pub fn recode_binary<S: AsRef<str>>(
    table: &Table,
    variables: &[S],
) -> Result<Table, PreprocessError> {
    let mut data = table.clone();

    for var in variables {
        let var = var.as_ref();
        let values = numeric_values(&data, var)?;

        let labels: Vec<Option<String>> = values
            .iter()
            .map(|value| {
                Some(match value {
                    Some(x) if *x == 0.0 => format!("no_{}", var),
                    Some(x) if *x == 1.0 => var.to_string(),
                    _ => format!("sem_info_{}", var),
                })
            })
            .collect();

        data.drop_column(var)?;
        data.insert_column(status_column(var), DataColumn::String(labels))?;
    }

    Ok(data)
}

/// Replace counting variables with presence labels
///
/// Each variable `v` becomes `v_status`: `sem_<category>` for 0,
/// `<category>` for positive counts, and the textual form of the most
/// frequent observed count otherwise. The source column is dropped.
pub fn recode_count<S: AsRef<str>>(
    table: &Table,
    variables: &[S],
    category: &str,
) -> Result<Table, PreprocessError> {
    let mut data = table.clone();

    for var in variables {
        let var = var.as_ref();
        let values = numeric_values(&data, var)?;
        let fallback = data
            .column(var)
            .and_then(DataColumn::mode)
            .map(|mode| mode.to_string())
            .ok_or_else(|| PreprocessError::NoObservedValues(var.to_string()))?;

        let labels: Vec<Option<String>> = values
            .iter()
            .map(|value| {
                Some(match value {
                    Some(x) if *x == 0.0 => format!("sem_{}", category),
                    Some(x) if *x > 0.0 => category.to_string(),
                    _ => fallback.clone(),
                })
            })
            .collect();

        data.drop_column(var)?;
        data.insert_column(status_column(var), DataColumn::String(labels))?;
    }

    Ok(data)
}

fn numeric_values(table: &Table, name: &str) -> Result<Vec<Option<f64>>, PreprocessError> {
    let column = table
        .column(name)
        .ok_or_else(|| PreprocessError::ColumnNotFound(name.to_string()))?;
    column
        .to_f64()
        .ok_or_else(|| PreprocessError::NonNumericColumn {
            column: name.to_string(),
            dtype: column.dtype().to_string(),
        })
}
