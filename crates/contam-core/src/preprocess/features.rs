//! Derived categorical features from continuous attributes
//!
//! Bands are closed on the left: a value on a boundary belongs to the
//! upper band. Values no band covers (only NaN, after imputation) fall to
//! a sentinel. The two bucketers use different sentinels, `none` for age
//! and `sem_info_imc` for body-mass index; downstream category levels
//! depend on these exact strings.

use contam_io::{DataColumn, Table};

use crate::error::PreprocessError;

/// Age bands: `(lower bound inclusive, label)`, ascending
const AGE_BANDS: &[(f64, &str)] = &[
    (f64::NEG_INFINITY, "menor_18"),
    (18.0, "18_24_anos"),
    (25.0, "25_34_anos"),
    (35.0, "35_44_anos"),
    (45.0, "45_54_anos"),
    (55.0, "55_64_anos"),
    (65.0, "maior_65"),
];

/// Body-mass-index bands (clinical cutoffs)
const BMI_BANDS: &[(f64, &str)] = &[
    (f64::NEG_INFINITY, "muito_abaixo"),
    (17.0, "abaixo"),
    (18.5, "adequado"),
    (25.0, "acima"),
    (30.0, "obesidade_I"),
    (35.0, "obesidade_II"),
    // "obsidade" is the level name trained models see; keep it as is
    (40.0, "obsidade_III"),
];

pub const AGE_SENTINEL: &str = "none";
pub const BMI_SENTINEL: &str = "sem_info_imc";

fn band(value: f64, bands: &[(f64, &'static str)], sentinel: &'static str) -> &'static str {
    if value.is_nan() {
        return sentinel;
    }
    bands
        .iter()
        .rev()
        .find(|(lower, _)| value >= *lower)
        .map_or(sentinel, |(_, label)| *label)
}

/// Age band label for `age` in years
pub fn age_band(age: f64) -> &'static str {
    band(age, AGE_BANDS, AGE_SENTINEL)
}

/// Body-mass-index band label
pub fn bmi_band(bmi: f64) -> &'static str {
    band(bmi, BMI_BANDS, BMI_SENTINEL)
}

/// Append `target` holding the age band of `source`
pub fn add_age_band(table: &Table, source: &str, target: &str) -> Result<Table, PreprocessError> {
    add_banded(table, source, target, age_band)
}

/// Append `target` holding the body-mass-index band of `source`
pub fn add_bmi_band(table: &Table, source: &str, target: &str) -> Result<Table, PreprocessError> {
    add_banded(table, source, target, bmi_band)
}

fn add_banded(
    table: &Table,
    source: &str,
    target: &str,
    labeler: fn(f64) -> &'static str,
) -> Result<Table, PreprocessError> {
    let column = table
        .column(source)
        .ok_or_else(|| PreprocessError::ColumnNotFound(source.to_string()))?;
    let values = column
        .to_f64()
        .ok_or_else(|| PreprocessError::NonNumericColumn {
            column: source.to_string(),
            dtype: column.dtype().to_string(),
        })?;

    let labels = values
        .iter()
        .map(|v| Some(labeler(v.unwrap_or(f64::NAN))))
        .collect::<Vec<_>>();

    let mut data = table.clone();
    data.insert_column(target, DataColumn::from_strs(labels))?;
    Ok(data)
}
