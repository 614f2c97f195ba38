//! Training and prediction table assembly
//!
//! The individual table is cleaned once, split into its two role copies,
//! and joined back onto the pairwise observations. Labelled pairs form the
//! training table; pairs with a missing target form the prediction table.

use contam_io::Table;

use crate::config::ContamConfig;
use crate::error::PreprocessError;
use crate::preprocess::features::{add_age_band, add_bmi_band};
use crate::preprocess::normalize::{fill_missing, recode_binary, recode_count, FillStrategy};
use crate::preprocess::roles::{split_role, Role};

/// Output of feature generation
#[derive(Debug, Clone)]
pub struct Datasets {
    /// Labelled pairs with both parties' attributes, fully populated
    pub train: Table,
    /// Unlabelled pairs with both parties' attributes
    pub predict: Table,
    /// Individual table tagged for the first party
    pub first: Table,
    /// Individual table tagged for the second party
    pub second: Table,
}

/// Clean and enrich the individual table
///
/// Order matters: counting variables are recoded before any imputation,
/// the string-column list for mode filling is taken after that recode, and
/// bands are derived from the median-filled values.
pub fn preprocess_individuals(
    table: &Table,
    config: &ContamConfig,
) -> Result<Table, PreprocessError> {
    let pre = &config.preprocess;
    let cols = &config.columns;

    let data = recode_count(table, &pre.counting_variables, &pre.counting_category)?;

    let to_fill: Vec<String> = data
        .string_column_names()
        .into_iter()
        .map(String::from)
        .collect();

    let data = fill_missing(&data, &pre.mode_fill_variables, FillStrategy::Mode)?;
    let data = fill_missing(&data, &to_fill, FillStrategy::Mode)?;
    let data = fill_missing(&data, &pre.median_fill_variables, FillStrategy::Median)?;
    let data = recode_binary(&data, &pre.binary_variables)?;
    let data = add_age_band(&data, &cols.age, &cols.age_band)?;
    let data = add_bmi_band(&data, &cols.bmi, &cols.bmi_band)?;

    tracing::debug!(
        "Preprocessed {} individuals into {} columns",
        data.num_rows(),
        data.num_columns()
    );
    Ok(data)
}

fn target_mask(pairs: &Table, target: &str, present: bool) -> Result<Vec<bool>, PreprocessError> {
    let column = pairs
        .column(target)
        .ok_or_else(|| PreprocessError::ColumnNotFound(target.to_string()))?;
    Ok((0..pairs.num_rows())
        .map(|row| column.is_null(row) != present)
        .collect())
}

/// Build the training table
///
/// Keeps the pairs with a target, then left-joins each role table on its
/// key. After every join, rows holding any null are dropped: a pair whose
/// individual cannot be resolved leaves the training set.
pub fn assemble_training(
    pairs: &Table,
    target: &str,
    role_tables: &[(&str, &Table)],
) -> Result<Table, PreprocessError> {
    let mut train = pairs.filter_rows(&target_mask(pairs, target, true)?)?;

    for (key, table) in role_tables {
        let joined = train.left_join(table, key)?;
        train = joined.drop_null_rows();

        let dropped = joined.num_rows() - train.num_rows();
        if dropped > 0 {
            tracing::warn!("Dropped {} training rows unresolved on '{}'", dropped, key);
        }
    }

    Ok(train)
}

/// Build the prediction table
///
/// Keeps the pairs without a target and attaches both parties' attributes.
/// Unresolved individuals leave nulls in place; no row is dropped.
pub fn assemble_prediction(
    pairs: &Table,
    target: &str,
    first: &Table,
    second: &Table,
) -> Result<Table, PreprocessError> {
    let predict = pairs.filter_rows(&target_mask(pairs, target, false)?)?;
    let predict = predict.left_join(first, Role::First.name())?;
    Ok(predict.left_join(second, Role::Second.name())?)
}

/// Run the whole feature-generation chain
pub fn build_datasets(
    individuals: &Table,
    pairs: &Table,
    config: &ContamConfig,
) -> Result<Datasets, PreprocessError> {
    let key = &config.columns.individual_key;
    let target = &config.columns.target;

    let cleaned = preprocess_individuals(individuals, config)?;
    let first = split_role(&cleaned, key, Role::First)?;
    let second = split_role(&cleaned, key, Role::Second)?;

    tracing::info!("Creating training table");
    let train = assemble_training(
        pairs,
        target,
        &[(Role::First.name(), &first), (Role::Second.name(), &second)],
    )?;

    tracing::info!("Creating prediction table");
    let predict = assemble_prediction(pairs, target, &first, &second)?;

    Ok(Datasets {
        train,
        predict,
        first,
        second,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contam_io::DataColumn;

    fn roles() -> Table {
        Table::from_columns([
            ("V1", DataColumn::Int64(vec![Some(1), Some(2)])),
            ("sexo_V1", DataColumn::from_strs([Some("f__V1"), Some("m__V1")])),
        ])
        .unwrap()
    }

    fn pairs() -> Table {
        Table::from_columns([
            ("V1", DataColumn::Int64(vec![Some(1), Some(7), Some(2), Some(9)])),
            ("V2", DataColumn::Int64(vec![Some(2), Some(1), Some(1), Some(1)])),
            (
                "prob_V1_V2",
                DataColumn::Float64(vec![Some(0.2), Some(0.4), None, None]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_training_drops_unresolved_pairs() {
        let first = roles();
        let train = assemble_training(&pairs(), "prob_V1_V2", &[("V1", &first)]).unwrap();

        assert_eq!(train.num_rows(), 1);
        assert_eq!(train.column("sexo_V1").unwrap().null_count(), 0);
    }

    #[test]
    fn test_prediction_keeps_unresolved_pairs() {
        let first = roles();
        let mut second = roles();
        second.rename_column("V1", "V2").unwrap();
        second.rename_column("sexo_V1", "sexo_V2").unwrap();

        let predict = assemble_prediction(&pairs(), "prob_V1_V2", &first, &second).unwrap();
        assert_eq!(predict.num_rows(), 2);
        assert_eq!(predict.column("sexo_V1").unwrap().null_count(), 1);
        assert_eq!(predict.column("prob_V1_V2").unwrap().null_count(), 2);
    }

    #[test]
    fn test_missing_target_column() {
        let result = assemble_prediction(&roles(), "prob_V1_V2", &roles(), &roles());
        assert!(matches!(result, Err(PreprocessError::ColumnNotFound(_))));
    }
}
