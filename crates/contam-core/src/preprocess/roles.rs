//! Role-specific copies of the individual table
//!
//! A pair `(V1, V2)` carries the attributes of both individuals side by
//! side. Each individual table copy is tagged with its role twice: category
//! values get `__V1`/`__V2` so the same raw level stays distinct per role,
//! and column names get `_V1`/`_V2`. The key column becomes the bare role
//! name so it can be joined on.

use contam_io::{DataColumn, Table};
use serde::{Deserialize, Serialize};

use crate::error::PreprocessError;

/// Which party of a pair a table describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    First,
    Second,
}

impl Role {
    pub const BOTH: [Role; 2] = [Role::First, Role::Second];

    /// Bare role name, also the join key in the pairwise table
    pub fn name(&self) -> &'static str {
        match self {
            Role::First => "V1",
            Role::Second => "V2",
        }
    }

    /// Suffix appended to category values (`__V1`)
    pub fn category_suffix(&self) -> String {
        format!("__{}", self.name())
    }

    /// Suffix appended to column names (`_V1`)
    pub fn column_suffix(&self) -> String {
        format!("_{}", self.name())
    }
}

/// Append `suffix` to every value of every string column except `key`
///
/// Rows with a missing value in any string column are dropped first.
pub fn suffix_categories(
    table: &Table,
    suffix: &str,
    key: &str,
) -> Result<Table, PreprocessError> {
    let categorical = table.string_column_names();
    let mut data = table.drop_null_rows_in(&categorical)?;

    let dropped = table.num_rows() - data.num_rows();
    if dropped > 0 {
        tracing::warn!(
            "Dropped {} rows with missing categories before tagging '{}'",
            dropped,
            suffix
        );
    }

    let names: Vec<String> = categorical
        .iter()
        .filter(|name| **name != key)
        .map(|name| name.to_string())
        .collect();

    for name in names {
        let tagged = match data.column(&name).and_then(DataColumn::as_strings) {
            Some(values) => values
                .iter()
                .map(|v| v.as_ref().map(|v| format!("{}{}", v, suffix)))
                .collect(),
            None => continue,
        };
        data.insert_column(name, DataColumn::String(tagged))?;
    }

    Ok(data)
}

/// Append `suffix` to every column name; `key` becomes `role_name`
pub fn suffix_columns(
    table: &Table,
    suffix: &str,
    key: &str,
    role_name: &str,
) -> Result<Table, PreprocessError> {
    if !table.has_column(key) {
        return Err(PreprocessError::ColumnNotFound(key.to_string()));
    }

    let renamed = table.columns().map(|(name, data)| {
        let name = if name == key {
            role_name.to_string()
        } else {
            format!("{}{}", name, suffix)
        };
        (name, data.clone())
    });
    Ok(Table::from_columns(renamed.collect::<Vec<_>>())?)
}

/// Produce the role-tagged copy of the individual table
pub fn split_role(table: &Table, key: &str, role: Role) -> Result<Table, PreprocessError> {
    let tagged = suffix_categories(table, &role.category_suffix(), key)?;
    suffix_columns(&tagged, &role.column_suffix(), key, role.name())
}
