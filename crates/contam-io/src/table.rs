//! In-memory table with ordered, named columns

use crate::reader::{IoError, IoResult};
use crate::schema::{ColumnType, DataColumn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

/// A named column inside a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedColumn {
    pub name: String,
    pub data: DataColumn,
}

/// A table of equally long, nullable columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<NamedColumn>,
}

impl Table {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(name, column)` pairs
    pub fn from_columns<S: Into<String>>(
        columns: impl IntoIterator<Item = (S, DataColumn)>,
    ) -> IoResult<Self> {
        let mut table = Self::new();
        for (name, data) in columns {
            let name = name.into();
            if table.has_column(&name) {
                return Err(IoError::DuplicateColumn(name));
            }
            table.insert_column(name, data)?;
        }
        Ok(table)
    }

    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.data.len())
    }

    /// Number of columns
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Column names in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Iterate over `(name, column)` pairs in order
    pub fn columns(&self) -> impl Iterator<Item = (&str, &DataColumn)> {
        self.columns.iter().map(|c| (c.name.as_str(), &c.data))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Get a column by name
    pub fn column(&self, name: &str) -> Option<&DataColumn> {
        self.columns.iter().find(|c| c.name == name).map(|c| &c.data)
    }

    /// Get a column by name, failing when it is absent
    pub fn require_column(&self, name: &str) -> IoResult<&DataColumn> {
        self.column(name)
            .ok_or_else(|| IoError::ColumnNotFound(name.to_string()))
    }

    /// Names of string-typed (categorical) columns
    pub fn string_column_names(&self) -> Vec<&str> {
        self.names_where(|dtype| dtype == ColumnType::String)
    }

    /// Names of numeric columns
    pub fn numeric_column_names(&self) -> Vec<&str> {
        self.names_where(|dtype| dtype.is_numeric())
    }

    fn names_where(&self, pred: impl Fn(ColumnType) -> bool) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| pred(c.data.dtype()))
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Append a column, or replace the existing column of the same name
    /// in place
    pub fn insert_column(&mut self, name: impl Into<String>, data: DataColumn) -> IoResult<()> {
        let name = name.into();
        if !self.columns.is_empty() && data.len() != self.num_rows() {
            return Err(IoError::LengthMismatch {
                column: name,
                expected: self.num_rows(),
                actual: data.len(),
            });
        }

        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.data = data,
            None => self.columns.push(NamedColumn { name, data }),
        }
        Ok(())
    }

    /// Remove a column and return its data
    pub fn drop_column(&mut self, name: &str) -> IoResult<DataColumn> {
        let index = self
            .columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| IoError::ColumnNotFound(name.to_string()))?;
        Ok(self.columns.remove(index).data)
    }

    /// Remove several columns
    pub fn drop_columns(&mut self, names: &[&str]) -> IoResult<()> {
        for name in names {
            self.drop_column(name)?;
        }
        Ok(())
    }

    /// Rename a column, keeping its position
    pub fn rename_column(&mut self, from: &str, to: &str) -> IoResult<()> {
        if from != to && self.has_column(to) {
            return Err(IoError::DuplicateColumn(to.to_string()));
        }
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.name == from)
            .ok_or_else(|| IoError::ColumnNotFound(from.to_string()))?;
        column.name = to.to_string();
        Ok(())
    }

    /// Gather rows by index; `None` produces an all-null row
    pub fn take_rows(&self, indices: &[Option<usize>]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| NamedColumn {
                    name: c.name.clone(),
                    data: c.data.take(indices),
                })
                .collect(),
        }
    }

    /// Keep the rows where `mask` is true
    pub fn filter_rows(&self, mask: &[bool]) -> IoResult<Table> {
        if mask.len() != self.num_rows() {
            return Err(IoError::LengthMismatch {
                column: "<mask>".to_string(),
                expected: self.num_rows(),
                actual: mask.len(),
            });
        }
        Ok(self.take_rows(&mask_to_indices(mask)))
    }

    /// Drop every row holding a null in any column
    pub fn drop_null_rows(&self) -> Table {
        let names = self.column_names();
        let mask = self.complete_mask(&names);
        self.take_rows(&mask_to_indices(&mask))
    }

    /// Drop every row holding a null in one of `names`
    pub fn drop_null_rows_in(&self, names: &[&str]) -> IoResult<Table> {
        for name in names {
            self.require_column(name)?;
        }
        let mask = self.complete_mask(names);
        Ok(self.take_rows(&mask_to_indices(&mask)))
    }

    fn complete_mask(&self, names: &[&str]) -> Vec<bool> {
        let checked: Vec<&DataColumn> = names.iter().filter_map(|n| self.column(n)).collect();
        (0..self.num_rows())
            .map(|row| checked.iter().all(|c| !c.is_null(row)))
            .collect()
    }

    /// Left join `right` onto this table on the shared `key` column
    ///
    /// Every left row is kept: once per matching right row, or once with
    /// nulls in every right column when nothing matches. Null keys never
    /// match.
    pub fn left_join(&self, right: &Table, key: &str) -> IoResult<Table> {
        let left_key = self.require_column(key)?;
        let right_key = right.require_column(key)?;

        for name in right.column_names() {
            if name != key && self.has_column(name) {
                return Err(IoError::DuplicateColumn(name.to_string()));
            }
        }

        let matches = match (left_key, right_key) {
            (DataColumn::Int64(l), DataColumn::Int64(r)) => index_matches(l, r),
            (DataColumn::String(l), DataColumn::String(r)) => index_matches(l, r),
            _ => {
                return Err(IoError::TypeMismatch {
                    expected: left_key.dtype().to_string(),
                    actual: right_key.dtype().to_string(),
                })
            }
        };

        let mut left_rows = Vec::with_capacity(self.num_rows());
        let mut right_rows = Vec::with_capacity(self.num_rows());
        for (i, found) in matches.iter().enumerate() {
            if found.is_empty() {
                left_rows.push(Some(i));
                right_rows.push(None);
            } else {
                for &j in found {
                    left_rows.push(Some(i));
                    right_rows.push(Some(j));
                }
            }
        }

        let mut joined = self.take_rows(&left_rows);
        for (name, data) in right.columns() {
            if name == key {
                continue;
            }
            joined.columns.push(NamedColumn {
                name: name.to_string(),
                data: data.take(&right_rows),
            });
        }
        Ok(joined)
    }
}

fn mask_to_indices(mask: &[bool]) -> Vec<Option<usize>> {
    mask.iter()
        .enumerate()
        .filter(|(_, keep)| **keep)
        .map(|(i, _)| Some(i))
        .collect()
}

fn index_matches<T: Eq + Hash>(left: &[Option<T>], right: &[Option<T>]) -> Vec<Vec<usize>> {
    let mut index: HashMap<&T, Vec<usize>> = HashMap::new();
    for (i, value) in right.iter().enumerate() {
        if let Some(value) = value {
            index.entry(value).or_default().push(i);
        }
    }

    left.iter()
        .map(|value| {
            value
                .as_ref()
                .and_then(|v| index.get(v))
                .cloned()
                .unwrap_or_default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Table {
        Table::from_columns([
            ("name", DataColumn::Int64(vec![Some(1), Some(2), Some(3)])),
            ("idade", DataColumn::Float64(vec![Some(30.0), None, Some(70.0)])),
            ("estado", DataColumn::from_strs([Some("a"), Some("b"), None])),
        ])
        .unwrap()
    }

    #[test]
    fn test_column_lookup() {
        let table = people();
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.column_names(), vec!["name", "idade", "estado"]);
        assert_eq!(table.string_column_names(), vec!["estado"]);
        assert_eq!(table.numeric_column_names(), vec!["name", "idade"]);
        assert!(matches!(
            table.require_column("zzz"),
            Err(IoError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_insert_rejects_wrong_length() {
        let mut table = people();
        let result = table.insert_column("x", DataColumn::Int64(vec![Some(1)]));
        assert!(matches!(result, Err(IoError::LengthMismatch { .. })));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut table = people();
        table
            .insert_column("idade", DataColumn::Int64(vec![Some(1), Some(2), Some(3)]))
            .unwrap();
        assert_eq!(table.column_names(), vec!["name", "idade", "estado"]);
        assert_eq!(table.column("idade").unwrap().dtype(), ColumnType::Int64);
    }

    #[test]
    fn test_rename_and_drop() {
        let mut table = people();
        table.rename_column("name", "V1").unwrap();
        assert!(table.has_column("V1"));
        assert!(matches!(
            table.rename_column("idade", "estado"),
            Err(IoError::DuplicateColumn(_))
        ));
        table.drop_columns(&["idade"]).unwrap();
        assert_eq!(table.column_names(), vec!["V1", "estado"]);
    }

    #[test]
    fn test_drop_null_rows() {
        let table = people();
        assert_eq!(table.drop_null_rows().num_rows(), 1);
        assert_eq!(table.drop_null_rows_in(&["estado"]).unwrap().num_rows(), 2);
    }

    #[test]
    fn test_left_join_keeps_unmatched_rows() {
        let pairs = Table::from_columns([
            ("name", DataColumn::Int64(vec![Some(1), Some(9), None])),
            ("prob", DataColumn::Float64(vec![Some(0.1), Some(0.2), Some(0.3)])),
        ])
        .unwrap();

        let joined = pairs.left_join(&people(), "name").unwrap();
        assert_eq!(joined.num_rows(), 3);
        assert_eq!(joined.column_names(), vec!["name", "prob", "idade", "estado"]);
        assert_eq!(
            joined.column("idade").unwrap(),
            &DataColumn::Float64(vec![Some(30.0), None, None])
        );
    }

    #[test]
    fn test_left_join_duplicates_on_repeated_keys() {
        let right = Table::from_columns([
            ("k", DataColumn::from_strs([Some("x"), Some("x")])),
            ("v", DataColumn::Int64(vec![Some(1), Some(2)])),
        ])
        .unwrap();
        let left = Table::from_columns([("k", DataColumn::from_strs([Some("x")]))]).unwrap();

        let joined = left.left_join(&right, "k").unwrap();
        assert_eq!(joined.num_rows(), 2);
    }

    #[test]
    fn test_left_join_key_type_mismatch() {
        let left = Table::from_columns([("name", DataColumn::from_strs([Some("1")]))]).unwrap();
        assert!(matches!(
            left.left_join(&people(), "name"),
            Err(IoError::TypeMismatch { .. })
        ));
    }
}
