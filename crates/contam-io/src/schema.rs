//! Column types and nullable column storage

use crate::reader::{IoError, IoResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Int64,
    Float64,
    String,
}

impl ColumnType {
    /// Check if this is a numeric type
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Int64 | ColumnType::Float64)
    }

    /// Human-readable type name
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Int64 => "int64",
            ColumnType::Float64 => "float64",
            ColumnType::String => "string",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single non-null cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int64(i64),
    Float64(f64),
    String(String),
}

impl Value {
    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int64(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            Value::String(_) => None,
        }
    }

    pub fn dtype(&self) -> ColumnType {
        match self {
            Value::Int64(_) => ColumnType::Int64,
            Value::Float64(_) => ColumnType::Float64,
            Value::String(_) => ColumnType::String,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::String(v) => f.write_str(v),
        }
    }
}

/// A column of nullable data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dtype", content = "values")]
pub enum DataColumn {
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    String(Vec<Option<String>>),
}

impl DataColumn {
    /// Build a string column from borrowed values
    pub fn from_strs<'a>(values: impl IntoIterator<Item = Option<&'a str>>) -> Self {
        DataColumn::String(
            values
                .into_iter()
                .map(|v| v.map(|s| s.to_string()))
                .collect(),
        )
    }

    /// Get the column type
    pub fn dtype(&self) -> ColumnType {
        match self {
            DataColumn::Int64(_) => ColumnType::Int64,
            DataColumn::Float64(_) => ColumnType::Float64,
            DataColumn::String(_) => ColumnType::String,
        }
    }

    /// Get the number of elements
    pub fn len(&self) -> usize {
        match self {
            DataColumn::Int64(v) => v.len(),
            DataColumn::Float64(v) => v.len(),
            DataColumn::String(v) => v.len(),
        }
    }

    /// Check if the column is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether row `index` holds a null (out-of-range rows count as null)
    pub fn is_null(&self, index: usize) -> bool {
        match self {
            DataColumn::Int64(v) => v.get(index).map_or(true, Option::is_none),
            DataColumn::Float64(v) => v.get(index).map_or(true, Option::is_none),
            DataColumn::String(v) => v.get(index).map_or(true, Option::is_none),
        }
    }

    /// Number of null cells
    pub fn null_count(&self) -> usize {
        (0..self.len()).filter(|&i| self.is_null(i)).count()
    }

    /// Get a cell value
    pub fn get(&self, index: usize) -> Option<Value> {
        match self {
            DataColumn::Int64(v) => v.get(index).copied().flatten().map(Value::Int64),
            DataColumn::Float64(v) => v.get(index).copied().flatten().map(Value::Float64),
            DataColumn::String(v) => v.get(index).cloned().flatten().map(Value::String),
        }
    }

    /// Convert to f64 (for numeric types)
    pub fn to_f64(&self) -> Option<Vec<Option<f64>>> {
        match self {
            DataColumn::Int64(v) => Some(v.iter().map(|x| x.map(|x| x as f64)).collect()),
            DataColumn::Float64(v) => Some(v.clone()),
            DataColumn::String(_) => None,
        }
    }

    /// Borrow the string values (for string columns)
    pub fn as_strings(&self) -> Option<&[Option<String>]> {
        match self {
            DataColumn::String(v) => Some(v),
            _ => None,
        }
    }

    /// Promote a numeric column to `Float64`
    pub fn cast_to_float(&self) -> Option<DataColumn> {
        self.to_f64().map(DataColumn::Float64)
    }

    /// Gather rows by index; `None` produces a null row
    pub fn take(&self, indices: &[Option<usize>]) -> DataColumn {
        fn pick<T: Clone>(values: &[Option<T>], indices: &[Option<usize>]) -> Vec<Option<T>> {
            indices
                .iter()
                .map(|i| i.and_then(|i| values.get(i).cloned().flatten()))
                .collect()
        }

        match self {
            DataColumn::Int64(v) => DataColumn::Int64(pick(v, indices)),
            DataColumn::Float64(v) => DataColumn::Float64(pick(v, indices)),
            DataColumn::String(v) => DataColumn::String(pick(v, indices)),
        }
    }

    /// Most frequent non-null value
    ///
    /// Ties go to the smallest value, so the result does not depend on
    /// row order.
    pub fn mode(&self) -> Option<Value> {
        match self {
            DataColumn::Int64(v) => {
                let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
                for x in v.iter().flatten() {
                    *counts.entry(*x).or_default() += 1;
                }
                most_frequent(counts).map(Value::Int64)
            }
            DataColumn::Float64(v) => {
                let mut sorted: Vec<f64> = v.iter().flatten().copied().collect();
                sorted.sort_by(|a, b| a.total_cmp(b));
                let mut best: Option<(f64, usize)> = None;
                let mut i = 0;
                while i < sorted.len() {
                    let run = sorted[i..]
                        .iter()
                        .take_while(|x| x.total_cmp(&sorted[i]) == Ordering::Equal)
                        .count();
                    if best.map_or(true, |(_, n)| run > n) {
                        best = Some((sorted[i], run));
                    }
                    i += run;
                }
                best.map(|(x, _)| Value::Float64(x))
            }
            DataColumn::String(v) => {
                let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
                for x in v.iter().flatten() {
                    *counts.entry(x.as_str()).or_default() += 1;
                }
                most_frequent(counts).map(|s| Value::String(s.to_string()))
            }
        }
    }

    /// Replace nulls with `value`
    ///
    /// Integer values may fill a float column; any other type combination
    /// is rejected.
    pub fn fill_null(&self, value: &Value) -> IoResult<DataColumn> {
        match (self, value) {
            (DataColumn::Int64(v), Value::Int64(x)) => Ok(DataColumn::Int64(
                v.iter().map(|c| Some(c.unwrap_or(*x))).collect(),
            )),
            (DataColumn::Float64(v), Value::Float64(_) | Value::Int64(_)) => {
                let x = value.as_f64().unwrap_or(f64::NAN);
                Ok(DataColumn::Float64(
                    v.iter().map(|c| Some(c.unwrap_or(x))).collect(),
                ))
            }
            (DataColumn::String(v), Value::String(x)) => Ok(DataColumn::String(
                v.iter()
                    .map(|c| Some(c.clone().unwrap_or_else(|| x.clone())))
                    .collect(),
            )),
            _ => Err(IoError::TypeMismatch {
                expected: self.dtype().to_string(),
                actual: value.dtype().to_string(),
            }),
        }
    }
}

fn most_frequent<K: Ord>(counts: BTreeMap<K, usize>) -> Option<K> {
    let mut best: Option<(K, usize)> = None;
    for (key, count) in counts {
        if best.as_ref().map_or(true, |(_, n)| count > *n) {
            best = Some((key, count));
        }
    }
    best.map(|(key, _)| key)
}
