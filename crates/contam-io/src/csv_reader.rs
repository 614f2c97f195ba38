//! Delimited text reader with type inference

use crate::reader::{IoError, IoResult, TableReader};
use crate::schema::{ColumnType, DataColumn};
use crate::table::Table;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Default field separator for the case-study files
pub const DEFAULT_DELIMITER: u8 = b';';

/// Tokens read as missing values
const NULL_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

/// CSV file reader
///
/// The file is read fully on open; `read_table` hands out copies.
pub struct CsvReader {
    path: String,
    table: Table,
}

impl CsvReader {
    /// Open a `;`-separated file with a header row
    pub fn open(path: &str) -> IoResult<Self> {
        Self::open_with_options(path, DEFAULT_DELIMITER, true)
    }

    /// Open a CSV file with options
    pub fn open_with_options(path: &str, delimiter: u8, has_header: bool) -> IoResult<Self> {
        if !Path::new(path).exists() {
            return Err(IoError::FileNotFound(path.to_string()));
        }

        let file = File::open(path).map_err(|e| IoError::OpenFailed(e.to_string()))?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(has_header)
            .from_reader(BufReader::new(file));

        let mut rows: Vec<Vec<String>> = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| IoError::InvalidFormat(e.to_string()))?;
            rows.push(record.iter().map(|s| s.to_string()).collect());
        }

        let headers = if has_header {
            reader
                .headers()
                .map_err(|e| IoError::InvalidFormat(e.to_string()))?
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
        } else {
            // Generate column names
            let width = rows.first().map_or(0, Vec::len);
            (0..width).map(|i| format!("col_{}", i)).collect()
        };

        let table = build_table(&headers, &rows)?;
        tracing::debug!(
            "Read {} rows x {} columns from {}",
            table.num_rows(),
            table.num_columns(),
            path
        );

        Ok(Self {
            path: path.to_string(),
            table,
        })
    }
}

impl TableReader for CsvReader {
    fn read_table(&self) -> IoResult<Table> {
        Ok(self.table.clone())
    }

    fn path(&self) -> Option<&str> {
        Some(&self.path)
    }

    fn format_name(&self) -> &'static str {
        "CSV"
    }
}

/// Parse delimited text already held in memory
pub fn parse_str(content: &str, delimiter: u8) -> IoResult<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| IoError::InvalidFormat(e.to_string()))?
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| IoError::InvalidFormat(e.to_string()))?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }

    build_table(&headers, &rows)
}

/// Write a table as delimited text; nulls become empty fields
pub fn write_csv(table: &Table, path: &Path, delimiter: u8) -> IoResult<()> {
    let file = File::create(path).map_err(|e| IoError::OpenFailed(e.to_string()))?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(BufWriter::new(file));

    writer
        .write_record(table.column_names())
        .map_err(|e| IoError::Io(e.to_string()))?;

    let columns: Vec<_> = table.columns().map(|(_, data)| data).collect();
    for row in 0..table.num_rows() {
        let record: Vec<String> = columns
            .iter()
            .map(|c| c.get(row).map(|v| v.to_string()).unwrap_or_default())
            .collect();
        writer
            .write_record(&record)
            .map_err(|e| IoError::Io(e.to_string()))?;
    }

    writer.flush().map_err(|e| IoError::Io(e.to_string()))
}

fn build_table(headers: &[String], rows: &[Vec<String>]) -> IoResult<Table> {
    let mut table = Table::new();
    for (i, name) in headers.iter().enumerate() {
        let values: Vec<&str> = rows
            .iter()
            .map(|r| r.get(i).map(String::as_str).unwrap_or(""))
            .collect();
        let dtype = infer_type(&values);
        if table.has_column(name) {
            return Err(IoError::DuplicateColumn(name.clone()));
        }
        table.insert_column(name.as_str(), parse_column(&values, dtype))?;
    }
    Ok(table)
}

fn is_null_token(value: &str) -> bool {
    NULL_TOKENS.contains(&value.trim())
}

/// Infer column type from its values
fn infer_type(values: &[&str]) -> ColumnType {
    let present: Vec<&str> = values
        .iter()
        .copied()
        .filter(|s| !is_null_token(s))
        .map(str::trim)
        .collect();
    if present.is_empty() {
        return ColumnType::String;
    }

    // Try parsing as integers
    if present.iter().all(|s| s.parse::<i64>().is_ok()) {
        return ColumnType::Int64;
    }

    // Try parsing as floats
    if present.iter().all(|s| s.parse::<f64>().is_ok()) {
        return ColumnType::Float64;
    }

    ColumnType::String
}

/// Parse column values into a DataColumn
fn parse_column(values: &[&str], dtype: ColumnType) -> DataColumn {
    let present = |s: &&str| !is_null_token(s);
    match dtype {
        ColumnType::Int64 => DataColumn::Int64(
            values
                .iter()
                .map(|s| Some(*s).filter(present).and_then(|s| s.trim().parse().ok()))
                .collect(),
        ),
        ColumnType::Float64 => DataColumn::Float64(
            values
                .iter()
                .map(|s| {
                    Some(*s)
                        .filter(present)
                        .and_then(|s| s.trim().parse::<f64>().ok())
                        .filter(|x| !x.is_nan())
                })
                .collect(),
        ),
        ColumnType::String => DataColumn::String(
            values
                .iter()
                .map(|s| Some(*s).filter(present).map(|s| s.to_string()))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_infer_type_int() {
        assert_eq!(infer_type(&["1", "2", ""]), ColumnType::Int64);
    }

    #[test]
    fn test_infer_type_float() {
        assert_eq!(infer_type(&["1.5", "2", "NaN"]), ColumnType::Float64);
    }

    #[test]
    fn test_infer_type_string() {
        assert_eq!(infer_type(&["solteiro", "1"]), ColumnType::String);
        assert_eq!(infer_type(&["", ""]), ColumnType::String);
    }

    #[test]
    fn test_parse_column_null_tokens() {
        assert_eq!(
            parse_column(&["3", "NA", " 7 "], ColumnType::Int64),
            DataColumn::Int64(vec![Some(3), None, Some(7)])
        );
        assert_eq!(
            parse_column(&["0.5", "null", "nan"], ColumnType::Float64),
            DataColumn::Float64(vec![Some(0.5), None, None])
        );
        assert_eq!(
            parse_column(&["sul", "", "None"], ColumnType::String),
            DataColumn::from_strs([Some("sul"), None, None])
        );
    }

    #[test]
    fn test_parse_str_with_missing_values() {
        let table = parse_str("name;idade;estado_civil\n1;30;casado\n2;;\n", b';').unwrap();
        assert_eq!(table.num_rows(), 2);
        assert_eq!(
            table.column("idade").unwrap(),
            &DataColumn::Int64(vec![Some(30), None])
        );
        assert_eq!(table.column("estado_civil").unwrap().null_count(), 1);
    }

    #[test]
    fn test_open_semicolon_file() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "V1;V2;prob_V1_V2").unwrap();
        writeln!(file, "1;2;0.5").unwrap();
        writeln!(file, "2;3;").unwrap();

        let reader = CsvReader::open(file.path().to_str().unwrap()).unwrap();
        let table = reader.read_table().unwrap();
        assert_eq!(table.column_names(), vec!["V1", "V2", "prob_V1_V2"]);
        assert_eq!(
            table.column("prob_V1_V2").unwrap(),
            &DataColumn::Float64(vec![Some(0.5), None])
        );
        assert_eq!(reader.format_name(), "CSV");
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let result = parse_str("a;b\n1;2\n3\n", b';');
        assert!(matches!(result, Err(IoError::InvalidFormat(_))));
    }

    #[test]
    fn test_write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let table = parse_str("V1;Label\n1;0.25\n2;\n", b';').unwrap();

        write_csv(&table, &path, b';').unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "V1;Label\n1;0.25\n2;\n");
    }
}
