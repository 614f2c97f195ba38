//! Persisted intermediate tables and output directories

use crate::reader::{IoError, IoResult, TableReader};
use crate::table::Table;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Serialize a table to `path` as JSON
pub fn save_table(table: &Table, path: &Path) -> IoResult<()> {
    let file = File::create(path)
        .map_err(|e| IoError::OpenFailed(format!("{}: {}", path.display(), e)))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, table).map_err(|e| IoError::Io(e.to_string()))?;
    writer.flush().map_err(|e| IoError::Io(e.to_string()))?;
    tracing::debug!("Saved {} rows to {}", table.num_rows(), path.display());
    Ok(())
}

/// Load a table previously written by [`save_table`]
pub fn load_table(path: &Path) -> IoResult<Table> {
    if !path.exists() {
        return Err(IoError::FileNotFound(path.display().to_string()));
    }
    let file = File::open(path).map_err(|e| IoError::OpenFailed(e.to_string()))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| IoError::InvalidFormat(e.to_string()))
}

/// Create each directory (and its parents)
///
/// A directory that already exists is fine; any other failure, including
/// a regular file sitting at the path, is returned.
pub fn ensure_directories<P: AsRef<Path>>(directories: &[P]) -> IoResult<()> {
    for directory in directories {
        let directory = directory.as_ref();
        match fs::create_dir_all(directory) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists && directory.is_dir() => {}
            Err(e) => return Err(IoError::Io(format!("{}: {}", directory.display(), e))),
        }
    }
    Ok(())
}

/// Reader for tables persisted with [`save_table`]
pub struct StoredTableReader {
    path: PathBuf,
    display: String,
}

impl StoredTableReader {
    pub fn open(path: &str) -> IoResult<Self> {
        let path = PathBuf::from(path);
        if !path.exists() {
            return Err(IoError::FileNotFound(path.display().to_string()));
        }
        Ok(Self {
            display: path.display().to_string(),
            path,
        })
    }
}

impl TableReader for StoredTableReader {
    fn read_table(&self) -> IoResult<Table> {
        load_table(&self.path)
    }

    fn path(&self) -> Option<&str> {
        Some(&self.display)
    }

    fn format_name(&self) -> &'static str {
        "JSON"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::open_file;
    use crate::schema::DataColumn;

    #[test]
    fn test_save_and_load_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("df_train.json");
        let table = Table::from_columns([
            ("V1", DataColumn::Int64(vec![Some(1), None])),
            ("prob_V1_V2", DataColumn::Float64(vec![Some(0.1 + 0.2), None])),
            ("status_IMC_V1", DataColumn::from_strs([Some("adequado__V1"), None])),
        ])
        .unwrap();

        save_table(&table, &path).unwrap();
        assert_eq!(load_table(&path).unwrap(), table);

        let reader = open_file(path.to_str().unwrap()).unwrap();
        assert_eq!(reader.format_name(), "JSON");
        assert_eq!(reader.read_table().unwrap(), table);
    }

    #[test]
    fn test_load_missing_table() {
        let result = load_table(Path::new("/nonexistent/df_predict.json"));
        assert!(matches!(result, Err(IoError::FileNotFound(_))));
    }

    #[test]
    fn test_ensure_directories_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("data").join("processed");
        ensure_directories(&[&nested]).unwrap();
        ensure_directories(&[&nested]).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_ensure_directories_rejects_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("model");
        std::fs::write(&file, b"not a directory").unwrap();
        assert!(ensure_directories(&[&file]).is_err());
    }
}
