//! Configuration for contam-core
//!
//! Every pipeline stage receives a `ContamConfig` explicitly: input and
//! output locations, column names, imputation lists and model settings.
//! Defaults reproduce the contamination case study layout.

use std::path::{Path, PathBuf};

use contam_stats::Metric;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pipeline-wide configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContamConfig {
    /// Input, intermediate and artifact locations
    pub paths: PathsConfig,
    /// Names of the key, target and banded columns
    pub columns: ColumnsConfig,
    /// Imputation and recoding lists
    pub preprocess: PreprocessConfig,
    /// Model training settings
    pub model: ModelConfig,
}

/// Filesystem locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Individual attributes (`;`-separated)
    pub individuals: PathBuf,
    /// Pairwise observations (`;`-separated)
    pub pairs: PathBuf,
    /// Directory for `df_train` / `df_predict`
    pub processed_dir: PathBuf,
    /// Directory for the model artifact, predictions and metrics
    pub models_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self::under(Path::new("workspace"))
    }
}

impl PathsConfig {
    /// Standard layout below `root`: inputs in `data/raw`, intermediates in
    /// `data/processed`, artifacts in `model`
    pub fn under(root: &Path) -> Self {
        let data = root.join("data");
        Self {
            individuals: data.join("raw").join("individuos_espec.csv"),
            pairs: data.join("raw").join("conexoes_espec.csv"),
            processed_dir: data.join("processed"),
            models_dir: root.join("model"),
        }
    }

    pub fn train_table(&self) -> PathBuf {
        self.processed_dir.join("df_train.json")
    }

    pub fn predict_table(&self) -> PathBuf {
        self.processed_dir.join("df_predict.json")
    }

    pub fn predictions(&self) -> PathBuf {
        self.models_dir.join("prediction.csv")
    }

    pub fn evaluation(&self) -> PathBuf {
        self.models_dir.join("evaluation.json")
    }
}

/// Column names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnsConfig {
    /// Unique individual key in the individual table
    pub individual_key: String,
    /// Contamination probability
    pub target: String,
    /// Age source column and its derived band column
    pub age: String,
    pub age_band: String,
    /// Body-mass index source column and its derived band column
    pub bmi: String,
    pub bmi_band: String,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            individual_key: "name".to_string(),
            target: "prob_V1_V2".to_string(),
            age: "idade".to_string(),
            age_band: "faixa_etaria".to_string(),
            bmi: "IMC".to_string(),
            bmi_band: "status_IMC".to_string(),
        }
    }
}

/// Imputation and recoding lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// 0/1 variables recoded into descriptive labels
    pub binary_variables: Vec<String>,
    /// Variables filled with their mode before recoding
    pub mode_fill_variables: Vec<String>,
    /// Continuous variables filled with their median
    pub median_fill_variables: Vec<String>,
    /// Counting variables recoded into presence labels
    pub counting_variables: Vec<String>,
    /// Category name used by the counting recode
    pub counting_category: String,
    /// Category levels left out of the model encoding (reference levels)
    pub dropped_levels: Vec<String>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            binary_variables: strings(&["estuda", "trabalha", "pratica_esportes"]),
            mode_fill_variables: strings(&["estuda", "trabalha", "pratica_esportes"]),
            median_fill_variables: strings(&["IMC", "idade"]),
            counting_variables: strings(&["qt_filhos"]),
            counting_category: "filhos".to_string(),
            dropped_levels: strings(&[
                "taxi__V1",
                "taxi__V2",
                "familia",
                "visita_rara",
                "sem_filhos__V1",
                "sem_filhos__V2",
                "divorciado__V1",
                "divorciado__V2",
                "no_estuda__V1",
                "no_estuda__V2",
                "no_trabalha__V1",
                "no_trabalha__V2",
                "no_pratica_esportes__V1",
                "no_pratica_esportes__V2",
                "adequado__V1",
                "adequado__V2",
                "maior_65__V1",
                "maior_65__V2",
            ]),
        }
    }
}

/// Model training settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Random seed for splits, folds and bootstrap samples
    pub session_id: u64,
    /// Artifact file name inside the models directory
    pub model_file: String,
    /// Share of rows used for fitting during `train`; the rest is held out
    pub train_fraction: f64,
    /// Cross-validation folds used to tune `alpha`
    pub folds: usize,
    /// Candidate ridge penalties
    pub alphas: Vec<f64>,
    /// Bagging members; 1 disables bagging
    pub ensemble_estimators: usize,
    /// Standardize numeric features
    pub normalize: bool,
    /// Metrics reported by training and validation
    pub metrics: Vec<Metric>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            session_id: 16,
            model_file: "ridge_model.json".to_string(),
            train_fraction: 0.7,
            folds: 5,
            alphas: vec![0.001, 0.01, 0.1, 1.0, 10.0, 100.0],
            ensemble_estimators: 10,
            normalize: true,
            metrics: Metric::ALL.to_vec(),
        }
    }
}

impl ContamConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with every path relocated under `root`
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            paths: PathsConfig::under(root),
            ..Self::default()
        }
    }

    /// Location of the saved model artifact
    pub fn model_path(&self) -> PathBuf {
        self.paths.models_dir.join(&self.model.model_file)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load a `.toml` or `.json` file, chosen by extension
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content)?,
            _ => Self::from_toml(&content)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.model.train_fraction > 0.0 && self.model.train_fraction <= 1.0) {
            return Err(ConfigError::OutOfRange(
                "train_fraction must be in (0.0, 1.0]".to_string(),
            ));
        }

        if self.model.folds < 2 {
            return Err(ConfigError::OutOfRange("folds must be at least 2".to_string()));
        }

        if self.model.alphas.is_empty() {
            return Err(ConfigError::MissingField("alphas".to_string()));
        }

        if self.model.alphas.iter().any(|a| !a.is_finite() || *a < 0.0) {
            return Err(ConfigError::OutOfRange(
                "alphas must be finite and non-negative".to_string(),
            ));
        }

        if self.model.ensemble_estimators == 0 {
            return Err(ConfigError::OutOfRange(
                "ensemble_estimators must be positive".to_string(),
            ));
        }

        if self.model.model_file.is_empty() {
            return Err(ConfigError::MissingField("model_file".to_string()));
        }

        if self.columns.target == self.columns.individual_key {
            return Err(ConfigError::Conflict(
                "target and individual_key must differ".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration validation error
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Value is out of valid range
    #[error("Value out of range: {0}")]
    OutOfRange(String),
    /// Required field is missing
    #[error("Missing field: {0}")]
    MissingField(String),
    /// Settings contradict each other
    #[error("Conflicting settings: {0}")]
    Conflict(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ContamConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.columns.target, "prob_V1_V2");
        assert_eq!(config.model.session_id, 16);
        assert_eq!(config.model.metrics.len(), 6);
    }

    #[test]
    fn test_json_serialization() {
        let config = ContamConfig::default();
        let json = config.to_json().unwrap();
        let parsed = ContamConfig::from_json(&json).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ContamConfig::from_toml(
            r#"
            [model]
            folds = 3
            metrics = ["RMSE", "R2"]

            [paths]
            models_dir = "/tmp/models"
            "#,
        )
        .unwrap();

        assert_eq!(config.model.folds, 3);
        assert_eq!(config.model.metrics, vec![Metric::Rmse, Metric::R2]);
        assert_eq!(config.model.session_id, 16);
        assert_eq!(config.paths.models_dir, PathBuf::from("/tmp/models"));
        assert_eq!(config.columns.individual_key, "name");
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ContamConfig::default();
        let toml_str = config.to_toml().unwrap();
        assert_eq!(ContamConfig::from_toml(&toml_str).unwrap(), config);
    }

    #[test]
    fn test_out_of_range() {
        let mut config = ContamConfig::default();
        config.model.train_fraction = 1.5;
        assert!(config.validate().is_err());

        let mut config = ContamConfig::default();
        config.model.folds = 1;
        assert!(config.validate().is_err());

        let mut config = ContamConfig::default();
        config.columns.target = "name".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Conflict(_))));
    }
}
