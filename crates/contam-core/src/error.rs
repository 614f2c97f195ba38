//! Error types for contam-core
//!
//! Provides error handling for:
//! - Table I/O (reading inputs, persisting intermediates)
//! - Preprocessing (imputation and recoding)
//! - Model lifecycle and scoring
//! - Configuration loading and validation

use contam_io::IoError;
use contam_stats::MetricError;
use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for contam operations
pub type Result<T> = std::result::Result<T, ContamError>;

/// Main error type for contam operations
#[derive(Error, Debug)]
pub enum ContamError {
    /// Table I/O errors
    #[error("Table error: {0}")]
    Io(#[from] IoError),

    /// Preprocessing errors
    #[error("Preprocessing error: {0}")]
    Preprocess(#[from] PreprocessError),

    /// Model errors
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Fs(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Errors raised while cleaning and recoding individual attributes
#[derive(Error, Debug)]
pub enum PreprocessError {
    /// Column missing from the input table
    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    /// A numeric operation was asked of a non-numeric column
    #[error("Column '{column}' is {dtype}, expected a numeric column")]
    NonNumericColumn { column: String, dtype: String },

    /// Nothing to impute from
    #[error("Column '{0}' has no observed values")]
    NoObservedValues(String),

    /// Underlying table operation failed
    #[error(transparent)]
    Table(#[from] IoError),
}

/// Errors related to the model lifecycle
#[derive(Error, Debug)]
pub enum ModelError {
    /// Lifecycle step called out of order
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Target column absent or fully missing
    #[error("Target '{0}' has no observed values")]
    MissingTarget(String),

    /// Nothing left to learn from
    #[error("No training rows: {0}")]
    EmptyTraining(String),

    /// Normal equations could not be solved
    #[error("Linear system is singular")]
    Singular,

    /// Input table does not match the trained features
    #[error("Feature '{feature}' has type {actual}, expected {expected}")]
    FeatureType {
        feature: String,
        expected: String,
        actual: String,
    },

    /// Model artifact could not be read or written
    #[error("Model artifact error: {0}")]
    Artifact(String),

    /// Metric computation failed
    #[error("Metric error: {0}")]
    Metric(#[from] MetricError),

    /// Underlying table operation failed
    #[error(transparent)]
    Table(#[from] IoError),
}
