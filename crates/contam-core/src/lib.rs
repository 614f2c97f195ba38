//! Contam Core - Pairwise contamination probability pipeline
//!
//! This crate provides the stages of the contam batch pipeline:
//!
//! - **Preprocess**: Imputation, binary and counting recodes, age and BMI bands
//! - **Roles**: `V1`/`V2` tagged copies of the individual table
//! - **Assemble**: Labelled training table and unlabelled prediction table
//! - **Model**: Regressor backend trait, lifecycle façade and native ridge backend
//! - **Pipeline**: Feature generation, model deployment and prediction
//! - **Config**: Paths, column names, recode lists and model settings
//!
//! # Data flow
//!
//! ```text
//! individuals ─ preprocess ─┬─ V1 copy ─┐
//!                           └─ V2 copy ─┼─ join onto pairs ─┬─ df_train ── model
//! pairs ────────────────────────────────┘                   └─ df_predict ─ predictions
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod preprocess;

pub use config::{
    ColumnsConfig, ConfigError, ContamConfig, ModelConfig, PathsConfig, PreprocessConfig,
};
pub use error::{ContamError, ModelError, PreprocessError, Result};
pub use model::{
    evaluation_metrics, FeatureEncoder, Prediction, RegressorBackend, RegressorTrainer,
    RidgeBackend, RidgeModel, RidgeSettings, SessionOptions, SessionState, LABEL_COLUMN,
};
pub use pipeline::{
    deploy_model, generate_features, predict_model, run, FeatureSummary, PredictionSummary,
};
pub use preprocess::{build_datasets, Datasets, Role};
