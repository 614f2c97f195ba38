//! Regression modelling
//!
//! The model lifecycle (setup, train, finalize, save, load, predict) is
//! expressed by the [`RegressorBackend`] capability trait. The
//! [`RegressorTrainer`] façade sequences those calls and enforces their
//! order; [`RidgeBackend`] is the native implementation.

pub mod encoder;
pub mod ridge;
pub mod trainer;

use std::fmt;
use std::path::Path;

use contam_io::Table;
use contam_stats::{Metric, MetricReport};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

pub use encoder::FeatureEncoder;
pub use ridge::{RidgeBackend, RidgeModel, RidgeSettings};
pub use trainer::{evaluation_metrics, Prediction, RegressorTrainer, LABEL_COLUMN};

/// Configuration handed to a backend when a session starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Column to learn
    pub target: String,
    /// String-typed feature columns
    pub categorical_features: Vec<String>,
    /// Numeric feature columns
    pub numeric_features: Vec<String>,
    /// Random seed
    pub session_id: u64,
    /// Metrics reported by `train`
    pub metrics: Vec<Metric>,
}

impl SessionOptions {
    /// Derive the feature lists from column types
    ///
    /// Every column except the target is a feature: string columns are
    /// categorical, numeric columns are numeric.
    pub fn infer(data: &Table, target: &str, session_id: u64) -> Self {
        let keep = |names: Vec<&str>| -> Vec<String> {
            names
                .into_iter()
                .filter(|name| *name != target)
                .map(String::from)
                .collect()
        };

        Self {
            target: target.to_string(),
            categorical_features: keep(data.string_column_names()),
            numeric_features: keep(data.numeric_column_names()),
            session_id,
            metrics: Metric::ALL.to_vec(),
        }
    }

    pub fn with_metrics(mut self, metrics: Vec<Metric>) -> Self {
        self.metrics = metrics;
        self
    }
}

/// A regression engine driven through a session lifecycle
pub trait RegressorBackend {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Start a session on `data`
    fn setup(&mut self, data: &Table, options: &SessionOptions) -> Result<(), ModelError>;

    /// Fit and tune the model, returning its evaluation metrics
    fn train(&mut self) -> Result<MetricReport, ModelError>;

    /// Refit the trained model on the complete session dataset
    fn finalize(&mut self) -> Result<(), ModelError>;

    /// Persist the model to `path`
    fn save(&self, path: &Path) -> Result<(), ModelError>;

    /// Restore a model previously saved at `path`
    fn load(&mut self, path: &Path) -> Result<(), ModelError>;

    /// Predict the target for every row of `data`
    fn predict(&self, data: &Table) -> Result<Vec<f64>, ModelError>;
}

/// Lifecycle position of a [`RegressorTrainer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Uninitialized,
    SessionStarted,
    Trained,
    Finalized,
    Saved,
    Loaded,
}

impl SessionState {
    /// Whether a model is available for prediction
    pub fn can_predict(&self) -> bool {
        matches!(
            self,
            SessionState::Finalized | SessionState::Saved | SessionState::Loaded
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::SessionStarted => "session-started",
            SessionState::Trained => "trained",
            SessionState::Finalized => "finalized",
            SessionState::Saved => "saved",
            SessionState::Loaded => "loaded",
        };
        f.write_str(name)
    }
}
