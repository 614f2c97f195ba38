//! Ordered model lifecycle over a [`RegressorBackend`]

use std::path::Path;

use contam_io::{DataColumn, Table};
use contam_stats::{Metric, MetricReport};

use crate::error::ModelError;
use crate::model::{RegressorBackend, SessionOptions, SessionState};

/// Name of the prediction column appended by [`RegressorTrainer::predict_model`]
pub const LABEL_COLUMN: &str = "Label";

/// Scored rows and, in validation mode, their metrics
#[derive(Debug, Clone)]
pub struct Prediction {
    pub table: Table,
    pub metrics: Option<MetricReport>,
}

/// Drives a backend through setup, training, finalization and persistence
pub struct RegressorTrainer<B: RegressorBackend> {
    backend: B,
    data: Table,
    options: SessionOptions,
    experiment: String,
    state: SessionState,
    metrics: Option<MetricReport>,
}

impl<B: RegressorBackend> RegressorTrainer<B> {
    /// Create a trainer for `data`, inferring features from column types
    pub fn new(
        backend: B,
        data: Table,
        target: &str,
        experiment: impl Into<String>,
        session_id: u64,
    ) -> Self {
        let options = SessionOptions::infer(&data, target, session_id);
        Self {
            backend,
            data,
            options,
            experiment: experiment.into(),
            state: SessionState::Uninitialized,
            metrics: None,
        }
    }

    /// Restrict the metrics reported by training
    pub fn with_metrics(mut self, metrics: Vec<Metric>) -> Self {
        self.options = self.options.with_metrics(metrics);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Metrics of the last training run
    pub fn metrics(&self) -> Option<&MetricReport> {
        self.metrics.as_ref()
    }

    fn check_transition(
        &self,
        allowed: &[SessionState],
        to: SessionState,
    ) -> Result<(), ModelError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(ModelError::InvalidTransition {
                from: self.state.to_string(),
                to: to.to_string(),
            })
        }
    }

    pub fn start_session(&mut self) -> Result<(), ModelError> {
        self.check_transition(&[SessionState::Uninitialized], SessionState::SessionStarted)?;
        tracing::info!(
            "Starting {} session '{}' on {} rows",
            self.backend.name(),
            self.experiment,
            self.data.num_rows()
        );
        self.backend.setup(&self.data, &self.options)?;
        self.state = SessionState::SessionStarted;
        Ok(())
    }

    /// Train and tune; may be repeated before finalization
    pub fn train_model(&mut self) -> Result<&MetricReport, ModelError> {
        self.check_transition(
            &[SessionState::SessionStarted, SessionState::Trained],
            SessionState::Trained,
        )?;
        let report = self.backend.train()?;
        tracing::info!("Holdout metrics: {}", report);
        self.state = SessionState::Trained;
        Ok(&*self.metrics.insert(report))
    }

    pub fn finalize_model(&mut self) -> Result<(), ModelError> {
        self.check_transition(&[SessionState::Trained], SessionState::Finalized)?;
        self.backend.finalize()?;
        self.state = SessionState::Finalized;
        Ok(())
    }

    pub fn save_model(&mut self, path: &Path) -> Result<(), ModelError> {
        self.check_transition(
            &[SessionState::Finalized, SessionState::Saved],
            SessionState::Saved,
        )?;
        self.backend.save(path)?;
        tracing::info!("Saved model to {}", path.display());
        self.state = SessionState::Saved;
        Ok(())
    }

    pub fn load_model(&mut self, path: &Path) -> Result<(), ModelError> {
        self.check_transition(
            &[SessionState::Uninitialized, SessionState::Loaded],
            SessionState::Loaded,
        )?;
        self.backend.load(path)?;
        tracing::info!("Loaded model from {}", path.display());
        self.state = SessionState::Loaded;
        Ok(())
    }

    /// Score `data`, appending a [`LABEL_COLUMN`] column
    ///
    /// With a `target`, metrics are computed over the rows where the target
    /// is present.
    pub fn predict_model(
        &self,
        data: &Table,
        target: Option<&str>,
    ) -> Result<Prediction, ModelError> {
        if !self.state.can_predict() {
            return Err(ModelError::InvalidTransition {
                from: self.state.to_string(),
                to: "predicted".to_string(),
            });
        }

        let scores = self.backend.predict(data)?;
        let mut table = data.clone();
        table.insert_column(
            LABEL_COLUMN,
            DataColumn::Float64(scores.iter().copied().map(Some).collect()),
        )?;

        let metrics = match target {
            Some(target) => Some(score_against_target(
                &table,
                target,
                &scores,
                &self.options.metrics,
            )?),
            None => None,
        };

        Ok(Prediction { table, metrics })
    }
}

fn score_against_target(
    table: &Table,
    target: &str,
    scores: &[f64],
    metrics: &[Metric],
) -> Result<MetricReport, ModelError> {
    let column = table.require_column(target)?;
    let values = column.to_f64().ok_or_else(|| ModelError::FeatureType {
        feature: target.to_string(),
        expected: "numeric".to_string(),
        actual: column.dtype().to_string(),
    })?;

    let (actual, predicted): (Vec<f64>, Vec<f64>) = values
        .iter()
        .zip(scores)
        .filter_map(|(actual, &score)| actual.map(|a| (a, score)))
        .unzip();
    if actual.is_empty() {
        return Err(ModelError::MissingTarget(target.to_string()));
    }

    let report = evaluation_metrics(&actual, &predicted, metrics)?;
    tracing::info!("Validation metrics on {} rows: {}", actual.len(), report);
    Ok(report)
}

/// Compute `metrics`, rounded to two decimals
pub fn evaluation_metrics(
    actual: &[f64],
    predicted: &[f64],
    metrics: &[Metric],
) -> Result<MetricReport, ModelError> {
    Ok(MetricReport::evaluate(actual, predicted, metrics)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Predicts a constant and records lifecycle calls
    #[derive(Default)]
    struct ConstantBackend {
        value: f64,
        saved: Cell<bool>,
    }

    impl RegressorBackend for ConstantBackend {
        fn name(&self) -> &'static str {
            "constant"
        }

        fn setup(&mut self, _data: &Table, _options: &SessionOptions) -> Result<(), ModelError> {
            Ok(())
        }

        fn train(&mut self) -> Result<MetricReport, ModelError> {
            self.value = 0.5;
            Ok(MetricReport::evaluate(&[0.5], &[0.5], &[Metric::Mae])?)
        }

        fn finalize(&mut self) -> Result<(), ModelError> {
            Ok(())
        }

        fn save(&self, _path: &Path) -> Result<(), ModelError> {
            self.saved.set(true);
            Ok(())
        }

        fn load(&mut self, _path: &Path) -> Result<(), ModelError> {
            self.value = 0.25;
            Ok(())
        }

        fn predict(&self, data: &Table) -> Result<Vec<f64>, ModelError> {
            Ok(vec![self.value; data.num_rows()])
        }
    }

    fn data() -> Table {
        Table::from_columns([
            ("sexo_V1", DataColumn::from_strs([Some("f__V1"), Some("m__V1"), None])),
            ("prob_V1_V2", DataColumn::Float64(vec![Some(0.5), Some(1.5), None])),
        ])
        .unwrap()
    }

    fn trainer() -> RegressorTrainer<ConstantBackend> {
        RegressorTrainer::new(ConstantBackend::default(), data(), "prob_V1_V2", "test", 16)
    }

    #[test]
    fn test_full_lifecycle() {
        let mut trainer = trainer();
        assert_eq!(trainer.options().categorical_features, vec!["sexo_V1"]);
        assert!(trainer.options().numeric_features.is_empty());

        trainer.start_session().unwrap();
        trainer.train_model().unwrap();
        trainer.finalize_model().unwrap();
        trainer.save_model(Path::new("model.json")).unwrap();

        assert_eq!(trainer.state(), SessionState::Saved);
        assert!(trainer.backend().saved.get());
        assert_eq!(trainer.metrics().unwrap().get(Metric::Mae), Some(0.0));
    }

    #[test]
    fn test_out_of_order_calls() {
        let mut trainer = trainer();
        assert!(matches!(
            trainer.train_model(),
            Err(ModelError::InvalidTransition { .. })
        ));
        assert!(trainer.predict_model(&data(), None).is_err());

        trainer.start_session().unwrap();
        assert!(trainer.finalize_model().is_err());
        assert!(trainer.save_model(Path::new("model.json")).is_err());
        assert!(trainer.load_model(Path::new("model.json")).is_err());
        assert_eq!(trainer.state(), SessionState::SessionStarted);
    }

    #[test]
    fn test_predict_appends_label() {
        let mut trainer = trainer();
        trainer.load_model(Path::new("model.json")).unwrap();

        let prediction = trainer.predict_model(&data(), None).unwrap();
        assert!(prediction.metrics.is_none());
        assert_eq!(
            prediction.table.column(LABEL_COLUMN),
            Some(&DataColumn::Float64(vec![Some(0.25); 3]))
        );
        assert_eq!(prediction.table.num_columns(), 3);
    }

    #[test]
    fn test_validation_metrics_skip_missing_targets() {
        let mut trainer = trainer().with_metrics(vec![Metric::Mae, Metric::Mse]);
        trainer.load_model(Path::new("model.json")).unwrap();

        let prediction = trainer.predict_model(&data(), Some("prob_V1_V2")).unwrap();
        let metrics = prediction.metrics.unwrap();
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics.get(Metric::Mae), Some(0.75));
        assert_eq!(metrics.get(Metric::Mse), Some(0.81));
    }

    #[test]
    fn test_validation_without_targets() {
        let mut trainer = trainer();
        trainer.load_model(Path::new("model.json")).unwrap();

        let unlabelled = data().filter_rows(&[false, false, true]).unwrap();
        assert!(matches!(
            trainer.predict_model(&unlabelled, Some("prob_V1_V2")),
            Err(ModelError::MissingTarget(_))
        ));
    }
}
