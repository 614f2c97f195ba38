//! Native ridge regression backend
//!
//! Training follows a create, tune, ensemble sequence:
//!
//! 1. hold out `1 - train_fraction` of the session rows for scoring
//! 2. pick the ridge penalty by seeded k-fold cross-validation on RMSE
//! 3. bag `ensemble_estimators` bootstrap fits and average them
//!
//! `finalize` repeats step 3 with the selected penalty on every session row.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use contam_io::Table;
use contam_stats::{Metric, MetricReport};
use nalgebra::{DMatrix, DVector};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ContamConfig;
use crate::error::ModelError;
use crate::model::encoder::FeatureEncoder;
use crate::model::{RegressorBackend, SessionOptions};
use crate::preprocess::split::{shuffled_indices, train_validation_split};

/// Artifact layout version
const FORMAT_VERSION: u32 = 1;

/// Training knobs for the ridge backend
#[derive(Debug, Clone, PartialEq)]
pub struct RidgeSettings {
    pub alphas: Vec<f64>,
    pub folds: usize,
    pub ensemble_estimators: usize,
    pub train_fraction: f64,
    pub normalize: bool,
    pub dropped_levels: Vec<String>,
}

impl RidgeSettings {
    pub fn from_config(config: &ContamConfig) -> Self {
        Self {
            alphas: config.model.alphas.clone(),
            folds: config.model.folds,
            ensemble_estimators: config.model.ensemble_estimators,
            train_fraction: config.model.train_fraction,
            normalize: config.model.normalize,
            dropped_levels: config.preprocess.dropped_levels.clone(),
        }
    }
}

impl Default for RidgeSettings {
    fn default() -> Self {
        Self::from_config(&ContamConfig::default())
    }
}

/// One fitted linear model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidgeMember {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl RidgeMember {
    fn predict(&self, x: &DMatrix<f64>) -> DVector<f64> {
        let beta = DVector::from_column_slice(&self.coefficients);
        (x * beta).add_scalar(self.intercept)
    }
}

/// Persisted ridge model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidgeModel {
    pub format_version: u32,
    pub id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub target: String,
    pub alpha: f64,
    pub encoder: FeatureEncoder,
    pub members: Vec<RidgeMember>,
}

impl RidgeModel {
    /// Average the members' predictions for `data`
    pub fn predict(&self, data: &Table) -> Result<Vec<f64>, ModelError> {
        let x = self.encoder.encode(data)?;
        Ok(self.predict_encoded(&x))
    }

    fn predict_encoded(&self, x: &DMatrix<f64>) -> Vec<f64> {
        let mut total = DVector::zeros(x.nrows());
        for member in &self.members {
            total += member.predict(x);
        }
        let count = self.members.len().max(1) as f64;
        total.iter().map(|v| v / count).collect()
    }
}

/// Rows and options captured by `setup`
struct Session {
    data: Table,
    options: SessionOptions,
    alpha: Option<f64>,
}

/// Ridge regression behind the [`RegressorBackend`] lifecycle
pub struct RidgeBackend {
    settings: RidgeSettings,
    session: Option<Session>,
    model: Option<RidgeModel>,
}

impl RidgeBackend {
    pub fn new(settings: RidgeSettings) -> Self {
        Self {
            settings,
            session: None,
            model: None,
        }
    }

    pub fn from_config(config: &ContamConfig) -> Self {
        Self::new(RidgeSettings::from_config(config))
    }

    /// The current model, if one was trained or loaded
    pub fn model(&self) -> Option<&RidgeModel> {
        self.model.as_ref()
    }

    fn session(&self) -> Result<&Session, ModelError> {
        self.session
            .as_ref()
            .ok_or_else(|| ModelError::Artifact("no session started".to_string()))
    }

    /// Fit encoder and bagged members on `data` with a fixed penalty
    fn fit_model(
        &self,
        data: &Table,
        options: &SessionOptions,
        alpha: f64,
    ) -> Result<RidgeModel, ModelError> {
        let encoder = FeatureEncoder::fit(
            data,
            options,
            &self.settings.dropped_levels,
            self.settings.normalize,
        )?;
        let x = encoder.encode(data)?;
        let y = target_vector(data, &options.target)?;
        let members = fit_ensemble(
            &x,
            &y,
            alpha,
            self.settings.ensemble_estimators,
            options.session_id,
        )?;

        Ok(RidgeModel {
            format_version: FORMAT_VERSION,
            id: Uuid::new_v4(),
            trained_at: Utc::now(),
            target: options.target.clone(),
            alpha,
            encoder,
            members,
        })
    }
}

impl Default for RidgeBackend {
    fn default() -> Self {
        Self::new(RidgeSettings::default())
    }
}

impl RegressorBackend for RidgeBackend {
    fn name(&self) -> &'static str {
        "ridge"
    }

    fn setup(&mut self, data: &Table, options: &SessionOptions) -> Result<(), ModelError> {
        let labelled = data.drop_null_rows_in(&[options.target.as_str()])?;
        target_vector(&labelled, &options.target)?;
        if labelled.num_rows() == 0 {
            return Err(ModelError::MissingTarget(options.target.clone()));
        }

        tracing::debug!(
            "Ridge session: {} rows, {} numeric and {} categorical features",
            labelled.num_rows(),
            options.numeric_features.len(),
            options.categorical_features.len()
        );

        self.session = Some(Session {
            data: labelled,
            options: options.clone(),
            alpha: None,
        });
        self.model = None;
        Ok(())
    }

    fn train(&mut self) -> Result<MetricReport, ModelError> {
        let session = self.session()?;
        let options = &session.options;

        let (fit_part, holdout) = train_validation_split(
            &session.data,
            self.settings.train_fraction,
            options.session_id,
        );
        let (fit_part, holdout) = if fit_part.num_rows() < 2 || holdout.num_rows() == 0 {
            tracing::warn!("Too few rows for a holdout split; scoring on the training rows");
            (session.data.clone(), session.data.clone())
        } else {
            (fit_part, holdout)
        };

        let encoder = FeatureEncoder::fit(
            &fit_part,
            options,
            &self.settings.dropped_levels,
            self.settings.normalize,
        )?;
        let x = encoder.encode(&fit_part)?;
        let y = target_vector(&fit_part, &options.target)?;

        let alpha = tune_alpha(
            &x,
            &y,
            &self.settings.alphas,
            self.settings.folds,
            options.session_id,
        )?;
        tracing::info!("Selected alpha = {} by {}-fold RMSE", alpha, self.settings.folds);

        let model = self.fit_model(&fit_part, options, alpha)?;
        let predicted = model.predict(&holdout)?;
        let actual: Vec<f64> = target_vector(&holdout, &options.target)?.iter().copied().collect();
        let report = MetricReport::evaluate(&actual, &predicted, &options.metrics)?;

        if let Some(session) = self.session.as_mut() {
            session.alpha = Some(alpha);
        }
        self.model = Some(model);
        Ok(report)
    }

    fn finalize(&mut self) -> Result<(), ModelError> {
        let session = self.session()?;
        let alpha = session
            .alpha
            .ok_or_else(|| ModelError::Artifact("model has not been trained".to_string()))?;
        let model = self.fit_model(&session.data, &session.options, alpha)?;
        self.model = Some(model);
        Ok(())
    }

    fn save(&self, path: &Path) -> Result<(), ModelError> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| ModelError::Artifact("no model to save".to_string()))?;
        let file = File::create(path)
            .map_err(|e| ModelError::Artifact(format!("{}: {}", path.display(), e)))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, model)
            .map_err(|e| ModelError::Artifact(e.to_string()))?;
        writer
            .flush()
            .map_err(|e| ModelError::Artifact(e.to_string()))
    }

    fn load(&mut self, path: &Path) -> Result<(), ModelError> {
        let file = File::open(path)
            .map_err(|e| ModelError::Artifact(format!("{}: {}", path.display(), e)))?;
        let model: RidgeModel = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| ModelError::Artifact(e.to_string()))?;
        if model.format_version != FORMAT_VERSION {
            return Err(ModelError::Artifact(format!(
                "unsupported artifact version {}",
                model.format_version
            )));
        }
        tracing::debug!("Loaded ridge model {} (alpha = {})", model.id, model.alpha);
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, data: &Table) -> Result<Vec<f64>, ModelError> {
        self.model
            .as_ref()
            .ok_or_else(|| ModelError::Artifact("no model loaded".to_string()))?
            .predict(data)
    }
}

fn target_vector(data: &Table, target: &str) -> Result<DVector<f64>, ModelError> {
    let column = data.require_column(target)?;
    let values = column.to_f64().ok_or_else(|| ModelError::FeatureType {
        feature: target.to_string(),
        expected: "numeric".to_string(),
        actual: column.dtype().to_string(),
    })?;
    let observed: Vec<f64> = values.into_iter().flatten().collect();
    if observed.len() != data.num_rows() {
        return Err(ModelError::MissingTarget(target.to_string()));
    }
    Ok(DVector::from_vec(observed))
}

/// Solve the ridge normal equations with an unpenalized intercept
pub fn fit_ridge(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    alpha: f64,
) -> Result<RidgeMember, ModelError> {
    let (n, p) = x.shape();
    if n == 0 {
        return Err(ModelError::EmptyTraining("no rows to fit".to_string()));
    }

    let design = DMatrix::from_fn(n, p + 1, |i, j| if j == 0 { 1.0 } else { x[(i, j - 1)] });
    let design_t = design.transpose();
    let mut gram = &design_t * &design;
    for j in 1..=p {
        gram[(j, j)] += alpha;
    }
    let rhs = &design_t * y;

    let beta = match gram.clone().cholesky() {
        Some(cholesky) => cholesky.solve(&rhs),
        None => gram.lu().solve(&rhs).ok_or(ModelError::Singular)?,
    };

    if beta.iter().any(|b| !b.is_finite()) {
        return Err(ModelError::Singular);
    }

    Ok(RidgeMember {
        intercept: beta[0],
        coefficients: beta.iter().skip(1).copied().collect(),
    })
}

/// Pick the penalty with the lowest pooled k-fold RMSE
///
/// Folds come from a seeded shuffle. Ties keep the earlier candidate.
fn tune_alpha(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    alphas: &[f64],
    folds: usize,
    seed: u64,
) -> Result<f64, ModelError> {
    let first = *alphas
        .first()
        .ok_or_else(|| ModelError::EmptyTraining("no alpha candidates".to_string()))?;
    let n = x.nrows();
    let k = folds.min(n);
    if k < 2 || alphas.len() == 1 {
        return Ok(first);
    }

    let order = shuffled_indices(n, seed);
    let mut best = (first, f64::INFINITY);

    for &alpha in alphas {
        let mut actual = Vec::with_capacity(n);
        let mut predicted = Vec::with_capacity(n);

        for fold in 0..k {
            let held: Vec<usize> = order.iter().copied().skip(fold).step_by(k).collect();
            let kept: Vec<usize> = order
                .iter()
                .copied()
                .enumerate()
                .filter(|(pos, _)| pos % k != fold)
                .map(|(_, row)| row)
                .collect();

            let member = match fit_ridge(&x.select_rows(&kept), &y.select_rows(&kept), alpha) {
                Ok(member) => member,
                Err(e) => {
                    tracing::debug!("alpha = {} skipped: {}", alpha, e);
                    actual.clear();
                    break;
                }
            };
            let scores = member.predict(&x.select_rows(&held));
            actual.extend(held.iter().map(|&row| y[row]));
            predicted.extend(scores.iter().copied());
        }

        if actual.len() != n {
            continue;
        }
        let rmse = Metric::Rmse.compute(&actual, &predicted)?;
        tracing::debug!("alpha = {}: cv RMSE = {:.5}", alpha, rmse);
        if rmse < best.1 {
            best = (alpha, rmse);
        }
    }

    Ok(best.0)
}

/// Fit `estimators` members on bootstrap resamples; one member uses all rows
fn fit_ensemble(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    alpha: f64,
    estimators: usize,
    seed: u64,
) -> Result<Vec<RidgeMember>, ModelError> {
    if estimators <= 1 {
        return Ok(vec![fit_ridge(x, y, alpha)?]);
    }

    let n = x.nrows();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut members = Vec::with_capacity(estimators);
    for _ in 0..estimators {
        let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
        members.push(fit_ridge(&x.select_rows(&sample), &y.select_rows(&sample), alpha)?);
    }
    Ok(members)
}
