//! Pipeline operations
//!
//! The three batch stages and their composition. Each stage reads its
//! inputs from disk and persists its outputs, so stages can run in
//! separate processes.

use std::path::{Path, PathBuf};

use contam_io::csv_reader::{write_csv, DEFAULT_DELIMITER};
use contam_io::{ensure_directories, open_file, save_table, Table};
use contam_stats::MetricReport;
use serde::Serialize;

use crate::config::ContamConfig;
use crate::error::Result;
use crate::model::{RegressorBackend, RegressorTrainer};
use crate::preprocess::{build_datasets, Role};

/// Row counts produced by [`generate_features`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeatureSummary {
    pub individuals: usize,
    pub pairs: usize,
    pub train_rows: usize,
    pub predict_rows: usize,
}

/// Outcome of [`predict_model`]
#[derive(Debug, Clone)]
pub struct PredictionSummary {
    pub rows: usize,
    pub predictions: PathBuf,
    pub metrics: Option<MetricReport>,
}

fn read_input(path: &Path) -> Result<Table> {
    let reader = open_file(&path.to_string_lossy())?;
    let table = reader.read_table()?;
    tracing::debug!(
        "Read {} rows x {} columns from {} ({})",
        table.num_rows(),
        table.num_columns(),
        path.display(),
        reader.format_name()
    );
    Ok(table)
}

fn without_pair_keys(table: &Table) -> Result<Table> {
    let mut table = table.clone();
    table.drop_columns(&[Role::First.name(), Role::Second.name()])?;
    Ok(table)
}

/// Build and persist the training and prediction tables
pub fn generate_features(
    config: &ContamConfig,
    individuals_path: &Path,
    pairs_path: &Path,
) -> Result<FeatureSummary> {
    let paths = &config.paths;
    ensure_directories(&[&paths.processed_dir, &paths.models_dir])?;

    let individuals = read_input(individuals_path)?;
    let pairs = read_input(pairs_path)?;
    let datasets = build_datasets(&individuals, &pairs, config)?;

    tracing::info!("Saving preprocessed data to {}", paths.processed_dir.display());
    save_table(&datasets.train, &paths.train_table())?;
    save_table(&datasets.predict, &paths.predict_table())?;

    Ok(FeatureSummary {
        individuals: individuals.num_rows(),
        pairs: pairs.num_rows(),
        train_rows: datasets.train.num_rows(),
        predict_rows: datasets.predict.num_rows(),
    })
}

/// Train, finalize and save a model on the training table
///
/// Returns the holdout metrics of the training run.
pub fn deploy_model<B: RegressorBackend>(
    config: &ContamConfig,
    backend: B,
    train_path: &Path,
) -> Result<MetricReport> {
    let data = without_pair_keys(&read_input(train_path)?)?;
    ensure_directories(&[&config.paths.models_dir])?;

    tracing::info!("Starting model stage");
    let mut trainer = RegressorTrainer::new(
        backend,
        data,
        &config.columns.target,
        "Training Stage",
        config.model.session_id,
    )
    .with_metrics(config.model.metrics.clone());

    trainer.start_session()?;
    let metrics = trainer.train_model()?.clone();
    trainer.finalize_model()?;
    trainer.save_model(&config.model_path())?;

    Ok(metrics)
}

/// Score the prediction table with the saved model
///
/// Writes `prediction.csv` to the models directory. With `validation`,
/// metrics against `target` are also written to `evaluation.json`.
pub fn predict_model<B: RegressorBackend>(
    config: &ContamConfig,
    backend: B,
    predict_path: &Path,
    target: &str,
    validation: bool,
) -> Result<PredictionSummary> {
    let data = read_input(predict_path)?;
    ensure_directories(&[&config.paths.models_dir])?;

    let mut trainer = RegressorTrainer::new(
        backend,
        without_pair_keys(&data)?,
        &config.columns.target,
        "Prediction Stage",
        config.model.session_id,
    )
    .with_metrics(config.model.metrics.clone());
    trainer.load_model(&config.model_path())?;

    let prediction = trainer.predict_model(&data, validation.then_some(target))?;

    let predictions = config.paths.predictions();
    write_csv(&prediction.table, &predictions, DEFAULT_DELIMITER)?;

    if let Some(metrics) = &prediction.metrics {
        let evaluation = config.paths.evaluation();
        std::fs::write(&evaluation, serde_json::to_string_pretty(metrics)?)?;
        tracing::info!("Metrics written to {}", evaluation.display());
    }

    tracing::info!(
        "Prediction stage is done: {} rows written to {}",
        prediction.table.num_rows(),
        predictions.display()
    );

    Ok(PredictionSummary {
        rows: prediction.table.num_rows(),
        predictions,
        metrics: prediction.metrics,
    })
}

/// Run every stage with the configured paths
///
/// `make_backend` supplies a fresh backend for training and another for
/// scoring.
pub fn run<B, F>(config: &ContamConfig, make_backend: F) -> Result<PredictionSummary>
where
    B: RegressorBackend,
    F: Fn() -> B,
{
    let paths = &config.paths;
    let summary = generate_features(config, &paths.individuals, &paths.pairs)?;
    tracing::info!(
        "Generated {} training and {} prediction rows",
        summary.train_rows,
        summary.predict_rows
    );

    deploy_model(config, make_backend(), &paths.train_table())?;
    predict_model(
        config,
        make_backend(),
        &paths.predict_table(),
        &config.columns.target,
        false,
    )
}
