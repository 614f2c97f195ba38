//! End-to-end pipeline tests

mod common;

use common::fixtures::workspace;
use contam_core::{
    deploy_model, generate_features, predict_model, run, ContamError, ModelError, RidgeBackend,
    LABEL_COLUMN,
};
use contam_io::csv_reader::CsvReader;
use contam_io::{load_table, TableReader};
use contam_stats::Metric;
use tempfile::TempDir;

#[test]
fn test_generate_features() {
    let dir = TempDir::new().unwrap();
    let config = workspace(dir.path());
    let paths = &config.paths;

    let summary = generate_features(&config, &paths.individuals, &paths.pairs).unwrap();
    assert_eq!(summary.individuals, 10);
    assert_eq!(summary.pairs, 20);
    assert!(summary.train_rows <= 15);
    assert_eq!(summary.train_rows, 13);
    assert_eq!(summary.predict_rows, 5);

    assert!(paths.models_dir.is_dir());
    let train = load_table(&paths.train_table()).unwrap();
    let predict = load_table(&paths.predict_table()).unwrap();
    assert_eq!(train.num_rows(), 13);
    assert_eq!(predict.num_rows(), 5);
}

#[test]
fn test_generate_features_twice() {
    let dir = TempDir::new().unwrap();
    let config = workspace(dir.path());
    let paths = &config.paths;

    let first = generate_features(&config, &paths.individuals, &paths.pairs).unwrap();
    let second = generate_features(&config, &paths.individuals, &paths.pairs).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_missing_input() {
    let dir = TempDir::new().unwrap();
    let config = workspace(dir.path());
    let missing = dir.path().join("absent.csv");

    let result = generate_features(&config, &missing, &config.paths.pairs);
    assert!(matches!(result, Err(ContamError::Io(_))));
}

#[test]
fn test_deploy_then_predict() {
    let dir = TempDir::new().unwrap();
    let config = workspace(dir.path());
    let paths = &config.paths;
    generate_features(&config, &paths.individuals, &paths.pairs).unwrap();

    let metrics = deploy_model(
        &config,
        RidgeBackend::from_config(&config),
        &paths.train_table(),
    )
    .unwrap();
    assert_eq!(metrics.len(), Metric::ALL.len());
    assert!(config.model_path().is_file());

    let summary = predict_model(
        &config,
        RidgeBackend::from_config(&config),
        &paths.predict_table(),
        &config.columns.target,
        false,
    )
    .unwrap();
    assert_eq!(summary.rows, 5);
    assert!(summary.metrics.is_none());
    assert!(!paths.evaluation().exists());

    let written = CsvReader::open(&summary.predictions.to_string_lossy())
        .unwrap()
        .read_table()
        .unwrap();
    assert_eq!(written.num_rows(), 5);
    let labels = written.column(LABEL_COLUMN).unwrap();
    assert_eq!(labels.null_count(), 0);
    assert!(labels.to_f64().is_some());
}

#[test]
fn test_validation_writes_metrics() {
    let dir = TempDir::new().unwrap();
    let config = workspace(dir.path());
    let paths = &config.paths;
    generate_features(&config, &paths.individuals, &paths.pairs).unwrap();
    deploy_model(
        &config,
        RidgeBackend::from_config(&config),
        &paths.train_table(),
    )
    .unwrap();

    let summary = predict_model(
        &config,
        RidgeBackend::from_config(&config),
        &paths.train_table(),
        &config.columns.target,
        true,
    )
    .unwrap();
    assert_eq!(summary.rows, 13);
    assert_eq!(summary.metrics.unwrap().len(), 6);

    let content = std::fs::read_to_string(paths.evaluation()).unwrap();
    let evaluation: serde_json::Value = serde_json::from_str(&content).unwrap();
    for name in ["MAE", "MSE", "RMSE", "R2", "RMSLE", "MAPE"] {
        assert!(evaluation[name].is_number(), "{} is not a number", name);
    }
}

#[test]
fn test_validation_needs_observed_targets() {
    let dir = TempDir::new().unwrap();
    let config = workspace(dir.path());
    let paths = &config.paths;
    generate_features(&config, &paths.individuals, &paths.pairs).unwrap();
    deploy_model(
        &config,
        RidgeBackend::from_config(&config),
        &paths.train_table(),
    )
    .unwrap();

    let result = predict_model(
        &config,
        RidgeBackend::from_config(&config),
        &paths.predict_table(),
        &config.columns.target,
        true,
    );
    assert!(matches!(
        result,
        Err(ContamError::Model(ModelError::MissingTarget(_)))
    ));
}

#[test]
fn test_predict_without_model() {
    let dir = TempDir::new().unwrap();
    let config = workspace(dir.path());
    let paths = &config.paths;
    generate_features(&config, &paths.individuals, &paths.pairs).unwrap();

    let result = predict_model(
        &config,
        RidgeBackend::from_config(&config),
        &paths.predict_table(),
        &config.columns.target,
        false,
    );
    assert!(matches!(
        result,
        Err(ContamError::Model(ModelError::Artifact(_)))
    ));
}

#[test]
fn test_run() {
    let dir = TempDir::new().unwrap();
    let config = workspace(dir.path());

    let summary = run(&config, || RidgeBackend::from_config(&config)).unwrap();
    assert_eq!(summary.rows, 5);
    assert_eq!(summary.predictions, config.paths.predictions());
    assert!(config.paths.predictions().is_file());
}
