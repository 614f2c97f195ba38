//! contam - Contamination probability pipeline
//!
//! Command-line driver for the three batch stages: feature generation,
//! model deployment and prediction. Logging is controlled with `RUST_LOG`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use contam_core::{deploy_model, generate_features, predict_model, run, ContamConfig, RidgeBackend};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "contam")]
#[command(about = "Pairwise contamination probability pipeline", long_about = None)]
struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Workspace root for the default directory layout
    #[arg(long, global = true, conflicts_with = "config")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Build the training and prediction tables
    Features {
        /// Individual attributes (`;`-separated)
        #[arg(long)]
        individuals: Option<PathBuf>,

        /// Pairwise observations (`;`-separated)
        #[arg(long)]
        pairs: Option<PathBuf>,
    },

    /// Train, finalize and save the model
    DeployModel {
        /// Preprocessed training table
        #[arg(long)]
        train: Option<PathBuf>,
    },

    /// Score the prediction table with the saved model
    Predict {
        /// Preprocessed table to score
        #[arg(long)]
        data: Option<PathBuf>,

        /// Target column compared against in validation mode
        #[arg(long)]
        target: Option<String>,

        /// Also export metrics against the target
        #[arg(long)]
        validation: bool,
    },

    /// Run every stage in order
    Run,
}

fn load_config(cli: &Cli) -> contam_core::Result<ContamConfig> {
    match (&cli.config, &cli.root) {
        (Some(path), _) => ContamConfig::from_file(path),
        (None, Some(root)) => Ok(ContamConfig::rooted_at(root)),
        (None, None) => Ok(ContamConfig::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let paths = &config.paths;

    match cli.command {
        Commands::Features { individuals, pairs } => {
            let individuals = individuals.unwrap_or_else(|| paths.individuals.clone());
            let pairs = pairs.unwrap_or_else(|| paths.pairs.clone());
            let summary = generate_features(&config, &individuals, &pairs)?;
            tracing::info!(
                "Features generated: {} training rows, {} prediction rows",
                summary.train_rows,
                summary.predict_rows
            );
        }
        Commands::DeployModel { train } => {
            let train = train.unwrap_or_else(|| paths.train_table());
            let metrics = deploy_model(&config, RidgeBackend::from_config(&config), &train)?;
            tracing::info!("Model saved at {} {}", config.model_path().display(), metrics);
        }
        Commands::Predict {
            data,
            target,
            validation,
        } => {
            let data = data.unwrap_or_else(|| paths.predict_table());
            let target = target.unwrap_or_else(|| config.columns.target.clone());
            predict_model(
                &config,
                RidgeBackend::from_config(&config),
                &data,
                &target,
                validation,
            )?;
        }
        Commands::Run => {
            run(&config, || RidgeBackend::from_config(&config))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_features() {
        let cli = Cli::try_parse_from([
            "contam",
            "features",
            "--individuals",
            "ind.csv",
            "--pairs",
            "pairs.csv",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Commands::Features {
                individuals: Some(PathBuf::from("ind.csv")),
                pairs: Some(PathBuf::from("pairs.csv")),
            }
        );
    }

    #[test]
    fn test_parse_predict_validation() {
        let cli =
            Cli::try_parse_from(["contam", "predict", "--validation", "--config", "c.toml"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
        assert_eq!(
            cli.command,
            Commands::Predict {
                data: None,
                target: None,
                validation: true,
            }
        );
    }

    #[test]
    fn test_root_relocates_defaults() {
        let cli = Cli::try_parse_from(["contam", "--root", "/tmp/case", "run"]).unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(
            config.paths.models_dir,
            PathBuf::from("/tmp/case").join("model")
        );
        assert_eq!(cli.command, Commands::Run);
    }

    #[test]
    fn test_config_and_root_conflict() {
        let result =
            Cli::try_parse_from(["contam", "--config", "c.toml", "--root", "/tmp", "run"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_command() {
        assert!(Cli::try_parse_from(["contam", "train"]).is_err());
    }
}
