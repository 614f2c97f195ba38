//! Test fixture loading utilities

use std::path::{Path, PathBuf};

use contam_core::ContamConfig;
use contam_io::csv_reader::{parse_str, DEFAULT_DELIMITER};
use contam_io::Table;

/// Get the path to a fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_fixtures")
        .join(name)
}

/// Load a fixture file as a string
pub fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name))
        .unwrap_or_else(|_| panic!("Failed to load fixture: {}", name))
}

/// Ten individuals with gaps in every imputed column
#[allow(dead_code)]
pub fn individuals() -> Table {
    parse_str(&load_fixture("individuos.csv"), DEFAULT_DELIMITER).unwrap()
}

/// Twenty pairs: 15 labelled (two with unknown individuals), 5 unlabelled
#[allow(dead_code)]
pub fn pairs() -> Table {
    parse_str(&load_fixture("conexoes.csv"), DEFAULT_DELIMITER).unwrap()
}

/// Default configuration rooted at `root`, with the fixtures copied to
/// the configured input locations
#[allow(dead_code)]
pub fn workspace(root: &Path) -> ContamConfig {
    let config = ContamConfig::rooted_at(root);
    let raw = config.paths.individuals.parent().unwrap();
    std::fs::create_dir_all(raw).unwrap();
    std::fs::copy(fixture_path("individuos.csv"), &config.paths.individuals).unwrap();
    std::fs::copy(fixture_path("conexoes.csv"), &config.paths.pairs).unwrap();
    config
}
