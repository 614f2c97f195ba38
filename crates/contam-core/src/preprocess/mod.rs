//! Feature engineering and dataset assembly
//!
//! - [`normalize`]: imputation and categorical relabelling
//! - [`features`]: age and body-mass-index bands
//! - [`roles`]: role-tagged copies of the individual table
//! - [`assemble`]: training and prediction tables
//! - [`split`]: seeded row sampling

pub mod assemble;
pub mod features;
pub mod normalize;
pub mod roles;
pub mod split;

pub use assemble::{
    assemble_prediction, assemble_training, build_datasets, preprocess_individuals, Datasets,
};
pub use features::{add_age_band, add_bmi_band, age_band, bmi_band};
pub use normalize::{fill_missing, recode_binary, recode_count, status_column, FillStrategy};
pub use roles::{split_role, suffix_categories, suffix_columns, Role};
pub use split::{shuffled_indices, train_validation_split};
