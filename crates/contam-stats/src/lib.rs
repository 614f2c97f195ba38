//! contam-stats - Statistical functions for the contamination pipeline
//!
//! - **Summary**: count, mean, standard deviation, median of nullable data
//! - **Metrics**: regression error metrics (MAE, MSE, RMSE, R2, RMSLE, MAPE)

pub mod metrics;
pub mod summary;

pub use metrics::*;
pub use summary::*;
