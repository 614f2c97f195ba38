//! contam-io - Table I/O for the contamination case study
//!
//! This crate provides the tabular plumbing the pipeline runs on:
//!
//! - **Table**: ordered, typed, nullable columns with row filtering and joins
//! - **CSV**: `;`-separated readers with type inference, and a writer
//! - **Store**: persisted intermediate tables (JSON) and output directories
//!
//! # Design
//!
//! All readers implement the `TableReader` trait and load the whole file
//! into memory. Every table transformation returns a new table; callers'
//! tables are never mutated behind their back.

pub mod csv_reader;
pub mod reader;
pub mod schema;
pub mod store;
pub mod table;

pub use reader::*;
pub use schema::*;
pub use store::*;
pub use table::*;
