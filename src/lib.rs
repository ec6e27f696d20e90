//! rusty-canopy: helpers for yearly geospatial feature tables.
//!
//! - [`data::ingest`]: read many files in parallel into one table, or into a
//!   year-keyed collection
//! - [`data::convert`]: convert a file to GeoJSON, split a table into bounded
//!   GeoJSON chunks
//! - [`data::describe`] / [`data::summary`]: descriptive statistics, grouped
//!   sums, cross-year pivots exported as CSV
//! - [`chart`]: stacked area and line chart models driven by multi-select
//!   controls
//!
//! ```rust,no_run
//! use rusty_canopy::config::ReadConfig;
//! use rusty_canopy::data::{ingest, summary};
//!
//! let years = ingest::read_yearly_pattern("data/nfi_*.geojson", 4, &ReadConfig::default())?;
//! summary::print_yearly_summaries(&years, "type", "area")?;
//! summary::export_yearly_pivot(&years, "pivot.csv".as_ref(), "type", "area")?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod chart;
pub mod config;
pub mod data;

pub use config::{CanopyConfig, ReadConfig, ReadEngine, SplitConfig};
pub use data::error::DataError;
pub use data::model::{AttrValue, Feature, FeatureTable, YearlyCollection};
