//! Explicit configuration threaded through reading, splitting and charting.
//!
//! Every option has a default, so a partial `canopy.json` is enough:
//!
//! ```json
//! { "workers": 4, "read": { "engine": "streaming" }, "split": { "max_features": 5000 } }
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// How GeoJSON documents are parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadEngine {
    /// Parse the whole document into memory, then convert.
    #[default]
    Document,
    /// Convert features one by one while the `features` array is read.
    Streaming,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadConfig {
    pub engine: ReadEngine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Maximum number of features per output file.
    pub max_features: usize,
    /// Overrides the default output directory.
    pub output_dir: Option<PathBuf>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            max_features: 10_000,
            output_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaChartConfig {
    pub start_year: i32,
    pub end_year: i32,
    pub title: String,
    pub y_label: String,
    /// Unit appended to legend figures.
    pub unit: String,
}

impl Default for AreaChartConfig {
    fn default() -> Self {
        Self {
            start_year: 2012,
            end_year: 2022,
            title: "Woodland Types 2012 - 2022, NFI UK".to_string(),
            y_label: "Hectare (HA)".to_string(),
            unit: "ha".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineChartConfig {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

impl Default for LineChartConfig {
    fn default() -> Self {
        Self {
            title: "Value over time".to_string(),
            x_label: "Year".to_string(),
            y_label: "Value".to_string(),
        }
    }
}

/// Top-level configuration, loaded from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanopyConfig {
    /// Reader pool size; `None` means one worker per rayon thread.
    pub workers: Option<usize>,
    pub feature_column: String,
    pub value_column: String,
    pub read: ReadConfig,
    pub split: SplitConfig,
    pub area_chart: AreaChartConfig,
    pub line_chart: LineChartConfig,
}

impl Default for CanopyConfig {
    fn default() -> Self {
        Self {
            workers: None,
            feature_column: "type".to_string(),
            value_column: "area".to_string(),
            read: ReadConfig::default(),
            split: SplitConfig::default(),
            area_chart: AreaChartConfig::default(),
            line_chart: LineChartConfig::default(),
        }
    }
}

impl CanopyConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring configuration: {e:#}");
                Self::default()
            }
        }
    }

    /// Configured worker count, or rayon's thread count when unset. A
    /// configured 0 is passed through and rejected by the readers.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(rayon::current_num_threads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: CanopyConfig =
            serde_json::from_str(r#"{ "read": { "engine": "streaming" }, "split": { "max_features": 5 } }"#)
                .unwrap();
        assert_eq!(config.read.engine, ReadEngine::Streaming);
        assert_eq!(config.split.max_features, 5);
        assert_eq!(config.split.output_dir, None);
        assert_eq!(config.area_chart.start_year, 2012);
        assert_eq!(config.value_column, "area");
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = CanopyConfig::load_or_default(Path::new("/nonexistent/canopy.json"));
        assert_eq!(config, CanopyConfig::default());
        assert!(config.worker_count() >= 1);
    }

    #[test]
    fn zero_workers_reaches_the_reader() {
        let config: CanopyConfig = serde_json::from_str(r#"{ "workers": 0 }"#).unwrap();
        assert_eq!(config.worker_count(), 0);

        let err = crate::data::ingest::read_concurrent("*.geojson", config.worker_count(), &config.read)
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<crate::data::error::DataError>(),
            Some(&crate::data::error::DataError::InvalidWorkerCount)
        );
    }
}
