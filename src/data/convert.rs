//! Format conversion and size-bounded splitting into GeoJSON files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::error::DataError;
use super::loader::load_file;
use super::model::FeatureTable;
use super::writer::write_geojson;
use crate::config::{ReadConfig, SplitConfig};

/// Read `input` and write it back out as GeoJSON.
///
/// Without an explicit `output`, the input's extension is replaced with
/// `.geojson`. Returns the path written.
pub fn convert_to_geojson(input: &Path, output: Option<&Path>, config: &ReadConfig) -> Result<PathBuf> {
    let table = load_file(input, config)?;
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.with_extension("geojson"));

    write_geojson(&table, &output)?;
    log::info!(
        "Converted {} ({} features) to {}",
        input.display(),
        table.len(),
        output.display()
    );
    Ok(output)
}

/// What to split: a file to load first, or a table already in memory.
#[derive(Debug, Clone, Copy)]
pub enum SplitInput<'a> {
    /// Loaded with the given read config; output goes to `<dir>/<stem>.partial/`.
    Path(&'a Path),
    /// Used as-is; output goes to the working directory. `stem` names the
    /// chunk files.
    Table { table: &'a FeatureTable, stem: &'a str },
}

/// Partition the input into chunks of at most `config.max_features`
/// features and write each as `<stem>_part<i>.geojson`, `i` counting from 0.
///
/// The output directory is created when absent; existing chunk files are
/// overwritten. Returns the written paths in chunk order.
pub fn split_to_geojson(
    input: SplitInput<'_>,
    config: &SplitConfig,
    read_config: &ReadConfig,
) -> Result<Vec<PathBuf>> {
    if config.max_features == 0 {
        return Err(DataError::InvalidChunkSize.into());
    }

    let loaded;
    let (table, stem, default_dir) = match input {
        SplitInput::Path(path) => {
            loaded = load_file(path, read_config)?;
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("output")
                .to_string();
            let parent = path.parent().unwrap_or_else(|| Path::new(""));
            let dir = parent.join(format!("{stem}.partial"));
            (&loaded, stem, dir)
        }
        SplitInput::Table { table, stem } => {
            let cwd = std::env::current_dir().context("resolving working directory")?;
            (table, stem.to_string(), cwd)
        }
    };

    let output_dir = config.output_dir.clone().unwrap_or(default_dir);
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;

    let mut written = Vec::new();
    for (i, start) in (0..table.len()).step_by(config.max_features).enumerate() {
        let chunk = table.slice(start..start + config.max_features);
        let path = output_dir.join(format!("{stem}_part{i}.geojson"));
        write_geojson(&chunk, &path)?;
        written.push(path);
    }

    log::info!(
        "Split {} features into {} files under {}",
        table.len(),
        written.len(),
        output_dir.display()
    );
    Ok(written)
}
