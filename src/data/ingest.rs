//! Parallel ingestion: many files in, one table (or one yearly collection) out.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use super::error::DataError;
use super::loader::load_file;
use super::model::{FeatureTable, YearlyCollection};
use crate::config::ReadConfig;

/// Expand a glob pattern into the matching file paths, in discovery order.
pub fn discover(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern)
        .with_context(|| format!("invalid file pattern '{pattern}'"))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("listing files for '{pattern}'"))?;

    if paths.is_empty() {
        return Err(DataError::NoMatches {
            pattern: pattern.to_string(),
        }
        .into());
    }
    Ok(paths)
}

/// Read every file in `paths` on a pool of `workers` threads.
///
/// The pool lives for this call only. Results keep the order of `paths`;
/// the first failing file aborts the whole batch.
pub fn read_all(paths: &[PathBuf], workers: usize, config: &ReadConfig) -> Result<Vec<FeatureTable>> {
    if workers == 0 {
        return Err(DataError::InvalidWorkerCount.into());
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .context("building reader pool")?;

    log::info!("Reading {} files with {} workers", paths.len(), workers);
    pool.install(|| {
        paths
            .par_iter()
            .map(|path| load_file(path, config))
            .collect::<Result<Vec<_>>>()
    })
}

/// Read all files matching `pattern` concurrently and concatenate them
/// row-wise into one table.
pub fn read_concurrent(pattern: &str, workers: usize, config: &ReadConfig) -> Result<FeatureTable> {
    if workers == 0 {
        return Err(DataError::InvalidWorkerCount.into());
    }
    let paths = discover(pattern)?;
    let tables = read_all(&paths, workers, config)?;
    let table = FeatureTable::concat(tables);
    log::info!("Concatenated {} features from {} files", table.len(), paths.len());
    Ok(table)
}

/// First run of exactly four ASCII digits in the file stem.
pub fn year_from_path(path: &Path) -> Option<i32> {
    let stem = path.file_stem()?.to_str()?;
    let bytes = stem.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i - start == 4 {
                return stem[start..i].parse().ok();
            }
        } else {
            i += 1;
        }
    }
    None
}

/// Read one table per file and key each by the year in its file name.
/// Two files with the same year are concatenated.
pub fn read_yearly(paths: &[PathBuf], workers: usize, config: &ReadConfig) -> Result<YearlyCollection> {
    let years = paths
        .iter()
        .map(|p| year_from_path(p).ok_or_else(|| DataError::MissingYear { path: p.clone() }))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let tables = read_all(paths, workers, config)?;

    let mut collection = YearlyCollection::new();
    for (year, table) in years.into_iter().zip(tables) {
        let merged = match collection.remove(&year) {
            Some(existing) => FeatureTable::concat([existing, table]),
            None => table,
        };
        collection.insert(year, merged);
    }
    Ok(collection)
}

/// [`read_yearly`] over the files matching `pattern`.
pub fn read_yearly_pattern(pattern: &str, workers: usize, config: &ReadConfig) -> Result<YearlyCollection> {
    let paths = discover(pattern)?;
    read_yearly(&paths, workers, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Feature;
    use crate::data::writer::write_geojson;

    fn year_file(dir: &Path, name: &str, rows: &[(&str, f64)]) -> PathBuf {
        let table = FeatureTable::from_features(
            rows.iter()
                .map(|(kind, area)| Feature::new(None).with("type", *kind).with("area", *area))
                .collect(),
        );
        let path = dir.join(name);
        write_geojson(&table, &path).unwrap();
        path
    }

    #[test]
    fn concurrent_read_matches_sequential_reads() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![
            year_file(dir.path(), "a_2012.geojson", &[("Conifer", 1.5), ("Felled", 2.5)]),
            year_file(dir.path(), "b_2013.geojson", &[("Conifer", 3.5)]),
            year_file(dir.path(), "c_2014.geojson", &[("Broadleaved", 4.5), ("Conifer", 0.5)]),
        ];
        let pattern = format!("{}/*.geojson", dir.path().display());

        let sequential =
            FeatureTable::concat(paths.iter().map(|p| load_file(p, &ReadConfig::default()).unwrap()));
        for workers in [1, 2, 8] {
            let combined = read_concurrent(&pattern, workers, &ReadConfig::default()).unwrap();
            assert_eq!(combined.len(), 5);
            assert_eq!(combined.column_names, sequential.column_names);
            assert_eq!(combined, sequential);
        }
    }

    #[test]
    fn streaming_engine_reads_the_same_rows() {
        let dir = tempfile::tempdir().unwrap();
        year_file(dir.path(), "woods.geojson", &[("Conifer", 1.5), ("Felled", 2.5)]);
        let pattern = format!("{}/*.geojson", dir.path().display());

        let document = read_concurrent(&pattern, 1, &ReadConfig::default()).unwrap();
        let streaming = read_concurrent(
            &pattern,
            1,
            &ReadConfig {
                engine: crate::config::ReadEngine::Streaming,
            },
        )
        .unwrap();
        assert_eq!(document, streaming);
    }

    #[test]
    fn yearly_files_are_keyed_by_year() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![
            year_file(dir.path(), "nfi_2014.geojson", &[("Conifer", 1.0)]),
            year_file(dir.path(), "nfi_2012.geojson", &[("Conifer", 2.0), ("Felled", 3.0)]),
        ];

        let collection = read_yearly(&paths, 2, &ReadConfig::default()).unwrap();
        assert_eq!(collection.keys().copied().collect::<Vec<_>>(), vec![2012, 2014]);
        assert_eq!(collection[&2012].len(), 2);
        assert_eq!(collection[&2014].len(), 1);

        let pattern = format!("{}/nfi_*.geojson", dir.path().display());
        let by_pattern = read_yearly_pattern(&pattern, 1, &ReadConfig::default()).unwrap();
        assert_eq!(by_pattern, collection);
    }

    #[test]
    fn years_are_taken_from_four_digit_runs() {
        assert_eq!(year_from_path(Path::new("data/nfi_2015.geojson")), Some(2015));
        assert_eq!(year_from_path(Path::new("v12_2020_final.shp")), Some(2020));
        assert_eq!(year_from_path(Path::new("20201.csv")), None);
        assert_eq!(year_from_path(Path::new("woods.geojson")), None);
    }

    #[test]
    fn zero_workers_is_a_usage_error() {
        let err = read_concurrent("*.geojson", 0, &ReadConfig::default()).unwrap_err();
        assert_eq!(err.downcast_ref::<DataError>(), Some(&DataError::InvalidWorkerCount));
    }

    #[test]
    fn empty_match_fails_clearly() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = format!("{}/*.geojson", dir.path().display());
        let err = read_concurrent(&pattern, 2, &ReadConfig::default()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DataError>(),
            Some(&DataError::NoMatches { pattern })
        );
    }

    #[test]
    fn file_without_year_is_rejected_before_reading() {
        let paths = vec![PathBuf::from("woods.geojson")];
        let err = read_yearly(&paths, 1, &ReadConfig::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::MissingYear { .. })
        ));
    }
}
