use std::path::Path;

use anyhow::{Context, Result};

use super::error::DataError;
use super::summary::Pivot;

/// One row per category, one numeric column per year.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    /// Header of the category column, e.g. `type_woodland`.
    pub label_column: String,
    /// Remaining column headers, in file order.
    pub periods: Vec<String>,
    pub rows: Vec<WideRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    pub label: String,
    pub values: Vec<Option<f64>>,
}

impl WideTable {
    /// Name of the category column for a feature type.
    pub fn label_column_for(feature_type: &str) -> String {
        format!("type_{feature_type}")
    }

    /// Read a CSV whose `type_<feature_type>` column labels the rows; every
    /// other column is a period. Blank or non-numeric cells become `None`.
    pub fn from_csv(path: &Path, feature_type: &str) -> Result<Self> {
        let label_column = Self::label_column_for(feature_type);
        Self::from_csv_with_label(path, &label_column)
    }

    pub fn from_csv_with_label(path: &Path, label_column: &str) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("opening CSV {}", path.display()))?;
        let headers: Vec<String> = reader
            .headers()
            .context("reading CSV headers")?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let label_idx = headers
            .iter()
            .position(|h| h == label_column)
            .ok_or_else(|| DataError::MissingColumn {
                column: label_column.to_string(),
            })?;

        let periods = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != label_idx)
            .map(|(_, h)| h.clone())
            .collect();

        let mut rows = Vec::new();
        for (row_no, result) in reader.records().enumerate() {
            let record = result.with_context(|| format!("CSV row {row_no}"))?;
            let label = record.get(label_idx).unwrap_or("").to_string();
            let values = record
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != label_idx)
                .map(|(_, cell)| cell.trim().parse::<f64>().ok())
                .collect();
            rows.push(WideRow { label, values });
        }

        log::info!("Loaded {} categories from {}", rows.len(), path.display());
        Ok(WideTable {
            label_column: label_column.to_string(),
            periods,
            rows,
        })
    }

    /// Distinct category labels in row order.
    pub fn categories(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for row in &self.rows {
            if !seen.contains(&row.label) {
                seen.push(row.label.clone());
            }
        }
        seen
    }
}

impl Pivot {
    /// View a pivot as a wide table labelled by the feature column.
    pub fn to_wide_table(&self) -> WideTable {
        WideTable {
            label_column: self.feature.clone(),
            periods: self.years.iter().map(|y| y.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|(key, cells)| WideRow {
                    label: key.to_string(),
                    values: cells.clone(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn label_column_can_sit_anywhere() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"2019,type_woodland,2020\n1.5,oak,\n2,pine,4\n").unwrap();

        let wide = WideTable::from_csv(&path, "woodland").unwrap();
        assert_eq!(wide.periods, vec!["2019", "2020"]);
        assert_eq!(wide.categories(), vec!["oak", "pine"]);
        assert_eq!(wide.rows[0].values, vec![Some(1.5), None]);
        assert_eq!(wide.rows[1].values, vec![Some(2.0), Some(4.0)]);
    }

    #[test]
    fn missing_label_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.csv");
        std::fs::write(&path, "type,2020\noak,1\n").unwrap();
        let err = WideTable::from_csv(&path, "woodland").unwrap_err();
        assert_eq!(
            err.downcast_ref::<DataError>(),
            Some(&DataError::MissingColumn {
                column: "type_woodland".into()
            })
        );
    }
}
