//! Grouped sums over one table, and across a yearly collection.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

use super::format::format_thousands;
use super::model::{AttrValue, FeatureTable, YearlyCollection};

/// Per-group sums of a value column, largest first, plus the grand total.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedSummary {
    pub groups: Vec<(AttrValue, f64)>,
    pub total: f64,
}

impl GroupedSummary {
    /// Group labels with `1,234.56`-style sums, in ranking order.
    pub fn formatted_groups(&self) -> Vec<(String, String)> {
        self.groups
            .iter()
            .map(|(k, v)| (k.to_string(), format_thousands(*v)))
            .collect()
    }

    pub fn formatted_total(&self) -> String {
        format_thousands(self.total)
    }

    /// Sum recorded for `key`, if that group exists.
    pub fn get(&self, key: &AttrValue) -> Option<f64> {
        self.groups.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }
}

/// Sum `value` per distinct `feature`, sorted descending by sum (ties by
/// group ascending), plus the total of `value` over all rows.
///
/// Null values count as zero; null group keys form their own group so the
/// group sums always add up to the total.
pub fn grouped_summary(table: &FeatureTable, feature: &str, value: &str) -> Result<GroupedSummary> {
    table.require_column(feature)?;
    table.require_column(value)?;

    let mut sums: HashMap<&AttrValue, f64> = HashMap::new();
    for (key, val) in table.column(feature)?.zip(table.column(value)?) {
        *sums.entry(key).or_insert(0.0) += val.summand(value)?;
    }

    let mut groups: Vec<(AttrValue, f64)> = sums.into_iter().map(|(k, v)| (k.clone(), v)).collect();
    groups.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    // Equal, bit for bit, to summing `groups` in ranking order.
    let total = groups.iter().map(|(_, v)| v).sum();

    Ok(GroupedSummary { groups, total })
}

/// Render the grouped summary of every year, chronologically.
pub fn render_yearly_summaries(collection: &YearlyCollection, feature: &str, value: &str) -> Result<String> {
    let mut out = String::new();
    for (year, table) in collection {
        let summary =
            grouped_summary(table, feature, value).with_context(|| format!("summarising {year}"))?;
        // Writing into a String cannot fail.
        let _ = writeln!(out, "Year: {year}");
        let _ = writeln!(out, "Sum values:");
        let formatted = summary.formatted_groups();
        let width = formatted.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (k, v) in &formatted {
            let _ = writeln!(out, "{k:<width$}  {v:>16}");
        }
        let _ = writeln!(out, "Total sum:");
        let _ = writeln!(out, "{}", summary.formatted_total());
        let _ = writeln!(out);
    }
    Ok(out)
}

/// Print [`render_yearly_summaries`] to stdout.
pub fn print_yearly_summaries(collection: &YearlyCollection, feature: &str, value: &str) -> Result<()> {
    print!("{}", render_yearly_summaries(collection, feature, value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Pivot: feature value × year
// ---------------------------------------------------------------------------

/// Sums of `value` with one row per feature value and one column per year.
#[derive(Debug, Clone, PartialEq)]
pub struct Pivot {
    /// Name of the feature column, used as the index header.
    pub feature: String,
    pub years: Vec<i32>,
    /// Rows in first-seen order; `None` where a value is absent that year.
    pub rows: Vec<(AttrValue, Vec<Option<f64>>)>,
}

pub fn yearly_pivot(collection: &YearlyCollection, feature: &str, value: &str) -> Result<Pivot> {
    let years: Vec<i32> = collection.keys().copied().collect();
    let mut rows: Vec<(AttrValue, Vec<Option<f64>>)> = Vec::new();
    let mut index: HashMap<AttrValue, usize> = HashMap::new();

    for (col, table) in collection.values().enumerate() {
        table.require_column(feature)?;
        table.require_column(value)?;
        for (key, val) in table.column(feature)?.zip(table.column(value)?) {
            let v = val.summand(value)?;
            let row = *index.entry(key.clone()).or_insert_with(|| {
                rows.push((key.clone(), vec![None; years.len()]));
                rows.len() - 1
            });
            let cell = &mut rows[row].1[col];
            *cell = Some(cell.unwrap_or(0.0) + v);
        }
    }

    Ok(Pivot {
        feature: feature.to_string(),
        years,
        rows,
    })
}

/// Write a pivot as CSV: header `feature,year1,year2,...`, blank cells for
/// missing combinations.
pub fn write_pivot_csv(pivot: &Pivot, path: &Path) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;

    let mut header = vec![pivot.feature.clone()];
    header.extend(pivot.years.iter().map(|y| y.to_string()));
    writer.write_record(&header).context("writing CSV header")?;

    for (key, cells) in &pivot.rows {
        let mut record = vec![key.to_string()];
        record.extend(cells.iter().map(|c| c.map(|v| v.to_string()).unwrap_or_default()));
        writer.write_record(&record).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;

    log::info!(
        "Wrote pivot of {} rows x {} years to {}",
        pivot.rows.len(),
        pivot.years.len(),
        path.display()
    );
    Ok(())
}

/// Build the feature × year pivot and write it to `path`.
pub fn export_yearly_pivot(collection: &YearlyCollection, path: &Path, feature: &str, value: &str) -> Result<Pivot> {
    let pivot = yearly_pivot(collection, feature, value)?;
    write_pivot_csv(&pivot, path)?;
    Ok(pivot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::error::DataError;
    use crate::data::model::Feature;

    fn cell(pivot: &Pivot, key: &str, year: i32) -> Option<f64> {
        let col = pivot.years.iter().position(|y| *y == year)?;
        let (_, cells) = pivot.rows.iter().find(|(k, _)| *k == AttrValue::from(key))?;
        cells[col]
    }

    fn table(rows: &[(&str, f64)]) -> FeatureTable {
        FeatureTable::from_features(
            rows.iter()
                .map(|(t, a)| Feature::new(None).with("type", *t).with("area", *a))
                .collect(),
        )
    }

    #[test]
    fn oak_and_pine() {
        let s = grouped_summary(&table(&[("oak", 10.0), ("oak", 5.0), ("pine", 20.0)]), "type", "area")
            .unwrap();
        assert_eq!(
            s.formatted_groups(),
            vec![
                ("pine".to_string(), "20.00".to_string()),
                ("oak".to_string(), "15.00".to_string())
            ]
        );
        assert_eq!(s.formatted_total(), "35.00");
        assert_eq!(s.get(&"oak".into()), Some(15.0));
    }

    #[test]
    fn empty_table_has_zero_total() {
        let empty = table(&[("oak", 1.0)]).slice(0..0);
        let s = grouped_summary(&empty, "type", "area").unwrap();
        assert!(s.groups.is_empty());
        assert_eq!(s.formatted_total(), "0.00");
    }

    #[test]
    fn group_sums_add_up_to_total_with_nulls() {
        let t = FeatureTable::from_features(vec![
            Feature::new(None).with("type", "oak").with("area", 1.5),
            Feature::new(None).with("area", 2.0),
            Feature::new(None).with("type", "ash"),
            Feature::new(None).with("type", "ash").with("area", 4i64),
        ]);
        let s = grouped_summary(&t, "type", "area").unwrap();
        let sum: f64 = s.groups.iter().map(|(_, v)| v).sum();
        assert_eq!(sum, s.total);
        assert_eq!(s.get(&AttrValue::Null), Some(2.0));
    }

    #[test]
    fn total_matches_group_sums_for_inexact_decimals() {
        let s = grouped_summary(&table(&[("a", 0.1), ("b", 0.2), ("c", 0.3)]), "type", "area").unwrap();
        let sum: f64 = s.groups.iter().map(|(_, v)| v).sum();
        assert_eq!(sum, s.total);
        assert_eq!(s.formatted_total(), "0.60");
    }

    #[test]
    fn ties_are_ordered_by_key() {
        let s = grouped_summary(&table(&[("pine", 1.0), ("ash", 1.0)]), "type", "area").unwrap();
        let keys: Vec<String> = s.groups.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["ash", "pine"]);
    }

    #[test]
    fn text_in_value_column_is_an_error() {
        let err = grouped_summary(&table(&[("oak", 1.0)]), "area", "type").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::NotNumeric { .. })
        ));
    }

    #[test]
    fn pivot_unions_disjoint_years() {
        let mut collection = YearlyCollection::new();
        collection.insert(2021, table(&[("pine", 3.0)]));
        collection.insert(2020, table(&[("oak", 1.0), ("oak", 2.0)]));

        let pivot = yearly_pivot(&collection, "type", "area").unwrap();
        assert_eq!(pivot.years, vec![2020, 2021]);
        assert_eq!(pivot.rows.len(), 2);
        assert_eq!(cell(&pivot, "oak", 2020), Some(3.0));
        assert_eq!(cell(&pivot, "oak", 2021), None);
        assert_eq!(cell(&pivot, "pine", 2021), Some(3.0));
    }

    #[test]
    fn yearly_report_has_headers_in_order() {
        let mut collection = YearlyCollection::new();
        collection.insert(2021, table(&[("pine", 1234.5)]));
        collection.insert(2020, table(&[("oak", 1.0)]));
        let text = render_yearly_summaries(&collection, "type", "area").unwrap();
        let first = text.find("Year: 2020").unwrap();
        let second = text.find("Year: 2021").unwrap();
        assert!(first < second);
        assert!(text.contains("1,234.50"));
    }

    #[test]
    fn missing_column_names_the_year() {
        let mut collection = YearlyCollection::new();
        collection.insert(2020, table(&[("oak", 1.0)]));
        let err = render_yearly_summaries(&collection, "species", "area").unwrap_err();
        assert!(format!("{err:#}").contains("2020"));
    }

    #[test]
    fn exported_pivot_has_blank_cells_for_missing_years() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pivot.csv");
        let mut collection = YearlyCollection::new();
        collection.insert(2020, table(&[("oak", 1.0), ("oak", 0.5)]));
        collection.insert(2021, table(&[("pine", 3.0), ("oak", 2.0)]));

        export_yearly_pivot(&collection, &path, "type", "area").unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "type,2020,2021\noak,1.5,2\npine,,3\n");
    }
}
