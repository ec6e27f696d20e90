use std::collections::BTreeSet;
use std::fmt::Write as _;

use anyhow::Result;

use crate::config::AreaChartConfig;
use crate::data::format::format_thousands;
use crate::data::model::YearlyCollection;
use crate::data::summary::grouped_summary;

/// Every distinct value of `feature` across all years, sorted.
pub fn feature_options(collection: &YearlyCollection, feature: &str) -> Result<Vec<String>> {
    let mut options = BTreeSet::new();
    for table in collection.values() {
        table.require_column(feature)?;
        options.extend(table.column(feature)?.map(|v| v.to_string()));
    }
    Ok(options.into_iter().collect())
}

/// One band of the stacked chart.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaSeries {
    pub name: String,
    /// Summed value per year.
    pub values: Vec<f64>,
    /// Top of the band below this one (zero for the first band).
    pub baseline: Vec<f64>,
}

impl AreaSeries {
    pub fn top(&self) -> Vec<f64> {
        self.values
            .iter()
            .zip(&self.baseline)
            .map(|(v, b)| v + b)
            .collect()
    }
}

/// Stacked area chart of summed values per selected feature over a year
/// range, with the final-year ranking used as legend.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaChart {
    pub title: String,
    pub y_label: String,
    pub unit: String,
    pub years: Vec<i32>,
    pub series: Vec<AreaSeries>,
    /// Final-year value per series, largest first.
    pub ranking: Vec<(String, f64)>,
    pub total: f64,
}

impl AreaChart {
    /// Build the chart for the `selected` feature values, stacked in the
    /// order given. Years absent from the collection contribute zero.
    pub fn build(
        collection: &YearlyCollection,
        feature: &str,
        value: &str,
        selected: &[String],
        config: &AreaChartConfig,
    ) -> Result<Self> {
        let years: Vec<i32> = (config.start_year..=config.end_year).collect();

        let mut per_year: Vec<Vec<f64>> = Vec::with_capacity(years.len());
        for year in &years {
            let sums = match collection.get(year) {
                Some(table) => {
                    let summary = grouped_summary(table, feature, value)?;
                    selected
                        .iter()
                        .map(|name| {
                            summary
                                .groups
                                .iter()
                                .find(|(k, _)| k.to_string() == *name)
                                .map(|(_, v)| *v)
                                .unwrap_or(0.0)
                        })
                        .collect()
                }
                None => {
                    log::warn!("No table for {year}; plotting zero");
                    vec![0.0; selected.len()]
                }
            };
            per_year.push(sums);
        }

        let mut series = Vec::with_capacity(selected.len());
        let mut running = vec![0.0; years.len()];
        for (i, name) in selected.iter().enumerate() {
            let values: Vec<f64> = per_year.iter().map(|sums| sums[i]).collect();
            let baseline = running.clone();
            for (acc, v) in running.iter_mut().zip(&values) {
                *acc += v;
            }
            series.push(AreaSeries {
                name: name.clone(),
                values,
                baseline,
            });
        }

        let mut ranking: Vec<(String, f64)> = series
            .iter()
            .map(|s| (s.name.clone(), s.values.last().copied().unwrap_or(0.0)))
            .collect();
        ranking.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let total: f64 = ranking.iter().map(|(_, v)| v).sum();

        Ok(AreaChart {
            title: config.title.clone(),
            y_label: config.y_label.clone(),
            unit: config.unit.clone(),
            years,
            series,
            ranking,
            total,
        })
    }

    pub fn final_year(&self) -> Option<i32> {
        self.years.last().copied()
    }

    /// The ranked legend shown beside the chart.
    pub fn legend_text(&self) -> String {
        let mut text = String::new();
        if let Some(year) = self.final_year() {
            let _ = writeln!(text, "Stats for {year}:");
        }
        for (name, v) in &self.ranking {
            let _ = writeln!(text, "{name}: {} {}", format_thousands(*v), self.unit);
        }
        let _ = write!(text, "\nTotal: {} {}", format_thousands(self.total), self.unit);
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Feature, FeatureTable};

    fn table(rows: &[(&str, f64)]) -> FeatureTable {
        FeatureTable::from_features(
            rows.iter()
                .map(|(t, a)| Feature::new(None).with("type", *t).with("area", *a))
                .collect(),
        )
    }

    fn collection() -> YearlyCollection {
        let mut c = YearlyCollection::new();
        c.insert(2020, table(&[("oak", 10.0), ("pine", 2.0)]));
        c.insert(2021, table(&[("oak", 12.0), ("pine", 1500.0), ("ash", 1.0)]));
        c
    }

    fn config() -> AreaChartConfig {
        AreaChartConfig {
            start_year: 2020,
            end_year: 2022,
            ..AreaChartConfig::default()
        }
    }

    #[test]
    fn options_span_all_years() {
        assert_eq!(
            feature_options(&collection(), "type").unwrap(),
            vec!["ash", "oak", "pine"]
        );
    }

    #[test]
    fn bands_stack_in_selection_order() {
        let selected = vec!["oak".to_string(), "pine".to_string()];
        let chart = AreaChart::build(&collection(), "type", "area", &selected, &config()).unwrap();

        assert_eq!(chart.years, vec![2020, 2021, 2022]);
        assert_eq!(chart.series[0].values, vec![10.0, 12.0, 0.0]);
        assert_eq!(chart.series[0].baseline, vec![0.0, 0.0, 0.0]);
        assert_eq!(chart.series[1].baseline, vec![10.0, 12.0, 0.0]);
        assert_eq!(chart.series[1].top(), vec![12.0, 1512.0, 0.0]);
    }

    #[test]
    fn legend_ranks_final_year() {
        let selected = vec!["oak".to_string(), "pine".to_string()];
        let cfg = AreaChartConfig {
            end_year: 2021,
            ..config()
        };
        let chart = AreaChart::build(&collection(), "type", "area", &selected, &cfg).unwrap();
        assert_eq!(
            chart.legend_text(),
            "Stats for 2021:\npine: 1,500.00 ha\noak: 12.00 ha\n\nTotal: 1,512.00 ha"
        );
    }

    #[test]
    fn empty_selection_gives_empty_chart() {
        let chart = AreaChart::build(&collection(), "type", "area", &[], &config()).unwrap();
        assert!(chart.series.is_empty());
        assert_eq!(chart.total, 0.0);
    }
}
