use crate::config::LineChartConfig;
use crate::data::wide::WideTable;

#[derive(Debug, Clone, PartialEq)]
pub struct LineSeries {
    pub name: String,
    /// (x, y) per period with a value; blank cells leave a gap.
    pub points: Vec<[f64; 2]>,
}

/// One line per selected category across the period columns.
#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Annotated below the axes.
    pub attribution: String,
    /// Period headers; x positions are these parsed as numbers when they all
    /// parse, otherwise their column index.
    pub periods: Vec<String>,
    pub series: Vec<LineSeries>,
}

impl LineChart {
    pub fn build(wide: &WideTable, selected: &[String], attribution: &str, config: &LineChartConfig) -> Self {
        let parsed: Option<Vec<f64>> = wide
            .periods
            .iter()
            .map(|p| p.trim().parse::<f64>().ok())
            .collect();
        let xs = parsed.unwrap_or_else(|| (0..wide.periods.len()).map(|i| i as f64).collect());

        let series = wide
            .rows
            .iter()
            .filter(|row| selected.contains(&row.label))
            .map(|row| LineSeries {
                name: row.label.clone(),
                points: xs
                    .iter()
                    .zip(&row.values)
                    .filter_map(|(x, v)| v.map(|y| [*x, y]))
                    .collect(),
            })
            .collect();

        LineChart {
            title: config.title.clone(),
            x_label: config.x_label.clone(),
            y_label: config.y_label.clone(),
            attribution: attribution.to_string(),
            periods: wide.periods.clone(),
            series,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::wide::WideRow;

    fn wide(periods: &[&str]) -> WideTable {
        WideTable {
            label_column: "type_woodland".into(),
            periods: periods.iter().map(|p| p.to_string()).collect(),
            rows: vec![
                WideRow {
                    label: "oak".into(),
                    values: vec![Some(1.0), None, Some(3.0)],
                },
                WideRow {
                    label: "pine".into(),
                    values: vec![Some(2.0), Some(2.5), Some(2.0)],
                },
            ],
        }
    }

    #[test]
    fn only_selected_rows_are_drawn_with_gaps() {
        let chart = LineChart::build(
            &wide(&["2019", "2020", "2021"]),
            &["oak".to_string()],
            "Source: NFI",
            &LineChartConfig::default(),
        );
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.series[0].points, vec![[2019.0, 1.0], [2021.0, 3.0]]);
        assert_eq!(chart.attribution, "Source: NFI");
    }

    #[test]
    fn non_numeric_periods_fall_back_to_index() {
        let chart = LineChart::build(
            &wide(&["early", "mid", "late"]),
            &["pine".to_string()],
            "",
            &LineChartConfig::default(),
        );
        assert_eq!(chart.series[0].points[1], [1.0, 2.5]);
    }
}
