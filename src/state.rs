use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::Result;

use rusty_canopy::chart::{
    AreaChart, ChartSlot, LineChart, MultiSelect, area_chart_control, line_chart_control,
};
use rusty_canopy::config::CanopyConfig;
use rusty_canopy::data::convert::{SplitInput, convert_to_geojson, split_to_geojson};
use rusty_canopy::data::ingest::read_yearly;
use rusty_canopy::data::describe::print_description;
use rusty_canopy::data::summary::{GroupedSummary, export_yearly_pivot, grouped_summary, yearly_pivot};
use rusty_canopy::data::wide::WideTable;
use rusty_canopy::YearlyCollection;

use crate::color::ColorMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Stacked area chart over the yearly collection.
    Area,
    /// Line chart over a wide table.
    Line,
}

/// A multi-select control together with the chart it drives.
pub struct Interactive<T> {
    pub select: MultiSelect,
    pub chart: ChartSlot<T>,
    pub colors: ColorMap,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: CanopyConfig,
    pub view: View,

    /// Loaded yearly collection (None until the user opens files).
    pub collection: Option<Rc<YearlyCollection>>,

    /// Columns present in every year's table.
    pub columns: Vec<String>,
    pub feature_column: String,
    pub value_column: String,

    pub area: Option<Interactive<AreaChart>>,

    /// Year shown in the summary table.
    pub summary_year: Option<i32>,
    pub summary: Option<GroupedSummary>,

    pub line: Option<Interactive<LineChart>>,
    /// Category type of the wide table, i.e. its `type_<feature_type>` column.
    pub feature_type: String,
    pub attribution: String,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: CanopyConfig) -> Self {
        Self {
            feature_column: config.feature_column.clone(),
            value_column: config.value_column.clone(),
            config,
            view: View::Area,
            collection: None,
            columns: Vec::new(),
            area: None,
            summary_year: None,
            summary: None,
            line: None,
            feature_type: "woodland".to_string(),
            attribution: String::new(),
            status_message: None,
        }
    }

    fn report<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(v) => {
                self.status_message = None;
                Some(v)
            }
            Err(e) => {
                log::error!("{e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
                None
            }
        }
    }

    /// Read yearly files and make them the current collection.
    pub fn open_yearly_files(&mut self, paths: &[PathBuf]) {
        let result = read_yearly(paths, self.config.worker_count(), &self.config.read);
        if let Some(collection) = self.report(result) {
            log::info!("Loaded {} years", collection.len());
            self.set_collection(collection);
        }
    }

    /// Ingest a newly loaded collection, pick columns and build the chart.
    pub fn set_collection(&mut self, collection: YearlyCollection) {
        let mut common: Option<BTreeSet<String>> = None;
        for table in collection.values() {
            let cols: BTreeSet<String> = table.column_names.iter().cloned().collect();
            common = Some(match common {
                Some(acc) => acc.intersection(&cols).cloned().collect(),
                None => cols,
            });
        }
        self.columns = common.unwrap_or_default().into_iter().collect();

        if !self.columns.contains(&self.feature_column) {
            self.feature_column = self.columns.first().cloned().unwrap_or_default();
        }
        if !self.columns.contains(&self.value_column) {
            self.value_column = self.columns.last().cloned().unwrap_or_default();
        }

        self.summary_year = collection.keys().next_back().copied();
        self.collection = Some(Rc::new(collection));
        self.view = View::Area;
        self.rebuild_area();
    }

    /// Recreate the feature selector and chart for the current columns.
    pub fn rebuild_area(&mut self) {
        let Some(collection) = self.collection.clone() else {
            return;
        };
        let result = area_chart_control(
            collection,
            &self.feature_column,
            &self.value_column,
            self.config.area_chart.clone(),
        );
        self.area = self.report(result).map(|(select, chart)| {
            let colors = ColorMap::new(select.options());
            Interactive {
                select,
                chart,
                colors,
            }
        });
        self.refresh_summary();
    }

    pub fn set_feature_column(&mut self, col: String) {
        self.feature_column = col;
        self.rebuild_area();
    }

    /// Same feature values, different measure: the checked options survive.
    pub fn set_value_column(&mut self, col: String) {
        let previous = self.area.as_ref().map(|a| a.select.selected());
        self.value_column = col;
        self.rebuild_area();
        if let (Some(area), Some(previous)) = (&mut self.area, previous) {
            area.select.set_selection(previous.as_slice());
        }
    }

    pub fn set_summary_year(&mut self, year: i32) {
        self.summary_year = Some(year);
        self.refresh_summary();
    }

    fn refresh_summary(&mut self) {
        let table = match (&self.collection, self.summary_year) {
            (Some(c), Some(year)) => c.get(&year),
            _ => None,
        };
        let result = table
            .map(|t| grouped_summary(t, &self.feature_column, &self.value_column))
            .transpose();
        self.summary = self.report(result).flatten();
    }

    /// Print the description of the summary year's table to stdout.
    pub fn describe_summary_year(&mut self) {
        let (Some(collection), Some(year)) = (&self.collection, self.summary_year) else {
            return;
        };
        if let Some(table) = collection.get(&year) {
            let description = print_description(table);
            self.status_message = Some(format!(
                "{year}: {} rows, {:.2} MB (details on stdout)",
                description.rows, description.size_mb
            ));
        }
    }

    /// Load a wide CSV for the line chart.
    pub fn open_wide_csv(&mut self, path: &Path) {
        let result = WideTable::from_csv(path, &self.feature_type);
        if let Some(wide) = self.report(result) {
            let (select, chart) = line_chart_control(
                Rc::new(wide),
                &self.attribution,
                self.config.line_chart.clone(),
            );
            let colors = ColorMap::new(select.options());
            self.line = Some(Interactive {
                select,
                chart,
                colors,
            });
            self.view = View::Line;
        }
    }

    /// Use the current collection's pivot as the line chart's wide table.
    pub fn pivot_to_line_chart(&mut self) {
        let Some(collection) = self.collection.clone() else {
            return;
        };
        let result = yearly_pivot(&collection, &self.feature_column, &self.value_column);
        if let Some(pivot) = self.report(result) {
            let (select, chart) = line_chart_control(
                Rc::new(pivot.to_wide_table()),
                &self.attribution,
                self.config.line_chart.clone(),
            );
            let colors = ColorMap::new(select.options());
            self.line = Some(Interactive {
                select,
                chart,
                colors,
            });
            self.view = View::Line;
        }
    }

    pub fn export_pivot(&mut self, path: &Path) {
        let Some(collection) = self.collection.clone() else {
            return;
        };
        let result = export_yearly_pivot(&collection, path, &self.feature_column, &self.value_column);
        if self.report(result).is_some() {
            self.status_message = Some(format!("Pivot written to {}", path.display()));
        }
    }

    pub fn convert_file(&mut self, path: &Path) {
        let result = convert_to_geojson(path, None, &self.config.read);
        if let Some(out) = self.report(result) {
            self.status_message = Some(format!("Converted to {}", out.display()));
        }
    }

    pub fn split_file(&mut self, path: &Path) {
        let result = split_to_geojson(SplitInput::Path(path), &self.config.split, &self.config.read);
        if let Some(written) = self.report(result) {
            self.status_message = Some(format!("Wrote {} chunk files", written.len()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusty_canopy::{Feature, FeatureTable};

    fn collection() -> YearlyCollection {
        let mut collection = YearlyCollection::new();
        for year in [2012, 2013] {
            collection.insert(
                year,
                FeatureTable::from_features(vec![
                    Feature::new(None).with("type", "Conifer").with("area", 2.0).with("parcels", 1i64),
                    Feature::new(None).with("type", "Felled").with("area", 1.0).with("parcels", 3i64),
                ]),
            );
        }
        collection
    }

    #[test]
    fn changing_value_column_keeps_checked_features() {
        let mut state = AppState::new(CanopyConfig::default());
        state.set_collection(collection());
        state.area.as_mut().unwrap().select.set("Felled", true);

        state.set_value_column("parcels".to_string());

        let area = state.area.as_ref().unwrap();
        assert_eq!(area.select.selected(), vec!["Felled"]);
        let chart = area.chart.borrow();
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.series[0].values[0], 3.0);
        assert_eq!(state.summary.as_ref().unwrap().total, 4.0);
    }

    #[test]
    fn describing_without_data_is_a_no_op() {
        let mut state = AppState::new(CanopyConfig::default());
        state.describe_summary_year();
        assert_eq!(state.status_message, None);

        state.set_collection(collection());
        state.describe_summary_year();
        assert!(state.status_message.unwrap().starts_with("2013: 2 rows"));
    }
}
