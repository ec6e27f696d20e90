//! Chart models and the selection controls that drive them.
//!
//! A chart is rebuilt from scratch inside a [`MultiSelect`] listener each
//! time the selection changes; whoever owns the UI only draws the latest
//! model found in the [`ChartSlot`].

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;

pub mod area;
pub mod line;
pub mod selection;

pub use area::{AreaChart, AreaSeries, feature_options};
pub use line::{LineChart, LineSeries};
pub use selection::MultiSelect;

use crate::config::{AreaChartConfig, LineChartConfig};
use crate::data::model::YearlyCollection;
use crate::data::wide::WideTable;

/// Latest chart model, shared between a selection listener and the renderer.
pub type ChartSlot<T> = Rc<RefCell<T>>;

/// Time-series area chart over a yearly collection: a control listing every
/// feature value (nothing selected) and the chart it keeps up to date.
pub fn area_chart_control(
    collection: Rc<YearlyCollection>,
    feature: &str,
    value: &str,
    config: AreaChartConfig,
) -> Result<(MultiSelect, ChartSlot<AreaChart>)> {
    let options = feature_options(&collection, feature)?;
    // Building once with everything selected surfaces bad value columns now
    // rather than on the first click.
    AreaChart::build(&collection, feature, value, &options, &config)?;

    let slot = Rc::new(RefCell::new(AreaChart::build(
        &collection,
        feature,
        value,
        &[],
        &config,
    )?));

    let mut select = MultiSelect::new(options);
    let sink = Rc::clone(&slot);
    let (feature, value) = (feature.to_string(), value.to_string());
    select.on_change(move |selected| {
        match AreaChart::build(&collection, &feature, &value, selected, &config) {
            Ok(chart) => *sink.borrow_mut() = chart,
            Err(e) => log::error!("Rebuilding area chart failed: {e:#}"),
        }
    });
    Ok((select, slot))
}

/// Category line chart over a wide table: a control pre-populated with every
/// category (all selected) and the chart it keeps up to date.
pub fn line_chart_control(
    wide: Rc<WideTable>,
    attribution: &str,
    config: LineChartConfig,
) -> (MultiSelect, ChartSlot<LineChart>) {
    let categories = wide.categories();
    let slot = Rc::new(RefCell::new(LineChart::build(
        &wide,
        &categories,
        attribution,
        &config,
    )));

    let mut select = MultiSelect::all_selected(categories);
    let sink = Rc::clone(&slot);
    let attribution = attribution.to_string();
    select.on_change(move |selected| {
        *sink.borrow_mut() = LineChart::build(&wide, selected, &attribution, &config);
    });
    (select, slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Feature, FeatureTable};
    use crate::data::wide::WideRow;

    #[test]
    fn area_chart_follows_selection() {
        let mut collection = YearlyCollection::new();
        collection.insert(
            2012,
            FeatureTable::from_features(vec![
                Feature::new(None).with("type", "oak").with("area", 4.0),
                Feature::new(None).with("type", "pine").with("area", 6.0),
            ]),
        );
        let config = AreaChartConfig {
            start_year: 2012,
            end_year: 2012,
            ..AreaChartConfig::default()
        };

        let (mut select, slot) =
            area_chart_control(Rc::new(collection), "type", "area", config).unwrap();
        assert_eq!(select.options(), ["oak", "pine"]);
        assert!(slot.borrow().series.is_empty());

        select.toggle("pine");
        assert_eq!(slot.borrow().total, 6.0);
        select.select_all();
        assert_eq!(slot.borrow().total, 10.0);
    }

    #[test]
    fn area_chart_rejects_text_value_column() {
        let mut collection = YearlyCollection::new();
        collection.insert(
            2012,
            FeatureTable::from_features(vec![Feature::new(None).with("type", "oak").with("name", "x")]),
        );
        let result = area_chart_control(Rc::new(collection), "type", "name", AreaChartConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn line_chart_starts_fully_selected() {
        let wide = WideTable {
            label_column: "type_woodland".into(),
            periods: vec!["2020".into()],
            rows: vec![
                WideRow { label: "oak".into(), values: vec![Some(1.0)] },
                WideRow { label: "pine".into(), values: vec![Some(2.0)] },
            ],
        };
        let (mut select, slot) = line_chart_control(Rc::new(wide), "Source", LineChartConfig::default());
        assert_eq!(slot.borrow().series.len(), 2);
        select.toggle("oak");
        assert_eq!(slot.borrow().series.len(), 1);
        assert_eq!(slot.borrow().series[0].name, "pine");
    }
}
