use std::collections::BTreeMap;
use std::fmt;

use geo::{BoundingRect, Geometry, Rect, coord};

use super::model::{AttrValue, FeatureTable};

/// Columns with fewer distinct values than this get them listed.
pub const DISTINCT_THRESHOLD: usize = 50;

/// Descriptive statistics for one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericStats {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; NaN below two values.
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Diagnostic overview of a feature table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDescription {
    pub rows: usize,
    pub size_mb: f64,
    pub geometry_types: BTreeMap<&'static str, usize>,
    pub bounds: Option<Rect<f64>>,
    /// Columns with fewer than [`DISTINCT_THRESHOLD`] distinct values.
    pub distinct_values: Vec<(String, Vec<AttrValue>)>,
    pub numeric: Vec<NumericStats>,
}

pub fn describe(table: &FeatureTable) -> TableDescription {
    let mut geometry_types = BTreeMap::new();
    let mut bounds: Option<Rect<f64>> = None;
    for geometry in table.features.iter().filter_map(|f| f.geometry.as_ref()) {
        *geometry_types.entry(geometry_type_name(geometry)).or_insert(0) += 1;
        if let Some(rect) = geometry.bounding_rect() {
            bounds = Some(match bounds {
                Some(acc) => merge_rects(acc, rect),
                None => rect,
            });
        }
    }

    let distinct_values = table
        .column_names
        .iter()
        .filter_map(|col| {
            let values = table.unique_values.get(col)?;
            (values.len() < DISTINCT_THRESHOLD)
                .then(|| (col.clone(), values.iter().cloned().collect()))
        })
        .collect();

    let numeric = table
        .column_names
        .iter()
        .filter_map(|col| numeric_stats(table, col))
        .collect();

    TableDescription {
        rows: table.len(),
        size_mb: table.approx_size_bytes() as f64 / 1024.0 / 1024.0,
        geometry_types,
        bounds,
        distinct_values,
        numeric,
    }
}

/// Print [`describe`] to stdout and hand the description back.
pub fn print_description(table: &FeatureTable) -> TableDescription {
    let description = describe(table);
    println!("{description}");
    description
}

fn geometry_type_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

fn merge_rects(a: Rect<f64>, b: Rect<f64>) -> Rect<f64> {
    Rect::new(
        coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
        coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
    )
}

/// Stats for a column whose non-null values are all numbers; `None` for
/// text columns and columns that are entirely null.
fn numeric_stats(table: &FeatureTable, column: &str) -> Option<NumericStats> {
    let mut values = Vec::new();
    for value in table.column(column).ok()? {
        match value {
            AttrValue::Null => {}
            other => values.push(other.as_f64()?),
        }
    }
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);

    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        var.sqrt()
    } else {
        f64::NAN
    };

    Some(NumericStats {
        column: column.to_string(),
        count,
        mean,
        std,
        min: values[0],
        q25: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q75: quantile(&values, 0.75),
        max: values[count - 1],
    })
}

/// Linear interpolation between closest ranks over sorted input.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

impl fmt::Display for TableDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Size: {:.4} MB", self.size_mb)?;
        writeln!(f, "Rows: {}", self.rows)?;
        if !self.geometry_types.is_empty() {
            let kinds: Vec<String> = self
                .geometry_types
                .iter()
                .map(|(k, n)| format!("{k} ({n})"))
                .collect();
            writeln!(f, "Geometries: {}", kinds.join(", "))?;
        }
        if let Some(b) = &self.bounds {
            writeln!(
                f,
                "Bounds: ({:.4}, {:.4}) to ({:.4}, {:.4})",
                b.min().x,
                b.min().y,
                b.max().x,
                b.max().y
            )?;
        }
        for (column, values) in &self.distinct_values {
            let shown: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            writeln!(f, "{column}:")?;
            writeln!(f, "[{}]", shown.join(", "))?;
        }
        if !self.numeric.is_empty() {
            write!(f, "{:>8}", "")?;
            for s in &self.numeric {
                write!(f, " {:>14}", s.column)?;
            }
            writeln!(f)?;
            let rows: [(&str, fn(&NumericStats) -> f64); 8] = [
                ("count", |s| s.count as f64),
                ("mean", |s| s.mean),
                ("std", |s| s.std),
                ("min", |s| s.min),
                ("25%", |s| s.q25),
                ("50%", |s| s.median),
                ("75%", |s| s.q75),
                ("max", |s| s.max),
            ];
            for (label, get) in rows {
                write!(f, "{label:>8}")?;
                for s in &self.numeric {
                    write!(f, " {:>14.6}", get(s))?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Feature;
    use geo::point;

    fn woods() -> FeatureTable {
        FeatureTable::from_features(vec![
            Feature::new(Some(Geometry::Point(point!(x: 0.0, y: 1.0))))
                .with("type", "oak")
                .with("area", 10.0),
            Feature::new(Some(Geometry::Point(point!(x: 4.0, y: -2.0))))
                .with("type", "oak")
                .with("area", 5.0),
            Feature::new(None).with("type", "pine").with("area", 20.0),
            Feature::new(None).with("type", "pine"),
        ])
    }

    #[test]
    fn numeric_columns_get_quartiles() {
        let d = describe(&woods());
        assert_eq!(d.numeric.len(), 1);
        let area = &d.numeric[0];
        assert_eq!(area.column, "area");
        assert_eq!(area.count, 3);
        assert!((area.mean - 35.0 / 3.0).abs() < 1e-9);
        assert_eq!(area.min, 5.0);
        assert_eq!(area.q25, 7.5);
        assert_eq!(area.median, 10.0);
        assert_eq!(area.q75, 15.0);
        assert_eq!(area.max, 20.0);
    }

    #[test]
    fn low_cardinality_columns_are_listed() {
        let d = describe(&woods());
        let listed: Vec<&str> = d.distinct_values.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(listed, vec!["area", "type"]);
        assert_eq!(d.geometry_types.get("Point"), Some(&2));
        let b = d.bounds.unwrap();
        assert_eq!((b.min().x, b.min().y, b.max().x, b.max().y), (0.0, -2.0, 4.0, 1.0));
    }

    #[test]
    fn high_cardinality_columns_are_skipped() {
        let table = FeatureTable::from_features(
            (0..60).map(|i| Feature::new(None).with("id", i as i64)).collect(),
        );
        let d = describe(&table);
        assert!(d.distinct_values.is_empty());
        assert_eq!(d.numeric[0].count, 60);
        assert!(d.to_string().contains("count"));
    }
}
