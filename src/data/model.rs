use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Range;

use geo::{CoordsIter, Geometry};
use serde_json::Value as JsonValue;

use super::error::DataError;

// ---------------------------------------------------------------------------
// AttrValue – a single cell in an attribute column
// ---------------------------------------------------------------------------

/// A dynamically-typed attribute value, as found in GeoJSON properties,
/// CSV cells, Parquet columns or dBase records.
/// Used as a `BTreeMap` / `BTreeSet` key downstream so `AttrValue` must be `Ord`.
#[derive(Debug, Clone)]
pub enum AttrValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date string kept as text.
    Date(String),
    Null,
}

// -- Manual Eq/Ord/Hash so we can put AttrValue in BTreeSet and HashMap --

/// Float key used by `Ord` and `Hash`: `-0.0` folds into `0.0`, every NaN
/// into one NaN.
fn float_key(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for AttrValue {}

impl PartialOrd for AttrValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AttrValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use AttrValue::*;
        fn discriminant(v: &AttrValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Date(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => float_key(*a).total_cmp(&float_key(*b)),
            (String(a), String(b)) | (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for AttrValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            AttrValue::String(s) | AttrValue::Date(s) => s.hash(state),
            AttrValue::Integer(i) => i.hash(state),
            AttrValue::Float(f) => float_key(*f).to_bits().hash(state),
            AttrValue::Bool(b) => b.hash(state),
            AttrValue::Null => {}
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::String(s) => write!(f, "{s}"),
            AttrValue::Integer(i) => write!(f, "{i}"),
            AttrValue::Float(v) => write!(f, "{v}"),
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Date(d) => write!(f, "{d}"),
            AttrValue::Null => write!(f, "<null>"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::String(s.to_string())
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Integer(i)
    }
}

impl AttrValue {
    /// Try to interpret the value as an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Float(v) => Some(*v),
            AttrValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Value to add into a sum: numbers as-is, nulls as zero.
    pub(crate) fn summand(&self, column: &str) -> Result<f64, DataError> {
        match self {
            AttrValue::Null => Ok(0.0),
            other => other.as_f64().ok_or_else(|| DataError::NotNumeric {
                column: column.to_string(),
                value: other.to_string(),
            }),
        }
    }

    pub fn from_json(val: &JsonValue) -> Self {
        match val {
            JsonValue::String(s) => AttrValue::String(s.clone()),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    AttrValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    AttrValue::Float(f)
                } else {
                    AttrValue::String(n.to_string())
                }
            }
            JsonValue::Bool(b) => AttrValue::Bool(*b),
            JsonValue::Null => AttrValue::Null,
            other => AttrValue::String(other.to_string()),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            AttrValue::String(s) | AttrValue::Date(s) => JsonValue::String(s.clone()),
            AttrValue::Integer(i) => JsonValue::from(*i),
            // Non-finite floats have no JSON representation.
            AttrValue::Float(v) => serde_json::Number::from_f64(*v)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            AttrValue::Bool(b) => JsonValue::Bool(*b),
            AttrValue::Null => JsonValue::Null,
        }
    }
}

// ---------------------------------------------------------------------------
// Feature – one row of a feature table
// ---------------------------------------------------------------------------

/// A single geospatial feature: an optional geometry plus its attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Option<Geometry<f64>>,
    /// Attribute columns: column_name → value.
    pub attributes: BTreeMap<String, AttrValue>,
}

impl Feature {
    pub fn new(geometry: Option<Geometry<f64>>) -> Self {
        Feature {
            geometry,
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with(mut self, column: &str, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(column.to_string(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&AttrValue> {
        self.attributes.get(column)
    }
}

static NULL: AttrValue = AttrValue::Null;

// ---------------------------------------------------------------------------
// FeatureTable – rows sharing one column schema
// ---------------------------------------------------------------------------

/// Rows of (geometry, attributes) with pre-computed column indices.
///
/// Every feature carries every column in `column_names`; attributes missing
/// from a source row are stored as [`AttrValue::Null`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    pub features: Vec<Feature>,
    /// Ordered list of attribute column names.
    pub column_names: Vec<String>,
    /// For each column the sorted set of unique values.
    pub unique_values: BTreeMap<String, BTreeSet<AttrValue>>,
}

impl FeatureTable {
    /// Build column indices from the loaded features, filling absent
    /// attributes with `Null`.
    pub fn from_features(features: Vec<Feature>) -> Self {
        let column_names_set: BTreeSet<String> = features
            .iter()
            .flat_map(|f| f.attributes.keys().cloned())
            .collect();
        Self::with_columns(features, column_names_set.into_iter().collect())
    }

    fn with_columns(mut features: Vec<Feature>, column_names: Vec<String>) -> Self {
        let mut unique_values: BTreeMap<String, BTreeSet<AttrValue>> = column_names
            .iter()
            .map(|c| (c.clone(), BTreeSet::new()))
            .collect();

        for feature in &mut features {
            for col in &column_names {
                let val = feature
                    .attributes
                    .entry(col.clone())
                    .or_insert(AttrValue::Null);
                if let Some(set) = unique_values.get_mut(col) {
                    set.insert(val.clone());
                }
            }
        }

        FeatureTable {
            features,
            column_names,
            unique_values,
        }
    }

    /// Row-wise concatenation; row numbering follows the input order.
    pub fn concat(tables: impl IntoIterator<Item = FeatureTable>) -> Self {
        let features: Vec<Feature> = tables.into_iter().flat_map(|t| t.features).collect();
        Self::from_features(features)
    }

    /// Copy of the rows in `range`, keeping this table's schema.
    pub fn slice(&self, range: Range<usize>) -> Self {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        Self::with_columns(self.features[start..end].to_vec(), self.column_names.clone())
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.unique_values.contains_key(column)
    }

    /// Fail with [`DataError::MissingColumn`] unless `column` exists.
    pub fn require_column(&self, column: &str) -> Result<(), DataError> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(DataError::MissingColumn {
                column: column.to_string(),
            })
        }
    }

    /// Iterate over one column's values in row order.
    pub fn column<'a>(
        &'a self,
        column: &'a str,
    ) -> Result<impl Iterator<Item = &'a AttrValue> + 'a, DataError> {
        self.require_column(column)?;
        Ok(self
            .features
            .iter()
            .map(move |f| f.attributes.get(column).unwrap_or(&NULL)))
    }

    /// Rough estimate of the table's heap footprint in bytes.
    pub fn approx_size_bytes(&self) -> usize {
        let per_row = std::mem::size_of::<Feature>();
        self.features
            .iter()
            .map(|f| {
                let attrs: usize = f
                    .attributes
                    .iter()
                    .map(|(k, v)| {
                        let text = match v {
                            AttrValue::String(s) | AttrValue::Date(s) => s.len(),
                            _ => 0,
                        };
                        k.len() + std::mem::size_of::<AttrValue>() + text
                    })
                    .sum();
                let coords = f
                    .geometry
                    .as_ref()
                    .map(|g| g.coords_count() * std::mem::size_of::<geo::Coord<f64>>())
                    .unwrap_or(0);
                per_row + attrs + coords
            })
            .sum()
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Year → feature table, iterated chronologically.
pub type YearlyCollection = BTreeMap<i32, FeatureTable>;

#[cfg(test)]
mod tests {
    use super::*;
    use geo::point;
    use std::collections::HashMap;

    #[test]
    fn signed_zero_and_nan_are_single_keys() {
        assert_eq!(AttrValue::Float(0.0), AttrValue::Float(-0.0));
        assert_eq!(AttrValue::Float(f64::NAN), AttrValue::Float(-f64::NAN));
        assert_ne!(AttrValue::Float(1.0), AttrValue::Integer(1));

        let mut sums: HashMap<AttrValue, f64> = HashMap::new();
        for key in [0.0, -0.0, f64::NAN, f64::NAN] {
            *sums.entry(AttrValue::Float(key)).or_insert(0.0) += 1.0;
        }
        assert_eq!(sums.len(), 2);
        assert_eq!(sums[&AttrValue::Float(0.0)], 2.0);
    }

    #[test]
    fn missing_attributes_become_null() {
        let table = FeatureTable::from_features(vec![
            Feature::new(None).with("type", "oak"),
            Feature::new(None).with("area", 3.0),
        ]);
        assert_eq!(table.column_names, vec!["area", "type"]);
        assert_eq!(table.features[0].get("area"), Some(&AttrValue::Null));
        assert_eq!(table.features[1].get("type"), Some(&AttrValue::Null));
        assert!(table.unique_values["type"].contains(&AttrValue::Null));
    }

    #[test]
    fn concat_keeps_order_and_unions_schema() {
        let a = FeatureTable::from_features(vec![Feature::new(None).with("id", 1i64)]);
        let b = FeatureTable::from_features(vec![
            Feature::new(None).with("id", 2i64).with("name", "b"),
        ]);
        let all = FeatureTable::concat(vec![a, b]);
        assert_eq!(all.len(), 2);
        assert_eq!(all.column_names, vec!["id", "name"]);
        assert_eq!(all.features[0].get("id"), Some(&AttrValue::Integer(1)));
        assert_eq!(all.features[0].get("name"), Some(&AttrValue::Null));
    }

    #[test]
    fn slice_keeps_schema_even_when_empty() {
        let table = FeatureTable::from_features(vec![
            Feature::new(Some(Geometry::Point(point!(x: 1.0, y: 2.0)))).with("id", 1i64),
        ]);
        let empty = table.slice(5..9);
        assert!(empty.is_empty());
        assert_eq!(empty.column_names, vec!["id"]);
    }

    #[test]
    fn column_lookup_reports_missing_columns() {
        let table = FeatureTable::from_features(vec![Feature::new(None).with("id", 1i64)]);
        assert!(table.column("id").is_ok());
        assert_eq!(
            table.column("nope").err(),
            Some(DataError::MissingColumn {
                column: "nope".into()
            })
        );
    }

    #[test]
    fn float_ordering_is_total() {
        let mut set = BTreeSet::new();
        set.insert(AttrValue::Float(2.5));
        set.insert(AttrValue::Float(-1.0));
        set.insert(AttrValue::Null);
        let ordered: Vec<_> = set.into_iter().collect();
        assert_eq!(
            ordered,
            vec![AttrValue::Null, AttrValue::Float(-1.0), AttrValue::Float(2.5)]
        );
    }
}
