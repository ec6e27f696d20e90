use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Date32Type, Float32Type, Float64Type, Int32Type, Int64Type};
use geo::Geometry;
use geojson::{FeatureReader, GeoJson};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use shapefile::dbase::FieldValue;

use super::error::DataError;
use super::model::{AttrValue, Feature, FeatureTable};
use crate::config::{ReadConfig, ReadEngine};

/// Column holding GeoJSON geometry text in CSV and Parquet tables.
pub const GEOMETRY_COLUMN: &str = "geometry";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a feature table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.geojson` / `.json` – FeatureCollection, single Feature or bare Geometry
/// * `.csv`     – attribute columns, optional `geometry` column with GeoJSON text
/// * `.parquet` – same layout as CSV, typed columns
/// * `.shp`     – ESRI Shapefile, attributes from the sibling `.dbf`
pub fn load_file(path: &Path, config: &ReadConfig) -> Result<FeatureTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "geojson" | "json" => match config.engine {
            ReadEngine::Document => load_geojson_document(path),
            ReadEngine::Streaming => load_geojson_streaming(path),
        },
        "csv" => load_csv(path),
        "parquet" | "pq" => load_parquet(path),
        "shp" => load_shapefile(path),
        other => Err(DataError::UnsupportedFormat {
            extension: other.to_string(),
        }
        .into()),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {} features with columns {:?} from {}",
        table.len(),
        table.column_names,
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// GeoJSON loader
// ---------------------------------------------------------------------------

fn load_geojson_document(path: &Path) -> Result<FeatureTable> {
    let file = File::open(path).context("opening GeoJSON file")?;
    let geojson = GeoJson::from_reader(BufReader::new(file)).context("parsing GeoJSON")?;

    let features = match geojson {
        GeoJson::FeatureCollection(fc) => fc
            .features
            .into_iter()
            .enumerate()
            .map(|(i, f)| convert_feature(f).with_context(|| format!("feature {i}")))
            .collect::<Result<Vec<_>>>()?,
        GeoJson::Feature(f) => vec![convert_feature(f)?],
        GeoJson::Geometry(g) => vec![Feature::new(Some(convert_geometry(g)?))],
    };

    Ok(FeatureTable::from_features(features))
}

fn load_geojson_streaming(path: &Path) -> Result<FeatureTable> {
    let file = File::open(path).context("opening GeoJSON file")?;
    let reader = FeatureReader::from_reader(BufReader::new(file));

    let features = reader
        .features()
        .enumerate()
        .map(|(i, f)| {
            let f = f.with_context(|| format!("parsing feature {i}"))?;
            convert_feature(f).with_context(|| format!("feature {i}"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(FeatureTable::from_features(features))
}

fn convert_feature(feature: geojson::Feature) -> Result<Feature> {
    let geometry = feature.geometry.map(convert_geometry).transpose()?;
    let attributes: BTreeMap<String, AttrValue> = feature
        .properties
        .unwrap_or_default()
        .iter()
        .map(|(key, val)| (key.clone(), AttrValue::from_json(val)))
        .collect();
    Ok(Feature {
        geometry,
        attributes,
    })
}

fn convert_geometry(geometry: geojson::Geometry) -> Result<Geometry<f64>> {
    Geometry::<f64>::try_from(geometry.value).context("converting geometry")
}

/// Parse GeoJSON geometry text as stored in a CSV or Parquet cell.
fn parse_geometry_text(s: &str) -> Result<Option<Geometry<f64>>> {
    if s.trim().is_empty() {
        return Ok(None);
    }
    let geometry: geojson::Geometry = serde_json::from_str(s).context("parsing geometry text")?;
    Ok(Some(convert_geometry(geometry)?))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names.
/// An optional `geometry` column holds GeoJSON geometry objects as text:
///   `"{""type"":""Point"",""coordinates"":[1.0,2.0]}"`
/// All other columns are attributes.
fn load_csv(path: &Path) -> Result<FeatureTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let geom_idx = headers.iter().position(|h| h == GEOMETRY_COLUMN);

    let mut features = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let geometry = match geom_idx {
            Some(idx) => parse_geometry_text(record.get(idx).unwrap_or(""))
                .with_context(|| format!("CSV row {row_no}"))?,
            None => None,
        };

        let mut attributes = BTreeMap::new();
        for (col_idx, value) in record.iter().enumerate() {
            if Some(col_idx) == geom_idx {
                continue;
            }
            attributes.insert(headers[col_idx].clone(), guess_attr_type(value));
        }

        features.push(Feature {
            geometry,
            attributes,
        });
    }

    Ok(FeatureTable::from_features(features))
}

pub(crate) fn guess_attr_type(s: &str) -> AttrValue {
    if s.is_empty() {
        return AttrValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return AttrValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return AttrValue::Float(f);
    }
    if s == "true" || s == "false" {
        return AttrValue::Bool(s == "true");
    }
    AttrValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file holding a feature table.
///
/// Expected schema:
/// - `geometry` (optional): Utf8 column of GeoJSON geometry text
/// - Any other columns are attributes (strings, ints, floats, bools, dates)
fn load_parquet(path: &Path) -> Result<FeatureTable> {
    let file = File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut features = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();
        let geom_idx = schema.index_of(GEOMETRY_COLUMN).ok();

        let attr_cols: Vec<(usize, String)> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != geom_idx)
            .map(|(i, f)| (i, f.name().clone()))
            .collect();

        for row in 0..batch.num_rows() {
            let geometry = match geom_idx {
                Some(idx) => extract_geometry(batch.column(idx), row)
                    .with_context(|| format!("Row {row}: failed to read 'geometry'"))?,
                None => None,
            };

            let mut attributes = BTreeMap::new();
            for (col_idx, col_name) in &attr_cols {
                attributes.insert(
                    col_name.clone(),
                    extract_attr_value(batch.column(*col_idx), row),
                );
            }

            features.push(Feature {
                geometry,
                attributes,
            });
        }
    }

    Ok(FeatureTable::from_features(features))
}

// -- Parquet / Arrow helpers --

fn extract_geometry(col: &Arc<dyn Array>, row: usize) -> Result<Option<Geometry<f64>>> {
    if col.is_null(row) {
        return Ok(None);
    }
    match col.data_type() {
        DataType::Utf8 => parse_geometry_text(col.as_string::<i32>().value(row)),
        DataType::LargeUtf8 => parse_geometry_text(col.as_string::<i64>().value(row)),
        other => bail!("Expected Utf8 geometry column, got {other:?}"),
    }
}

/// Extract a single attribute value from an Arrow column at a given row.
fn extract_attr_value(col: &Arc<dyn Array>, row: usize) -> AttrValue {
    if col.is_null(row) {
        return AttrValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => AttrValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => AttrValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => AttrValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => AttrValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => AttrValue::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => AttrValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => AttrValue::Bool(col.as_boolean().value(row)),
        DataType::Date32 => col
            .as_primitive::<Date32Type>()
            .value_as_date(row)
            .map(|d| AttrValue::Date(d.to_string()))
            .unwrap_or(AttrValue::Null),
        _ => AttrValue::String(format!("{:?}", col.data_type())),
    }
}

// ---------------------------------------------------------------------------
// Shapefile loader
// ---------------------------------------------------------------------------

/// Load an ESRI Shapefile; the `.dbf` next to it supplies the attributes.
fn load_shapefile(path: &Path) -> Result<FeatureTable> {
    let mut reader = shapefile::Reader::from_path(path).context("opening shapefile")?;

    let mut features = Vec::new();
    for (i, item) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = item.with_context(|| format!("reading shape {i}"))?;

        let geometry = match shape {
            shapefile::Shape::NullShape => None,
            shape => Some(
                Geometry::<f64>::try_from(shape)
                    .map_err(|e| anyhow!("converting shape {i}: {e}"))?,
            ),
        };

        let attributes: BTreeMap<String, AttrValue> = record
            .into_iter()
            .map(|(name, value)| (name, dbase_to_attr(value)))
            .collect();

        features.push(Feature {
            geometry,
            attributes,
        });
    }

    Ok(FeatureTable::from_features(features))
}

fn dbase_to_attr(value: FieldValue) -> AttrValue {
    match value {
        FieldValue::Character(Some(s)) | FieldValue::Memo(s) => {
            AttrValue::String(s.trim_end().to_string())
        }
        FieldValue::Numeric(Some(n)) => AttrValue::Float(n),
        FieldValue::Float(Some(f)) => AttrValue::Float(f as f64),
        FieldValue::Double(d) => AttrValue::Float(d),
        FieldValue::Integer(i) => AttrValue::Integer(i as i64),
        FieldValue::Logical(Some(b)) => AttrValue::Bool(b),
        FieldValue::Date(Some(d)) => {
            AttrValue::Date(format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day()))
        }
        FieldValue::Character(None)
        | FieldValue::Numeric(None)
        | FieldValue::Float(None)
        | FieldValue::Logical(None)
        | FieldValue::Date(None) => AttrValue::Null,
        other => AttrValue::String(format!("{other:?}")),
    }
}
