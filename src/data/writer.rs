use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use geojson::{Feature as GeoJsonFeature, FeatureCollection, Geometry as GeoJsonGeometry};

use super::model::{Feature, FeatureTable};

/// Write a feature table as a GeoJSON FeatureCollection, replacing any
/// existing file at `path`.
pub fn write_geojson(table: &FeatureTable, path: &Path) -> Result<()> {
    let collection = FeatureCollection {
        bbox: None,
        features: table.features.iter().map(to_geojson_feature).collect(),
        foreign_members: None,
    };

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &collection)
        .with_context(|| format!("writing GeoJSON to {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("flushing {}", path.display()))?;

    log::debug!("Wrote {} features to {}", table.len(), path.display());
    Ok(())
}

fn to_geojson_feature(feature: &Feature) -> GeoJsonFeature {
    let properties = feature
        .attributes
        .iter()
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect();

    GeoJsonFeature {
        bbox: None,
        geometry: feature
            .geometry
            .as_ref()
            .map(|g| GeoJsonGeometry::new(geojson::Value::from(g))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("woods.geojson");
        std::fs::write(&path, "not json").unwrap();

        let table = FeatureTable::from_features(vec![Feature::new(None).with("type", "oak")]);
        write_geojson(&table, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: geojson::GeoJson = text.parse().unwrap();
        assert!(matches!(parsed, geojson::GeoJson::FeatureCollection(fc) if fc.features.len() == 1));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn full_device_reports_write_failure() {
        let table = FeatureTable::from_features(vec![Feature::new(None).with("type", "oak")]);
        let err = write_geojson(&table, Path::new("/dev/full")).unwrap_err();
        assert!(format!("{err:#}").contains("/dev/full"));
    }
}
