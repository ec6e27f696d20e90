use std::path::Path;
use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use geo::{Geometry, Rect, coord};
use parquet::arrow::ArrowWriter;

use rusty_canopy::data::summary::{write_pivot_csv, yearly_pivot};
use rusty_canopy::data::writer::write_geojson;
use rusty_canopy::{Feature, FeatureTable, YearlyCollection};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

/// Woodland type → (parcels per year, mean parcel area in ha, yearly growth).
const WOODLAND: [(&str, usize, f64, f64); 5] = [
    ("Broadleaved", 40, 12.0, 0.020),
    ("Conifer", 35, 20.0, -0.010),
    ("Mixed mainly broadleaved", 15, 8.0, 0.015),
    ("Young trees", 20, 4.0, 0.050),
    ("Felled", 10, 6.0, 0.000),
];

/// A square parcel of `area_ha` hectares around (x, y) in metres.
fn parcel(x: f64, y: f64, area_ha: f64) -> Geometry<f64> {
    let half = (area_ha * 10_000.0).sqrt() / 2.0;
    Geometry::Polygon(
        Rect::new(coord! { x: x - half, y: y - half }, coord! { x: x + half, y: y + half })
            .to_polygon(),
    )
}

fn year_table(year: i32, rng: &mut SimpleRng) -> FeatureTable {
    let growth_years = (year - 2012) as f64;
    let mut features = Vec::new();
    let mut id: i64 = 0;

    for &(kind, count, mean_area, growth) in &WOODLAND {
        for _ in 0..count {
            let area = mean_area * rng.range(0.5, 1.5) * (1.0 + growth).powf(growth_years);
            let x = rng.range(300_000.0, 400_000.0);
            let y = rng.range(500_000.0, 600_000.0);
            features.push(
                Feature::new(Some(parcel(x, y, area)))
                    .with("id", id)
                    .with("type", kind)
                    .with("area", (area * 100.0).round() / 100.0)
                    .with("year", year as i64),
            );
            id += 1;
        }
    }
    FeatureTable::from_features(features)
}

/// Same table as Parquet, geometry stored as GeoJSON text.
fn write_parquet(table: &FeatureTable, path: &Path) {
    let geometry: Vec<Option<String>> = table
        .features
        .iter()
        .map(|f| {
            f.geometry.as_ref().and_then(|g| {
                serde_json::to_string(&geojson::Geometry::new(geojson::Value::from(g))).ok()
            })
        })
        .collect();
    let column = |name: &str| -> Vec<_> { table.features.iter().map(|f| f.get(name).cloned()).collect() };

    let ids: Vec<Option<i64>> = column("id")
        .into_iter()
        .map(|v| v.and_then(|v| v.as_f64()).map(|f| f as i64))
        .collect();
    let kinds: Vec<Option<String>> = column("type")
        .into_iter()
        .map(|v| v.map(|v| v.to_string()))
        .collect();
    let areas: Vec<Option<f64>> = column("area")
        .into_iter()
        .map(|v| v.and_then(|v| v.as_f64()))
        .collect();

    let schema = Arc::new(Schema::new(vec![
        Field::new("geometry", DataType::Utf8, true),
        Field::new("id", DataType::Int64, true),
        Field::new("type", DataType::Utf8, true),
        Field::new("area", DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(geometry)),
            Arc::new(Int64Array::from(ids)),
            Arc::new(StringArray::from(kinds)),
            Arc::new(Float64Array::from(areas)),
        ],
    )
    .expect("Failed to create RecordBatch");

    let file = std::fs::File::create(path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");
}

fn main() {
    env_logger::init();
    let mut rng = SimpleRng::new(42);

    let out_dir = Path::new("sample_data");
    std::fs::create_dir_all(out_dir).expect("Failed to create sample_data/");

    let mut collection = YearlyCollection::new();
    for year in 2012..=2022 {
        let table = year_table(year, &mut rng);
        let path = out_dir.join(format!("nfi_{year}.geojson"));
        write_geojson(&table, &path).expect("Failed to write GeoJSON");
        collection.insert(year, table);
    }

    if let Some(latest) = collection.get(&2022) {
        write_parquet(latest, &out_dir.join("nfi_2022.parquet"));
    }

    let mut pivot = yearly_pivot(&collection, "type", "area").expect("Failed to pivot");
    pivot.feature = "type_woodland".to_string();
    let wide_path = out_dir.join("woodland_wide.csv");
    write_pivot_csv(&pivot, &wide_path).expect("Failed to write wide CSV");

    println!(
        "Wrote {} yearly GeoJSON files, one Parquet copy and {} to {}",
        collection.len(),
        wide_path.display(),
        out_dir.display()
    );
}
