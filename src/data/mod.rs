/// Data layer: core types, reading, writing and summaries.
///
/// Architecture:
/// ```text
///  .geojson / .csv / .parquet / .shp
///        │
///        ▼
///   ┌──────────┐     ┌──────────┐
///   │  loader   │ ◄── │  ingest   │  glob + worker pool, yearly keys
///   └──────────┘     └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ FeatureTable  │  Vec<Feature>, column index
///   └──────────────┘
///        │
///        ├──► writer / convert   GeoJSON out, bounded chunks
///        ├──► describe           sizes, distinct values, quartiles
///        └──► summary            grouped sums, yearly pivot → CSV / wide
/// ```

pub mod convert;
pub mod describe;
pub mod error;
pub mod format;
pub mod ingest;
pub mod loader;
pub mod model;
pub mod summary;
pub mod wide;
pub mod writer;
