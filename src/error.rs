use std::path::PathBuf;
use thiserror::Error;

/// Fatal setup failures only. Data-quality conditions (unmatched country,
/// missing year, malformed value) never reach this type; they end up as
/// membership in the partition sets instead.
#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("{}: no header row", path.display())]
    EmptySource { path: PathBuf },

    #[error("{}: field {field:?} not present in header", path.display())]
    MissingField { path: PathBuf, field: String },

    #[error("geojson: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("config: {0}")]
    Config(#[from] serde_json::Error),
}
