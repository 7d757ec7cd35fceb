use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::grid::Tier;

#[derive(Error, Debug)]
pub enum SeaLiceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{path}:{line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("No dataset found for the {0} tier")]
    TierNotFound(Tier),

    #[error("Failed to read raster {path}: {reason}")]
    Tiff { path: PathBuf, reason: String },

    #[error("Layer {layer} does not share the grid axes of the {tier} tier")]
    MisalignedLayer { layer: String, tier: Tier },

    #[error("Unknown farm: {0}")]
    UnknownFarm(String),

    #[error("Viewport covers {cells} cells, limit is {limit}")]
    ViewportTooLarge { cells: usize, limit: usize },

    #[error("Invalid color span [{0}, {1}]")]
    InvalidSpan(f64, f64),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SeaLiceError {
    pub(crate) fn parse(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        SeaLiceError::Parse {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SeaLiceError>;
