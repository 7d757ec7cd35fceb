use crate::config::egg_model::EggModelParseError;

use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    Year(i32),
    ColorSpan,
    MaxCells,
    Viewport(String),
    EggModel(EggModelParseError),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Year(year) => {
                write!(f, "production year {} is outside 2000..=2100", year)
            }
            ConfigError::ColorSpan => write!(f, "color_span must be [min, max] with min < max"),
            ConfigError::MaxCells => write!(f, "max_cells must be greater than 0"),
            ConfigError::Viewport(e) => write!(f, "Invalid viewport: {}", e),
            ConfigError::EggModel(e) => write!(f, "{}", e),
            ConfigError::Io(e) => write!(f, "I/O error: {}", e),
            ConfigError::Json(e) => write!(f, "Failed to parse JSON: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> ConfigError {
        ConfigError::Io(err)
    }
}

impl From<EggModelParseError> for ConfigError {
    fn from(err: EggModelParseError) -> ConfigError {
        ConfigError::EggModel(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> ConfigError {
        ConfigError::Json(err)
    }
}
