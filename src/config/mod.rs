use serde::Deserialize;
use serde::Deserializer;
use serde::de::Error;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::bbox::Viewport;
use crate::pipeline::SessionParams;
use crate::render::Colormap;

pub mod error;
pub use error::ConfigError;

pub mod egg_model;
pub use egg_model::EggModel;

pub const DEFAULT_MAX_CELLS: usize = 4096 * 4096;

#[derive(Debug, Deserialize, Clone)]
pub struct DataPaths {
    pub biomass_csv: PathBuf,
    pub lice_csv: PathBuf,
    #[serde(default)]
    pub gsid_csv: Option<PathBuf>,
    pub planned_farms: PathBuf,
    pub grid_root: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Config {
    data: DataPaths,
    excluded_layers: Vec<String>,
    max_cells: usize,
    params: SessionParams,
    viewport: Option<Viewport>,
    output_directory: PathBuf,
}

// Deserializes through a helper so that the session defaults, the color span
// and the viewport are validated before a Config exists.
impl<'de> Deserialize<'de> for Config {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ConfigHelper {
            data: DataPaths,
            #[serde(default)]
            excluded_layers: Vec<String>,
            max_cells: Option<usize>,
            #[serde(default)]
            params: ParamsHelper,
            viewport: Option<ViewportHelper>,
            output_directory: Option<PathBuf>,
        }

        #[derive(Deserialize)]
        #[serde(default)]
        struct ParamsHelper {
            year: i32,
            biomass_pct: f64,
            lice_knob: f64,
            use_reported_lice: bool,
            egg_model: String,
            color_span: [f64; 2],
            colormap: Colormap,
            include_current: bool,
            include_planned: bool,
            planned: Vec<String>,
            disabled_farms: Vec<String>,
        }

        impl Default for ParamsHelper {
            fn default() -> Self {
                let params = SessionParams::default();
                ParamsHelper {
                    year: params.year,
                    biomass_pct: params.biomass_pct,
                    lice_knob: params.lice_knob,
                    use_reported_lice: params.use_reported_lice,
                    egg_model: "stien".to_string(),
                    color_span: params.color_span,
                    colormap: params.colormap,
                    include_current: params.include_current,
                    include_planned: params.include_planned,
                    planned: params.planned,
                    disabled_farms: params.disabled_farms,
                }
            }
        }

        #[derive(Deserialize)]
        struct ViewportHelper {
            xmin: f64,
            xmax: f64,
            ymin: f64,
            ymax: f64,
            zoom: f64,
        }

        let helper = ConfigHelper::deserialize(deserializer)?;
        let p = helper.params;

        if !(2000..=2100).contains(&p.year) {
            return Err(D::Error::custom(ConfigError::Year(p.year)));
        }

        let [span_min, span_max] = p.color_span;
        if !span_min.is_finite() || !span_max.is_finite() || span_min >= span_max {
            return Err(D::Error::custom(ConfigError::ColorSpan));
        }

        let max_cells = helper.max_cells.unwrap_or(DEFAULT_MAX_CELLS);
        if max_cells == 0 {
            return Err(D::Error::custom(ConfigError::MaxCells));
        }

        let egg_model = p
            .egg_model
            .parse::<EggModel>()
            .map_err(|e| D::Error::custom(ConfigError::from(e)))?;

        let viewport = if let Some(v) = helper.viewport {
            Some(
                Viewport::new(v.xmin, v.xmax, v.ymin, v.ymax, v.zoom)
                    .map_err(|e| D::Error::custom(ConfigError::Viewport(e)))?,
            )
        } else {
            None
        };

        Ok(Config {
            data: helper.data,
            excluded_layers: helper.excluded_layers,
            max_cells,
            params: SessionParams {
                year: p.year,
                biomass_pct: p.biomass_pct,
                lice_knob: p.lice_knob,
                use_reported_lice: p.use_reported_lice,
                egg_model,
                color_span: p.color_span,
                colormap: p.colormap,
                include_current: p.include_current,
                include_planned: p.include_planned,
                planned: p.planned,
                disabled_farms: p.disabled_farms,
            },
            viewport,
            output_directory: helper
                .output_directory
                .unwrap_or_else(|| PathBuf::from("./out")),
        })
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let config: Config = serde_json::from_reader(reader).map_err(ConfigError::from)?;

        Ok(config)
    }

    pub fn data(&self) -> &DataPaths {
        &self.data
    }

    pub fn excluded_layers(&self) -> &[String] {
        &self.excluded_layers
    }

    pub fn max_cells(&self) -> usize {
        self.max_cells
    }

    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_config(body: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("config.json");
        let mut file = File::create(&file_path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        (dir, file_path)
    }

    #[test]
    fn test_from_file() {
        let (_dir, path) = write_config(
            r#"
    {
        "data": {
            "biomass_csv": "data/biomasses.csv",
            "lice_csv": "data/lice.csv",
            "planned_farms": "data/future_farms.txt",
            "grid_root": "data/grids"
        },
        "excluded_layers": ["North Kilbrannan"],
        "params": {
            "year": 2019,
            "lice_knob": 1.5,
            "egg_model": "Rittenhouse",
            "colormap": "bmy"
        },
        "viewport": {
            "xmin": -1100000, "xmax": -500000,
            "ymin": 7400000, "ymax": 8000000,
            "zoom": 6.5
        }
    }
    "#,
        );

        let config = Config::from_file(path).unwrap();

        assert_eq!(config.params().year, 2019);
        assert_eq!(config.params().lice_knob, 1.5);
        assert_eq!(config.params().biomass_pct, 100.0);
        assert_eq!(config.params().egg_model, EggModel::Rittenhouse);
        assert_eq!(config.params().colormap, Colormap::Bmy);
        assert_eq!(config.excluded_layers(), ["North Kilbrannan".to_string()]);
        assert_eq!(config.max_cells(), DEFAULT_MAX_CELLS);
        assert_eq!(config.viewport().unwrap().zoom, 6.5);
        assert!(config.data().gsid_csv.is_none());
    }

    #[test]
    fn test_rejects_inverted_color_span() {
        let (_dir, path) = write_config(
            r#"
    {
        "data": {
            "biomass_csv": "a.csv", "lice_csv": "b.csv",
            "planned_farms": "c.txt", "grid_root": "grids"
        },
        "params": { "color_span": [2.0, 0.0] }
    }
    "#,
        );

        let err = Config::from_file(path).unwrap_err();
        assert!(err.to_string().contains("color_span"), "{err}");
    }

    #[test]
    fn test_rejects_unknown_egg_model() {
        let (_dir, path) = write_config(
            r#"
    {
        "data": {
            "biomass_csv": "a.csv", "lice_csv": "b.csv",
            "planned_farms": "c.txt", "grid_root": "grids"
        },
        "params": { "egg_model": "frog" }
    }
    "#,
        );

        assert!(Config::from_file(path).is_err());
    }

    #[test]
    fn test_rejects_year_out_of_range() {
        let (_dir, path) = write_config(
            r#"
    {
        "data": {
            "biomass_csv": "a.csv", "lice_csv": "b.csv",
            "planned_farms": "c.txt", "grid_root": "grids"
        },
        "params": { "year": 1890 }
    }
    "#,
        );

        let err = Config::from_file(path).unwrap_err();
        assert!(err.to_string().contains("1890"), "{err}");
    }
}
