use serde::Serialize;
use std::path::Path;

use crate::error::{Result, SeaLiceError};
use crate::registry::table::TextTable;

const PLANNED_COLUMNS: usize = 5;

/// A proposed site. It has a declared peak biomass but no history, so it is
/// never scaled by the biomass resolver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedFarm {
    pub code: String,
    pub name: String,
    pub biomass_tonnes: f64,
    pub lat: f64,
    pub lon: f64,
}

/// Reads the tab-delimited `code, name, biomass, lat, lon` table.
pub fn read_planned_farms<P: AsRef<Path>>(path: P) -> Result<Vec<PlannedFarm>> {
    let path = path.as_ref();
    let table = TextTable::read(path, b'\t')?;
    if table.height() > 0 && table.width() < PLANNED_COLUMNS {
        return Err(SeaLiceError::parse(
            path,
            1,
            format!("expected {} tab-separated columns, found {}", PLANNED_COLUMNS, table.width()),
        ));
    }

    let mut farms = Vec::new();
    for row in 1..table.height() {
        if table.is_blank(row) {
            continue;
        }
        let line_no = TextTable::line(row);
        let field = |col: usize, what: &str| {
            table
                .cell(row, col)
                .ok_or_else(|| SeaLiceError::parse(path, line_no, format!("missing {}", what)))
        };
        let number = |col: usize, what: &str| {
            let raw = field(col, what)?;
            raw.parse::<f64>()
                .map_err(|e| SeaLiceError::parse(path, line_no, format!("invalid {} '{}': {}", what, raw, e)))
        };

        let biomass = field(2, "biomass")?;
        let biomass_tonnes = biomass
            .parse::<i64>()
            .map_err(|e| SeaLiceError::parse(path, line_no, format!("invalid biomass '{}': {}", biomass, e)))?
            as f64;

        farms.push(PlannedFarm {
            code: field(0, "code")?.to_string(),
            name: field(1, "name")?.to_string(),
            biomass_tonnes,
            lat: number(3, "latitude")?,
            lon: number(4, "longitude")?,
        });
    }

    Ok(farms)
}
