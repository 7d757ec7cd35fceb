use chrono::NaiveDate;
use std::path::Path;

use crate::error::{Result, SeaLiceError};
use crate::registry::lice::parse_sample;
use crate::registry::table::TextTable;

/// First column holding a monthly biomass sample; everything before it is
/// site identity.
pub const BIOMASS_START: usize = 21;

mod column {
    pub const KEY: usize = 0;
    pub const ADDITIONAL_LOCATION: usize = 1;
    pub const NAME_MS: usize = 2;
    pub const SEPA_SITE_ID: usize = 3;
    pub const SCOT_ENV_SITE_ID: usize = 4;
    pub const LAT: usize = 6;
    pub const LON: usize = 7;
    pub const PRODUCTION_YEAR: usize = 9;
    pub const LICENSED_PEAK_BIOMASS: usize = 10;
    pub const OPERATOR: usize = 13;
    pub const PRODUCTION_CYCLE: usize = 14;
    pub const PRODUCTION_IN_THREE_YEARS: usize = 18;
}

/// One row of the biomass table, before farms without data are filtered out.
#[derive(Debug, Clone)]
pub struct BiomassRecord {
    pub key: String,
    pub additional_location: String,
    pub name_ms: String,
    pub sepa_site_id: String,
    pub scot_env_site_id: String,
    pub lat: f64,
    pub lon: f64,
    pub production_year: String,
    pub licensed_peak_biomass: String,
    pub operator: String,
    pub production_cycle: String,
    pub production_in_three_years: String,
    pub biomass: Vec<Option<f64>>,
    pub max_biomass: f64,
}

/// Parses the biomass table: a header whose columns from [`BIOMASS_START`]
/// are `%m/%d/%Y` dates, a units row, then one site per row. Fields may be
/// quoted.
pub fn read_biomass_csv<P: AsRef<Path>>(path: P) -> Result<(Vec<NaiveDate>, Vec<BiomassRecord>)> {
    let path = path.as_ref();
    let table = TextTable::read(path, b',')?;
    if table.height() == 0 {
        return Err(SeaLiceError::parse(path, 1, "empty biomass table"));
    }
    if table.width() < BIOMASS_START {
        return Err(SeaLiceError::parse(
            path,
            1,
            format!("expected at least {} columns, found {}", BIOMASS_START, table.width()),
        ));
    }

    let times = (BIOMASS_START..table.width())
        .map(|col| {
            let header = table.cell(0, col).unwrap_or_default();
            NaiveDate::parse_from_str(header, "%m/%d/%Y")
                .map_err(|e| SeaLiceError::parse(path, 1, format!("invalid date '{}': {}", header, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut records = Vec::new();
    // row 1 holds the units
    for row in 2..table.height() {
        if table.is_blank(row) {
            continue;
        }
        let line_no = TextTable::line(row);

        let coordinate = |col: usize, name: &str| {
            let raw = table.cell(row, col).unwrap_or_default();
            raw.parse::<f64>()
                .map_err(|e| SeaLiceError::parse(path, line_no, format!("invalid {} '{}': {}", name, raw, e)))
        };
        let lat = coordinate(column::LAT, "latitude")?;
        let lon = coordinate(column::LON, "longitude")?;

        let biomass: Vec<Option<f64>> = (0..times.len())
            .map(|i| table.cell(row, BIOMASS_START + i).and_then(parse_sample))
            .collect();
        let max_biomass = biomass.iter().flatten().fold(0.0_f64, |acc, &b| acc.max(b));

        let text = |col: usize| table.cell(row, col).unwrap_or_default().to_string();
        records.push(BiomassRecord {
            key: text(column::KEY),
            additional_location: text(column::ADDITIONAL_LOCATION),
            name_ms: text(column::NAME_MS),
            sepa_site_id: text(column::SEPA_SITE_ID),
            scot_env_site_id: text(column::SCOT_ENV_SITE_ID),
            lat,
            lon,
            production_year: text(column::PRODUCTION_YEAR),
            licensed_peak_biomass: text(column::LICENSED_PEAK_BIOMASS),
            operator: text(column::OPERATOR),
            production_cycle: text(column::PRODUCTION_CYCLE),
            production_in_three_years: text(column::PRODUCTION_IN_THREE_YEARS),
            biomass,
            max_biomass,
        });
    }

    Ok((times, records))
}
