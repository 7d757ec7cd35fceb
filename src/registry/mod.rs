//! Farm registry: per-site metadata with the biomass and lice time series,
//! loaded once at start-up and read-only afterwards.

pub mod biomass;
pub mod gsid;
pub mod inspect;
pub mod lice;
pub mod planned;
mod table;

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::error::Result;

pub use biomass::{BiomassRecord, read_biomass_csv};
pub use inspect::FarmInspection;
pub use lice::LiceDataset;
pub use planned::{PlannedFarm, read_planned_farms};

#[derive(Debug, Clone, Serialize)]
pub struct Farm {
    pub key: String,
    /// Dense index over retained farms, in file order.
    pub id: usize,
    pub lat: f64,
    pub lon: f64,
    pub additional_location: String,
    pub name_ms: String,
    pub sepa_site_id: String,
    pub scot_env_site_id: String,
    pub gsid: Option<String>,
    pub production_year: String,
    pub licensed_peak_biomass: String,
    pub operator: String,
    pub production_cycle: String,
    pub production_in_three_years: String,
    pub max_biomass: f64,
    #[serde(skip)]
    pub biomass: Vec<Option<f64>>,
    #[serde(skip)]
    pub lice: Vec<Option<f64>>,
    pub mean_lice: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct FarmRegistry {
    farms: Vec<Farm>,
    by_key: HashMap<String, usize>,
    times: Vec<NaiveDate>,
    lice_times: Vec<NaiveDate>,
}

impl FarmRegistry {
    /// Reads the biomass table and attaches lice series by regulatory code.
    pub fn load<P: AsRef<Path>>(biomass_csv: P, lice: &LiceDataset) -> Result<Self> {
        info!(path = %biomass_csv.as_ref().display(), "reading biomass data");
        let (times, records) = read_biomass_csv(biomass_csv)?;
        let registry = Self::from_records(times, records, lice);
        info!(farms = registry.len(), "biomass data read");
        Ok(registry)
    }

    /// Builds the registry from parsed rows. Rows whose biomass never rises
    /// above zero are dropped and do not consume an id.
    pub fn from_records(
        times: Vec<NaiveDate>,
        records: Vec<BiomassRecord>,
        lice: &LiceDataset,
    ) -> Self {
        let mut farms: Vec<Farm> = Vec::with_capacity(records.len());
        let mut by_key = HashMap::with_capacity(records.len());

        for record in records {
            if record.max_biomass <= 0.0 {
                debug!(farm = %record.key, "no biomass data, dropped");
                continue;
            }
            if by_key.contains_key(&record.key) {
                debug!(farm = %record.key, "duplicate site key, keeping first row");
                continue;
            }

            let (lice_series, mean_lice) = match lice.get(&record.scot_env_site_id) {
                Some(series) => (series.to_vec(), lice::mean_defined(series.iter().copied())),
                None => (vec![None; lice.times().len()], None),
            };

            let id = farms.len();
            by_key.insert(record.key.clone(), id);
            farms.push(Farm {
                key: record.key,
                id,
                lat: record.lat,
                lon: record.lon,
                additional_location: record.additional_location,
                name_ms: record.name_ms,
                sepa_site_id: record.sepa_site_id,
                scot_env_site_id: record.scot_env_site_id,
                gsid: None,
                production_year: record.production_year,
                licensed_peak_biomass: record.licensed_peak_biomass,
                operator: record.operator,
                production_cycle: record.production_cycle,
                production_in_three_years: record.production_in_three_years,
                max_biomass: record.max_biomass,
                biomass: record.biomass,
                lice: lice_series,
                mean_lice,
            });
        }

        Self {
            farms,
            by_key,
            times,
            lice_times: lice.times().to_vec(),
        }
    }

    pub fn farms(&self) -> &[Farm] {
        &self.farms
    }

    pub fn get(&self, key: &str) -> Option<&Farm> {
        self.by_key.get(key).map(|&id| &self.farms[id])
    }

    pub fn by_id(&self, id: usize) -> Option<&Farm> {
        self.farms.get(id)
    }

    /// Monthly axis shared by every biomass series.
    pub fn times(&self) -> &[NaiveDate] {
        &self.times
    }

    /// Axis shared by every lice series.
    pub fn lice_times(&self) -> &[NaiveDate] {
        &self.lice_times
    }

    /// Regulatory codes used for the lice lookup, aligned with farm ids.
    pub fn lice_ids(&self) -> Vec<&str> {
        self.farms
            .iter()
            .map(|f| f.scot_env_site_id.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.farms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.farms.is_empty()
    }

    pub(crate) fn farms_mut(&mut self) -> &mut [Farm] {
        &mut self.farms
    }

    pub(crate) fn index_of(&self, key: &str) -> Option<usize> {
        self.by_key.get(key).copied()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::BTreeMap;

    pub(crate) fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub(crate) fn record(key: &str, code: &str, lon: f64, lat: f64, biomass: &[Option<f64>]) -> BiomassRecord {
        BiomassRecord {
            key: key.to_string(),
            additional_location: String::new(),
            name_ms: key.to_string(),
            sepa_site_id: String::new(),
            scot_env_site_id: code.to_string(),
            lat,
            lon,
            production_year: String::new(),
            licensed_peak_biomass: String::new(),
            operator: String::new(),
            production_cycle: String::new(),
            production_in_three_years: String::new(),
            biomass: biomass.to_vec(),
            max_biomass: biomass.iter().flatten().fold(0.0_f64, |a, &b| a.max(b)),
        }
    }

    #[test]
    fn test_farms_without_biomass_are_dropped_and_ids_stay_dense() {
        let times = vec![day(2021, 4, 1), day(2021, 5, 1)];
        let records = vec![
            record("A", "FS1", -5.0, 56.0, &[Some(10.0), Some(20.0)]),
            record("B", "FS2", -5.1, 56.1, &[None, None]),
            record("C", "FS3", -5.2, 56.2, &[Some(0.0), Some(0.0)]),
            record("D", "FS4", -5.3, 56.3, &[None, Some(5.0)]),
        ];
        let registry = FarmRegistry::from_records(times, records, &LiceDataset::default());

        assert_eq!(registry.len(), 2);
        assert!(registry.get("B").is_none());
        assert!(registry.get("C").is_none());
        assert!(registry.farms().iter().all(|f| f.max_biomass > 0.0));

        let mut ids: Vec<usize> = registry.farms().iter().map(|f| f.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..registry.len()).collect::<Vec<_>>());
        assert_eq!(registry.get("D").unwrap().id, 1);
    }

    #[test]
    fn test_lice_series_attached_by_exact_code() {
        let lice_times = vec![day(2021, 5, 3), day(2021, 5, 10)];
        let lice = LiceDataset::new(
            lice_times,
            BTreeMap::from([("FS1".to_string(), vec![Some(1.0), Some(2.0)])]),
        );
        let records = vec![
            record("A", "FS1", -5.0, 56.0, &[Some(10.0)]),
            record("B", "fs1", -5.1, 56.1, &[Some(10.0)]),
        ];
        let registry = FarmRegistry::from_records(vec![day(2021, 5, 1)], records, &lice);

        let a = registry.get("A").unwrap();
        assert_eq!(a.lice, vec![Some(1.0), Some(2.0)]);
        assert_eq!(a.mean_lice, Some(1.5));

        let b = registry.get("B").unwrap();
        assert_eq!(b.lice, vec![None, None]);
        assert_eq!(b.mean_lice, None);
        assert_eq!(registry.lice_ids(), vec!["FS1", "fs1"]);
    }
}
