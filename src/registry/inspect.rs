use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::registry::FarmRegistry;

/// Everything the farm inspection view plots for one site.
#[derive(Debug, Clone, Serialize)]
pub struct FarmInspection {
    pub key: String,
    pub operator: String,
    pub gsid: Option<String>,
    pub max_biomass: f64,
    pub mean_lice: Option<f64>,
    pub biomass: Vec<(NaiveDate, Option<f64>)>,
    pub lice: Vec<(NaiveDate, Option<f64>)>,
    /// May 1st of every year on the biomass axis, the month the resolver
    /// samples.
    pub may_markers: Vec<NaiveDate>,
}

impl FarmRegistry {
    pub fn inspect(&self, key: &str) -> Option<FarmInspection> {
        let farm = self.get(key)?;

        let biomass = self
            .times()
            .iter()
            .copied()
            .zip(farm.biomass.iter().copied())
            .collect();
        let lice = self
            .lice_times()
            .iter()
            .copied()
            .zip(farm.lice.iter().copied())
            .collect();

        let may_markers = match (self.times().first(), self.times().last()) {
            (Some(first), Some(last)) => (first.year()..=last.year())
                .filter_map(|year| NaiveDate::from_ymd_opt(year, 5, 1))
                .collect(),
            _ => Vec::new(),
        };

        Some(FarmInspection {
            key: farm.key.clone(),
            operator: farm.operator.clone(),
            gsid: farm.gsid.clone(),
            max_biomass: farm.max_biomass,
            mean_lice: farm.mean_lice,
            biomass,
            lice,
            may_markers,
        })
    }
}
