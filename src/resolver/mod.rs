//! Biomass and lice resolver.
//!
//! Turns a production year and the global tuning knobs into one scale factor
//! per farm. Every farm's density layer was simulated at unit scaling, so the
//! factor is all the compositor needs to weight it.

pub mod lice;
pub mod window;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EggModel;
use crate::registry::FarmRegistry;
use crate::spatial_index::SpatialIndex;

pub use lice::{DEFAULT_LICE_PER_FISH, LiceSource, NEIGHBOUR_SEARCH_SIZE};
pub use window::ProductionWindow;

/// Nauplii released per ton of fish per unit of combined scale.
pub const LICE_RELEASE_RATE: f64 = 4.5 * 1000.0;

/// Substitute for knob values at or below zero.
pub const KNOB_EPSILON: f64 = 1e-5;

/// Converts lice per fish into a multiplier of the layers, which were
/// simulated at half a louse per fish.
pub const LICE_UNIT_FACTOR: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveParams {
    pub year: i32,
    /// Global biomass scaling in percent, 100 leaves farms as reported.
    pub biomass_pct: f64,
    /// Lice per fish applied to every farm when reported lice are not used.
    pub lice_knob: f64,
    pub use_reported_lice: bool,
    pub egg_model: EggModel,
}

/// Per-farm factors indexed by farm id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalingVector {
    pub activated: Vec<bool>,
    pub biomass_factor: Vec<f64>,
    pub lice_factor: Vec<f64>,
    pub combined_scale: Vec<f64>,
    /// `None` for farms that are not activated.
    pub lice_sources: Vec<Option<LiceSource>>,
    pub biomass_fraction: f64,
    /// Lice/egg multiplier shared by all farms; planned farms use only this.
    pub global_lice_factor: f64,
}

impl ScalingVector {
    /// All farms active at unit scale.
    pub fn uniform(len: usize, scale: f64) -> Self {
        Self {
            activated: vec![true; len],
            biomass_factor: vec![1.0; len],
            lice_factor: vec![1.0; len],
            combined_scale: vec![scale; len],
            lice_sources: vec![Some(LiceSource::Global); len],
            biomass_fraction: 1.0,
            global_lice_factor: scale,
        }
    }

    pub fn len(&self) -> usize {
        self.activated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activated.is_empty()
    }

    pub fn is_active(&self, id: usize) -> bool {
        self.activated.get(id).copied().unwrap_or(false)
    }

    pub fn active_count(&self) -> usize {
        self.activated.iter().filter(|a| **a).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aggregates {
    /// Tons of fish in the sampled window after global scaling.
    pub total_biomass: f64,
    pub total_lice_release: f64,
}

impl Aggregates {
    pub fn total_biomass_kg(&self) -> f64 {
        self.total_biomass * 1000.0
    }
}

/// A stocked farm as drawn on the map, its disc sized by current biomass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FarmMarker {
    pub key: String,
    pub lat: f64,
    pub lon: f64,
    pub current_biomass: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub year: i32,
    pub scaling: ScalingVector,
    pub aggregates: Aggregates,
    pub markers: Vec<FarmMarker>,
}

fn clamp_knob(value: f64) -> f64 {
    if value > 0.0 { value } else { KNOB_EPSILON }
}

/// Lice multiplier shared by every farm when reported counts are ignored.
pub fn global_lice_factor(lice_knob: f64, egg_model: EggModel) -> f64 {
    clamp_knob(lice_knob) * LICE_UNIT_FACTOR * egg_model.factor()
}

pub fn resolve(registry: &FarmRegistry, index: &SpatialIndex, params: &ResolveParams) -> Resolution {
    let n = registry.len();
    let biomass_fraction = clamp_knob(params.biomass_pct) / 100.0;
    let global_lice = global_lice_factor(params.lice_knob, params.egg_model);

    let mut scaling = ScalingVector {
        activated: vec![false; n],
        biomass_factor: vec![1.0; n],
        lice_factor: vec![1.0; n],
        combined_scale: vec![biomass_fraction; n],
        lice_sources: vec![None; n],
        biomass_fraction,
        global_lice_factor: global_lice,
    };

    let Some(window) = ProductionWindow::may(params.year) else {
        warn!(year = params.year, "no production window for year");
        return Resolution {
            year: params.year,
            scaling,
            aggregates: Aggregates {
                total_biomass: 0.0,
                total_lice_release: 0.0,
            },
            markers: Vec::new(),
        };
    };

    let mut markers = Vec::new();
    let mut total_biomass = 0.0;
    let mut total_release = 0.0;

    for farm in registry.farms() {
        let Some(mean) = window.mean_in(registry.times(), &farm.biomass) else {
            debug!(farm = %farm.key, year = params.year, "not stocked");
            continue;
        };
        let id = farm.id;
        let biomass_factor = mean / farm.max_biomass;

        // the global factor already carries the egg model
        let (lice_factor, source) = if params.use_reported_lice {
            let (count, source) = lice::reported_lice(registry, index, farm, &window);
            (count * params.egg_model.factor(), source)
        } else {
            (global_lice, LiceSource::Global)
        };

        let combined = biomass_fraction * biomass_factor * lice_factor;
        scaling.activated[id] = true;
        scaling.biomass_factor[id] = biomass_factor;
        scaling.lice_factor[id] = lice_factor;
        scaling.combined_scale[id] = combined;
        scaling.lice_sources[id] = Some(source);

        let current_biomass = farm.max_biomass * biomass_factor * biomass_fraction;
        total_biomass += current_biomass;
        total_release += combined * farm.max_biomass;
        markers.push(FarmMarker {
            key: farm.key.clone(),
            lat: farm.lat,
            lon: farm.lon,
            current_biomass,
        });
    }

    let aggregates = Aggregates {
        total_biomass,
        total_lice_release: total_release * LICE_RELEASE_RATE,
    };
    info!(
        year = params.year,
        active = scaling.active_count(),
        farms = n,
        total_biomass = aggregates.total_biomass,
        total_lice_release = aggregates.total_lice_release,
        "scaling resolved"
    );

    Resolution {
        year: params.year,
        scaling,
        aggregates,
        markers,
    }
}
