use serde::Serialize;
use tracing::warn;

use crate::registry::{Farm, FarmRegistry};
use crate::resolver::window::ProductionWindow;
use crate::spatial_index::SpatialIndex;

/// How many neighbours are tried before giving up on reported lice.
pub const NEIGHBOUR_SEARCH_SIZE: usize = 50;

/// Lice per fish used when nothing nearby ever reported a count.
pub const DEFAULT_LICE_PER_FISH: f64 = 0.5;

/// Where a farm's lice factor came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum LiceSource {
    /// Counts reported by the farm during the production window.
    Window,
    /// The farm's all-time mean count.
    FarmMean,
    /// Borrowed from the nearest farm that had data.
    Neighbour { farm: String, from_window: bool },
    /// Nothing found among the neighbours.
    Default,
    /// The global knob, reported lice not in use.
    Global,
}

/// Mean count reported inside the window, kept only when positive.
pub fn window_lice(farm: &Farm, lice_times: &[chrono::NaiveDate], window: &ProductionWindow) -> Option<f64> {
    window
        .mean_in(lice_times, &farm.lice)
        .filter(|mean| *mean > 0.0)
}

/// The farm's own data: window counts first, then the all-time mean.
/// The flag is true when the value came from the window.
pub fn own_lice(farm: &Farm, lice_times: &[chrono::NaiveDate], window: &ProductionWindow) -> Option<(f64, bool)> {
    window_lice(farm, lice_times, window)
        .map(|v| (v, true))
        .or_else(|| farm.mean_lice.map(|v| (v, false)))
}

/// Walks the neighbours of `farm` nearest first and returns the first one
/// with usable data.
pub fn neighbour_lice(
    registry: &FarmRegistry,
    index: &SpatialIndex,
    farm: &Farm,
    window: &ProductionWindow,
) -> Option<(f64, LiceSource)> {
    index
        .neighbours(farm.id, farm.lon, farm.lat, NEIGHBOUR_SEARCH_SIZE)
        .into_iter()
        .filter_map(|id| registry.by_id(id))
        .find_map(|neighbour| {
            own_lice(neighbour, registry.lice_times(), window).map(|(value, from_window)| {
                (
                    value,
                    LiceSource::Neighbour {
                        farm: neighbour.key.clone(),
                        from_window,
                    },
                )
            })
        })
}

/// Full precedence: own window, own mean, neighbour chain, default.
pub fn reported_lice(
    registry: &FarmRegistry,
    index: &SpatialIndex,
    farm: &Farm,
    window: &ProductionWindow,
) -> (f64, LiceSource) {
    if let Some((value, from_window)) = own_lice(farm, registry.lice_times(), window) {
        let source = if from_window {
            LiceSource::Window
        } else {
            LiceSource::FarmMean
        };
        return (value, source);
    }

    if let Some(found) = neighbour_lice(registry, index, farm, window) {
        return found;
    }

    warn!(
        farm = %farm.key,
        neighbours = NEIGHBOUR_SEARCH_SIZE,
        default = DEFAULT_LICE_PER_FISH,
        "no reported lice nearby, using default"
    );
    (DEFAULT_LICE_PER_FISH, LiceSource::Default)
}
