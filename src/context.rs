use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::grid::GridStore;
use crate::registry::{FarmRegistry, LiceDataset, PlannedFarm, read_planned_farms};
use crate::spatial_index::SpatialIndex;

/// Everything loaded once at startup and shared, read-only, by all sessions.
/// The grid store fills its cache on demand behind its own locks.
pub struct SeaLiceContext {
    registry: FarmRegistry,
    index: SpatialIndex,
    planned: Vec<PlannedFarm>,
    grid_store: GridStore,
    max_cells: usize,
}

impl SeaLiceContext {
    pub fn new(
        registry: FarmRegistry,
        planned: Vec<PlannedFarm>,
        grid_store: GridStore,
        max_cells: usize,
    ) -> Self {
        let index = SpatialIndex::new(&registry);
        Self {
            registry,
            index,
            planned,
            grid_store,
            max_cells,
        }
    }

    pub fn load(config: &Config) -> Result<Self> {
        let data = config.data();

        let lice = LiceDataset::from_csv(&data.lice_csv)?;
        let mut registry = FarmRegistry::load(&data.biomass_csv, &lice)?;
        if let Some(gsid_csv) = &data.gsid_csv {
            registry.attach_gsid(gsid_csv)?;
        }
        let planned = read_planned_farms(&data.planned_farms)?;
        let grid_store = GridStore::new(&data.grid_root, config.excluded_layers().to_vec());

        info!(
            farms = registry.len(),
            lice_series = lice.len(),
            planned = planned.len(),
            grid_root = %data.grid_root.display(),
            "context loaded"
        );

        Ok(Self::new(registry, planned, grid_store, config.max_cells()))
    }

    pub fn registry(&self) -> &FarmRegistry {
        &self.registry
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn planned(&self) -> &[PlannedFarm] {
        &self.planned
    }

    pub fn grid_store(&self) -> &GridStore {
        &self.grid_store
    }

    pub fn max_cells(&self) -> usize {
        self.max_cells
    }
}
