use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use glob::Pattern;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{Result, SeaLiceError};
use crate::grid::reader::read_layer;
use crate::grid::{GridAxes, Tier, TierGrids};

/// Cells of existing-farm layers east of this x (EPSG:3857 metres) are
/// simulation artifacts along the open boundary.
pub const BORDER_X_THRESHOLD: f64 = -509_600.0;

pub const CURRENT_DIR: &str = "current";
pub const PLANNED_DIR: &str = "planned";

type Slot = Arc<Mutex<Option<Arc<TierGrids>>>>;

/// Lazily loaded, per-tier cache of density layers.
///
/// Each tier has its own slot lock so concurrent first requests for one tier
/// read the files once, while other tiers load independently. Failed loads
/// leave the slot empty.
pub struct GridStore {
    root: PathBuf,
    excluded: Vec<String>,
    slots: Mutex<HashMap<Tier, Slot>>,
    loads: AtomicUsize,
}

impl GridStore {
    pub fn new(root: impl Into<PathBuf>, excluded: Vec<String>) -> Self {
        Self {
            root: root.into(),
            excluded,
            slots: Mutex::new(HashMap::new()),
            loads: AtomicUsize::new(0),
        }
    }

    /// Number of tiers read from disk so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn get_tier(&self, tier: Tier) -> Result<Arc<TierGrids>> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(tier).or_default())
        };

        let mut cached = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(grids) = cached.as_ref() {
            return Ok(Arc::clone(grids));
        }

        let grids = Arc::new(self.load(tier)?);
        self.loads.fetch_add(1, Ordering::SeqCst);
        *cached = Some(Arc::clone(&grids));
        Ok(grids)
    }

    fn load(&self, tier: Tier) -> Result<TierGrids> {
        let dir = find_tier_dir(&self.root, tier).ok_or(SeaLiceError::TierNotFound(tier))?;
        info!(tier = %tier, dir = %dir.display(), "loading tier");

        let mut axes: Option<GridAxes> = None;
        let current = self.load_group(&dir.join(CURRENT_DIR), tier, &mut axes, true)?;
        let planned = self.load_group(&dir.join(PLANNED_DIR), tier, &mut axes, false)?;

        let Some(axes) = axes else {
            return Err(SeaLiceError::TierNotFound(tier));
        };

        info!(
            tier = %tier,
            current = current.len(),
            planned = planned.len(),
            width = axes.width,
            height = axes.height,
            "tier loaded"
        );

        Ok(TierGrids {
            tier,
            axes,
            current,
            planned,
        })
    }

    fn load_group(
        &self,
        dir: &Path,
        tier: Tier,
        axes: &mut Option<GridAxes>,
        mask_border: bool,
    ) -> Result<BTreeMap<String, Vec<f32>>> {
        let mut layers = BTreeMap::new();

        for path in list_layers(dir)? {
            let Some(name) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                continue;
            };
            if self.excluded.iter().any(|e| *e == name) {
                debug!(layer = %name, "excluded layer skipped");
                continue;
            }

            let mut field = read_layer(&path)?;
            match axes {
                Some(shared) if !shared.aligned_with(&field.axes) => {
                    return Err(SeaLiceError::MisalignedLayer { layer: name, tier });
                }
                Some(_) => {}
                None => *axes = Some(field.axes),
            }

            if mask_border {
                mask_border_cells(&mut field.values, &field.axes);
            }
            layers.insert(name, field.values);
        }

        Ok(layers)
    }
}

fn mask_border_cells(values: &mut [f32], axes: &GridAxes) {
    let width = axes.width;
    let first_masked = (0..width).find(|&c| axes.x(c) >= BORDER_X_THRESHOLD).unwrap_or(width);
    if first_masked == width {
        return;
    }
    for row in values.chunks_exact_mut(width) {
        row[first_masked..].fill(f32::NAN);
    }
}

/// Looks for `<root>/map_<res>m` first, then anywhere below `root`.
fn find_tier_dir(root: &Path, tier: Tier) -> Option<PathBuf> {
    let name = tier.dir_name();
    let direct = root.join(&name);
    if direct.is_dir() {
        return Some(direct);
    }

    if !root.exists() {
        return None;
    }

    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        if entry.file_type().is_dir() && entry.file_name().to_string_lossy() == name {
            return Some(entry.into_path());
        }
    }

    None
}

/// GeoTIFF files of one layer group, sorted. A missing group is empty.
fn list_layers(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let escaped = Pattern::escape(&dir.to_string_lossy());
    let mut paths = Vec::new();
    for ext in ["tif", "tiff"] {
        let pattern = format!("{}/*.{}", escaped, ext);
        let entries = glob::glob(&pattern).map_err(|e| SeaLiceError::Tiff {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;
        paths.extend(entries.filter_map(|e| e.ok()));
    }
    paths.sort();

    Ok(paths)
}
