use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::grid::reader::read_layer;
use crate::grid::store::{CURRENT_DIR, PLANNED_DIR};
use crate::grid::writer::write_layer;
use crate::grid::{Field, GridAxes, Tier};

/// Mean of the defined values among `a` and `b`.
fn nan_mean(a: f32, b: f32) -> f32 {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => f32::NAN,
        (true, false) => b,
        (false, true) => a,
        (false, false) => (a + b) / 2.0,
    }
}

/// Halves the resolution of `field`, first along x then along y. An odd
/// trailing column or row is paired with a missing cell.
pub fn coarsen(field: &Field) -> Field {
    let axes = field.axes;
    let width = axes.width.div_ceil(2);
    let height = axes.height.div_ceil(2);
    let at = |col: usize, row: usize| {
        if col < axes.width && row < axes.height {
            field.get(col, row)
        } else {
            f32::NAN
        }
    };

    let mut half_x = Vec::with_capacity(width * axes.height);
    for row in 0..axes.height {
        for col in 0..width {
            half_x.push(nan_mean(at(2 * col, row), at(2 * col + 1, row)));
        }
    }

    let mut values = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let below = half_x[2 * row * width + col];
            let above = if 2 * row + 1 < axes.height {
                half_x[(2 * row + 1) * width + col]
            } else {
                f32::NAN
            };
            values.push(nan_mean(below, above));
        }
    }

    Field::new(
        GridAxes {
            x0: axes.x0 + axes.dx / 2.0,
            y0: axes.y0 + axes.dy / 2.0,
            dx: axes.dx * 2.0,
            dy: axes.dy * 2.0,
            width,
            height,
        },
        values,
    )
}

/// Writes the five tiers under `out_root` from the finest layers in
/// `source_dir`. The 50 m tier is the first coarsening of the source.
/// Returns the number of layers processed.
pub fn build_tiers(source_dir: &Path, out_root: &Path) -> Result<usize> {
    let mut count = 0;

    for group in [CURRENT_DIR, PLANNED_DIR] {
        let dir = source_dir.join(group);
        if !dir.is_dir() {
            continue;
        }

        for path in source_layers(&dir)? {
            let Some(file_name) = path.file_name() else {
                continue;
            };
            let mut field = read_layer(&path)?;
            for tier in Tier::ALL {
                field = coarsen(&field);
                let out_dir = out_root.join(tier.dir_name()).join(group);
                fs::create_dir_all(&out_dir)?;
                write_layer(&out_dir.join(file_name), &field)?;
            }
            count += 1;
            info!(layer = %path.display(), "tiers written");
        }
    }

    Ok(count)
}

fn source_layers(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_tiff = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("tif") || ext.eq_ignore_ascii_case("tiff"));
        if is_tiff {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
