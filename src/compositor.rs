//! Weighted sum of the selected farm layers over the viewport.

use std::collections::BTreeSet;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::bbox::Viewport;
use crate::error::{Result, SeaLiceError};
use crate::grid::{Field, TierGrids};
use crate::registry::FarmRegistry;
use crate::resolver::ScalingVector;

pub struct CompositeRequest<'a> {
    pub grids: &'a TierGrids,
    pub registry: &'a FarmRegistry,
    pub scaling: &'a ScalingVector,
    /// Existing farms the user has switched on.
    pub farms: &'a [String],
    pub include_planned: bool,
    pub planned: &'a [String],
    pub viewport: &'a Viewport,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    pub field: Field,
    pub farms_used: Vec<String>,
    pub planned_used: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoDataReason {
    NoFarmsSelected,
    ViewportOutsideGrid,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Composition {
    Field(Composite),
    NoData(NoDataReason),
}

pub struct Compositor {
    max_cells: usize,
}

impl Compositor {
    pub fn new(max_cells: usize) -> Self {
        Self { max_cells }
    }

    pub fn composite(&self, request: &CompositeRequest) -> Result<Composition> {
        let grids = request.grids;
        let wanted: BTreeSet<&str> = request.farms.iter().map(String::as_str).collect();

        // Layer order follows the tier's sorted layer names, so the sum is
        // evaluated in the same order for the same selection.
        let mut layers: Vec<(&[f32], f64)> = Vec::new();
        let mut farms_used = Vec::new();
        for (name, values) in &grids.current {
            if !wanted.contains(name.as_str()) {
                continue;
            }
            let Some(farm) = request.registry.get(name) else {
                debug!(layer = %name, "layer has no registry farm");
                continue;
            };
            if !request.scaling.is_active(farm.id) {
                continue;
            }
            layers.push((values.as_slice(), request.scaling.combined_scale[farm.id]));
            farms_used.push(name.clone());
        }

        let mut planned_used = Vec::new();
        if request.include_planned {
            let wanted: BTreeSet<&str> = request.planned.iter().map(String::as_str).collect();
            for (name, values) in &grids.planned {
                if wanted.contains(name.as_str()) {
                    layers.push((values.as_slice(), request.scaling.global_lice_factor));
                    planned_used.push(name.clone());
                }
            }
        }

        if layers.is_empty() {
            return Ok(Composition::NoData(NoDataReason::NoFarmsSelected));
        }

        let axes = grids.axes;
        let vp = request.viewport;
        let cols = axes.cols_within(vp.xmin, vp.xmax);
        let rows = axes.rows_within(vp.ymin, vp.ymax);
        if cols.is_empty() || rows.is_empty() {
            return Ok(Composition::NoData(NoDataReason::ViewportOutsideGrid));
        }

        let cells = cols.len() * rows.len();
        if cells > self.max_cells {
            return Err(SeaLiceError::ViewportTooLarge {
                cells,
                limit: self.max_cells,
            });
        }

        let out_axes = axes.window(cols.clone(), rows.clone());
        let mut values = vec![f32::NAN; cells];
        values
            .par_chunks_mut(cols.len())
            .enumerate()
            .for_each(|(r, out_row)| {
                let offset = (rows.start + r) * axes.width + cols.start;
                for (c, out) in out_row.iter_mut().enumerate() {
                    let mut sum = 0.0_f64;
                    let mut defined = false;
                    for (layer, weight) in &layers {
                        let v = layer[offset + c];
                        if !v.is_nan() {
                            sum += v as f64 * weight;
                            defined = true;
                        }
                    }
                    if defined {
                        *out = sum as f32;
                    }
                }
            });

        info!(
            tier = %grids.tier,
            farms = farms_used.len(),
            planned = planned_used.len(),
            width = out_axes.width,
            height = out_axes.height,
            "composite built"
        );

        Ok(Composition::Field(Composite {
            field: Field::new(out_axes, values),
            farms_used,
            planned_used,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GridAxes, Tier};
    use crate::registry::LiceDataset;
    use crate::registry::tests::{day, record};
    use std::collections::BTreeMap;

    fn registry() -> FarmRegistry {
        let stocked = [Some(10.0), Some(10.0)];
        FarmRegistry::from_records(
            vec![day(2021, 5, 1), day(2021, 6, 1)],
            vec![
                record("A", "A", -6.0, 56.0, &stocked),
                record("B", "B", -5.9, 56.0, &stocked),
                record("C", "C", -5.8, 56.0, &stocked),
            ],
            &LiceDataset::default(),
        )
    }

    fn grids() -> TierGrids {
        let axes = GridAxes {
            x0: 0.0,
            y0: 0.0,
            dx: 10.0,
            dy: 10.0,
            width: 4,
            height: 3,
        };
        let mut current = BTreeMap::new();
        current.insert("A".to_string(), (0..12).map(|v| v as f32).collect());
        current.insert("B".to_string(), vec![0.5; 12]);
        let mut c = vec![1.0; 12];
        c[0] = f32::NAN;
        current.insert("C".to_string(), c);
        let mut planned = BTreeMap::new();
        planned.insert("P".to_string(), vec![2.0; 12]);
        TierGrids {
            tier: Tier::M800,
            axes,
            current,
            planned,
        }
    }

    fn viewport() -> Viewport {
        Viewport::new(-5.0, 35.0, -5.0, 25.0, 5.0).unwrap()
    }

    fn keys(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    fn field(composition: Composition) -> Composite {
        match composition {
            Composition::Field(composite) => composite,
            Composition::NoData(reason) => panic!("no data: {reason:?}"),
        }
    }

    fn run_in(
        compositor: &Compositor,
        farms: &[&str],
        include_planned: bool,
        scaling: &ScalingVector,
        viewport: &Viewport,
    ) -> Result<Composition> {
        let (grids, registry) = (grids(), registry());
        let farms = keys(farms);
        let planned = keys(&["P"]);
        compositor.composite(&CompositeRequest {
            grids: &grids,
            registry: &registry,
            scaling,
            farms: &farms,
            include_planned,
            planned: &planned,
            viewport,
        })
    }

    fn run(farms: &[&str], include_planned: bool, scaling: &ScalingVector) -> Composition {
        run_in(&Compositor::new(1000), farms, include_planned, scaling, &viewport()).unwrap()
    }

    #[test]
    fn test_composite_is_additive() {
        let mut scaling = ScalingVector::uniform(3, 1.0);
        scaling.combined_scale = vec![2.0, 4.0, 1.0];

        let a = field(run(&["A"], false, &scaling));
        let b = field(run(&["B"], false, &scaling));
        let ab = field(run(&["A", "B"], false, &scaling));

        for i in 0..ab.field.values.len() {
            assert_eq!(ab.field.values[i], a.field.values[i] + b.field.values[i]);
        }
        assert_eq!(ab.farms_used, keys(&["A", "B"]));
    }

    #[test]
    fn test_composite_is_deterministic() {
        let scaling = ScalingVector::uniform(3, 0.37);
        let first = field(run(&["C", "A", "B"], true, &scaling));
        let second = field(run(&["A", "B", "C"], true, &scaling));

        let bits = |c: &Composite| c.field.values.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&first), bits(&second));
    }

    #[test]
    fn test_missing_cells_contribute_nothing() {
        let scaling = ScalingVector::uniform(3, 1.0);
        let c = field(run(&["C"], false, &scaling));
        assert!(c.field.values[0].is_nan());

        let bc = field(run(&["B", "C"], false, &scaling));
        assert_eq!(bc.field.values[0], 0.5);
        assert_eq!(bc.field.values[1], 1.5);
    }

    #[test]
    fn test_planned_layers_use_global_factor() {
        let mut scaling = ScalingVector::uniform(3, 1.0);
        scaling.global_lice_factor = 3.0;

        let only_planned = field(run(&[], true, &scaling));

        assert!(only_planned.field.values.iter().all(|v| *v == 6.0));
        assert_eq!(only_planned.planned_used, keys(&["P"]));
        assert!(only_planned.farms_used.is_empty());
    }

    #[test]
    fn test_empty_selection_is_no_data() {
        let mut scaling = ScalingVector::uniform(3, 1.0);

        assert_eq!(run(&[], false, &scaling), Composition::NoData(NoDataReason::NoFarmsSelected));
        assert_eq!(
            run(&["unknown"], false, &scaling),
            Composition::NoData(NoDataReason::NoFarmsSelected)
        );

        scaling.activated = vec![false; 3];
        assert_eq!(run(&["A"], false, &scaling), Composition::NoData(NoDataReason::NoFarmsSelected));
    }

    #[test]
    fn test_crop_is_strict() {
        let scaling = ScalingVector::uniform(3, 1.0);
        let compositor = Compositor::new(1000);

        // centres at 0, 10, 20, 30 and 0, 10, 20
        let vp = Viewport::new(0.0, 30.0, 0.0, 20.0, 5.0).unwrap();
        let cropped = field(run_in(&compositor, &["A"], false, &scaling, &vp).unwrap());
        assert_eq!((cropped.field.axes.width, cropped.field.axes.height), (2, 1));
        assert_eq!(cropped.field.values, vec![5.0, 6.0]);

        let outside = Viewport::new(100.0, 200.0, 0.0, 20.0, 5.0).unwrap();
        assert_eq!(
            run_in(&compositor, &["A"], false, &scaling, &outside).unwrap(),
            Composition::NoData(NoDataReason::ViewportOutsideGrid)
        );

        let err = run_in(&Compositor::new(4), &["A"], false, &scaling, &viewport()).unwrap_err();
        assert!(matches!(err, SeaLiceError::ViewportTooLarge { cells: 12, limit: 4 }));
    }
}
