//! One user's session: knobs in, resolved scaling kept up to date, overlay
//! out on request.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::bbox::Viewport;
use crate::compositor::{CompositeRequest, Composition, Compositor, NoDataReason};
use crate::config::EggModel;
use crate::context::SeaLiceContext;
use crate::error::{Result, SeaLiceError};
use crate::grid::{Tier, select_tier};
use crate::registry::FarmInspection;
use crate::render::{Colormap, Overlay, render};
use crate::resolver::{Aggregates, FarmMarker, ResolveParams, Resolution, resolve};

/// User-tunable state of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionParams {
    pub year: i32,
    pub biomass_pct: f64,
    pub lice_knob: f64,
    pub use_reported_lice: bool,
    pub egg_model: EggModel,
    pub color_span: [f64; 2],
    pub colormap: Colormap,
    pub include_current: bool,
    pub include_planned: bool,
    /// Planned sites switched on, by layer name.
    pub planned: Vec<String>,
    /// Existing farms switched off, by site key.
    pub disabled_farms: Vec<String>,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            year: 2021,
            biomass_pct: 100.0,
            lice_knob: 0.5,
            use_reported_lice: false,
            egg_model: EggModel::default(),
            color_span: [0.0, 2.0],
            colormap: Colormap::default(),
            include_current: true,
            include_planned: false,
            planned: Vec::new(),
            disabled_farms: Vec::new(),
        }
    }
}

impl SessionParams {
    pub fn to_resolve_params(&self) -> ResolveParams {
        ResolveParams {
            year: self.year,
            biomass_pct: self.biomass_pct,
            lice_knob: self.lice_knob,
            use_reported_lice: self.use_reported_lice,
            egg_model: self.egg_model,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderWarning {
    /// Nothing to draw; the previous overlay should be cleared.
    NoData { reason: NoDataReason },
    /// Planned sites that are not in the planned farms list.
    UnknownPlanned { names: Vec<String> },
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderResponse {
    pub year: i32,
    pub tier: Tier,
    pub egg_model: &'static str,
    pub overlay: Option<Overlay>,
    pub aggregates: Aggregates,
    pub markers: Vec<FarmMarker>,
    pub farms_used: Vec<String>,
    pub planned_used: Vec<String>,
    pub warnings: Vec<RenderWarning>,
}

pub struct Dashboard {
    context: Arc<SeaLiceContext>,
    params: SessionParams,
    resolution: Resolution,
}

impl Dashboard {
    pub fn new(context: Arc<SeaLiceContext>, params: SessionParams) -> Self {
        let resolution = resolve(context.registry(), context.index(), &params.to_resolve_params());
        Self {
            context,
            params,
            resolution,
        }
    }

    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    /// Replaces the knobs. The scaling is only recomputed when a knob it
    /// depends on changed.
    pub fn set_params(&mut self, params: SessionParams) {
        let stale = params.to_resolve_params() != self.params.to_resolve_params();
        self.params = params;
        if stale {
            self.resolution = resolve(
                self.context.registry(),
                self.context.index(),
                &self.params.to_resolve_params(),
            );
        }
    }

    pub fn inspect(&self, key: &str) -> Result<FarmInspection> {
        self.context
            .registry()
            .inspect(key)
            .ok_or_else(|| SeaLiceError::UnknownFarm(key.to_string()))
    }

    fn current_selection(&self) -> Vec<String> {
        if !self.params.include_current {
            return Vec::new();
        }
        self.context
            .registry()
            .farms()
            .iter()
            .filter(|farm| !self.params.disabled_farms.contains(&farm.key))
            .map(|farm| farm.key.clone())
            .collect()
    }

    fn unknown_planned(&self) -> Vec<String> {
        let planned = self.context.planned();
        self.params
            .planned
            .iter()
            .filter(|name| !planned.iter().any(|p| p.name == **name || p.code == **name))
            .cloned()
            .collect()
    }

    pub fn render(&self, viewport: &Viewport) -> Result<RenderResponse> {
        let tier = select_tier(viewport.zoom);
        let grids = self.context.grid_store().get_tier(tier)?;
        let farms = self.current_selection();

        let mut warnings = Vec::new();
        if self.params.include_planned {
            let names = self.unknown_planned();
            if !names.is_empty() {
                warn!(?names, "planned sites not in the planned farms list");
                warnings.push(RenderWarning::UnknownPlanned { names });
            }
        }

        let composition = Compositor::new(self.context.max_cells()).composite(&CompositeRequest {
            grids: &grids,
            registry: self.context.registry(),
            scaling: &self.resolution.scaling,
            farms: &farms,
            include_planned: self.params.include_planned,
            planned: &self.params.planned,
            viewport,
        })?;

        let (overlay, farms_used, planned_used) = match composition {
            Composition::Field(composite) => {
                let overlay = render(&composite.field, self.params.color_span, self.params.colormap)?;
                (Some(overlay), composite.farms_used, composite.planned_used)
            }
            Composition::NoData(reason) => {
                warn!(?reason, tier = %tier, "nothing to render");
                warnings.push(RenderWarning::NoData { reason });
                (None, Vec::new(), Vec::new())
            }
        };

        info!(
            year = self.resolution.year,
            tier = %tier,
            farms = farms_used.len(),
            planned = planned_used.len(),
            rendered = overlay.is_some(),
            "render finished"
        );

        Ok(RenderResponse {
            year: self.resolution.year,
            tier,
            egg_model: self.params.egg_model.label(),
            overlay,
            aggregates: self.resolution.aggregates,
            markers: self.resolution.markers.clone(),
            farms_used,
            planned_used,
            warnings,
        })
    }
}
