//! Sea-lice dispersion raster engine.
//!
//! Resolves per-farm biomass and lice scaling for a production year, weights
//! pre-computed per-farm copepodid density layers with it and renders the sum
//! as a map overlay.

pub mod bbox;
pub mod compositor;
pub mod config;
pub mod context;
pub mod error;
pub mod grid;
pub mod pipeline;
pub mod registry;
pub mod render;
pub mod resolver;
pub mod spatial_index;

pub use error::{Result, SeaLiceError};
