//! Gridded density layers: one field per farm and resolution tier, all
//! sharing the tier's axes.

pub mod pyramid;
pub mod reader;
pub mod store;
pub mod tier;
pub mod writer;

use std::collections::BTreeMap;

pub use store::GridStore;
pub use tier::{Tier, select_tier};

/// Regular grid in EPSG:3857 metres. `x0`/`y0` are the centres of the
/// first column and row; `y` grows with the row index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridAxes {
    pub x0: f64,
    pub y0: f64,
    pub dx: f64,
    pub dy: f64,
    pub width: usize,
    pub height: usize,
}

impl GridAxes {
    pub fn x(&self, col: usize) -> f64 {
        self.x0 + col as f64 * self.dx
    }

    pub fn y(&self, row: usize) -> f64 {
        self.y0 + row as f64 * self.dy
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Same cells, allowing for rounding in the stored georeferencing.
    pub fn aligned_with(&self, other: &GridAxes) -> bool {
        let tol = 1e-6 * self.dx.abs().max(self.dy.abs()).max(1.0);
        self.width == other.width
            && self.height == other.height
            && (self.x0 - other.x0).abs() <= tol
            && (self.y0 - other.y0).abs() <= tol
            && (self.dx - other.dx).abs() <= tol
            && (self.dy - other.dy).abs() <= tol
    }

    /// Column range whose centres lie strictly between `min` and `max`.
    pub fn cols_within(&self, min: f64, max: f64) -> std::ops::Range<usize> {
        strict_range(self.x0, self.dx, self.width, min, max)
    }

    /// Row range whose centres lie strictly between `min` and `max`.
    pub fn rows_within(&self, min: f64, max: f64) -> std::ops::Range<usize> {
        strict_range(self.y0, self.dy, self.height, min, max)
    }

    /// Axes of the sub-grid starting at (`col`, `row`).
    pub fn window(&self, cols: std::ops::Range<usize>, rows: std::ops::Range<usize>) -> GridAxes {
        GridAxes {
            x0: self.x(cols.start),
            y0: self.y(rows.start),
            dx: self.dx,
            dy: self.dy,
            width: cols.len(),
            height: rows.len(),
        }
    }
}

fn strict_range(origin: f64, step: f64, len: usize, min: f64, max: f64) -> std::ops::Range<usize> {
    let inside = |i: usize| {
        let v = origin + i as f64 * step;
        min < v && v < max
    };
    let start = (0..len).find(|&i| inside(i)).unwrap_or(len);
    let end = (start..len).find(|&i| !inside(i)).unwrap_or(len);
    start..end
}

/// A 2-D scalar field on regular axes, row-major with rows along `y`.
/// Cells without a value are `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub axes: GridAxes,
    pub values: Vec<f32>,
}

impl Field {
    pub fn new(axes: GridAxes, values: Vec<f32>) -> Self {
        debug_assert_eq!(axes.len(), values.len());
        Self { axes, values }
    }

    pub fn get(&self, col: usize, row: usize) -> f32 {
        self.values[row * self.axes.width + col]
    }

    pub fn row(&self, row: usize) -> &[f32] {
        let w = self.axes.width;
        &self.values[row * w..(row + 1) * w]
    }
}

/// Every layer of one tier: existing farms and planned farms.
#[derive(Debug, Clone)]
pub struct TierGrids {
    pub tier: Tier,
    pub axes: GridAxes,
    pub current: BTreeMap<String, Vec<f32>>,
    pub planned: BTreeMap<String, Vec<f32>>,
}

impl TierGrids {
    pub fn current_names(&self) -> impl Iterator<Item = &str> {
        self.current.keys().map(String::as_str)
    }
}
