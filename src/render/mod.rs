//! Turns a composited density field into a transparent PNG overlay with the
//! geographic corners a web map needs to place it.

pub mod colormap;
pub mod mask;
pub mod projection;

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, SeaLiceError};
use crate::grid::Field;

pub use colormap::Colormap;

#[derive(Debug, Clone, Serialize)]
pub struct Overlay {
    #[serde(skip)]
    pub png: Vec<u8>,
    /// `[lon, lat]` of the top-left, top-right, bottom-right and bottom-left
    /// cell centres.
    pub corners: [[f64; 2]; 4],
    pub width: u32,
    pub height: u32,
}

fn check_span(span: [f64; 2]) -> Result<()> {
    let [lo, hi] = span;
    if !lo.is_finite() || !hi.is_finite() || hi <= lo {
        return Err(SeaLiceError::InvalidSpan(lo, hi));
    }
    Ok(())
}

/// Geographic corners of `field`, top-left first and clockwise.
pub fn corners(field: &Field) -> [[f64; 2]; 4] {
    let axes = field.axes;
    let (x0, y0) = (axes.x(0), axes.y(0));
    let (xn, yn) = (
        axes.x(axes.width.saturating_sub(1)),
        axes.y(axes.height.saturating_sub(1)),
    );

    let mut corners = [(x0, y0), (xn, y0), (xn, yn), (x0, yn)].map(|(x, y)| {
        let (lon, lat) = projection::to_lon_lat(x, y);
        [lon, lat]
    });
    corners.reverse();
    corners
}

pub fn render(field: &Field, span: [f64; 2], colormap: Colormap) -> Result<Overlay> {
    check_span(span)?;
    let axes = field.axes;
    let too_large = || SeaLiceError::ViewportTooLarge {
        cells: axes.len(),
        limit: u32::MAX as usize,
    };
    let width = u32::try_from(axes.width).map_err(|_| too_large())?;
    let height = u32::try_from(axes.height).map_err(|_| too_large())?;

    let lut = colormap.lut();
    let [lo, hi] = span;
    let mut img = RgbaImage::new(width, height);
    let mut drawn = 0usize;

    for row in 0..axes.height {
        let y = axes.y(row);
        // top of the image is the northern edge
        let img_row = (axes.height - 1 - row) as u32;
        for (col, &value) in field.row(row).iter().enumerate() {
            let value = value as f64;
            if value.is_nan() || value <= 0.0 || mask::is_excluded(axes.x(col), y) {
                continue;
            }
            let t = ((value - lo) / (hi - lo)).clamp(0.0, 1.0);
            let [r, g, b] = lut[(t * 255.0).round() as usize];
            img.put_pixel(col as u32, img_row, Rgba([r, g, b, 255]));
            drawn += 1;
        }
    }
    debug!(width, height, drawn, "overlay rasterized");

    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    Ok(Overlay {
        png,
        corners: corners(field),
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridAxes;
    use approx::assert_relative_eq;

    fn field(values: Vec<f32>) -> Field {
        Field::new(
            GridAxes {
                x0: -600_000.0,
                y0: 7_500_000.0,
                dx: 100.0,
                dy: 100.0,
                width: 2,
                height: 2,
            },
            values,
        )
    }

    #[test]
    fn test_transparent_and_clamped_pixels() {
        let overlay = render(&field(vec![0.0, f32::NAN, 1.0, 5.0]), [0.0, 2.0], Colormap::Fire).unwrap();
        let img = image::load_from_memory(&overlay.png).unwrap().to_rgba8();
        let lut = Colormap::Fire.lut();

        // grid row 0 is the image's bottom row
        assert_eq!(img.get_pixel(0, 1)[3], 0);
        assert_eq!(img.get_pixel(1, 1)[3], 0);
        let [r, g, b] = lut[128];
        assert_eq!(img.get_pixel(0, 0).0, [r, g, b, 255]);
        let [r, g, b] = lut[255];
        assert_eq!(img.get_pixel(1, 0).0, [r, g, b, 255]);
    }

    #[test]
    fn test_corners_project_back_onto_cell_centres() {
        let axes = GridAxes {
            x0: -712_400.0,
            y0: 7_431_600.0,
            dx: 800.0,
            dy: 800.0,
            width: 5,
            height: 3,
        };
        let f = Field::new(axes, vec![1.0; axes.len()]);
        let (xn, yn) = (axes.x(4), axes.y(2));
        let expected = [(axes.x0, yn), (xn, yn), (xn, axes.y0), (axes.x0, axes.y0)];

        for ([lon, lat], (x, y)) in corners(&f).into_iter().zip(expected) {
            let (px, py) = projection::from_lon_lat(lon, lat);
            assert!((px - x).abs() < 1.0, "x {px} vs {x}");
            assert!((py - y).abs() < 1.0, "y {py} vs {y}");
        }
    }

    #[test]
    fn test_corners_start_top_left() {
        let f = field(vec![1.0; 4]);
        let c = corners(&f);
        let (west, north) = projection::to_lon_lat(-600_000.0, 7_500_100.0);
        let (east, south) = projection::to_lon_lat(-599_900.0, 7_500_000.0);

        assert_relative_eq!(c[0][0], west);
        assert_relative_eq!(c[0][1], north);
        assert_relative_eq!(c[1][0], east);
        assert_relative_eq!(c[2][1], south);
        assert_relative_eq!(c[3][0], west);
    }

    #[test]
    fn test_masked_region_is_transparent() {
        let f = Field::new(
            GridAxes {
                x0: -870_000.0,
                y0: 7_650_000.0,
                dx: 100.0,
                dy: 100.0,
                width: 1,
                height: 1,
            },
            vec![1.0],
        );
        let overlay = render(&f, [0.0, 2.0], Colormap::Bmy).unwrap();
        let img = image::load_from_memory(&overlay.png).unwrap().to_rgba8();

        assert_eq!(img.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_rejects_empty_span() {
        let err = render(&field(vec![1.0; 4]), [2.0, 2.0], Colormap::Fire).unwrap_err();

        assert!(matches!(err, SeaLiceError::InvalidSpan(..)));
    }
}
