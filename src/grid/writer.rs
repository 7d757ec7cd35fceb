use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tiff::encoder::{TiffEncoder, colortype};
use tiff::tags::Tag;

use crate::error::{Result, SeaLiceError};
use crate::grid::Field;

/// GeoKey directory declaring a projected EPSG:3857 raster with pixels as
/// areas.
const GEO_KEYS_WEB_MERCATOR: [u16; 16] = [
    1, 1, 0, 3, // header, three keys
    1024, 0, 1, 1, // GTModelType: projected
    1025, 0, 1, 1, // GTRasterType: pixel is area
    3072, 0, 1, 3857, // ProjectedCSType
];

/// Writes `field` as a single band `f32` GeoTIFF, top row first.
pub fn write_layer(path: &Path, field: &Field) -> Result<()> {
    let tiff_error = |e: tiff::TiffError| SeaLiceError::Tiff {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let axes = field.axes;
    let width = u32::try_from(axes.width).map_err(|_| SeaLiceError::Tiff {
        path: path.to_path_buf(),
        reason: "Raster too wide".to_string(),
    })?;
    let height = u32::try_from(axes.height).map_err(|_| SeaLiceError::Tiff {
        path: path.to_path_buf(),
        reason: "Raster too tall".to_string(),
    })?;

    let mut data = Vec::with_capacity(field.values.len());
    for row in (0..axes.height).rev() {
        data.extend_from_slice(field.row(row));
    }

    let left = axes.x0 - 0.5 * axes.dx;
    let top = axes.y0 + (axes.height as f64 - 0.5) * axes.dy;

    let file = File::create(path)?;
    let mut encoder = TiffEncoder::new(BufWriter::new(file)).map_err(tiff_error)?;
    let mut image = encoder
        .new_image::<colortype::Gray32Float>(width, height)
        .map_err(tiff_error)?;

    image
        .encoder()
        .write_tag(Tag::ModelPixelScaleTag, &[axes.dx, axes.dy, 0.0][..])
        .map_err(tiff_error)?;
    image
        .encoder()
        .write_tag(Tag::ModelTiepointTag, &[0.0, 0.0, 0.0, left, top, 0.0][..])
        .map_err(tiff_error)?;
    image
        .encoder()
        .write_tag(Tag::GeoKeyDirectoryTag, &GEO_KEYS_WEB_MERCATOR[..])
        .map_err(tiff_error)?;

    image.write_data(&data).map_err(tiff_error)?;

    Ok(())
}
