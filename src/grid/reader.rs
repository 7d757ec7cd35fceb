use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

use crate::error::{Result, SeaLiceError};
use crate::grid::{Field, GridAxes};

fn tiff_error(path: &Path, reason: impl std::fmt::Display) -> SeaLiceError {
    SeaLiceError::Tiff {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Reads a single band GeoTIFF into a field whose rows run south to north.
///
/// The georeferencing comes from the ModelPixelScale and ModelTiepoint tags,
/// with the tiepoint anchoring the top-left corner of the first pixel.
pub fn read_layer(path: &Path) -> Result<Field> {
    let file = File::open(path).map_err(|e| tiff_error(path, format!("Failed to open file: {}", e)))?;
    let reader = BufReader::new(file);

    let mut decoder = Decoder::new(reader).map_err(|e| tiff_error(path, format!("Failed to decode TIFF: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| tiff_error(path, format!("Failed to get dimensions: {}", e)))?;

    let scale = decoder
        .get_tag_f64_vec(Tag::ModelPixelScaleTag)
        .map_err(|e| tiff_error(path, format!("Missing pixel scale: {}", e)))?;
    let tiepoint = decoder
        .get_tag_f64_vec(Tag::ModelTiepointTag)
        .map_err(|e| tiff_error(path, format!("Missing tiepoint: {}", e)))?;

    let (&[sx, sy, ..], &[ti, tj, _, tx, ty, ..]) = (scale.as_slice(), tiepoint.as_slice()) else {
        return Err(tiff_error(path, "Malformed georeferencing tags"));
    };
    if !(sx > 0.0 && sy > 0.0) {
        return Err(tiff_error(path, format!("Invalid pixel scale ({}, {})", sx, sy)));
    }

    let raw: Vec<f32> = match decoder
        .read_image()
        .map_err(|e| tiff_error(path, format!("Failed to read image: {}", e)))?
    {
        DecodingResult::U8(data) => data.iter().map(|&x| x as f32).collect(),
        DecodingResult::U16(data) => data.iter().map(|&x| x as f32).collect(),
        DecodingResult::U32(data) => data.iter().map(|&x| x as f32).collect(),
        DecodingResult::F32(data) => data,
        DecodingResult::F64(data) => data.iter().map(|&x| x as f32).collect(),
        _ => return Err(tiff_error(path, "Unsupported pixel format")),
    };

    let (width, height) = (width as usize, height as usize);
    if raw.len() != width * height {
        return Err(tiff_error(path, "Only single band rasters are supported"));
    }

    // Top-left corner of the raster, then the centre of the bottom-left cell.
    let left = tx - ti * sx;
    let top = ty + tj * sy;
    let axes = GridAxes {
        x0: left + 0.5 * sx,
        y0: top - (height as f64 - 0.5) * sy,
        dx: sx,
        dy: sy,
        width,
        height,
    };

    let mut values = Vec::with_capacity(raw.len());
    for row in raw.chunks_exact(width.max(1)).rev() {
        values.extend_from_slice(row);
    }

    Ok(Field::new(axes, values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::writer::write_layer;
    use tempfile::tempdir;

    #[test]
    fn test_read_restores_written_layer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Farm A.tif");
        let axes = GridAxes {
            x0: -600_000.0,
            y0: 7_500_000.0,
            dx: 200.0,
            dy: 200.0,
            width: 3,
            height: 2,
        };
        let field = Field::new(axes, vec![1.0, f32::NAN, 3.0, 4.0, 5.0, 6.0]);

        write_layer(&path, &field).unwrap();
        let read = read_layer(&path).unwrap();

        assert!(read.axes.aligned_with(&axes));
        // bottom row stays first
        assert_eq!(read.get(0, 0), 1.0);
        assert!(read.get(1, 0).is_nan());
        assert_eq!(read.get(2, 1), 6.0);
    }

    #[test]
    fn test_missing_file_is_tiff_error() {
        let dir = tempdir().unwrap();
        let err = read_layer(&dir.path().join("none.tif")).unwrap_err();

        assert!(matches!(err, SeaLiceError::Tiff { .. }));
    }
}
