use serde::{Deserialize, Serialize};

/// Half the width of the Web Mercator square, in metres.
pub const MERCATOR_EXTENT: f64 = 20_037_508.342_789_244;

/// Visible map area in EPSG:3857 metres plus the map zoom it was seen at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    pub zoom: f64,
}

impl Viewport {
    pub fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64, zoom: f64) -> Result<Self, String> {
        let extent = -MERCATOR_EXTENT..=MERCATOR_EXTENT;
        if !extent.contains(&xmin) || !extent.contains(&xmax) {
            return Err("x values must be within the Web Mercator extent".to_string());
        }

        if !extent.contains(&ymin) || !extent.contains(&ymax) {
            return Err("y values must be within the Web Mercator extent".to_string());
        }

        if xmin > xmax || ymin > ymax {
            return Err("Min values must be <= max values".to_string());
        }

        if !zoom.is_finite() || zoom < 0.0 {
            return Err("zoom must be a non-negative number".to_string());
        }

        Ok(Viewport {
            xmin,
            xmax,
            ymin,
            ymax,
            zoom,
        })
    }
}

#[cfg(test)]
mod test {
    use crate::bbox::Viewport;

    #[test]
    fn test_viewport_coords_are_within_ranges() {
        let valid = Viewport::new(-1_100_000.0, -500_000.0, 7_400_000.0, 8_000_000.0, 5.5);
        assert!(valid.is_ok());

        let invalid_x = Viewport::new(-3.0e7, 0.0, 0.0, 10.0, 5.0);
        assert!(invalid_x.is_err());

        let invalid_y = Viewport::new(0.0, 10.0, 0.0, 3.0e7, 5.0);
        assert!(invalid_y.is_err());

        let invalid_order = Viewport::new(10.0, 0.0, 0.0, 10.0, 5.0);
        assert!(invalid_order.is_err());

        let invalid_zoom = Viewport::new(0.0, 10.0, 0.0, 10.0, f64::NAN);
        assert!(invalid_zoom.is_err());
    }
}
