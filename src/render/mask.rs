/// Region whose cells are never drawn, EPSG:3857 metres.
pub const EXCLUDED_REGION: [(f64, f64); 4] = [
    (-890_556.0, 7_719_350.0),
    (-829_330.0, 7_618_370.0),
    (-857_160.0, 7_588_335.0),
    (-912_820.0, 7_688_916.0),
];

/// Even-odd ray casting test. The polygon closes on itself; fewer than three
/// vertices contain nothing.
pub fn point_in_polygon(x: f64, y: f64, polygon: &[(f64, f64)]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for (i, &(xi, yi)) in polygon.iter().enumerate() {
        let (xj, yj) = polygon[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

pub fn is_excluded(x: f64, y: f64) -> bool {
    point_in_polygon(x, y, &EXCLUDED_REGION)
}
