use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colormap {
    /// Black through red and yellow to white.
    #[default]
    Fire,
    /// Blue through magenta to yellow.
    Bmy,
}

const FIRE_ANCHORS: [(f64, [u8; 3]); 6] = [
    (0.0, [0, 0, 0]),
    (0.2, [103, 11, 4]),
    (0.4, [196, 37, 2]),
    (0.6, [251, 105, 6]),
    (0.8, [255, 182, 54]),
    (1.0, [255, 255, 255]),
];

const BMY_ANCHORS: [(f64, [u8; 3]); 6] = [
    (0.0, [0, 11, 125]),
    (0.2, [82, 22, 164]),
    (0.4, [151, 33, 155]),
    (0.6, [209, 62, 112]),
    (0.8, [244, 134, 54]),
    (1.0, [247, 246, 10]),
];

impl Colormap {
    fn anchors(self) -> &'static [(f64, [u8; 3])] {
        match self {
            Colormap::Fire => &FIRE_ANCHORS,
            Colormap::Bmy => &BMY_ANCHORS,
        }
    }

    /// 256 colours interpolated linearly between the anchors.
    pub fn lut(self) -> Vec<[u8; 3]> {
        let anchors = self.anchors();
        (0..256)
            .map(|i| {
                let t = i as f64 / 255.0;
                let upper = anchors
                    .iter()
                    .position(|(pos, _)| *pos >= t)
                    .unwrap_or(anchors.len() - 1)
                    .max(1);
                let (p0, c0) = anchors[upper - 1];
                let (p1, c1) = anchors[upper];
                let f = ((t - p0) / (p1 - p0)).clamp(0.0, 1.0);
                std::array::from_fn(|k| (c0[k] as f64 + f * (c1[k] as f64 - c0[k] as f64)).round() as u8)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lut_ends_at_anchors() {
        let fire = Colormap::Fire.lut();
        assert_eq!(fire.len(), 256);
        assert_eq!(fire[0], [0, 0, 0]);
        assert_eq!(fire[255], [255, 255, 255]);

        let bmy = Colormap::Bmy.lut();
        assert_eq!(bmy[0], [0, 11, 125]);
        assert_eq!(bmy[255], [247, 246, 10]);
    }

    #[test]
    fn test_deserializes_lowercase_names() {
        let map: Colormap = serde_json::from_str("\"bmy\"").unwrap();
        assert_eq!(map, Colormap::Bmy);
        assert_eq!(Colormap::default(), Colormap::Fire);
    }
}
