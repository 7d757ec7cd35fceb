use serde::Serialize;
use std::fmt;

/// Resolution tiers the density layers are stored at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "u32")]
pub enum Tier {
    M50,
    M100,
    M200,
    M400,
    M800,
}

impl Tier {
    /// Finest first.
    pub const ALL: [Tier; 5] = [Tier::M50, Tier::M100, Tier::M200, Tier::M400, Tier::M800];

    pub fn meters(self) -> u32 {
        match self {
            Tier::M50 => 50,
            Tier::M100 => 100,
            Tier::M200 => 200,
            Tier::M400 => 400,
            Tier::M800 => 800,
        }
    }

    pub fn from_meters(meters: u32) -> Option<Self> {
        Tier::ALL.into_iter().find(|t| t.meters() == meters)
    }

    /// Directory holding the tier's layers, e.g. `map_200m`.
    pub fn dir_name(self) -> String {
        format!("map_{}m", self.meters())
    }

    /// Picks the tier for a map zoom level so that the rendered image stays
    /// around one data cell per screen pixel.
    ///
    /// | zoom            | tier  |
    /// |-----------------|-------|
    /// | < 6             | 800 m |
    /// | [6, 7.1)        | 400 m |
    /// | [7.1, 8.1)      | 200 m |
    /// | [8.1, 9.1)      | 100 m |
    /// | >= 9.1          | 50 m  |
    pub fn select(zoom: f64) -> Self {
        if !zoom.is_finite() || zoom < 6.0 {
            Tier::M800
        } else if zoom < 7.1 {
            Tier::M400
        } else if zoom < 8.1 {
            Tier::M200
        } else if zoom < 9.1 {
            Tier::M100
        } else {
            Tier::M50
        }
    }
}

pub fn select_tier(zoom: f64) -> Tier {
    Tier::select(zoom)
}

impl From<Tier> for u32 {
    fn from(tier: Tier) -> u32 {
        tier.meters()
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} m", self.meters())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(select_tier(5.9), Tier::M800);
        assert_eq!(select_tier(6.0), Tier::M400);
        assert_eq!(select_tier(7.0), Tier::M400);
        assert_eq!(select_tier(7.1), Tier::M200);
        assert_eq!(select_tier(8.0), Tier::M200);
        assert_eq!(select_tier(8.1), Tier::M100);
        assert_eq!(select_tier(9.0), Tier::M100);
        assert_eq!(select_tier(9.1), Tier::M50);
        assert_eq!(select_tier(14.0), Tier::M50);
        assert_eq!(select_tier(f64::NAN), Tier::M800);
    }

    #[test]
    fn test_meters_round_trip() {
        for tier in Tier::ALL {
            assert_eq!(Tier::from_meters(tier.meters()), Some(tier));
        }
        assert_eq!(Tier::from_meters(75), None);
        assert_eq!(Tier::M200.dir_name(), "map_200m");
    }
}
