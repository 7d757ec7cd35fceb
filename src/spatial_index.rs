use rstar::RTree;
use rstar::primitives::GeomWithData;

use crate::registry::FarmRegistry;

/// A farm position in (lon, lat) tagged with the farm id.
type FarmPoint = GeomWithData<[f64; 2], usize>;

/// Nearest-neighbour lookup over farm positions, backed by an R-tree.
///
/// Distances are planar Euclidean in degrees of (lon, lat). That is good
/// enough to rank neighbours along one stretch of coast; it is not a
/// geodesic distance.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    tree: RTree<FarmPoint>,
}

impl SpatialIndex {
    pub fn new(registry: &FarmRegistry) -> Self {
        Self::bulk_load(registry.farms().iter().map(|f| (f.id, f.lon, f.lat)))
    }

    /// Index over `points`, each point's id being its position in the list.
    pub fn from_points(points: Vec<(f64, f64)>) -> Self {
        Self::bulk_load(points.into_iter().enumerate().map(|(id, (lon, lat))| (id, lon, lat)))
    }

    fn bulk_load(points: impl Iterator<Item = (usize, f64, f64)>) -> Self {
        // positions that cannot be ranked stay out of the tree
        let points = points
            .filter(|(_, lon, lat)| lon.is_finite() && lat.is_finite())
            .map(|(id, lon, lat)| FarmPoint::new([lon, lat], id))
            .collect();
        Self {
            tree: RTree::bulk_load(points),
        }
    }

    /// Ids of the `k` farms closest to (lon, lat), nearest first. Equal
    /// distances are ordered by id.
    pub fn nearest(&self, lon: f64, lat: f64, k: usize) -> Vec<usize> {
        self.ranked([lon, lat], k, None)
    }

    /// Like [`nearest`](Self::nearest), leaving out the farm `id` itself.
    pub fn neighbours(&self, id: usize, lon: f64, lat: f64, k: usize) -> Vec<usize> {
        self.ranked([lon, lat], k, Some(id))
    }

    fn ranked(&self, query: [f64; 2], k: usize, skip: Option<usize>) -> Vec<usize> {
        if k == 0 {
            return Vec::new();
        }

        // The iterator yields non-decreasing distances. Everything tied with
        // the k-th hit is kept so the id order below is not decided by the
        // tree layout.
        let mut ranked: Vec<(f64, usize)> = Vec::with_capacity(k);
        for (point, distance_2) in self.tree.nearest_neighbor_iter_with_distance_2(&query) {
            if Some(point.data) == skip {
                continue;
            }
            if ranked.len() >= k && ranked.last().is_some_and(|&(last, _)| distance_2 > last) {
                break;
            }
            ranked.push((distance_2, point.data));
        }

        ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        ranked.truncate(k);
        ranked.into_iter().map(|(_, id)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_is_ordered_by_distance() {
        let index = SpatialIndex::from_points(vec![
            (-5.0, 56.0),
            (-6.0, 57.0),
            (-5.1, 56.0),
            (-5.5, 56.5),
        ]);

        assert_eq!(index.nearest(-5.0, 56.0, 3), vec![0, 2, 3]);
        assert_eq!(index.nearest(-6.0, 57.0, 1), vec![1]);
    }

    #[test]
    fn test_k_is_capped_and_ties_break_by_id() {
        let index = SpatialIndex::from_points(vec![(1.0, 0.0), (-1.0, 0.0), (0.0, 1.0)]);

        assert_eq!(index.nearest(0.0, 0.0, 50), vec![0, 1, 2]);
        assert!(index.nearest(0.0, 0.0, 0).is_empty());
        assert!(SpatialIndex::from_points(Vec::new()).nearest(0.0, 0.0, 5).is_empty());
    }

    #[test]
    fn test_neighbours_skip_the_farm_itself() {
        let index = SpatialIndex::from_points(vec![
            (-5.0, 56.0),
            (-5.0, 56.0),
            (-5.2, 56.0),
            (-5.1, 56.0),
        ]);

        assert_eq!(index.neighbours(0, -5.0, 56.0, 2), vec![1, 3]);
        assert_eq!(index.neighbours(1, -5.0, 56.0, 50), vec![0, 3, 2]);
    }

    #[test]
    fn test_ties_beyond_k_are_broken_by_id() {
        let points = vec![(0.0, 2.0), (2.0, 0.0), (0.0, -2.0), (-2.0, 0.0), (1.0, 0.0)];
        let index = SpatialIndex::from_points(points);

        assert_eq!(index.nearest(0.0, 0.0, 2), vec![4, 0]);
        assert_eq!(index.nearest(0.0, 0.0, 4), vec![4, 0, 1, 2]);
    }

    #[test]
    fn test_non_finite_positions_are_not_indexed() {
        let index = SpatialIndex::from_points(vec![(f64::NAN, 56.0), (-5.0, 56.0)]);

        assert_eq!(index.len(), 1);
        assert_eq!(index.nearest(-5.0, 56.0, 5), vec![1]);
    }
}
