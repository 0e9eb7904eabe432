#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory spatial lookups for property enrichment.
//!
//! [`SuburbResolver`] builds an R-tree over suburb polygons and answers
//! point-in-polygon queries. [`nearest::NearestStopFinder`] finds the
//! closest transit stop by great-circle distance. Both are built once and
//! shared read-only across every property.

pub mod nearest;

use geo::{BoundingRect, Contains, LineString, MultiPolygon, Polygon};
use property_map_geography_models::{RingMode, SuburbBoundary};
use rstar::{AABB, RTree, RTreeObject};

pub use nearest::{NearestStopFinder, haversine_km};

/// A boundary polygon stored in the R-tree with its load position.
struct BoundaryEntry {
    /// Position in the boundary source. Lower wins on overlap.
    order: usize,
    name: String,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for BoundaryEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Point-in-polygon suburb lookup.
///
/// Answers exactly what a scan of the boundaries in load order would
/// answer: the first boundary containing the point. The R-tree only
/// narrows the candidates.
pub struct SuburbResolver {
    boundaries: RTree<BoundaryEntry>,
    mode: RingMode,
}

impl SuburbResolver {
    /// Builds the index. Boundaries with no usable ring are skipped.
    #[must_use]
    pub fn new(boundaries: &[SuburbBoundary], mode: RingMode) -> Self {
        let mut entries = Vec::with_capacity(boundaries.len());
        let mut multi_part = 0usize;

        for (order, boundary) in boundaries.iter().enumerate() {
            if boundary.parts.len() > 1 {
                multi_part += 1;
            }
            let parts = match mode {
                RingMode::FirstRing => &boundary.parts[..boundary.parts.len().min(1)],
                RingMode::AllRings => &boundary.parts[..],
            };
            let polygons: Vec<Polygon<f64>> = parts
                .iter()
                .filter(|ring| ring.len() >= 3)
                .map(|ring| Polygon::new(LineString::from(ring.clone()), vec![]))
                .collect();

            if polygons.is_empty() {
                log::warn!("Boundary {} has no ring with 3+ vertices", boundary.name);
                continue;
            }

            let polygon = MultiPolygon(polygons);
            entries.push(BoundaryEntry {
                order,
                name: boundary.name.clone(),
                envelope: compute_envelope(&polygon),
                polygon,
            });
        }

        if mode == RingMode::FirstRing && multi_part > 0 {
            log::info!(
                "Ring mode {mode}: ignoring additional parts of {multi_part} multi-part boundaries"
            );
        }
        log::info!("Indexed {} suburb boundaries ({mode})", entries.len());

        Self {
            boundaries: RTree::bulk_load(entries),
            mode,
        }
    }

    /// Returns the name of the first boundary (in load order) containing
    /// the point. Points on an edge are outside.
    #[must_use]
    pub fn resolve(&self, lat: f64, lng: f64) -> Option<&str> {
        let point = geo::Point::new(lng, lat);
        let query_env = AABB::from_point([lng, lat]);

        self.boundaries
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| entry.polygon.contains(&point))
            .min_by_key(|entry| entry.order)
            .map(|entry| entry.name.as_str())
    }

    /// Ring mode the index was built with.
    #[must_use]
    pub const fn mode(&self) -> RingMode {
        self.mode
    }

    /// Number of indexed boundaries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boundaries.size()
    }

    /// Returns `true` if no boundaries are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boundaries.size() == 0
    }
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Vec<(f64, f64)> {
        vec![
            (x, y),
            (x + size, y),
            (x + size, y + size),
            (x, y + size),
            (x, y),
        ]
    }

    fn boundary(name: &str, parts: Vec<Vec<(f64, f64)>>) -> SuburbBoundary {
        SuburbBoundary {
            name: name.to_string(),
            parts,
        }
    }

    fn fixture() -> Vec<SuburbBoundary> {
        vec![
            boundary("CARLTON", vec![square(144.96, -37.81, 0.01)]),
            boundary(
                "FRENCH ISLAND",
                vec![square(145.30, -38.40, 0.05), square(145.50, -38.40, 0.02)],
            ),
            // Overlaps CARLTON entirely; loaded later so never wins there.
            boundary("OVERLAP", vec![square(144.95, -37.82, 0.05)]),
        ]
    }

    #[test]
    fn resolves_point_inside_ring() {
        let resolver = SuburbResolver::new(&fixture(), RingMode::FirstRing);
        assert_eq!(resolver.resolve(-37.805, 144.965), Some("CARLTON"));
    }

    #[test]
    fn point_outside_every_polygon_is_unresolved() {
        let resolver = SuburbResolver::new(&fixture(), RingMode::FirstRing);
        assert_eq!(resolver.resolve(-33.86, 151.21), None);
    }

    #[test]
    fn first_loaded_boundary_wins_on_overlap() {
        let resolver = SuburbResolver::new(&fixture(), RingMode::FirstRing);
        assert_eq!(resolver.resolve(-37.805, 144.965), Some("CARLTON"));
        // Outside CARLTON but inside OVERLAP.
        assert_eq!(resolver.resolve(-37.815, 144.955), Some("OVERLAP"));
    }

    #[test]
    fn first_ring_mode_ignores_later_parts() {
        let resolver = SuburbResolver::new(&fixture(), RingMode::FirstRing);
        assert_eq!(resolver.resolve(-38.39, 145.51), None);
        assert_eq!(resolver.resolve(-38.38, 145.32), Some("FRENCH ISLAND"));
    }

    #[test]
    fn all_rings_mode_uses_every_part() {
        let resolver = SuburbResolver::new(&fixture(), RingMode::AllRings);
        assert_eq!(resolver.resolve(-38.39, 145.51), Some("FRENCH ISLAND"));
        assert_eq!(resolver.mode(), RingMode::AllRings);
    }

    #[test]
    fn matches_linear_scan_for_grid_of_points() {
        let boundaries = fixture();
        let resolver = SuburbResolver::new(&boundaries, RingMode::FirstRing);
        let polygons: Vec<(String, Polygon<f64>)> = boundaries
            .iter()
            .map(|b| {
                (
                    b.name.clone(),
                    Polygon::new(LineString::from(b.parts[0].clone()), vec![]),
                )
            })
            .collect();

        for i in 0..40u32 {
            for j in 0..40u32 {
                let lng = 144.94 + f64::from(i) * 0.0017;
                let lat = -37.83 + f64::from(j) * 0.0017;
                let point = geo::Point::new(lng, lat);
                let expected = polygons
                    .iter()
                    .find(|(_, p)| p.contains(&point))
                    .map(|(name, _)| name.as_str());
                assert_eq!(resolver.resolve(lat, lng), expected, "({lat}, {lng})");
            }
        }
    }

    #[test]
    fn degenerate_rings_are_skipped() {
        let boundaries = vec![boundary("LINE", vec![vec![(0.0, 0.0), (1.0, 1.0)]])];
        let resolver = SuburbResolver::new(&boundaries, RingMode::FirstRing);
        assert!(resolver.is_empty());
    }
}
