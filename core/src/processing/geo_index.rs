use crate::math::GeodesyHelper;
use crate::model::{Drawing, LocationFix};

/// Linear-scan lookup of drawings anchored near a fix.
pub struct GeoIndex;

impl GeoIndex {
    /// Returns the first drawing, in stored order, whose anchor lies within
    /// `radius_m` meters (inclusive) of the fix.
    ///
    /// This is first-match, not nearest-match: when several anchors overlap
    /// the fix, only the earliest inserted drawing is ever reported.
    pub fn find_nearby<'a>(
        fix: &LocationFix,
        drawings: &'a [Drawing],
        radius_m: f64,
    ) -> Option<&'a Drawing> {
        drawings
            .iter()
            .find(|drawing| Self::distance_m(fix, drawing) <= radius_m)
    }

    /// Every drawing within range, in stored order.
    pub fn within<'a>(fix: &LocationFix, drawings: &'a [Drawing], radius_m: f64) -> Vec<&'a Drawing> {
        drawings
            .iter()
            .filter(|drawing| Self::distance_m(fix, drawing) <= radius_m)
            .collect()
    }

    pub fn distance_m(fix: &LocationFix, drawing: &Drawing) -> f64 {
        GeodesyHelper::distance_m(fix.coordinate, drawing.coordinates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coordinate;

    const ORIGIN: Coordinate = Coordinate {
        latitude: 45.5017,
        longitude: -73.5673,
    };

    fn drawing_at(title: &str, north_m: f64) -> Drawing {
        Drawing::new(title, GeodesyHelper::offset_north(ORIGIN, north_m), Vec::new())
    }

    fn fix() -> LocationFix {
        LocationFix::new(ORIGIN, 5.0, 0.0)
    }

    #[test]
    fn first_inserted_match_wins_over_nearest() {
        let drawings = vec![
            drawing_at("far", 4.0),
            drawing_at("nearest", 1.0),
            drawing_at("middle", 2.0),
        ];

        let found = GeoIndex::find_nearby(&fix(), &drawings, 5.0).unwrap();
        assert_eq!(found.title, "far");
        assert_eq!(GeoIndex::within(&fix(), &drawings, 5.0).len(), 3);
    }

    #[test]
    fn out_of_range_drawings_are_skipped() {
        let drawings = vec![drawing_at("away", 30.0), drawing_at("here", 2.0)];
        let found = GeoIndex::find_nearby(&fix(), &drawings, 5.0).unwrap();
        assert_eq!(found.title, "here");
    }

    #[test]
    fn radius_boundary_is_inclusive() {
        let drawings = vec![drawing_at("edge", 10.0)];
        let distance = GeoIndex::distance_m(&fix(), &drawings[0]);

        assert!(GeoIndex::find_nearby(&fix(), &drawings, distance).is_some());
        assert!(GeoIndex::find_nearby(&fix(), &drawings, distance - 1e-6).is_none());
    }

    #[test]
    fn empty_collection_finds_nothing() {
        assert!(GeoIndex::find_nearby(&fix(), &[], 20.0).is_none());
    }
}
