use crate::model::Coordinate;

/// Mean Earth radius (IUGG) in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

pub struct GeodesyHelper;

impl GeodesyHelper {
    /// Great-circle distance in meters using the haversine formula.
    pub fn distance_m(from: Coordinate, to: Coordinate) -> f64 {
        let lat1 = from.latitude.to_radians();
        let lat2 = to.latitude.to_radians();
        let delta_lat = (to.latitude - from.latitude).to_radians();
        let delta_lon = (to.longitude - from.longitude).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().min(1.0).asin();

        EARTH_RADIUS_M * c
    }

    /// Coordinate `distance_m` meters north of `origin` along its meridian.
    pub fn offset_north(origin: Coordinate, distance_m: f64) -> Coordinate {
        let delta_lat = (distance_m / EARTH_RADIUS_M).to_degrees();
        Coordinate::new(origin.latitude + delta_lat, origin.longitude)
    }

    /// Coordinate `distance_m` meters east of `origin` along its parallel.
    pub fn offset_east(origin: Coordinate, distance_m: f64) -> Coordinate {
        let parallel_radius = EARTH_RADIUS_M * origin.latitude.to_radians().cos();
        if parallel_radius <= f64::EPSILON {
            return origin;
        }
        let delta_lon = (distance_m / parallel_radius).to_degrees();
        Coordinate::new(origin.latitude, origin.longitude + delta_lon)
    }
}
