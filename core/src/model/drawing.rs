use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Camera-relative point of a captured curve, stored as named `x`/`y`/`z` fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenePoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl ScenePoint {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn to_vector(self) -> Vector3<f32> {
        Vector3::new(self.x, self.y, self.z)
    }
}

impl From<Vector3<f32>> for ScenePoint {
    fn from(v: Vector3<f32>) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<ScenePoint> for Vector3<f32> {
    fn from(p: ScenePoint) -> Self {
        p.to_vector()
    }
}

/// A persisted drawing anchored to a geographic coordinate.
///
/// Identity is the title plus the anchor: two drawings that share both are
/// the same entity even when their geometry differs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drawing {
    pub title: String,
    pub coordinates: Coordinate,
    pub points: Vec<ScenePoint>,
}

impl Drawing {
    pub fn new(title: impl Into<String>, coordinates: Coordinate, points: Vec<ScenePoint>) -> Self {
        Self {
            title: title.into(),
            coordinates,
            points,
        }
    }

    pub fn id(&self) -> String {
        format!(
            "{}{}{}",
            self.title, self.coordinates.latitude, self.coordinates.longitude
        )
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn path(&self) -> impl Iterator<Item = Vector3<f32>> + '_ {
        self.points.iter().map(|p| p.to_vector())
    }
}

impl PartialEq for Drawing {
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title && self.coordinates == other.coordinates
    }
}

impl Eq for Drawing {}

impl Hash for Drawing {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.title.hash(state);
        self.coordinates.latitude.to_bits().hash(state);
        self.coordinates.longitude.to_bits().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn identity_ignores_geometry() {
        let anchor = Coordinate::new(45.5, -73.6);
        let a = Drawing::new("bench", anchor, vec![ScenePoint::new(0.0, 0.0, -1.0)]);
        let b = Drawing::new("bench", anchor, Vec::new());
        let c = Drawing::new("bench", Coordinate::new(45.5, -73.7), Vec::new());

        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<Drawing> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn points_serialize_as_named_fields() {
        let drawing = Drawing::new(
            "arc",
            Coordinate::new(1.0, 2.0),
            vec![ScenePoint::new(0.5, -1.0, 2.0)],
        );
        let json = serde_json::to_value(&drawing).unwrap();
        assert_eq!(json["coordinates"]["latitude"], 1.0);
        assert_eq!(json["points"][0]["x"], 0.5);
        assert_eq!(json["points"][0]["z"], 2.0);
    }

    #[test]
    fn point_fields_decode_in_any_order() {
        let point: ScenePoint = serde_json::from_str(r#"{"z": 3.0, "x": 1.0, "y": 2.0}"#).unwrap();
        assert_eq!(point, ScenePoint::new(1.0, 2.0, 3.0));
    }
}
