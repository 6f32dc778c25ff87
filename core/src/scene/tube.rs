//! Incrementally extruded tube geometry.
//!
//! A circular cross-section of `edges` vertices is swept along the path. Each
//! path point owns one ring, except joints that turn more than
//! `max_turning_deg`, which are rounded with extra rings. The ring at the last
//! point is provisional: its orientation depends on the next segment, so it
//! is the only geometry rewritten when a point is appended.

use std::f32::consts::TAU;

use nalgebra::{Unit, UnitQuaternion, Vector3};

use crate::prelude::TubeParams;

const MIN_SEGMENT: f32 = 1e-5;
const EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy)]
struct RingFrame {
    normal: Vector3<f32>,
}

#[derive(Debug, Clone)]
pub struct TubeMesh {
    params: TubeParams,
    path: Vec<Vector3<f32>>,
    frames: Vec<RingFrame>,
    vertices: Vec<Vector3<f32>>,
    normals: Vec<Vector3<f32>>,
    indices: Vec<u32>,
    provisional_tail: bool,
}

impl TubeMesh {
    pub fn new(params: TubeParams) -> Self {
        Self {
            params,
            path: Vec::new(),
            frames: Vec::new(),
            vertices: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
            provisional_tail: false,
        }
    }

    pub fn from_path<I>(params: TubeParams, points: I) -> Self
    where
        I: IntoIterator<Item = Vector3<f32>>,
    {
        let mut mesh = Self::new(params);
        for point in points {
            mesh.push(point);
        }
        mesh
    }

    /// Appends a path point. Returns `false` when the point is too close to
    /// the previous one to form a segment.
    pub fn push(&mut self, point: Vector3<f32>) -> bool {
        if let Some(last) = self.path.last() {
            if (point - last).norm() < MIN_SEGMENT {
                return false;
            }
        }
        self.path.push(point);

        let n = self.path.len();
        if n == 2 {
            let direction = (self.path[1] - self.path[0]).normalize();
            self.emit_ring(self.path[0], direction);
            self.emit_ring(self.path[1], direction);
            self.provisional_tail = true;
        } else if n > 2 {
            self.retract_tail();
            let joint = self.path[n - 2];
            let incoming = (joint - self.path[n - 3]).normalize();
            let outgoing = (point - joint).normalize();
            self.emit_joint(joint, incoming, outgoing);
            self.emit_ring(point, outgoing);
            self.provisional_tail = true;
        }
        true
    }

    fn retract_tail(&mut self) {
        if !self.provisional_tail {
            return;
        }
        let edges = self.params.edges;
        self.frames.pop();
        let vertex_len = self.vertices.len() - edges;
        self.vertices.truncate(vertex_len);
        self.normals.truncate(vertex_len);
        let index_len = self.indices.len() - 6 * edges;
        self.indices.truncate(index_len);
        self.provisional_tail = false;
    }

    fn emit_joint(&mut self, center: Vector3<f32>, incoming: Vector3<f32>, outgoing: Vector3<f32>) {
        let angle = incoming.angle(&outgoing);
        let max_turn = self.params.max_turning_deg.to_radians();

        if angle <= max_turn {
            let miter = incoming + outgoing;
            let tangent = if miter.norm() > EPSILON {
                miter.normalize()
            } else {
                outgoing
            };
            self.emit_ring(center, tangent);
            return;
        }

        let steps = (angle / max_turn).ceil() as usize;
        let cross = incoming.cross(&outgoing);
        let axis = if cross.norm() > EPSILON {
            Unit::new_normalize(cross)
        } else {
            // Full reversal: any axis perpendicular to the incoming segment works.
            let normal = self
                .frames
                .last()
                .map(|frame| frame.normal)
                .unwrap_or_else(|| perpendicular(incoming));
            Unit::new_normalize(normal)
        };
        for step in 0..=steps {
            let turn = angle * step as f32 / steps as f32;
            let rotation = UnitQuaternion::from_axis_angle(&axis, turn);
            self.emit_ring(center, rotation * incoming);
        }
    }

    fn emit_ring(&mut self, center: Vector3<f32>, tangent: Vector3<f32>) {
        let edges = self.params.edges;
        let normal = match self.frames.last() {
            Some(previous) => transport(previous.normal, tangent),
            None => perpendicular(tangent),
        };
        let binormal = tangent.cross(&normal);

        let base = self.vertices.len() as u32;
        for edge in 0..edges {
            let phi = TAU * edge as f32 / edges as f32;
            let radial = normal * phi.cos() + binormal * phi.sin();
            self.vertices.push(center + radial * self.params.radius);
            self.normals.push(radial);
        }

        if !self.frames.is_empty() {
            let previous = base - edges as u32;
            for edge in 0..edges as u32 {
                let next = (edge + 1) % edges as u32;
                let (a, b) = (previous + edge, previous + next);
                let (c, d) = (base + edge, base + next);
                self.indices.extend_from_slice(&[a, c, b, b, c, d]);
            }
        }
        self.frames.push(RingFrame { normal });
    }

    pub fn params(&self) -> &TubeParams {
        &self.params
    }

    pub fn path(&self) -> &[Vector3<f32>] {
        &self.path
    }

    pub fn vertices(&self) -> &[Vector3<f32>] {
        &self.vertices
    }

    pub fn normals(&self) -> &[Vector3<f32>] {
        &self.normals
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn ring_count(&self) -> usize {
        self.frames.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Parallel-transports `normal` onto the plane perpendicular to `tangent`.
fn transport(normal: Vector3<f32>, tangent: Vector3<f32>) -> Vector3<f32> {
    let projected = normal - tangent * normal.dot(&tangent);
    if projected.norm() > EPSILON {
        projected.normalize()
    } else {
        perpendicular(tangent)
    }
}

fn perpendicular(tangent: Vector3<f32>) -> Vector3<f32> {
    let reference = if tangent.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    tangent.cross(&reference).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh() -> TubeMesh {
        TubeMesh::new(TubeParams::default())
    }

    #[test]
    fn single_point_has_no_geometry() {
        let mut tube = mesh();
        assert!(tube.push(Vector3::zeros()));
        assert!(tube.is_empty());
        assert_eq!(tube.ring_count(), 0);
    }

    #[test]
    fn straight_path_has_one_ring_per_point() {
        let tube = TubeMesh::from_path(
            TubeParams::default(),
            (0..4).map(|i| Vector3::new(0.0, 0.0, -(i as f32) * 0.1)),
        );

        assert_eq!(tube.ring_count(), 4);
        assert_eq!(tube.vertices().len(), 4 * 12);
        assert_eq!(tube.triangle_count(), 3 * 2 * 12);
        for (vertex, normal) in tube.vertices().iter().zip(tube.normals()) {
            assert!((normal.norm() - 1.0).abs() < 1e-5);
            assert!(((vertex.x.powi(2) + vertex.y.powi(2)).sqrt() - 0.05).abs() < 1e-5);
        }
    }

    #[test]
    fn sharp_turn_is_rounded_in_twelve_degree_steps() {
        let tube = TubeMesh::from_path(
            TubeParams::default(),
            [
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(1.0, 1.0, 0.0),
            ],
        );

        // 90 degrees needs ceil(90 / 12) = 8 steps, i.e. 9 rings at the joint.
        assert_eq!(tube.ring_count(), 1 + 9 + 1);
    }

    #[test]
    fn gentle_turn_uses_a_single_mitred_ring() {
        let tube = TubeMesh::from_path(
            TubeParams::default(),
            [
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(2.0, 0.1, 0.0),
            ],
        );
        assert_eq!(tube.ring_count(), 3);
    }

    #[test]
    fn appending_leaves_the_committed_prefix_untouched() {
        let mut tube = mesh();
        for point in [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.2, 0.0, -0.1),
            Vector3::new(0.3, 0.2, -0.3),
        ] {
            tube.push(point);
        }
        let edges = tube.params().edges;
        let committed_vertices = tube.vertices()[..tube.vertices().len() - edges].to_vec();
        let committed_indices = tube.indices()[..tube.indices().len() - 6 * edges].to_vec();

        tube.push(Vector3::new(0.1, 0.5, -0.6));

        assert_eq!(&tube.vertices()[..committed_vertices.len()], &committed_vertices[..]);
        assert_eq!(&tube.indices()[..committed_indices.len()], &committed_indices[..]);
    }

    #[test]
    fn duplicate_points_add_no_geometry() {
        let mut tube = mesh();
        tube.push(Vector3::zeros());
        tube.push(Vector3::new(0.0, 0.0, -0.5));
        let rings = tube.ring_count();

        assert!(!tube.push(Vector3::new(0.0, 0.0, -0.5)));
        assert_eq!(tube.ring_count(), rings);
        assert_eq!(tube.path().len(), 2);
    }

    #[test]
    fn reversal_does_not_produce_nan_vertices() {
        let tube = TubeMesh::from_path(
            TubeParams::default(),
            [
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(0.0, 0.0, 0.0),
            ],
        );
        assert!(tube.vertices().iter().all(|v| v.iter().all(|c| c.is_finite())));
        assert!(tube.ring_count() > 3);
    }
}
