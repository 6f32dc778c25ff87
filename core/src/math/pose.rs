use nalgebra::{Isometry3, Matrix3, Matrix4, Rotation3, Translation3, UnitQuaternion, Vector3, Vector4};

/// World transform of the AR camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    transform: Matrix4<f32>,
}

impl CameraPose {
    /// Wraps a rigid homogeneous transform as delivered by the tracking session.
    pub fn from_transform(transform: Matrix4<f32>) -> Self {
        Self { transform }
    }

    pub fn from_parts(position: Vector3<f32>, orientation: UnitQuaternion<f32>) -> Self {
        let isometry = Isometry3::from_parts(Translation3::from(position), orientation);
        Self {
            transform: isometry.to_homogeneous(),
        }
    }

    pub fn identity() -> Self {
        Self {
            transform: Matrix4::identity(),
        }
    }

    pub fn transform(&self) -> &Matrix4<f32> {
        &self.transform
    }

    pub fn position(&self) -> Vector3<f32> {
        self.transform.fixed_view::<3, 1>(0, 3).into_owned()
    }

    pub fn orientation(&self) -> UnitQuaternion<f32> {
        let linear: Matrix3<f32> = self.transform.fixed_view::<3, 3>(0, 0).into_owned();
        UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(linear))
    }

    /// Point `distance` units along the camera's local -Z axis, in homogeneous coordinates.
    pub fn point_ahead(&self, distance: f32) -> Vector3<f32> {
        let world = self.transform * Vector4::new(0.0, 0.0, -distance, 1.0);
        Vector3::new(world.x, world.y, world.z)
    }

    /// Camera position translated `distance` units along its orientation's forward vector.
    pub fn placement_ahead(&self, distance: f32) -> Vector3<f32> {
        self.position() + self.orientation() * Vector3::new(0.0, 0.0, -distance)
    }
}

impl Default for CameraPose {
    fn default() -> Self {
        Self::identity()
    }
}

/// One render-frame callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    pub pose: CameraPose,
    pub time: f64,
}

impl CameraFrame {
    pub fn new(pose: CameraPose, time: f64) -> Self {
        Self { pose, time }
    }
}
