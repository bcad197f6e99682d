// sampler.rs - device attitude to scene camera frame

use glam::{Quat, Vec3};

/// Device attitude at one sensor tick, as a unit quaternion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationSample {
    pub quaternion: Quat,
}

impl OrientationSample {
    pub fn from_xyzw(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self {
            quaternion: Quat::from_xyzw(x, y, z, w),
        }
    }
}

impl Default for OrientationSample {
    /// Device lying flat, screen up.
    fn default() -> Self {
        Self {
            quaternion: Quat::IDENTITY,
        }
    }
}

/// -90° about +X.
///
/// The motion sensor's reference attitude is the device lying flat with the
/// screen up, while the scene camera's reference looks forward into the sphere.
pub fn sensor_correction() -> Quat {
    Quat::from_axis_angle(Vec3::X, (-90.0f32).to_radians())
}

/// Base orientation of a device held upright, looking forward into the sphere.
///
/// Used until the first sample arrives and whenever no sensor exists.
pub fn rest_orientation() -> Quat {
    Quat::IDENTITY
}

/// `correction ⊗ raw`
pub fn base_orientation(sample: OrientationSample) -> Quat {
    sensor_correction() * sample.quaternion
}
