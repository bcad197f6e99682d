// capability.rs - what the viewer needs from its host
//
// The host owns the sensor, the gesture recognizers and the scene graph. The
// viewer only sees them through these traits, all driven from one thread.

use crate::animation::FovAnimation;
use crate::gesture::GestureEvent;
use crate::sampler::OrientationSample;
use glam::Quat;

/// Device attitude provider (gyroscope / device motion).
pub trait OrientationSource {
    /// Checked once per tick; `false` puts the viewer in pan/pinch-only mode.
    fn is_available(&self) -> bool;

    /// Next pending sample, or `None` when drained.
    fn next_sample(&mut self) -> Option<OrientationSample>;
}

/// Pan and pinch recognizers.
pub trait GestureSource {
    fn next_event(&mut self) -> Option<GestureEvent>;

    /// Overwrite the pinch recognizer's running scale.
    ///
    /// Called on pinch `Began` so that a new gesture continues from the last
    /// committed scale instead of restarting at 1.
    fn rebase_pinch_scale(&mut self, scale: f64);
}

/// How a field-of-view write reaches the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    /// Show the value on the next frame.
    Immediate,
    /// Interpolate on screen; the written value is already authoritative.
    Eased(FovAnimation),
}

/// Camera node in the host's scene.
pub trait CameraSink {
    /// Per-tick orientation write. Must not be animated.
    fn set_orientation(&mut self, orientation: Quat);

    fn set_fov(&mut self, fov: f64, transition: Transition);
}

/// Sphere material that displays the panorama.
pub trait SphereSurface {
    type Image;

    fn set_image(&mut self, image: Self::Image);
}
