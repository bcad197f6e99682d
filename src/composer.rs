// composer.rs - sensor attitude + drag offset -> camera orientation

use glam::{Quat, Vec2, Vec3};

/// Apply the accumulated pan offset to a sensor-derived base orientation.
///
/// Tilt is applied in the base's local frame first, then the pan turns the
/// result about the world's vertical axis. Doing it the other way round lets
/// roll creep in as the user drags.
pub fn compose(base: Quat, offset: Vec2, pan_rate: f32) -> Quat {
    let y_radians = (offset.y / pan_rate).to_radians();
    let x_radians = (offset.x / pan_rate).to_radians();

    // up / down
    let tilt = Quat::from_axis_angle(Vec3::X, y_radians);
    let result = base * tilt;

    // left / right
    let pan = Quat::from_axis_angle(Vec3::Y, x_radians);
    pan * result
}

/// Look angles in degrees, `[yaw, pitch]`, represented by `offset`.
pub fn look_degrees(offset: Vec2, pan_rate: f32) -> [f32; 2] {
    (offset / pan_rate).to_array()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn some_base() -> Quat {
        Quat::from_euler(glam::EulerRot::YXZ, 0.4, -0.3, 0.15)
    }

    #[test]
    fn zero_offset_returns_base() {
        let base = some_base();
        assert!(compose(base, Vec2::ZERO, 5.0).abs_diff_eq(base, EPSILON));
    }

    #[test]
    fn offset_is_divided_by_pan_rate() {
        // 450 points at rate 5 is a 90° turn to the left
        let q = compose(Quat::IDENTITY, Vec2::new(450.0, 0.0), 5.0);
        let forward = q * Vec3::NEG_Z;
        assert!(forward.abs_diff_eq(Vec3::NEG_X, EPSILON), "{forward}");
    }

    #[test]
    fn tilt_is_local_and_pan_is_global() {
        let base = some_base();
        let offset = Vec2::new(120.0, -60.0);
        let expected = Quat::from_rotation_y(24.0f32.to_radians())
            * (base * Quat::from_rotation_x((-12.0f32).to_radians()));
        assert!(compose(base, offset, 5.0).abs_diff_eq(expected, EPSILON));
    }

    #[test]
    fn swapped_multiplication_order_differs() {
        let base = some_base();
        let offset = Vec2::new(120.0, -60.0);
        let tilt = Quat::from_rotation_x((offset.y / 5.0).to_radians());
        let pan = Quat::from_rotation_y((offset.x / 5.0).to_radians());

        let composed = compose(base, offset, 5.0);
        assert!(!composed.abs_diff_eq((tilt * base) * pan, 1e-3));
        assert!(!composed.abs_diff_eq(base * tilt * pan, 1e-3));
    }

    #[test]
    fn pure_tilt_and_pan_keep_the_horizon_level() {
        let q = compose(Quat::IDENTITY, Vec2::new(300.0, 100.0), 5.0);
        let right = q * Vec3::X;
        assert!(right.y.abs() < EPSILON, "roll crept in: {right}");
    }

    #[test]
    fn look_degrees_inverts_initial_look() {
        let offset = Vec2::new(906.0, 55.5);
        let [yaw, pitch] = look_degrees(offset, 5.0);
        assert!((yaw - 181.2).abs() < 1e-3);
        assert!((pitch - 11.1).abs() < 1e-3);
    }
}
