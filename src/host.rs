// host.rs - desktop stand-ins for the phone's motion sensor, recognizers and scene

use pano_view::animation::FovAnimation;
use pano_view::config::SENSOR_INTERVAL;
use pano_view::{
    CameraSink, GestureEvent, GesturePhase, GestureSource, OrientationSample, OrientationSource,
    PanEvent, PinchEvent, SphereSurface, Transition,
};

use glam::{Quat, Vec2};
use std::collections::VecDeque;
use std::time::Instant;
use winit::event::TouchPhase;

/// Degrees per second the arrow keys turn the simulated device.
const KEY_TURN_RATE: f32 = 45.0;
/// Pinch velocity produced by one notch of the mouse wheel.
const WHEEL_PINCH_VELOCITY: f64 = 15.0;

/// Gyroscope stand-in: the arrow keys turn a device held upright.
pub struct SimulatedMotion {
    available: bool,
    yaw: f32,
    pitch: f32,
    /// Held arrow keys, x = yaw direction, y = pitch direction.
    pub input: Vec2,
    pending: VecDeque<OrientationSample>,
    carry: f64,
}

impl SimulatedMotion {
    pub fn new(available: bool) -> Self {
        Self {
            available,
            yaw: 0.0,
            pitch: 0.0,
            input: Vec2::ZERO,
            pending: VecDeque::new(),
            carry: 0.0,
        }
    }

    /// Device attitude in the sensor's frame (Z up, flat = identity).
    fn attitude(&self) -> Quat {
        Quat::from_rotation_z(self.yaw.to_radians())
            * Quat::from_rotation_x((90.0 + self.pitch).to_radians())
    }

    /// Emit one sample per elapsed sensor interval.
    pub fn advance(&mut self, dt: f64) {
        if !self.available {
            return;
        }
        self.carry += dt;
        while self.carry >= SENSOR_INTERVAL {
            self.carry -= SENSOR_INTERVAL;
            let step = KEY_TURN_RATE * SENSOR_INTERVAL as f32;
            self.yaw += self.input.x * step;
            self.pitch = (self.pitch + self.input.y * step).clamp(-89.0, 89.0);
            self.pending.push_back(OrientationSample {
                quaternion: self.attitude(),
            });
        }
    }
}

impl OrientationSource for SimulatedMotion {
    fn is_available(&self) -> bool {
        self.available
    }

    fn next_sample(&mut self) -> Option<OrientationSample> {
        self.pending.pop_front()
    }
}

enum Pending {
    Pan(PanEvent),
    PinchBegan,
    PinchChanged { factor: f64, velocity: f64 },
    PinchEnded,
}

/// Turns mouse drags into pan gestures and wheel / touchpad magnify into
/// pinch gestures.
pub struct DesktopGestures {
    queue: VecDeque<Pending>,
    pressed: bool,
    drag_origin: Option<Vec2>,
    last_translation: Vec2,
    pinch_scale: f64,
    last_magnify: Option<Instant>,
}

impl DesktopGestures {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            pressed: false,
            drag_origin: None,
            last_translation: Vec2::ZERO,
            pinch_scale: 1.0,
            last_magnify: None,
        }
    }

    pub fn mouse_button(&mut self, pressed: bool) {
        self.pressed = pressed;
        if !pressed && self.drag_origin.take().is_some() {
            self.queue.push_back(Pending::Pan(PanEvent {
                phase: GesturePhase::Ended,
                translation: self.last_translation,
            }));
        }
    }

    pub fn cursor_moved(&mut self, position: Vec2) {
        if !self.pressed {
            return;
        }
        let (phase, translation) = match self.drag_origin {
            None => {
                self.drag_origin = Some(position);
                (GesturePhase::Began, Vec2::ZERO)
            }
            Some(origin) => (GesturePhase::Changed, position - origin),
        };
        self.last_translation = translation;
        self.queue
            .push_back(Pending::Pan(PanEvent { phase, translation }));
    }

    /// A mouse wheel notch is a whole pinch gesture of its own.
    pub fn wheel(&mut self, lines: f32) {
        if lines == 0.0 {
            return;
        }
        let velocity = lines as f64 * WHEEL_PINCH_VELOCITY;
        self.queue.push_back(Pending::PinchBegan);
        self.queue.push_back(Pending::PinchChanged {
            factor: 1.0 + lines as f64 * 0.1,
            velocity,
        });
        self.queue.push_back(Pending::PinchEnded);
    }

    pub fn magnify(&mut self, delta: f64, phase: TouchPhase) {
        let now = Instant::now();
        match phase {
            TouchPhase::Started => {
                self.last_magnify = Some(now);
                self.queue.push_back(Pending::PinchBegan);
            }
            TouchPhase::Moved => {
                let dt = self
                    .last_magnify
                    .map(|t| now.duration_since(t).as_secs_f64())
                    .unwrap_or(SENSOR_INTERVAL)
                    .max(1.0 / 240.0);
                self.last_magnify = Some(now);
                self.queue.push_back(Pending::PinchChanged {
                    factor: 1.0 + delta,
                    velocity: delta / dt,
                });
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                self.last_magnify = None;
                self.queue.push_back(Pending::PinchEnded);
            }
        }
    }

    fn pinch(&self, phase: GesturePhase, velocity: f64) -> GestureEvent {
        GestureEvent::Pinch(PinchEvent {
            phase,
            scale: self.pinch_scale,
            velocity,
        })
    }
}

impl GestureSource for DesktopGestures {
    fn next_event(&mut self) -> Option<GestureEvent> {
        // scale is resolved on dequeue so a rebase on `Began` applies to the
        // updates already queued behind it
        let event = match self.queue.pop_front()? {
            Pending::Pan(e) => GestureEvent::Pan(e),
            Pending::PinchBegan => {
                self.pinch_scale = 1.0;
                self.pinch(GesturePhase::Began, 0.0)
            }
            Pending::PinchChanged { factor, velocity } => {
                self.pinch_scale = (self.pinch_scale * factor).max(0.0);
                self.pinch(GesturePhase::Changed, velocity)
            }
            Pending::PinchEnded => self.pinch(GesturePhase::Ended, 0.0),
        };
        Some(event)
    }

    fn rebase_pinch_scale(&mut self, scale: f64) {
        self.pinch_scale = scale;
    }
}

/// Camera and material as the renderer sees them.
///
/// Holds the committed model values plus an optional FoV animation that
/// only affects what is drawn.
pub struct SceneState {
    orientation: Quat,
    fov: f64,
    animation: Option<(FovAnimation, Instant)>,
    pending_image: Option<image::RgbaImage>,
}

impl SceneState {
    pub fn new() -> Self {
        Self {
            orientation: Quat::IDENTITY,
            fov: 0.0,
            animation: None,
            pending_image: None,
        }
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    /// FoV to draw at `now`.
    pub fn presented_fov(&mut self, now: Instant) -> f64 {
        if let Some((animation, start)) = self.animation {
            let elapsed = now.duration_since(start).as_secs_f64();
            if !animation.is_finished(elapsed) {
                return animation.sample(elapsed);
            }
            self.animation = None;
        }
        self.fov
    }

    pub fn take_image(&mut self) -> Option<image::RgbaImage> {
        self.pending_image.take()
    }
}

impl CameraSink for SceneState {
    fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation;
    }

    fn set_fov(&mut self, fov: f64, transition: Transition) {
        self.fov = fov;
        self.animation = match transition {
            Transition::Immediate => None,
            Transition::Eased(animation) => Some((animation, Instant::now())),
        };
    }
}

impl SphereSurface for SceneState {
    type Image = image::RgbaImage;

    fn set_image(&mut self, image: Self::Image) {
        self.pending_image = Some(image);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motion_emits_one_sample_per_interval() {
        let mut motion = SimulatedMotion::new(true);
        motion.advance(SENSOR_INTERVAL * 3.5);
        let mut count = 0;
        while motion.next_sample().is_some() {
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn unavailable_motion_stays_silent() {
        let mut motion = SimulatedMotion::new(false);
        motion.advance(1.0);
        assert!(!motion.is_available());
        assert!(motion.next_sample().is_none());
    }

    #[test]
    fn upright_rest_attitude_cancels_sensor_correction() {
        let motion = SimulatedMotion::new(true);
        let base = pano_view::sampler::base_orientation(OrientationSample {
            quaternion: motion.attitude(),
        });
        assert!(base.abs_diff_eq(Quat::IDENTITY, 1e-6));
    }

    #[test]
    fn drag_produces_began_changed_ended() {
        let mut gestures = DesktopGestures::new();
        gestures.mouse_button(true);
        gestures.cursor_moved(Vec2::new(10.0, 10.0));
        gestures.cursor_moved(Vec2::new(14.0, 7.0));
        gestures.mouse_button(false);

        let phases: Vec<_> = std::iter::from_fn(|| gestures.next_event())
            .map(|e| match e {
                GestureEvent::Pan(p) => (p.phase, p.translation),
                GestureEvent::Pinch(_) => panic!("unexpected pinch"),
            })
            .collect();
        assert_eq!(
            phases,
            vec![
                (GesturePhase::Began, Vec2::ZERO),
                (GesturePhase::Changed, Vec2::new(4.0, -3.0)),
                (GesturePhase::Ended, Vec2::new(4.0, -3.0)),
            ]
        );
    }

    #[test]
    fn release_stops_tracking_the_cursor() {
        let mut gestures = DesktopGestures::new();
        gestures.mouse_button(true);
        gestures.cursor_moved(Vec2::new(0.0, 0.0));
        gestures.cursor_moved(Vec2::new(5.0, 0.0));
        gestures.mouse_button(false);
        // a second release for the same drag adds nothing
        gestures.mouse_button(false);
        gestures.cursor_moved(Vec2::new(50.0, 50.0));

        let phases: Vec<_> = std::iter::from_fn(|| gestures.next_event())
            .filter_map(|e| match e {
                GestureEvent::Pan(p) => Some(p.phase),
                GestureEvent::Pinch(_) => None,
            })
            .collect();
        assert_eq!(
            phases,
            vec![GesturePhase::Began, GesturePhase::Changed, GesturePhase::Ended]
        );
    }

    #[test]
    fn rebase_applies_to_queued_updates() {
        let mut gestures = DesktopGestures::new();
        gestures.wheel(1.0);

        let began = gestures.next_event().unwrap();
        assert!(matches!(
            began,
            GestureEvent::Pinch(PinchEvent {
                phase: GesturePhase::Began,
                ..
            })
        ));
        gestures.rebase_pinch_scale(2.0);

        match gestures.next_event().unwrap() {
            GestureEvent::Pinch(p) => {
                assert_eq!(p.phase, GesturePhase::Changed);
                assert!((p.scale - 2.2).abs() < 1e-9);
                assert_eq!(p.velocity, WHEEL_PINCH_VELOCITY);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn eased_fov_is_presented_then_settles() {
        let mut scene = SceneState::new();
        scene.set_fov(
            100.0,
            Transition::Eased(FovAnimation {
                from: 80.0,
                to: 100.0,
                duration: 0.25,
            }),
        );
        let start = scene.animation.unwrap().1;
        assert_eq!(scene.presented_fov(start), 80.0);
        assert_eq!(
            scene.presented_fov(start + std::time::Duration::from_secs(1)),
            100.0
        );
        assert!(scene.animation.is_none());
        assert_eq!(scene.fov, 100.0);
    }
}
