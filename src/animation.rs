// animation.rs - presentation-only interpolation
//
// The viewer commits model values immediately. These descriptors let a host
// show a smooth transition on top without the viewer ever reading them back.

use crate::viewport::Rect;

/// Duration of an animated zoom reset, in seconds.
pub const RESET_ZOOM_DURATION: f64 = 0.25;

/// Ease-in-ease-out on `t` in `[0, 1]`.
fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn progress(elapsed: f64, duration: f64) -> f64 {
    if duration <= 0.0 {
        1.0
    } else {
        ease_in_out(elapsed / duration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FovAnimation {
    pub from: f64,
    pub to: f64,
    pub duration: f64,
}

impl FovAnimation {
    /// Value to display `elapsed` seconds after the animation started.
    pub fn sample(&self, elapsed: f64) -> f64 {
        self.from + (self.to - self.from) * progress(elapsed, self.duration)
    }

    pub fn is_finished(&self, elapsed: f64) -> bool {
        elapsed >= self.duration
    }
}

/// Animated move of the viewer's frame, e.g. when filling the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransition {
    pub from: Rect,
    pub to: Rect,
    pub duration: f64,
}

impl FrameTransition {
    pub fn sample(&self, elapsed: f64) -> Rect {
        let t = progress(elapsed, self.duration);
        let lerp = |a: f64, b: f64| a + (b - a) * t;
        Rect {
            x: lerp(self.from.x, self.to.x),
            y: lerp(self.from.y, self.to.y),
            width: lerp(self.from.width, self.to.width),
            height: lerp(self.from.height, self.to.height),
        }
    }

    pub fn is_finished(&self, elapsed: f64) -> bool {
        elapsed >= self.duration
    }
}
