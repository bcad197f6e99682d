// gesture.rs - recognized gesture events as consumed by the viewer

use glam::Vec2;

/// Lifecycle of a continuous touch gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Began,
    Changed,
    Ended,
    /// Treated like `Ended`.
    Cancelled,
}

impl GesturePhase {
    pub fn is_active(self) -> bool {
        matches!(self, GesturePhase::Began | GesturePhase::Changed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanEvent {
    pub phase: GesturePhase,
    /// Total translation since the gesture began, in view points.
    pub translation: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchEvent {
    pub phase: GesturePhase,
    /// Recognizer scale, starting from whatever it was rebased to on `Began`.
    pub scale: f64,
    /// Scale change per second. Positive while spreading the fingers.
    pub velocity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    Pan(PanEvent),
    Pinch(PinchEvent),
}

impl From<PanEvent> for GestureEvent {
    fn from(e: PanEvent) -> Self {
        GestureEvent::Pan(e)
    }
}

impl From<PinchEvent> for GestureEvent {
    fn from(e: PinchEvent) -> Self {
        GestureEvent::Pinch(e)
    }
}
