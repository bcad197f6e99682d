// pan.rs - accumulated drag offsets

use crate::gesture::{GesturePhase, PanEvent};
use glam::Vec2;

/// Running look offset built from drag deltas.
///
/// Offsets compound across gestures: a new drag continues from wherever the
/// previous one left the view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanAccumulator {
    offset: Vec2,
    /// Raw translation of the active drag at its previous event.
    last: Vec2,
}

impl PanAccumulator {
    pub fn new(initial_offset: Vec2) -> Self {
        Self {
            offset: initial_offset,
            last: Vec2::ZERO,
        }
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn apply_delta(&mut self, dx: f32, dy: f32) {
        self.offset += Vec2::new(dx, dy);
    }

    pub fn handle(&mut self, event: PanEvent) {
        self.track(event.phase, event.translation);
    }

    /// Feed the recognizer's total translation for `phase`.
    pub fn track(&mut self, phase: GesturePhase, translation: Vec2) {
        if phase.is_active() {
            let delta = translation - self.last;
            self.apply_delta(delta.x, delta.y);
            self.last = translation;
        } else {
            self.last = Vec2::ZERO;
        }
    }
}

impl Default for PanAccumulator {
    fn default() -> Self {
        Self::new(Vec2::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deltas_are_additive() {
        let mut pan = PanAccumulator::new(Vec2::new(10.0, -4.0));
        pan.apply_delta(1.0, 2.0);
        pan.apply_delta(-3.0, 0.5);
        assert_eq!(pan.offset(), Vec2::new(8.0, -1.5));
    }

    #[test]
    fn split_gestures_match_one_uninterrupted_gesture() {
        let mut split = PanAccumulator::default();
        split.track(GesturePhase::Began, Vec2::new(1.0, 0.0));
        split.track(GesturePhase::Changed, Vec2::new(3.0, 0.0));
        split.track(GesturePhase::Ended, Vec2::new(3.0, 0.0));
        split.track(GesturePhase::Began, Vec2::new(3.0, 0.0));
        split.track(GesturePhase::Ended, Vec2::new(3.0, 0.0));

        let mut whole = PanAccumulator::default();
        whole.track(GesturePhase::Began, Vec2::new(1.0, 0.0));
        whole.track(GesturePhase::Changed, Vec2::new(3.0, 0.0));
        whole.track(GesturePhase::Changed, Vec2::new(6.0, 0.0));

        assert_eq!(split.offset().x, 6.0);
        assert_eq!(whole.offset().x, 6.0);
    }

    #[test]
    fn ending_a_gesture_keeps_the_offset() {
        let mut pan = PanAccumulator::new(Vec2::new(5.0, 5.0));
        pan.track(GesturePhase::Began, Vec2::new(2.0, 1.0));
        pan.track(GesturePhase::Changed, Vec2::new(4.0, -1.0));
        pan.track(GesturePhase::Cancelled, Vec2::new(4.0, -1.0));
        assert_eq!(pan.offset(), Vec2::new(9.0, 4.0));

        // the next drag is measured from zero, not from (4, -1)
        pan.track(GesturePhase::Began, Vec2::new(1.0, 1.0));
        assert_eq!(pan.offset(), Vec2::new(10.0, 5.0));
    }
}
