// zoom.rs - pinch-driven horizontal field of view

use crate::animation::{FovAnimation, RESET_ZOOM_DURATION};
use crate::gesture::{GesturePhase, PinchEvent};
use crate::viewport::BENCHMARK_FOV;

/// Fully zoomed-in FoV as a fraction of the default.
pub const MIN_FOV_RATIO: f64 = 0.75;

/// Camera FoV bounded to `[min_fov, default_fov]`.
///
/// Pinch scale reported by the platform restarts at 1 for every gesture and
/// grows non-linearly, so the controller remembers the scale of the last
/// accepted update and hands it back when the next pinch begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomController {
    current_fov: f64,
    default_fov: f64,
    last_scale: f64,
    pinch_rate: f64,
}

impl ZoomController {
    pub fn new(default_fov: f64, pinch_rate: f32) -> Self {
        Self {
            current_fov: default_fov,
            default_fov,
            last_scale: 1.0,
            pinch_rate: pinch_rate as f64,
        }
    }

    pub fn current_fov(&self) -> f64 {
        self.current_fov
    }

    pub fn default_fov(&self) -> f64 {
        self.default_fov
    }

    pub fn min_fov(&self) -> f64 {
        self.default_fov * MIN_FOV_RATIO
    }

    pub fn last_scale(&self) -> f64 {
        self.last_scale
    }

    pub fn set_pinch_rate(&mut self, pinch_rate: f32) {
        self.pinch_rate = pinch_rate as f64;
    }

    /// Replace the default FoV. The current FoV is left alone until the
    /// caller resets; the viewer always does so right after.
    pub fn set_default_fov(&mut self, default_fov: f64) {
        self.default_fov = default_fov;
    }

    /// Scale to rebase the recognizer to when a pinch begins.
    pub fn begin_pinch(&self) -> f64 {
        self.last_scale
    }

    /// Apply one pinch update. Returns the new FoV if it was accepted.
    ///
    /// Out-of-range candidates are dropped rather than clamped, so the zoom
    /// never pins itself to a bound and the user doesn't have to overshoot
    /// to move away from it again.
    pub fn pinch_changed(&mut self, scale: f64, velocity: f64) -> Option<f64> {
        let candidate = self.current_fov - velocity / self.pinch_rate;
        if candidate <= self.default_fov && candidate >= self.min_fov() {
            self.current_fov = candidate;
            self.last_scale = if scale < 1.0 { 1.0 } else { scale };
            Some(candidate)
        } else {
            log::trace!(
                "Rejected pinch fov {:.3} outside [{:.3}, {:.3}]",
                candidate,
                self.min_fov(),
                self.default_fov
            );
            None
        }
    }

    /// Returns the scale to rebase to on `Began`, the accepted FoV on
    /// `Changed`, and nothing otherwise.
    pub fn handle(&mut self, event: PinchEvent) -> PinchOutcome {
        match event.phase {
            GesturePhase::Began => PinchOutcome::Rebase(self.begin_pinch()),
            GesturePhase::Changed => match self.pinch_changed(event.scale, event.velocity) {
                Some(fov) => PinchOutcome::Zoomed(fov),
                None => PinchOutcome::Unchanged,
            },
            GesturePhase::Ended | GesturePhase::Cancelled => PinchOutcome::Unchanged,
        }
    }

    /// Snap back to the default FoV and forget the pinch scale.
    ///
    /// Does nothing when already at the default. Otherwise the model changes
    /// right away; the returned animation, if any, is for display only.
    pub fn reset(&mut self, animate: bool) -> Option<ResetOutcome> {
        if self.current_fov == self.default_fov {
            return None;
        }

        let animation = animate.then(|| FovAnimation {
            from: self.current_fov,
            to: self.default_fov,
            duration: RESET_ZOOM_DURATION,
        });

        log::debug!(
            "Reset zoom {:.3} -> {:.3} (animated: {})",
            self.current_fov,
            self.default_fov,
            animate
        );
        self.current_fov = self.default_fov;
        self.last_scale = 1.0;

        Some(ResetOutcome {
            fov: self.default_fov,
            animation,
        })
    }
}

impl Default for ZoomController {
    fn default() -> Self {
        Self::new(BENCHMARK_FOV, 10.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PinchOutcome {
    Rebase(f64),
    Zoomed(f64),
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResetOutcome {
    pub fov: f64,
    pub animation: Option<FovAnimation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed(scale: f64, velocity: f64) -> PinchEvent {
        PinchEvent {
            phase: GesturePhase::Changed,
            scale,
            velocity,
        }
    }

    #[test]
    fn accepted_pinch_commits_fov_and_scale() {
        let mut zoom = ZoomController::new(100.0, 10.0);
        assert_eq!(zoom.min_fov(), 75.0);

        assert_eq!(zoom.pinch_changed(1.8, 50.0), Some(95.0));
        assert_eq!(zoom.current_fov(), 95.0);
        assert_eq!(zoom.last_scale(), 1.8);
    }

    #[test]
    fn shrinking_scale_is_floored_at_one() {
        let mut zoom = ZoomController::new(100.0, 10.0);
        zoom.pinch_changed(2.0, 100.0);
        assert_eq!(zoom.pinch_changed(0.4, -20.0), Some(92.0));
        assert_eq!(zoom.last_scale(), 1.0);
    }

    #[test]
    fn out_of_range_candidate_changes_nothing() {
        let mut zoom = ZoomController::new(100.0, 10.0);
        zoom.pinch_changed(1.5, 200.0);
        let before = zoom;

        // past the default
        assert_eq!(zoom.pinch_changed(3.0, -300.0), None);
        assert_eq!(zoom, before);
        // past the minimum
        assert_eq!(zoom.pinch_changed(3.0, 100.0), None);
        assert_eq!(zoom.current_fov().to_bits(), before.current_fov().to_bits());
        assert_eq!(zoom.last_scale().to_bits(), before.last_scale().to_bits());
    }

    #[test]
    fn bounds_are_inclusive() {
        let mut zoom = ZoomController::new(100.0, 10.0);
        assert_eq!(zoom.pinch_changed(2.0, 250.0), Some(75.0));
        assert_eq!(zoom.pinch_changed(1.0, -250.0), Some(100.0));
    }

    #[test]
    fn fov_stays_in_range_over_a_long_sequence() {
        let mut zoom = ZoomController::new(80.0, 10.0);
        let velocities = [37.0, 91.0, -12.0, 150.0, -400.0, 60.0, 60.0, 60.0, -5.0, 1e6, -1e6];
        for (i, v) in velocities.iter().enumerate() {
            zoom.handle(changed(1.0 + i as f64 * 0.3, *v));
            assert!(zoom.current_fov() >= zoom.min_fov());
            assert!(zoom.current_fov() <= zoom.default_fov());
        }
    }

    #[test]
    fn began_rebases_to_last_scale() {
        let mut zoom = ZoomController::new(100.0, 10.0);
        zoom.pinch_changed(2.5, 10.0);
        let began = PinchEvent {
            phase: GesturePhase::Began,
            scale: 1.0,
            velocity: 0.0,
        };
        assert_eq!(zoom.handle(began), PinchOutcome::Rebase(2.5));
        let ended = PinchEvent {
            phase: GesturePhase::Ended,
            ..began
        };
        let before = zoom;
        assert_eq!(zoom.handle(ended), PinchOutcome::Unchanged);
        assert_eq!(zoom, before);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut zoom = ZoomController::new(100.0, 10.0);
        zoom.pinch_changed(2.0, 120.0);

        let first = zoom.reset(true).unwrap();
        assert_eq!(first.fov, 100.0);
        assert_eq!(
            first.animation,
            Some(FovAnimation {
                from: 88.0,
                to: 100.0,
                duration: 0.25
            })
        );
        assert_eq!(zoom.current_fov(), 100.0);
        assert_eq!(zoom.last_scale(), 1.0);

        let after_first = zoom;
        assert_eq!(zoom.reset(true), None);
        assert_eq!(zoom, after_first);
    }

    #[test]
    fn unanimated_reset_has_no_animation() {
        let mut zoom = ZoomController::new(100.0, 10.0);
        zoom.pinch_changed(2.0, 120.0);
        let outcome = zoom.reset(false).unwrap();
        assert_eq!(outcome.animation, None);
        assert_eq!(zoom.current_fov(), 100.0);
    }

    #[test]
    fn reset_at_default_keeps_last_scale() {
        let mut zoom = ZoomController::new(100.0, 10.0);
        zoom.pinch_changed(1.7, 50.0);
        zoom.pinch_changed(1.9, -50.0);
        assert_eq!(zoom.current_fov(), 100.0);
        assert_eq!(zoom.reset(false), None);
        assert_eq!(zoom.last_scale(), 1.9);
    }
}
