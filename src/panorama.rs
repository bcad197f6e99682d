// panorama.rs - the viewer: one instance per on-screen panorama

use crate::animation::FrameTransition;
use crate::capability::{CameraSink, GestureSource, OrientationSource, SphereSurface, Transition};
use crate::composer::compose;
use crate::config::{check_rate, PanoConfiguration};
use crate::error::Result;
use crate::gesture::{GestureEvent, GesturePhase, PanEvent, PinchEvent};
use crate::pan::PanAccumulator;
use crate::sampler::{base_orientation, rest_orientation, OrientationSample};
use crate::viewport::{full_screen_rect, Rect, Size, ViewportAdapter};
use crate::zoom::{PinchOutcome, ZoomController};
use glam::{Quat, Vec2};

/// Camera state of a panorama view and the glue to its host.
///
/// Everything here runs on the host's UI thread: sensor ticks and gesture
/// events arrive interleaved on the same queue, so no locking is involved.
pub struct PanoramaViewer<S: CameraSink> {
    config: PanoConfiguration,
    pan: PanAccumulator,
    zoom: ZoomController,
    viewport: ViewportAdapter,
    orientation: Quat,
    sensor_available: Option<bool>,
    sink: S,
}

impl<S: CameraSink> PanoramaViewer<S> {
    pub fn new(frame: Rect, config: PanoConfiguration, sink: S) -> Self {
        let mut viewer = Self {
            config,
            pan: PanAccumulator::new(config.initial_offset()),
            zoom: ZoomController::new(0.0, config.pinch_rate),
            viewport: ViewportAdapter::new(frame),
            orientation: Quat::IDENTITY,
            sensor_available: None,
            sink,
        };
        // first layout: the zoom reset it triggers is never animated
        viewer.resize(frame);
        viewer.write_orientation(rest_orientation());
        viewer
    }

    pub fn config(&self) -> &PanoConfiguration {
        &self.config
    }

    /// Rejects non-positive or non-finite rates, keeping the current one.
    pub fn set_pan_rate(&mut self, pan_rate: f32) -> Result<()> {
        check_rate("pan_rate", pan_rate)?;
        self.config.pan_rate = pan_rate;
        Ok(())
    }

    /// Rejects non-positive or non-finite rates, keeping the current one.
    pub fn set_pinch_rate(&mut self, pinch_rate: f32) -> Result<()> {
        check_rate("pinch_rate", pinch_rate)?;
        self.config.pinch_rate = pinch_rate;
        self.zoom.set_pinch_rate(pinch_rate);
        Ok(())
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn zoom(&self) -> &ZoomController {
        &self.zoom
    }

    pub fn pan_offset(&self) -> Vec2 {
        self.pan.offset()
    }

    /// Last orientation written to the camera.
    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    pub fn frame(&self) -> Rect {
        self.viewport.frame()
    }

    /// Swap the panorama texture. Camera and zoom are untouched.
    pub fn set_image(&mut self, image: S::Image)
    where
        S: SphereSurface,
    {
        self.sink.set_image(image);
    }

    /// Return the camera to the default FoV.
    pub fn reset_zoom(&mut self, animate: bool) {
        if let Some(outcome) = self.zoom.reset(animate) {
            let transition = match outcome.animation {
                Some(animation) => Transition::Eased(animation),
                None => Transition::Immediate,
            };
            self.sink.set_fov(outcome.fov, transition);
        }
    }

    /// New frame from the host's layout.
    pub fn resize(&mut self, frame: Rect) {
        let (default_fov, animate) = self.viewport.layout(frame);
        log::debug!(
            "Viewer frame {}x{} at ({}, {}), default fov {:.3}",
            frame.width,
            frame.height,
            frame.x,
            frame.y,
            default_fov
        );
        self.zoom.set_default_fov(default_fov);
        self.reset_zoom(animate);
    }

    /// Grow the frame to cover `screen`, keeping its aspect ratio.
    ///
    /// The new frame is applied at once; the returned transition tells the
    /// host how to animate its geometry over `duration` seconds.
    pub fn full_screen_transition(&mut self, duration: f64, screen: Size) -> FrameTransition {
        let from = self.viewport.frame();
        let to = full_screen_rect(from, screen);
        self.resize(to);
        FrameTransition { from, to, duration }
    }

    /// One sensor tick: consume pending samples and update the camera.
    ///
    /// Without a sensor the camera is still recomposed from the upright rest
    /// pose so that dragging keeps working.
    pub fn tick<O: OrientationSource + ?Sized>(&mut self, source: &mut O) {
        let available = source.is_available();
        if self.sensor_available != Some(available) {
            if !available {
                log::info!("No orientation sensor, falling back to drag-only camera");
            }
            self.sensor_available = Some(available);
        }

        if available {
            while let Some(sample) = source.next_sample() {
                self.apply_sample(sample);
            }
        } else {
            self.write_orientation(rest_orientation());
        }
    }

    pub fn apply_sample(&mut self, sample: OrientationSample) {
        self.write_orientation(base_orientation(sample));
    }

    /// Drain the host's recognizers.
    pub fn pump_gestures<G: GestureSource + ?Sized>(&mut self, source: &mut G) {
        while let Some(event) = source.next_event() {
            match event {
                GestureEvent::Pan(e) => self.handle_pan(e.phase, e.translation),
                GestureEvent::Pinch(e) => {
                    if let Some(scale) = self.handle_pinch(e) {
                        source.rebase_pinch_scale(scale);
                    }
                }
            }
        }
    }

    pub fn handle_pan(&mut self, phase: GesturePhase, translation: Vec2) {
        self.pan.handle(PanEvent { phase, translation });
    }

    /// Returns the scale the recognizer must be rebased to, on `Began`.
    pub fn handle_pinch(&mut self, event: PinchEvent) -> Option<f64> {
        match self.zoom.handle(event) {
            PinchOutcome::Rebase(scale) => Some(scale),
            PinchOutcome::Zoomed(fov) => {
                self.sink.set_fov(fov, Transition::Immediate);
                None
            }
            PinchOutcome::Unchanged => None,
        }
    }

    fn write_orientation(&mut self, base: Quat) {
        self.orientation = compose(base, self.pan.offset(), self.config.pan_rate);
        self.sink.set_orientation(self.orientation);
    }
}
