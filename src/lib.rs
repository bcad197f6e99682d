// lib.rs - panorama camera core
//
// An equirectangular image is mapped on the inside of a sphere and looked at
// from its centre. Device attitude, accumulated drags and pinch zoom are
// combined here into one camera orientation and one horizontal FoV; the host
// supplies the sensor, the gesture recognizers and the scene through the
// traits in `capability`.

pub mod animation;
pub mod capability;
pub mod composer;
pub mod config;
pub mod error;
pub mod gesture;
pub mod mesh;
pub mod pan;
pub mod panorama;
pub mod sampler;
pub mod viewport;
pub mod zoom;

pub use animation::{FovAnimation, FrameTransition};
pub use capability::{CameraSink, GestureSource, OrientationSource, SphereSurface, Transition};
pub use config::PanoConfiguration;
pub use error::{PanoError, Result};
pub use gesture::{GestureEvent, GesturePhase, PanEvent, PinchEvent};
pub use panorama::PanoramaViewer;
pub use sampler::OrientationSample;
pub use viewport::{Rect, Size};
