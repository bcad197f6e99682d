// viewport.rs - frame geometry and the aspect-driven default field of view

/// Aspect ratio at which the default horizontal FoV is exactly 100°.
pub const BENCHMARK_ASPECT: f64 = 414.0 / 300.0;
/// Default horizontal FoV at the benchmark aspect, in degrees.
pub const BENCHMARK_FOV: f64 = 100.0;
/// Bounds of `aspect / BENCHMARK_ASPECT`, found by eye.
pub const FOV_SCALE_MIN: f64 = 0.35;
pub const FOV_SCALE_MAX: f64 = 1.45;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }
}

/// View frame in the host's coordinate space (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Default (fully zoomed-out) horizontal FoV for a `width` x `height` view.
///
/// Wider views get a wider FoV so the image keeps roughly the same framing.
pub fn default_fov_for(width: f64, height: f64) -> f64 {
    let ratio = width / height;
    // max/min rather than clamp: a degenerate 0x0 frame lands on the lower bound
    let scale = FOV_SCALE_MIN.max(ratio / BENCHMARK_ASPECT).min(FOV_SCALE_MAX);
    BENCHMARK_FOV * scale
}

/// Rectangle that covers `screen` while keeping `frame`'s aspect ratio.
///
/// The overflowing axis is centered, so the result may start at a negative
/// coordinate; the host is expected to clip to its bounds.
pub fn full_screen_rect(frame: Rect, screen: Size) -> Rect {
    let scale = frame.width / frame.height;
    let screen_ratio = screen.aspect();
    if scale >= screen_ratio {
        // wide frame: match the screen height, overflow horizontally
        let height = screen.height;
        let width = height * scale;
        Rect::new(-(width - screen.width) / 2.0, 0.0, width, height)
    } else {
        // narrow frame: match the screen width, overflow vertically
        let width = screen.width;
        let height = width / scale;
        Rect::new(0.0, -(height - screen.height) / 2.0, width, height)
    }
}

/// Tracks the viewer's frame and whether it has been laid out before.
#[derive(Debug, Clone, Copy)]
pub struct ViewportAdapter {
    frame: Rect,
    laid_out: bool,
}

impl ViewportAdapter {
    pub fn new(frame: Rect) -> Self {
        Self {
            frame,
            laid_out: false,
        }
    }

    pub fn frame(&self) -> Rect {
        self.frame
    }

    /// Record a new frame. Returns the new default FoV and whether the zoom
    /// reset that follows should be animated (never on the first layout).
    pub fn layout(&mut self, frame: Rect) -> (f64, bool) {
        self.frame = frame;
        let animate = self.laid_out;
        self.laid_out = true;
        (default_fov_for(frame.width, frame.height), animate)
    }
}
