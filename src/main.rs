// main.rs - desktop demo of the panorama camera: a viewer strip with menu and status bar
//
// Mouse drag stands in for the pan gesture, the wheel / touchpad magnify for
// pinch, and the arrow keys tilt a simulated phone held upright.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod host;
mod i18n;
mod loader;
mod renderer;

use host::{DesktopGestures, SceneState, SimulatedMotion};
use loader::{start_load_image, LoadResult, LoadedImage};
use pano_view::animation::FrameTransition;
use pano_view::composer::look_degrees;
use pano_view::{OrientationSource, PanoConfiguration, PanoramaViewer, Rect, Size};
use renderer::Renderer;

use glam::Vec2;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::Instant;
use winit::{
    dpi::{LogicalSize, PhysicalSize},
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::{Window, WindowBuilder},
};

/// Height of the viewer strip, in logical pixels.
const STRIP_HEIGHT: f64 = 300.0;
/// Seconds taken by fill-screen / restore transitions.
const FILL_DURATION: f64 = 0.3;

#[derive(Debug, PartialEq)]
struct DemoArgs {
    config_path: PathBuf,
    lang: String,
    motion: bool,
    images: Vec<PathBuf>,
}

impl DemoArgs {
    fn parse(args: Vec<String>, config_env: Option<String>) -> Self {
        let lang = i18n::resolve_lang(&args);
        let mut config_path = config_env
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("assets").join("pano.json"));
        let mut motion = true;
        let mut images = Vec::new();

        let mut it = args.into_iter();
        while let Some(a) = it.next() {
            match a.as_str() {
                "--config" => {
                    if let Some(v) = it.next() {
                        config_path = PathBuf::from(v);
                    }
                }
                "--lang" => {
                    it.next();
                }
                "--no-motion" => motion = false,
                _ => images.push(PathBuf::from(a)),
            }
        }

        Self {
            config_path,
            lang,
            motion,
            images,
        }
    }
}

/// Viewer strip across the middle of the window.
fn strip_frame(size: PhysicalSize<u32>, scale_factor: f64) -> Rect {
    let width = size.width as f64;
    let height = size.height as f64;
    let strip = (STRIP_HEIGHT * scale_factor).min(height);
    Rect::new(0.0, (height - strip) / 2.0, width, strip)
}

/// Left-button release, which must reach the drag tracker even if egui takes it.
fn ends_drag(event: &WindowEvent) -> bool {
    matches!(
        event,
        WindowEvent::MouseInput {
            state: ElementState::Released,
            button: MouseButton::Left,
            ..
        }
    )
}

fn screen_size(window: &Window) -> Size {
    let size = window.inner_size();
    Size::new(size.width as f64, size.height as f64)
}

enum UiAction {
    OpenImage,
    NextImage,
    ResetZoom,
    FillScreen,
    RestoreFrame,
    SetLanguage(String),
    Exit,
}

struct DemoState {
    images: Vec<LoadedImage>,
    current: Option<usize>,
    loading: usize,
    filled: bool,
    frame_animation: Option<(FrameTransition, Instant)>,
    pan_rate: f32,
    pinch_rate: f32,
}

impl DemoState {
    fn new(config: &PanoConfiguration) -> Self {
        Self {
            images: Vec::new(),
            current: None,
            loading: 0,
            filled: false,
            frame_animation: None,
            pan_rate: config.pan_rate,
            pinch_rate: config.pinch_rate,
        }
    }

    /// Frame to draw at `now`: the model frame unless a transition is running.
    fn presented_frame(&mut self, model: Rect, now: Instant) -> Rect {
        if let Some((transition, start)) = self.frame_animation {
            let elapsed = now.duration_since(start).as_secs_f64();
            if !transition.is_finished(elapsed) {
                return transition.sample(elapsed);
            }
            self.frame_animation = None;
        }
        model
    }

    fn load(&mut self, path: PathBuf, tx: &Sender<LoadResult>) {
        self.loading += 1;
        start_load_image(path, tx.clone());
    }
}

struct Status {
    fov: f64,
    min_fov: f64,
    default_fov: f64,
    look: [f32; 2],
    motion: bool,
    loading: bool,
    image: Option<(usize, usize)>,
}

fn show_image(viewer: &mut PanoramaViewer<SceneState>, demo: &mut DemoState, index: usize) {
    if let Some(loaded) = demo.images.get(index) {
        log::info!("Showing {:?}", loaded.path);
        viewer.set_image(loaded.image.clone());
        demo.current = Some(index);
    }
}

fn relayout(viewer: &mut PanoramaViewer<SceneState>, demo: &mut DemoState, window: &Window) {
    let size = window.inner_size();
    if size.width == 0 || size.height == 0 {
        // minimized
        return;
    }
    viewer.resize(strip_frame(size, window.scale_factor()));
    if demo.filled {
        viewer.full_screen_transition(0.0, screen_size(window));
    }
    demo.frame_animation = None;
}

fn fill_screen(viewer: &mut PanoramaViewer<SceneState>, demo: &mut DemoState, window: &Window) {
    if demo.filled {
        return;
    }
    let transition = viewer.full_screen_transition(FILL_DURATION, screen_size(window));
    demo.frame_animation = Some((transition, Instant::now()));
    demo.filled = true;
}

fn restore_frame(viewer: &mut PanoramaViewer<SceneState>, demo: &mut DemoState, window: &Window) {
    if !demo.filled {
        return;
    }
    let now = Instant::now();
    let from = demo.presented_frame(viewer.frame(), now);
    let to = strip_frame(window.inner_size(), window.scale_factor());
    viewer.resize(to);
    demo.frame_animation = Some((
        FrameTransition {
            from,
            to,
            duration: FILL_DURATION,
        },
        now,
    ));
    demo.filled = false;
}

fn pick_image() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter(
            &i18n::tr("file.filter.images"),
            &["jpg", "jpeg", "png", "bmp", "webp"],
        )
        .pick_file()
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = DemoArgs::parse(
        std::env::args().skip(1).collect(),
        std::env::var("PANO_CONFIG").ok(),
    );
    i18n::init(args.lang.clone());

    let config = match PanoConfiguration::load_or_default(&args.config_path) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}; using defaults", e);
            PanoConfiguration::default()
        }
    };

    let event_loop = EventLoop::new();
    let window = match WindowBuilder::new()
        .with_title(i18n::tr("app.title"))
        .with_inner_size(LogicalSize::new(1280, 720))
        .build(&event_loop)
    {
        Ok(window) => Arc::new(window),
        Err(e) => {
            log::error!("Failed to create window: {}", e);
            return;
        }
    };

    let mut renderer = match pollster::block_on(Renderer::new(window.clone())) {
        Ok(renderer) => renderer,
        Err(e) => {
            log::error!("{}", e);
            return;
        }
    };

    let mut viewer = PanoramaViewer::new(
        strip_frame(window.inner_size(), window.scale_factor()),
        config,
        SceneState::new(),
    );
    let mut motion = SimulatedMotion::new(args.motion);
    let mut gestures = DesktopGestures::new();
    let mut demo = DemoState::new(&config);

    let (tx, rx): (Sender<LoadResult>, Receiver<LoadResult>) = channel();
    for path in args.images {
        demo.load(path, &tx);
    }

    let mut last_tick = Instant::now();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        while let Ok(result) = rx.try_recv() {
            demo.loading = demo.loading.saturating_sub(1);
            match result {
                Ok(loaded) => {
                    demo.images.push(loaded);
                    if demo.current.is_none() {
                        let last = demo.images.len() - 1;
                        show_image(&mut viewer, &mut demo, last);
                    }
                }
                Err(e) => log::error!(
                    "{}",
                    i18n::tr_with("error.load_image", &[("err", e.to_string())])
                ),
            }
        }

        match event {
            Event::WindowEvent { event, .. } => {
                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                if ends_drag(&event) {
                    // even when the release lands on a panel
                    gestures.mouse_button(false);
                }
                if response.consumed {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(new_size) => {
                        renderer.resize(new_size);
                        relayout(&mut viewer, &mut demo, &window);
                    }

                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        renderer.resize(*new_inner_size);
                        relayout(&mut viewer, &mut demo, &window);
                    }

                    WindowEvent::KeyboardInput { input, .. } => {
                        let pressed = input.state == ElementState::Pressed;
                        let held = if pressed { 1.0 } else { 0.0 };
                        match input.virtual_keycode {
                            Some(VirtualKeyCode::Left) => motion.input.x = held,
                            Some(VirtualKeyCode::Right) => motion.input.x = -held,
                            Some(VirtualKeyCode::Up) => motion.input.y = held,
                            Some(VirtualKeyCode::Down) => motion.input.y = -held,
                            Some(VirtualKeyCode::R) if pressed => viewer.reset_zoom(true),
                            Some(VirtualKeyCode::N) if pressed => {
                                if !demo.images.is_empty() {
                                    let next = demo.current.map_or(0, |i| (i + 1) % demo.images.len());
                                    show_image(&mut viewer, &mut demo, next);
                                }
                            }
                            Some(VirtualKeyCode::F) if pressed => {
                                if demo.filled {
                                    restore_frame(&mut viewer, &mut demo, &window);
                                } else {
                                    fill_screen(&mut viewer, &mut demo, &window);
                                }
                            }
                            Some(VirtualKeyCode::O) if pressed => {
                                if let Some(path) = pick_image() {
                                    demo.load(path, &tx);
                                }
                            }
                            _ => {}
                        }
                    }

                    WindowEvent::MouseInput {
                        state: ElementState::Pressed,
                        button: MouseButton::Left,
                        ..
                    } => {
                        gestures.mouse_button(true);
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        gestures.cursor_moved(Vec2::new(position.x as f32, position.y as f32));
                    }

                    WindowEvent::MouseWheel { delta, .. } => {
                        let lines = match delta {
                            MouseScrollDelta::LineDelta(_, y) => y,
                            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 20.0,
                        };
                        gestures.wheel(lines);
                    }

                    WindowEvent::TouchpadMagnify { delta, phase, .. } => {
                        gestures.magnify(delta, phase);
                    }

                    WindowEvent::DroppedFile(path) => {
                        demo.load(path, &tx);
                    }

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                let now = Instant::now();
                if let Some(image) = viewer.sink_mut().take_image() {
                    renderer.load_panorama(image);
                }
                let fov = viewer.sink_mut().presented_fov(now);
                let frame = demo.presented_frame(viewer.frame(), now);
                renderer.update_camera(viewer.sink().orientation(), fov, frame);

                let status = Status {
                    fov,
                    min_fov: viewer.zoom().min_fov(),
                    default_fov: viewer.zoom().default_fov(),
                    look: look_degrees(viewer.pan_offset(), viewer.config().pan_rate),
                    motion: motion.is_available(),
                    loading: demo.loading > 0,
                    image: demo.current.map(|i| (i + 1, demo.images.len())),
                };

                let mut actions = Vec::new();
                let (mut pan_rate, mut pinch_rate) = (demo.pan_rate, demo.pinch_rate);
                let render_result = renderer.render_with_ui(&window, |ctx| {
                    draw_ui(
                        ctx,
                        &status,
                        demo.filled,
                        &mut pan_rate,
                        &mut pinch_rate,
                        &mut actions,
                    );
                });

                if pan_rate != demo.pan_rate {
                    match viewer.set_pan_rate(pan_rate) {
                        Ok(()) => demo.pan_rate = pan_rate,
                        Err(e) => log::warn!("{}", e),
                    }
                }
                if pinch_rate != demo.pinch_rate {
                    match viewer.set_pinch_rate(pinch_rate) {
                        Ok(()) => demo.pinch_rate = pinch_rate,
                        Err(e) => log::warn!("{}", e),
                    }
                }

                for action in actions {
                    match action {
                        UiAction::OpenImage => {
                            if let Some(path) = pick_image() {
                                demo.load(path, &tx);
                            }
                        }
                        UiAction::NextImage => {
                            if !demo.images.is_empty() {
                                let next = demo.current.map_or(0, |i| (i + 1) % demo.images.len());
                                show_image(&mut viewer, &mut demo, next);
                            }
                        }
                        UiAction::ResetZoom => viewer.reset_zoom(true),
                        UiAction::FillScreen => fill_screen(&mut viewer, &mut demo, &window),
                        UiAction::RestoreFrame => restore_frame(&mut viewer, &mut demo, &window),
                        UiAction::SetLanguage(code) => {
                            i18n::init(code);
                            window.set_title(&i18n::tr("app.title"));
                        }
                        UiAction::Exit => *control_flow = ControlFlow::Exit,
                    }
                }

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => *control_flow = ControlFlow::Exit,
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }

            Event::MainEventsCleared => {
                let now = Instant::now();
                motion.advance(now.duration_since(last_tick).as_secs_f64());
                last_tick = now;

                viewer.pump_gestures(&mut gestures);
                viewer.tick(&mut motion);
                window.request_redraw();
            }

            _ => {}
        }
    });
}

fn draw_ui(
    ctx: &egui::Context,
    status: &Status,
    filled: bool,
    pan_rate: &mut f32,
    pinch_rate: &mut f32,
    actions: &mut Vec<UiAction>,
) {
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button(&i18n::tr("menu.file"), |ui| {
                if ui.button(&i18n::tr("menu.open_image")).clicked() {
                    ui.close_menu();
                    actions.push(UiAction::OpenImage);
                }
                if ui.button(&i18n::tr("menu.exit")).clicked() {
                    actions.push(UiAction::Exit);
                }
            });

            ui.menu_button(&i18n::tr("menu.view"), |ui| {
                if ui.button(&i18n::tr("view.reset_zoom")).clicked() {
                    actions.push(UiAction::ResetZoom);
                    ui.close_menu();
                }
                if ui.button(&i18n::tr("view.next_image")).clicked() {
                    actions.push(UiAction::NextImage);
                    ui.close_menu();
                }
                let (label, action) = if filled {
                    ("view.restore_frame", UiAction::RestoreFrame)
                } else {
                    ("view.fill_screen", UiAction::FillScreen)
                };
                if ui.button(&i18n::tr(label)).clicked() {
                    actions.push(action);
                    ui.close_menu();
                }

                ui.separator();
                ui.add(egui::Slider::new(pan_rate, 1.0..=20.0).text(i18n::tr("view.pan_rate")));
                ui.add(egui::Slider::new(pinch_rate, 2.0..=40.0).text(i18n::tr("view.pinch_rate")));
            });

            ui.menu_button(&i18n::tr("menu.language"), |ui| {
                let mut current = i18n::current_lang();
                for (code, name) in i18n::languages() {
                    if ui.radio_value(&mut current, code.clone(), name).clicked() {
                        actions.push(UiAction::SetLanguage(code));
                        ui.close_menu();
                    }
                }
            });
        });
    });

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if status.loading {
                ui.label(
                    egui::RichText::new(i18n::tr("status.loading_image"))
                        .color(egui::Color32::YELLOW),
                );
                ui.label("|");
            }

            match status.image {
                Some((index, count)) => ui.label(i18n::tr_with(
                    "status.images",
                    &[("index", index.to_string()), ("count", count.to_string())],
                )),
                None => ui.label(i18n::tr("status.no_image")),
            };
            ui.label("|");
            ui.label(i18n::tr_with(
                "status.fov",
                &[
                    ("fov", format!("{:.1}", status.fov)),
                    ("min", format!("{:.1}", status.min_fov)),
                    ("max", format!("{:.1}", status.default_fov)),
                ],
            ));
            ui.label("|");
            ui.label(i18n::tr_with(
                "status.look",
                &[
                    ("yaw", format!("{:.1}", status.look[0])),
                    ("pitch", format!("{:.1}", status.look[1])),
                ],
            ));
            ui.label("|");
            let sensor = if status.motion {
                egui::RichText::new(i18n::tr("status.sensor_on")).color(egui::Color32::GREEN)
            } else {
                egui::RichText::new(i18n::tr("status.sensor_off")).color(egui::Color32::LIGHT_RED)
            };
            ui.label(sensor);
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_flags_and_image_paths() {
        let parsed = DemoArgs::parse(
            args(&["--lang", "de", "a.jpg", "--no-motion", "--config", "c.json", "b.jpg"]),
            None,
        );
        assert_eq!(parsed.lang, "de");
        assert!(!parsed.motion);
        assert_eq!(parsed.config_path, PathBuf::from("c.json"));
        assert_eq!(parsed.images, vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg")]);
    }

    #[test]
    fn config_flag_beats_environment() {
        let from_env = DemoArgs::parse(args(&[]), Some("env.json".into()));
        assert_eq!(from_env.config_path, PathBuf::from("env.json"));
        assert!(from_env.motion);

        let from_flag = DemoArgs::parse(args(&["--config", "flag.json"]), Some("env.json".into()));
        assert_eq!(from_flag.config_path, PathBuf::from("flag.json"));
    }

    #[allow(deprecated)]
    fn left_button(state: ElementState) -> WindowEvent<'static> {
        WindowEvent::MouseInput {
            device_id: unsafe { DeviceId::dummy() },
            state,
            button: MouseButton::Left,
            modifiers: ModifiersState::empty(),
        }
    }

    #[test]
    fn only_left_release_ends_a_drag() {
        assert!(ends_drag(&left_button(ElementState::Released)));
        assert!(!ends_drag(&left_button(ElementState::Pressed)));
        assert!(!ends_drag(&WindowEvent::Focused(false)));
    }

    #[test]
    fn strip_is_centred_and_fits_short_windows() {
        let frame = strip_frame(PhysicalSize::new(1280, 720), 1.0);
        assert_eq!(frame, Rect::new(0.0, 210.0, 1280.0, 300.0));

        let hidpi = strip_frame(PhysicalSize::new(2560, 1440), 2.0);
        assert_eq!(hidpi, Rect::new(0.0, 420.0, 2560.0, 600.0));

        let short = strip_frame(PhysicalSize::new(800, 200), 1.0);
        assert_eq!(short, Rect::new(0.0, 0.0, 800.0, 200.0));
    }
}
