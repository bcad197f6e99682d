// renderer.rs - draws the panorama sphere into the viewer's frame, egui on top

use glam::{Mat4, Quat, Vec4};
use image::{GenericImage, Rgba, RgbaImage};
use pano_view::config::{SPHERE_RADIUS, SPHERE_SEGMENTS};
use pano_view::mesh::{build_interior_sphere, SphereVertex};
use pano_view::Rect;
use thiserror::Error;
use wgpu::util::DeviceExt;
use winit::window::Window;

const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = SPHERE_RADIUS * 4.0;

#[derive(Error, Debug)]
pub enum RendererError {
    #[error("Failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("No compatible graphics adapter")]
    NoAdapter,
    #[error("Failed to open graphics device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

/// Vertical FoV (radians) for a horizontal FoV in degrees at `aspect`.
pub fn vertical_fov(horizontal_deg: f64, aspect: f64) -> f32 {
    let half = (horizontal_deg.to_radians() / 2.0).tan() / aspect;
    (2.0 * half.atan()) as f32
}

/// Maps clip space of `frame` onto clip space of a `width` x `height` target.
///
/// The frame may hang over the target's edges (filled screen); whatever falls
/// outside is clipped by the rasterizer.
pub fn frame_to_clip(frame: Rect, width: f64, height: f64) -> Mat4 {
    let sx = frame.width / width;
    let sy = frame.height / height;
    let tx = (2.0 * frame.x + frame.width) / width - 1.0;
    let ty = 1.0 - (2.0 * frame.y + frame.height) / height;
    Mat4::from_cols(
        Vec4::new(sx as f32, 0.0, 0.0, 0.0),
        Vec4::new(0.0, sy as f32, 0.0, 0.0),
        Vec4::Z,
        Vec4::new(tx as f32, ty as f32, 0.0, 1.0),
    )
}

pub fn view_projection(orientation: Quat, fov_deg: f64, frame: Rect, width: f64, height: f64) -> Mat4 {
    let aspect = frame.width / frame.height;
    let proj = Mat4::perspective_rh(vertical_fov(fov_deg, aspect), aspect as f32, Z_NEAR, Z_FAR);
    // camera sits at the centre, only rotated
    let view = Mat4::from_quat(orientation.conjugate());
    frame_to_clip(frame, width, height) * proj * view
}

/// Part of `frame` inside the target, as a scissor rect `(x, y, w, h)`.
pub fn visible_scissor(frame: Rect, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let x0 = frame.x.max(0.0).floor();
    let y0 = frame.y.max(0.0).floor();
    let x1 = (frame.x + frame.width).min(width as f64).ceil();
    let y1 = (frame.y + frame.height).min(height as f64).ceil();
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    let x0 = x0 as u32;
    let y0 = y0 as u32;
    let w = (x1 as u32).min(width) - x0;
    let h = (y1 as u32).min(height) - y0;
    if w == 0 || h == 0 {
        None
    } else {
        Some((x0, y0, w, h))
    }
}

pub struct Renderer {
    surface: wgpu::Surface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,
    render_pipeline: wgpu::RenderPipeline,

    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,

    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    texture: wgpu::Texture,
    sampler: wgpu::Sampler,

    camera_buffer: wgpu::Buffer,
    scissor: Option<(u32, u32, u32, u32)>,

    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub async fn new(window: std::sync::Arc<Window>) -> Result<Self, RendererError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = unsafe { instance.create_surface(window.as_ref()) }?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RendererError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    features: wgpu::Features::empty(),
                    limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    label: None,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        // --- sphere geometry ---
        let mesh = build_interior_sphere(SPHERE_RADIUS, SPHERE_SEGMENTS);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sphere Vertices"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sphere Indices"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        // --- placeholder texture until the first panorama arrives ---
        let texture = create_panorama_texture(&device, 2, 1, "placeholder_texture");
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &[40, 40, 48, 255, 24, 24, 30, 255],
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(8),
                rows_per_image: Some(1),
            },
            wgpu::Extent3d {
                width: 2,
                height: 1,
                depth_or_array_layers: 1,
            },
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            // longitude wraps, latitude does not
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        // --- camera uniform ---
        let camera_uniform = CameraUniform {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
        };
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
            label: Some("sphere_bind_group_layout"),
        });

        let bind_group = create_bind_group(&device, &bind_group_layout, &camera_buffer, &texture, &sampler);

        // --- pipeline ---
        let shader = device.create_shader_module(wgpu::include_wgsl!("shader_sphere.wgsl"));
        let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sphere Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Sphere Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<SphereVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // the camera never leaves the centre, every visible face is an inner one
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        // --- egui ---
        let egui_ctx = egui::Context::default();
        let mut egui_state = egui_winit::State::new(window.as_ref());
        egui_state.set_pixels_per_point(window.scale_factor() as f32);
        let egui_renderer = egui_wgpu::Renderer::new(&device, config.format, None, 1);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            render_pipeline,
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            bind_group_layout,
            bind_group,
            texture,
            sampler,
            camera_buffer,
            scissor: None,
            egui_ctx,
            egui_state,
            egui_renderer,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// `frame` is the presented viewer frame in physical pixels.
    pub fn update_camera(&mut self, orientation: Quat, fov_deg: f64, frame: Rect) {
        let (w, h) = (self.config.width, self.config.height);
        self.scissor = visible_scissor(frame, w, h);
        if frame.width <= 0.0 || frame.height <= 0.0 {
            return;
        }

        let view_proj = view_projection(orientation, fov_deg, frame, w as f64, h as f64);
        let uniform = CameraUniform {
            view_proj: view_proj.to_cols_array_2d(),
        };
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    pub fn load_panorama(&mut self, img: RgbaImage) {
        let img = fit_to_gpu(img, self.device.limits().max_texture_dimension_2d);
        let (width, height) = img.dimensions();

        self.texture = create_panorama_texture(&self.device, width, height, "panorama_texture");
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &img,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        self.bind_group = create_bind_group(
            &self.device,
            &self.bind_group_layout,
            &self.camera_buffer,
            &self.texture,
            &self.sampler,
        );
    }

    pub fn render_with_ui(
        &mut self,
        window: &Window,
        run_ui: impl FnOnce(&egui::Context),
    ) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Sphere Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.5,
                            g: 0.5,
                            b: 0.5,
                            a: 1.0,
                        }),
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });

            if let Some((x, y, w, h)) = self.scissor {
                render_pass.set_scissor_rect(x, y, w, h);
                render_pass.set_pipeline(&self.render_pipeline);
                render_pass.set_bind_group(0, &self.bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..self.index_count, 0, 0..1);
            }
        }

        let raw_input = self.egui_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, run_ui);
        self.egui_state
            .handle_platform_output(window, &self.egui_ctx, full_output.platform_output);
        let clipped_primitives = self.egui_ctx.tessellate(full_output.shapes);

        let screen_descriptor = egui_wgpu::renderer::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        for (id, delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, delta);
        }
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &clipped_primitives,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });
            self.egui_renderer
                .render(&mut render_pass, &clipped_primitives, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn create_panorama_texture(device: &wgpu::Device, width: u32, height: u32, label: &str) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        label: Some(label),
        view_formats: &[],
    })
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    camera_buffer: &wgpu::Buffer,
    texture: &wgpu::Texture,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&texture_view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
        label: Some("sphere_bind_group"),
    })
}

/// Shrink to the GPU's texture limit and pad to 2:1.
///
/// Panoramas shorter than half their width are pinned to the bottom of a
/// black 2:1 canvas so the latitudes line up with the sphere.
fn fit_to_gpu(img: RgbaImage, max_dimension: u32) -> RgbaImage {
    let (src_w, src_h) = img.dimensions();
    let img = if src_w > max_dimension || src_h > max_dimension {
        let scale = max_dimension as f32 / src_w.max(src_h) as f32;
        let new_w = ((src_w as f32 * scale) as u32).max(1);
        let new_h = ((src_h as f32 * scale) as u32).max(1);
        log::warn!(
            "Panorama {}x{} exceeds GPU limit {}, scaled to {}x{}",
            src_w,
            src_h,
            max_dimension,
            new_w,
            new_h
        );
        image::DynamicImage::ImageRgba8(img)
            .resize_exact(new_w, new_h, image::imageops::FilterType::Lanczos3)
            .to_rgba8()
    } else {
        img
    };

    let (w, h) = img.dimensions();
    let target_h = w / 2;
    if target_h > 0 && h < target_h {
        let mut canvas = RgbaImage::from_pixel(w, target_h, Rgba([0, 0, 0, 255]));
        // y offset keeps the image inside the canvas
        match canvas.copy_from(&img, 0, target_h - h) {
            Ok(()) => canvas,
            Err(e) => {
                log::warn!("Could not pad panorama to 2:1, uploading as is: {}", e);
                img
            }
        }
    } else {
        img
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn vertical_fov_matches_horizontal_at_square_aspect() {
        assert!((vertical_fov(90.0, 1.0) - 90f32.to_radians()).abs() < EPSILON);
        // 2:1 frame, 90° across is atan(0.5) * 2 tall
        assert!((vertical_fov(90.0, 2.0) - 2.0 * 0.5f32.atan()).abs() < EPSILON);
    }

    #[test]
    fn full_target_frame_is_identity() {
        let m = frame_to_clip(Rect::new(0.0, 0.0, 800.0, 600.0), 800.0, 600.0);
        assert!(m.abs_diff_eq(Mat4::IDENTITY, EPSILON));
    }

    #[test]
    fn frame_corners_map_to_target_pixels() {
        // bottom strip of a 1000x800 target
        let m = frame_to_clip(Rect::new(0.0, 500.0, 1000.0, 300.0), 1000.0, 800.0);
        let top_left = m * Vec4::new(-1.0, 1.0, 0.5, 1.0);
        let bottom_right = m * Vec4::new(1.0, -1.0, 0.5, 1.0);
        // pixel y 500 -> ndc 1 - 2*500/800 = -0.25
        assert!((top_left.x - -1.0).abs() < EPSILON);
        assert!((top_left.y - -0.25).abs() < EPSILON);
        assert!((bottom_right.x - 1.0).abs() < EPSILON);
        assert!((bottom_right.y - -1.0).abs() < EPSILON);
    }

    #[test]
    fn centre_of_view_projects_to_frame_centre() {
        let frame = Rect::new(100.0, 100.0, 400.0, 200.0);
        let m = view_projection(Quat::IDENTITY, 100.0, frame, 600.0, 400.0);
        let clip = m * (Vec3::NEG_Z * SPHERE_RADIUS).extend(1.0);
        let ndc = clip.truncate() / clip.w;
        // frame centre is pixel (300, 200), which is ndc (0, 0)
        assert!(ndc.x.abs() < EPSILON && ndc.y.abs() < EPSILON, "{ndc}");
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn horizontal_fov_edge_lands_on_frame_edge() {
        let frame = Rect::new(0.0, 0.0, 414.0, 300.0);
        let m = view_projection(Quat::IDENTITY, 100.0, frame, 414.0, 300.0);
        let half = 50f32.to_radians();
        let edge = Vec3::new(half.sin(), 0.0, -half.cos()) * SPHERE_RADIUS;
        let clip = m * edge.extend(1.0);
        assert!((clip.x / clip.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn scissor_clips_to_target() {
        assert_eq!(
            visible_scissor(Rect::new(-320.0, 0.0, 1015.0, 812.0), 375, 812),
            Some((0, 0, 375, 812))
        );
        assert_eq!(
            visible_scissor(Rect::new(0.0, 300.0, 375.0, 300.0), 375, 812),
            Some((0, 300, 375, 300))
        );
        assert_eq!(visible_scissor(Rect::new(400.0, 0.0, 10.0, 10.0), 375, 812), None);
    }

    #[test]
    fn short_panoramas_are_padded_to_two_to_one() {
        let img = RgbaImage::from_pixel(8, 2, Rgba([255, 255, 255, 255]));
        let fitted = fit_to_gpu(img, 4096);
        assert_eq!(fitted.dimensions(), (8, 4));
        assert_eq!(fitted.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(fitted.get_pixel(0, 3).0, [255, 255, 255, 255]);
    }

    #[test]
    fn oversized_panoramas_are_scaled_down() {
        let img = RgbaImage::from_pixel(64, 32, Rgba([1, 2, 3, 255]));
        let fitted = fit_to_gpu(img, 16);
        assert_eq!(fitted.dimensions(), (16, 8));
    }
}
