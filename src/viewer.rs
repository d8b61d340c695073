//! Live viewer window.
//!
//! Runs one [`ParticleEngine`] in a winit window. Each redraw steps the
//! engine into a [`RasterCanvas`], uploads the pixels to a texture and
//! draws it with a single fullscreen triangle, letterboxed to stay square.
//!
//! # Controls
//!
//! | Key | Action |
//! |-----|--------|
//! | Right / N | Next preset |
//! | Left / P | Previous preset |
//! | L | Toggle light mode |
//! | Space | Pause / resume |
//! | Escape | Quit |
//!
//! Without a breath pattern in the config, the viewer drives the engine
//! with the default 4-4-4-2 cycle.

use std::sync::Arc;
use std::time::Instant;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::animation::FrameHandle;
use crate::breath::BreathPattern;
use crate::color::Rgb;
use crate::config::EngineConfig;
use crate::engine::ParticleEngine;
use crate::error::ViewerError;
use crate::registry::{self, PresetSource};
use crate::render::{Canvas2d, RasterCanvas};

const DARK_BACKGROUND: Rgb = Rgb::new(10, 10, 18);
const LIGHT_BACKGROUND: Rgb = Rgb::new(245, 240, 230);

const BLIT_SHADER: &str = r#"
struct Blit {
    scale: vec2<f32>,
    _pad: vec2<f32>,
};

@group(0) @binding(0) var frame_tex: texture_2d<f32>;
@group(0) @binding(1) var frame_sampler: sampler;
@group(0) @binding(2) var<uniform> blit: Blit;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VsOut {
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    var out: VsOut;
    let ndc = uv * vec2<f32>(2.0, -2.0) + vec2<f32>(-1.0, 1.0);
    out.pos = vec4<f32>(ndc * blit.scale, 0.0, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    return textureSample(frame_tex, frame_sampler, in.uv);
}
"#;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct BlitUniforms {
    scale: [f32; 2],
    _pad: [f32; 2],
}

impl BlitUniforms {
    /// Scale that keeps a square image square inside a `width` x `height`
    /// surface.
    fn letterbox(width: u32, height: u32) -> Self {
        let (w, h) = (width.max(1) as f32, height.max(1) as f32);
        let scale = if w > h { [h / w, 1.0] } else { [1.0, w / h] };
        Self { scale, _pad: [0.0; 2] }
    }
}

/// What a key press asks the viewer to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerCommand {
    NextPreset,
    PreviousPreset,
    ToggleLight,
    ToggleActive,
    Quit,
}

impl ViewerCommand {
    pub fn for_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::ArrowRight | KeyCode::KeyN => Some(ViewerCommand::NextPreset),
            KeyCode::ArrowLeft | KeyCode::KeyP => Some(ViewerCommand::PreviousPreset),
            KeyCode::KeyL => Some(ViewerCommand::ToggleLight),
            KeyCode::Space => Some(ViewerCommand::ToggleActive),
            KeyCode::Escape => Some(ViewerCommand::Quit),
            _ => None,
        }
    }
}

/// Every catalog id in browse order: path presets, then ring presets.
#[derive(Debug, Clone)]
pub struct PresetCycle {
    ids: Vec<String>,
    index: usize,
}

impl PresetCycle {
    /// Start at `current` if it is a catalog id, else at the first entry.
    pub fn new(current: &str) -> Self {
        let ids: Vec<String> = registry::path_presets_all()
            .iter()
            .chain(registry::presets(None))
            .map(|p| p.id.clone())
            .collect();
        let index = ids
            .iter()
            .position(|id| id.eq_ignore_ascii_case(current))
            .unwrap_or(0);
        Self { ids, index }
    }

    pub fn current(&self) -> &str {
        self.ids.get(self.index).map_or("", String::as_str)
    }

    pub fn next(&mut self) -> &str {
        if !self.ids.is_empty() {
            self.index = (self.index + 1) % self.ids.len();
        }
        self.current()
    }

    pub fn previous(&mut self) -> &str {
        if !self.ids.is_empty() {
            self.index = (self.index + self.ids.len() - 1) % self.ids.len();
        }
        self.current()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Open a window and run `config` until it is closed.
pub fn run(config: EngineConfig) -> Result<(), ViewerError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    frame_texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    canvas_size: u32,
}

impl GpuState {
    async fn new(window: Arc<Window>, canvas_size: u32) -> Result<Self, ViewerError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Viewer Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let frame_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Canvas Texture"),
            size: wgpu::Extent3d {
                width: canvas_size,
                height: canvas_size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let frame_view = frame_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Canvas Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Blit Uniforms"),
            contents: bytemuck::cast_slice(&[BlitUniforms::letterbox(config.width, config.height)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Blit Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Blit Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&frame_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Blit Shader"),
            source: wgpu::ShaderSource::Wgsl(BLIT_SHADER.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Blit Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Blit Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        log::info!(
            "Viewer surface ready: {}x{} {:?}",
            config.width,
            config.height,
            surface_format
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            frame_texture,
            bind_group,
            uniform_buffer,
            canvas_size,
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.queue.write_buffer(
                &self.uniform_buffer,
                0,
                bytemuck::cast_slice(&[BlitUniforms::letterbox(new_size.width, new_size.height)]),
            );
            log::debug!("Viewer surface resized to {}x{}", new_size.width, new_size.height);
        }
    }

    fn upload(&self, pixels: &[u8]) {
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.frame_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * self.canvas_size),
                rows_per_image: Some(self.canvas_size),
            },
            wgpu::Extent3d {
                width: self.canvas_size,
                height: self.canvas_size,
                depth_or_array_layers: 1,
            },
        );
    }

    fn render(&mut self, background: Rgb) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Blit Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Blit Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(srgb_clear(background)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

/// Clear color for an sRGB surface: the clear value is linear.
fn srgb_clear(color: Rgb) -> wgpu::Color {
    let linear = |c: u8| {
        let c = c as f64 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    wgpu::Color {
        r: linear(color.r),
        g: linear(color.g),
        b: linear(color.b),
        a: 1.0,
    }
}

struct ViewerApp {
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    engine: ParticleEngine,
    canvas: RasterCanvas,
    presets: PresetCycle,
    pending: Option<FrameHandle>,
    start: Instant,
    error: Option<ViewerError>,
}

impl ViewerApp {
    fn new(mut config: EngineConfig) -> Self {
        if config.breath.is_none() {
            config.breath = Some(BreathPattern::default());
        }
        let size = (config.canvas_size().round() as u32).max(1);
        let presets = PresetCycle::new(config.preset_identity());
        let mut engine = ParticleEngine::new(config);
        let pending = engine.request_frame();

        Self {
            window: None,
            gpu_state: None,
            engine,
            canvas: RasterCanvas::new(size, size),
            presets,
            pending,
            start: Instant::now(),
            error: None,
        }
    }

    fn background(&self) -> Rgb {
        if self.engine.config().is_light {
            LIGHT_BACKGROUND
        } else {
            DARK_BACKGROUND
        }
    }

    fn update_title(&self) {
        if let Some(window) = &self.window {
            let preset = self.engine.preset();
            let state = if self.engine.is_active() { "" } else { " (paused)" };
            window.set_title(&format!("ringfx - {} [{}]{}", preset.name, preset.id, state));
        }
    }

    fn apply(&mut self, command: ViewerCommand, event_loop: &ActiveEventLoop) {
        match command {
            ViewerCommand::NextPreset | ViewerCommand::PreviousPreset => {
                let id = if command == ViewerCommand::NextPreset {
                    self.presets.next()
                } else {
                    self.presets.previous()
                }
                .to_string();
                let config = EngineConfig {
                    source: PresetSource::Named(id),
                    ..self.engine.config().clone()
                };
                self.pending = self.engine.configure(config);
            }
            ViewerCommand::ToggleLight => {
                let config = EngineConfig {
                    is_light: !self.engine.config().is_light,
                    ..self.engine.config().clone()
                };
                self.pending = self.engine.configure(config);
            }
            ViewerCommand::ToggleActive => {
                let active = !self.engine.is_active();
                self.engine.set_active(active);
                self.pending = if active { self.engine.request_frame() } else { None };
            }
            ViewerCommand::Quit => event_loop.exit(),
        }
        self.update_title();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let timestamp = self.start.elapsed().as_secs_f64() * 1000.0;
        if let Some(handle) = self.pending.take() {
            self.pending = self.engine.on_frame(handle, timestamp, &mut self.canvas);
        }

        let background = self.background();
        let Some(gpu_state) = &mut self.gpu_state else {
            return;
        };
        gpu_state.upload(&self.canvas.to_rgba8(Some(background)));
        match gpu_state.render(background) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = winit::dpi::PhysicalSize::new(gpu_state.config.width, gpu_state.config.height);
                gpu_state.resize(size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory, closing viewer");
                event_loop.exit();
            }
            Err(e) => log::warn!("Render error: {:?}", e),
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let size = self.canvas.width();
        let window_attrs = Window::default_attributes()
            .with_title("ringfx")
            .with_inner_size(winit::dpi::PhysicalSize::new(size, size));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.error = Some(e.into());
                event_loop.exit();
                return;
            }
        };

        match pollster::block_on(GpuState::new(window.clone(), size)) {
            Ok(gpu_state) => {
                self.window = Some(window);
                self.gpu_state = Some(gpu_state);
                self.update_title();
            }
            Err(e) => {
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                if let PhysicalKey::Code(code) = event.physical_key {
                    if let Some(command) = ViewerCommand::for_key(code) {
                        self.apply(command, event_loop);
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_bindings() {
        assert_eq!(ViewerCommand::for_key(KeyCode::ArrowRight), Some(ViewerCommand::NextPreset));
        assert_eq!(ViewerCommand::for_key(KeyCode::KeyP), Some(ViewerCommand::PreviousPreset));
        assert_eq!(ViewerCommand::for_key(KeyCode::KeyL), Some(ViewerCommand::ToggleLight));
        assert_eq!(ViewerCommand::for_key(KeyCode::Space), Some(ViewerCommand::ToggleActive));
        assert_eq!(ViewerCommand::for_key(KeyCode::KeyQ), None);
    }

    #[test]
    fn test_preset_cycle_wraps() {
        let mut cycle = PresetCycle::new("soma");
        assert_eq!(cycle.current(), "Soma");
        let total = cycle.len();
        assert_eq!(total, registry::path_presets_all().len() + registry::presets(None).len());

        assert_eq!(cycle.previous(), registry::presets(None).last().unwrap().id);
        assert_eq!(cycle.next(), "Soma");
        for _ in 0..total {
            cycle.next();
        }
        assert_eq!(cycle.current(), "Soma");
    }

    #[test]
    fn test_unknown_start_uses_first_entry() {
        let cycle = PresetCycle::new("nope");
        assert_eq!(cycle.current(), registry::path_presets_all()[0].id);
    }

    #[test]
    fn test_letterbox_keeps_square() {
        assert_eq!(BlitUniforms::letterbox(800, 400).scale, [0.5, 1.0]);
        assert_eq!(BlitUniforms::letterbox(300, 600).scale, [1.0, 0.5]);
        assert_eq!(BlitUniforms::letterbox(0, 0).scale, [1.0, 1.0]);
    }
}
