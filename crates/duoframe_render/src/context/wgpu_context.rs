//! wgpu-backed graphics context
//!
//! Translates the GL-style immediate-mode calls onto wgpu:
//! - every clear and every draw records and submits its own render pass, so
//!   a uniform written between two draws is seen by the second draw only
//! - render pipelines are built per program and per depth state, then cached
//! - clears confined by the scissor test are drawn as a fullscreen triangle
//! - rectangles arrive with a lower-left origin and are flipped and clamped
//!   to the surface before reaching wgpu
//!
//! A frame must be acquired with [`WgpuContext::begin_frame`] before any
//! clear or draw, and presented with [`WgpuContext::end_frame`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use duoframe_math::{Mat4, IDENTITY};
use slotmap::SlotMap;
use wgpu::util::DeviceExt;
use winit::window::Window;

use super::{
    draw_blocker, AttribLocation, BufferDesc, BufferId, BufferKind, ClearFlags, DepthFunc,
    DeviceState, GraphicsContext, ProgramDesc, ProgramId, Rect, UniformLocation,
};
use crate::error::SetupError;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// High-level response after a surface error
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame
    Reconfigured,
    /// Transient error; skip the current frame
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully
    Fatal,
}

/// Uniform block of the clear shader (matches `shaders/clear.wgsl`)
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct ClearUniforms {
    color: [f32; 4],
    depth: f32,
    _padding: [f32; 3],
}

struct GpuBuffer {
    kind: BufferKind,
    buffer: wgpu::Buffer,
    size: u64,
}

struct GpuProgram {
    label: String,
    module: wgpu::ShaderModule,
    vertex_entry: String,
    fragment_entry: String,
    uniforms: Vec<String>,
    /// (name, components) in location order
    attributes: Vec<(String, u32)>,
    values: Vec<Mat4>,
    layout: wgpu::PipelineLayout,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    pipelines: HashMap<Option<DepthFunc>, wgpu::RenderPipeline>,
}

/// Pipelines for scissored clears, one per clear mask
struct ClearPipelines {
    module: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    pipelines: HashMap<ClearFlags, wgpu::RenderPipeline>,
}

/// An acquired surface texture
struct ActiveFrame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

/// Graphics context drawing into a window surface
pub struct WgpuContext {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    frame: Option<ActiveFrame>,
    buffers: SlotMap<BufferId, GpuBuffer>,
    programs: SlotMap<ProgramId, GpuProgram>,
    clear_pipelines: ClearPipelines,
    state: DeviceState,
    lost: Arc<AtomicBool>,
}

impl WgpuContext {
    /// Create a context bound to a window.
    ///
    /// Fails with [`SetupError::ContextUnavailable`] when no adapter, device
    /// or surface format can be obtained.
    pub async fn new(window: Arc<Window>, vsync: bool) -> Result<Self, SetupError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| SetupError::ContextUnavailable(format!("surface creation failed: {}", e)))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| SetupError::ContextUnavailable("no compatible GPU adapter".to_string()))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("duoframe device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .map_err(|e| SetupError::ContextUnavailable(format!("device request failed: {}", e)))?;

        let lost = Arc::new(AtomicBool::new(false));
        let lost_flag = Arc::clone(&lost);
        device.set_device_lost_callback(move |reason, message| {
            log::warn!("GPU device lost ({:?}): {}", reason, message);
            lost_flag.store(true, Ordering::Release);
        });

        let caps = surface.get_capabilities(&adapter);
        let format = choose_surface_format(&caps)
            .ok_or_else(|| SetupError::ContextUnavailable("no supported surface formats".to_string()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::Fifo
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let info = adapter.get_info();
        log::info!(
            "GPU context ready: {} ({:?}), surface {:?} {}x{}",
            info.name,
            info.backend,
            format,
            config.width,
            config.height
        );

        let depth_view = create_depth_view(&device, config.width, config.height);
        let clear_pipelines = ClearPipelines::new(&device);
        let state = DeviceState::new(config.width, config.height);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_view,
            frame: None,
            buffers: SlotMap::with_key(),
            programs: SlotMap::with_key(),
            clear_pipelines,
            state,
            lost,
        })
    }

    /// Whether the device has been lost. Every handle created through this
    /// context is unusable once this returns true.
    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }

    /// Reconfigure the surface and depth buffer after a resize.
    ///
    /// A zero-sized surface cannot be configured; the call is ignored and
    /// the previous configuration stays in place until a real size arrives.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, width, height);
    }

    /// Acquire the next surface texture as the target for clears and draws
    pub fn begin_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.frame = Some(ActiveFrame { surface_texture, view });
        Ok(())
    }

    /// Present the acquired frame
    pub fn end_frame(&mut self) {
        if let Some(frame) = self.frame.take() {
            drop(frame.view);
            frame.surface_texture.present();
        }
    }

    /// Convert a surface error into an action for the host loop
    pub fn handle_surface_error(&mut self, err: wgpu::SurfaceError) -> SurfaceErrorAction {
        match err {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                self.surface.configure(&self.device, &self.config);
                SurfaceErrorAction::Reconfigured
            }
            wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
            wgpu::SurfaceError::Timeout => SurfaceErrorAction::SkipFrame,
            wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
        }
    }

    fn target_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn begin_pass<'a>(
        encoder: &'a mut wgpu::CommandEncoder,
        color_view: &'a wgpu::TextureView,
        depth_view: &'a wgpu::TextureView,
        color_load: wgpu::LoadOp<wgpu::Color>,
        depth_load: wgpu::LoadOp<f32>,
    ) -> wgpu::RenderPass<'a> {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shared Context Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: color_load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        })
    }
}

impl GraphicsContext for WgpuContext {
    fn state(&self) -> &DeviceState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut DeviceState {
        &mut self.state
    }

    fn drawable_size(&self) -> (u32, u32) {
        self.target_size()
    }

    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<BufferId, SetupError> {
        desc.validate()?;

        let usage = match desc.kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            BufferKind::Index => wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        };

        let (buffer, error) = scoped(&self.device, || {
            self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(desc.label),
                contents: desc.contents,
                usage,
            })
        });
        if let Some(err) = error {
            return Err(SetupError::BufferCreation {
                label: desc.label.to_string(),
                reason: err.to_string(),
            });
        }

        log::debug!("created {:?} buffer '{}' ({} bytes)", desc.kind, desc.label, desc.contents.len());
        Ok(self.buffers.insert(GpuBuffer {
            kind: desc.kind,
            buffer,
            size: desc.contents.len() as u64,
        }))
    }

    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramId, SetupError> {
        desc.validate()?;

        let (module, error) = scoped(&self.device, || {
            self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(desc.label),
                source: wgpu::ShaderSource::Wgsl(desc.source.into()),
            })
        });
        if let Some(err) = error {
            return Err(SetupError::ShaderCompile {
                label: desc.label.to_string(),
                log: err.to_string(),
            });
        }

        let bind_group_layout = self.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Program Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Program Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let values = vec![IDENTITY; desc.uniforms.len()];
        let initial: Vec<Mat4> = if values.is_empty() { vec![IDENTITY] } else { values.clone() };
        let uniform_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Program Uniform Buffer"),
            contents: bytemuck::cast_slice(&initial),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Program Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let mut program = GpuProgram {
            label: desc.label.to_string(),
            module,
            vertex_entry: desc.vertex_entry.to_string(),
            fragment_entry: desc.fragment_entry.to_string(),
            uniforms: desc.uniforms.iter().map(|s| s.to_string()).collect(),
            attributes: desc
                .attributes
                .iter()
                .map(|a| (a.name.to_string(), a.components))
                .collect(),
            values,
            layout,
            uniform_buffer,
            bind_group,
            pipelines: HashMap::new(),
        };

        // Linking: build the variant the manual pass uses and let wgpu
        // validate entry points and bindings against the layout
        let link_key = Some(DepthFunc::LessEqual);
        let (pipeline, error) = scoped(&self.device, || {
            create_program_pipeline(&self.device, self.config.format, &program, link_key)
        });
        if let Some(err) = error {
            return Err(SetupError::ProgramLink {
                label: desc.label.to_string(),
                log: err.to_string(),
            });
        }
        program.pipelines.insert(link_key, pipeline);

        log::debug!("linked program '{}'", desc.label);
        Ok(self.programs.insert(program))
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let program = self.programs.get(program)?;
        program
            .uniforms
            .iter()
            .position(|u| u == name)
            .map(|i| UniformLocation(i as u32))
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<AttribLocation> {
        let program = self.programs.get(program)?;
        program
            .attributes
            .iter()
            .position(|(a, _)| a == name)
            .map(|i| AttribLocation(i as u32))
    }

    fn uniform_matrix4(&mut self, location: UniformLocation, value: &Mat4) {
        let Some(program) = self.state.program.and_then(|id| self.programs.get_mut(id)) else {
            log::warn!("uniform_matrix4 with no valid program bound");
            return;
        };
        match program.values.get_mut(location.index()) {
            Some(slot) => *slot = *value,
            None => log::warn!(
                "uniform location {} out of range for program '{}'",
                location.index(),
                program.label
            ),
        }
    }

    fn clear(&mut self, mask: ClearFlags) {
        if mask.is_empty() {
            return;
        }
        let Some(frame) = self.frame.as_ref() else {
            log::warn!("clear outside of a frame ignored");
            return;
        };

        let state = &self.state;
        let (width, height) = (self.config.width, self.config.height);
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Clear Encoder"),
        });

        if !state.scissor_test {
            let [r, g, b, a] = state.clear_color.map(|c| f64::from(c.clamp(0.0, 1.0)));
            let color_load = if mask.contains(ClearFlags::COLOR) {
                wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a })
            } else {
                wgpu::LoadOp::Load
            };
            let depth_load = if mask.contains(ClearFlags::DEPTH) {
                wgpu::LoadOp::Clear(state.clear_depth.clamp(0.0, 1.0))
            } else {
                wgpu::LoadOp::Load
            };
            let _pass =
                Self::begin_pass(&mut encoder, &frame.view, &self.depth_view, color_load, depth_load);
        } else {
            let Some(region) = state.scissor.clamped(width, height) else {
                return;
            };

            let uniforms = ClearUniforms {
                color: state.clear_color.map(|c| c.clamp(0.0, 1.0)),
                depth: state.clear_depth.clamp(0.0, 1.0),
                _padding: [0.0; 3],
            };
            self.queue.write_buffer(
                &self.clear_pipelines.uniform_buffer,
                0,
                bytemuck::bytes_of(&uniforms),
            );
            self.clear_pipelines.ensure(&self.device, self.config.format, mask);

            let (x, y, w, h) = to_top_left(region, height);
            let mut pass = Self::begin_pass(
                &mut encoder,
                &frame.view,
                &self.depth_view,
                wgpu::LoadOp::Load,
                wgpu::LoadOp::Load,
            );
            if let Some(pipeline) = self.clear_pipelines.pipelines.get(&mask) {
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &self.clear_pipelines.bind_group, &[]);
                pass.set_scissor_rect(x, y, w, h);
                pass.draw(0..3, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn draw_indexed(&mut self, index_count: u32) {
        if self.frame.is_none() {
            log::warn!("draw outside of a frame ignored");
            return;
        }

        let Some(program_id) = self.state.program.filter(|id| self.programs.contains_key(*id)) else {
            log::error!("draw rejected: no valid program bound");
            return;
        };

        // Build the pipeline variant for the current depth state before
        // taking the shared borrows needed for recording
        let depth_key = self.state.effective_depth();
        if let Some(program) = self.programs.get_mut(program_id) {
            if !program.pipelines.contains_key(&depth_key) {
                let pipeline =
                    create_program_pipeline(&self.device, self.config.format, program, depth_key);
                program.pipelines.insert(depth_key, pipeline);
            }
        }

        let program = &self.programs[program_id];
        if let Some(reason) = draw_blocker(&self.state, program.attributes.len()) {
            log::error!("draw rejected: {}", reason);
            return;
        }

        let index_buffer = match self.state.index_buffer.and_then(|id| self.buffers.get(id)) {
            Some(b) if b.kind == BufferKind::Index && b.size >= u64::from(index_count) * 2 => b,
            _ => {
                log::error!("draw rejected: index buffer missing or too small for {} indices", index_count);
                return;
            }
        };

        let mut vertex_buffers = Vec::with_capacity(program.attributes.len());
        for attrib in &self.state.attribs[..program.attributes.len()] {
            match attrib.buffer.and_then(|id| self.buffers.get(id)) {
                Some(b) if b.kind == BufferKind::Vertex => vertex_buffers.push(&b.buffer),
                _ => {
                    log::error!("draw rejected: attribute buffer missing");
                    return;
                }
            }
        }

        let (width, height) = self.target_size();
        let Some(viewport) = self.state.viewport.clamped(width, height) else {
            return;
        };
        let scissor = if self.state.scissor_test {
            match self.state.scissor.clamped(width, height) {
                Some(rect) => rect,
                None => return,
            }
        } else {
            Rect::full(width, height)
        };

        let (Some(frame), Some(pipeline)) = (self.frame.as_ref(), program.pipelines.get(&depth_key)) else {
            return;
        };

        self.queue
            .write_buffer(&program.uniform_buffer, 0, bytemuck::cast_slice(&program.values));

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Draw Encoder"),
        });
        {
            let mut pass = Self::begin_pass(
                &mut encoder,
                &frame.view,
                &self.depth_view,
                wgpu::LoadOp::Load,
                wgpu::LoadOp::Load,
            );
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &program.bind_group, &[]);

            let (vx, vy, vw, vh) = to_top_left(viewport, height);
            pass.set_viewport(vx as f32, vy as f32, vw as f32, vh as f32, 0.0, 1.0);
            let (sx, sy, sw, sh) = to_top_left(scissor, height);
            pass.set_scissor_rect(sx, sy, sw, sh);

            for (slot, buffer) in vertex_buffers.iter().enumerate() {
                pass.set_vertex_buffer(slot as u32, buffer.slice(..));
            }
            pass.set_index_buffer(index_buffer.buffer.slice(..), wgpu::IndexFormat::Uint16);
            pass.draw_indexed(0..index_count, 0, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

impl ClearPipelines {
    fn new(device: &wgpu::Device) -> Self {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Clear Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/clear.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Clear Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Clear Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Clear Uniform Buffer"),
            contents: bytemuck::bytes_of(&ClearUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Clear Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            module,
            layout,
            uniform_buffer,
            bind_group,
            pipelines: HashMap::new(),
        }
    }

    fn ensure(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat, mask: ClearFlags) {
        if self.pipelines.contains_key(&mask) {
            return;
        }

        let write_mask = if mask.contains(ClearFlags::COLOR) {
            wgpu::ColorWrites::ALL
        } else {
            wgpu::ColorWrites::empty()
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Scissored Clear Pipeline"),
            layout: Some(&self.layout),
            vertex: wgpu::VertexState {
                module: &self.module,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: mask.contains(ClearFlags::DEPTH),
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        self.pipelines.insert(mask, pipeline);
    }
}

fn create_program_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    program: &GpuProgram,
    depth: Option<DepthFunc>,
) -> wgpu::RenderPipeline {
    // One buffer slot per attribute, tightly packed f32 components
    let attributes: Vec<[wgpu::VertexAttribute; 1]> = program
        .attributes
        .iter()
        .enumerate()
        .map(|(location, (_, components))| {
            [wgpu::VertexAttribute {
                format: vertex_format(*components),
                offset: 0,
                shader_location: location as u32,
            }]
        })
        .collect();

    let buffers: Vec<wgpu::VertexBufferLayout<'_>> = program
        .attributes
        .iter()
        .zip(attributes.iter())
        .map(|((_, components), attribute)| wgpu::VertexBufferLayout {
            array_stride: u64::from(*components) * 4,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: attribute,
        })
        .collect();

    let depth_stencil = match depth {
        Some(func) => wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: compare_function(func),
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        },
        // Depth test off also disables depth writes
        None => wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Always,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        },
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(program.label.as_str()),
        layout: Some(&program.layout),
        vertex: wgpu::VertexState {
            module: &program.module,
            entry_point: Some(program.vertex_entry.as_str()),
            buffers: &buffers,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &program.module,
            entry_point: Some(program.fragment_entry.as_str()),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: Some(depth_stencil),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Run `f` inside validation and out-of-memory error scopes
fn scoped<T>(device: &wgpu::Device, f: impl FnOnce() -> T) -> (T, Option<wgpu::Error>) {
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = f();
    let validation = pollster::block_on(device.pop_error_scope());
    let out_of_memory = pollster::block_on(device.pop_error_scope());
    (value, validation.or(out_of_memory))
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Shared Depth Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Prefer a linear format so clear colors reach the screen unchanged
fn choose_surface_format(caps: &wgpu::SurfaceCapabilities) -> Option<wgpu::TextureFormat> {
    caps.formats
        .iter()
        .copied()
        .find(|f| !f.is_srgb())
        .or_else(|| caps.formats.first().copied())
}

fn compare_function(func: DepthFunc) -> wgpu::CompareFunction {
    match func {
        DepthFunc::Never => wgpu::CompareFunction::Never,
        DepthFunc::Less => wgpu::CompareFunction::Less,
        DepthFunc::Equal => wgpu::CompareFunction::Equal,
        DepthFunc::LessEqual => wgpu::CompareFunction::LessEqual,
        DepthFunc::Greater => wgpu::CompareFunction::Greater,
        DepthFunc::NotEqual => wgpu::CompareFunction::NotEqual,
        DepthFunc::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
        DepthFunc::Always => wgpu::CompareFunction::Always,
    }
}

fn vertex_format(components: u32) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

/// Convert a lower-left-origin rectangle into wgpu's upper-left origin
fn to_top_left(rect: Rect, target_height: u32) -> (u32, u32, u32, u32) {
    let top = target_height - (rect.y as u32 + rect.height);
    (rect.x as u32, top, rect.width, rect.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_uniforms_size() {
        // vec4 + f32, rounded up to 16-byte alignment
        assert_eq!(std::mem::size_of::<ClearUniforms>(), 32);
    }

    #[test]
    fn test_to_top_left_flips_y() {
        assert_eq!(to_top_left(Rect::new(0, 0, 100, 50), 200), (0, 150, 100, 50));
        assert_eq!(to_top_left(Rect::new(10, 150, 20, 50), 200), (10, 0, 20, 50));
        assert_eq!(to_top_left(Rect::full(500, 500), 500), (0, 0, 500, 500));
    }

    #[test]
    fn test_vertex_format() {
        assert_eq!(vertex_format(3), wgpu::VertexFormat::Float32x3);
        assert_eq!(vertex_format(1), wgpu::VertexFormat::Float32);
    }

    #[test]
    fn test_compare_function_mapping() {
        assert_eq!(compare_function(DepthFunc::LessEqual), wgpu::CompareFunction::LessEqual);
        assert_eq!(compare_function(DepthFunc::Always), wgpu::CompareFunction::Always);
    }

    #[test]
    fn test_matrix_upload_size() {
        // One mat4<f32> uniform per slot
        assert_eq!(std::mem::size_of::<Mat4>(), 64);
    }
}
