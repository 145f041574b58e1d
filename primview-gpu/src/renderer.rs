//! Frame renderer for recorded draw lists
//!
//! Lines go through a `LineList` pipeline; points are instanced quads sized
//! in pixels. Both share one camera uniform and a depth buffer. A frame is
//! split into `begin_frame` / `draw_scene` / `end_frame` so overlays such as
//! the GUI can record their own pass into the same encoder.

use crate::device::GpuContext;
use crate::draw_list::{DrawList, LineVertex, PointInstance};
use bytemuck::{Pod, Zeroable};
use log::{debug, warn};
use nalgebra::Matrix4;
use primview_core::{Error, Result};
use std::sync::Arc;
use winit::window::Window;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const QUAD_VERTICES: u32 = 6;

/// Camera uniform data
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    /// Surface size in pixels, for point sizing
    pub viewport: [f32; 2],
    pub _padding: [f32; 2],
}

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub background_color: [f64; 4],
    pub enable_depth_test: bool,
    pub vsync: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background_color: [0.0, 0.0, 0.0, 1.0],
            enable_depth_test: true,
            vsync: true,
        }
    }
}

/// An acquired surface texture and the encoder recording into it
pub struct Frame {
    output: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

/// Draws [`DrawList`]s onto a window surface
pub struct FrameRenderer {
    pub gpu_context: GpuContext,
    pub surface: wgpu::Surface<'static>,
    pub surface_config: wgpu::SurfaceConfiguration,
    pub config: RenderConfig,
    line_pipeline: wgpu::RenderPipeline,
    point_pipeline: wgpu::RenderPipeline,
    camera_uniform: CameraUniform,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
}

impl FrameRenderer {
    /// Create a renderer and its GPU context for `window`
    pub async fn new(window: Arc<Window>, config: RenderConfig) -> Result<Self> {
        let size = window.inner_size();
        let (gpu_context, surface) = GpuContext::for_window(window).await?;

        let surface_caps = surface.get_capabilities(&gpu_context.adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| Error::Gpu("Surface reports no formats".to_string()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if config.vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&gpu_context.device, &surface_config);

        let camera_uniform = CameraUniform {
            view_proj: Matrix4::identity().into(),
            viewport: [surface_config.width as f32, surface_config.height as f32],
            _padding: [0.0; 2],
        };
        let camera_buffer = gpu_context.create_buffer_init(
            "Camera Buffer",
            &[camera_uniform],
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        );

        let bind_group_layout = gpu_context.create_bind_group_layout(
            "camera_bind_group_layout",
            &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        );
        let camera_bind_group = gpu_context.create_bind_group(
            "camera_bind_group",
            &bind_group_layout,
            &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        );

        let line_shader =
            gpu_context.create_shader_module("Line Shader", include_str!("shaders/lines.wgsl"));
        let point_shader =
            gpu_context.create_shader_module("Point Shader", include_str!("shaders/points.wgsl"));

        let line_pipeline = Self::create_render_pipeline(
            &gpu_context.device,
            &bind_group_layout,
            &line_shader,
            LineVertex::desc(),
            wgpu::PrimitiveTopology::LineList,
            surface_format,
            &config,
            "Line",
        );
        let point_pipeline = Self::create_render_pipeline(
            &gpu_context.device,
            &bind_group_layout,
            &point_shader,
            PointInstance::desc(),
            wgpu::PrimitiveTopology::TriangleList,
            surface_format,
            &config,
            "Point",
        );

        let depth_view = Self::create_depth_view(&gpu_context.device, &surface_config);

        Ok(Self {
            gpu_context,
            surface,
            surface_config,
            config,
            line_pipeline,
            point_pipeline,
            camera_uniform,
            camera_buffer,
            camera_bind_group,
            depth_view,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn create_render_pipeline(
        device: &wgpu::Device,
        bind_group_layout: &wgpu::BindGroupLayout,
        shader: &wgpu::ShaderModule,
        buffer: wgpu::VertexBufferLayout<'_>,
        topology: wgpu::PrimitiveTopology,
        surface_format: wgpu::TextureFormat,
        config: &RenderConfig,
        label: &str,
    ) -> wgpu::RenderPipeline {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} Render Pipeline Layout", label)),
            bind_group_layouts: &[bind_group_layout],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{} Render Pipeline", label)),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: "vs_main",
                buffers: &[buffer],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: config.enable_depth_test,
                depth_compare: if config.enable_depth_test {
                    wgpu::CompareFunction::LessEqual
                } else {
                    wgpu::CompareFunction::Always
                },
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        })
    }

    fn create_depth_view(
        device: &wgpu::Device,
        surface_config: &wgpu::SurfaceConfiguration,
    ) -> wgpu::TextureView {
        device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("Depth Texture"),
                size: wgpu::Extent3d {
                    width: surface_config.width,
                    height: surface_config.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default())
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.gpu_context.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.gpu_context.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    /// Surface size in pixels
    pub fn size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    /// Resize renderer
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.surface_config.width = new_size.width;
            self.surface_config.height = new_size.height;
            self.surface
                .configure(&self.gpu_context.device, &self.surface_config);
            self.depth_view = Self::create_depth_view(&self.gpu_context.device, &self.surface_config);
        }
    }

    /// Update the camera's combined view-projection matrix
    pub fn update_camera(&mut self, view_proj: Matrix4<f32>) {
        self.camera_uniform.view_proj = view_proj.into();
        self.camera_uniform.viewport = [
            self.surface_config.width as f32,
            self.surface_config.height as f32,
        ];
        self.gpu_context.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&self.camera_uniform),
        );
    }

    /// Acquire the next surface texture. Returns `None` when the frame should
    /// be skipped, e.g. after the surface was lost and reconfigured.
    pub fn begin_frame(&mut self) -> Result<Option<Frame>> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                debug!("Surface lost or outdated, reconfiguring");
                self.surface
                    .configure(&self.gpu_context.device, &self.surface_config);
                return Ok(None);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("Timed out acquiring surface texture");
                return Ok(None);
            }
            Err(e) => return Err(Error::Gpu(format!("Failed to get surface texture: {:?}", e))),
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .gpu_context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        Ok(Some(Frame {
            output,
            view,
            encoder,
        }))
    }

    /// Clear the frame and draw the recorded lines and points
    pub fn draw_scene(&self, frame: &mut Frame, draw_list: &DrawList) {
        let line_buffer = (!draw_list.lines().is_empty()).then(|| {
            self.gpu_context.create_buffer_init(
                "Line Vertex Buffer",
                draw_list.lines(),
                wgpu::BufferUsages::VERTEX,
            )
        });
        let point_buffer = (!draw_list.points().is_empty()).then(|| {
            self.gpu_context.create_buffer_init(
                "Point Instance Buffer",
                draw_list.points(),
                wgpu::BufferUsages::VERTEX,
            )
        });

        let [r, g, b, a] = self.config.background_color;
        let mut render_pass = frame
            .encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
        if let Some(buffer) = &line_buffer {
            render_pass.set_pipeline(&self.line_pipeline);
            render_pass.set_vertex_buffer(0, buffer.slice(..));
            render_pass.draw(0..draw_list.lines().len() as u32, 0..1);
        }
        if let Some(buffer) = &point_buffer {
            render_pass.set_pipeline(&self.point_pipeline);
            render_pass.set_vertex_buffer(0, buffer.slice(..));
            render_pass.draw(0..QUAD_VERTICES, 0..draw_list.points().len() as u32);
        }
    }

    /// Submit the frame's commands and present it
    pub fn end_frame(&self, frame: Frame) {
        self.gpu_context
            .queue
            .submit(std::iter::once(frame.encoder.finish()));
        frame.output.present();
    }
}
