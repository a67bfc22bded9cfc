use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::Arc;

use image::RgbaImage;
use wgpu::util::DeviceExt;

use crate::backend::{BufferHandle, HandleAllocator, ProgramHandle, RenderBackend};
use crate::compile::ShaderProgramBuilder;
use crate::error::RenderError;
use crate::kernel::KernelSource;
use crate::types::MAX_CANVAS_EDGE;

use super::context::GpuContext;
use super::pipeline::{kernel_pipeline, uniform_layout, CANVAS_FORMAT};
use super::uniforms::KernelUniforms;

const BYTES_PER_PIXEL: u32 = 4;

struct QuadBuffer {
    buffer: wgpu::Buffer,
    vertex_count: u32,
}

/// Offscreen render target a surface draws into.
pub(crate) struct Canvas {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("picker canvas"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: CANVAS_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            width,
            height,
        }
    }
}

/// [`RenderBackend`] on a `wgpu` device.
///
/// Several backends can share one [`GpuContext`]; each owns its canvas,
/// uniform buffer and pipelines.
pub struct WgpuBackend {
    context: Arc<GpuContext>,
    builder: ShaderProgramBuilder,
    handles: HandleAllocator,
    uniform_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    programs: HashMap<u32, wgpu::RenderPipeline>,
    buffers: HashMap<u32, QuadBuffer>,
    canvas: Option<Canvas>,
}

impl WgpuBackend {
    pub fn new(context: Arc<GpuContext>) -> Self {
        let device = &context.device;
        let uniform_layout = uniform_layout(device);
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("kernel uniforms"),
            size: std::mem::size_of::<KernelUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("kernel uniform bind group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        Self {
            context,
            builder: ShaderProgramBuilder::new(),
            handles: HandleAllocator::default(),
            uniform_layout,
            uniform_buffer,
            uniform_bind_group,
            programs: HashMap::new(),
            buffers: HashMap::new(),
            canvas: None,
        }
    }

    pub fn context(&self) -> &Arc<GpuContext> {
        &self.context
    }

    pub(crate) fn canvas(&self) -> Option<&Canvas> {
        self.canvas.as_ref()
    }

    fn canvas_or_err(&self) -> Result<&Canvas, RenderError> {
        self.canvas
            .as_ref()
            .ok_or_else(|| RenderError::Draw("canvas has not been sized".into()))
    }
}

impl RenderBackend for WgpuBackend {
    fn label(&self) -> &str {
        "wgpu"
    }

    fn compile(&mut self, source: &KernelSource) -> Result<ProgramHandle, RenderError> {
        self.builder.validate(source)?;
        let pipeline = kernel_pipeline(&self.context, &self.uniform_layout, source)?;
        let id = self.handles.next();
        self.programs.insert(id, pipeline);
        Ok(ProgramHandle(id))
    }

    fn create_quad(&mut self, vertices: &[[f32; 2]]) -> Result<BufferHandle, RenderError> {
        if vertices.is_empty() {
            return Err(RenderError::Draw("quad has no vertices".into()));
        }
        let buffer = self
            .context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("picker quad"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let id = self.handles.next();
        self.buffers.insert(
            id,
            QuadBuffer {
                buffer,
                vertex_count: vertices.len() as u32,
            },
        );
        Ok(BufferHandle(id))
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        let limit = MAX_CANVAS_EDGE.min(self.context.profile.max_texture_dimension);
        if width == 0 || height == 0 || width > limit || height > limit {
            return Err(RenderError::configuration(format!(
                "canvas {width}x{height} is outside 1..={limit}"
            )));
        }
        if self
            .canvas
            .as_ref()
            .is_some_and(|canvas| (canvas.width, canvas.height) == (width, height))
        {
            return Ok(());
        }
        tracing::debug!(width, height, "allocating picker canvas");
        self.canvas = Some(Canvas::new(&self.context.device, width, height));
        Ok(())
    }

    fn draw(
        &mut self,
        program: ProgramHandle,
        quad: BufferHandle,
        uniforms: &KernelUniforms,
    ) -> Result<(), RenderError> {
        let pipeline = self
            .programs
            .get(&program.0)
            .ok_or_else(|| RenderError::Draw(format!("unknown program {}", program.0)))?;
        let quad = self
            .buffers
            .get(&quad.0)
            .ok_or_else(|| RenderError::Draw(format!("unknown quad buffer {}", quad.0)))?;
        let canvas = self.canvas_or_err()?;

        let context = &self.context;
        let ((), error) = context.capture_validation(|| {
            context
                .queue
                .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
            let mut encoder =
                context
                    .device
                    .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                        label: Some("picker encoder"),
                    });
            {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("picker pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &canvas.view,
                        depth_slice: None,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    occlusion_query_set: None,
                    timestamp_writes: None,
                });
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                pass.set_vertex_buffer(0, quad.buffer.slice(..));
                pass.set_viewport(
                    0.0,
                    0.0,
                    canvas.width as f32,
                    canvas.height as f32,
                    0.0,
                    1.0,
                );
                pass.draw(0..quad.vertex_count, 0..1);
            }
            context.queue.submit(std::iter::once(encoder.finish()));
        });

        match error {
            Some(err) => Err(RenderError::Draw(err.to_string())),
            None => Ok(()),
        }
    }

    fn read_pixels(&mut self) -> Result<RgbaImage, RenderError> {
        let canvas = self.canvas_or_err()?;
        let device = &self.context.device;
        let unpadded = canvas.width * BYTES_PER_PIXEL;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded = unpadded.div_ceil(align) * align;

        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("canvas readback"),
            size: u64::from(padded) * u64::from(canvas.height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("canvas readback encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &canvas.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(canvas.height),
                },
            },
            wgpu::Extent3d {
                width: canvas.width,
                height: canvas.height,
                depth_or_array_layers: 1,
            },
        );
        self.context.queue.submit(std::iter::once(encoder.finish()));

        let slice = readback.slice(..);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.context.wait_idle()?;
        receiver
            .recv()
            .map_err(|_| RenderError::Draw("readback callback dropped".into()))?
            .map_err(|err| RenderError::Draw(format!("failed to map readback: {err}")))?;

        let mut pixels = Vec::with_capacity((unpadded * canvas.height) as usize);
        {
            let mapped = slice.get_mapped_range();
            for row in mapped.chunks_exact(padded as usize) {
                pixels.extend_from_slice(&row[..unpadded as usize]);
            }
        }
        readback.unmap();

        RgbaImage::from_raw(canvas.width, canvas.height, pixels)
            .ok_or_else(|| RenderError::Draw("readback size mismatch".into()))
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        match self.buffers.remove(&buffer.0) {
            Some(quad) => quad.buffer.destroy(),
            None => tracing::warn!(buffer = buffer.0, "released unknown quad buffer"),
        }
    }

    fn release_program(&mut self, program: ProgramHandle) {
        if self.programs.remove(&program.0).is_none() {
            tracing::warn!(program = program.0, "released unknown program");
        }
    }
}
