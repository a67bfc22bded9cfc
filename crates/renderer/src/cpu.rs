use std::collections::HashMap;

use image::{Rgba, RgbaImage};

use crate::backend::{BufferHandle, HandleAllocator, ProgramHandle, RenderBackend};
use crate::compile::ShaderProgramBuilder;
use crate::error::RenderError;
use crate::gpu::KernelUniforms;
use crate::kernel::{cpu, KernelSource, QUAD_VERTICES};
use crate::types::{SurfaceKind, MAX_CANVAS_EDGE};

/// Software rasterizer that evaluates the kernels with `okcolor`.
///
/// Kernels are still validated with naga so a broken kernel fails the same
/// way on both backends.
pub struct CpuBackend {
    builder: ShaderProgramBuilder,
    handles: HandleAllocator,
    programs: HashMap<u32, SurfaceKind>,
    buffers: HashMap<u32, usize>,
    canvas: RgbaImage,
    draws: u64,
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuBackend {
    pub fn new() -> Self {
        Self {
            builder: ShaderProgramBuilder::new(),
            handles: HandleAllocator::default(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            canvas: RgbaImage::new(1, 1),
            draws: 0,
        }
    }

    pub fn draw_count(&self) -> u64 {
        self.draws
    }

    pub fn live_resources(&self) -> (usize, usize) {
        (self.programs.len(), self.buffers.len())
    }
}

impl RenderBackend for CpuBackend {
    fn label(&self) -> &str {
        "cpu"
    }

    fn compile(&mut self, source: &KernelSource) -> Result<ProgramHandle, RenderError> {
        let program = self.builder.validate(source)?;
        let id = self.handles.next();
        self.programs.insert(id, program.kind);
        Ok(ProgramHandle(id))
    }

    fn create_quad(&mut self, vertices: &[[f32; 2]]) -> Result<BufferHandle, RenderError> {
        if vertices.len() != QUAD_VERTICES.len() {
            return Err(RenderError::Draw(format!(
                "quad needs {} vertices, got {}",
                QUAD_VERTICES.len(),
                vertices.len()
            )));
        }
        let id = self.handles.next();
        self.buffers.insert(id, vertices.len());
        Ok(BufferHandle(id))
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if width == 0 || height == 0 || width > MAX_CANVAS_EDGE || height > MAX_CANVAS_EDGE {
            return Err(RenderError::configuration(format!(
                "canvas {width}x{height} is outside 1..={MAX_CANVAS_EDGE}"
            )));
        }
        if self.canvas.dimensions() != (width, height) {
            self.canvas = RgbaImage::new(width, height);
        }
        Ok(())
    }

    fn draw(
        &mut self,
        program: ProgramHandle,
        quad: BufferHandle,
        uniforms: &KernelUniforms,
    ) -> Result<(), RenderError> {
        let kind = *self
            .programs
            .get(&program.0)
            .ok_or_else(|| RenderError::Draw(format!("unknown program {}", program.0)))?;
        if !self.buffers.contains_key(&quad.0) {
            return Err(RenderError::Draw(format!("unknown quad buffer {}", quad.0)));
        }

        let (width, height) = self.canvas.dimensions();
        let colorspace = uniforms.colorspace();
        match kind {
            SurfaceKind::HueRing => {
                let ring = uniforms.ring();
                // One hue per column.
                for px in 0..width {
                    let (x, _) = cpu::pixel_center(px, 0, width, height);
                    let texel = Rgba(cpu::hue_ring_pixel(x, ring, colorspace).to_rgba8());
                    for py in 0..height {
                        self.canvas.put_pixel(px, py, texel);
                    }
                }
            }
            SurfaceKind::GamutSquare => {
                let cusp = cpu::square_cusp(uniforms.hue, colorspace);
                for (px, py, texel) in self.canvas.enumerate_pixels_mut() {
                    let (x, y) = cpu::pixel_center(px, py, width, height);
                    let rgb = cpu::gamut_square_pixel(
                        x,
                        y,
                        uniforms.hue,
                        colorspace,
                        uniforms.max_chroma,
                        cusp,
                    );
                    *texel = Rgba(rgb.to_rgba8());
                }
            }
        }
        self.draws += 1;
        Ok(())
    }

    fn read_pixels(&mut self) -> Result<RgbaImage, RenderError> {
        Ok(self.canvas.clone())
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        if self.buffers.remove(&buffer.0).is_none() {
            tracing::warn!(buffer = buffer.0, "released unknown quad buffer");
        }
    }

    fn release_program(&mut self, program: ProgramHandle) {
        if self.programs.remove(&program.0).is_none() {
            tracing::warn!(program = program.0, "released unknown program");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RenderParameters, RingAppearance};
    use okcolor::{Colorspace, Rgb};

    fn square_uniforms(hue: f32, size: u32) -> KernelUniforms {
        let params = RenderParameters {
            hue,
            colorspace: Colorspace::Oklch,
            width_px: size,
            height_px: size,
            device_pixel_ratio: 1.0,
        };
        KernelUniforms::new(&params, RingAppearance::default(), 0.4)
    }

    #[test]
    fn square_has_white_corner_and_grey_floor() {
        let mut backend = CpuBackend::new();
        let program = backend
            .compile(&KernelSource::for_kind(SurfaceKind::GamutSquare))
            .unwrap();
        let quad = backend.create_quad(&QUAD_VERTICES).unwrap();
        backend.resize(64, 64).unwrap();
        backend.draw(program, quad, &square_uniforms(264.0, 64)).unwrap();
        let image = backend.read_pixels().unwrap();
        // Top-left is high chroma at near-zero lightness.
        assert_eq!(image.get_pixel(0, 0).0, Rgb::WHITE.to_rgba8());
        // Bottom row is almost achromatic.
        let grey = image.get_pixel(32, 63).0;
        assert_ne!(grey, Rgb::WHITE.to_rgba8());
        assert!(grey[0].abs_diff(grey[2]) <= 4, "{grey:?}");
    }

    #[test]
    fn released_handles_cannot_draw() {
        let mut backend = CpuBackend::new();
        let program = backend
            .compile(&KernelSource::for_kind(SurfaceKind::HueRing))
            .unwrap();
        let quad = backend.create_quad(&QUAD_VERTICES).unwrap();
        backend.release_program(program);
        backend.release_buffer(quad);
        assert_eq!(backend.live_resources(), (0, 0));
        let err = backend
            .draw(program, quad, &square_uniforms(0.0, 1))
            .unwrap_err();
        assert!(matches!(err, RenderError::Draw(_)));
    }

    #[test]
    fn rejects_bad_quad_and_canvas() {
        let mut backend = CpuBackend::new();
        assert!(backend.create_quad(&QUAD_VERTICES[..3]).is_err());
        assert!(backend.resize(0, 10).is_err());
        assert!(backend.resize(MAX_CANVAS_EDGE + 1, 10).is_err());
    }
}
