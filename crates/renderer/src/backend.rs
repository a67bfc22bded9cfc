//! The GPU context capability a surface draws through.

use image::RgbaImage;

use crate::error::RenderError;
use crate::gpu::KernelUniforms;
use crate::kernel::KernelSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub(crate) u32);

/// Everything a surface needs from a rendering context.
///
/// Handles are only meaningful to the backend that issued them. Releasing a
/// handle twice, or drawing with a released one, is reported as
/// [`RenderError::Draw`] rather than a panic.
pub trait RenderBackend {
    /// Short name used in log fields.
    fn label(&self) -> &str;

    fn compile(&mut self, source: &KernelSource) -> Result<ProgramHandle, RenderError>;

    fn create_quad(&mut self, vertices: &[[f32; 2]]) -> Result<BufferHandle, RenderError>;

    /// Resizes the canvas and viewport, in device pixels.
    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError>;

    fn draw(
        &mut self,
        program: ProgramHandle,
        quad: BufferHandle,
        uniforms: &KernelUniforms,
    ) -> Result<(), RenderError>;

    /// Copies the current canvas back, rows top to bottom.
    fn read_pixels(&mut self) -> Result<RgbaImage, RenderError>;

    fn release_buffer(&mut self, buffer: BufferHandle);

    fn release_program(&mut self, program: ProgramHandle);
}

/// Counter shared by both backends for issuing handles.
#[derive(Debug, Default)]
pub(crate) struct HandleAllocator {
    next: u32,
}

impl HandleAllocator {
    pub(crate) fn next(&mut self) -> u32 {
        self.next += 1;
        self.next
    }
}
