use bytemuck::{Pod, Zeroable};
use okcolor::Colorspace;

use crate::types::{RenderParameters, RingAppearance};

/// Mirror of the `KernelParams` std140 block in the kernel prelude.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KernelUniforms {
    pub resolution: [f32; 2],
    pub hue: f32,
    pub colorspace: i32,
    pub ring_lightness: f32,
    pub ring_chroma: f32,
    pub max_chroma: f32,
    pub padding: f32,
}

unsafe impl Zeroable for KernelUniforms {}
unsafe impl Pod for KernelUniforms {}

impl KernelUniforms {
    pub fn new(params: &RenderParameters, ring: RingAppearance, max_chroma: f32) -> Self {
        let (width, height) = params.physical_size();
        Self {
            resolution: [width as f32, height as f32],
            hue: params.hue,
            colorspace: params.colorspace.shader_index(),
            ring_lightness: ring.lightness,
            ring_chroma: ring.chroma,
            max_chroma,
            padding: 0.0,
        }
    }

    /// Canvas size in device pixels.
    pub fn extent(&self) -> (u32, u32) {
        (
            self.resolution[0].max(1.0) as u32,
            self.resolution[1].max(1.0) as u32,
        )
    }

    pub fn colorspace(&self) -> Colorspace {
        Colorspace::from_shader_index(self.colorspace).unwrap_or_default()
    }

    pub fn ring(&self) -> RingAppearance {
        RingAppearance {
            lightness: self.ring_lightness,
            chroma: self.ring_chroma,
        }
    }
}
