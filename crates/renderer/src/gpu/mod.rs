//! `wgpu` implementation of the render backend.
//!
//! - `context` owns the instance/adapter/device and can be shared between
//!   surfaces and the window host.
//! - `pipeline` turns a validated kernel into a render pipeline, and builds
//!   the blit used to place canvases in a window.
//! - `uniforms` mirrors the kernel's std140 parameter block.
//! - `state` is the backend proper: offscreen canvas, draws, readback.

mod context;
mod pipeline;
mod state;
mod uniforms;

pub use context::{AdapterProfile, GpuContext};
pub(crate) use pipeline::BlitPipeline;
pub use state::WgpuBackend;
pub use uniforms::KernelUniforms;
