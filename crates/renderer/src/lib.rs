//! Rasterization side of okpicker: hue ring and gamut square surfaces.
//!
//! ```text
//!   SurfaceOptions ──▶ RenderSurface<B> ──paint()──▶ FrameScheduler
//!                            │                            │ refresh
//!                            │ KernelUniforms ◀───────────┘
//!                            ▼
//!                     RenderBackend (wgpu | cpu) ──▶ canvas ──▶ window / PNG
//! ```
//!
//! Both surfaces share one kernel library. The GLSL variant runs on the GPU
//! through `wgpu`, and `kernel::cpu` evaluates the same math on the CPU for
//! color lookups, headless export without an adapter, and tests.

pub mod backend;
pub mod compile;
pub mod cpu;
pub mod error;
pub mod export;
pub mod gpu;
pub mod kernel;
pub mod surface;
pub mod types;
pub mod window;

pub use backend::{BufferHandle, ProgramHandle, RenderBackend};
pub use compile::{ShaderProgramBuilder, ValidatedProgram};
pub use cpu::CpuBackend;
pub use error::{RenderError, ShaderStageKind};
pub use export::{export_png, render_image, BackendChoice, ExportReport};
pub use gpu::{AdapterProfile, GpuContext, KernelUniforms, WgpuBackend};
pub use kernel::{KernelSource, KERNEL_LIBRARY, KERNEL_LIBRARY_VERSION, QUAD_VERTICES};
pub use surface::{GamutSquareSurface, HueRingSurface, RenderSurface};
pub use types::{
    RenderParameters, RingAppearance, SurfaceKind, SurfaceOptions, SurfaceState,
    DEFAULT_MAX_CHROMA, MAX_CANVAS_EDGE,
};
pub use window::{run_picker_window, Hit, PickedColor, PickerController, PickerLayout};
