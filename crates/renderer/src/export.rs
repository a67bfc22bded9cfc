//! Headless rendering of a surface straight to a PNG file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use image::RgbaImage;

use crate::backend::RenderBackend;
use crate::cpu::CpuBackend;
use crate::error::RenderError;
use crate::gpu::{GpuContext, WgpuBackend};
use crate::surface::{GamutSquareSurface, HueRingSurface};
use crate::types::{SurfaceKind, SurfaceOptions};

/// Which backend a headless render uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendChoice {
    /// GPU when an adapter is available, CPU otherwise.
    #[default]
    Auto,
    Gpu,
    Cpu,
}

impl FromStr for BackendChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(BackendChoice::Auto),
            "gpu" | "wgpu" => Ok(BackendChoice::Gpu),
            "cpu" | "software" => Ok(BackendChoice::Cpu),
            other => Err(format!("unknown backend '{other}'; expected auto, gpu or cpu")),
        }
    }
}

impl fmt::Display for BackendChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendChoice::Auto => "auto",
            BackendChoice::Gpu => "gpu",
            BackendChoice::Cpu => "cpu",
        })
    }
}

#[derive(Debug, Clone)]
pub struct ExportReport {
    pub path: PathBuf,
    pub kind: SurfaceKind,
    pub backend: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Draws one frame of `kind` and returns the canvas.
pub fn render_image(
    kind: SurfaceKind,
    options: SurfaceOptions,
    choice: BackendChoice,
) -> Result<(RgbaImage, &'static str), RenderError> {
    match choice {
        BackendChoice::Cpu => Ok((render_with(kind, CpuBackend::new(), options)?, "cpu")),
        BackendChoice::Gpu => {
            let context = GpuContext::headless()?;
            Ok((render_with(kind, WgpuBackend::new(context), options)?, "wgpu"))
        }
        BackendChoice::Auto => match GpuContext::headless() {
            Ok(context) => Ok((render_with(kind, WgpuBackend::new(context), options)?, "wgpu")),
            Err(err) => {
                tracing::warn!(error = %err, "no GPU available; rendering on the CPU");
                Ok((render_with(kind, CpuBackend::new(), options)?, "cpu"))
            }
        },
    }
}

fn render_with<B: RenderBackend>(
    kind: SurfaceKind,
    backend: B,
    options: SurfaceOptions,
) -> Result<RgbaImage, RenderError> {
    match kind {
        SurfaceKind::HueRing => {
            let mut ring = HueRingSurface::new(backend, options)?;
            ring.draw_now()?;
            ring.read_pixels()
        }
        SurfaceKind::GamutSquare => {
            let mut square = GamutSquareSurface::new(backend, options)?;
            square.draw_now()?;
            square.read_pixels()
        }
    }
}

/// Renders `kind` and writes it to `path` as PNG.
pub fn export_png(
    kind: SurfaceKind,
    options: SurfaceOptions,
    choice: BackendChoice,
    path: &Path,
) -> Result<ExportReport> {
    let (image, backend) = render_image(kind, options, choice)
        .with_context(|| format!("failed to render {kind}"))?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    image
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("failed to write {}", path.display()))?;
    let (width, height) = image.dimensions();
    tracing::info!(
        surface = %kind,
        backend,
        width,
        height,
        path = %path.display(),
        "exported picker canvas"
    );
    Ok(ExportReport {
        path: path.to_path_buf(),
        kind,
        backend,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_export_writes_png_of_physical_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("square.png");
        let options = SurfaceOptions::new(40, 30)
            .with_hue(200.0)
            .with_device_pixel_ratio(2.0);
        let report =
            export_png(SurfaceKind::GamutSquare, options, BackendChoice::Cpu, &path).unwrap();
        assert_eq!((report.width, report.height), (80, 60));
        assert_eq!(report.backend, "cpu");
        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (80, 60));
    }

    #[test]
    fn invalid_options_fail_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ring.png");
        let err = export_png(
            SurfaceKind::GamutSquare,
            SurfaceOptions::new(10, 10),
            BackendChoice::Cpu,
            &path,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("requires an initial hue"));
        assert!(!path.exists());
    }

    #[test]
    fn backend_choice_parses() {
        assert_eq!("GPU".parse::<BackendChoice>(), Ok(BackendChoice::Gpu));
        assert_eq!("software".parse::<BackendChoice>(), Ok(BackendChoice::Cpu));
        assert!("vulkan".parse::<BackendChoice>().is_err());
    }
}
