use anyhow::{Context, Result};
use okcolor::{
    linear_srgb_to_p3, linear_to_oklab, linear_to_srgb, oklab_to_oklch, oklch_to_okhsl,
    srgb_to_linear, Colorspace, Okhsl, Oklch, Rgb,
};
use pickerconfig::PickerConfig;
use renderer::{
    export_png, CpuBackend, GamutSquareSurface, GpuContext, Hit, HueRingSurface,
    PickerController, SurfaceKind, SurfaceOptions,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::cli::{ConvertArgs, ExportArgs, ProbeArgs};

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run_window(config: &PickerConfig) -> Result<()> {
    tracing::info!(
        colorspace = %config.colorspace,
        hue = config.hue,
        fps = ?config.frame_rate(),
        "starting okpicker"
    );
    renderer::run_picker_window(config)
}

pub fn run_export(config: &PickerConfig, args: ExportArgs) -> Result<()> {
    let mut options = match args.surface {
        SurfaceKind::HueRing => SurfaceOptions::ring_from_config(config),
        SurfaceKind::GamutSquare => SurfaceOptions::square_from_config(config),
    };
    if let Some((width, height)) = args.size {
        options.width = width;
        options.height = height;
    }
    let report = export_png(args.surface, options, args.backend, &args.output)?;
    println!(
        "Wrote {} ({}x{}, {} backend) to {}",
        report.kind,
        report.width,
        report.height,
        report.backend,
        report.path.display()
    );
    Ok(())
}

#[derive(Debug, Serialize)]
struct ProbeReport {
    hex: Option<String>,
    rgb: [f32; 3],
    in_gamut: bool,
    colorspace: Colorspace,
    oklch: Oklch,
}

pub fn run_probe(config: &PickerConfig, args: ProbeArgs) -> Result<()> {
    let ring = HueRingSurface::new(CpuBackend::new(), SurfaceOptions::ring_from_config(config))
        .context("failed to create hue ring")?;
    let square =
        GamutSquareSurface::new(CpuBackend::new(), SurfaceOptions::square_from_config(config))
            .context("failed to create gamut square")?;
    let mut controller = PickerController::new(ring, square);
    let picked = controller
        .pointer_down(Some(Hit::Square {
            nx: args.x,
            ny: args.y,
        }))?
        .context("probe point did not land on the square")?;

    let report = ProbeReport {
        hex: picked.in_gamut.then(|| picked.rgb.to_hex()),
        rgb: picked.rgb.to_array(),
        in_gamut: picked.in_gamut,
        colorspace: picked.colorspace,
        oklch: picked.lch,
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("colorspace: {}", report.colorspace);
    println!(
        "oklch:      {:.4} {:.4} {:.2}",
        report.oklch.l, report.oklch.c, report.oklch.h
    );
    match report.hex {
        Some(hex) => println!("color:      {hex}"),
        None => println!("color:      outside the gamut"),
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct ConvertReport {
    hex: String,
    oklch: Oklch,
    okhsl: Okhsl,
    display_p3: [f32; 3],
}

fn convert(color: Rgb) -> ConvertReport {
    let linear = srgb_to_linear(color);
    let oklch = oklab_to_oklch(linear_to_oklab(linear));
    ConvertReport {
        hex: color.to_hex(),
        oklch,
        okhsl: oklch_to_okhsl(oklch),
        display_p3: linear_to_srgb(linear_srgb_to_p3(linear)).to_array(),
    }
}

pub fn run_convert(args: ConvertArgs) -> Result<()> {
    let report = convert(args.color);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!("hex:        {}", report.hex);
    println!(
        "oklch:      {:.4} {:.4} {:.2}",
        report.oklch.l, report.oklch.c, report.oklch.h
    );
    println!(
        "okhsl:      {:.2} {:.4} {:.4}",
        report.okhsl.h, report.okhsl.s, report.okhsl.l
    );
    let [r, g, b] = report.display_p3;
    println!("display-p3: {r:.4} {g:.4} {b:.4}");
    Ok(())
}

pub fn run_adapter() -> Result<()> {
    let context = GpuContext::headless().context("no usable GPU adapter")?;
    let profile = &context.profile;
    println!("adapter:  {}", profile.name);
    println!("backend:  {:?}", profile.backend);
    println!("type:     {:?}", profile.device_type);
    println!("driver:   {}", profile.driver);
    println!("max edge: {}", profile.max_texture_dimension);
    if profile.is_software() {
        println!("note:     software rasterizer");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_reports_white_and_primaries() {
        let white = convert(Rgb::new(1.0, 1.0, 1.0));
        assert!((white.oklch.l - 1.0).abs() < 1e-3);
        assert!(white.oklch.c < 1e-3);

        let red = convert(Rgb::new(1.0, 0.0, 0.0));
        assert!((red.oklch.l - 0.628).abs() < 2e-3);
        assert!((red.oklch.h - 29.23).abs() < 0.5);
        // sRGB red sits inside P3, so no P3 channel reaches 1.
        assert!(red.display_p3.iter().all(|c| (0.0..1.0).contains(c)));
    }
}
