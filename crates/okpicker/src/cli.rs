use std::path::PathBuf;

use clap::{Parser, Subcommand};
use okcolor::{Colorspace, Rgb};
use renderer::{BackendChoice, SurfaceKind};

#[derive(Parser, Debug)]
#[command(
    name = "okpicker",
    author,
    version,
    about = "Perceptual color picker (OKLCH, OKHSL, display-P3)",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub overrides: ConfigOverrides,
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Flags layered on top of `okpicker.toml`.
#[derive(Parser, Debug, Default, Clone)]
pub struct ConfigOverrides {
    /// Configuration file to load instead of the discovered `okpicker.toml`.
    #[arg(long, global = true, env = "OKPICKER_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Colorspace to start in: `oklch`, `okhsl` or `display-p3`.
    #[arg(long, global = true, value_name = "MODE", value_parser = parse_colorspace)]
    pub colorspace: Option<Colorspace>,

    /// Initial hue in degrees.
    #[arg(long, global = true, value_name = "DEGREES", allow_negative_numbers = true)]
    pub hue: Option<f32>,

    /// Frame cap for redraws (0=uncapped).
    #[arg(long, global = true, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Backing-store scale; defaults to the monitor scale factor in a window.
    #[arg(long, global = true, value_name = "RATIO")]
    pub device_pixel_ratio: Option<f32>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the picker window (default when no command is given).
    Run,
    /// Render one surface to a PNG file and exit.
    Export(ExportArgs),
    /// Look up the color under a point of the gamut square.
    Probe(ProbeArgs),
    /// Show a hex color in OKLCH and OKHSL coordinates.
    Convert(ConvertArgs),
    /// Print the GPU adapter the picker would use.
    Adapter,
    /// Manage the configuration file.
    Config(ConfigCommand),
}

#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Surface to render: `ring` or `square`.
    #[arg(long, value_name = "SURFACE", value_parser = parse_surface, default_value = "square")]
    pub surface: SurfaceKind,

    /// Destination PNG path.
    #[arg(long, short, value_name = "PATH", value_parser = parse_png_path)]
    pub output: PathBuf,

    /// Render backend: `auto`, `gpu` or `cpu`.
    #[arg(long, value_name = "BACKEND", default_value_t = BackendChoice::Auto)]
    pub backend: BackendChoice,

    /// Override the surface size in CSS pixels (e.g. `256x256`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_dimensions)]
    pub size: Option<(u32, u32)>,
}

#[derive(Parser, Debug)]
pub struct ProbeArgs {
    /// Horizontal position on the square, 0 (black edge) to 1.
    #[arg(value_name = "X")]
    pub x: f32,

    /// Vertical position on the square, 0 (grey axis) to 1.
    #[arg(value_name = "Y")]
    pub y: f32,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct ConvertArgs {
    /// sRGB color as `#rrggbb` or `rrggbb`.
    #[arg(value_name = "HEX", value_parser = parse_hex)]
    pub color: Rgb,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default `okpicker.toml` into the config directory.
    Init {
        /// Replace an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Parse and validate the active configuration.
    Check,
    /// Print the resolved config directory and file.
    Where,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_colorspace(value: &str) -> Result<Colorspace, String> {
    value.parse::<Colorspace>().map_err(|err| err.to_string())
}

pub fn parse_surface(value: &str) -> Result<SurfaceKind, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "ring" | "hue-ring" | "hue" => Ok(SurfaceKind::HueRing),
        "square" | "gamut-square" | "gamut" => Ok(SurfaceKind::GamutSquare),
        other => Err(format!("unknown surface '{other}'; expected ring or square")),
    }
}

pub fn parse_png_path(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => Ok(path),
        None => Err("export path has no extension; expected .png".to_string()),
        Some(other) => Err(format!(
            "unsupported export format '.{other}'; expected .png"
        )),
    }
}

pub fn parse_dimensions(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| "invalid width".to_string())?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| "invalid height".to_string())?;
    if width == 0 || height == 0 {
        return Err("dimensions must be greater than zero".into());
    }
    Ok((width, height))
}

pub fn parse_hex(value: &str) -> Result<Rgb, String> {
    let digits = value.trim().trim_start_matches('#');
    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return Err(format!("invalid hex color '{value}'; expected #rgb or #rrggbb")),
    };
    let channel = |range: std::ops::Range<usize>| {
        expanded
            .get(range)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
            .ok_or_else(|| format!("invalid hex digits in '{value}'"))
    };
    Ok(Rgb::from_rgba8([channel(0..2)?, channel(2..4)?, channel(4..6)?, 255]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_surfaces_and_paths() {
        assert_eq!(parse_surface("Ring").unwrap(), SurfaceKind::HueRing);
        assert_eq!(parse_surface("gamut").unwrap(), SurfaceKind::GamutSquare);
        assert!(parse_surface("triangle").is_err());
        assert!(parse_png_path("out/square.PNG").is_ok());
        assert!(parse_png_path("square.exr").is_err());
        assert!(parse_png_path("square").is_err());
    }

    #[test]
    fn parses_dimensions() {
        assert_eq!(parse_dimensions("320x200").unwrap(), (320, 200));
        assert!(parse_dimensions("0x10").is_err());
        assert!(parse_dimensions("320").is_err());
    }

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_hex("#ff8000").unwrap().to_hex(), "#ff8000");
        assert_eq!(parse_hex("0f0").unwrap().to_hex(), "#00ff00");
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#gg0000").is_err());
    }

    #[test]
    fn overrides_parse_as_global_flags() {
        let cli = Cli::try_parse_from([
            "okpicker",
            "export",
            "--output",
            "ring.png",
            "--surface",
            "ring",
            "--hue",
            "-30",
            "--colorspace",
            "p3",
        ])
        .unwrap();
        assert_eq!(cli.overrides.hue, Some(-30.0));
        assert_eq!(cli.overrides.colorspace, Some(Colorspace::DisplayP3));
        match cli.command {
            Some(Command::Export(args)) => {
                assert_eq!(args.surface, SurfaceKind::HueRing);
                assert_eq!(args.backend, BackendChoice::Auto);
            }
            other => panic!("expected export command, got {other:?}"),
        }
    }
}
