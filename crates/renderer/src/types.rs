use std::fmt;

use okcolor::Colorspace;
use pickerconfig::PickerConfig;

use crate::error::RenderError;

/// Largest backing-store edge accepted by either surface, in device pixels.
pub const MAX_CANVAS_EDGE: u32 = 8192;

/// Which picker kernel a surface runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    HueRing,
    GamutSquare,
}

impl SurfaceKind {
    pub fn label(self) -> &'static str {
        match self {
            SurfaceKind::HueRing => "hue ring",
            SurfaceKind::GamutSquare => "gamut square",
        }
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle of a render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    Uninitialized,
    Compiling,
    Ready,
    Disposed,
}

/// Fixed lightness and chroma sampled by the hue ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingAppearance {
    pub lightness: f32,
    pub chroma: f32,
}

impl Default for RingAppearance {
    fn default() -> Self {
        Self {
            lightness: 0.6,
            chroma: 0.15,
        }
    }
}

/// Chroma shown at the top edge of the gamut square.
pub const DEFAULT_MAX_CHROMA: f32 = 0.4;

/// Everything a draw reads. Copied whole at draw time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParameters {
    pub hue: f32,
    pub colorspace: Colorspace,
    /// Logical (CSS) size.
    pub width_px: u32,
    pub height_px: u32,
    pub device_pixel_ratio: f32,
}

impl RenderParameters {
    /// Backing-store size in device pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        (
            scale_edge(self.width_px, self.device_pixel_ratio),
            scale_edge(self.height_px, self.device_pixel_ratio),
        )
    }
}

fn scale_edge(edge: u32, ratio: f32) -> u32 {
    ((edge as f32 * ratio).round() as u32).max(1)
}

/// Construction options shared by both surfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceOptions {
    pub colorspace: Colorspace,
    pub width: u32,
    pub height: u32,
    /// Required by the gamut square; ignored by the ring.
    pub hue: Option<f32>,
    pub device_pixel_ratio: f32,
    /// Frame cap for paint coalescing; `None` or zero means one frame per refresh.
    pub fps: Option<f32>,
    pub ring: RingAppearance,
    pub max_chroma: f32,
}

impl SurfaceOptions {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            colorspace: Colorspace::default(),
            width,
            height,
            hue: None,
            device_pixel_ratio: 1.0,
            fps: None,
            ring: RingAppearance::default(),
            max_chroma: DEFAULT_MAX_CHROMA,
        }
    }

    pub fn with_hue(mut self, hue: f32) -> Self {
        self.hue = Some(hue);
        self
    }

    pub fn with_colorspace(mut self, colorspace: Colorspace) -> Self {
        self.colorspace = colorspace;
        self
    }

    pub fn with_device_pixel_ratio(mut self, ratio: f32) -> Self {
        self.device_pixel_ratio = ratio;
        self
    }

    /// Ring options from a parsed configuration file.
    pub fn ring_from_config(config: &PickerConfig) -> Self {
        Self {
            colorspace: config.colorspace,
            width: config.ring.width,
            height: config.ring.height,
            hue: None,
            device_pixel_ratio: config.device_pixel_ratio.unwrap_or(1.0),
            fps: config.fps,
            ring: RingAppearance {
                lightness: config.ring.lightness,
                chroma: config.ring.chroma,
            },
            max_chroma: config.square.max_chroma,
        }
    }

    /// Square options from a parsed configuration file.
    pub fn square_from_config(config: &PickerConfig) -> Self {
        Self {
            width: config.square.width,
            height: config.square.height,
            hue: Some(config.hue),
            ..Self::ring_from_config(config)
        }
    }

    pub(crate) fn validate(&self, kind: SurfaceKind) -> Result<(), RenderError> {
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if value == 0 {
                return Err(RenderError::configuration(format!(
                    "{kind} {name} must be a positive integer"
                )));
            }
        }

        if !self.device_pixel_ratio.is_finite() || self.device_pixel_ratio <= 0.0 {
            return Err(RenderError::configuration(format!(
                "device pixel ratio {} must be greater than zero",
                self.device_pixel_ratio
            )));
        }

        let (width, height) = (
            scale_edge(self.width, self.device_pixel_ratio),
            scale_edge(self.height, self.device_pixel_ratio),
        );
        if width > MAX_CANVAS_EDGE || height > MAX_CANVAS_EDGE {
            return Err(RenderError::configuration(format!(
                "{kind} backing store {width}x{height} exceeds {MAX_CANVAS_EDGE} pixels"
            )));
        }

        if let Some(fps) = self.fps {
            if !fps.is_finite() || fps < 0.0 {
                return Err(RenderError::configuration(format!("fps {fps} must be >= 0")));
            }
        }

        match (kind, self.hue) {
            (SurfaceKind::GamutSquare, None) => {
                return Err(RenderError::configuration(
                    "gamut square requires an initial hue",
                ));
            }
            (_, Some(hue)) if !hue.is_finite() => {
                return Err(RenderError::configuration(format!("hue {hue} is not finite")));
            }
            _ => {}
        }

        if !(self.ring.lightness > 0.0 && self.ring.lightness < 1.0) || self.ring.chroma < 0.0 {
            return Err(RenderError::configuration(format!(
                "ring appearance L={} C={} is out of range",
                self.ring.lightness, self.ring.chroma
            )));
        }

        if !(self.max_chroma > 0.0 && self.max_chroma.is_finite()) {
            return Err(RenderError::configuration(format!(
                "max chroma {} must be greater than zero",
                self.max_chroma
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_requires_hue() {
        let options = SurfaceOptions::new(100, 100);
        assert!(options.validate(SurfaceKind::HueRing).is_ok());
        let err = options.validate(SurfaceKind::GamutSquare).unwrap_err();
        assert!(matches!(err, RenderError::Configuration(_)));
        assert!(options
            .with_hue(30.0)
            .validate(SurfaceKind::GamutSquare)
            .is_ok());
    }

    #[test]
    fn rejects_zero_extent_and_bad_ratio() {
        assert!(SurfaceOptions::new(0, 10)
            .validate(SurfaceKind::HueRing)
            .is_err());
        assert!(SurfaceOptions::new(10, 10)
            .with_device_pixel_ratio(0.0)
            .validate(SurfaceKind::HueRing)
            .is_err());
    }

    #[test]
    fn physical_size_applies_pixel_ratio() {
        let params = RenderParameters {
            hue: 0.0,
            colorspace: Colorspace::Oklch,
            width_px: 150,
            height_px: 75,
            device_pixel_ratio: 2.0,
        };
        assert_eq!(params.physical_size(), (300, 150));
    }

    #[test]
    fn config_sections_map_onto_options() {
        let config = PickerConfig::from_toml_str(
            r#"
version = 1
hue = 42
device_pixel_ratio = 1.5

[ring]
height = 20

[square]
width = 128
height = 96
"#,
        )
        .unwrap();
        let ring = SurfaceOptions::ring_from_config(&config);
        assert_eq!((ring.width, ring.height), (360, 20));
        assert_eq!(ring.hue, None);
        let square = SurfaceOptions::square_from_config(&config);
        assert_eq!((square.width, square.height), (128, 96));
        assert_eq!(square.hue, Some(42.0));
        assert_eq!(square.device_pixel_ratio, 1.5);
    }
}
