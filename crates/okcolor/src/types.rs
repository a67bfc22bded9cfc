use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Linear-light RGB in the primaries of some [`Gamut`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LinearRgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// Transfer-encoded RGB. For display-P3 the channels hold P3 primaries with
/// the sRGB transfer curve, which is how P3 canvases expect them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Oklab {
    pub l: f32,
    pub a: f32,
    pub b: f32,
}

/// Polar OKLab. `h` is in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Oklch {
    pub l: f32,
    pub c: f32,
    pub h: f32,
}

/// Hue, saturation relative to the gamut boundary, and OKLab lightness.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Okhsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

/// Point of maximum chroma for one hue of a gamut.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GamutCusp {
    pub lightness: f32,
    pub chroma: f32,
}

impl LinearRgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn min_channel(self) -> f32 {
        self.r.min(self.g).min(self.b)
    }

    pub fn max_channel(self) -> f32 {
        self.r.max(self.g).max(self.b)
    }
}

impl Rgb {
    /// Sentinel written for out-of-gamut pixels.
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn max_channel(self) -> f32 {
        self.r.max(self.g).max(self.b)
    }

    pub fn clamped(self) -> Self {
        Self {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
        }
    }

    /// Quantizes to 8-bit RGBA the way an `rgba8unorm` target would.
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), 255]
    }

    pub fn from_rgba8(px: [u8; 4]) -> Self {
        Self {
            r: px[0] as f32 / 255.0,
            g: px[1] as f32 / 255.0,
            b: px[2] as f32 / 255.0,
        }
    }

    pub fn to_hex(self) -> String {
        let [r, g, b, _] = self.to_rgba8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

impl Oklch {
    pub const fn new(l: f32, c: f32, h: f32) -> Self {
        Self { l, c, h }
    }
}

impl Okhsl {
    pub const fn new(h: f32, s: f32, l: f32) -> Self {
        Self { h, s, l }
    }
}

/// RGB gamuts the kernels can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gamut {
    #[default]
    Srgb,
    DisplayP3,
}

/// Slice mode of the picker surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Colorspace {
    /// Lightness and absolute chroma against the sRGB gamut.
    #[default]
    Oklch,
    /// Lightness and chroma relative to the sRGB boundary.
    Okhsl,
    /// Lightness and absolute chroma against the display-P3 gamut.
    DisplayP3,
}

impl Colorspace {
    pub const ALL: [Colorspace; 3] = [Colorspace::Oklch, Colorspace::Okhsl, Colorspace::DisplayP3];

    pub fn gamut(self) -> Gamut {
        match self {
            Colorspace::Oklch | Colorspace::Okhsl => Gamut::Srgb,
            Colorspace::DisplayP3 => Gamut::DisplayP3,
        }
    }

    /// Integer code shared with the GLSL kernel library.
    pub fn shader_index(self) -> i32 {
        match self {
            Colorspace::Oklch => 0,
            Colorspace::Okhsl => 1,
            Colorspace::DisplayP3 => 2,
        }
    }

    pub fn from_shader_index(index: i32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|colorspace| colorspace.shader_index() == index)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Colorspace::Oklch => "oklch",
            Colorspace::Okhsl => "okhsl",
            Colorspace::DisplayP3 => "display-p3",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Colorspace::Oklch => Colorspace::Okhsl,
            Colorspace::Okhsl => Colorspace::DisplayP3,
            Colorspace::DisplayP3 => Colorspace::Oklch,
        }
    }
}

impl fmt::Display for Colorspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown colorspace '{0}'; expected 'oklch', 'okhsl' or 'display-p3'")]
pub struct ParseColorspaceError(pub String);

impl FromStr for Colorspace {
    type Err = ParseColorspaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oklch" => Ok(Colorspace::Oklch),
            "okhsl" => Ok(Colorspace::Okhsl),
            "display-p3" | "p3" | "displayp3" => Ok(Colorspace::DisplayP3),
            other => Err(ParseColorspaceError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colorspace_parses_aliases() {
        assert_eq!("OKLCH".parse::<Colorspace>(), Ok(Colorspace::Oklch));
        assert_eq!("p3".parse::<Colorspace>(), Ok(Colorspace::DisplayP3));
        assert!("hsv".parse::<Colorspace>().is_err());
    }

    #[test]
    fn colorspace_cycle_visits_every_mode() {
        let mut mode = Colorspace::Oklch;
        for expected in [Colorspace::Okhsl, Colorspace::DisplayP3, Colorspace::Oklch] {
            mode = mode.next();
            assert_eq!(mode, expected);
        }
    }

    #[test]
    fn shader_index_round_trips() {
        for colorspace in Colorspace::ALL {
            assert_eq!(
                Colorspace::from_shader_index(colorspace.shader_index()),
                Some(colorspace)
            );
        }
        assert_eq!(Colorspace::from_shader_index(7), None);
    }

    #[test]
    fn rgba8_quantization_clamps() {
        assert_eq!(Rgb::new(1.2, -0.1, 0.5).to_rgba8(), [255, 0, 128, 255]);
        assert_eq!(Rgb::WHITE.to_hex(), "#ffffff");
    }
}
