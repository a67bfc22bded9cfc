use okcolor::Colorspace;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialise configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub const CONFIG_VERSION: u32 = 1;
pub const MAX_SURFACE_EDGE: u32 = 8192;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PickerConfig {
    pub version: u32,
    #[serde(default)]
    pub colorspace: Colorspace,
    #[serde(default = "default_hue")]
    pub hue: f32,
    #[serde(
        default,
        deserialize_with = "deserialize_auto_f32",
        skip_serializing_if = "Option::is_none"
    )]
    pub fps: Option<f32>,
    #[serde(
        default,
        deserialize_with = "deserialize_auto_f32",
        skip_serializing_if = "Option::is_none"
    )]
    pub device_pixel_ratio: Option<f32>,
    #[serde(default)]
    pub ring: RingSection,
    #[serde(default)]
    pub square: SquareSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RingSection {
    #[serde(default = "default_ring_lightness")]
    pub lightness: f32,
    #[serde(default = "default_ring_chroma")]
    pub chroma: f32,
    #[serde(default = "default_ring_width")]
    pub width: u32,
    #[serde(default = "default_ring_height")]
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SquareSection {
    #[serde(default = "default_max_chroma")]
    pub max_chroma: f32,
    #[serde(default = "default_square_size")]
    pub width: u32,
    #[serde(default = "default_square_size")]
    pub height: u32,
}

fn default_hue() -> f32 {
    264.0
}

fn default_ring_lightness() -> f32 {
    0.6
}

fn default_ring_chroma() -> f32 {
    0.15
}

fn default_ring_width() -> u32 {
    360
}

fn default_ring_height() -> u32 {
    32
}

fn default_max_chroma() -> f32 {
    0.4
}

fn default_square_size() -> u32 {
    360
}

impl Default for RingSection {
    fn default() -> Self {
        Self {
            lightness: default_ring_lightness(),
            chroma: default_ring_chroma(),
            width: default_ring_width(),
            height: default_ring_height(),
        }
    }
}

impl Default for SquareSection {
    fn default() -> Self {
        Self {
            max_chroma: default_max_chroma(),
            width: default_square_size(),
            height: default_square_size(),
        }
    }
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            colorspace: Colorspace::default(),
            hue: default_hue(),
            fps: None,
            device_pixel_ratio: None,
            ring: RingSection::default(),
            square: SquareSection::default(),
        }
    }
}

// Accepts a number, or "auto"/"uncapped" for no value.
fn deserialize_auto_f32<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        Str(String),
        Num(f64),
    }

    let helper: Option<Helper> = Option::deserialize(deserializer)?;
    match helper {
        None => Ok(None),
        Some(Helper::Num(value)) => Ok(Some(value as f32)),
        Some(Helper::Str(raw)) => match raw.trim().to_ascii_lowercase().as_str() {
            "auto" | "uncapped" | "none" | "default" => Ok(None),
            other => other
                .parse::<f32>()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("invalid numeric setting '{other}'"))),
        },
    }
}

impl PickerConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: PickerConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Frame cap, with zero meaning uncapped.
    pub fn frame_rate(&self) -> Option<f32> {
        self.fps.filter(|fps| *fps > 0.0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected {CONFIG_VERSION}",
                self.version
            )));
        }

        if !self.hue.is_finite() {
            return Err(ConfigError::Invalid("hue must be a finite number".into()));
        }

        if let Some(fps) = self.fps {
            if !fps.is_finite() || fps < 0.0 {
                return Err(ConfigError::Invalid("fps must be >= 0".into()));
            }
        }

        if let Some(ratio) = self.device_pixel_ratio {
            if !ratio.is_finite() || ratio <= 0.0 {
                return Err(ConfigError::Invalid(
                    "device_pixel_ratio must be greater than zero".into(),
                ));
            }
        }

        if !(self.ring.lightness > 0.0 && self.ring.lightness < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "ring.lightness {} must lie strictly between 0 and 1",
                self.ring.lightness
            )));
        }

        if !(0.0..=0.5).contains(&self.ring.chroma) {
            return Err(ConfigError::Invalid(format!(
                "ring.chroma {} must lie in [0, 0.5]",
                self.ring.chroma
            )));
        }

        if !(self.square.max_chroma > 0.0 && self.square.max_chroma <= 0.5) {
            return Err(ConfigError::Invalid(format!(
                "square.max_chroma {} must lie in (0, 0.5]",
                self.square.max_chroma
            )));
        }

        validate_extent("ring", self.ring.width, self.ring.height)?;
        validate_extent("square", self.square.width, self.square.height)?;

        Ok(())
    }
}

fn validate_extent(section: &str, width: u32, height: u32) -> Result<(), ConfigError> {
    for (name, value) in [("width", width), ("height", height)] {
        if value == 0 || value > MAX_SURFACE_EDGE {
            return Err(ConfigError::Invalid(format!(
                "{section}.{name} must be between 1 and {MAX_SURFACE_EDGE}, got {value}"
            )));
        }
    }
    Ok(())
}
