use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use pickerconfig::PickerConfig;

use crate::cli::ConfigOverrides;
use crate::paths::AppPaths;

/// Where the active configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    File(PathBuf),
    Defaults,
}

/// Loads `--config` if given, else the discovered file, else defaults, then
/// applies the command-line overrides and validates the result.
pub fn load_config(
    paths: &AppPaths,
    overrides: &ConfigOverrides,
) -> Result<(PickerConfig, ConfigOrigin)> {
    let (mut config, origin) = match overrides.config.as_deref() {
        Some(path) => (read_config(path)?, ConfigOrigin::File(path.to_path_buf())),
        None => {
            let path = paths.config_file();
            if path.exists() {
                (read_config(&path)?, ConfigOrigin::File(path))
            } else {
                tracing::debug!(path = %path.display(), "no config file; using defaults");
                (PickerConfig::default(), ConfigOrigin::Defaults)
            }
        }
    };

    apply_overrides(&mut config, overrides);
    config
        .validate()
        .context("command-line overrides produced an invalid configuration")?;
    Ok((config, origin))
}

fn read_config(path: &Path) -> Result<PickerConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config = PickerConfig::from_toml_str(&contents)
        .with_context(|| format!("failed to load config file at {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

pub fn apply_overrides(config: &mut PickerConfig, overrides: &ConfigOverrides) {
    if let Some(colorspace) = overrides.colorspace {
        config.colorspace = colorspace;
    }
    if let Some(hue) = overrides.hue {
        config.hue = hue;
    }
    if let Some(fps) = overrides.fps {
        config.fps = Some(fps);
    }
    if let Some(ratio) = overrides.device_pixel_ratio {
        config.device_pixel_ratio = Some(ratio);
    }
}

/// Writes the default configuration; refuses to clobber unless `force`.
pub fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "config file already exists at {}; pass --force to replace it",
            path.display()
        );
    }
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }
    let serialized = PickerConfig::default()
        .to_toml_string()
        .context("failed to serialize default configuration")?;
    fs::write(path, serialized)
        .with_context(|| format!("failed to write config file to {}", path.display()))?;
    Ok(())
}
