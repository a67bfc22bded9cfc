mod cli;
mod config;
mod paths;
mod run;

use anyhow::Result;
use cli::{Command, ConfigAction};
use config::{load_config, write_default_config, ConfigOrigin};
use paths::AppPaths;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    let paths = AppPaths::discover()?;
    match cli.command {
        Some(Command::Config(config_cmd)) => {
            handle_config_command(&paths, &cli.overrides, config_cmd.action)
        }
        Some(Command::Convert(args)) => run::run_convert(args),
        Some(Command::Adapter) => run::run_adapter(),
        Some(Command::Export(args)) => {
            let (config, _) = load_config(&paths, &cli.overrides)?;
            run::run_export(&config, args)
        }
        Some(Command::Probe(args)) => {
            let (config, _) = load_config(&paths, &cli.overrides)?;
            run::run_probe(&config, args)
        }
        Some(Command::Run) | None => {
            let (config, origin) = load_config(&paths, &cli.overrides)?;
            tracing::debug!(?origin, "resolved configuration");
            run::run_window(&config)
        }
    }
}

fn handle_config_command(
    paths: &AppPaths,
    overrides: &cli::ConfigOverrides,
    action: ConfigAction,
) -> Result<()> {
    match action {
        ConfigAction::Init { force } => {
            let path = overrides
                .config
                .clone()
                .unwrap_or_else(|| paths.config_file());
            write_default_config(&path, force)?;
            println!("Wrote default configuration to {}", path.display());
            Ok(())
        }
        ConfigAction::Check => {
            let (config, origin) = load_config(paths, overrides)?;
            match origin {
                ConfigOrigin::File(path) => println!("Configuration OK: {}", path.display()),
                ConfigOrigin::Defaults => println!("No config file found; defaults are valid"),
            }
            println!(
                "  colorspace={} hue={} fps={}",
                config.colorspace,
                config.hue,
                config
                    .frame_rate()
                    .map(|fps| fps.to_string())
                    .unwrap_or_else(|| "uncapped".to_string())
            );
            Ok(())
        }
        ConfigAction::Where => {
            println!("config dir:  {}", paths.config_dir().display());
            println!("config file: {}", paths.config_file().display());
            Ok(())
        }
    }
}
