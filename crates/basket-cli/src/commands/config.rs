use std::path::PathBuf;

use basket_core::util::normalize_text_option;
use serde::Serialize;

use crate::cli::ConfigCommands;
use crate::commands::common::CliContext;
use crate::config_file::{default_config_path, CliConfig};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct EffectiveConfig<'a> {
    config_path: PathBuf,
    db_path: &'a PathBuf,
    remote_dir: Option<&'a PathBuf>,
    signed_in: bool,
    sync: &'a basket_core::SyncSettings,
}

pub fn run_config(command: ConfigCommands, ctx: &CliContext) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            remote_dir,
            db_path,
            folder_name,
            poll_interval,
        } => {
            let config = CliConfig::load().map_err(CliError::Config)?;
            let config = apply_config_init(config, remote_dir, db_path, folder_name, poll_interval)?;
            let path = config.save().map_err(CliError::Config)?;
            println!("Configuration written to {}", path.display());
            if config.remote_dir.is_none() {
                println!("No remote directory set; sync commands stay unavailable.");
            }
            Ok(())
        }
        ConfigCommands::Show => {
            let effective = EffectiveConfig {
                config_path: default_config_path(),
                db_path: &ctx.db_path,
                remote_dir: ctx.remote_dir.as_ref(),
                signed_in: ctx.config.access_token.is_some(),
                sync: &ctx.config.sync,
            };
            println!("{}", serde_json::to_string_pretty(&effective)?);
            Ok(())
        }
    }
}

/// Merge explicit `config init` values over an existing config.
pub fn apply_config_init(
    mut config: CliConfig,
    remote_dir: Option<PathBuf>,
    db_path: Option<PathBuf>,
    folder_name: Option<String>,
    poll_interval: Option<u64>,
) -> Result<CliConfig, CliError> {
    if let Some(dir) = remote_dir {
        config.remote_dir = Some(dir);
    }
    if let Some(path) = db_path {
        config.db_path = Some(path);
    }
    if let Some(name) = folder_name {
        config.sync.folder_name = normalize_text_option(Some(name))
            .ok_or_else(|| CliError::Config("folder_name must not be empty".to_string()))?;
    }
    if let Some(secs) = poll_interval {
        config.sync.poll_interval_secs = secs;
    }
    config
        .sync
        .validate()
        .map_err(|error| CliError::Config(error.to_string()))?;
    Ok(config)
}
