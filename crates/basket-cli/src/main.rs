//! Basket CLI - Shopping lists from the terminal
//!
//! Edits lists locally and syncs them through a folder shared between devices.

mod cli;
mod commands;
mod config_file;
mod error;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::auth_cmd::run_auth;
use crate::commands::category::run_category;
use crate::commands::common::CliContext;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::export::run_export;
use crate::commands::item::run_item;
use crate::commands::lists::{
    run_delete, run_lists, run_mode, run_new, run_rename, run_show, run_use,
};
use crate::commands::sync::{
    run_import, run_remote, run_share, run_status, run_sync, run_watch,
};
use crate::config_file::CliConfig;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("basket=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    // Completions and auth never touch the local store
    match command {
        Commands::Completions { shell, output } => {
            return run_completions(shell, output.as_deref());
        }
        Commands::Auth(command) => return run_auth(command),
        command => {
            let config = CliConfig::load().map_err(CliError::Config)?;
            let ctx = CliContext::resolve(config, cli.db_path, cli.remote_dir);
            dispatch(command, &ctx).await
        }
    }
}

async fn dispatch(command: Commands, ctx: &CliContext) -> Result<(), CliError> {
    match command {
        Commands::New { title } => run_new(&title, ctx).await?,
        Commands::Lists { json } => run_lists(json, ctx).await?,
        Commands::Use { id } => run_use(&id, ctx).await?,
        Commands::Show { hide_checked } => run_show(hide_checked, ctx).await?,
        Commands::Rename { title } => run_rename(&title, ctx).await?,
        Commands::Mode { mode } => run_mode(mode.into(), ctx).await?,
        Commands::Delete { id } => run_delete(&id, ctx).await?,
        Commands::Category(command) => run_category(command, ctx).await?,
        Commands::Item(command) => run_item(command, ctx).await?,
        Commands::Sync { strategy } => run_sync(strategy.map(Into::into), ctx).await?,
        Commands::Status => run_status(ctx).await?,
        Commands::Share { role } => run_share(role.map(Into::into), ctx).await?,
        Commands::Import { link } => run_import(&link, ctx).await?,
        Commands::Remote { json } => run_remote(json, ctx).await?,
        Commands::Watch { interval } => run_watch(interval, ctx).await?,
        Commands::Export { format, output } => {
            run_export(format, output.as_deref(), ctx).await?;
        }
        Commands::Config(command) => run_config(command, ctx)?,
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref())?,
        Commands::Auth(command) => run_auth(command)?,
    }

    Ok(())
}
