use basket_core::util::normalize_text_option;
use chrono::Utc;

use crate::cli::AuthCommands;
use crate::config_file::CliConfig;
use crate::error::CliError;

pub fn run_auth(command: AuthCommands) -> Result<(), CliError> {
    let mut config = CliConfig::load().map_err(CliError::Config)?;

    match command {
        AuthCommands::Login { token } => {
            let token = normalize_text_option(token)
                .unwrap_or_else(|| format!("local-{}", Utc::now().timestamp_millis()));
            config.access_token = Some(token);
            let path = config.save().map_err(CliError::Config)?;
            println!("Signed in (credentials stored in {})", path.display());
        }
        AuthCommands::Logout => {
            if config.access_token.take().is_none() {
                println!("Already signed out");
                return Ok(());
            }
            config.save().map_err(CliError::Config)?;
            println!("Signed out");
        }
        AuthCommands::Status => {
            if config.access_token.is_some() {
                println!("Signed in");
            } else {
                println!("Not signed in. Run `basket auth login`.");
            }
        }
    }

    Ok(())
}
