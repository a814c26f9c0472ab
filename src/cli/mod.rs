// CLI module for operations requiring server access

pub mod admin;
pub mod migrate;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::app_data::AppData;

/// RootsReach backend CLI
#[derive(Parser, Debug)]
#[command(name = "rootsreach")]
#[command(about = "RootsReach access and account-security backend", long_about = None)]
pub struct Cli {
    /// Defaults to `serve`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP server
    Serve,

    /// Run pending migrations on both databases and exit
    Migrate,

    /// Create an administrator account
    CreateAdmin {
        #[arg(long)]
        username: String,

        /// Generated and printed once when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Clear failed-login attempts and any lock on an account
    Unlock {
        #[arg(long)]
        username: String,
    },
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}

/// Execute an account-management command
///
/// `Serve` and `Migrate` are handled by main before AppData exists.
pub async fn execute_command(command: Commands, app_data: Arc<AppData>) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::CreateAdmin { username, password } => {
            admin::create_admin(app_data, &username, password).await?;
        }
        Commands::Unlock { username } => {
            admin::unlock(app_data, &username).await?;
        }
        Commands::Serve | Commands::Migrate => {
            tracing::warn!("{:?} is not an account-management command", command);
        }
    }

    Ok(())
}
