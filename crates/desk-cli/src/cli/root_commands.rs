use clap::Subcommand;

use crate::cli::subcommands::{AppsCommands, AuthCommands};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Session management: login, register, logout, status.
    Auth {
        #[command(subcommand)]
        action: AuthCommands,
    },
    /// App records on the AppDesk server.
    Apps {
        #[command(subcommand)]
        action: AppsCommands,
    },
}
