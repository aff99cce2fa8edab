use clap::{Args, Subcommand};

/// App record commands.
#[derive(Clone, Debug, Subcommand)]
pub enum AppsCommands {
    /// List app records.
    List,
    /// Create an app record, or edit it when `--id` is given.
    Save(AppSaveArgs),
    /// Delete app records by id.
    Delete(AppDeleteArgs),
}

#[derive(Clone, Debug, Args)]
pub struct AppSaveArgs {
    /// Existing record id (omit to create).
    #[arg(long)]
    pub id: Option<String>,
    #[arg(long)]
    pub title: String,
    /// App type, e.g. `web`.
    #[arg(long = "type")]
    pub app_type: String,
    #[arg(long, default_value = "")]
    pub description: String,
}

#[derive(Clone, Debug, Args)]
pub struct AppDeleteArgs {
    /// Record ids to delete.
    #[arg(required = true, num_args = 1..)]
    pub ids: Vec<String>,
}
