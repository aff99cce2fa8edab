use clap::{Args, Subcommand};

/// Authentication commands.
#[derive(Clone, Debug, Subcommand)]
pub enum AuthCommands {
    /// Log in with username and password.
    Login(CredentialArgs),
    /// Create an account and log in.
    Register(CredentialArgs),
    /// Clear the stored session.
    Logout,
    /// Show the current session.
    Status,
    /// Renew the access token now.
    Refresh,
    /// Keep the session alive and print every identity change until interrupted.
    Watch,
}

#[derive(Clone, Debug, Args)]
pub struct CredentialArgs {
    pub username: String,
    /// Password; falls back to `DESK_PASSWORD`.
    #[arg(long, env = "DESK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    /// Read the password from the first line of stdin (takes precedence).
    #[arg(long)]
    pub password_stdin: bool,
}
