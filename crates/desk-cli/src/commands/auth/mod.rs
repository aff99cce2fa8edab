mod login;
mod logout;
mod refresh;
mod register;
mod status;
mod watch;

use serde::Serialize;

use desk_auth::{HttpTransport, SessionManager, codec};
use desk_core::Identity;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::AuthCommands;
use crate::context::AppContext;

/// Handle `desk auth <subcommand>`.
pub async fn handle(
    action: &AuthCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        AuthCommands::Login(args) => login::handle(args, ctx, flags).await,
        AuthCommands::Register(args) => register::handle(args, ctx, flags).await,
        AuthCommands::Logout => logout::handle(ctx, flags),
        AuthCommands::Status => status::handle(ctx, flags),
        AuthCommands::Refresh => refresh::handle(ctx, flags).await,
        AuthCommands::Watch => watch::handle(ctx, flags).await,
    }
}

/// Shape printed after login, register, and refresh.
#[derive(Serialize)]
struct SessionResponse {
    authenticated: bool,
    user_id: String,
    username: String,
    expires_at: Option<String>,
}

impl SessionResponse {
    fn new(identity: Identity, session: &SessionManager<HttpTransport>) -> Self {
        Self {
            authenticated: true,
            user_id: identity.id,
            username: identity.username,
            expires_at: expires_at(session),
        }
    }
}

fn expires_at(session: &SessionManager<HttpTransport>) -> Option<String> {
    session
        .access_token()
        .as_ref()
        .and_then(codec::expiration_instant)
        .map(|at| at.to_rfc3339())
}
