use desk_core::errors::validate_credentials;

use super::SessionResponse;
use super::login::resolve_password;
use crate::cli::GlobalFlags;
use crate::cli::subcommands::auth::CredentialArgs;
use crate::context::AppContext;
use crate::output::output;

pub async fn handle(
    args: &CredentialArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let password = resolve_password(args)?;
    validate_credentials(&args.username, &password)?;

    let identity = ctx.session.register(&args.username, &password).await?;
    output(&SessionResponse::new(identity, &ctx.session), flags.format)
}
