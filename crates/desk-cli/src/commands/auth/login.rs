use desk_core::errors::validate_credentials;

use super::SessionResponse;
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

    let identity = ctx.session.login(&args.username, &password).await?;
    output(&SessionResponse::new(identity, &ctx.session), flags.format)
}

/// `--password-stdin` wins over `--password` / `DESK_PASSWORD`.
pub(super) fn resolve_password(args: &CredentialArgs) -> anyhow::Result<String> {
    if args.password_stdin {
        return read_password_line(std::io::stdin().lock());
    }
    args.password.clone().ok_or_else(|| {
        anyhow::anyhow!(
            "password required: pass --password, set DESK_PASSWORD, or use --password-stdin"
        )
    })
}

fn read_password_line(mut input: impl std::io::BufRead) -> anyhow::Result<String> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
