use super::SessionResponse;
use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let identity = ctx.session.refresh().await?;
    output(&SessionResponse::new(identity, &ctx.session), flags.format)
}
