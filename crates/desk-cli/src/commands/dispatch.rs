use crate::cli::{Commands, GlobalFlags};
use crate::context::AppContext;

pub async fn dispatch(
    command: Commands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match command {
        Commands::Auth { action } => super::auth::handle(&action, ctx, flags).await,
        Commands::Apps { action } => super::apps::handle(&action, ctx, flags).await,
    }
}
