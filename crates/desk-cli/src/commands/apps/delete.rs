use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::apps::AppDeleteArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct AppDeleteResponse {
    deleted: Vec<String>,
}

pub async fn handle(
    args: &AppDeleteArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    ctx.apps().delete(&args.ids).await?;
    output(
        &AppDeleteResponse {
            deleted: args.ids.clone(),
        },
        flags.format,
    )
}
