use desk_core::AppRecord;
use serde::Serialize;

use super::AppRow;
use crate::cli::GlobalFlags;
use crate::cli::subcommands::apps::AppSaveArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct AppSaveResponse {
    created: bool,
    app: AppRow,
}

pub async fn handle(
    args: &AppSaveArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let record = AppRecord {
        id: args.id.clone().unwrap_or_default(),
        title: args.title.clone(),
        app_type: args.app_type.clone(),
        description: args.description.clone(),
    };
    let created = record.is_new();
    let saved = ctx.apps().save(&record).await?;
    output(
        &AppSaveResponse {
            created,
            app: saved.into(),
        },
        flags.format,
    )
}
