mod delete;
mod list;
mod save;

use desk_core::AppRecord;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::AppsCommands;
use crate::context::AppContext;

/// Handle `desk apps <subcommand>`.
pub async fn handle(
    action: &AppsCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        AppsCommands::List => list::handle(ctx, flags).await,
        AppsCommands::Save(args) => save::handle(args, ctx, flags).await,
        AppsCommands::Delete(args) => delete::handle(args, ctx, flags).await,
    }
}

/// One app record as printed; `type` keeps its wire name.
#[derive(Serialize)]
struct AppRow {
    id: String,
    title: String,
    #[serde(rename = "type")]
    app_type: String,
    description: String,
}

impl From<AppRecord> for AppRow {
    fn from(record: AppRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            app_type: record.app_type,
            description: record.description,
        }
    }
}
