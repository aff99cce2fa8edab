use super::AppRow;
use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let records = ctx.apps().list().await?;
    let limit = flags.limit.map_or(usize::MAX, |limit| limit as usize);
    let rows = records
        .into_iter()
        .take(limit)
        .map(AppRow::from)
        .collect::<Vec<_>>();
    output(&rows, flags.format)
}
