use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct AuthLogoutResponse {
    cleared: bool,
    user: Option<String>,
}

pub fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let user = ctx.session.last_identity().map(|identity| identity.username);
    ctx.session.logout()?;
    output(
        &AuthLogoutResponse {
            cleared: true,
            user,
        },
        flags.format,
    )
}
