use chrono::Utc;
use desk_core::Identity;
use serde::Serialize;

use super::expires_at;
use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct IdentityEvent {
    at: String,
    authenticated: bool,
    username: Option<String>,
    expires_at: Option<String>,
}

/// Print the current identity, then one line per change, until Ctrl-C.
///
/// The refresh timer runs inside this process, so a long-running watch keeps
/// the session renewed on its own.
pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let mut identities = ctx.session.subscribe();
    if ctx.session.ensure_valid().is_some() {
        tracing::debug!("no valid token; renewal started");
    }

    let initial = identities.borrow_and_update().clone();
    emit(initial, ctx, flags)?;

    loop {
        tokio::select! {
            changed = identities.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = identities.borrow_and_update().clone();
                emit(current, ctx, flags)?;
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                tracing::debug!("watch interrupted");
                break;
            }
        }
    }
    Ok(())
}

fn emit(identity: Option<Identity>, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let event = IdentityEvent {
        at: Utc::now().to_rfc3339(),
        authenticated: identity.is_some(),
        username: identity.map(|identity| identity.username),
        expires_at: expires_at(&ctx.session),
    };
    output(&event, flags.format)
}
