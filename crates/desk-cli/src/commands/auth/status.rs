use desk_auth::{ClaimSet, SchedulerState, codec};
use serde::Serialize;
use tokio::time::Instant;

use super::expires_at;
use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct AuthStatusResponse {
    authenticated: bool,
    user_id: Option<String>,
    username: Option<String>,
    expires_at: Option<String>,
    expiring_soon: bool,
    refresh_timer: &'static str,
    refresh_in_secs: Option<u64>,
    storage: String,
    note: Option<String>,
}

/// Seconds before expiry at which a valid token is reported as expiring soon.
const EXPIRING_SOON_SECS: i64 = 60;

pub fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let session = &ctx.session;
    let current = session.current_identity();
    let claims = session
        .access_token()
        .and_then(|token| codec::decode(&token).ok());
    let expiring_soon = is_expiring_soon(claims.as_ref());
    let note = match (&current, session.last_identity()) {
        (Some(_), _) if expiring_soon => {
            Some("token expires within a minute; run `desk auth refresh`".to_string())
        }
        (Some(_), _) => None,
        (None, Some(last)) => Some(format!(
            "session for {} expired; run `desk auth refresh` or log in again",
            last.username
        )),
        (None, None) => Some("not logged in".to_string()),
    };

    let status = AuthStatusResponse {
        authenticated: current.is_some(),
        user_id: current.as_ref().map(|identity| identity.id.clone()),
        username: current.map(|identity| identity.username),
        expires_at: expires_at(session),
        expiring_soon,
        refresh_timer: timer_label(session.scheduler_state()),
        refresh_in_secs: session
            .refresh_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()).as_secs()),
        storage: ctx.storage_path.display().to_string(),
        note,
    };
    output(&status, flags.format)
}

const fn timer_label(state: SchedulerState) -> &'static str {
    match state {
        SchedulerState::Idle => "idle",
        SchedulerState::Armed => "armed",
        SchedulerState::Firing => "firing",
    }
}

fn is_expiring_soon(claims: Option<&ClaimSet>) -> bool {
    claims.is_some_and(|claims| claims.is_near_expiry(EXPIRING_SOON_SECS))
}
