use std::sync::Arc;

use anyhow::Context;
use desk_apps::AppsClient;
use desk_auth::{FileStorage, HttpTransport, SessionManager, SessionOptions};
use desk_config::DeskConfig;

/// Process-wide handles shared by every command.
///
/// Holds the one `SessionManager` of this process. A session left by an
/// earlier invocation is resumed here, which also arms its refresh timer.
pub struct AppContext {
    pub session: SessionManager<HttpTransport>,
    pub storage_path: std::path::PathBuf,
}

impl AppContext {
    pub fn init(config: &DeskConfig) -> anyhow::Result<Self> {
        let base_url = config
            .api
            .base_url()
            .context("set api.base_url in .appdesk/config.toml or DESK_API__BASE_URL")?;
        let transport = HttpTransport::new(base_url, config.api.timeout())?;

        let storage_dir = config
            .session
            .storage_dir()
            .context("no runtime or cache directory for session storage; set session.storage_dir")?;
        let storage = FileStorage::in_dir(&storage_dir);
        let storage_path = storage.path().to_path_buf();

        let options = SessionOptions {
            refresh_margin: config.session.refresh_margin(),
            ..SessionOptions::default()
        };
        let session = SessionManager::new(transport, Arc::new(storage), options);
        match session.resume() {
            Some(identity) => tracing::debug!(user = %identity.username, "resumed stored session"),
            None => tracing::debug!(path = %storage_path.display(), "no stored session"),
        }

        Ok(Self {
            session,
            storage_path,
        })
    }

    /// App API client sharing this context's session and HTTP client.
    #[must_use]
    pub fn apps(&self) -> AppsClient<HttpTransport> {
        AppsClient::from_session(self.session.clone())
    }
}
