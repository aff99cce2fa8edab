//! # desk-apps
//!
//! Client for the AppDesk app-record endpoints: list, create-or-edit, delete.
//!
//! Each call first waits for a session renewal if the access token is missing
//! or expired, then signs the request with the session's bearer header when a
//! valid token is available. Requests without a session go out unsigned and the
//! server decides.

pub mod error;

pub use error::AppsError;

use desk_auth::{AuthTransport, HttpTransport, SessionManager};
use desk_core::{AppList, AppRecord};
use serde::{Deserialize, Serialize};

/// Body of mutation responses and of error responses.
#[derive(Debug, Default, Deserialize)]
struct ApiReply {
    message: Option<String>,
    applist: Option<AppRecord>,
}

#[derive(Serialize)]
struct DeleteRequest<'a> {
    ids: &'a [String],
}

pub struct AppsClient<T> {
    session: SessionManager<T>,
    client: reqwest::Client,
    base_url: String,
}

impl AppsClient<HttpTransport> {
    /// Reuse the auth transport's HTTP client and base URL.
    #[must_use]
    pub fn from_session(session: SessionManager<HttpTransport>) -> Self {
        let client = session.transport().client().clone();
        let base_url = session.transport().base_url().to_string();
        Self {
            session,
            client,
            base_url,
        }
    }
}

impl<T: AuthTransport> AppsClient<T> {
    pub fn new(
        session: SessionManager<T>,
        client: reqwest::Client,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            session,
            client,
            base_url,
        }
    }

    #[must_use]
    pub const fn session(&self) -> &SessionManager<T> {
        &self.session
    }

    /// # Errors
    ///
    /// Returns `AppsError::Api` on a non-2xx answer and `AppsError::Network`
    /// when the server is unreachable or the body is not an app list.
    pub async fn list(&self) -> Result<Vec<AppRecord>, AppsError> {
        let request = self.client.get(self.url("/applist"));
        let resp = self.send(request, "list apps").await?;
        let list: AppList = resp
            .json()
            .await
            .map_err(|e| AppsError::Network(format!("list apps: unreadable response: {e}")))?;
        tracing::debug!(count = list.applist.len(), "listed apps");
        Ok(list.applist)
    }

    /// Create the record when its `id` is blank, otherwise edit it.
    ///
    /// Returns the record as the server stored it, or the submitted record if
    /// the server did not echo one.
    ///
    /// # Errors
    ///
    /// Returns `AppsError::Invalid` before any request when title or type is
    /// blank, `AppsError::Api` when the server refuses the change.
    pub async fn save(&self, record: &AppRecord) -> Result<AppRecord, AppsError> {
        record.validate()?;
        let request = self.client.post(self.url("/create-edit-app")).json(record);
        let reply = self.mutate(request, "save app").await?;

        let saved = reply.applist.unwrap_or_else(|| record.clone());
        tracing::info!(id = %saved.id, created = record.is_new(), "app saved");
        Ok(saved)
    }

    /// Delete the given records. An empty list sends nothing.
    ///
    /// # Errors
    ///
    /// Returns `AppsError::Api` when the server refuses the deletion.
    pub async fn delete(&self, ids: &[String]) -> Result<(), AppsError> {
        if ids.is_empty() {
            tracing::debug!("no app ids to delete");
            return Ok(());
        }
        let request = self
            .client
            .post(self.url("/delete-app"))
            .json(&DeleteRequest { ids });
        self.mutate(request, "delete apps").await?;
        tracing::info!(count = ids.len(), "apps deleted");
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Send a mutation. A 2xx answer whose `message` is anything but `ok`
    /// is still a refusal.
    async fn mutate(
        &self,
        request: reqwest::RequestBuilder,
        action: &str,
    ) -> Result<ApiReply, AppsError> {
        let resp = self.send(request, action).await?;
        let status = resp.status().as_u16();
        let reply = read_reply(resp)
            .await
            .map_err(|e| AppsError::Network(format!("{action}: unreadable response: {e}")))?;

        match reply.message.as_deref() {
            Some(message) if !message.eq_ignore_ascii_case("ok") => Err(AppsError::Api {
                status,
                message: message.to_string(),
            }),
            _ => Ok(reply),
        }
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        action: &str,
    ) -> Result<reqwest::Response, AppsError> {
        self.renew_if_needed().await;
        let request = match self.session.bearer_header() {
            Some((name, value)) => request.header(name, value),
            None => {
                tracing::debug!(action, "no valid session; sending unsigned");
                request
            }
        };

        let resp = request
            .send()
            .await
            .map_err(|e| AppsError::Network(format!("{action}: {e}")))?;
        if resp.status().is_success() {
            return Ok(resp);
        }
        Err(api_error(resp, action).await)
    }

    async fn renew_if_needed(&self) {
        let Some(renewal) = self.session.ensure_valid() else {
            return;
        };
        if let Err(error) = renewal.await {
            tracing::warn!(%error, "session renewal task failed");
        }
    }
}

async fn read_reply(resp: reqwest::Response) -> Result<ApiReply, String> {
    let body = resp.text().await.map_err(|e| e.to_string())?;
    if body.trim().is_empty() {
        return Ok(ApiReply::default());
    }
    serde_json::from_str(&body).map_err(|e| e.to_string())
}

async fn api_error(resp: reqwest::Response, action: &str) -> AppsError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiReply>(&body)
        .ok()
        .and_then(|reply| reply.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map_or_else(|| format!("{action} failed with HTTP {status}"), str::to_string)
        });
    tracing::debug!(action, status = status.as_u16(), %message, "app API refused request");
    AppsError::Api {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_request_wire_shape() {
        let ids = vec!["a1".to_string(), "a2".to_string()];
        let json = serde_json::to_value(DeleteRequest { ids: &ids }).expect("serialize");
        assert_eq!(json, serde_json::json!({"ids": ["a1", "a2"]}));
    }

    #[test]
    fn reply_tolerates_missing_fields() {
        let reply: ApiReply = serde_json::from_str(r#"{"message":"ok"}"#).expect("parse");
        assert_eq!(reply.message.as_deref(), Some("ok"));
        assert!(reply.applist.is_none());
    }

    #[test]
    fn reply_carries_saved_record() {
        let reply: ApiReply = serde_json::from_str(
            r#"{"message":"ok","applist":{"id":"a9","title":"Billing","type":"web","description":""}}"#,
        )
        .expect("parse");
        assert_eq!(reply.applist.map(|r| r.id).as_deref(), Some("a9"));
    }
}
