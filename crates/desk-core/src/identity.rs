use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Authenticated principal as returned by the auth service.
///
/// Produced by `desk-auth` on every successful login, register, or refresh and
/// replaced wholesale each time. Unknown fields on the wire are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Identity {
    /// Stable user identifier. Some deployments send it as `_id`.
    #[serde(alias = "_id")]
    pub id: String,
    pub username: String,
}

impl Identity {
    #[must_use]
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
        }
    }
}
