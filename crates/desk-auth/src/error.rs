use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// The token is not a compact `header.claims.signature` string with a JSON
    /// claims segment carrying an integer `exp`.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// The auth service answered and refused the request.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The auth service could not be reached or sent an unreadable answer.
    #[error("network error: {0}")]
    Network(String),

    #[error("session storage error: {0}")]
    Storage(String),

    /// A refresh response arrived after the session it was issued for ended.
    #[error("session changed while the refresh was in flight; response discarded")]
    Superseded,
}

impl AuthError {
    /// HTTP status for service rejections, `None` for everything else.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}
