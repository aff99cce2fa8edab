use desk_core::errors::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppsError {
    #[error(transparent)]
    Invalid(#[from] CoreError),

    /// The server answered with a non-success status or refused the change.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),
}
