//! # desk-auth
//!
//! Session and token lifecycle management for AppDesk.
//!
//! Provides local decoding of bearer-token claims (no signature checks), a
//! session store that keeps the identity and its token paired, a single-slot
//! refresh timer, and [`SessionManager`], which drives login, register,
//! refresh, and logout against an [`AuthTransport`].

pub mod codec;
pub mod error;
pub mod manager;
pub mod scheduler;
pub mod storage;
pub mod store;
pub mod transport;

pub use codec::{AccessToken, ClaimSet};
pub use error::AuthError;
pub use manager::{AUTH_HEADER, SessionManager, SessionOptions};
pub use scheduler::SchedulerState;
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
pub use store::Session;
pub use transport::{AuthTransport, Credentials, HttpTransport, TokenGrant};

#[cfg(test)]
pub(crate) mod test_support {
    use base64::Engine as _;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    use crate::codec::AccessToken;

    pub fn token_with_exp(exp: i64) -> AccessToken {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"u-1","exp":{exp}}}"#));
        let signature = URL_SAFE_NO_PAD.encode("fake_sig");
        AccessToken::new(format!("{header}.{payload}.{signature}"))
    }
}
