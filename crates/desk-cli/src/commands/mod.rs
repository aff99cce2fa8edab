pub mod apps;
pub mod auth;
pub mod dispatch;
