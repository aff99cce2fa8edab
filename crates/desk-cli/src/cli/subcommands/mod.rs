pub mod apps;
pub mod auth;

pub use apps::AppsCommands;
pub use auth::AuthCommands;
