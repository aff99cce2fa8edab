use std::path::Path;

use anyhow::Context;
use desk_config::DeskConfig;

/// Read `.env` from the working directory (if any), then resolve the layered config.
pub fn load_config() -> anyhow::Result<DeskConfig> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    load_dotenv(&cwd)?;
    DeskConfig::load().context("failed to load configuration")
}

fn load_dotenv(dir: &Path) -> anyhow::Result<()> {
    let env_path = dir.join(".env");
    if !env_path.exists() {
        return Ok(());
    }
    dotenvy::from_path(&env_path)
        .with_context(|| format!("failed to load dotenv file at {}", env_path.display()))?;
    tracing::debug!(path = %env_path.display(), "loaded dotenv file");
    Ok(())
}
