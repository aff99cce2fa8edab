use desk_config::DeskConfig;

/// Warn about `DESK_*` variables that look like config but did not land in it.
pub fn warn_unconfigured(config: &DeskConfig) {
    for warning in collect_unconfigured_warnings(config, std::env::vars()) {
        tracing::warn!("{warning}");
    }
}

fn collect_unconfigured_warnings<I>(config: &DeskConfig, env: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let env_keys = env.into_iter().map(|(key, _)| key).collect::<Vec<_>>();
    let mut warnings = Vec::new();

    if !config.api.is_configured() && has_single_underscore_key(&env_keys, "DESK_API_") {
        warnings.push(
            "api.base_url is empty while DESK_API_* env vars exist. Use double underscores (example: DESK_API__BASE_URL)."
                .to_string(),
        );
    }

    if has_single_underscore_key(&env_keys, "DESK_SESSION_") {
        warnings.push(
            "DESK_SESSION_* env vars are ignored. Use double underscores (example: DESK_SESSION__REFRESH_MARGIN_SECS)."
                .to_string(),
        );
    }

    warnings
}

/// `DESK_API_BASE_URL` rather than `DESK_API__BASE_URL`.
fn has_single_underscore_key(keys: &[String], prefix: &str) -> bool {
    keys.iter()
        .filter_map(|key| key.strip_prefix(prefix))
        .any(|rest| !rest.is_empty() && !rest.starts_with('_'))
}

#[cfg(test)]
mod tests {
    use desk_config::{ApiConfig, DeskConfig};

    use super::collect_unconfigured_warnings;

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn warns_for_single_underscore_keys() {
        let warnings = collect_unconfigured_warnings(
            &DeskConfig::default(),
            env(&[
                ("DESK_API_BASE_URL", "http://localhost:4000"),
                ("DESK_SESSION_REFRESH_MARGIN_SECS", "5"),
            ]),
        );
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn double_underscore_keys_are_fine() {
        let warnings = collect_unconfigured_warnings(
            &DeskConfig::default(),
            env(&[
                ("DESK_API__BASE_URL", "http://localhost:4000"),
                ("DESK_SESSION__STORAGE_DIR", "/tmp/desk"),
                ("DESK_LOG", "debug"),
            ]),
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn configured_api_suppresses_api_warning() {
        let config = DeskConfig {
            api: ApiConfig {
                base_url: "http://localhost:4000".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let warnings =
            collect_unconfigured_warnings(&config, env(&[("DESK_API_BASE_URL", "x")]));
        assert!(warnings.is_empty());
    }
}
