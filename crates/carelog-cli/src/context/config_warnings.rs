use carelog_config::CareConfig;

/// Emit warnings for likely mistyped env var keys and unusable backend settings.
pub fn warn_unconfigured(config: &CareConfig) {
    for warning in collect_unconfigured_warnings(config, std::env::vars()) {
        tracing::warn!("{warning}");
    }
}

fn collect_unconfigured_warnings<I>(config: &CareConfig, env: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let env_keys = env.into_iter().map(|(key, _)| key).collect::<Vec<_>>();

    let mut warnings = Vec::new();

    if !config.backend.is_configured() && has_single_underscore_key(&env_keys, "CARELOG_BACKEND") {
        warnings.push(
            "Backend config appears default while CARELOG_BACKEND* env vars exist. Use double underscores (example: CARELOG_BACKEND__URL)."
                .to_string(),
        );
    }

    if has_single_underscore_key(&env_keys, "CARELOG_AUTH") {
        warnings.push(
            "CARELOG_AUTH_* env vars are ignored. Use double underscores (example: CARELOG_AUTH__EMAIL_DOMAIN)."
                .to_string(),
        );
    }

    if config.backend.is_configured()
        && let Err(error) = config.backend.validate()
    {
        warnings.push(format!("Backend config is unusable: {error}"));
    }

    warnings
}

/// Keys like `CARELOG_BACKEND_URL` that figment will not nest under a section.
fn has_single_underscore_key(keys: &[String], section: &str) -> bool {
    let nested = format!("{section}__");
    keys.iter()
        .any(|key| key.starts_with(section) && !key.starts_with(&nested))
}
