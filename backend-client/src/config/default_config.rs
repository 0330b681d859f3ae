//! Client config loaded strictly from environment variables.
//!
//! # Environment variables
//!
//! - `CHATBOT_URL`               = backend root URL (mandatory, http/https)
//! - `CHATBOT_TIMEOUT_SECS`      = ordinary request timeout (default 30)
//! - `CHATBOT_SYNC_TIMEOUT_SECS` = vector-store sync timeout (default 300)
//! - `CHATBOT_STREAM_IDLE_SECS`  = question stream idle timeout (default 600)
//! - `CHATBOT_USERNAME` / `CHATBOT_PASSWORD` = optional auto sign-in (both or neither)

use crate::{
    config::client_config::{ClientConfig, Credentials},
    error_handler::{
        ConfigError, Result, VarLookup, env_opt, env_opt_u64, must_env, process_env,
        validate_http_endpoint,
    },
};

/// Builds a [`ClientConfig`] from the process environment.
///
/// # Errors
///
/// - [`ConfigError::MissingVar`] if `CHATBOT_URL` is missing
/// - [`ConfigError::InvalidFormat`] if it is not an http(s) URL
/// - [`ConfigError::InvalidNumber`] for malformed timeouts
/// - [`ConfigError::PartialCredentials`] if only one credential is set
pub fn config_from_env() -> Result<ClientConfig> {
    config_from_lookup(&process_env)
}

/// Same as [`config_from_env`] over an arbitrary variable source.
pub fn config_from_lookup(lookup: VarLookup<'_>) -> Result<ClientConfig> {
    let base_url = must_env(lookup, "CHATBOT_URL")?;
    let base_url = base_url.trim();
    validate_http_endpoint("CHATBOT_URL", base_url)?;

    let mut cfg = ClientConfig::new(base_url);
    if let Some(secs) = env_opt_u64(lookup, "CHATBOT_TIMEOUT_SECS")? {
        cfg.request_timeout_secs = secs;
    }
    if let Some(secs) = env_opt_u64(lookup, "CHATBOT_SYNC_TIMEOUT_SECS")? {
        cfg.sync_timeout_secs = secs;
    }
    if let Some(secs) = env_opt_u64(lookup, "CHATBOT_STREAM_IDLE_SECS")? {
        cfg.stream_idle_secs = secs;
    }

    cfg.credentials = match (
        env_opt(lookup, "CHATBOT_USERNAME"),
        env_opt(lookup, "CHATBOT_PASSWORD"),
    ) {
        (Some(username), Some(password)) => Some(Credentials { username, password }),
        (None, None) => None,
        _ => return Err(ConfigError::PartialCredentials.into()),
    };

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::error_handler::BackendError;

    fn load(vars: &[(&str, &str)]) -> Result<ClientConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config_from_lookup(&move |k: &str| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = load(&[("CHATBOT_URL", "http://localhost:9992/")]).unwrap();
        assert_eq!(cfg.base_url, "http://localhost:9992");
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.sync_timeout_secs, 300);
        assert_eq!(cfg.stream_idle_secs, 600);
        assert_eq!(cfg.credentials, None);
    }

    #[test]
    fn overrides_and_credentials() {
        let cfg = load(&[
            ("CHATBOT_URL", "https://bot.example"),
            ("CHATBOT_SYNC_TIMEOUT_SECS", "900"),
            ("CHATBOT_USERNAME", "admin"),
            ("CHATBOT_PASSWORD", "s3cret"),
        ])
        .unwrap();
        assert_eq!(cfg.sync_timeout_secs, 900);
        let creds = cfg.credentials.unwrap();
        assert_eq!(creds.username, "admin");
        assert!(!format!("{creds:?}").contains("s3cret"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            load(&[]),
            Err(BackendError::Config(ConfigError::MissingVar("CHATBOT_URL")))
        ));
        assert!(matches!(
            load(&[("CHATBOT_URL", "localhost:9992")]),
            Err(BackendError::Config(ConfigError::InvalidFormat { .. }))
        ));
        assert!(matches!(
            load(&[("CHATBOT_URL", "http://x"), ("CHATBOT_TIMEOUT_SECS", "0")]),
            Err(BackendError::Config(ConfigError::InvalidNumber { .. }))
        ));
        assert!(matches!(
            load(&[("CHATBOT_URL", "http://x"), ("CHATBOT_USERNAME", "admin")]),
            Err(BackendError::Config(ConfigError::PartialCredentials))
        ));
    }
}
