//! Fallback values and the defaulting step.
//!
//! Defaulting is pure: it only fills fields that are `None` and never
//! touches a value the operator set, so running it twice is a no-op.

use std::time::Duration;

use crate::config::{ClientConfig, ProviderConfig};

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(60 * 60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Provider-level fallback values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderDefaults {
    pub access_token_lifespan: Duration,
    pub authorize_code_lifespan: Duration,
    pub id_token_lifespan: Duration,
    pub refresh_token_lifespan: Duration,
    pub enforce_pkce: &'static str,
    pub par_context_lifespan: Duration,
}

/// Per-client fallback values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientDefaults {
    pub policy: &'static str,
    pub scopes: &'static [&'static str],
    pub grant_types: &'static [&'static str],
    pub response_types: &'static [&'static str],
    pub response_modes: &'static [&'static str],
    pub userinfo_signing_algorithm: &'static str,
    pub consent_mode: &'static str,
    pub consent_pre_configured_duration: Duration,
}

pub const DEFAULT_PROVIDER_CONFIG: ProviderDefaults = ProviderDefaults {
    access_token_lifespan: HOUR,
    authorize_code_lifespan: MINUTE,
    id_token_lifespan: HOUR,
    refresh_token_lifespan: Duration::from_secs(90 * 60),
    enforce_pkce: "public_clients_only",
    par_context_lifespan: Duration::from_secs(5 * 60),
};

pub const DEFAULT_CLIENT_CONFIG: ClientDefaults = ClientDefaults {
    policy: "two_factor",
    scopes: &["openid", "groups", "profile", "email"],
    grant_types: &["refresh_token", "authorization_code"],
    response_types: &["code"],
    response_modes: &["form_post", "query", "fragment"],
    userinfo_signing_algorithm: "none",
    consent_mode: "auto",
    consent_pre_configured_duration: Duration::from_secs(7 * DAY.as_secs()),
};

/// Fill every unset field of `config` from the given defaults.
pub fn apply_defaults(
    mut config: ProviderConfig,
    provider: &ProviderDefaults,
    client: &ClientDefaults,
) -> ProviderConfig {
    config
        .access_token_lifespan
        .get_or_insert(provider.access_token_lifespan);
    config
        .authorize_code_lifespan
        .get_or_insert(provider.authorize_code_lifespan);
    config.id_token_lifespan.get_or_insert(provider.id_token_lifespan);
    config
        .refresh_token_lifespan
        .get_or_insert(provider.refresh_token_lifespan);
    config
        .enforce_pkce
        .get_or_insert_with(|| provider.enforce_pkce.to_string());
    config
        .par
        .context_lifespan
        .get_or_insert(provider.par_context_lifespan);

    config.clients = config
        .clients
        .into_iter()
        .map(|c| apply_client_defaults(c, client))
        .collect();
    config
}

/// Fill every unset field of a single client.
pub fn apply_client_defaults(mut client: ClientConfig, defaults: &ClientDefaults) -> ClientConfig {
    if client.description.is_none() {
        client.description = Some(client.id.clone());
    }
    client
        .policy
        .get_or_insert_with(|| defaults.policy.to_string());
    client.scopes.get_or_insert_with(|| to_owned(defaults.scopes));
    client
        .grant_types
        .get_or_insert_with(|| to_owned(defaults.grant_types));
    client
        .response_types
        .get_or_insert_with(|| to_owned(defaults.response_types));
    client
        .response_modes
        .get_or_insert_with(|| to_owned(defaults.response_modes));
    client
        .userinfo_signing_algorithm
        .get_or_insert_with(|| defaults.userinfo_signing_algorithm.to_string());
    client
        .consent_mode
        .get_or_insert_with(|| defaults.consent_mode.to_string());
    client
        .consent_pre_configured_duration
        .get_or_insert(defaults.consent_pre_configured_duration);
    client
}

fn to_owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl ProviderConfig {
    /// Apply [`DEFAULT_PROVIDER_CONFIG`] and [`DEFAULT_CLIENT_CONFIG`].
    pub fn with_defaults(self) -> Self {
        apply_defaults(self, &DEFAULT_PROVIDER_CONFIG, &DEFAULT_CLIENT_CONFIG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_durations() {
        assert_eq!(DEFAULT_PROVIDER_CONFIG.refresh_token_lifespan, 90 * MINUTE);
        assert_eq!(
            DEFAULT_CLIENT_CONFIG.consent_pre_configured_duration,
            Duration::from_secs(604_800)
        );
    }

    #[test]
    fn test_description_falls_back_to_id() {
        let client = apply_client_defaults(ClientConfig::new("app1"), &DEFAULT_CLIENT_CONFIG);
        assert_eq!(client.description.as_deref(), Some("app1"));

        let mut described = ClientConfig::new("app2");
        described.description = Some(String::new());
        let described = apply_client_defaults(described, &DEFAULT_CLIENT_CONFIG);
        assert_eq!(described.description.as_deref(), Some(""));
    }

    #[test]
    fn test_zero_duration_is_not_replaced() {
        let mut client = ClientConfig::new("app");
        client.consent_pre_configured_duration = Some(Duration::ZERO);
        let client = apply_client_defaults(client, &DEFAULT_CLIENT_CONFIG);
        assert_eq!(client.consent_pre_configured_duration, Some(Duration::ZERO));
    }
}
