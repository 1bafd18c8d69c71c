//! Sparse configuration schema, as declared by the operator.
//!
//! Every field that has a default is an `Option` so that "not set" stays
//! distinguishable from an explicit empty or zero value. Vocabulary-valued
//! fields stay strings here; the validator decides whether they are legal.

use std::time::Duration;

use garde::Validate;
use serde::{Deserialize, Deserializer};
use url::Url;

use crate::duration;
use crate::keys::{CertificateChain, IssuerPrivateKey, PasswordDigest, Secret};

/// Configuration for the OpenID Connect provider.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
#[garde(allow_unvalidated)]
pub struct ProviderConfig {
    /// Secret used to sign authorization codes, refresh and access tokens.
    #[serde(default)]
    pub hmac_secret: Option<Secret>,
    #[serde(default)]
    pub issuer_certificate_chain: CertificateChain,
    /// RSA key used to sign ID tokens.
    #[serde(default)]
    pub issuer_private_key: Option<IssuerPrivateKey>,

    #[serde(default, deserialize_with = "duration::deserialize_option")]
    pub access_token_lifespan: Option<Duration>,
    #[serde(default, deserialize_with = "duration::deserialize_option")]
    pub authorize_code_lifespan: Option<Duration>,
    #[serde(default, deserialize_with = "duration::deserialize_option")]
    pub id_token_lifespan: Option<Duration>,
    #[serde(default, deserialize_with = "duration::deserialize_option")]
    pub refresh_token_lifespan: Option<Duration>,

    /// Include detailed error descriptions in client-facing error responses.
    #[serde(default)]
    pub enable_client_debug_messages: bool,
    /// Minimum entropy of `state` and `nonce` parameters. Unset means the
    /// recommended floor applies.
    #[serde(default)]
    pub minimum_parameter_entropy: Option<i32>,

    /// One of `always`, `never`, `public_clients_only`.
    #[serde(default)]
    pub enforce_pkce: Option<String>,
    #[serde(default)]
    pub enable_pkce_plain_challenge: bool,

    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default, rename = "pushed_authorizations")]
    pub par: ParConfig,

    #[serde(default)]
    #[garde(dive)]
    pub clients: Vec<ClientConfig>,
}

/// Pushed Authorization Request settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParConfig {
    /// Require every client to use PAR.
    #[serde(default)]
    pub enforce: bool,
    /// Lifespan of a pushed request context.
    #[serde(default, deserialize_with = "duration::deserialize_option")]
    pub context_lifespan: Option<Duration>,
}

/// CORS settings for the OIDC endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    /// Endpoint names CORS handling applies to.
    #[serde(default)]
    pub endpoints: Vec<String>,
    #[serde(default)]
    pub allowed_origins: Vec<CorsOrigin>,
    /// Also allow the origin of every client redirect URI.
    #[serde(default)]
    pub allowed_origins_from_client_redirect_uris: bool,
}

/// An allowed CORS origin: either the `*` wildcard or an absolute URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CorsOrigin {
    Any,
    Url(Url),
}

impl CorsOrigin {
    /// Parse `*` or an absolute URL.
    pub fn parse(value: &str) -> Result<Self, url::ParseError> {
        if value == "*" {
            Ok(CorsOrigin::Any)
        } else {
            Url::parse(value).map(CorsOrigin::Url)
        }
    }

    /// `Origin` header form: `scheme://host[:port]`, or `*`.
    pub fn serialization(&self) -> String {
        match self {
            CorsOrigin::Any => "*".to_string(),
            CorsOrigin::Url(url) => url.origin().ascii_serialization(),
        }
    }
}

impl std::fmt::Display for CorsOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorsOrigin::Any => f.write_str("*"),
            CorsOrigin::Url(url) => write!(f, "{url}"),
        }
    }
}

impl<'de> Deserialize<'de> for CorsOrigin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        CorsOrigin::parse(&raw)
            .map_err(|e| serde::de::Error::custom(format!("invalid CORS origin '{raw}': {e}")))
    }
}

/// A registered OpenID Connect client.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
#[garde(allow_unvalidated)]
pub struct ClientConfig {
    #[serde(default)]
    #[garde(length(min = 1, max = 255))]
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Secret digest. Absent means the client is public.
    #[serde(default)]
    pub secret: Option<PasswordDigest>,
    #[serde(default)]
    pub sector_identifier: Option<String>,
    #[serde(default)]
    pub public: bool,

    #[serde(default)]
    pub redirect_uris: Vec<String>,

    #[serde(default)]
    #[garde(inner(length(min = 1)))]
    pub audience: Vec<String>,
    #[serde(default)]
    pub scopes: Option<Vec<String>>,
    #[serde(default)]
    pub grant_types: Option<Vec<String>>,
    #[serde(default)]
    pub response_types: Option<Vec<String>>,
    #[serde(default)]
    pub response_modes: Option<Vec<String>>,

    /// Name of the authorization policy, resolved by the policy engine.
    #[serde(default, rename = "authorization_policy")]
    #[garde(length(min = 1))]
    pub policy: Option<String>,

    /// Per-client PAR override. Can only widen the provider setting.
    #[serde(default)]
    pub enforce_par: Option<bool>,
    /// Per-client PKCE override. Can only widen the provider setting.
    #[serde(default)]
    pub enforce_pkce: Option<bool>,

    #[serde(default)]
    pub pkce_challenge_method: Option<String>,
    #[serde(default)]
    pub userinfo_signing_algorithm: Option<String>,

    #[serde(default)]
    pub consent_mode: Option<String>,
    #[serde(
        default,
        rename = "pre_configured_consent_duration",
        deserialize_with = "duration::deserialize_option"
    )]
    pub consent_pre_configured_duration: Option<Duration>,
}

impl ClientConfig {
    /// A client with only its ID set.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Public clients cannot keep a secret: either flagged as such or
    /// registered without one.
    pub fn is_public(&self) -> bool {
        self.public || self.secret.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_origin_parse() {
        assert_eq!(CorsOrigin::parse("*").unwrap(), CorsOrigin::Any);
        let origin = CorsOrigin::parse("https://app.example.com").unwrap();
        assert_eq!(origin.serialization(), "https://app.example.com");
        assert!(CorsOrigin::parse("app.example.com").is_err());
    }

    #[test]
    fn test_client_without_secret_is_public() {
        let client = ClientConfig::new("app");
        assert!(client.is_public());
    }

    #[test]
    fn test_explicit_empty_scopes_are_kept() {
        let client: ClientConfig = serde_yaml::from_str("id: app\nscopes: []\n").unwrap();
        assert_eq!(client.scopes, Some(Vec::new()));
        let client: ClientConfig = serde_yaml::from_str("id: app\n").unwrap();
        assert_eq!(client.scopes, None);
    }

    #[test]
    fn test_durations_accept_strings_and_seconds() {
        let par: ParConfig = serde_yaml::from_str("context_lifespan: 2m\n").unwrap();
        assert_eq!(par.context_lifespan, Some(Duration::from_secs(120)));
        let par: ParConfig = serde_yaml::from_str("context_lifespan: 45\n").unwrap();
        assert_eq!(par.context_lifespan, Some(Duration::from_secs(45)));
        assert!(serde_yaml::from_str::<ParConfig>("context_lifespan: soon\n").is_err());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(serde_yaml::from_str::<ClientConfig>("id: app\nredirect_uri: x\n").is_err());
    }
}
