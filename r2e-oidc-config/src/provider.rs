//! The final, read-only provider configuration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::client::OidcClient;
use crate::config::{CorsOrigin, ProviderConfig};
use crate::error::ConfigError;
use crate::keys::{CertificateChain, IssuerPrivateKey, Secret};
use crate::validation::{ValidationReport, Validator};
use crate::vocabulary::{CorsEndpoint, PkceChallengeMethod, PkceEnforcement};

/// Token lifespans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifespans {
    pub access_token: Duration,
    pub authorize_code: Duration,
    pub id_token: Duration,
    pub refresh_token: Duration,
}

/// Pushed Authorization Request policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParPolicy {
    pub enforce: bool,
    pub context_lifespan: Duration,
}

/// CORS policy, including origins derived from client redirect URIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    pub endpoints: Vec<CorsEndpoint>,
    pub allowed_origins: Vec<CorsOrigin>,
    pub allowed_origins_from_client_redirect_uris: bool,
}

impl CorsPolicy {
    pub fn applies_to(&self, endpoint: CorsEndpoint) -> bool {
        self.endpoints.contains(&endpoint)
    }

    /// Whether an `Origin` header value is allowed. The opaque origin
    /// `null` only matches the wildcard.
    pub fn allows_origin(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|allowed| match allowed {
            CorsOrigin::Any => true,
            CorsOrigin::Url(url) => url.origin().is_tuple() && allowed.serialization() == origin,
        })
    }
}

/// Validated OpenID Connect provider configuration.
///
/// Built once by [`finalize`] and never mutated. Share it behind an `Arc`;
/// a reload builds a new instance (see [`ProviderConfigHandle`](crate::ProviderConfigHandle)).
#[derive(Debug, Clone)]
pub struct OidcProviderConfig {
    pub(crate) hmac_secret: Secret,
    pub(crate) issuer_certificate_chain: CertificateChain,
    pub(crate) issuer_private_key: Option<IssuerPrivateKey>,
    pub(crate) lifespans: TokenLifespans,
    pub(crate) enable_client_debug_messages: bool,
    pub(crate) minimum_parameter_entropy: usize,
    pub(crate) enforce_pkce: PkceEnforcement,
    pub(crate) enable_pkce_plain_challenge: bool,
    pub(crate) cors: CorsPolicy,
    pub(crate) par: ParPolicy,
    pub(crate) clients: Vec<OidcClient>,
    pub(crate) client_index: HashMap<String, usize>,
}

impl OidcProviderConfig {
    pub fn hmac_secret(&self) -> &Secret {
        &self.hmac_secret
    }

    pub fn issuer_certificate_chain(&self) -> &CertificateChain {
        &self.issuer_certificate_chain
    }

    pub fn issuer_private_key(&self) -> Option<&IssuerPrivateKey> {
        self.issuer_private_key.as_ref()
    }

    pub fn lifespans(&self) -> &TokenLifespans {
        &self.lifespans
    }

    pub fn enable_client_debug_messages(&self) -> bool {
        self.enable_client_debug_messages
    }

    /// Effective minimum entropy of `state`/`nonce` parameters.
    pub fn minimum_parameter_entropy(&self) -> usize {
        self.minimum_parameter_entropy
    }

    pub fn enforce_pkce(&self) -> PkceEnforcement {
        self.enforce_pkce
    }

    pub fn enable_pkce_plain_challenge(&self) -> bool {
        self.enable_pkce_plain_challenge
    }

    pub fn cors(&self) -> &CorsPolicy {
        &self.cors
    }

    pub fn par(&self) -> &ParPolicy {
        &self.par
    }

    /// Clients in declaration order.
    pub fn clients(&self) -> &[OidcClient] {
        &self.clients
    }

    /// Look up a client by ID.
    pub fn client(&self, id: &str) -> Option<&OidcClient> {
        self.client_index.get(id).and_then(|&i| self.clients.get(i))
    }

    /// Whether `client` must use PKCE, combining the provider mode and the
    /// client override.
    pub fn requires_pkce(&self, client: &OidcClient) -> bool {
        if client.enforce_pkce == Some(true) {
            return true;
        }
        match self.enforce_pkce {
            PkceEnforcement::Always => true,
            PkceEnforcement::Never => false,
            PkceEnforcement::PublicClientsOnly => client.public,
        }
    }

    /// Whether `client` must use Pushed Authorization Requests.
    pub fn requires_par(&self, client: &OidcClient) -> bool {
        self.par.enforce || client.enforce_par == Some(true)
    }

    /// PKCE challenge methods `client` may use.
    pub fn allowed_challenge_methods(&self, client: &OidcClient) -> Vec<PkceChallengeMethod> {
        match client.pkce_challenge_method {
            Some(method) => vec![method],
            None if self.enable_pkce_plain_challenge => {
                vec![PkceChallengeMethod::S256, PkceChallengeMethod::Plain]
            }
            None => vec![PkceChallengeMethod::S256],
        }
    }
}

/// Outcome of a successful [`finalize`]: the configuration plus any
/// non-fatal findings.
#[derive(Debug, Clone)]
pub struct Finalized {
    pub config: OidcProviderConfig,
    pub report: ValidationReport,
}

impl Finalized {
    pub fn into_shared(self) -> Arc<OidcProviderConfig> {
        Arc::new(self.config)
    }
}

/// Run the full pipeline on a sparse configuration: defaulting, then
/// validation.
///
/// Every finding is logged. Warnings and informational findings do not
/// prevent finalization.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] carrying the full report when at least
/// one error-class finding was produced.
pub fn finalize(config: ProviderConfig) -> Result<Finalized, ConfigError> {
    let candidate = config.with_defaults();
    let (report, built) = Validator::run(&candidate);
    report.emit();
    match built {
        Some(config) => {
            tracing::debug!(
                clients = config.clients.len(),
                warnings = report.warnings().count(),
                "OIDC provider configuration finalized"
            );
            Ok(Finalized { config, report })
        }
        None => Err(ConfigError::Invalid(report)),
    }
}

impl ProviderConfig {
    /// Shorthand for [`finalize`].
    pub fn finalize(self) -> Result<Finalized, ConfigError> {
        finalize(self)
    }
}
