use std::time::Duration;

use url::Url;

use crate::keys::PasswordDigest;
use crate::vocabulary::{
    ConsentMode, GrantType, PkceChallengeMethod, ResponseMode, ResponseType, Scope,
    UserinfoSigningAlgorithm,
};

/// A validated OIDC client, as seen by the HTTP layer and the client registry.
///
/// Only reachable through [`OidcProviderConfig`](crate::OidcProviderConfig),
/// which hands out shared references.
#[derive(Debug, Clone, PartialEq)]
pub struct OidcClient {
    pub id: String,
    pub description: String,
    /// Secret digest; `None` for public clients.
    pub secret: Option<PasswordDigest>,
    pub sector_identifier: Option<Url>,
    /// Whether the client is public (flagged as such, or registered without a secret).
    pub public: bool,
    pub redirect_uris: Vec<Url>,
    pub audience: Vec<String>,
    pub scopes: Vec<Scope>,
    pub grant_types: Vec<GrantType>,
    pub response_types: Vec<ResponseType>,
    pub response_modes: Vec<ResponseMode>,
    /// Authorization policy name, resolved by the policy engine.
    pub policy: String,
    /// Explicit PAR override; `None` when the provider setting applies.
    pub enforce_par: Option<bool>,
    /// Explicit PKCE override; `None` when the provider setting applies.
    pub enforce_pkce: Option<bool>,
    pub pkce_challenge_method: Option<PkceChallengeMethod>,
    pub userinfo_signing_algorithm: UserinfoSigningAlgorithm,
    pub consent_mode: ConsentMode,
    pub consent_pre_configured_duration: Duration,
}

impl OidcClient {
    pub fn has_scope(&self, scope: Scope) -> bool {
        self.scopes.contains(&scope)
    }

    pub fn has_grant_type(&self, grant_type: GrantType) -> bool {
        self.grant_types.contains(&grant_type)
    }

    pub fn has_response_type(&self, response_type: ResponseType) -> bool {
        self.response_types.contains(&response_type)
    }

    pub fn has_response_mode(&self, response_mode: ResponseMode) -> bool {
        self.response_modes.contains(&response_mode)
    }

    /// Exact match of a requested `redirect_uri` against the registered ones.
    pub fn is_registered_redirect_uri(&self, redirect_uri: &str) -> bool {
        match Url::parse(redirect_uri) {
            Ok(requested) => self.redirect_uris.contains(&requested),
            Err(_) => false,
        }
    }
}
