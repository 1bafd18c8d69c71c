//! Cross-field validation of a defaulted provider configuration.
//!
//! The validator never stops at the first problem: every finding is
//! collected so an operator can fix the configuration in one pass.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use garde::Validate;
use serde::Serialize;
use url::{Host, Url};

use crate::client::OidcClient;
use crate::config::{ClientConfig, CorsOrigin, ProviderConfig};
use crate::keys::Secret;
use crate::provider::{CorsPolicy, OidcProviderConfig, ParPolicy, TokenLifespans};
use crate::vocabulary::{
    ConsentMode, CorsEndpoint, GrantType, PkceChallengeMethod, PkceEnforcement, ResponseMode,
    ResponseType, Scope, UserinfoSigningAlgorithm, Vocabulary,
};

/// Entropy below this value is accepted but reported.
pub const RECOMMENDED_MINIMUM_PARAMETER_ENTROPY: i32 = 8;
/// Smallest accepted issuer key.
pub const MINIMUM_ISSUER_KEY_BITS: usize = 2048;
/// Upper bound for a pushed request context.
pub const MAX_PAR_CONTEXT_LIFESPAN: Duration = Duration::from_secs(60 * 60);

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The server must not start with this configuration.
    Error,
    /// Discouraged but permitted.
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
            Severity::Info => f.write_str("info"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// A required value is absent.
    Missing,
    /// A value could not be interpreted (URL, length, shape).
    Malformed,
    /// A value outside its closed vocabulary.
    UnknownValue,
    OutOfRange,
    Duplicate,
    /// The combination weakens a protocol protection.
    Insecure,
    /// Two settings contradict each other.
    Conflict,
    /// A value intentionally shared between clients.
    Shared,
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Configuration key path, e.g. `clients[1].redirect_uris[0]`.
    pub path: String,
    pub severity: Severity,
    pub kind: FindingKind,
    pub message: String,
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.path, self.message)
    }
}

/// Ordered list of findings produced by validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    findings: Vec<Finding>,
}

impl ValidationReport {
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.with_severity(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.with_severity(Severity::Warning)
    }

    pub fn infos(&self) -> impl Iterator<Item = &Finding> {
        self.with_severity(Severity::Info)
    }

    fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.severity == severity)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Findings at the given path.
    pub fn at(&self, path: &str) -> impl Iterator<Item = &Finding> {
        let path = path.to_string();
        self.findings.iter().filter(move |f| f.path == path)
    }

    /// Render the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Log every finding at the level matching its severity.
    pub fn emit(&self) {
        for finding in &self.findings {
            match finding.severity {
                Severity::Error => tracing::error!(
                    path = %finding.path,
                    kind = ?finding.kind,
                    "{}",
                    finding.message
                ),
                Severity::Warning => tracing::warn!(
                    path = %finding.path,
                    kind = ?finding.kind,
                    "{}",
                    finding.message
                ),
                Severity::Info => tracing::info!(
                    path = %finding.path,
                    kind = ?finding.kind,
                    "{}",
                    finding.message
                ),
            }
        }
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, finding) in self.findings.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{finding}")?;
        }
        Ok(())
    }
}

/// Validate a defaulted configuration without building the final object.
pub fn validate(config: &ProviderConfig) -> ValidationReport {
    Validator::run(config).0
}

#[derive(Default)]
pub(crate) struct Validator {
    findings: Vec<Finding>,
}

impl Validator {
    /// Validate `config`; the final object is only returned when no
    /// error-class finding was produced.
    pub(crate) fn run(config: &ProviderConfig) -> (ValidationReport, Option<OidcProviderConfig>) {
        let mut v = Validator::default();

        v.field_constraints(config);
        let hmac_secret = v.hmac_secret(config);
        v.issuer_keys(config);
        let lifespans = v.lifespans(config);
        let entropy = v.minimum_parameter_entropy(config);
        let enforce_pkce = v.enforce_pkce(config);
        if config.enable_pkce_plain_challenge {
            v.warning(
                "enable_pkce_plain_challenge",
                FindingKind::Insecure,
                "the 'plain' PKCE challenge method offers no protection against code interception; prefer 'S256'",
            );
        }
        let par = v.par(config);

        if config.clients.is_empty() {
            v.error("clients", FindingKind::Missing, "at least one client must be configured");
        }
        let clients: Vec<Option<OidcClient>> = config
            .clients
            .iter()
            .enumerate()
            .map(|(i, client)| v.client(i, client, config, enforce_pkce))
            .collect();
        v.unique_client_ids(config);
        v.shared_sector_identifiers(config);
        let cors = v.cors(config, &clients);

        let report = ValidationReport { findings: v.findings };
        if report.has_errors() {
            return (report, None);
        }

        let (Some(hmac_secret), Some(lifespans), Some(entropy), Some(enforce_pkce), Some(par), Some(cors)) =
            (hmac_secret, lifespans, entropy, enforce_pkce, par, cors)
        else {
            return (report, None);
        };
        let Some(clients) = clients.into_iter().collect::<Option<Vec<_>>>() else {
            return (report, None);
        };
        let client_index = clients
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();

        let built = OidcProviderConfig {
            hmac_secret,
            issuer_certificate_chain: config.issuer_certificate_chain.clone(),
            issuer_private_key: config.issuer_private_key.clone(),
            lifespans,
            enable_client_debug_messages: config.enable_client_debug_messages,
            minimum_parameter_entropy: entropy,
            enforce_pkce,
            enable_pkce_plain_challenge: config.enable_pkce_plain_challenge,
            cors,
            par,
            clients,
            client_index,
        };
        (report, Some(built))
    }

    fn push(&mut self, path: impl Into<String>, severity: Severity, kind: FindingKind, message: impl Into<String>) {
        self.findings.push(Finding {
            path: path.into(),
            severity,
            kind,
            message: message.into(),
        });
    }

    fn error(&mut self, path: impl Into<String>, kind: FindingKind, message: impl Into<String>) {
        self.push(path, Severity::Error, kind, message);
    }

    fn warning(&mut self, path: impl Into<String>, kind: FindingKind, message: impl Into<String>) {
        self.push(path, Severity::Warning, kind, message);
    }

    fn info(&mut self, path: impl Into<String>, kind: FindingKind, message: impl Into<String>) {
        self.push(path, Severity::Info, kind, message);
    }

    // ── Provider ────────────────────────────────────────────────────────

    /// Field-local constraints declared on the schema.
    fn field_constraints(&mut self, config: &ProviderConfig) {
        if let Err(report) = config.validate() {
            for (path, error) in report.iter() {
                self.error(path.to_string(), FindingKind::Malformed, error.message().to_string());
            }
        }
    }

    fn hmac_secret(&mut self, config: &ProviderConfig) -> Option<Secret> {
        match &config.hmac_secret {
            Some(secret) if !secret.is_empty() => Some(secret.clone()),
            _ => {
                self.error("hmac_secret", FindingKind::Missing, "option 'hmac_secret' is required");
                None
            }
        }
    }

    fn issuer_keys(&mut self, config: &ProviderConfig) {
        match &config.issuer_private_key {
            Some(key) if key.bits() < MINIMUM_ISSUER_KEY_BITS => self.error(
                "issuer_private_key",
                FindingKind::OutOfRange,
                format!(
                    "issuer private key is {} bits; at least {MINIMUM_ISSUER_KEY_BITS} bits are required",
                    key.bits()
                ),
            ),
            Some(_) => {}
            None if !config.issuer_certificate_chain.is_empty() => self.error(
                "issuer_certificate_chain",
                FindingKind::Conflict,
                "option 'issuer_certificate_chain' requires 'issuer_private_key'",
            ),
            None => {}
        }
    }

    fn lifespans(&mut self, config: &ProviderConfig) -> Option<TokenLifespans> {
        let access_token = self.required(config.access_token_lifespan, "access_token_lifespan");
        let authorize_code = self.required(config.authorize_code_lifespan, "authorize_code_lifespan");
        let id_token = self.required(config.id_token_lifespan, "id_token_lifespan");
        let refresh_token = self.required(config.refresh_token_lifespan, "refresh_token_lifespan");
        Some(TokenLifespans {
            access_token: access_token?,
            authorize_code: authorize_code?,
            id_token: id_token?,
            refresh_token: refresh_token?,
        })
    }

    fn required<T>(&mut self, value: Option<T>, path: &str) -> Option<T> {
        if value.is_none() {
            self.error(path, FindingKind::Missing, format!("option '{path}' is required"));
        }
        value
    }

    fn minimum_parameter_entropy(&mut self, config: &ProviderConfig) -> Option<usize> {
        let recommended = RECOMMENDED_MINIMUM_PARAMETER_ENTROPY;
        match config.minimum_parameter_entropy {
            None => usize::try_from(recommended).ok(),
            Some(value) if value < 0 => {
                self.error(
                    "minimum_parameter_entropy",
                    FindingKind::OutOfRange,
                    format!("minimum parameter entropy must not be negative, got {value}"),
                );
                None
            }
            Some(value) => {
                if value < recommended {
                    self.warning(
                        "minimum_parameter_entropy",
                        FindingKind::Insecure,
                        format!(
                            "minimum parameter entropy of {value} is below the recommended {recommended}"
                        ),
                    );
                }
                usize::try_from(value).ok()
            }
        }
    }

    fn enforce_pkce(&mut self, config: &ProviderConfig) -> Option<PkceEnforcement> {
        let raw = self.required(config.enforce_pkce.as_deref(), "enforce_pkce")?;
        self.parse_value::<PkceEnforcement>("enforce_pkce", raw)
    }

    fn par(&mut self, config: &ProviderConfig) -> Option<ParPolicy> {
        let path = "pushed_authorizations.context_lifespan";
        let context_lifespan = self.required(config.par.context_lifespan, path)?;
        if context_lifespan.is_zero() {
            self.error(path, FindingKind::OutOfRange, "PAR context lifespan must be positive");
            return None;
        }
        if context_lifespan > MAX_PAR_CONTEXT_LIFESPAN {
            self.error(
                path,
                FindingKind::OutOfRange,
                format!(
                    "PAR context lifespan of {}s exceeds the maximum of {}s",
                    context_lifespan.as_secs(),
                    MAX_PAR_CONTEXT_LIFESPAN.as_secs()
                ),
            );
            return None;
        }
        Some(ParPolicy {
            enforce: config.par.enforce,
            context_lifespan,
        })
    }

    // ── Vocabulary helpers ─────────────────────────────────────────────

    fn parse_value<T: Vocabulary>(&mut self, path: &str, raw: &str) -> Option<T> {
        match raw.parse::<T>() {
            Ok(value) => Some(value),
            Err(err) => {
                self.error(
                    path,
                    FindingKind::UnknownValue,
                    format!("{err}; expected one of {}", T::accepted_values()),
                );
                None
            }
        }
    }

    /// Parse every entry; unknown entries are reported individually.
    fn parse_list<T: Vocabulary>(&mut self, path: &str, raw: Option<&Vec<String>>) -> Option<Vec<T>> {
        let raw = self.required(raw, path)?;
        let mut parsed = Vec::with_capacity(raw.len());
        let mut complete = true;
        for (i, value) in raw.iter().enumerate() {
            match self.parse_value::<T>(&format!("{path}[{i}]"), value) {
                Some(v) => parsed.push(v),
                None => complete = false,
            }
        }
        complete.then_some(parsed)
    }

    // ── Clients ─────────────────────────────────────────────────────────

    fn client(
        &mut self,
        index: usize,
        client: &ClientConfig,
        provider: &ProviderConfig,
        enforce_pkce: Option<PkceEnforcement>,
    ) -> Option<OidcClient> {
        let base = format!("clients[{index}]");
        let public = client.is_public();

        if client.public && client.secret.is_some() {
            self.error(
                format!("{base}.secret"),
                FindingKind::Conflict,
                "public clients must not have a secret",
            );
        }

        let redirect_uris = self.redirect_uris(&base, client, public);
        let sector_identifier = self.sector_identifier(&base, client);

        let scopes = self.parse_list::<Scope>(&format!("{base}.scopes"), client.scopes.as_ref());
        let grant_types =
            self.parse_list::<GrantType>(&format!("{base}.grant_types"), client.grant_types.as_ref());
        let response_types = self
            .parse_list::<ResponseType>(&format!("{base}.response_types"), client.response_types.as_ref());
        let response_modes =
            self.parse_list::<ResponseMode>(&format!("{base}.response_modes"), client.response_modes.as_ref());

        if let (Some(scopes), Some(grant_types), Some(response_types), Some(response_modes)) =
            (&scopes, &grant_types, &response_types, &response_modes)
        {
            self.flow_consistency(&base, public, scopes, grant_types, response_types, response_modes);
        }

        let policy = self.required(client.policy.clone(), &format!("{base}.authorization_policy"));

        self.enforcement_overrides(&base, client, provider, enforce_pkce, public);
        let pkce_challenge_method = self.pkce_challenge_method(&base, client, provider, enforce_pkce, public);

        let userinfo_signing_algorithm = self.userinfo_signing_algorithm(&base, client, provider);
        let (consent_mode, consent_pre_configured_duration) = self.consent(&base, client);

        Some(OidcClient {
            id: client.id.clone(),
            description: client.description.clone().unwrap_or_else(|| client.id.clone()),
            secret: client.secret.clone(),
            sector_identifier: sector_identifier?,
            public,
            redirect_uris: redirect_uris?,
            audience: client.audience.clone(),
            scopes: scopes?,
            grant_types: grant_types?,
            response_types: response_types?,
            response_modes: response_modes?,
            policy: policy?,
            enforce_par: client.enforce_par,
            enforce_pkce: client.enforce_pkce,
            pkce_challenge_method: pkce_challenge_method?,
            userinfo_signing_algorithm: userinfo_signing_algorithm?,
            consent_mode: consent_mode?,
            consent_pre_configured_duration: consent_pre_configured_duration?,
        })
    }

    fn redirect_uris(&mut self, base: &str, client: &ClientConfig, public: bool) -> Option<Vec<Url>> {
        let mut parsed = Vec::with_capacity(client.redirect_uris.len());
        let mut complete = true;
        for (i, raw) in client.redirect_uris.iter().enumerate() {
            let path = format!("{base}.redirect_uris[{i}]");
            let url = match Url::parse(raw) {
                Ok(url) => url,
                Err(e) => {
                    self.error(
                        path,
                        FindingKind::Malformed,
                        format!("redirect URI '{raw}' is not an absolute URL: {e}"),
                    );
                    complete = false;
                    continue;
                }
            };
            if url.fragment().is_some() {
                self.error(
                    &path,
                    FindingKind::Malformed,
                    format!("redirect URI '{raw}' must not contain a fragment"),
                );
                complete = false;
            }
            match url.scheme() {
                "https" => {}
                "http" if public && !is_loopback(&url) => {
                    self.error(
                        &path,
                        FindingKind::Insecure,
                        format!(
                            "redirect URI '{raw}' uses 'http' on a non-loopback host; public clients must use 'https'"
                        ),
                    );
                    complete = false;
                }
                "http" => {}
                scheme if !public => {
                    self.error(
                        &path,
                        FindingKind::Malformed,
                        format!(
                            "redirect URI '{raw}' uses scheme '{scheme}'; confidential clients must use 'http' or 'https'"
                        ),
                    );
                    complete = false;
                }
                _ => {}
            }
            parsed.push(url);
        }
        complete.then_some(parsed)
    }

    fn sector_identifier(&mut self, base: &str, client: &ClientConfig) -> Option<Option<Url>> {
        let Some(raw) = &client.sector_identifier else {
            return Some(None);
        };
        match Url::parse(raw) {
            Ok(url) => Some(Some(url)),
            Err(e) => {
                self.error(
                    format!("{base}.sector_identifier"),
                    FindingKind::Malformed,
                    format!("sector identifier '{raw}' is not an absolute URL: {e}"),
                );
                None
            }
        }
    }

    fn flow_consistency(
        &mut self,
        base: &str,
        public: bool,
        scopes: &[Scope],
        grant_types: &[GrantType],
        response_types: &[ResponseType],
        response_modes: &[ResponseMode],
    ) {
        if response_types.iter().any(|rt| rt.issues_code())
            && !grant_types.contains(&GrantType::AuthorizationCode)
        {
            self.error(
                format!("{base}.response_types"),
                FindingKind::Conflict,
                "response types issuing a code require the 'authorization_code' grant type",
            );
        }
        let front_channel = response_types.iter().any(|rt| rt.issues_front_channel_tokens());
        if front_channel && !grant_types.contains(&GrantType::Implicit) {
            self.error(
                format!("{base}.response_types"),
                FindingKind::Conflict,
                "response types issuing tokens from the authorization endpoint require the 'implicit' grant type",
            );
        }
        if front_channel && response_modes.contains(&ResponseMode::Query) {
            self.error(
                format!("{base}.response_modes"),
                FindingKind::Insecure,
                "response mode 'query' must not be used with response types that return tokens",
            );
        }
        if scopes.contains(&Scope::OfflineAccess) && !grant_types.contains(&GrantType::RefreshToken) {
            self.error(
                format!("{base}.scopes"),
                FindingKind::Conflict,
                "scope 'offline_access' requires the 'refresh_token' grant type",
            );
        }
        if public && grant_types.contains(&GrantType::ClientCredentials) {
            self.error(
                format!("{base}.grant_types"),
                FindingKind::Conflict,
                "grant type 'client_credentials' requires a confidential client",
            );
        }
        if !scopes.contains(&Scope::OpenId) {
            self.warning(
                format!("{base}.scopes"),
                FindingKind::Missing,
                "scope 'openid' is not allowed; the client cannot obtain ID tokens",
            );
        }
    }

    /// Per-client overrides may widen provider enforcement, never narrow it.
    fn enforcement_overrides(
        &mut self,
        base: &str,
        client: &ClientConfig,
        provider: &ProviderConfig,
        enforce_pkce: Option<PkceEnforcement>,
        public: bool,
    ) {
        if provider.par.enforce && client.enforce_par == Some(false) {
            self.error(
                format!("{base}.enforce_par"),
                FindingKind::Conflict,
                "PAR is enforced for all clients; a client cannot opt out",
            );
        }
        let provider_requires_pkce = match enforce_pkce {
            Some(PkceEnforcement::Always) => true,
            Some(PkceEnforcement::PublicClientsOnly) => public,
            Some(PkceEnforcement::Never) | None => false,
        };
        if provider_requires_pkce && client.enforce_pkce == Some(false) {
            self.error(
                format!("{base}.enforce_pkce"),
                FindingKind::Conflict,
                "PKCE is enforced for this client by the provider; a client cannot opt out",
            );
        }
    }

    fn pkce_challenge_method(
        &mut self,
        base: &str,
        client: &ClientConfig,
        provider: &ProviderConfig,
        enforce_pkce: Option<PkceEnforcement>,
        public: bool,
    ) -> Option<Option<PkceChallengeMethod>> {
        let path = format!("{base}.pkce_challenge_method");
        let method = match client.pkce_challenge_method.as_deref() {
            None => None,
            Some(raw) => Some(self.parse_value::<PkceChallengeMethod>(&path, raw)?),
        };

        if method == Some(PkceChallengeMethod::Plain) && !provider.enable_pkce_plain_challenge {
            self.error(
                &path,
                FindingKind::Conflict,
                "challenge method 'plain' requires 'enable_pkce_plain_challenge'",
            );
        }

        let pkce_required = client.enforce_pkce == Some(true)
            || matches!(
                enforce_pkce,
                Some(PkceEnforcement::Always | PkceEnforcement::PublicClientsOnly)
            );
        if public
            && pkce_required
            && provider.enable_pkce_plain_challenge
            && method != Some(PkceChallengeMethod::S256)
        {
            self.error(
                &path,
                FindingKind::Insecure,
                "public client requires PKCE but may downgrade to the 'plain' challenge; set 'pkce_challenge_method' to 'S256'",
            );
        }
        Some(method)
    }

    fn userinfo_signing_algorithm(
        &mut self,
        base: &str,
        client: &ClientConfig,
        provider: &ProviderConfig,
    ) -> Option<UserinfoSigningAlgorithm> {
        let path = format!("{base}.userinfo_signing_algorithm");
        let raw = self.required(client.userinfo_signing_algorithm.as_deref(), &path)?;
        let algorithm = self.parse_value::<UserinfoSigningAlgorithm>(&path, raw)?;
        if algorithm == UserinfoSigningAlgorithm::RS256 && provider.issuer_private_key.is_none() {
            self.error(
                path,
                FindingKind::Conflict,
                "userinfo signing algorithm 'RS256' requires 'issuer_private_key'",
            );
        }
        Some(algorithm)
    }

    fn consent(&mut self, base: &str, client: &ClientConfig) -> (Option<ConsentMode>, Option<Duration>) {
        let mode_path = format!("{base}.consent_mode");
        let mode = self
            .required(client.consent_mode.as_deref(), &mode_path)
            .and_then(|raw| self.parse_value::<ConsentMode>(&mode_path, raw));
        let duration = self.required(
            client.consent_pre_configured_duration,
            &format!("{base}.pre_configured_consent_duration"),
        );
        if mode == Some(ConsentMode::PreConfigured) && duration.is_some_and(|d| d.is_zero()) {
            self.warning(
                format!("{base}.pre_configured_consent_duration"),
                FindingKind::OutOfRange,
                "pre-configured consent with a zero duration is never remembered",
            );
        }
        (mode, duration)
    }

    fn unique_client_ids(&mut self, config: &ProviderConfig) {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (i, client) in config.clients.iter().enumerate() {
            if client.id.is_empty() {
                continue;
            }
            if let Some(first) = seen.get(client.id.as_str()) {
                self.error(
                    format!("clients[{i}].id"),
                    FindingKind::Duplicate,
                    format!(
                        "client id '{}' is used by both clients[{first}] and clients[{i}]",
                        client.id
                    ),
                );
            } else {
                seen.insert(&client.id, i);
            }
        }
    }

    fn shared_sector_identifiers(&mut self, config: &ProviderConfig) {
        let mut groups: Vec<(Url, Vec<usize>)> = Vec::new();
        for (i, client) in config.clients.iter().enumerate() {
            // Unparsable identifiers are reported by the client checks.
            let Some(sector) = client
                .sector_identifier
                .as_deref()
                .and_then(|raw| Url::parse(raw).ok())
            else {
                continue;
            };
            match groups.iter_mut().find(|(s, _)| *s == sector) {
                Some((_, members)) => members.push(i),
                None => groups.push((sector, vec![i])),
            }
        }
        for (sector, members) in groups.into_iter().filter(|(_, m)| m.len() > 1) {
            let names: Vec<String> = members.iter().map(|i| format!("clients[{i}]")).collect();
            self.info(
                format!("clients[{}].sector_identifier", members[0]),
                FindingKind::Shared,
                format!(
                    "sector identifier '{sector}' is shared by {}; they receive the same pairwise subject identifiers",
                    names.join(", ")
                ),
            );
        }
    }

    // ── CORS ────────────────────────────────────────────────────────────

    fn cors(&mut self, config: &ProviderConfig, clients: &[Option<OidcClient>]) -> Option<CorsPolicy> {
        let cors = &config.cors;
        let mut endpoints = Vec::with_capacity(cors.endpoints.len());
        let mut complete = true;
        for (i, raw) in cors.endpoints.iter().enumerate() {
            match self.parse_value::<CorsEndpoint>(&format!("cors.endpoints[{i}]"), raw) {
                Some(endpoint) => endpoints.push(endpoint),
                None => complete = false,
            }
        }

        let mut wildcard = false;
        for (i, origin) in cors.allowed_origins.iter().enumerate() {
            let path = format!("cors.allowed_origins[{i}]");
            match origin {
                CorsOrigin::Any => wildcard = true,
                CorsOrigin::Url(url) => {
                    let shown = origin_for_display(url);
                    if !matches!(url.scheme(), "http" | "https") || !url.origin().is_tuple() {
                        self.error(
                            &path,
                            FindingKind::Malformed,
                            format!("origin '{shown}' must be an 'http' or 'https' URL with a host"),
                        );
                        complete = false;
                    }
                    if !url.username().is_empty() || url.password().is_some() {
                        self.error(
                            &path,
                            FindingKind::Malformed,
                            format!("origin '{shown}' must not contain credentials"),
                        );
                        complete = false;
                    }
                    if url.path() != "/" && !url.path().is_empty() {
                        self.error(
                            &path,
                            FindingKind::Malformed,
                            format!("origin '{shown}' must not have a path"),
                        );
                        complete = false;
                    }
                    if url.query().is_some() || url.fragment().is_some() {
                        self.error(
                            &path,
                            FindingKind::Malformed,
                            format!("origin '{shown}' must not have a query or fragment"),
                        );
                        complete = false;
                    }
                }
            }
        }

        if wildcard && cors.allowed_origins.len() > 1 {
            self.error(
                "cors.allowed_origins",
                FindingKind::Conflict,
                "the wildcard origin '*' must be the only allowed origin",
            );
            complete = false;
        }
        if wildcard
            && cors.allowed_origins_from_client_redirect_uris
            && endpoints.iter().any(|e| e.carries_credentials())
        {
            self.error(
                "cors.allowed_origins_from_client_redirect_uris",
                FindingKind::Insecure,
                "the wildcard origin '*' cannot be combined with origins derived from client redirect URIs on endpoints that carry credentials",
            );
            complete = false;
        }

        let mut allowed_origins = cors.allowed_origins.clone();
        if cors.allowed_origins_from_client_redirect_uris {
            let derived = clients
                .iter()
                .flatten()
                .flat_map(|client| client.redirect_uris.iter())
                .filter_map(redirect_origin);
            for origin in derived {
                if !allowed_origins.contains(&origin) {
                    allowed_origins.push(origin);
                }
            }
        }

        complete.then(|| CorsPolicy {
            endpoints,
            allowed_origins,
            allowed_origins_from_client_redirect_uris: cors.allowed_origins_from_client_redirect_uris,
        })
    }
}

/// An origin with any userinfo stripped, for messages.
fn origin_for_display(url: &Url) -> String {
    let mut redacted = url.clone();
    let _ = redacted.set_username("");
    let _ = redacted.set_password(None);
    redacted.to_string()
}

/// Origin of a redirect URI as an allowed CORS origin. Opaque origins
/// (custom schemes) have no usable `Origin` header form.
fn redirect_origin(redirect_uri: &Url) -> Option<CorsOrigin> {
    let origin = redirect_uri.origin();
    if !origin.is_tuple() {
        return None;
    }
    Url::parse(&origin.ascii_serialization()).ok().map(CorsOrigin::Url)
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
        Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
        None => false,
    }
}
