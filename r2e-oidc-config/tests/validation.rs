use std::time::Duration;

use r2e_oidc_config::{
    validate, ClientConfig, CorsOrigin, FindingKind, IssuerPrivateKey, PasswordDigest,
    ProviderConfig, Secret, Severity, ValidationReport,
};
use rsa::RsaPrivateKey;

const DIGEST: &str =
    "$pbkdf2-sha512$i=310000,l=32$c2FsdHNhbHQ$Y2hlY2tzdW1jaGVja3N1bWNoZWNrc3VtY2hlY2tzdW0";

fn provider(clients: Vec<ClientConfig>) -> ProviderConfig {
    ProviderConfig {
        hmac_secret: Some(Secret::new("a-very-long-and-random-hmac-secret")),
        clients,
        ..Default::default()
    }
}

fn confidential(id: &str) -> ClientConfig {
    let mut client = ClientConfig::new(id);
    client.secret = Some(PasswordDigest::parse(DIGEST).unwrap());
    client.redirect_uris = vec!["https://app.example.com/callback".into()];
    client
}

fn public(id: &str, redirect_uri: &str) -> ClientConfig {
    let mut client = ClientConfig::new(id);
    client.public = true;
    client.redirect_uris = vec![redirect_uri.into()];
    client
}

fn check(config: ProviderConfig) -> ValidationReport {
    validate(&config.with_defaults())
}

fn has(report: &ValidationReport, severity: Severity, path: &str) -> bool {
    report.at(path).any(|f| f.severity == severity)
}

#[test]
fn minimal_configuration_is_clean() {
    let report = check(provider(vec![ClientConfig::new("app1")]));
    assert!(!report.has_errors(), "{report}");
}

#[test]
fn missing_hmac_secret_is_an_error() {
    let config = ProviderConfig {
        clients: vec![ClientConfig::new("app1")],
        ..Default::default()
    };
    assert!(has(&check(config), Severity::Error, "hmac_secret"));
}

#[test]
fn no_clients_is_an_error() {
    assert!(has(&check(provider(vec![])), Severity::Error, "clients"));
}

#[test]
fn duplicate_client_ids_are_reported_with_both_positions() {
    let report = check(provider(vec![
        confidential("app1"),
        confidential("app2"),
        confidential("app1"),
    ]));
    let duplicate = report
        .at("clients[2].id")
        .find(|f| f.kind == FindingKind::Duplicate)
        .expect("duplicate finding");
    assert_eq!(duplicate.severity, Severity::Error);
    assert!(duplicate.message.contains("clients[0]"));
    assert!(duplicate.message.contains("clients[2]"));
}

#[test]
fn empty_client_id_is_malformed_not_duplicate() {
    let report = check(provider(vec![ClientConfig::new(""), ClientConfig::new("")]));
    assert!(has(&report, Severity::Error, "clients[0].id"));
    assert!(report.findings().iter().all(|f| f.kind != FindingKind::Duplicate));
}

#[test]
fn all_findings_are_collected_in_one_pass() {
    let mut bad = confidential("app1");
    bad.scopes = Some(vec!["openid".into(), "admin".into()]);
    bad.consent_mode = Some("sometimes".into());
    let config = ProviderConfig {
        enforce_pkce: Some("sometimes".into()),
        ..provider(vec![bad])
    };
    let report = check(config);
    assert!(has(&report, Severity::Error, "enforce_pkce"));
    assert!(has(&report, Severity::Error, "clients[0].scopes[1]"));
    assert!(has(&report, Severity::Error, "clients[0].consent_mode"));
    assert!(report.errors().all(|f| f.kind == FindingKind::UnknownValue));
}

#[test]
fn par_override_can_only_widen() {
    let mut opted_out = confidential("app1");
    opted_out.enforce_par = Some(false);
    let mut enforced = provider(vec![opted_out.clone()]);
    enforced.par.enforce = true;
    assert!(has(&check(enforced), Severity::Error, "clients[0].enforce_par"));

    for value in [Some(true), Some(false), None] {
        let mut client = confidential("app1");
        client.enforce_par = value;
        let report = check(provider(vec![client]));
        assert!(report.at("clients[0].enforce_par").next().is_none());
    }
}

#[test]
fn pkce_override_can_only_widen() {
    let mut client = public("spa", "https://spa.example.com/cb");
    client.enforce_pkce = Some(false);
    let report = check(provider(vec![client]));
    assert!(has(&report, Severity::Error, "clients[0].enforce_pkce"));

    // A confidential client is not covered by `public_clients_only`.
    let mut confidential_client = confidential("web");
    confidential_client.enforce_pkce = Some(false);
    let report = check(provider(vec![confidential_client.clone()]));
    assert!(report.at("clients[0].enforce_pkce").next().is_none());

    let always = ProviderConfig {
        enforce_pkce: Some("always".into()),
        ..provider(vec![confidential_client])
    };
    assert!(has(&check(always), Severity::Error, "clients[0].enforce_pkce"));
}

#[test]
fn plain_challenge_downgrade_for_public_client() {
    let config = ProviderConfig {
        enable_pkce_plain_challenge: true,
        ..provider(vec![public("spa", "https://spa.example.com/cb")])
    };
    let report = check(config.clone());
    assert!(has(&report, Severity::Warning, "enable_pkce_plain_challenge"));
    assert!(has(&report, Severity::Error, "clients[0].pkce_challenge_method"));

    let mut pinned = config;
    pinned.clients[0].pkce_challenge_method = Some("S256".into());
    let report = check(pinned);
    assert!(report.at("clients[0].pkce_challenge_method").next().is_none());
    assert!(!report.has_errors(), "{report}");
}

#[test]
fn plain_challenge_method_requires_provider_opt_in() {
    let mut client = confidential("web");
    client.pkce_challenge_method = Some("plain".into());
    let report = check(provider(vec![client]));
    let finding = report.at("clients[0].pkce_challenge_method").next().unwrap();
    assert_eq!(finding.kind, FindingKind::Conflict);
}

#[test]
fn redirect_uri_schemes() {
    let report = check(provider(vec![public("spa", "http://app.example.com/cb")]));
    let finding = report.at("clients[0].redirect_uris[0]").next().unwrap();
    assert_eq!(finding.severity, Severity::Error);
    assert_eq!(finding.kind, FindingKind::Insecure);

    for uri in [
        "https://app.example.com/cb",
        "http://127.0.0.1:8080/cb",
        "http://localhost/cb",
        "http://[::1]/cb",
        "com.example.app:/oauth2redirect",
    ] {
        let report = check(provider(vec![public("spa", uri)]));
        assert!(report.at("clients[0].redirect_uris[0]").next().is_none(), "{uri}: {report}");
    }

    // Confidential clients may use plain http but no custom schemes.
    let mut web = confidential("web");
    web.redirect_uris = vec![
        "http://intranet.example.com/cb".into(),
        "com.example.app:/cb".into(),
    ];
    let report = check(provider(vec![web]));
    assert!(report.at("clients[0].redirect_uris[0]").next().is_none());
    assert!(has(&report, Severity::Error, "clients[0].redirect_uris[1]"));
}

#[test]
fn redirect_uri_must_be_absolute_without_fragment() {
    let mut client = confidential("web");
    client.redirect_uris = vec!["/callback".into(), "https://app.example.com/cb#frag".into()];
    let report = check(provider(vec![client]));
    assert!(has(&report, Severity::Error, "clients[0].redirect_uris[0]"));
    assert!(has(&report, Severity::Error, "clients[0].redirect_uris[1]"));
}

#[test]
fn public_client_with_secret_is_a_conflict() {
    let mut client = confidential("app1");
    client.public = true;
    assert!(has(&check(provider(vec![client])), Severity::Error, "clients[0].secret"));
}

#[test]
fn shared_sector_identifier_is_informational() {
    let mut a = confidential("a");
    a.sector_identifier = Some("https://sector.example.com".into());
    let mut b = confidential("b");
    b.sector_identifier = Some("https://sector.example.com".into());
    let mut c = confidential("c");
    c.sector_identifier = Some("not a url".into());

    let report = check(provider(vec![a, b, c]));
    let shared = report.at("clients[0].sector_identifier").next().unwrap();
    assert_eq!(shared.severity, Severity::Info);
    assert_eq!(shared.kind, FindingKind::Shared);
    assert!(shared.message.contains("clients[1]"));
    assert!(has(&report, Severity::Error, "clients[2].sector_identifier"));
}

#[test]
fn sector_identifiers_are_compared_as_urls() {
    let mut a = confidential("a");
    a.sector_identifier = Some("https://sector.example.com".into());
    let mut b = confidential("b");
    b.sector_identifier = Some("https://sector.example.com/".into());
    let mut c = confidential("c");
    c.sector_identifier = Some("https://other.example.com".into());

    let report = check(provider(vec![a, b, c]));
    let shared: Vec<_> = report.infos().collect();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].path, "clients[0].sector_identifier");
    assert!(shared[0].message.contains("clients[1]"));
    assert!(!shared[0].message.contains("clients[2]"));
}

#[test]
fn minimum_parameter_entropy_bounds() {
    let entropy = |value| ProviderConfig {
        minimum_parameter_entropy: Some(value),
        ..provider(vec![confidential("app1")])
    };
    assert!(has(&check(entropy(-1)), Severity::Error, "minimum_parameter_entropy"));
    assert!(has(&check(entropy(0)), Severity::Warning, "minimum_parameter_entropy"));
    assert!(has(&check(entropy(7)), Severity::Warning, "minimum_parameter_entropy"));
    assert!(check(entropy(8)).is_empty());
    assert!(check(entropy(64)).is_empty());
}

#[test]
fn par_context_lifespan_bounds() {
    let lifespan = |value| {
        let mut config = provider(vec![confidential("app1")]);
        config.par.context_lifespan = Some(value);
        config
    };
    let path = "pushed_authorizations.context_lifespan";
    assert!(has(&check(lifespan(Duration::ZERO)), Severity::Error, path));
    assert!(has(&check(lifespan(Duration::from_secs(7200))), Severity::Error, path));
    assert!(check(lifespan(Duration::from_secs(3600))).at(path).next().is_none());
}

#[test]
fn flow_consistency() {
    let mut implicit = confidential("app1");
    implicit.response_types = Some(vec!["id_token".into()]);
    let report = check(provider(vec![implicit.clone()]));
    // Missing implicit grant, and `query` is among the default modes.
    assert!(has(&report, Severity::Error, "clients[0].response_types"));
    assert!(has(&report, Severity::Error, "clients[0].response_modes"));

    implicit.grant_types = Some(vec!["implicit".into()]);
    implicit.response_modes = Some(vec!["form_post".into(), "fragment".into()]);
    assert!(!check(provider(vec![implicit])).has_errors());

    let mut code_only = confidential("app1");
    code_only.grant_types = Some(vec!["refresh_token".into()]);
    assert!(has(&check(provider(vec![code_only])), Severity::Error, "clients[0].response_types"));

    let mut offline = confidential("app1");
    offline.scopes = Some(vec!["openid".into(), "offline_access".into()]);
    offline.grant_types = Some(vec!["authorization_code".into()]);
    assert!(has(&check(provider(vec![offline])), Severity::Error, "clients[0].scopes"));

    let mut machine = public("m2m", "https://m2m.example.com/cb");
    machine.grant_types = Some(vec!["client_credentials".into()]);
    machine.response_types = Some(Vec::new());
    assert!(has(&check(provider(vec![machine])), Severity::Error, "clients[0].grant_types"));
}

#[test]
fn missing_openid_scope_is_a_warning() {
    let mut client = confidential("app1");
    client.scopes = Some(vec!["profile".into()]);
    let report = check(provider(vec![client]));
    assert!(has(&report, Severity::Warning, "clients[0].scopes"));
    assert!(!report.has_errors());
}

#[test]
fn pre_configured_consent_with_zero_duration_is_a_warning() {
    let mut client = confidential("app1");
    client.consent_mode = Some("pre-configured".into());
    client.consent_pre_configured_duration = Some(Duration::ZERO);
    let report = check(provider(vec![client]));
    assert!(has(&report, Severity::Warning, "clients[0].pre_configured_consent_duration"));
}

#[test]
fn cors_rules() {
    let mut config = provider(vec![confidential("app1")]);
    config.cors.endpoints = vec!["token".into(), "metadata".into()];
    config.cors.allowed_origins = vec![
        CorsOrigin::parse("https://ok.example.com").unwrap(),
        CorsOrigin::parse("https://bad.example.com/path").unwrap(),
    ];
    let report = check(config);
    assert!(has(&report, Severity::Error, "cors.endpoints[1]"));
    assert!(report.at("cors.allowed_origins[0]").next().is_none());
    assert!(has(&report, Severity::Error, "cors.allowed_origins[1]"));

    let mut wildcard = provider(vec![confidential("app1")]);
    wildcard.cors.allowed_origins = vec![CorsOrigin::Any, CorsOrigin::parse("https://a.example.com").unwrap()];
    assert!(has(&check(wildcard), Severity::Error, "cors.allowed_origins"));

    let mut derived = provider(vec![confidential("app1")]);
    derived.cors.endpoints = vec!["userinfo".into()];
    derived.cors.allowed_origins = vec![CorsOrigin::Any];
    derived.cors.allowed_origins_from_client_redirect_uris = true;
    assert!(has(
        &check(derived.clone()),
        Severity::Error,
        "cors.allowed_origins_from_client_redirect_uris"
    ));

    derived.cors.endpoints = vec!["authorization".into()];
    assert!(!check(derived).has_errors());
}

#[test]
fn cors_origins_must_be_http_tuple_origins_without_credentials() {
    for raw in ["file:///", "javascript:", "foo:", "https://user:pw@app.example.com"] {
        let mut config = provider(vec![confidential("app1")]);
        config.cors.endpoints = vec!["token".into()];
        config.cors.allowed_origins = vec![CorsOrigin::parse(raw).unwrap()];
        let report = check(config.clone());
        let finding = report.at("cors.allowed_origins[0]").next().unwrap_or_else(|| panic!("{raw}: {report}"));
        assert_eq!(finding.severity, Severity::Error);
        assert_eq!(finding.kind, FindingKind::Malformed);
        assert!(!finding.message.contains("pw@"), "{}", finding.message);
        assert!(config.finalize().is_err(), "{raw}");
    }
}

#[test]
fn certificate_chain_requires_private_key() {
    let mut config = provider(vec![confidential("app1")]);
    config.issuer_certificate_chain = r2e_oidc_config::CertificateChain::from_pem(
        "-----BEGIN CERTIFICATE-----\nAQID\n-----END CERTIFICATE-----\n",
    )
    .unwrap();
    assert!(has(&check(config), Severity::Error, "issuer_certificate_chain"));
}

#[test]
fn rs256_userinfo_requires_private_key() {
    let mut client = confidential("app1");
    client.userinfo_signing_algorithm = Some("RS256".into());
    let report = check(provider(vec![client]));
    assert!(has(&report, Severity::Error, "clients[0].userinfo_signing_algorithm"));
}

#[test]
fn issuer_key_below_minimum_size_is_an_error() {
    let key = RsaPrivateKey::new(&mut rand::rngs::OsRng, 1024).unwrap();
    let config = ProviderConfig {
        issuer_private_key: Some(IssuerPrivateKey::from_key(key)),
        ..provider(vec![confidential("app1")])
    };
    let report = check(config);
    let finding = report.at("issuer_private_key").next().unwrap();
    assert_eq!(finding.severity, Severity::Error);
    assert_eq!(finding.kind, FindingKind::OutOfRange);
}

#[test]
fn garde_constraints_are_folded_into_the_report() {
    let mut client = confidential("app1");
    client.audience = vec![String::new()];
    client.policy = Some(String::new());
    let report = check(provider(vec![client]));
    assert!(report
        .errors()
        .any(|f| f.path.starts_with("clients[0].audience") && f.kind == FindingKind::Malformed));
    assert!(report
        .errors()
        .any(|f| f.path.starts_with("clients[0].policy") && f.kind == FindingKind::Malformed));
}

#[test]
fn report_serializes_to_json() {
    let report = check(ProviderConfig::default());
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    let findings = json["findings"].as_array().unwrap();
    assert!(findings
        .iter()
        .any(|f| f["path"] == "hmac_secret" && f["severity"] == "error" && f["kind"] == "missing"));
}
