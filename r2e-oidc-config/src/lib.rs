//! OpenID Connect provider configuration for R2E.
//!
//! Operators declare a sparse configuration (the draft), usually under
//! `identity_providers.oidc` in the application YAML. The crate fills
//! unset values with defaults, validates every cross-field and security
//! rule, and produces an immutable [`OidcProviderConfig`] shared with the
//! HTTP layer and the client registry.
//!
//! # Example
//!
//! ```ignore
//! use r2e_oidc_config::prelude::*;
//!
//! let draft = r2e_oidc_config::loader::load_file("application.yaml")?;
//! let finalized = draft.finalize()?;
//! for warning in finalized.report.warnings() {
//!     eprintln!("{warning}");
//! }
//! let handle = ProviderConfigHandle::new(finalized.config);
//! let client = handle.current().client("app1").cloned();
//! ```

pub mod client;
pub mod config;
pub mod defaults;
pub mod duration;
pub mod error;
pub mod keys;
pub mod loader;
pub mod provider;
pub mod secrets;
pub mod validation;
pub mod vocabulary;

mod handle;

pub use client::OidcClient;
pub use config::{ClientConfig, CorsConfig, CorsOrigin, ParConfig, ProviderConfig};
pub use defaults::{
    apply_client_defaults, apply_defaults, ClientDefaults, ProviderDefaults,
    DEFAULT_CLIENT_CONFIG, DEFAULT_PROVIDER_CONFIG,
};
pub use error::{ConfigError, SchemaError};
pub use handle::ProviderConfigHandle;
pub use keys::{CertificateChain, IssuerPrivateKey, PasswordDigest, Secret};
pub use provider::{finalize, CorsPolicy, Finalized, OidcProviderConfig, ParPolicy, TokenLifespans};
pub use secrets::{DefaultSecretResolver, SecretResolver};
pub use validation::{validate, Finding, FindingKind, Severity, ValidationReport};
pub use vocabulary::{
    ConsentMode, CorsEndpoint, GrantType, PkceChallengeMethod, PkceEnforcement, ResponseMode,
    ResponseType, Scope, UnknownValue, UserinfoSigningAlgorithm,
};

pub mod prelude {
    //! Re-exports of the most commonly used types.
    pub use crate::{
        ClientConfig, ConfigError, Finalized, OidcClient, OidcProviderConfig, ProviderConfig,
        ProviderConfigHandle, Severity, ValidationReport,
    };
}
