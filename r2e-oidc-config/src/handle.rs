use std::sync::{Arc, RwLock};

use crate::config::ProviderConfig;
use crate::error::ConfigError;
use crate::provider::OidcProviderConfig;
use crate::validation::ValidationReport;

/// Shared, swappable provider configuration.
///
/// Readers take an `Arc` snapshot and keep using it for the whole request;
/// a reload publishes a new snapshot in one step. A reload that fails
/// validation leaves the current snapshot in place.
pub struct ProviderConfigHandle {
    current: RwLock<Arc<OidcProviderConfig>>,
}

impl ProviderConfigHandle {
    pub fn new(config: OidcProviderConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(config)),
        }
    }

    /// Run the pipeline on `config` and build a handle around the result.
    pub fn from_config(config: ProviderConfig) -> Result<(Self, ValidationReport), ConfigError> {
        let finalized = config.finalize()?;
        Ok((Self::new(finalized.config), finalized.report))
    }

    /// Current snapshot.
    pub fn current(&self) -> Arc<OidcProviderConfig> {
        let guard = self
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Rebuild from a new sparse configuration and publish it.
    ///
    /// On failure the previous snapshot stays current and the error is
    /// returned to the caller.
    pub fn reload(&self, config: ProviderConfig) -> Result<ValidationReport, ConfigError> {
        let finalized = match config.finalize() {
            Ok(finalized) => finalized,
            Err(err) => {
                tracing::warn!(error = %err, "OIDC configuration reload rejected, keeping current configuration");
                return Err(err);
            }
        };
        let clients = finalized.config.clients().len();
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(finalized.config);
        tracing::info!(clients, "OIDC configuration reloaded");
        Ok(finalized.report)
    }
}

impl std::fmt::Debug for ProviderConfigHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfigHandle")
            .field("clients", &self.current().clients().len())
            .finish()
    }
}
