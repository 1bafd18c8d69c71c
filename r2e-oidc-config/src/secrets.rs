use std::path::Path;

use crate::error::ConfigError;

/// Source of the values behind `${...}` placeholders.
///
/// The loader calls it for every placeholder found in the OIDC section and
/// names the configuration key in any error it returns.
pub trait SecretResolver: Send + Sync {
    fn resolve(&self, reference: &str) -> Result<String, ConfigError>;
}

/// The inside of a `${...}` placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretReference<'a> {
    /// `${VAR}` or `${env:VAR}`.
    Env(&'a str),
    /// `${file:/run/secrets/oidc_hmac}`.
    File(&'a Path),
}

impl<'a> SecretReference<'a> {
    pub fn parse(reference: &'a str) -> Self {
        match reference.split_once(':') {
            Some(("file", path)) => SecretReference::File(Path::new(path.trim())),
            Some(("env", var)) => SecretReference::Env(var.trim()),
            _ => SecretReference::Env(reference.trim()),
        }
    }
}

/// Resolves environment variables and mounted secret files.
///
/// File contents are trimmed, so a trailing newline in a mounted HMAC
/// secret or PEM key does not end up in the value. An empty file is an
/// error: it would otherwise pass as an unset `hmac_secret`.
pub struct DefaultSecretResolver;

impl SecretResolver for DefaultSecretResolver {
    fn resolve(&self, reference: &str) -> Result<String, ConfigError> {
        match SecretReference::parse(reference) {
            SecretReference::Env(var) => std::env::var(var)
                .map_err(|_| ConfigError::NotFound(format!("environment variable '{var}'"))),
            SecretReference::File(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    ConfigError::Load(format!("secret file '{}': {e}", path.display()))
                })?;
                let value = content.trim();
                if value.is_empty() {
                    return Err(ConfigError::Load(format!(
                        "secret file '{}' is empty",
                        path.display()
                    )));
                }
                Ok(value.to_string())
            }
        }
    }
}

/// Resolve `${...}` placeholders in a string value.
///
/// Resolved text is not scanned again, so a secret containing `${` is
/// kept verbatim.
pub fn resolve_placeholders(
    value: &str,
    resolver: &dyn SecretResolver,
) -> Result<String, ConfigError> {
    let mut result = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        let end = rest[start..]
            .find('}')
            .ok_or_else(|| ConfigError::Load(format!("Unclosed placeholder in: {}", value)))?;
        result.push_str(&rest[..start]);
        result.push_str(&resolver.resolve(&rest[start + 2..start + end])?);
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    Ok(result)
}
