//! Reading the provider configuration from YAML.
//!
//! The provider section lives at `identity_providers.oidc` of the
//! application document. Placeholders in string values are resolved
//! before the section is mapped onto [`ProviderConfig`].

use std::path::Path;

use serde_yaml::Value;

use crate::config::ProviderConfig;
use crate::error::{ConfigError, SchemaError};
use crate::secrets::{resolve_placeholders, DefaultSecretResolver, SecretResolver};

/// Key path of the provider section inside the application document.
pub const SECTION_PATH: [&str; 2] = ["identity_providers", "oidc"];

/// Load the provider section from a YAML file.
pub fn load_file(path: impl AsRef<Path>) -> Result<ProviderConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
    tracing::debug!(path = %path.display(), "Loading OIDC provider configuration");
    from_yaml_str(&content)
}

/// Parse the provider section out of a full application document.
pub fn from_yaml_str(content: &str) -> Result<ProviderConfig, ConfigError> {
    from_yaml_str_with_resolver(content, &DefaultSecretResolver)
}

/// Like [`from_yaml_str`], resolving placeholders with `resolver`.
pub fn from_yaml_str_with_resolver(
    content: &str,
    resolver: &dyn SecretResolver,
) -> Result<ProviderConfig, ConfigError> {
    let document = parse_document(content)?;
    let section = SECTION_PATH
        .iter()
        .try_fold(&document, |node, key| node.get(*key))
        .ok_or_else(|| ConfigError::NotFound(SECTION_PATH.join(".")))?;
    section_from_value(section.clone(), resolver)
}

/// Parse a document that contains only the provider section.
pub fn section_from_yaml_str(
    content: &str,
    resolver: &dyn SecretResolver,
) -> Result<ProviderConfig, ConfigError> {
    section_from_value(parse_document(content)?, resolver)
}

fn parse_document(content: &str) -> Result<Value, ConfigError> {
    serde_yaml::from_str(content).map_err(|e| ConfigError::Load(e.to_string()))
}

fn section_from_value(
    mut section: Value,
    resolver: &dyn SecretResolver,
) -> Result<ProviderConfig, ConfigError> {
    resolve_strings(&mut section, "", resolver)?;
    serde_yaml::from_value(section).map_err(|e| ConfigError::Schema(SchemaError::from_yaml(&e)))
}

/// Resolve placeholders in every string leaf of the tree. `key` is the
/// path of `value` inside the OIDC section, used in error messages.
fn resolve_strings(
    value: &mut Value,
    key: &str,
    resolver: &dyn SecretResolver,
) -> Result<(), ConfigError> {
    match value {
        Value::String(s) if s.contains("${") => {
            *s = resolve_placeholders(s, resolver).map_err(|e| referenced_by(e, key))?;
        }
        Value::Sequence(seq) => {
            for (i, item) in seq.iter_mut().enumerate() {
                resolve_strings(item, &format!("{key}[{i}]"), resolver)?;
            }
        }
        Value::Mapping(map) => {
            for (name, item) in map.iter_mut() {
                let name = match name {
                    Value::String(name) => name.clone(),
                    other => format!("{other:?}"),
                };
                let child = if key.is_empty() { name } else { format!("{key}.{name}") };
                resolve_strings(item, &child, resolver)?;
            }
        }
        Value::Tagged(tagged) => resolve_strings(&mut tagged.value, key, resolver)?,
        _ => {}
    }
    Ok(())
}

fn referenced_by(err: ConfigError, key: &str) -> ConfigError {
    match err {
        ConfigError::Load(msg) => ConfigError::Load(format!("{key}: {msg}")),
        ConfigError::NotFound(what) => {
            ConfigError::NotFound(format!("{what} (referenced by '{key}')"))
        }
        other => other,
    }
}
