use crate::validation::ValidationReport;

/// A configuration value whose shape or type does not match the schema.
///
/// Raised while mapping a document onto the schema, before any defaulting
/// or validation happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    pub message: String,
    /// Line in the source document, when known.
    pub line: Option<usize>,
    /// Column in the source document, when known.
    pub column: Option<usize>,
}

impl SchemaError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            column: None,
        }
    }

    pub(crate) fn from_yaml(err: &serde_yaml::Error) -> Self {
        let location = err.location();
        Self {
            message: err.to_string(),
            line: location.as_ref().map(|l| l.line()),
            column: location.as_ref().map(|l| l.column()),
        }
    }
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => {
                write!(f, "{} (line {line}, column {column})", self.message)
            }
            _ => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for SchemaError {}

/// Error type for building an OIDC provider configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// An I/O or secret resolution error occurred while reading the document.
    Load(String),
    /// The requested section or secret reference was not found.
    NotFound(String),
    /// The document does not match the schema. Aborts the pipeline.
    Schema(SchemaError),
    /// Validation produced at least one error-class finding.
    Invalid(ValidationReport),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Load(msg) => write!(f, "OIDC config load error: {msg}"),
            ConfigError::NotFound(key) => write!(f, "OIDC config key not found: {key}"),
            ConfigError::Schema(err) => write!(f, "OIDC config schema error: {err}"),
            ConfigError::Invalid(report) => {
                write!(
                    f,
                    "OIDC config is invalid ({} error(s)):",
                    report.errors().count()
                )?;
                for finding in report.errors() {
                    write!(f, "\n  - {finding}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Schema(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SchemaError> for ConfigError {
    fn from(err: SchemaError) -> Self {
        ConfigError::Schema(err)
    }
}
