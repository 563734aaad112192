//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// The file is not a TOML document (judged by its extension).
    #[error("Unsupported config format for {path}: expected a .toml file")]
    InvalidFormat { path: String },

    /// Rejected by the validator; `field` is the dotted config path.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl ConfigError {
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The dotted config path this error refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidValue { field, .. } => Some(field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value_names_field() {
        let err = ConfigError::invalid_value("coordinator.batch_size", "must be greater than 0");
        assert_eq!(err.field(), Some("coordinator.batch_size"));
        assert_eq!(
            err.to_string(),
            "Invalid value for coordinator.batch_size: must be greater than 0"
        );
    }

    #[test]
    fn test_invalid_format_names_path() {
        let err = ConfigError::InvalidFormat {
            path: "mnemo.yaml".to_string(),
        };
        assert!(err.to_string().contains("mnemo.yaml"));
        assert!(err.to_string().contains(".toml"));
        assert_eq!(err.field(), None);
    }

    #[test]
    fn test_io_error_keeps_path_and_source() {
        let err = ConfigError::Io {
            path: "/etc/mnemo.toml".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().starts_with("Failed to read /etc/mnemo.toml"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_env_var_not_set_error() {
        let err = ConfigError::EnvVarNotSet("OPENAI_API_KEY".to_string());
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }
}
