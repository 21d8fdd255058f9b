//! Configuration validation.
//!
//! Semantic checks on top of serde's syntactic ones. Returns all validation
//! errors, not just the first.

use crate::config::schema::LoggerConfig;

/// A single semantic problem with a config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyServerName,
    ZeroLargeTextThreshold,
    ZeroHtmlEchoLimit,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyServerName => write!(f, "server_name must not be empty"),
            ValidationError::ZeroLargeTextThreshold => {
                write!(f, "render.large_text_threshold must be greater than zero")
            }
            ValidationError::ZeroHtmlEchoLimit => {
                write!(f, "render.html_echo_limit must be greater than zero")
            }
        }
    }
}

/// Validate a config, collecting every problem found.
pub fn validate_config(config: &LoggerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    if config.server_name.trim().is_empty() {
        errors.push(ValidationError::EmptyServerName);
    }
    if config.render.large_text_threshold == 0 {
        errors.push(ValidationError::ZeroLargeTextThreshold);
    }
    if config.render.html_echo_limit == 0 {
        errors.push(ValidationError::ZeroHtmlEchoLimit);
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_with_name_is_valid() {
        let config = LoggerConfig::named("scim");
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn all_problems_are_reported_together() {
        let mut config = LoggerConfig::default();
        config.render.large_text_threshold = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyServerName,
                ValidationError::ZeroLargeTextThreshold,
            ]
        );
    }
}
