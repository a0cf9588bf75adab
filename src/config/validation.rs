use super::Config;
use anyhow::Result;
use tracing::warn;

/// Validation errors for configuration.
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn error(path: &str, message: &str) -> ConfigValidationError {
    ConfigValidationError {
        path: path.to_string(),
        message: message.to_string(),
    }
}

/// Validate a configuration object.
pub fn validate_config(config: &Config) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    if config.database.pool_size == 0 {
        errors.push(error("database.poolSize", "Pool size must be greater than 0"));
    }

    if config.search.limit == 0 {
        errors.push(error("search.limit", "Search limit must be greater than 0"));
    }

    if config.list.default_limit == 0 {
        errors.push(error(
            "list.defaultLimit",
            "List default limit must be greater than 0",
        ));
    }

    if config.retry.max_attempts == 0 {
        errors.push(error(
            "retry.maxAttempts",
            "At least one attempt is required",
        ));
    }

    if config.retry.initial_delay_ms > config.retry.max_delay_ms {
        errors.push(error(
            "retry.initialDelayMs",
            "Initial delay must not exceed retry.maxDelayMs",
        ));
    }

    let command = config.telegram.command.as_str();
    if command.is_empty() || command.starts_with('/') || command.contains(char::is_whitespace) {
        errors.push(error(
            "telegram.command",
            "Command must be a single word without the leading '/'",
        ));
    }

    if config.telegram.bot_token.is_none() {
        warn!("No Telegram bot token configured; `run` will not start");
    }

    errors
}

/// Validate configuration and return Result.
pub fn validate_config_object(config: &Config) -> Result<()> {
    let errors = validate_config(config);
    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        anyhow::bail!("Configuration validation failed:\n{}", messages.join("\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&Config::default()).is_empty());
        assert!(validate_config_object(&Config::default()).is_ok());
    }

    #[test]
    fn zero_limits_are_rejected() {
        let mut config = Config::default();
        config.search.limit = 0;
        config.list.default_limit = 0;
        config.database.pool_size = 0;

        let paths: Vec<String> = validate_config(&config)
            .into_iter()
            .map(|e| e.path)
            .collect();
        assert_eq!(
            paths,
            vec!["database.poolSize", "search.limit", "list.defaultLimit"]
        );
    }

    #[test]
    fn command_must_be_a_bare_word() {
        for bad in ["", "/acro", "acro bot"] {
            let mut config = Config::default();
            config.telegram.command = bad.to_string();
            let err = validate_config_object(&config).unwrap_err();
            assert!(err.to_string().contains("telegram.command"), "{bad:?}");
        }
    }

    #[test]
    fn inverted_backoff_is_rejected() {
        let mut config = Config::default();
        config.retry.initial_delay_ms = 10_000;
        config.retry.max_delay_ms = 10;
        assert_eq!(validate_config(&config)[0].path, "retry.initialDelayMs");
    }
}
