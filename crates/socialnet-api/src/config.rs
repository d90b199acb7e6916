//! Server configuration read from the environment.

use std::str::FromStr;
use std::time::Duration;

use socialnet_propagation::RetryPolicy;

use crate::error::AppError;

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// PostgreSQL URL; in-memory stores are used when unset.
    pub database_url: Option<String>,
    /// Connection pool size.
    pub database_max_connections: u32,
    /// Attempts per message before dead-lettering.
    pub retry_max_attempts: u32,
    /// Pause between attempts.
    pub retry_delay: Duration,
    /// Upper bound on a single existence check.
    pub validator_timeout: Option<Duration>,
    /// Remote user service, e.g. `http://users:3000/api/v1/users`.
    pub user_service_url: Option<String>,
    /// Remote post service.
    pub post_service_url: Option<String>,
    /// Remote comment service.
    pub comment_service_url: Option<String>,
    /// Period of the orphan sweep; the sweep is off when unset.
    pub reconcile_interval: Option<Duration>,
    /// Prefix of stored object URLs.
    pub object_base_url: String,
    /// OTLP collector endpoint for span export.
    pub otlp_endpoint: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 3000,
            database_url: None,
            database_max_connections: 10,
            retry_max_attempts: 3,
            retry_delay: Duration::from_secs(3),
            validator_timeout: None,
            user_service_url: None,
            post_service_url: None,
            comment_service_url: None,
            reconcile_interval: None,
            object_base_url: "http://localhost:3000/objects".to_owned(),
            otlp_endpoint: None,
        }
    }
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let retry_max_attempts =
            parsed(&var, "RETRY_MAX_ATTEMPTS")?.unwrap_or(defaults.retry_max_attempts);
        if retry_max_attempts == 0 {
            return Err(AppError::Config("RETRY_MAX_ATTEMPTS must be at least 1".into()));
        }

        Ok(Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: parsed(&var, "PORT")?.unwrap_or(defaults.port),
            database_url: var("DATABASE_URL"),
            database_max_connections: parsed(&var, "DATABASE_MAX_CONNECTIONS")?
                .unwrap_or(defaults.database_max_connections),
            retry_max_attempts,
            retry_delay: parsed(&var, "RETRY_DELAY_MS")?
                .map_or(defaults.retry_delay, Duration::from_millis),
            validator_timeout: parsed(&var, "VALIDATOR_TIMEOUT_MS")?.map(Duration::from_millis),
            user_service_url: var("USER_SERVICE_URL"),
            post_service_url: var("POST_SERVICE_URL"),
            comment_service_url: var("COMMENT_SERVICE_URL"),
            reconcile_interval: parsed(&var, "RECONCILE_INTERVAL_SECS")?
                .map(Duration::from_secs),
            object_base_url: var("OBJECT_BASE_URL").unwrap_or(defaults.object_base_url),
            otlp_endpoint: var("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }

    /// `host:port` to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The recoverer policy described by the retry settings.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(self.retry_max_attempts, self.retry_delay)
    }
}

fn parsed<T>(var: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(name)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|e| AppError::Config(format!("{name} is invalid ({value:?}): {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = config(&[]).unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_reads_every_variable() {
        // Arrange
        let vars = [
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/socialnet"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("RETRY_MAX_ATTEMPTS", "5"),
            ("RETRY_DELAY_MS", "250"),
            ("VALIDATOR_TIMEOUT_MS", "1500"),
            ("USER_SERVICE_URL", "http://users:3000/api/v1/users"),
            ("RECONCILE_INTERVAL_SECS", "60"),
            ("OBJECT_BASE_URL", "https://cdn.example.com"),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://collector:4317"),
        ];

        // Act
        let config = config(&vars).unwrap();

        // Assert
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.database_max_connections, 4);
        assert_eq!(config.retry_policy(), RetryPolicy::fixed(5, Duration::from_millis(250)));
        assert_eq!(config.validator_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(config.user_service_url.as_deref(), Some("http://users:3000/api/v1/users"));
        assert_eq!(config.post_service_url, None);
        assert_eq!(config.reconcile_interval, Some(Duration::from_secs(60)));
        assert_eq!(config.object_base_url, "https://cdn.example.com");
        assert_eq!(config.otlp_endpoint.as_deref(), Some("http://collector:4317"));
    }

    #[test]
    fn test_invalid_port_is_config_error() {
        let result = config(&[("PORT", "not-a-port")]);

        assert!(matches!(result, Err(AppError::Config(message)) if message.contains("PORT")));
    }

    #[test]
    fn test_zero_attempts_is_config_error() {
        assert!(matches!(
            config(&[("RETRY_MAX_ATTEMPTS", "0")]),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let config = config(&[("DATABASE_URL", "  "), ("PORT", "")]).unwrap();

        assert_eq!(config.database_url, None);
        assert_eq!(config.port, 3000);
    }
}
