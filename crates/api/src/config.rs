use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::email::EmailConfig;

/// Configuration errors reported at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Server configuration loaded from environment variables.
///
/// All fields except `database_url` have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Deadline for every individual store call, in seconds (default: `5`).
    pub db_statement_timeout_secs: u64,
    /// Random bytes per session token; raised to the minimum if lower.
    pub session_token_bytes: usize,
    /// Lifetime of a password reset token in minutes (default: `60`).
    pub password_reset_ttl_mins: i64,
    /// Whether cookies carry the `Secure` attribute (default: `false`).
    pub cookie_secure: bool,
    /// Base URL used to build emailed links, without trailing slash.
    pub public_base_url: String,
    pub database_url: String,
    /// SMTP settings; `None` disables outgoing email.
    pub email: Option<EmailConfig>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                    |
    /// |-----------------------------|----------------------------|
    /// | `HOST`                      | `0.0.0.0`                  |
    /// | `PORT`                      | `3000`                     |
    /// | `CORS_ORIGINS`              | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                       |
    /// | `DB_STATEMENT_TIMEOUT_SECS` | `5`                        |
    /// | `SESSION_TOKEN_BYTES`       | `32`                       |
    /// | `PASSWORD_RESET_TTL_MINS`   | `60`                       |
    /// | `COOKIE_SECURE`             | `false`                    |
    /// | `PUBLIC_BASE_URL`           | `http://localhost:3000`    |
    /// | `DATABASE_URL`              | required                   |
    ///
    /// SMTP variables are documented on [`EmailConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = env_or("PORT", 3000)?;
        let cors_origins = split_origins(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        );
        let request_timeout_secs = env_or("REQUEST_TIMEOUT_SECS", 30)?;
        let db_statement_timeout_secs = env_or("DB_STATEMENT_TIMEOUT_SECS", 5)?;
        let session_token_bytes = env_or("SESSION_TOKEN_BYTES", 32)?;
        let password_reset_ttl_mins = env_or("PASSWORD_RESET_TTL_MINS", 60)?;
        let cookie_secure = env_or("COOKIE_SECURE", false)?;
        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .trim_end_matches('/')
            .to_string();
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        if password_reset_ttl_mins <= 0 {
            return Err(ConfigError::Invalid {
                var: "PASSWORD_RESET_TTL_MINS",
                value: password_reset_ttl_mins.to_string(),
                reason: "must be positive".into(),
            });
        }

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            db_statement_timeout_secs,
            session_token_bytes,
            password_reset_ttl_mins,
            cookie_secure,
            public_base_url,
            database_url,
            email: EmailConfig::from_env(),
        })
    }

    pub fn statement_timeout(&self) -> Duration {
        Duration::from_secs(self.db_statement_timeout_secs)
    }

    pub fn password_reset_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.password_reset_ttl_mins)
    }

    /// Link the user follows to redeem a reset token.
    pub fn reset_url(&self, token_hex: &str) -> String {
        format!("{}/reset-password?token={token_hex}", self.public_base_url)
    }
}

fn env_or<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    parse_or(var, std::env::var(var).ok(), default)
}

fn parse_or<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn absent_value_uses_default() {
        assert_eq!(parse_or::<u16>("PORT", None, 3000).unwrap(), 3000);
    }

    #[test]
    fn present_value_is_parsed() {
        assert_eq!(parse_or::<u16>("PORT", Some(" 8080 ".into()), 3000).unwrap(), 8080);
        assert!(parse_or::<bool>("COOKIE_SECURE", Some("true".into()), false).unwrap());
    }

    #[test]
    fn invalid_value_names_the_variable() {
        let err = parse_or::<u16>("PORT", Some("eighty".into()), 3000).unwrap_err();
        assert!(err.to_string().starts_with("PORT has invalid value 'eighty'"));
        assert_matches!(err, ConfigError::Invalid { var: "PORT", value, .. } if value == "eighty");
    }

    #[test]
    fn origins_are_trimmed_and_filtered() {
        assert_eq!(
            split_origins(" http://a.test , ,http://b.test"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }
}
