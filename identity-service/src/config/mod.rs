use std::env;
use std::str::FromStr;

use platform_core::config as core_config;
use platform_core::error::AppError;
use serde::Deserialize;

/// Everything the service needs, resolved once at startup and passed down
/// by value. Components never read the process environment themselves.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub mongodb: MongoConfig,
    pub tokens: TokenConfig,
    pub cookies: CookieConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Dev),
            "prod" | "production" => Ok(Environment::Prod),
            other => Err(format!(
                "Unknown environment '{}', expected 'dev' or 'prod'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

/// Signing secrets and lifetimes for the two token kinds. The secrets must
/// differ so one kind can never be replayed as the other.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_token_expiry_minutes: i64,
    pub refresh_token_expiry_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CookieConfig {
    pub domain: String,
    pub secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

impl IdentityConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        let environment: Environment = env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "dev".to_string())
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;
        let is_prod = environment == Environment::Prod;

        let config = IdentityConfig {
            common,
            environment,
            service_name: get_env("SERVICE_NAME", Some("identity-service"), is_prod)?,
            service_version: get_env(
                "SERVICE_VERSION",
                Some(env!("CARGO_PKG_VERSION")),
                is_prod,
            )?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("campus"), is_prod)?,
            },
            tokens: TokenConfig {
                access_secret: get_env("JWT_ACCESS_SECRET", Some("dev-access-secret"), is_prod)?,
                refresh_secret: get_env(
                    "JWT_REFRESH_SECRET",
                    Some("dev-refresh-secret"),
                    is_prod,
                )?,
                access_token_expiry_minutes: parse_env(
                    "JWT_ACCESS_TOKEN_EXPIRY_MINUTES",
                    "15",
                    is_prod,
                )?,
                refresh_token_expiry_days: parse_env(
                    "JWT_REFRESH_TOKEN_EXPIRY_DAYS",
                    "7",
                    is_prod,
                )?,
            },
            cookies: CookieConfig {
                domain: get_env("COOKIE_DOMAIN", Some("localhost"), is_prod)?,
                secure: is_prod,
            },
            security: SecurityConfig {
                allowed_origins: get_env(
                    "ALLOWED_ORIGINS",
                    Some("http://localhost:3000"),
                    is_prod,
                )?
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(config_error("APP__PORT must be greater than 0"));
        }
        if self.tokens.access_token_expiry_minutes <= 0 {
            return Err(config_error(
                "JWT_ACCESS_TOKEN_EXPIRY_MINUTES must be greater than 0",
            ));
        }
        if self.tokens.refresh_token_expiry_days <= 0 {
            return Err(config_error(
                "JWT_REFRESH_TOKEN_EXPIRY_DAYS must be greater than 0",
            ));
        }
        if self.tokens.access_secret == self.tokens.refresh_secret {
            return Err(config_error(
                "JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must differ",
            ));
        }
        if self.cookies.domain.trim().is_empty() {
            return Err(config_error("COOKIE_DOMAIN must not be empty"));
        }
        if self.environment == Environment::Prod
            && self.security.allowed_origins.iter().any(|o| o == "*")
        {
            return Err(config_error(
                "ALLOWED_ORIGINS must not contain a wildcard in prod",
            ));
        }
        Ok(())
    }
}

fn config_error(message: &str) -> AppError {
    AppError::ConfigError(anyhow::anyhow!("{}", message))
}

/// Read an environment variable. In prod every variable must be set
/// explicitly; in dev the default applies.
fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => {
            if is_prod {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Missing required environment variable '{}'",
                    key
                )));
            }
            default
                .map(str::to_owned)
                .ok_or_else(|| {
                    AppError::ConfigError(anyhow::anyhow!(
                        "Missing required environment variable '{}'",
                        key
                    ))
                })
        }
    }
}

fn parse_env(key: &str, default: &str, is_prod: bool) -> Result<i64, AppError> {
    get_env(key, Some(default), is_prod)?.parse().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("'{}' must be an integer: {}", key, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> IdentityConfig {
        IdentityConfig {
            common: core_config::Config {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            environment: Environment::Dev,
            service_name: "identity-service".to_string(),
            service_version: "0.0.0".to_string(),
            log_level: "info".to_string(),
            mongodb: MongoConfig {
                uri: "mongodb://localhost:27017".to_string(),
                database: "campus".to_string(),
            },
            tokens: TokenConfig {
                access_secret: "access".to_string(),
                refresh_secret: "refresh".to_string(),
                access_token_expiry_minutes: 15,
                refresh_token_expiry_days: 7,
            },
            cookies: CookieConfig {
                domain: "localhost".to_string(),
                secure: false,
            },
            security: SecurityConfig {
                allowed_origins: vec!["http://localhost:3000".to_string()],
            },
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn identical_secrets_are_rejected() {
        let mut config = base_config();
        config.tokens.refresh_secret = config.tokens.access_secret.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_positive_lifetimes_are_rejected() {
        let mut config = base_config();
        config.tokens.access_token_expiry_minutes = 0;
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.tokens.refresh_token_expiry_days = -1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn blank_cookie_domain_is_rejected() {
        let mut config = base_config();
        config.cookies.domain = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn prod_rejects_wildcard_origins() {
        let mut config = base_config();
        config.environment = Environment::Prod;
        config.security.allowed_origins = vec!["*".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn environment_parses_both_spellings() {
        assert_eq!("development".parse::<Environment>(), Ok(Environment::Dev));
        assert_eq!("PROD".parse::<Environment>(), Ok(Environment::Prod));
        assert!("staging".parse::<Environment>().is_err());
    }
}
