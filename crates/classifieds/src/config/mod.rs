use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

const DEFAULT_STORAGE_PUBLIC_BASE: &str = "http://localhost:3000/storage/v1/object/public";
const DEFAULT_STORAGE_BUCKET: &str = "listing-images";
const DEFAULT_MODEL_BASE_URL: &str = "https://api.openai.com/v1";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the marketplace service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub access: AccessConfig,
    pub storage: StorageConfig,
    pub assist: AssistConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let admin_emails = env::var("APP_ADMIN_EMAILS")
            .map(|raw| split_list(&raw))
            .unwrap_or_default();
        let service_credential = non_empty_var("APP_SERVICE_CREDENTIAL");

        let public_base_url = env::var("APP_STORAGE_PUBLIC_BASE")
            .unwrap_or_else(|_| DEFAULT_STORAGE_PUBLIC_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        let bucket =
            env::var("APP_STORAGE_BUCKET").unwrap_or_else(|_| DEFAULT_STORAGE_BUCKET.to_string());
        if bucket.trim().is_empty() || bucket.contains('/') {
            return Err(ConfigError::InvalidBucket);
        }

        let api_key = non_empty_var("OPENAI_API_KEY");
        let model_base_url =
            env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_MODEL_BASE_URL.to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            access: AccessConfig {
                admin_emails,
                service_credential,
            },
            storage: StorageConfig {
                public_base_url,
                bucket: bucket.trim().to_string(),
            },
            assist: AssistConfig {
                api_key,
                base_url: model_base_url,
            },
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_ascii_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Role assignment and elevated write access.
#[derive(Clone, Default)]
pub struct AccessConfig {
    /// Lower-cased e-mail addresses granted the admin role at the HTTP boundary.
    pub admin_emails: Vec<String>,
    pub service_credential: Option<String>,
}

impl fmt::Debug for AccessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessConfig")
            .field("admin_emails", &self.admin_emails)
            .field(
                "service_credential",
                &self.service_credential.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Public object storage holding listing images.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub public_base_url: String,
    pub bucket: String,
}

/// Language-model endpoint used by the suggestion helpers.
#[derive(Clone)]
pub struct AssistConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl fmt::Debug for AssistConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssistConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("APP_PORT must be a valid u16")]
    InvalidPort,
    #[error("APP_HOST must parse to an IPv4 or IPv6 address")]
    InvalidHost { source: std::net::AddrParseError },
    #[error("APP_STORAGE_BUCKET must be a single non-empty path segment")]
    InvalidBucket,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for name in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_ADMIN_EMAILS",
            "APP_SERVICE_CREDENTIAL",
            "APP_STORAGE_PUBLIC_BASE",
            "APP_STORAGE_BUCKET",
            "OPENAI_API_KEY",
            "OPENAI_BASE_URL",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.access.admin_emails.is_empty());
        assert!(config.access.service_credential.is_none());
        assert_eq!(config.storage.bucket, "listing-images");
        assert!(config.assist.api_key.is_none());
    }

    #[test]
    fn admin_allowlist_is_normalized() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ADMIN_EMAILS", " Admin@Example.com , ,ops@example.com");
        env::set_var("APP_SERVICE_CREDENTIAL", "   ");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(
            config.access.admin_emails,
            vec!["admin@example.com".to_string(), "ops@example.com".to_string()]
        );
        assert!(config.access.service_credential.is_none());
        reset_env();
    }

    #[test]
    fn rejects_nested_bucket_names() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_STORAGE_BUCKET", "images/listings");
        assert!(matches!(AppConfig::load(), Err(ConfigError::InvalidBucket)));
        reset_env();
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let access = AccessConfig {
            admin_emails: vec!["admin@example.com".to_string()],
            service_credential: Some("service-secret".to_string()),
        };
        let rendered = format!("{access:?}");
        assert!(!rendered.contains("service-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
