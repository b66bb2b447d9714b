use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use jsonwebtoken::{DecodingKey, EncodingKey};
use std::{env, fmt, str::FromStr};
use zeroize::Zeroizing;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default)]
    pub mongo_uri: String,

    #[serde(default = "default_database_name")]
    pub database_name: String,

    #[serde(default)]
    pub blob_connection_string: String,

    #[serde(default = "default_originals_container")]
    pub originals_container: String,

    #[serde(default = "default_thumbnails_container")]
    pub thumbnails_container: String,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default)]
    pub trust_x_forwarded_for: bool,

    #[serde(default)]
    pub session_secret: String,

    #[serde(default = "default_session_expiration")]
    pub session_expiration_minutes: i64,

    #[serde(default)]
    pub bootstrap_admin_username: Option<String>,

    #[serde(default)]
    pub bootstrap_admin_password: Option<String>,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Portfolio-Admin".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_database_name() -> String {
    "portfolio".to_string()
}
fn default_originals_container() -> String {
    "images-original".to_string()
}
fn default_thumbnails_container() -> String {
    "images-thumbnail".to_string()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_session_expiration() -> i64 {
    480
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins")
                    .try_parsing(true)
                    .ignore_empty(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        config.mongo_uri = fill_or_env(config.mongo_uri, "MONGODB_URI")?;
        config.session_secret = fill_or_env(config.session_secret, "SESSION_SECRET")?;
        config.blob_connection_string =
            fill_or_env(config.blob_connection_string, "AZURE_STORAGE_CONNECTION_STRING")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.mongo_uri.trim().is_empty() {
            errors.push("MONGO_URI cannot be empty");
        }
        if self.database_name.trim().is_empty() {
            errors.push("DATABASE_NAME cannot be empty");
        }
        if self.blob_connection_string.trim().is_empty() {
            errors.push("BLOB_CONNECTION_STRING cannot be empty");
        }
        if self.originals_container.trim().is_empty() || self.thumbnails_container.trim().is_empty() {
            errors.push("Both blob container names must be set");
        }
        if self.originals_container == self.thumbnails_container {
            errors.push("Originals and thumbnails must live in different containers");
        }
        if self.session_secret.len() < 32 {
            errors.push("SESSION_SECRET must be at least 32 characters");
        }
        if self.session_expiration_minutes <= 0 {
            errors.push("SESSION_EXPIRATION_MINUTES must be positive");
        }
        if self.bootstrap_admin_username.is_some() != self.bootstrap_admin_password.is_some() {
            errors.push("BOOTSTRAP_ADMIN_USERNAME and BOOTSTRAP_ADMIN_PASSWORD must be set together");
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Falls back to a conventional, unprefixed variable when the `APP_` one is unset.
fn fill_or_env(current: String, env_key: &str) -> Result<String, ConfigError> {
    if current.trim().is_empty() {
        env::var(env_key).map_err(|_| ConfigError::Message(format!("{env_key} must be set")))
    } else {
        Ok(current)
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.is_empty() {
            "[MISSING]"
        } else if self.len() < 32 {
            "[TOO_SHORT]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for String {
    fn redact(&self) -> &str {
        self.as_str().redact()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("mongo_uri", &self.mongo_uri.redact())
            .field("database_name", &self.database_name)
            .field("blob_connection_string", &self.blob_connection_string.redact())
            .field("originals_container", &self.originals_container)
            .field("thumbnails_container", &self.thumbnails_container)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("trust_x_forwarded_for", &self.trust_x_forwarded_for)
            .field("session_secret", &self.session_secret.redact())
            .field("session_expiration_minutes", &self.session_expiration_minutes)
            .field("bootstrap_admin_username", &self.bootstrap_admin_username)
            .finish()
    }
}

#[derive(Clone)]
pub struct SessionKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl From<&AppConfig> for SessionKeys {
    fn from(config: &AppConfig) -> Self {
        let secret = Zeroizing::new(config.session_secret.clone());

        SessionKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeys")
            .field("encoding", &"[REDACTED]")
            .field("decoding", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_config() -> AppConfig {
        AppConfig {
            env: AppEnvironment::Testing,
            name: "Portfolio Admin Test".to_string(),
            port: 0,
            host: "127.0.0.1".to_string(),
            worker_count: 1,
            mongo_uri: "mongodb://localhost:27017".to_string(),
            database_name: "portfolio_test".to_string(),
            blob_connection_string: "UseDevelopmentStorage=true".to_string(),
            originals_container: "originals".to_string(),
            thumbnails_container: "thumbnails".to_string(),
            cors_allowed_origins: vec!["*".to_string()],
            trust_x_forwarded_for: false,
            session_secret: "a-very-long-session-secret-used-only-in-tests".to_string(),
            session_expiration_minutes: 60,
            bootstrap_admin_username: None,
            bootstrap_admin_password: None,
        }
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn short_secret_and_shared_container_are_both_reported() {
        let mut config = sample_config();
        config.session_secret = "short".into();
        config.thumbnails_container = config.originals_container.clone();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("SESSION_SECRET"));
        assert!(err.contains("different containers"));
    }

    #[test]
    fn wildcard_cors_rejected_in_production() {
        let mut config = sample_config();
        config.env = AppEnvironment::Production;
        assert!(config.validate().is_err());

        config.cors_allowed_origins = vec!["https://admin.example.com, https://example.com".into()];
        assert!(config.validate().is_ok());
        assert_eq!(config.cors_origins().len(), 2);
    }

    #[test]
    fn bootstrap_credentials_must_come_in_pairs() {
        let mut config = sample_config();
        config.bootstrap_admin_username = Some("admin".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let rendered = format!("{:?}", sample_config());
        assert!(!rendered.contains("a-very-long-session-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
