//! Client configuration: credentials, backend location and token refresh tuning.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use aws_config::BehaviorVersion;
use serde::Deserialize;

use crate::errors::Error;
use crate::token::RefreshPolicy;

pub const DEFAULT_BASE_URL: &str = "https://api.weixin.qq.com";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REFRESH_LEAD_SECS: u64 = 300;

pub enum ConfigLocation {
    File(String),
    Env,
    /// AWS Secrets Manager secret whose ARN is read from `WECHAT_CONFIG_SECRET_ARN`.
    Secret,
}

#[derive(Clone, Deserialize)]
pub struct Config {
    pub app_id: String,
    pub secret: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_refresh_lead_secs")]
    pub refresh_lead_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_refresh_lead_secs() -> u64 {
    DEFAULT_REFRESH_LEAD_SECS
}

impl Config {
    /// Build a config from explicit values; `None` falls back to the defaults.
    pub fn from_values(
        app_id: impl Into<String>,
        secret: impl Into<String>,
        base_url: Option<String>,
        timeout_secs: Option<u64>,
        refresh_lead_secs: Option<u64>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            secret: secret.into(),
            base_url: base_url.unwrap_or_else(default_base_url),
            timeout_secs: timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            refresh_lead_secs: refresh_lead_secs.unwrap_or(DEFAULT_REFRESH_LEAD_SECS),
        }
    }

    pub async fn load(loc: ConfigLocation) -> Result<Self, Error> {
        match loc {
            ConfigLocation::File(path) => Self::from_file(path),
            ConfigLocation::Env => Self::from_env(),
            ConfigLocation::Secret => {
                let secret_arn = std::env::var("WECHAT_CONFIG_SECRET_ARN").map_err(|_| {
                    Error::Config("Missing WECHAT_CONFIG_SECRET_ARN env var".to_string())
                })?;
                Self::from_secret(&secret_arn).await
            }
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// # ENV Vars
    /// * `WECHAT_APP_ID` - mini-program app id
    /// * `WECHAT_APP_SECRET` - mini-program app secret
    /// * `WECHAT_API_BASE_URL` - optional backend base URL override
    /// * `WECHAT_HTTP_TIMEOUT_SECS` - optional per-request timeout
    /// * `WECHAT_TOKEN_REFRESH_LEAD_SECS` - optional refresh lead time
    pub fn from_env() -> Result<Self, Error> {
        Ok(Self::from_values(
            std::env::var("WECHAT_APP_ID")
                .map_err(|_| Error::Config("Missing WECHAT_APP_ID env var".to_string()))?,
            std::env::var("WECHAT_APP_SECRET")
                .map_err(|_| Error::Config("Missing WECHAT_APP_SECRET env var".to_string()))?,
            std::env::var("WECHAT_API_BASE_URL").ok(),
            optional_env_u64("WECHAT_HTTP_TIMEOUT_SECS")?,
            optional_env_u64("WECHAT_TOKEN_REFRESH_LEAD_SECS")?,
        ))
    }

    pub async fn from_secret(secret_arn: &str) -> Result<Self, Error> {
        let client = aws_sdk_secretsmanager::Client::new(
            &aws_config::load_defaults(BehaviorVersion::latest()).await,
        );
        let resp = client
            .get_secret_value()
            .secret_id(secret_arn)
            .send()
            .await
            .map_err(|e| Error::Config(format!("Failed to get secret: {}", e)))?;
        let secret = resp.secret_string().ok_or_else(|| {
            Error::Config("Failed to get secret string, returned None".to_string())
        })?;
        Ok(serde_json::from_str(secret)?)
    }

    /// Rejects blank credentials and unusable numeric settings.
    pub fn validate(&self) -> Result<(), Error> {
        if self.app_id.trim().is_empty() {
            return Err(Error::Config("app_id must not be blank".into()));
        }
        if self.secret.trim().is_empty() {
            return Err(Error::Config("secret must not be blank".into()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be > 0".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn refresh_policy(&self) -> Result<RefreshPolicy, Error> {
        RefreshPolicy::new(Duration::from_secs(self.refresh_lead_secs))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("app_id", &self.app_id)
            .field("secret", &"[redacted]")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("refresh_lead_secs", &self.refresh_lead_secs)
            .finish()
    }
}

fn optional_env_u64(name: &str) -> Result<Option<u64>, Error> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{name} must be an unsigned integer, got '{raw}'"))),
        Err(_) => Ok(None),
    }
}
