use std::fmt;
use std::time::Duration;

/// Credentials for the optional HTTP Basic gate in front of the upload endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub user: String,
    pub password: String,
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    /// Upstream extraction webhook that receives the document.
    pub extraction_webhook_url: String,
    pub bearer_token: String,
    pub app_auth: Option<BasicCredentials>,
    pub upstream_timeout_secs: u64,
    pub max_upload_mb: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("extraction_webhook_url", &self.extraction_webhook_url)
            .field("bearer_token", &"[REDACTED]")
            .field("app_auth", &self.app_auth)
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .field("max_upload_mb", &self.max_upload_mb)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let app_user = std::env::var("APP_USER")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let app_password = std::env::var("APP_PASSWORD")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            extraction_webhook_url: std::env::var("EXTRACTION_WEBHOOK_URL")
                .or_else(|_| std::env::var("N8N_WEBHOOK_URL"))
                .map_err(|_| {
                    anyhow::anyhow!(
                        "EXTRACTION_WEBHOOK_URL or N8N_WEBHOOK_URL environment variable required"
                    )
                })
                .and_then(validate_webhook_url)?,
            bearer_token: std::env::var("BEARER_TOKEN")
                .map_err(|_| anyhow::anyhow!("BEARER_TOKEN environment variable required"))
                .and_then(|token| {
                    if token.trim().is_empty() {
                        anyhow::bail!("BEARER_TOKEN cannot be empty");
                    }
                    Ok(token)
                })?,
            app_auth: match (app_user, app_password) {
                (Some(user), Some(password)) => Some(BasicCredentials { user, password }),
                (None, None) => None,
                _ => {
                    tracing::warn!(
                        "Only one of APP_USER / APP_PASSWORD is set; upload endpoint will not require authentication"
                    );
                    None
                }
            },
            upstream_timeout_secs: parse_positive("UPSTREAM_TIMEOUT_SECS", 600)?,
            max_upload_mb: parse_upload_limit_mb(parse_positive("MAX_UPLOAD_MB", 25)?)?,
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Extraction webhook URL: {}", config.extraction_webhook_url);
        tracing::debug!("Upstream timeout: {}s", config.upstream_timeout_secs);
        tracing::debug!("Server Port: {}", config.port);
        if config.app_auth.is_none() {
            tracing::warn!("APP_USER/APP_PASSWORD not configured; upload endpoint is open");
        }

        Ok(config)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(BYTES_PER_MB)
    }
}

const BYTES_PER_MB: usize = 1024 * 1024;

/// Rejects upload limits whose byte count does not fit in `usize`.
fn parse_upload_limit_mb(mb: u64) -> anyhow::Result<usize> {
    usize::try_from(mb)
        .ok()
        .filter(|mb| mb.checked_mul(BYTES_PER_MB).is_some())
        .ok_or_else(|| anyhow::anyhow!("MAX_UPLOAD_MB is too large: {}", mb))
}

fn validate_webhook_url(raw: String) -> anyhow::Result<String> {
    if raw.trim().is_empty() {
        anyhow::bail!("EXTRACTION_WEBHOOK_URL cannot be empty");
    }
    let parsed = url::Url::parse(raw.trim())
        .map_err(|e| anyhow::anyhow!("EXTRACTION_WEBHOOK_URL is not a valid URL: {}", e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("EXTRACTION_WEBHOOK_URL must start with http:// or https://");
    }
    Ok(raw.trim().to_string())
}

fn parse_positive(key: &str, default: u64) -> anyhow::Result<u64> {
    let value = match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| anyhow::anyhow!("{} must be a positive integer", key))?,
        _ => default,
    };
    if value == 0 {
        anyhow::bail!("{} must be greater than zero", key);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_url_requires_http_scheme() {
        assert!(validate_webhook_url("https://n8n.example.com/webhook/abc".into()).is_ok());
        assert!(validate_webhook_url("ftp://n8n.example.com/webhook".into()).is_err());
        assert!(validate_webhook_url("not a url".into()).is_err());
        assert!(validate_webhook_url("   ".into()).is_err());
    }

    #[test]
    fn test_upload_limit_overflow_is_rejected() {
        assert_eq!(parse_upload_limit_mb(25).unwrap(), 25);
        assert!(parse_upload_limit_mb(u64::MAX).is_err());
        assert!(parse_upload_limit_mb(u64::MAX / 1024).is_err());
    }

    #[test]
    fn test_max_upload_bytes_never_overflows() {
        let config = Config {
            port: 8000,
            extraction_webhook_url: "https://example.com/hook".to_string(),
            bearer_token: "token".to_string(),
            app_auth: None,
            upstream_timeout_secs: 600,
            max_upload_mb: usize::MAX,
        };
        assert_eq!(config.max_upload_bytes(), usize::MAX);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config {
            port: 8000,
            extraction_webhook_url: "https://example.com/hook".to_string(),
            bearer_token: "super-secret-token".to_string(),
            app_auth: Some(BasicCredentials {
                user: "admin".to_string(),
                password: "hunter2".to_string(),
            }),
            upstream_timeout_secs: 600,
            max_upload_mb: 25,
        };

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret-token"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("admin"));
        assert_eq!(config.upstream_timeout(), Duration::from_secs(600));
        assert_eq!(config.max_upload_bytes(), 25 * 1024 * 1024);
    }
}
