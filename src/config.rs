use std::env;
use std::fmt;

use crate::error::{AppError, Result, msg};

/// Z-Pay submit endpoint used when `ZPAY_GATEWAY_URL` is not set.
pub const DEFAULT_GATEWAY_URL: &str = "https://zpayz.cn/submit.php";

/// Audience claim carried by access tokens from the auth backend.
pub const DEFAULT_AUTH_AUDIENCE: &str = "authenticated";

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub gateway: GatewayConfig,
    pub auth_jwt_secret: Option<String>,
    pub auth_audience: String,
    pub rate_limit: RateLimitConfig,
}

/// Per-IP request budgets for the public API.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Order creation
    pub strict_rpm: u32,
    /// Order reads
    pub standard_rpm: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            strict_rpm: 10,
            standard_rpm: 30,
        }
    }
}

/// Merchant credentials and public URLs for the payment gateway.
///
/// Every field is optional at startup; handlers ask for what they need and
/// turn absence into a configuration error at request time.
#[derive(Clone)]
pub struct GatewayConfig {
    pub merchant_id: Option<String>,
    pub key: Option<String>,
    pub app_url: Option<String>,
    pub submit_url: String,
}

/// Borrowed view of a fully configured gateway.
#[derive(Clone, Copy)]
pub struct GatewayCredentials<'a> {
    pub merchant_id: &'a str,
    pub key: &'a str,
    pub app_url: &'a str,
    pub submit_url: &'a str,
}

impl GatewayConfig {
    pub fn new(
        merchant_id: Option<String>,
        key: Option<String>,
        app_url: Option<String>,
    ) -> Self {
        Self {
            merchant_id,
            key,
            app_url: app_url.map(|u| u.trim_end_matches('/').to_string()),
            submit_url: DEFAULT_GATEWAY_URL.to_string(),
        }
    }

    pub fn with_submit_url(mut self, submit_url: impl Into<String>) -> Self {
        self.submit_url = submit_url.into();
        self
    }

    /// Everything needed to build a signed checkout redirect.
    pub fn credentials(&self) -> Result<GatewayCredentials<'_>> {
        match (&self.merchant_id, &self.key, &self.app_url) {
            (Some(merchant_id), Some(key), Some(app_url)) => Ok(GatewayCredentials {
                merchant_id,
                key,
                app_url,
                submit_url: &self.submit_url,
            }),
            _ => {
                tracing::error!(
                    "Gateway settings incomplete: ZPAY_PID set={}, ZPAY_KEY set={}, APP_URL set={}",
                    self.merchant_id.is_some(),
                    self.key.is_some(),
                    self.app_url.is_some()
                );
                Err(AppError::Configuration(msg::GATEWAY_NOT_CONFIGURED.into()))
            }
        }
    }

    /// The shared secret alone, which is all webhook verification needs.
    pub fn signing_key(&self) -> Result<&str> {
        self.key.as_deref().ok_or_else(|| {
            tracing::error!("ZPAY_KEY is not set; cannot verify gateway notifications");
            AppError::Configuration(msg::GATEWAY_NOT_CONFIGURED.into())
        })
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("merchant_id", &self.merchant_id)
            .field("key", &SecretPresence(&self.key))
            .field("app_url", &self.app_url)
            .field("submit_url", &self.submit_url)
            .finish()
    }
}

/// Read a variable, treating blank values as unset.
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn rpm_var(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|&v: &u32| v > 0)
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let mut gateway = GatewayConfig::new(
            non_empty_var("ZPAY_PID"),
            non_empty_var("ZPAY_KEY"),
            non_empty_var("APP_URL"),
        );
        if let Some(url) = non_empty_var("ZPAY_GATEWAY_URL") {
            gateway = gateway.with_submit_url(url);
        }

        let defaults = RateLimitConfig::default();

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "zpay_checkout.db".to_string()),
            gateway,
            auth_jwt_secret: non_empty_var("AUTH_JWT_SECRET"),
            auth_audience: non_empty_var("AUTH_JWT_AUDIENCE")
                .unwrap_or_else(|| DEFAULT_AUTH_AUDIENCE.to_string()),
            rate_limit: RateLimitConfig {
                strict_rpm: rpm_var("RATE_LIMIT_STRICT_RPM", defaults.strict_rpm),
                standard_rpm: rpm_var("RATE_LIMIT_STANDARD_RPM", defaults.standard_rpm),
            },
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

struct SecretPresence<'a>(&'a Option<String>);

impl fmt::Debug for SecretPresence<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0.is_some() { "<set>" } else { "<unset>" })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_path", &self.database_path)
            .field("gateway", &self.gateway)
            .field("auth_jwt_secret", &SecretPresence(&self.auth_jwt_secret))
            .field("auth_audience", &self.auth_audience)
            .field("rate_limit", &self.rate_limit)
            .finish()
    }
}
