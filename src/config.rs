use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub xendit: XenditConfig,
    pub checkout: CheckoutConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XenditConfig {
    pub secret_key: String,
    /// Shared token the provider echoes back in the `x-callback-token`
    /// header of every webhook delivery.
    pub callback_token: String,
    #[serde(default = "default_xendit_base_url")]
    pub base_url: String,
}

fn default_xendit_base_url() -> String {
    "https://api.xendit.co".to_string()
}

/// Which package transitions count as an upgrade. A policy knob, not a
/// hardcoded price comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum UpgradePolicy {
    /// Target list price must be strictly greater than the current
    /// package's list price.
    #[default]
    PriceAscending,
    /// Any package other than the current one may be purchased.
    AnyDifferent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    #[serde(default = "default_payment_expiry_hours")]
    pub payment_expiry_hours: i64,
    pub success_redirect_url: String,
    pub failure_redirect_url: String,
    #[serde(default)]
    pub upgrade_policy: UpgradePolicy,
}

fn default_payment_expiry_hours() -> i64 {
    72
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| format!("Failed to read config file {config_path}: {e}"))?;
        let mut config: Config =
            toml::from_str(&config_str).map_err(|e| format!("Failed to parse config file: {e}"))?;

        // Environment variables override file values.
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT") {
            if let Ok(p) = v.parse() {
                config.server.port = p;
            }
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS") {
            if let Ok(mc) = v.parse() {
                config.database.max_connections = mc;
            }
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            config.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN") {
            if let Ok(n) = v.parse() {
                config.jwt.access_token_expires_in = n;
            }
        }
        if let Ok(v) = env::var("XENDIT_SECRET_KEY") {
            config.xendit.secret_key = v;
        }
        if let Ok(v) = env::var("XENDIT_CALLBACK_TOKEN") {
            config.xendit.callback_token = v;
        }
        if let Ok(v) = env::var("XENDIT_BASE_URL") {
            config.xendit.base_url = v;
        }
        if let Ok(v) = env::var("CHECKOUT_SUCCESS_REDIRECT_URL") {
            config.checkout.success_redirect_url = v;
        }
        if let Ok(v) = env::var("CHECKOUT_FAILURE_REDIRECT_URL") {
            config.checkout.failure_redirect_url = v;
        }
        if let Ok(v) = env::var("CHECKOUT_PAYMENT_EXPIRY_HOURS") {
            if let Ok(n) = v.parse() {
                config.checkout.payment_expiry_hours = n;
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let toml_str = r#"
            [server]
            host = "127.0.0.1"
            port = 8080

            [database]
            url = "postgres://localhost/membership"
            max_connections = 10

            [jwt]
            secret = "test-secret"
            access_token_expires_in = 7200

            [xendit]
            secret_key = "xnd_test"
            callback_token = "cb_test"

            [checkout]
            success_redirect_url = "https://example.com/checkout/success"
            failure_redirect_url = "https://example.com/checkout/failed"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.xendit.base_url, "https://api.xendit.co");
        assert_eq!(config.checkout.payment_expiry_hours, 72);
        assert_eq!(config.checkout.upgrade_policy, UpgradePolicy::PriceAscending);
    }

    #[test]
    fn parses_upgrade_policy_override() {
        let toml_str = r#"
            payment_expiry_hours = 24
            success_redirect_url = "https://example.com/ok"
            failure_redirect_url = "https://example.com/fail"
            upgrade_policy = "any-different"
        "#;

        let checkout: CheckoutConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(checkout.upgrade_policy, UpgradePolicy::AnyDifferent);
        assert_eq!(checkout.payment_expiry_hours, 24);
    }
}
