use serde::Deserialize;
use std::{collections::HashSet, error::Error, fs, net::SocketAddr};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CommonConfig {
    pub project_name: String,
    /// `memory://` keeps every ledger in process memory.
    pub database_url: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BackendConfig {
    pub server_address: String,
    pub log_level: String,
    #[serde(default)]
    pub allowed_origin: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub webhook_secret: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
    #[serde(default = "default_webhook_tolerance")]
    pub webhook_tolerance_secs: i64,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            secret_key: String::new(),
            webhook_secret: String::new(),
            currency: default_currency(),
            success_url: "http://localhost:5173/payment-success?session_id={CHECKOUT_SESSION_ID}".to_string(),
            cancel_url: "http://localhost:5173/cart".to_string(),
            webhook_tolerance_secs: default_webhook_tolerance(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.stripe.com".to_string()
}

fn default_currency() -> String {
    "eur".to_string()
}

fn default_webhook_tolerance() -> i64 {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoyaltyConfig {
    #[serde(default = "default_signup_bonus")]
    pub signup_bonus: i64,
    #[serde(default = "default_referral_bonus")]
    pub referral_base_bonus: i64,
}

impl Default for LoyaltyConfig {
    fn default() -> Self {
        Self {
            signup_bonus: default_signup_bonus(),
            referral_base_bonus: default_referral_bonus(),
        }
    }
}

fn default_signup_bonus() -> i64 {
    100
}

fn default_referral_bonus() -> i64 {
    200
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Customer,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiToken {
    pub token: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub tokens: Vec<ApiToken>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    pub common: CommonConfig,
    pub backend: BackendConfig,
    #[serde(default)]
    pub payment: PaymentConfig,
    #[serde(default)]
    pub loyalty: LoyaltyConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    pub fn load(config_path: &str) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let contents = fs::read_to_string(config_path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let config = serde_yml::from_str(contents)?;
        Ok(config)
    }

    /// Rejects values the server cannot start with. Secrets may still be empty
    /// here, they usually arrive through the environment.
    pub fn validate(&self) -> Result<(), String> {
        if self.common.database_url.trim().is_empty() {
            return Err("common.database_url is empty".to_string());
        }
        self.backend
            .server_address
            .parse::<SocketAddr>()
            .map_err(|e| format!("backend.server_address '{}': {}", self.backend.server_address, e))?;
        if self.payment.currency.len() != 3 || !self.payment.currency.bytes().all(|b| b.is_ascii_lowercase()) {
            return Err(format!("payment.currency '{}' is not a lowercase ISO code", self.payment.currency));
        }
        if !self.payment.success_url.contains("{CHECKOUT_SESSION_ID}") {
            return Err("payment.success_url must carry {CHECKOUT_SESSION_ID}".to_string());
        }
        if self.payment.webhook_tolerance_secs <= 0 {
            return Err("payment.webhook_tolerance_secs must be positive".to_string());
        }
        if self.loyalty.signup_bonus < 0 || self.loyalty.referral_base_bonus < 0 {
            return Err("loyalty bonuses cannot be negative".to_string());
        }
        let mut seen = HashSet::new();
        for token in &self.auth.tokens {
            if token.token.is_empty() {
                return Err(format!("auth token for {} is empty", token.email));
            }
            if !seen.insert(token.token.as_str()) {
                return Err(format!("auth token for {} is listed twice", token.email));
            }
        }
        Ok(())
    }

    /// Secrets and the database location may come from the environment instead of the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.common.database_url = url;
        }
        if let Ok(key) = std::env::var("STRIPE_SECRET_KEY") {
            self.payment.secret_key = key;
        }
        if let Ok(secret) = std::env::var("STRIPE_WEBHOOK_SECRET") {
            self.payment.webhook_secret = secret;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_fills_defaults() {
        let yaml = r#"
common:
  project_name: growth_shop
  database_url: "memory://"
backend:
  server_address: "127.0.0.1:8000"
  log_level: info
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.common.database_url, "memory://");
        assert_eq!(config.payment.currency, "eur");
        assert_eq!(config.payment.webhook_tolerance_secs, 300);
        assert_eq!(config.loyalty.signup_bonus, 100);
        assert!(config.auth.tokens.is_empty());
    }

    #[test]
    fn test_auth_tokens_parse_roles() {
        let yaml = r#"
common:
  project_name: growth_shop
  database_url: "memory://"
backend:
  server_address: "127.0.0.1:8000"
  log_level: info
auth:
  tokens:
    - token: admin-secret
      email: ops@example.com
      role: admin
    - token: jean-token
      email: jean@example.com
      role: customer
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.auth.tokens.len(), 2);
        assert_eq!(config.auth.tokens[0].role, Role::Admin);
        assert_eq!(config.auth.tokens[1].role, Role::Customer);
    }

    #[test]
    fn test_validate_rejects_unusable_values() {
        let base = r#"
common:
  project_name: growth_shop
  database_url: "memory://"
backend:
  server_address: "127.0.0.1:8000"
  log_level: info
"#;
        let mut config = Config::from_yaml(base).unwrap();
        config.backend.server_address = "localhost".to_string();
        assert!(config.validate().unwrap_err().contains("server_address"));

        let mut config = Config::from_yaml(base).unwrap();
        config.payment.currency = "EURO".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::from_yaml(base).unwrap();
        config.payment.success_url = "http://localhost:5173/done".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::from_yaml(base).unwrap();
        config.loyalty.referral_base_bonus = -1;
        assert!(config.validate().is_err());

        let mut config = Config::from_yaml(base).unwrap();
        let token = ApiToken {
            token: "same".to_string(),
            email: "a@example.com".to_string(),
            role: Role::Admin,
        };
        config.auth.tokens = vec![token.clone(), token];
        assert!(config.validate().unwrap_err().contains("twice"));
    }
}
