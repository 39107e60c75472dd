//! # Application State
//!
//! Shared state for the Axum application: the payment provider, the
//! publishable key, and the checkout configuration. Everything here is
//! built once at startup and immutable for the process lifetime.

use link_core::BoxedPaymentProvider;
use link_stripe::StripeProvider;
use serde::Deserialize;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Base URL for callbacks
    pub base_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(4242),
            base_url: std::env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:4242".to_string()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> std::net::SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid socket address")
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Checkout tunables.
///
/// The sample ports hardcoded these per server; here they are configuration
/// so every deployment agrees on amount, currency, and redirect target.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutConfig {
    /// Amount in the currency's smallest unit
    #[serde(default = "default_amount")]
    pub amount: i64,
    /// Lowercase ISO currency code
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Path the completion redirect points at
    #[serde(default = "default_completion_path")]
    pub completion_path: String,
}

fn default_amount() -> i64 {
    1999
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_completion_path() -> String {
    "/success".to_string()
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            amount: default_amount(),
            currency: default_currency(),
            completion_path: default_completion_path(),
        }
    }
}

impl CheckoutConfig {
    /// Load from config/checkout.toml, falling back to env vars, then defaults
    pub fn load() -> Self {
        let config_paths = [
            "config/checkout.toml",
            "../config/checkout.toml",
            "../../config/checkout.toml",
        ];

        for path in config_paths {
            if let Ok(content) = std::fs::read_to_string(path) {
                match toml::from_str::<CheckoutConfig>(&content) {
                    Ok(config) => {
                        tracing::info!("Loaded checkout config from {}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Ignoring malformed {}: {}", path, e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Build from CHECKOUT_* env vars with defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            amount: std::env::var("CHECKOUT_AMOUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.amount),
            currency: std::env::var("CHECKOUT_CURRENCY").unwrap_or(defaults.currency),
            completion_path: std::env::var("CHECKOUT_COMPLETION_PATH")
                .unwrap_or(defaults.completion_path),
        }
    }
}

/// How inbound webhooks are authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookMode {
    /// Signatures verified against the configured signing secret
    Verified,
    /// No signing secret: payloads trusted as-is. Development only.
    UnverifiedDevelopment,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The payment processor
    pub provider: BoxedPaymentProvider,
    /// Client-exposed publishable key
    pub publishable_key: String,
    /// Checkout tunables
    pub checkout: CheckoutConfig,
    /// Webhook authentication mode, decided once at startup
    pub webhook_mode: WebhookMode,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create the production state from the environment.
    ///
    /// Refuses to start in production without a webhook signing secret:
    /// the unverified fallback is a development convenience only.
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let checkout = CheckoutConfig::load();

        let provider = StripeProvider::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;
        let publishable_key = provider.config().publishable_key.clone();

        let webhook_mode = if provider.config().can_verify_webhooks() {
            WebhookMode::Verified
        } else if config.is_production() {
            anyhow::bail!(
                "STRIPE_WEBHOOK_SECRET is required in production; \
                 unverified webhooks are a development-only fallback"
            );
        } else {
            tracing::warn!(
                "No STRIPE_WEBHOOK_SECRET configured: webhooks will be accepted UNVERIFIED"
            );
            WebhookMode::UnverifiedDevelopment
        };

        Ok(Self {
            provider: Arc::new(provider),
            publishable_key,
            checkout,
            webhook_mode,
            config,
        })
    }

    /// Build state around an explicit provider (used by tests)
    pub fn with_provider(
        provider: BoxedPaymentProvider,
        publishable_key: impl Into<String>,
        checkout: CheckoutConfig,
        webhook_mode: WebhookMode,
    ) -> Self {
        Self {
            provider,
            publishable_key: publishable_key.into(),
            checkout,
            webhook_mode,
            config: AppConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                base_url: "http://localhost".to_string(),
                environment: "test".to_string(),
            },
        }
    }
}
