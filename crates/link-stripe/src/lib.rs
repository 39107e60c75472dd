//! # link-stripe
//!
//! Stripe payment provider for link-gateway.
//!
//! This crate implements the `PaymentProvider` seam against Stripe's
//! Payment Intents API and handles webhook signature verification.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use link_stripe::StripeProvider;
//! use link_core::{IntentRequest, PaymentProvider};
//!
//! // Create provider from environment
//! let provider = StripeProvider::from_env()?;
//!
//! // Create a payment intent, forwarding the inbound Link session token
//! let request = IntentRequest::new(1999, "usd")
//!     .with_persistent_token(token_from_cookie);
//! let intent = provider.create_intent(&request).await?;
//!
//! // Hand intent.client_secret to the client for confirmation
//! ```
//!
//! ## Webhook Handling
//!
//! ```rust,ignore
//! use link_stripe::{LoggingWebhookHandler, dispatch_webhook_event};
//!
//! // In your webhook endpoint:
//! let event = provider.verify_webhook(payload, signature).await?;
//! dispatch_webhook_event(&LoggingWebhookHandler, &event)?;
//! ```

pub mod client;
pub mod config;
pub mod webhook;

// Re-exports
pub use client::StripeProvider;
pub use config::StripeConfig;
pub use webhook::{
    dispatch_webhook_event, parse_event_unverified, sign_payload, verify_and_parse,
    LoggingWebhookHandler, WebhookHandler,
};
