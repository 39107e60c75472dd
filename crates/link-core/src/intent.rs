//! # Payment Intent Types
//!
//! Request-scoped views of the processor-owned payment intent.
//! The processor creates and mutates these objects; this system only reads
//! or forwards them within a single request and never persists them.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a payment intent.
///
/// The exact state set is owned by the processor; unrecognized states
/// deserialize to `Unknown` rather than failing the whole retrieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Succeeded,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl IntentStatus {
    /// True for the two states that may carry a usable Link session token
    /// after redirect-based completion.
    pub fn is_complete_enough_for_session(self) -> bool {
        matches!(self, IntentStatus::Succeeded | IntentStatus::Processing)
    }
}

/// Link-specific payment method detail.
///
/// `persistent_token` is only present when the customer went through the
/// Link authentication flow with a persistent session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkDetails {
    #[serde(default)]
    pub persistent_token: Option<String>,
}

/// Expanded payment method attached to a retrieved intent.
///
/// Polymorphic over method type; only the Link variant carries data this
/// system cares about, everything else passes through untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentMethodDetails {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub method_type: Option<String>,
    #[serde(default)]
    pub link: Option<LinkDetails>,
}

/// A payment intent as returned by the processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: IntentStatus,
    /// Client-visible secret used to resume client-side confirmation
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Present only when retrieved with the payment method expanded
    #[serde(default)]
    pub payment_method: Option<PaymentMethodDetails>,
}

impl PaymentIntent {
    /// Collapse the nested optional chain down to a single answer:
    /// the Link persistent session token, if the expanded payment method
    /// carries one. Absence at any level is the same "no token" case.
    pub fn link_persistent_token(&self) -> Option<&str> {
        self.payment_method
            .as_ref()?
            .link
            .as_ref()?
            .persistent_token
            .as_deref()
    }
}

/// Parameters for creating a payment intent.
#[derive(Debug, Clone)]
pub struct IntentRequest {
    /// Amount in the currency's smallest unit
    pub amount: i64,
    /// Lowercase ISO currency code (e.g. "usd")
    pub currency: String,
    /// Payment method types to enable, in order
    pub payment_method_types: Vec<String>,
    /// Inbound Link session token, forwarded verbatim when present
    pub persistent_token: Option<String>,
    /// Idempotency key attached to the create call
    pub idempotency_key: Option<String>,
}

impl IntentRequest {
    /// Build a request with the standard Link + card method types.
    pub fn new(amount: i64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
            payment_method_types: vec!["link".to_string(), "card".to_string()],
            persistent_token: None,
            idempotency_key: None,
        }
    }

    /// Builder: attach the inbound session token
    pub fn with_persistent_token(mut self, token: impl Into<String>) -> Self {
        self.persistent_token = Some(token.into());
        self
    }

    /// Builder: attach an idempotency key
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}
