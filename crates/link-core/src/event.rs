//! # Webhook Event Types
//!
//! Typed envelope for processor webhook notifications. An event is only
//! ever constructed after signature verification (or by the explicitly
//! gated unverified parser in development mode).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payment lifecycle events delivered over webhooks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WebhookEventType {
    /// Funds have been captured
    PaymentSucceeded,
    /// The payment attempt failed
    PaymentFailed,
    /// A new intent was created
    PaymentCreated,
    /// Anything else: carried through with its raw type tag
    Unknown(String),
}

impl WebhookEventType {
    /// Map a processor event type string to the typed tag
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "payment_intent.succeeded" => WebhookEventType::PaymentSucceeded,
            "payment_intent.payment_failed" => WebhookEventType::PaymentFailed,
            "payment_intent.created" => WebhookEventType::PaymentCreated,
            other => WebhookEventType::Unknown(other.to_string()),
        }
    }
}

/// A verified webhook event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Processor-assigned event id
    pub event_id: String,
    pub event_type: WebhookEventType,
    /// Intent the event refers to, when the payload carries one
    pub payment_intent_id: Option<String>,
    /// Amount in smallest currency unit, when the payload carries one
    pub amount: Option<i64>,
    /// The event's `data.object` payload, untrusted beyond the signature
    pub raw_data: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}
