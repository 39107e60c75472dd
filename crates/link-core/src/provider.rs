//! # Payment Provider Trait
//!
//! The seam between the HTTP surface and the hosted payment processor.
//! The production implementation talks to Stripe; tests substitute a
//! double to observe exactly what the gateway forwards.

use crate::error::PaymentResult;
use crate::event::WebhookEvent;
use crate::intent::{IntentRequest, PaymentIntent};
use async_trait::async_trait;
use std::sync::Arc;

/// Operations the gateway needs from a payment processor.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a payment intent.
    ///
    /// An inbound session token in the request must be forwarded to the
    /// processor unchanged; its absence must not fail the call.
    async fn create_intent(&self, request: &IntentRequest) -> PaymentResult<PaymentIntent>;

    /// Retrieve an intent with its payment method expanded.
    async fn retrieve_intent(&self, intent_id: &str) -> PaymentResult<PaymentIntent>;

    /// Verify a webhook signature over the raw body and parse the event.
    ///
    /// # Arguments
    /// * `payload` - Raw webhook body bytes, exactly as received
    /// * `signature` - Signature header from the request
    async fn verify_webhook(&self, payload: &[u8], signature: &str)
        -> PaymentResult<WebhookEvent>;

    /// Provider name (for logging)
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shared, dynamically dispatched provider
pub type BoxedPaymentProvider = Arc<dyn PaymentProvider>;
